//! # Identity & Access Gate
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  login_admin(user, secret)                                             │
//! │     └── CredentialVerifier::verify_admin ── None ──► Unauthenticated   │
//! │                                                                         │
//! │  login_sub_admin(user, pass_key)                                       │
//! │     ├── no account / wrong key ──────────────────► Unauthenticated     │
//! │     └── is_active = false ───────────────────────► Forbidden           │
//! │                                                                         │
//! │  both ──► JwtManager::issue ──► Session { token, actor, expires_at }   │
//! │                                                                         │
//! │  authenticate("Bearer ..") ──► Claims ──► Actor                        │
//! │     └── SUB_ADMIN: account must still exist and be active              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use subtle::ConstantTimeEq;
use tracing::{info, warn};

use tilestock_core::{Actor, Role};
use tilestock_db::AccountEngine;

use crate::config::AuthConfig;
use crate::error::{AuthError, AuthResult};
use crate::jwt::{extract_bearer_token, JwtManager};

/// Checks admin credentials against whatever store the deployment uses.
pub trait CredentialVerifier: Send + Sync {
    fn verify_admin(&self, username: &str, secret: &str) -> Option<Actor>;
}

/// A single admin account fixed at startup.
#[derive(Debug, Clone)]
pub struct StaticAdmin {
    id: String,
    username: String,
    secret: String,
}

impl StaticAdmin {
    pub fn new(id: impl Into<String>, username: impl Into<String>, secret: impl Into<String>) -> Self {
        StaticAdmin {
            id: id.into(),
            username: username.into(),
            secret: secret.into(),
        }
    }
}

impl CredentialVerifier for StaticAdmin {
    fn verify_admin(&self, username: &str, secret: &str) -> Option<Actor> {
        let matches =
            username.trim().eq_ignore_ascii_case(&self.username) & secrets_match(secret, &self.secret);
        matches.then(|| Actor::new(&self.id, &self.username, Role::Admin))
    }
}

/// Compares credentials without an early exit on the first differing byte.
fn secrets_match(given: &str, expected: &str) -> bool {
    given.as_bytes().ct_eq(expected.as_bytes()).into()
}

/// A signed-in caller.
#[derive(Debug, Clone, Serialize)]
pub struct Session {
    pub token: String,
    pub actor: Actor,
    pub expires_at: DateTime<Utc>,
}

pub struct IdentityGate {
    jwt: JwtManager,
    accounts: AccountEngine,
    admins: Arc<dyn CredentialVerifier>,
}

impl IdentityGate {
    pub fn new(
        config: &AuthConfig,
        accounts: AccountEngine,
        admins: impl CredentialVerifier + 'static,
    ) -> Self {
        IdentityGate {
            jwt: JwtManager::from_config(config),
            accounts,
            admins: Arc::new(admins),
        }
    }

    pub fn login_admin(&self, username: &str, secret: &str) -> AuthResult<Session> {
        let actor = self.admins.verify_admin(username, secret).ok_or_else(|| {
            warn!(username = %username.trim(), "Admin login rejected");
            AuthError::Unauthenticated("invalid credentials".to_string())
        })?;

        self.open_session(actor)
    }

    pub async fn login_sub_admin(&self, username: &str, pass_key: &str) -> AuthResult<Session> {
        let account = match self.accounts.find_by_username(username).await? {
            Some(account) if secrets_match(pass_key, &account.pass_key) => account,
            _ => {
                warn!(username = %username.trim(), "Sub admin login rejected");
                return Err(AuthError::Unauthenticated("invalid credentials".to_string()));
            }
        };

        if !account.is_active {
            warn!(username = %account.username, "Inactive sub admin tried to sign in");
            return Err(AuthError::Forbidden("account is disabled".to_string()));
        }

        self.open_session(account.actor())
    }

    /// Resolves an `Authorization` header value to the calling actor.
    pub async fn authenticate(&self, authorization: &str) -> AuthResult<Actor> {
        let token = extract_bearer_token(authorization)
            .ok_or_else(|| AuthError::Unauthenticated("missing bearer token".to_string()))?;
        let claims = self.jwt.validate(token)?;

        if claims.role == Role::SubAdmin {
            let current = self.accounts.find_by_username(&claims.username).await?;
            match current {
                Some(account) if account.id == claims.sub && account.is_active => {}
                Some(account) if account.id == claims.sub => {
                    return Err(AuthError::Forbidden("account is disabled".to_string()))
                }
                _ => return Err(AuthError::Unauthenticated("account no longer exists".to_string())),
            }
        }

        Ok(claims.actor())
    }

    fn open_session(&self, actor: Actor) -> AuthResult<Session> {
        let (token, expires_at) = self.jwt.issue(&actor)?;
        info!(username = %actor.username, role = %actor.role, "Signed in");
        Ok(Session {
            token,
            actor,
            expires_at,
        })
    }
}
