//! JWT access tokens.
//!
//! One token type: a short-lived access token naming the actor. There is no
//! refresh flow; callers sign in again when it expires.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, TokenData, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use tilestock_core::{Actor, Role};

use crate::config::AuthConfig;
use crate::error::{AuthError, AuthResult};

/// JWT claims structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (actor id)
    pub sub: String,

    pub username: String,

    pub role: Role,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration (Unix timestamp)
    pub exp: i64,

    /// JWT ID (unique identifier for this token)
    pub jti: String,

    pub iss: String,
}

impl Claims {
    pub fn actor(&self) -> Actor {
        Actor::new(&self.sub, &self.username, self.role)
    }
}

/// JWT token manager.
pub struct JwtManager {
    secret: String,
    issuer: String,
    access_lifetime_secs: i64,
}

impl JwtManager {
    pub fn new(secret: impl Into<String>, issuer: impl Into<String>, access_lifetime_secs: i64) -> Self {
        JwtManager {
            secret: secret.into(),
            issuer: issuer.into(),
            access_lifetime_secs,
        }
    }

    pub fn from_config(config: &AuthConfig) -> Self {
        Self::new(
            config.jwt_secret.clone(),
            config.jwt_issuer.clone(),
            config.jwt_access_lifetime_secs,
        )
    }

    /// Signs an access token for `actor`. Returns the token and its expiry.
    pub fn issue(&self, actor: &Actor) -> AuthResult<(String, DateTime<Utc>)> {
        let now = Utc::now();
        let exp = now + Duration::seconds(self.access_lifetime_secs);

        let claims = Claims {
            sub: actor.id.clone(),
            username: actor.username.clone(),
            role: actor.role,
            iat: now.timestamp(),
            exp: exp.timestamp(),
            jti: Uuid::new_v4().to_string(),
            iss: self.issuer.clone(),
        };

        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .map_err(|e| AuthError::Token(format!("Failed to generate token: {}", e)))?;

        Ok((token, exp))
    }

    /// Validates signature, expiry and issuer.
    pub fn validate(&self, token: &str) -> AuthResult<Claims> {
        let mut validation = Validation::default();
        validation.set_issuer(&[&self.issuer]);

        let token_data: TokenData<Claims> = decode(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &validation,
        )
        .map_err(|e| AuthError::Unauthenticated(format!("Invalid token: {}", e)))?;

        Ok(token_data.claims)
    }
}

/// Extract bearer token from authorization header.
pub fn extract_bearer_token(auth_header: &str) -> Option<&str> {
    auth_header
        .trim()
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager() -> JwtManager {
        JwtManager::new("test-secret", "tilestock", 3600)
    }

    #[test]
    fn test_issue_and_validate() {
        let actor = Actor::new("sa-1", "dock1", Role::SubAdmin);
        let (token, exp) = manager().issue(&actor).unwrap();

        let claims = manager().validate(&token).unwrap();
        assert_eq!(claims.actor(), actor);
        assert_eq!(claims.iss, "tilestock");
        assert_eq!(claims.exp, exp.timestamp());
    }

    #[test]
    fn test_rejects_foreign_secret_and_issuer() {
        let actor = Actor::new("admin-1", "admin", Role::Admin);
        let (token, _) = manager().issue(&actor).unwrap();

        let other_secret = JwtManager::new("other-secret", "tilestock", 3600);
        assert!(matches!(
            other_secret.validate(&token),
            Err(AuthError::Unauthenticated(_))
        ));

        let other_issuer = JwtManager::new("test-secret", "elsewhere", 3600);
        assert!(other_issuer.validate(&token).is_err());
    }

    #[test]
    fn test_rejects_expired() {
        let expired = JwtManager::new("test-secret", "tilestock", -600);
        let (token, _) = expired
            .issue(&Actor::new("admin-1", "admin", Role::Admin))
            .unwrap();
        assert!(manager().validate(&token).is_err());
    }

    #[test]
    fn test_extract_bearer_token() {
        assert_eq!(extract_bearer_token("Bearer abc.def"), Some("abc.def"));
        assert_eq!(extract_bearer_token("  Bearer  abc "), Some("abc"));
        assert_eq!(extract_bearer_token("Basic abc"), None);
        assert_eq!(extract_bearer_token("Bearer "), None);
    }
}
