//! # tilestock-auth: Identity & Access Gate
//!
//! Authenticates callers and hands the engines an [`Actor`]. The engines
//! enforce role rules themselves; this crate only establishes who is asking.
//!
//! ## Module Organization
//!
//! - [`config`] - Environment-driven token settings
//! - [`jwt`] - Access token issuing and validation
//! - [`gate`] - Login flows and bearer authentication
//! - [`error`] - Auth error types
//!
//! ## Usage
//!
//! ```rust,ignore
//! use tilestock_auth::{AuthConfig, IdentityGate, StaticAdmin};
//!
//! let gate = IdentityGate::new(&AuthConfig::load()?, db.accounts(), StaticAdmin::new(..));
//! let session = gate.login_sub_admin("dock1", "pass-key").await?;
//!
//! // later, per request
//! let actor = gate.authenticate(&authorization_header).await?;
//! db.exports().create_export(&actor, &cart, None).await?;
//! ```
//!
//! [`Actor`]: tilestock_core::Actor

pub mod config;
pub mod error;
pub mod gate;
pub mod jwt;

pub use config::{AuthConfig, ConfigError};
pub use error::{AuthError, AuthResult};
pub use gate::{CredentialVerifier, IdentityGate, Session, StaticAdmin};
pub use jwt::{Claims, JwtManager};
