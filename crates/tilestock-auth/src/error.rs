//! Error types for the identity gate.

use tilestock_core::CoreError;

use crate::config::ConfigError;

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// Missing, malformed or wrong credentials.
    #[error("Authentication failed: {0}")]
    Unauthenticated(String),

    /// Credentials were right but the account may not sign in.
    #[error("Access denied: {0}")]
    Forbidden(String),

    #[error("Auth configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Token could not be issued or failed validation.
    #[error("Token error: {0}")]
    Token(String),

    /// Account lookup failed in storage.
    #[error(transparent)]
    Store(#[from] CoreError),
}

pub type AuthResult<T> = Result<T, AuthError>;

/// Engines only know `Unauthorized`; storage failures keep their own kind.
impl From<AuthError> for CoreError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Store(inner) => inner,
            other => CoreError::unauthorized(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tilestock_core::ErrorStatus;

    #[test]
    fn test_into_core_error() {
        let core: CoreError = AuthError::Unauthenticated("bad token".into()).into();
        assert_eq!(core.status(), ErrorStatus::Unauthorized);

        let core: CoreError = AuthError::Forbidden("disabled".into()).into();
        assert_eq!(core.status(), ErrorStatus::Unauthorized);

        let core: CoreError =
            AuthError::Store(CoreError::TransactionFailed("locked".into())).into();
        assert_eq!(core.status(), ErrorStatus::TransactionFailed);
    }
}
