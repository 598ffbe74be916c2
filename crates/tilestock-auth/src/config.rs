//! Auth configuration.
//!
//! Loaded from environment variables with fallback to development defaults.

use std::env;

/// Default access token lifetime: one working shift.
pub const DEFAULT_ACCESS_LIFETIME_SECS: i64 = 8 * 60 * 60;

const DEV_SECRET: &str = "tilestock-dev-secret-change-in-production";
const DEFAULT_ISSUER: &str = "tilestock";

#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// HMAC secret for signing tokens
    pub jwt_secret: String,

    /// Access token lifetime in seconds
    pub jwt_access_lifetime_secs: i64,

    /// `iss` claim written and required on every token
    pub jwt_issuer: String,
}

impl AuthConfig {
    /// Load configuration from environment variables.
    ///
    /// | Variable                   | Default   |
    /// |----------------------------|-----------|
    /// | `JWT_SECRET`               | dev secret (must be set in production) |
    /// | `JWT_ACCESS_LIFETIME_SECS` | 28800     |
    /// | `JWT_ISSUER`               | tilestock |
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`load`](Self::load) with an explicit variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let jwt_secret = lookup("JWT_SECRET").unwrap_or_else(|| DEV_SECRET.to_string());
        if jwt_secret.trim().is_empty() {
            return Err(ConfigError::MissingRequired("JWT_SECRET".to_string()));
        }

        let jwt_access_lifetime_secs = match lookup("JWT_ACCESS_LIFETIME_SECS") {
            Some(raw) => raw
                .trim()
                .parse::<i64>()
                .ok()
                .filter(|secs| *secs > 0)
                .ok_or_else(|| ConfigError::InvalidValue("JWT_ACCESS_LIFETIME_SECS".to_string()))?,
            None => DEFAULT_ACCESS_LIFETIME_SECS,
        };

        let jwt_issuer = lookup("JWT_ISSUER").unwrap_or_else(|| DEFAULT_ISSUER.to_string());

        Ok(AuthConfig {
            jwt_secret,
            jwt_access_lifetime_secs,
            jwt_issuer,
        })
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = AuthConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.jwt_access_lifetime_secs, DEFAULT_ACCESS_LIFETIME_SECS);
        assert_eq!(config.jwt_issuer, "tilestock");
        assert!(!config.jwt_secret.is_empty());
    }

    #[test]
    fn test_overrides() {
        let config = AuthConfig::from_lookup(lookup(&[
            ("JWT_SECRET", "s"),
            ("JWT_ACCESS_LIFETIME_SECS", "600"),
            ("JWT_ISSUER", "depot-7"),
        ]))
        .unwrap();
        assert_eq!(config.jwt_secret, "s");
        assert_eq!(config.jwt_access_lifetime_secs, 600);
        assert_eq!(config.jwt_issuer, "depot-7");
    }

    #[test]
    fn test_malformed_values() {
        let err = AuthConfig::from_lookup(lookup(&[("JWT_ACCESS_LIFETIME_SECS", "soon")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(_)));

        let err = AuthConfig::from_lookup(lookup(&[("JWT_ACCESS_LIFETIME_SECS", "0")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(_)));

        let err = AuthConfig::from_lookup(lookup(&[("JWT_SECRET", " ")])).unwrap_err();
        assert!(matches!(err, ConfigError::MissingRequired(_)));
    }
}
