//! # Error Types
//!
//! Domain-specific error types for tilestock-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  tilestock-core errors (this file)                                     │
//! │  ├── CoreError        - The inventory error taxonomy                   │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  tilestock-db errors (separate crate)                                  │
//! │  └── DbError          - Database operation failures → CoreError        │
//! │                                                                         │
//! │  tilestock-auth errors (separate crate)                                │
//! │  └── AuthError        - Token / credential failures → CoreError        │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError ← DbError / AuthError → boundary    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (SKU, ID, etc.)
//! 3. Errors are enum variants, never String
//! 4. Each variant maps to one [`ErrorStatus`] for the boundary layer

use serde::Serialize;
use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Inventory errors surfaced by every core operation.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Referenced tile or record is absent.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Malformed quantity, empty export batch, unknown operation kind.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Missing or insufficient actor role.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// A scanned payload yielded no SKU.
    ///
    /// ## User Workflow
    /// ```text
    /// Scanner emits "{}"
    ///      │
    ///      ▼
    /// decode_sku("{}") → CodeDecode { raw: "{}" }
    ///      │
    ///      ▼
    /// UI shows: "Could not extract SKU from code"
    /// ```
    #[error("Could not extract SKU from scanned code: {raw}")]
    CodeDecode { raw: String },

    /// The underlying atomic commit could not complete. No partial state is
    /// visible.
    #[error("Transaction failed: {0}")]
    TransactionFailed(String),

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    /// Creates a NotFound error for a given entity type and ID.
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        CoreError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    /// Creates an InvalidArgument error.
    pub fn invalid(message: impl Into<String>) -> Self {
        CoreError::InvalidArgument(message.into())
    }

    /// Creates an Unauthorized error.
    pub fn unauthorized(message: impl Into<String>) -> Self {
        CoreError::Unauthorized(message.into())
    }

    /// Status classification for the boundary layer.
    pub fn status(&self) -> ErrorStatus {
        match self {
            CoreError::NotFound { .. } => ErrorStatus::NotFound,
            CoreError::InvalidArgument(_) | CoreError::Validation(_) => {
                ErrorStatus::InvalidArgument
            }
            CoreError::Unauthorized(_) => ErrorStatus::Unauthorized,
            CoreError::CodeDecode { .. } => ErrorStatus::CodeDecodeError,
            CoreError::TransactionFailed(_) => ErrorStatus::TransactionFailed,
        }
    }
}

/// Machine-readable classification of a [`CoreError`].
///
/// ## Serialization
/// ```json
/// "TRANSACTION_FAILED"
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorStatus {
    NotFound,
    InvalidArgument,
    Unauthorized,
    CodeDecodeError,
    TransactionFailed,
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when caller input doesn't meet requirements.
/// Used for early validation before any transaction is opened.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    #[error("{field} must not be negative")]
    Negative { field: String },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g., invalid SKU characters).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Duplicate value (e.g., duplicate username).
    #[error("{field} '{value}' already exists")]
    Duplicate { field: String, value: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::not_found("Tile", "abc");
        assert_eq!(err.to_string(), "Tile not found: abc");

        let err = CoreError::invalid("no valid items to export");
        assert_eq!(err.to_string(), "Invalid argument: no valid items to export");
    }

    #[test]
    fn test_status_classification() {
        assert_eq!(
            CoreError::not_found("Tile", "x").status(),
            ErrorStatus::NotFound
        );
        assert_eq!(
            CoreError::CodeDecode { raw: "{}".into() }.status(),
            ErrorStatus::CodeDecodeError
        );
        assert_eq!(
            CoreError::TransactionFailed("disk I/O".into()).status(),
            ErrorStatus::TransactionFailed
        );

        let validation: CoreError = ValidationError::Required {
            field: "name".to_string(),
        }
        .into();
        assert_eq!(validation.status(), ErrorStatus::InvalidArgument);
    }

    #[test]
    fn test_status_serializes_screaming_snake() {
        let json = serde_json::to_string(&ErrorStatus::CodeDecodeError).unwrap();
        assert_eq!(json, "\"CODE_DECODE_ERROR\"");
    }
}
