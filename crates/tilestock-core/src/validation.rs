//! # Validation Module
//!
//! Field rules for catalog, stock and account input.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Caller (UI / API boundary)                                   │
//! │  └── Deserialization into NewTile / TilePatch / NewSubAdmin            │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE - business rule validation                       │
//! │  ├── Required attributes, length caps                                  │
//! │  └── Price > 0, quantities ≥ 0                                         │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── NOT NULL / CHECK constraints                                      │
//! │  └── UNIQUE (sku, sku_registry, username)                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use tilestock_core::validation::{validate_price, validate_quantity};
//!
//! validate_price(45050).unwrap();
//! assert!(validate_quantity("quantity", -1).is_err());
//! ```

use crate::error::ValidationError;
use crate::types::{NewSubAdmin, NewTile, TilePatch};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

const MAX_ATTRIBUTE_LEN: usize = 200;
const MAX_NOTE_LEN: usize = 500;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a required text attribute and returns it trimmed.
///
/// ## Example
/// ```rust
/// use tilestock_core::validation::validate_required;
///
/// assert_eq!(validate_required("name", "  Marble ").unwrap(), "Marble");
/// assert!(validate_required("name", "   ").is_err());
/// ```
pub fn validate_required(field: &str, value: &str) -> ValidationResult<String> {
    let value = value.trim();

    if value.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if value.chars().count() > MAX_ATTRIBUTE_LEN {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: MAX_ATTRIBUTE_LEN,
        });
    }

    Ok(value.to_string())
}

/// Trims an optional free-text field. Blank input becomes `None`.
pub fn normalize_optional(field: &str, value: Option<&str>) -> ValidationResult<Option<String>> {
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(v) if v.chars().count() > MAX_NOTE_LEN => Err(ValidationError::TooLong {
            field: field.to_string(),
            max: MAX_NOTE_LEN,
        }),
        Some(v) => Ok(Some(v.to_string())),
    }
}

/// Validates a sub-admin username.
///
/// ## Rules
/// - Must not be empty
/// - Letters, digits, `.`, `_` and `-` only
pub fn validate_username(username: &str) -> ValidationResult<String> {
    let username = validate_required("username", username)?;

    if !username
        .chars()
        .all(|c| c.is_alphanumeric() || matches!(c, '.' | '_' | '-'))
    {
        return Err(ValidationError::InvalidFormat {
            field: "username".to_string(),
            reason: "must contain only letters, numbers, dots, hyphens, and underscores"
                .to_string(),
        });
    }

    Ok(username)
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a box price in minor units. Must be strictly positive.
pub fn validate_price(price_cents: i64) -> ValidationResult<()> {
    if price_cents <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "price_per_box".to_string(),
        });
    }
    Ok(())
}

/// Validates a box quantity. Zero is allowed, there is no upper limit.
///
/// ## Example
/// ```rust
/// use tilestock_core::validation::validate_quantity;
///
/// assert!(validate_quantity("quantity", 0).is_ok());
/// assert!(validate_quantity("quantity", 5_000_000).is_ok());
/// assert!(validate_quantity("quantity", -1).is_err());
/// ```
pub fn validate_quantity(field: &str, quantity: i64) -> ValidationResult<()> {
    if quantity < 0 {
        return Err(ValidationError::Negative {
            field: field.to_string(),
        });
    }
    Ok(())
}

// =============================================================================
// Composite Validators
// =============================================================================

/// Validates every field of a new tile.
pub fn validate_new_tile(input: &NewTile) -> ValidationResult<()> {
    validate_required("name", &input.name)?;
    validate_required("category", &input.category)?;
    validate_required("size", &input.size)?;
    validate_required("finish", &input.finish)?;
    validate_required("color", &input.color)?;
    if let Some(thickness) = &input.thickness {
        validate_required("thickness", thickness)?;
    }
    validate_price(input.price_per_box_cents)?;
    if let Some(qty) = input.stock_qty {
        validate_quantity("stock_qty", qty)?;
    }
    if let Some(min) = input.min_stock {
        validate_quantity("min_stock", min)?;
    }
    normalize_optional("description", input.description.as_deref())?;
    Ok(())
}

/// Validates the fields a patch actually sets.
pub fn validate_tile_patch(patch: &TilePatch) -> ValidationResult<()> {
    let texts = [
        ("name", &patch.name),
        ("category", &patch.category),
        ("size", &patch.size),
        ("finish", &patch.finish),
        ("color", &patch.color),
        ("thickness", &patch.thickness),
    ];
    for (field, value) in texts {
        if let Some(v) = value {
            validate_required(field, v)?;
        }
    }
    if let Some(price) = patch.price_per_box_cents {
        validate_price(price)?;
    }
    if let Some(min) = patch.min_stock {
        validate_quantity("min_stock", min)?;
    }
    if let Some(Some(description)) = &patch.description {
        normalize_optional("description", Some(description))?;
    }
    Ok(())
}

pub fn validate_new_sub_admin(input: &NewSubAdmin) -> ValidationResult<()> {
    validate_username(&input.username)?;
    validate_required("pass_key", &input.pass_key)?;
    validate_required("display_name", &input.display_name)?;
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn new_tile() -> NewTile {
        NewTile {
            name: "Marble".into(),
            category: "Ceramic".into(),
            size: "600x600".into(),
            finish: "Glossy".into(),
            color: "White".into(),
            price_per_box_cents: 45000,
            ..Default::default()
        }
    }

    #[test]
    fn test_required_fields() {
        assert!(validate_new_tile(&new_tile()).is_ok());

        let mut input = new_tile();
        input.color = " ".into();
        assert!(matches!(
            validate_new_tile(&input),
            Err(ValidationError::Required { field }) if field == "color"
        ));
    }

    #[test]
    fn test_price_must_be_positive() {
        let mut input = new_tile();
        input.price_per_box_cents = 0;
        assert!(matches!(
            validate_new_tile(&input),
            Err(ValidationError::MustBePositive { .. })
        ));
    }

    #[test]
    fn test_negative_opening_stock_rejected() {
        let mut input = new_tile();
        input.stock_qty = Some(-5);
        assert!(matches!(
            validate_new_tile(&input),
            Err(ValidationError::Negative { .. })
        ));

        input.stock_qty = Some(5_000_000);
        assert!(validate_new_tile(&input).is_ok());
    }

    #[test]
    fn test_patch_only_checks_present_fields() {
        assert!(validate_tile_patch(&TilePatch::default()).is_ok());

        let patch = TilePatch {
            name: Some(String::new()),
            ..Default::default()
        };
        assert!(validate_tile_patch(&patch).is_err());
    }

    #[test]
    fn test_username_format() {
        assert_eq!(validate_username(" ravi.k ").unwrap(), "ravi.k");
        assert!(validate_username("ravi k").is_err());
    }

    #[test]
    fn test_normalize_optional() {
        assert_eq!(normalize_optional("note", Some("  ")).unwrap(), None);
        assert_eq!(
            normalize_optional("note", Some(" urgent ")).unwrap(),
            Some("urgent".to_string())
        );
        assert!(normalize_optional("note", Some(&"x".repeat(600))).is_err());
    }
}
