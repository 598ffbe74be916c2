//! # SKU Generator
//!
//! Produces short, uppercase, dash-delimited identifiers for new tiles.
//!
//! ## Shape
//! ```text
//!   category "Ceramic"   name "Marble Gold"
//!        │                    │
//!        ▼                    ▼
//!       "CE"       -        "MAR"       -    4821
//!   (2 alnum chars)    (3 alnum chars)    (1000..=9999)
//! ```
//!
//! The generator only proposes. Uniqueness is decided by the catalog, which
//! records every issued SKU and asks for another one on collision (up to
//! [`crate::SKU_MAX_ATTEMPTS`] times).

use uuid::Uuid;

const CATEGORY_CHARS: usize = 2;
const NAME_CHARS: usize = 3;
const SUFFIX_MIN: u128 = 1000;
const SUFFIX_SPAN: u128 = 9000;

/// Source of candidate SKUs.
///
/// The catalog holds one of these behind a trait object so tests can force
/// collisions deterministically.
pub trait SkuGenerator: Send + Sync {
    fn propose(&self, category: &str, name: &str) -> String;
}

/// Default generator: random 4-digit suffix drawn from a v4 UUID.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomSuffix;

impl SkuGenerator for RandomSuffix {
    fn propose(&self, category: &str, name: &str) -> String {
        let suffix = (Uuid::new_v4().as_u128() % SUFFIX_SPAN + SUFFIX_MIN) as u16;
        compose_sku(category, name, suffix)
    }
}

/// Builds a SKU from its parts.
///
/// ## Example
/// ```rust
/// use tilestock_core::sku::compose_sku;
///
/// assert_eq!(compose_sku("Ceramic", "Marble Gold", 4821), "CE-MAR-4821");
/// assert_eq!(compose_sku("3D wall", "A1", 1000), "3D-A1-1000");
/// ```
pub fn compose_sku(category: &str, name: &str, suffix: u16) -> String {
    format!(
        "{}-{}-{}",
        abbreviate(category, CATEGORY_CHARS),
        abbreviate(name, NAME_CHARS),
        suffix
    )
}

/// First `len` alphanumeric characters, uppercased. `"X"` when none exist.
fn abbreviate(label: &str, len: usize) -> String {
    let part: String = label
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .take(len)
        .collect::<String>()
        .to_ascii_uppercase();

    if part.is_empty() {
        "X".to_string()
    } else {
        part
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compose_strips_punctuation() {
        assert_eq!(compose_sku("Vitri-fied", "G.V.T. Slab", 1234), "VI-GVT-1234");
    }

    #[test]
    fn test_compose_falls_back_for_empty_labels() {
        assert_eq!(compose_sku("", "--", 9999), "X-X-9999");
    }

    #[test]
    fn test_random_suffix_shape() {
        for _ in 0..200 {
            let sku = RandomSuffix.propose("Ceramic", "Marble");
            let parts: Vec<&str> = sku.split('-').collect();
            assert_eq!(parts.len(), 3);
            assert_eq!(parts[0], "CE");
            assert_eq!(parts[1], "MAR");
            let suffix: u32 = parts[2].parse().unwrap();
            assert!((1000..=9999).contains(&suffix));
        }
    }
}
