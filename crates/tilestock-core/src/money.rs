//! # Money Module
//!
//! Provides the `Money` type for box prices and export values.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  5 boxes × ₹100.10 + 3 boxes × ₹200.20 in floating point:              │
//! │    1101.1000000000001  ❌ WRONG!                                        │
//! │                                                                         │
//! │  OUR SOLUTION: Integer minor units (paise)                             │
//! │    5 × 10010 + 3 × 20020 = 110110 paise = ₹1101.10 exactly            │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use tilestock_core::money::Money;
//!
//! let price = Money::from_cents(45050); // ₹450.50 per box
//! let line = price.checked_mul_quantity(3).unwrap();
//! assert_eq!(line.cents(), 135150);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in the smallest currency unit.
///
/// ## Where Money is Used
/// ```text
/// Tile.price_per_box_cents ──► ExportLineItem.price_cents (frozen snapshot)
///                                      │
///                                      ▼
///                     quantity × price ──► ExportRecord.total_value_cents
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from minor units.
    ///
    /// ## Example
    /// ```rust
    /// use tilestock_core::money::Money;
    ///
    /// let price = Money::from_cents(1099);
    /// assert_eq!(price.cents(), 1099);
    /// ```
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Returns the value in minor units.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the major unit portion.
    #[inline]
    pub const fn major(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the minor unit portion (always 0-99).
    #[inline]
    pub const fn minor_part(&self) -> i64 {
        (self.0 % 100).abs()
    }

    /// Returns the value in major units as a float.
    ///
    /// ## Note
    /// For the code payload only. Never feed this back into arithmetic.
    #[inline]
    pub fn as_major_f64(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    /// Money for `qty` boxes at this price, or `None` if it leaves the i64 range.
    ///
    /// ## Example
    /// ```rust
    /// use tilestock_core::money::Money;
    ///
    /// let unit_price = Money::from_cents(10000);
    /// assert_eq!(unit_price.checked_mul_quantity(5), Some(Money::from_cents(50000)));
    /// assert_eq!(Money::from_cents(i64::MAX / 2).checked_mul_quantity(3), None);
    /// ```
    #[inline]
    pub const fn checked_mul_quantity(&self, qty: i64) -> Option<Self> {
        match self.0.checked_mul(qty) {
            Some(cents) => Some(Money(cents)),
            None => None,
        }
    }

    #[inline]
    pub const fn checked_add(&self, other: Money) -> Option<Self> {
        match self.0.checked_add(other.0) {
            Some(cents) => Some(Money(cents)),
            None => None,
        }
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Debug-friendly rendering. The UI layer owns localized formatting.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}₹{}.{:02}", sign, self.major().abs(), self.minor_part())
    }
}

impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_cents() {
        let money = Money::from_cents(45050);
        assert_eq!(money.cents(), 45050);
        assert_eq!(money.major(), 450);
        assert_eq!(money.minor_part(), 50);
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", Money::from_cents(110000)), "₹1100.00");
        assert_eq!(format!("{}", Money::from_cents(-550)), "-₹5.50");
    }

    #[test]
    fn test_line_totals_sum_exactly() {
        let a = Money::from_cents(10010).checked_mul_quantity(5).unwrap();
        let b = Money::from_cents(20020).checked_mul_quantity(3).unwrap();
        assert_eq!(a.checked_add(b).unwrap().cents(), 110110);
    }

    #[test]
    fn test_overflow_is_reported() {
        assert_eq!(Money::from_cents(i64::MAX / 2).checked_mul_quantity(3), None);
        assert_eq!(Money::from_cents(i64::MAX).checked_add(Money::from_cents(1)), None);
        assert_eq!(
            Money::from_cents(i64::MAX / 2).checked_mul_quantity(2),
            Some(Money::from_cents(i64::MAX - 1))
        );
    }

    #[test]
    fn test_as_major_f64() {
        assert_eq!(Money::from_cents(45050).as_major_f64(), 450.5);
        assert_eq!(Money::from_cents(10000).as_major_f64(), 100.0);
    }
}
