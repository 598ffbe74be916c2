//! # Stock Arithmetic
//!
//! The rules every stock mutation follows, and the ledger replay used to
//! audit them.
//!
//! ## Semantics by Kind
//! ```text
//! ┌──────────────┬──────────────────────────────┬──────────────────────────┐
//! │ Kind         │ New stock                    │ Written by               │
//! ├──────────────┼──────────────────────────────┼──────────────────────────┤
//! │ ADD          │ current + q                  │ stock engine, catalog    │
//! │ REDUCE       │ max(0, current - q)          │ stock engine             │
//! │ ADJUSTMENT   │ q                            │ stock engine             │
//! │ SALE         │ max(0, current - q)          │ export engine only       │
//! └──────────────┴──────────────────────────────┴──────────────────────────┘
//! ```
//!
//! Flooring at zero is policy, not an error: reducing 100 boxes from a tile
//! holding 70 leaves 0.
//!
//! ## Replay Invariant
//! Tiles start at 0 and every opening balance is an ADD entry, so replaying
//! a tile's ledger in insertion order always reproduces its stored stock.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::types::{LedgerKind, StockLedgerEntry, Tile};
use crate::validation::validate_quantity;

/// A validated stock change, ready to apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StockChange {
    kind: LedgerKind,
    quantity: i64,
}

impl StockChange {
    /// Validates the magnitude. Any kind is accepted.
    pub fn new(kind: LedgerKind, quantity: i64) -> CoreResult<Self> {
        validate_quantity("quantity", quantity)?;
        Ok(StockChange { kind, quantity })
    }

    /// A change requested through the stock engine.
    ///
    /// ## When This Fails
    /// SALE entries are only written by the export engine, so a direct
    /// request for one is an `InvalidArgument`.
    pub fn manual(kind: LedgerKind, quantity: i64) -> CoreResult<Self> {
        if kind == LedgerKind::Sale {
            return Err(CoreError::invalid(
                "SALE entries are created by exports only",
            ));
        }
        Self::new(kind, quantity)
    }

    #[inline]
    pub fn kind(&self) -> LedgerKind {
        self.kind
    }

    #[inline]
    pub fn quantity(&self) -> i64 {
        self.quantity
    }

    /// Stock after applying this change to `current`.
    #[inline]
    pub fn apply(&self, current: i64) -> i64 {
        apply_kind(self.kind, current, self.quantity)
    }
}

/// Applies one ledger step.
pub fn apply_kind(kind: LedgerKind, current: i64, quantity: i64) -> i64 {
    match kind {
        LedgerKind::Add => current.saturating_add(quantity),
        LedgerKind::Reduce | LedgerKind::Sale => current.saturating_sub(quantity).max(0),
        LedgerKind::Adjustment => quantity,
    }
}

/// Replays ledger steps from zero, in insertion order.
///
/// ## Example
/// ```rust
/// use tilestock_core::stock::replay;
/// use tilestock_core::LedgerKind::*;
///
/// let steps = [(Add, 50), (Add, 20), (Reduce, 100), (Adjustment, 15)];
/// assert_eq!(replay(steps), 15);
/// ```
pub fn replay<I>(steps: I) -> i64
where
    I: IntoIterator<Item = (LedgerKind, i64)>,
{
    steps
        .into_iter()
        .fold(0, |stock, (kind, qty)| apply_kind(kind, stock, qty))
}

// =============================================================================
// Audit
// =============================================================================

/// Result of comparing a tile's stored stock with its replayed ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct StockAudit {
    pub tile_id: String,
    pub stored_stock: i64,
    pub replayed_stock: i64,
    pub entry_count: i64,
}

impl StockAudit {
    /// Builds an audit from entries in insertion order.
    pub fn of(tile: &Tile, entries: &[StockLedgerEntry]) -> Self {
        StockAudit {
            tile_id: tile.id.clone(),
            stored_stock: tile.stock_qty,
            replayed_stock: replay(entries.iter().map(|e| (e.kind, e.quantity))),
            entry_count: entries.len() as i64,
        }
    }

    #[inline]
    pub fn is_consistent(&self) -> bool {
        self.stored_stock == self.replayed_stock
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorStatus;
    use LedgerKind::*;

    #[test]
    fn test_add() {
        assert_eq!(StockChange::new(Add, 20).unwrap().apply(50), 70);
        assert_eq!(StockChange::new(Add, 2_000_000).unwrap().apply(1), 2_000_001);
        assert_eq!(StockChange::new(Add, i64::MAX).unwrap().apply(5), i64::MAX);
    }

    #[test]
    fn test_reduce_floors_at_zero() {
        assert_eq!(StockChange::new(Reduce, 100).unwrap().apply(70), 0);
        assert_eq!(StockChange::new(Reduce, 10).unwrap().apply(15), 5);
        assert_eq!(StockChange::new(Sale, 3).unwrap().apply(2), 0);
    }

    #[test]
    fn test_adjustment_ignores_current() {
        assert_eq!(StockChange::new(Adjustment, 15).unwrap().apply(0), 15);
        assert_eq!(StockChange::new(Adjustment, 0).unwrap().apply(999), 0);
    }

    #[test]
    fn test_negative_quantity_is_invalid_argument() {
        let err = StockChange::new(Add, -1).unwrap_err();
        assert_eq!(err.status(), ErrorStatus::InvalidArgument);
    }

    #[test]
    fn test_manual_rejects_sale() {
        let err = StockChange::manual(Sale, 1).unwrap_err();
        assert!(matches!(err, CoreError::InvalidArgument(_)));
        assert!(StockChange::manual(Reduce, 1).is_ok());
    }

    #[test]
    fn test_replay_floors_at_each_step() {
        // 10 - 20 floors to 0 before the ADD, so the result is 5 not -5.
        assert_eq!(replay([(Add, 10), (Reduce, 20), (Add, 5)]), 5);
        assert_eq!(replay(std::iter::empty()), 0);
    }

    #[test]
    fn test_stock_never_negative() {
        for current in 0..20 {
            for qty in 0..40 {
                assert!(apply_kind(Reduce, current, qty) >= 0);
                assert!(apply_kind(Sale, current, qty) >= 0);
            }
        }
    }
}
