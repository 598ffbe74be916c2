//! # Export Planning
//!
//! Turns a scanned cart into a priced dispatch plan before any write happens.
//!
//! ## Planning Flow
//! ```text
//!   cart lines (tile_id, quantity as sent)       tiles (one read)
//!            │                                         │
//!            ▼                                         │
//!   coerce_quantity ──────── None / ≤ 0 ─────────► dropped
//!            │                                         │
//!            ▼                                         │
//!   tile lookup ───────── unknown tile ─────────► dropped
//!            │◄────────────────────────────────────────┘
//!            ▼
//!   PlannedLine { tile_id, quantity, price_cents = tile.price_per_box }
//!            │
//!            ▼
//!   ExportPlan { lines, total_boxes = Σq, total_value = Σ q × price }
//! ```
//!
//! An empty plan is rejected with `InvalidArgument("no valid items to export")`.
//! Totals are computed with checked arithmetic; a cart whose value leaves the
//! i64 range is an `InvalidArgument` too.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::Tile;

/// One cart line as submitted by the dispatch screen.
///
/// `quantity` is kept as raw JSON: carts arrive with numbers, numeric
/// strings and occasionally garbage, and bad lines are dropped rather than
/// failing the whole batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportLineRequest {
    pub tile_id: String,
    #[serde(default)]
    pub quantity: Value,
}

impl ExportLineRequest {
    pub fn new(tile_id: impl Into<String>, quantity: impl Into<Value>) -> Self {
        ExportLineRequest {
            tile_id: tile_id.into(),
            quantity: quantity.into(),
        }
    }
}

/// Integer prefix parsing for cart quantities.
///
/// ## Rules
/// - integers pass through, fractions truncate toward zero (`5.7` → 5)
/// - strings use their leading integer (`" 12 boxes"` → 12)
/// - anything else is `None`
///
/// ## Example
/// ```rust
/// use serde_json::json;
/// use tilestock_core::export::coerce_quantity;
///
/// assert_eq!(coerce_quantity(&json!("3")), Some(3));
/// assert_eq!(coerce_quantity(&json!(2.9)), Some(2));
/// assert_eq!(coerce_quantity(&json!("abc")), None);
/// ```
pub fn coerce_quantity(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f.trunc() as i64)),
        Value::String(s) => leading_integer(s),
        _ => None,
    }
}

fn leading_integer(s: &str) -> Option<i64> {
    let s = s.trim_start();
    let (sign, digits) = match s.strip_prefix('-') {
        Some(rest) => (-1, rest),
        None => (1, s.strip_prefix('+').unwrap_or(s)),
    };
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    if end == 0 {
        return None;
    }
    // Overlong digit runs saturate; the range check rejects them later.
    let magnitude = digits[..end].parse::<i64>().unwrap_or(i64::MAX);
    Some(sign * magnitude)
}

// =============================================================================
// Plan
// =============================================================================

/// A priced line that will be committed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlannedLine {
    pub tile_id: String,
    pub quantity: i64,
    /// Price snapshot taken during planning.
    pub price_cents: i64,
}

/// Why a cart line was left out of the plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DropReason {
    NotNumeric,
    NotPositive,
    UnknownTile,
}

/// A cart line that was left out, by position in the submitted cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DroppedLine {
    pub index: usize,
    pub tile_id: String,
    pub reason: DropReason,
}

/// The validated dispatch, with header totals computed from its lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportPlan {
    pub lines: Vec<PlannedLine>,
    pub dropped: Vec<DroppedLine>,
    pub total_boxes: i64,
    pub total_value_cents: i64,
}

impl ExportPlan {
    /// Plans a dispatch against the tiles read for it.
    ///
    /// ## When This Fails
    /// `InvalidArgument("no valid items to export")` when the cart is empty
    /// or every line was dropped.
    pub fn build(requests: &[ExportLineRequest], tiles: &HashMap<String, Tile>) -> CoreResult<Self> {
        let mut lines = Vec::with_capacity(requests.len());
        let mut dropped = Vec::new();

        for (index, request) in requests.iter().enumerate() {
            let skip = |reason| DroppedLine {
                index,
                tile_id: request.tile_id.clone(),
                reason,
            };

            let quantity = match coerce_quantity(&request.quantity) {
                None => {
                    dropped.push(skip(DropReason::NotNumeric));
                    continue;
                }
                Some(q) if q <= 0 => {
                    dropped.push(skip(DropReason::NotPositive));
                    continue;
                }
                Some(q) => q,
            };

            match tiles.get(&request.tile_id) {
                Some(tile) => lines.push(PlannedLine {
                    tile_id: tile.id.clone(),
                    quantity,
                    price_cents: tile.price_per_box_cents,
                }),
                None => dropped.push(skip(DropReason::UnknownTile)),
            }
        }

        if lines.is_empty() {
            return Err(CoreError::invalid("no valid items to export"));
        }

        let (total_boxes, total_value) =
            dispatch_totals(lines.iter().map(|l| (l.quantity, l.price_cents)))?;

        Ok(ExportPlan {
            lines,
            dropped,
            total_boxes,
            total_value_cents: total_value.cents(),
        })
    }
}

/// Header totals over `(quantity, price_cents)` line pairs.
///
/// ## When This Fails
/// `InvalidArgument` when a line value or either total leaves the i64 range.
pub fn dispatch_totals<I>(lines: I) -> CoreResult<(i64, Money)>
where
    I: IntoIterator<Item = (i64, i64)>,
{
    lines
        .into_iter()
        .try_fold((0i64, Money::zero()), |(boxes, value), (quantity, price_cents)| {
            let boxes = boxes.checked_add(quantity);
            let value = Money::from_cents(price_cents)
                .checked_mul_quantity(quantity)
                .and_then(|line| value.checked_add(line));
            boxes
                .zip(value)
                .ok_or_else(|| CoreError::invalid("export total exceeds the supported range"))
        })
}

// =============================================================================
// Unit Tests
// =============================================================================
