//! # Domain Types
//!
//! Core domain types used throughout Tilestock.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌──────────────────┐   ┌──────────────────┐     │
//! │  │      Tile       │   │ StockLedgerEntry │   │   ExportRecord   │     │
//! │  │  ─────────────  │   │  ──────────────  │   │  ──────────────  │     │
//! │  │  id (UUID)      │◄──│  tile_id (FK)    │   │  actor_id        │     │
//! │  │  sku (business) │   │  kind            │   │  total_boxes     │     │
//! │  │  stock_qty      │   │  quantity (≥ 0)  │   │  total_value     │     │
//! │  │  price_per_box  │   │  actor           │   │  items[] ────────┼──┐  │
//! │  └─────────────────┘   └──────────────────┘   └──────────────────┘  │  │
//! │           ▲                                                          │  │
//! │           │ tile_id (no FK: survives tile deletion)                  │  │
//! │  ┌────────┴────────┐   ┌─────────────────┐   ┌─────────────────┐     │  │
//! │  │ ExportLineItem  │◄──┼─────────────────┼───┼─────────────────┼─────┘  │
//! │  │  quantity       │   │   LedgerKind    │   │      Actor      │        │
//! │  │  price (frozen) │   │  ADD / REDUCE   │   │  id, username   │        │
//! │  └─────────────────┘   │  ADJUSTMENT     │   │  role           │        │
//! │                        │  SALE           │   └─────────────────┘        │
//! │                        └─────────────────┘                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dual-Key Identity Pattern
//! Every tile has:
//! - `id`: UUID v4 - immutable, used for database relations
//! - `sku`: human-readable, immutable once assigned, never reissued

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::export::dispatch_totals;
use crate::money::Money;

// =============================================================================
// Actor
// =============================================================================

/// Role carried by an authenticated caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    /// Full catalog, ledger and sub-admin management rights.
    Admin,
    /// Reads the catalog and dispatches exports.
    SubAdmin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "ADMIN",
            Role::SubAdmin => "SUB_ADMIN",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = CoreError;

    /// Admin accounts may carry `SUPER_ADMIN`; it grants the same rights.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "ADMIN" | "SUPER_ADMIN" => Ok(Role::Admin),
            "SUB_ADMIN" | "SUBADMIN" => Ok(Role::SubAdmin),
            other => Err(CoreError::unauthorized(format!("unknown role '{}'", other))),
        }
    }
}

/// The authenticated principal performing an action.
///
/// Produced by the identity gate and passed explicitly into every engine
/// call. The engines never look it up themselves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Actor {
    pub id: String,
    pub username: String,
    pub role: Role,
}

impl Actor {
    pub fn new(id: impl Into<String>, username: impl Into<String>, role: Role) -> Self {
        Actor {
            id: id.into(),
            username: username.into(),
            role,
        }
    }

    #[inline]
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Fails with `Unauthorized` unless this actor is an admin.
    pub fn require_admin(&self, action: &str) -> CoreResult<()> {
        if self.role == Role::Admin {
            Ok(())
        } else {
            Err(CoreError::unauthorized(format!(
                "admin access required to {}",
                action
            )))
        }
    }

    /// Fails with `Unauthorized` unless this actor is a sub-admin.
    pub fn require_sub_admin(&self, action: &str) -> CoreResult<()> {
        if self.role == Role::SubAdmin {
            Ok(())
        } else {
            Err(CoreError::unauthorized(format!(
                "sub admin access required to {}",
                action
            )))
        }
    }
}

// =============================================================================
// Tile
// =============================================================================

/// A tile line in the catalog, stocked in boxes.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Tile {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Stock Keeping Unit - business identifier, never changes.
    pub sku: String,

    pub name: String,
    pub category: String,
    pub size: String,
    pub finish: String,
    pub color: String,
    pub thickness: String,
    pub description: Option<String>,

    /// Opaque image reference (URL or embedded asset).
    pub image_url: Option<String>,

    /// Price per box in minor units.
    pub price_per_box_cents: i64,

    /// Boxes currently in stock. Never negative.
    pub stock_qty: i64,

    /// Reorder threshold.
    pub min_stock: i64,

    /// Opaque handle produced by the code renderer from the current payload.
    pub code_image: String,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Tile {
    /// At or below the reorder threshold.
    #[inline]
    pub fn is_low_stock(&self) -> bool {
        self.stock_qty <= self.min_stock
    }

    pub fn summary(&self) -> TileSummary {
        TileSummary {
            id: self.id.clone(),
            sku: self.sku.clone(),
            name: self.name.clone(),
        }
    }
}

/// Name and SKU of a live tile, attached to ledger and export rows for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TileSummary {
    pub id: String,
    pub sku: String,
    pub name: String,
}

/// Input for creating a tile.
///
/// `sku`, `id` and `code_image` are assigned by the catalog.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewTile {
    pub name: String,
    pub category: String,
    pub size: String,
    pub finish: String,
    pub color: String,
    /// Defaults to [`crate::DEFAULT_THICKNESS`].
    pub thickness: Option<String>,
    pub price_per_box_cents: i64,
    /// Opening balance. Defaults to 0.
    pub stock_qty: Option<i64>,
    /// Defaults to [`crate::DEFAULT_MIN_STOCK`].
    pub min_stock: Option<i64>,
    pub description: Option<String>,
    pub image_url: Option<String>,
}

/// Partial update of a tile.
///
/// Absent fields keep their current value. `description` and `image_url`
/// distinguish "absent" (`None`) from "clear it" (`Some(None)`).
/// Stock is not editable here; use the stock engine.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TilePatch {
    pub name: Option<String>,
    pub category: Option<String>,
    pub size: Option<String>,
    pub finish: Option<String>,
    pub color: Option<String>,
    pub thickness: Option<String>,
    pub price_per_box_cents: Option<i64>,
    pub min_stock: Option<i64>,
    #[serde(default, deserialize_with = "present_or_null")]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "present_or_null")]
    pub image_url: Option<Option<String>>,
}

/// Maps a present JSON field to `Some(..)`, including an explicit `null`.
fn present_or_null<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

// =============================================================================
// Stock Ledger
// =============================================================================

/// Kind of stock-affecting event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LedgerKind {
    /// Boxes received: stock + quantity.
    Add,
    /// Boxes removed: max(0, stock - quantity).
    Reduce,
    /// Stock count corrected: stock = quantity.
    Adjustment,
    /// Boxes dispatched through an export: max(0, stock - quantity).
    Sale,
}

impl LedgerKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            LedgerKind::Add => "ADD",
            LedgerKind::Reduce => "REDUCE",
            LedgerKind::Adjustment => "ADJUSTMENT",
            LedgerKind::Sale => "SALE",
        }
    }
}

impl fmt::Display for LedgerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LedgerKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "ADD" => Ok(LedgerKind::Add),
            "REDUCE" => Ok(LedgerKind::Reduce),
            "ADJUSTMENT" => Ok(LedgerKind::Adjustment),
            "SALE" => Ok(LedgerKind::Sale),
            other => Err(CoreError::invalid(format!(
                "unknown operation kind '{}'",
                other
            ))),
        }
    }
}

/// One immutable fact about a stock change.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct StockLedgerEntry {
    pub id: String,
    pub tile_id: String,
    pub kind: LedgerKind,
    /// Magnitude as entered. The sign is implied by `kind`.
    pub quantity: i64,
    /// Username of the actor who made the change.
    pub actor: String,
    pub note: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

/// A ledger entry joined with its tile for display.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct LedgerEntryView {
    #[serde(flatten)]
    pub entry: StockLedgerEntry,
    pub tile: Option<TileSummary>,
}

// =============================================================================
// Export (Dispatch)
// =============================================================================

/// One line of a completed dispatch.
///
/// Uses the snapshot pattern: `price_cents` is frozen at export time and
/// `tile_id` is kept even after the tile is deleted.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ExportLineItem {
    pub id: String,
    pub tile_id: String,
    pub quantity: i64,
    /// Box price at export time (frozen).
    pub price_cents: i64,
    /// Live tile details; `None` once the tile has been deleted.
    pub tile: Option<TileSummary>,
}

/// One completed dispatch transaction. Immutable once created.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ExportRecord {
    pub id: String,
    /// Sub-admin who performed the dispatch.
    pub actor_id: String,
    /// Username at dispatch time.
    pub actor_username: String,
    /// Σ line quantities.
    pub total_boxes: i64,
    /// Σ line quantity × price.
    pub total_value_cents: i64,
    pub note: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    pub items: Vec<ExportLineItem>,
}

impl ExportRecord {
    #[inline]
    pub fn total_value(&self) -> Money {
        Money::from_cents(self.total_value_cents)
    }

    /// Header totals match the aggregate of the line items.
    pub fn totals_match_items(&self) -> bool {
        dispatch_totals(self.items.iter().map(|i| (i.quantity, i.price_cents)))
            .map(|(boxes, value)| boxes == self.total_boxes && value == self.total_value())
            .unwrap_or(false)
    }
}

// =============================================================================
// Sub-Admin Accounts
// =============================================================================

/// A dispatch operator account managed by admins.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct SubAdmin {
    pub id: String,
    pub username: String,
    /// Login secret. Never serialized outward.
    #[serde(skip_serializing, default)]
    #[ts(skip)]
    pub pass_key: String,
    pub display_name: String,
    pub is_active: bool,
    /// Username of the admin who created the account.
    pub created_by: String,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl SubAdmin {
    pub fn actor(&self) -> Actor {
        Actor::new(&self.id, &self.username, Role::SubAdmin)
    }
}

/// Input for creating a sub-admin.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewSubAdmin {
    pub username: String,
    pub pass_key: String,
    pub display_name: String,
}

/// Partial update of a sub-admin. Absent fields are left untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SubAdminPatch {
    pub display_name: Option<String>,
    pub pass_key: Option<String>,
    pub is_active: Option<bool>,
}

// =============================================================================
// Reports
// =============================================================================

/// Catalog-wide stock figures for the admin dashboard.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct InventorySummary {
    pub tile_count: i64,
    pub total_boxes: i64,
    pub stock_value_cents: i64,
    pub low_stock_count: i64,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn tile(stock_qty: i64, min_stock: i64, price: i64) -> Tile {
        let now = Utc::now();
        Tile {
            id: "t1".into(),
            sku: "CE-MAR-1234".into(),
            name: "Marble".into(),
            category: "Ceramic".into(),
            size: "600x600".into(),
            finish: "Glossy".into(),
            color: "White".into(),
            thickness: "10mm".into(),
            description: None,
            image_url: None,
            price_per_box_cents: price,
            stock_qty,
            min_stock,
            code_image: String::new(),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_role_parsing() {
        assert_eq!("ADMIN".parse::<Role>().unwrap(), Role::Admin);
        assert_eq!("SUPER_ADMIN".parse::<Role>().unwrap(), Role::Admin);
        assert_eq!("sub_admin".parse::<Role>().unwrap(), Role::SubAdmin);
        assert!("GUEST".parse::<Role>().is_err());
    }

    #[test]
    fn test_role_serialization() {
        assert_eq!(serde_json::to_string(&Role::SubAdmin).unwrap(), "\"SUB_ADMIN\"");
    }

    #[test]
    fn test_actor_authorization() {
        let admin = Actor::new("a1", "admin", Role::Admin);
        let sub = Actor::new("s1", "ravi", Role::SubAdmin);

        assert!(admin.require_admin("edit stock").is_ok());
        assert!(sub.require_admin("edit stock").is_err());
        assert!(sub.require_sub_admin("create exports").is_ok());
        assert!(admin.require_sub_admin("create exports").is_err());
    }

    #[test]
    fn test_ledger_kind_parsing() {
        assert_eq!("add".parse::<LedgerKind>().unwrap(), LedgerKind::Add);
        assert_eq!(" ADJUSTMENT ".parse::<LedgerKind>().unwrap(), LedgerKind::Adjustment);
        let err = "REFUND".parse::<LedgerKind>().unwrap_err();
        assert!(matches!(err, CoreError::InvalidArgument(_)));
    }

    #[test]
    fn test_low_stock_is_inclusive() {
        assert!(tile(10, 10, 100).is_low_stock());
        assert!(!tile(11, 10, 100).is_low_stock());
    }

    #[test]
    fn test_patch_distinguishes_absent_and_null() {
        let patch: TilePatch = serde_json::from_str(r#"{"description": null}"#).unwrap();
        assert_eq!(patch.description, Some(None));
        assert_eq!(patch.image_url, None);

        let patch: TilePatch = serde_json::from_str(r#"{"image_url": "y"}"#).unwrap();
        assert_eq!(patch.image_url, Some(Some("y".to_string())));
        assert_eq!(patch.description, None);
    }

    #[test]
    fn test_export_totals_match_items() {
        let record = ExportRecord {
            id: "e1".into(),
            actor_id: "s1".into(),
            actor_username: "ravi".into(),
            total_boxes: 8,
            total_value_cents: 1100,
            note: None,
            created_at: Utc::now(),
            items: vec![
                ExportLineItem {
                    id: "l1".into(),
                    tile_id: "a".into(),
                    quantity: 5,
                    price_cents: 100,
                    tile: None,
                },
                ExportLineItem {
                    id: "l2".into(),
                    tile_id: "b".into(),
                    quantity: 3,
                    price_cents: 200,
                    tile: None,
                },
            ],
        };
        assert!(record.totals_match_items());

        let mut record = record;
        record.items[1].price_cents = i64::MAX;
        assert!(!record.totals_match_items());
    }
}
