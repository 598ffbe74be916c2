//! # tilestock-core: Pure Business Logic for Tilestock
//!
//! This crate is the **heart** of Tilestock. It contains the inventory rules
//! as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Tilestock Architecture                           │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │              External UI / API layer (not in this repo)         │   │
//! │  │    Catalog UI ──► Stock UI ──► Scan UI ──► Dispatch bill        │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               tilestock-auth (Identity & Access Gate)           │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ Actor                                  │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ tilestock-core (THIS CRATE) ★                   │   │
//! │  │                                                                 │   │
//! │  │   ┌─────────┐ ┌─────────┐ ┌─────────┐ ┌─────────┐ ┌─────────┐  │   │
//! │  │   │  types  │ │   sku   │ │  code   │ │  stock  │ │ export  │  │   │
//! │  │   │  Tile   │ │ SkuGen  │ │ encode  │ │ ADD/RED │ │  plan   │  │   │
//! │  │   │ Ledger  │ │         │ │ decode  │ │ ADJ/SALE│ │ totals  │  │   │
//! │  │   └─────────┘ └─────────┘ └─────────┘ └─────────┘ └─────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                   tilestock-db (Database Layer)                 │   │
//! │  │        SQLite, migrations, repositories, transactional engines  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Tile, StockLedgerEntry, ExportRecord, Actor)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`error`] - Domain error taxonomy
//! - [`validation`] - Field rules
//! - [`sku`] - SKU generator
//! - [`code`] - Code payload encoder/decoder and the renderer seam
//! - [`stock`] - Stock arithmetic and ledger replay
//! - [`export`] - Dispatch cart planning
//!
//! ## Example Usage
//!
//! ```rust
//! use tilestock_core::stock::StockChange;
//! use tilestock_core::LedgerKind;
//!
//! let change = StockChange::new(LedgerKind::Reduce, 100).unwrap();
//! // Reducing below zero floors at zero
//! assert_eq!(change.apply(70), 0);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod code;
pub mod error;
pub mod export;
pub mod money;
pub mod sku;
pub mod stock;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use code::{decode_sku, encode_payload, CodePayload, CodeRenderer, PayloadRenderer};
pub use error::{CoreError, CoreResult, ErrorStatus, ValidationError};
pub use money::Money;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Reorder threshold applied when a tile is created without one.
pub const DEFAULT_MIN_STOCK: i64 = 10;

/// Thickness applied when a tile is created without one.
pub const DEFAULT_THICKNESS: &str = "10mm";

/// How many SKUs the catalog will try before giving up on a collision streak.
pub const SKU_MAX_ATTEMPTS: usize = 8;

/// Maximum ledger rows returned by a single listing.
pub const LEDGER_PAGE_LIMIT: i64 = 200;
