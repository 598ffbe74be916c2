//! # tilestock-db: Storage and Engines for Tilestock
//!
//! This crate owns the SQLite store and every transaction that touches it.
//! Business rules live in `tilestock-core`; this crate applies them
//! atomically.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Tilestock Data Flow                              │
//! │                                                                         │
//! │  caller (admin console / dispatch scanner) + Actor                     │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                  tilestock-db (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Engines     │    │  Repositories │    │  Migrations  │  │   │
//! │  │   │               │    │               │    │  (embedded)  │  │   │
//! │  │   │ CatalogEngine │───►│ TileRepo      │    │ 001_initial  │  │   │
//! │  │   │ StockEngine   │    │ LedgerRepo    │    │   _schema    │  │   │
//! │  │   │ ExportEngine  │    │ ExportRepo    │    │              │  │   │
//! │  │   │ AccountEngine │    │ SubAdminRepo  │    │              │  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘  │   │
//! │  │            │  Database (pool.rs): pool + renderer + SKUs      │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite (WAL, foreign keys on)                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Row-level reads and transaction-scoped statements
//! - [`engine`] - Catalog, stock, export and account operations
//!
//! ## Usage
//!
//! ```rust,ignore
//! use tilestock_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("./tilestock.db")).await?;
//!
//! let tile = db.catalog().create_tile(&admin, new_tile).await?;
//! db.stock().apply_stock_change(&admin, &tile.id, LedgerKind::Add, 20, None).await?;
//! let record = db.exports().create_export(&operator, &cart, None).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod engine;
pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

#[cfg(test)]
pub(crate) mod test_support;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

pub use engine::{AccountEngine, CatalogEngine, ExportEngine, StockEngine};

// Repository re-exports for convenience
pub use repository::export::ExportRepository;
pub use repository::ledger::LedgerRepository;
pub use repository::sub_admin::SubAdminRepository;
pub use repository::tile::TileRepository;
