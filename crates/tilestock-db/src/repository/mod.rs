//! # Repository Module
//!
//! Database repository implementations for Tilestock.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Layout                                    │
//! │                                                                         │
//! │  Engine (catalog / stock / export)                                     │
//! │       │                                                                 │
//! │       ├── reads ──────► TileRepository::get_many(&ids)    (pool)       │
//! │       │                                                                 │
//! │       └── writes ─────► tile::apply_stock_delta(&mut *tx, ..)          │
//! │                         ledger::append(&mut *tx, ..)                   │
//! │                         export::insert_header(&mut *tx, ..)            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! │                                                                         │
//! │  Repository structs wrap the pool for reads. Statements that must      │
//! │  join a transaction are module functions generic over `Executor`.      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`TileRepository`](tile::TileRepository) - Catalog reads and tile statements
//! - [`LedgerRepository`](ledger::LedgerRepository) - Append-only stock ledger
//! - [`ExportRepository`](export::ExportRepository) - Dispatch records
//! - [`SubAdminRepository`](sub_admin::SubAdminRepository) - Operator accounts

pub mod export;
pub mod ledger;
pub mod sub_admin;
pub mod tile;
