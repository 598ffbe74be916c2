//! # Engines
//!
//! The transactional operations of Tilestock. Each engine method is one unit
//! of work: it checks the actor, validates input, and either commits every
//! effect or none of them.
//!
//! ## Transaction Shape
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  read (pool, optional)   planning reads outside the transaction        │
//! │        │                                                                │
//! │        ▼                                                                │
//! │  BEGIN                                                                  │
//! │    first statement writes  → takes the SQLite write lock               │
//! │    further reads/writes    → see a state no other writer can change    │
//! │  COMMIT ── failure ──► CoreError::TransactionFailed, nothing visible   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A transaction never touches the pool while it is open: in-memory
//! databases have a single connection and would deadlock.

pub mod accounts;
pub mod catalog;
pub mod export;
pub mod stock;

pub use accounts::AccountEngine;
pub use catalog::CatalogEngine;
pub use export::ExportEngine;
pub use stock::StockEngine;

use sqlx::{Sqlite, SqlitePool, Transaction};
use tilestock_core::{CoreError, CoreResult};

pub(crate) async fn begin(pool: &SqlitePool) -> CoreResult<Transaction<'static, Sqlite>> {
    pool.begin()
        .await
        .map_err(|e| CoreError::TransactionFailed(format!("begin: {}", e)))
}

pub(crate) async fn commit(tx: Transaction<'static, Sqlite>) -> CoreResult<()> {
    tx.commit()
        .await
        .map_err(|e| CoreError::TransactionFailed(format!("commit: {}", e)))
}
