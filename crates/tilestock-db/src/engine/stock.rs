//! # Stock Mutation Engine
//!
//! Manual stock changes (ADD / REDUCE / ADJUSTMENT) and the ledger reads
//! that go with them.
//!
//! ## apply_stock_change
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  BEGIN                                                                  │
//! │    UPDATE tiles SET stock_qty = <delta expr> ... RETURNING *           │
//! │          │  (write lock held from here; concurrent callers queue)      │
//! │          ├── no row ──► ROLLBACK, NotFound                             │
//! │          ▼                                                              │
//! │    render code image, UPDATE tiles SET code_image                      │
//! │    INSERT stock_ledger (kind, input quantity, actor, note)             │
//! │  COMMIT ── failure ──► TransactionFailed, tile and ledger unchanged    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Not idempotent: calling twice records two entries and applies twice.

use std::sync::Arc;

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::info;

use tilestock_core::code::render_tile_code;
use tilestock_core::stock::{StockAudit, StockChange};
use tilestock_core::validation::normalize_optional;
use tilestock_core::{
    Actor, CodeRenderer, CoreError, CoreResult, LedgerEntryView, LedgerKind, StockLedgerEntry,
    Tile, LEDGER_PAGE_LIMIT,
};

use super::{begin, commit};
use crate::repository::ledger::{self, LedgerRepository};
use crate::repository::tile;

#[derive(Clone)]
pub struct StockEngine {
    pool: SqlitePool,
    renderer: Arc<dyn CodeRenderer>,
}

impl StockEngine {
    pub fn new(pool: SqlitePool, renderer: Arc<dyn CodeRenderer>) -> Self {
        StockEngine { pool, renderer }
    }

    /// Applies one manual stock change and records it.
    ///
    /// ## When This Fails
    /// - `Unauthorized`: actor is not an admin
    /// - `InvalidArgument`: negative or oversized quantity, or kind SALE
    /// - `NotFound`: no tile with `tile_id`
    /// - `TransactionFailed`: the commit did not complete
    pub async fn apply_stock_change(
        &self,
        actor: &Actor,
        tile_id: &str,
        kind: LedgerKind,
        quantity: i64,
        note: Option<&str>,
    ) -> CoreResult<(Tile, StockLedgerEntry)> {
        actor.require_admin("change stock")?;
        let change = StockChange::manual(kind, quantity)?;
        let note = normalize_optional("note", note)?;

        let now = Utc::now();
        let mut tx = begin(&self.pool).await?;

        let mut updated =
            tile::apply_stock_delta(&mut *tx, tile_id, change.kind(), change.quantity(), now)
                .await?
                .ok_or_else(|| CoreError::not_found("Tile", tile_id))?;

        updated.code_image = render_tile_code(self.renderer.as_ref(), &updated)?;
        tile::set_code_image(&mut *tx, tile_id, &updated.code_image).await?;

        let at = ledger::next_timestamp(&mut *tx, now).await?;
        let entry = ledger::new_entry(
            tile_id,
            change.kind(),
            change.quantity(),
            &actor.username,
            note,
            at,
        );
        ledger::append(&mut *tx, &entry).await?;

        commit(tx).await?;

        info!(
            tile_id = %tile_id,
            kind = %entry.kind,
            quantity = entry.quantity,
            stock = updated.stock_qty,
            actor = %actor.username,
            "Stock changed"
        );
        Ok((updated, entry))
    }

    /// Newest entries first, capped at [`LEDGER_PAGE_LIMIT`].
    pub async fn list_ledger(
        &self,
        actor: &Actor,
        tile_id: Option<&str>,
        limit: Option<i64>,
    ) -> CoreResult<Vec<LedgerEntryView>> {
        actor.require_admin("view the stock ledger")?;
        let limit = limit.unwrap_or(LEDGER_PAGE_LIMIT).clamp(1, LEDGER_PAGE_LIMIT);

        Ok(LedgerRepository::new(self.pool.clone())
            .list(tile_id, limit)
            .await?)
    }

    /// Replays a tile's ledger against its stored stock.
    ///
    /// Tile and ledger are read in the same transaction.
    pub async fn audit_tile(&self, actor: &Actor, tile_id: &str) -> CoreResult<StockAudit> {
        actor.require_admin("audit stock")?;

        let mut tx = begin(&self.pool).await?;
        let current = tile::fetch_by_id(&mut *tx, tile_id)
            .await?
            .ok_or_else(|| CoreError::not_found("Tile", tile_id))?;
        let entries = ledger::history(&mut *tx, tile_id).await?;
        commit(tx).await?;

        Ok(StockAudit::of(&current, &entries))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use crate::test_support::{admin, new_tile, setup, sub_admin};
    use tilestock_core::{CodeRenderer, ErrorStatus};
    use tilestock_core::LedgerKind::*;

    #[tokio::test]
    async fn test_stock_scenario() {
        let db = setup().await;
        let tile = db.catalog().create_tile(&admin(), new_tile("Marble", 100, 50)).await.unwrap();
        let stock = db.stock();

        let (t, e) = stock.apply_stock_change(&admin(), &tile.id, Add, 20, None).await.unwrap();
        assert_eq!(t.stock_qty, 70);
        assert_eq!(e.quantity, 20);

        let (t, e) = stock
            .apply_stock_change(&admin(), &tile.id, Reduce, 100, Some("breakage"))
            .await
            .unwrap();
        assert_eq!(t.stock_qty, 0);
        assert_eq!(e.quantity, 100);
        assert_eq!(e.note.as_deref(), Some("breakage"));

        let (t, _) = stock.apply_stock_change(&admin(), &tile.id, Adjustment, 15, None).await.unwrap();
        assert_eq!(t.stock_qty, 15);

        let audit = stock.audit_tile(&admin(), &tile.id).await.unwrap();
        assert!(audit.is_consistent());
        assert_eq!(audit.entry_count, 4);
        assert_eq!(audit.replayed_stock, 15);
    }

    #[tokio::test]
    async fn test_rejections_leave_no_trace() {
        let db = setup().await;
        let tile = db.catalog().create_tile(&admin(), new_tile("Marble", 100, 10)).await.unwrap();
        let stock = db.stock();

        let err = stock.apply_stock_change(&admin(), &tile.id, Add, -5, None).await.unwrap_err();
        assert_eq!(err.status(), ErrorStatus::InvalidArgument);

        let err = stock.apply_stock_change(&admin(), &tile.id, Sale, 5, None).await.unwrap_err();
        assert_eq!(err.status(), ErrorStatus::InvalidArgument);

        let err = stock
            .apply_stock_change(&sub_admin("s1"), &tile.id, Add, 5, None)
            .await
            .unwrap_err();
        assert_eq!(err.status(), ErrorStatus::Unauthorized);

        let err = stock.apply_stock_change(&admin(), "missing", Add, 5, None).await.unwrap_err();
        assert_eq!(err.status(), ErrorStatus::NotFound);

        assert_eq!(db.ledger().count().await.unwrap(), 1);
        assert_eq!(db.catalog().get_tile(&tile.id).await.unwrap().stock_qty, 10);
    }

    #[tokio::test]
    async fn test_large_quantities_accepted() {
        let db = setup().await;
        let tile = db.catalog().create_tile(&admin(), new_tile("Marble", 100, 10)).await.unwrap();
        let stock = db.stock();

        let (updated, _) = stock
            .apply_stock_change(&admin(), &tile.id, Add, 2_000_000, None)
            .await
            .unwrap();
        assert_eq!(updated.stock_qty, 2_000_010);

        let (updated, _) = stock
            .apply_stock_change(&admin(), &tile.id, Add, i64::MAX, None)
            .await
            .unwrap();
        assert_eq!(updated.stock_qty, i64::MAX);

        let audit = stock.audit_tile(&admin(), &tile.id).await.unwrap();
        assert!(audit.is_consistent());
    }

    struct FailingRenderer;

    impl CodeRenderer for FailingRenderer {
        fn render(&self, _payload: &str) -> CoreResult<String> {
            Err(CoreError::TransactionFailed("renderer offline".into()))
        }
    }

    #[tokio::test]
    async fn test_failure_mid_transaction_rolls_back_stock() {
        let db = setup().await;
        let tile = db.catalog().create_tile(&admin(), new_tile("Marble", 100, 10)).await.unwrap();

        let failing = db.clone().with_renderer(FailingRenderer);
        let err = failing
            .stock()
            .apply_stock_change(&admin(), &tile.id, Add, 5, None)
            .await
            .unwrap_err();
        assert_eq!(err.status(), ErrorStatus::TransactionFailed);

        assert_eq!(db.catalog().get_tile(&tile.id).await.unwrap().stock_qty, 10);
        assert_eq!(db.ledger().count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_ledger_listing_newest_first_with_tile() {
        let db = setup().await;
        let a = db.catalog().create_tile(&admin(), new_tile("Marble", 100, 5)).await.unwrap();
        let b = db.catalog().create_tile(&admin(), new_tile("Slate", 100, 5)).await.unwrap();
        let stock = db.stock();
        stock.apply_stock_change(&admin(), &a.id, Add, 1, None).await.unwrap();
        stock.apply_stock_change(&admin(), &a.id, Add, 2, None).await.unwrap();

        let all = stock.list_ledger(&admin(), None, None).await.unwrap();
        assert_eq!(all.len(), 4);
        assert_eq!(all[0].entry.quantity, 2);
        assert_eq!(all[1].entry.quantity, 1);
        assert_eq!(all[0].tile.as_ref().unwrap().sku, a.sku);

        let for_b = stock.list_ledger(&admin(), Some(&b.id), None).await.unwrap();
        assert_eq!(for_b.len(), 1);
        assert_eq!(for_b[0].entry.tile_id, b.id);

        let capped = stock.list_ledger(&admin(), None, Some(2)).await.unwrap();
        assert_eq!(capped.len(), 2);

        let err = stock.list_ledger(&sub_admin("s1"), None, None).await.unwrap_err();
        assert_eq!(err.status(), ErrorStatus::Unauthorized);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_concurrent_reduces_are_not_lost() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::new(DbConfig::new(dir.path().join("stock.db")).max_connections(4))
            .await
            .unwrap();
        let tile = db.catalog().create_tile(&admin(), new_tile("Marble", 100, 15)).await.unwrap();

        let tasks: Vec<_> = (0..2)
            .map(|_| {
                let stock = db.stock();
                let id = tile.id.clone();
                tokio::spawn(async move {
                    stock.apply_stock_change(&admin(), &id, Reduce, 10, None).await
                })
            })
            .collect();

        for task in tasks {
            task.await.unwrap().unwrap();
        }

        let stored = db.catalog().get_tile(&tile.id).await.unwrap();
        assert_eq!(stored.stock_qty, 0);
        let audit = db.stock().audit_tile(&admin(), &tile.id).await.unwrap();
        assert!(audit.is_consistent());
        assert_eq!(audit.entry_count, 3);
        db.close().await;
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_many_concurrent_adds_all_recorded() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::new(DbConfig::new(dir.path().join("adds.db")).max_connections(4))
            .await
            .unwrap();
        let tile = db.catalog().create_tile(&admin(), new_tile("Marble", 100, 0)).await.unwrap();

        let tasks: Vec<_> = (0..16)
            .map(|_| {
                let stock = db.stock();
                let id = tile.id.clone();
                tokio::spawn(async move { stock.apply_stock_change(&admin(), &id, Add, 3, None).await })
            })
            .collect();
        for task in tasks {
            task.await.unwrap().unwrap();
        }

        assert_eq!(db.catalog().get_tile(&tile.id).await.unwrap().stock_qty, 48);
        assert_eq!(db.ledger().count_kind(&tile.id, Add).await.unwrap(), 16);
        db.close().await;
    }
}
