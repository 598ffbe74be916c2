//! # Export (Dispatch) Engine
//!
//! Turns a sub-admin's cart into one immutable export record, decrementing
//! stock and writing a SALE ledger entry per line, all or nothing.
//!
//! ## create_export
//! ```text
//! cart ──► read tiles ──► ExportPlan::build (drop unusable lines)
//!                               │
//!                               ▼
//!   BEGIN
//!     for each line: UPDATE tiles SET stock_qty = MAX(0, stock_qty - q)
//!                    RETURNING *            (price taken from this row,
//!                                            no row: line dropped)
//!     INSERT exports, INSERT export_items
//!     INSERT stock_ledger (SALE) per line
//!   COMMIT
//! ```
//!
//! Stock is floored at zero; an export larger than the stock on hand still
//! succeeds and records the requested quantity.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{info, warn};
use uuid::Uuid;

use tilestock_core::export::{dispatch_totals, ExportLineRequest, ExportPlan};
use tilestock_core::validation::normalize_optional;
use tilestock_core::{Actor, CoreError, CoreResult, ExportLineItem, ExportRecord, LedgerKind, Role};

use super::{begin, commit};
use crate::repository::export::{self, ExportRepository};
use crate::repository::ledger;
use crate::repository::tile::{self, TileRepository};

#[derive(Debug, Clone)]
pub struct ExportEngine {
    pool: SqlitePool,
}

impl ExportEngine {
    pub fn new(pool: SqlitePool) -> Self {
        ExportEngine { pool }
    }

    /// Commits a dispatch for the acting sub-admin.
    ///
    /// ## When This Fails
    /// - `Unauthorized`: actor is not a sub-admin
    /// - `InvalidArgument`: no line survived planning, or the totals overflow
    /// - `TransactionFailed`: a write or the commit failed; nothing is kept
    pub async fn create_export(
        &self,
        actor: &Actor,
        lines: &[ExportLineRequest],
        note: Option<&str>,
    ) -> CoreResult<ExportRecord> {
        actor.require_sub_admin("create exports")?;
        let note = normalize_optional("note", note)?;

        let plan = self.plan(lines).await?;
        self.commit_plan(actor, &plan, note).await
    }

    /// Prices the cart against a pool-level read of its tiles.
    async fn plan(&self, lines: &[ExportLineRequest]) -> CoreResult<ExportPlan> {
        let mut ids: Vec<&str> = Vec::new();
        for line in lines {
            if !ids.contains(&line.tile_id.as_str()) {
                ids.push(line.tile_id.as_str());
            }
        }
        let tiles = TileRepository::new(self.pool.clone()).get_many(&ids).await?;

        let plan = ExportPlan::build(lines, &tiles)?;
        for dropped in &plan.dropped {
            warn!(
                index = dropped.index,
                tile_id = %dropped.tile_id,
                reason = ?dropped.reason,
                "Dropped cart line"
            );
        }
        Ok(plan)
    }

    /// Writes a planned dispatch in one transaction.
    ///
    /// A tile deleted after planning is dropped like an unknown one. Prices
    /// and totals come from the rows updated inside the transaction.
    async fn commit_plan(
        &self,
        actor: &Actor,
        plan: &ExportPlan,
        note: Option<String>,
    ) -> CoreResult<ExportRecord> {
        let now = Utc::now();
        let mut tx = begin(&self.pool).await?;

        let mut items = Vec::with_capacity(plan.lines.len());
        for line in &plan.lines {
            let Some(current) =
                tile::apply_stock_delta(&mut *tx, &line.tile_id, LedgerKind::Sale, line.quantity, now)
                    .await?
            else {
                warn!(tile_id = %line.tile_id, "Tile removed before dispatch, dropping line");
                continue;
            };

            items.push(ExportLineItem {
                id: Uuid::new_v4().to_string(),
                tile_id: current.id.clone(),
                quantity: line.quantity,
                price_cents: current.price_per_box_cents,
                tile: Some(current.summary()),
            });
        }

        if items.is_empty() {
            return Err(CoreError::invalid("no valid items to export"));
        }
        let (total_boxes, total_value) =
            dispatch_totals(items.iter().map(|i| (i.quantity, i.price_cents)))?;

        let at = ledger::next_timestamp(&mut *tx, now).await?;
        let record = ExportRecord {
            id: Uuid::new_v4().to_string(),
            actor_id: actor.id.clone(),
            actor_username: actor.username.clone(),
            total_boxes,
            total_value_cents: total_value.cents(),
            note,
            created_at: at,
            items,
        };

        export::insert_header(&mut *tx, &record).await?;
        let sale_note = format!("Sale export by {} — Export bill", actor.username);
        for (line_no, item) in record.items.iter().enumerate() {
            export::insert_item(&mut *tx, &record.id, line_no as i64, item).await?;
            let entry = ledger::new_entry(
                &item.tile_id,
                LedgerKind::Sale,
                item.quantity,
                &actor.username,
                Some(sale_note.clone()),
                at,
            );
            ledger::append(&mut *tx, &entry).await?;
        }

        commit(tx).await?;

        info!(
            export_id = %record.id,
            actor = %actor.username,
            lines = record.items.len(),
            total_boxes = record.total_boxes,
            total_value = %record.total_value(),
            "Export committed"
        );
        Ok(record)
    }

    /// Admins see every export; a sub-admin sees only their own.
    pub async fn list_exports(&self, actor: &Actor) -> CoreResult<Vec<ExportRecord>> {
        let scope = match actor.role {
            Role::Admin => None,
            Role::SubAdmin => Some(actor.id.as_str()),
        };
        Ok(ExportRepository::new(self.pool.clone()).list(scope).await?)
    }

    /// A sub-admin asking for someone else's export gets `NotFound`.
    pub async fn get_export(&self, actor: &Actor, id: &str) -> CoreResult<ExportRecord> {
        let record = ExportRepository::new(self.pool.clone())
            .get_by_id(id)
            .await?
            .filter(|r| actor.is_admin() || r.actor_id == actor.id)
            .ok_or_else(|| CoreError::not_found("Export", id))?;

        Ok(record)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{admin, new_tile, setup, sub_admin};
    use serde_json::json;
    use tilestock_core::{ErrorStatus, TilePatch};

    #[tokio::test]
    async fn test_export_scenario() {
        let db = setup().await;
        let a = db.catalog().create_tile(&admin(), new_tile("Marble", 100, 10)).await.unwrap();
        let b = db.catalog().create_tile(&admin(), new_tile("Slate", 200, 10)).await.unwrap();
        let operator = sub_admin("s1");

        let record = db
            .exports()
            .create_export(
                &operator,
                &[ExportLineRequest::new(&a.id, 5), ExportLineRequest::new(&b.id, 3)],
                Some("truck 4"),
            )
            .await
            .unwrap();

        assert_eq!(record.total_boxes, 8);
        assert_eq!(record.total_value_cents, 1100);
        assert_eq!(record.items.len(), 2);
        assert_eq!(record.items[0].tile_id, a.id);
        assert_eq!(record.actor_username, operator.username);
        assert_eq!(record.note.as_deref(), Some("truck 4"));
        assert!(record.totals_match_items());

        assert_eq!(db.catalog().get_tile(&a.id).await.unwrap().stock_qty, 5);
        assert_eq!(db.catalog().get_tile(&b.id).await.unwrap().stock_qty, 7);
        assert_eq!(db.ledger().count_kind(&a.id, LedgerKind::Sale).await.unwrap(), 1);
        assert_eq!(db.ledger().count_kind(&b.id, LedgerKind::Sale).await.unwrap(), 1);

        let audit = db.stock().audit_tile(&admin(), &a.id).await.unwrap();
        assert!(audit.is_consistent());

        let stored = db.exports().get_export(&operator, &record.id).await.unwrap();
        assert_eq!(stored.total_value_cents, 1100);
        assert_eq!(stored.items[1].tile.as_ref().unwrap().sku, b.sku);

        let history = db.ledger().history(&b.id).await.unwrap();
        let sale = history.iter().find(|e| e.kind == LedgerKind::Sale).unwrap();
        assert_eq!(sale.note.as_deref(), Some("Sale export by operator-s1 — Export bill"));
    }

    #[tokio::test]
    async fn test_unusable_lines_are_dropped() {
        let db = setup().await;
        let a = db.catalog().create_tile(&admin(), new_tile("Marble", 100, 10)).await.unwrap();

        let record = db
            .exports()
            .create_export(
                &sub_admin("s1"),
                &[
                    ExportLineRequest::new(&a.id, 0),
                    ExportLineRequest::new(&a.id, "2"),
                    ExportLineRequest::new("ghost", 4),
                    ExportLineRequest::new(&a.id, json!("lots")),
                ],
                None,
            )
            .await
            .unwrap();

        assert_eq!(record.items.len(), 1);
        assert_eq!(record.total_boxes, 2);
        assert_eq!(db.catalog().get_tile(&a.id).await.unwrap().stock_qty, 8);
    }

    #[tokio::test]
    async fn test_nothing_valid_writes_nothing() {
        let db = setup().await;
        let a = db.catalog().create_tile(&admin(), new_tile("Marble", 100, 10)).await.unwrap();

        let err = db
            .exports()
            .create_export(&sub_admin("s1"), &[ExportLineRequest::new(&a.id, -1)], None)
            .await
            .unwrap_err();
        assert_eq!(err.status(), ErrorStatus::InvalidArgument);

        let err = db.exports().create_export(&sub_admin("s1"), &[], None).await.unwrap_err();
        assert_eq!(err.status(), ErrorStatus::InvalidArgument);

        assert_eq!(db.export_records().count().await.unwrap(), 0);
        assert_eq!(db.catalog().get_tile(&a.id).await.unwrap().stock_qty, 10);
    }

    #[tokio::test]
    async fn test_large_quantity_line_is_dispatched() {
        let db = setup().await;
        let a = db.catalog().create_tile(&admin(), new_tile("Marble", 100, 10)).await.unwrap();
        let b = db.catalog().create_tile(&admin(), new_tile("Slate", 200, 10)).await.unwrap();

        let record = db
            .exports()
            .create_export(
                &sub_admin("s1"),
                &[ExportLineRequest::new(&a.id, 2_000_000), ExportLineRequest::new(&b.id, 1)],
                None,
            )
            .await
            .unwrap();

        assert_eq!(record.items.len(), 2);
        assert_eq!(record.total_boxes, 2_000_001);
        assert_eq!(record.total_value_cents, 2_000_000 * 100 + 200);
        assert_eq!(db.catalog().get_tile(&a.id).await.unwrap().stock_qty, 0);
        assert_eq!(db.catalog().get_tile(&b.id).await.unwrap().stock_qty, 9);
    }

    #[tokio::test]
    async fn test_value_overflow_is_rejected() {
        let db = setup().await;
        let dear = db
            .catalog()
            .create_tile(&admin(), new_tile("Onyx", i64::MAX / 2, 10))
            .await
            .unwrap();

        let err = db
            .exports()
            .create_export(&sub_admin("s1"), &[ExportLineRequest::new(&dear.id, 3)], None)
            .await
            .unwrap_err();
        assert_eq!(err.status(), ErrorStatus::InvalidArgument);

        assert_eq!(db.export_records().count().await.unwrap(), 0);
        assert_eq!(db.catalog().get_tile(&dear.id).await.unwrap().stock_qty, 10);
    }

    #[tokio::test]
    async fn test_failure_on_second_line_rolls_back_first() {
        let db = setup().await;
        let a = db.catalog().create_tile(&admin(), new_tile("Marble", 100, 10)).await.unwrap();
        let b = db.catalog().create_tile(&admin(), new_tile("Slate", 200, 10)).await.unwrap();

        let trigger = format!(
            "CREATE TRIGGER slate_locked BEFORE UPDATE OF stock_qty ON tiles \
             WHEN OLD.id = '{}' BEGIN SELECT RAISE(ABORT, 'slate is locked'); END",
            b.id
        );
        sqlx::query(&trigger).execute(db.pool()).await.unwrap();

        let err = db
            .exports()
            .create_export(
                &sub_admin("s1"),
                &[ExportLineRequest::new(&a.id, 4), ExportLineRequest::new(&b.id, 3)],
                None,
            )
            .await
            .unwrap_err();
        assert_eq!(err.status(), ErrorStatus::TransactionFailed);

        assert_eq!(db.catalog().get_tile(&a.id).await.unwrap().stock_qty, 10);
        assert_eq!(db.ledger().count_kind(&a.id, LedgerKind::Sale).await.unwrap(), 0);
        assert_eq!(db.ledger().count().await.unwrap(), 2);
        assert_eq!(db.export_records().count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_tile_deleted_after_planning_is_dropped() {
        let db = setup().await;
        let a = db.catalog().create_tile(&admin(), new_tile("Marble", 100, 10)).await.unwrap();
        let b = db.catalog().create_tile(&admin(), new_tile("Slate", 200, 10)).await.unwrap();
        let exports = db.exports();
        let operator = sub_admin("s1");

        let plan = exports
            .plan(&[ExportLineRequest::new(&a.id, 2), ExportLineRequest::new(&b.id, 3)])
            .await
            .unwrap();
        assert_eq!(plan.lines.len(), 2);
        db.catalog().delete_tile(&admin(), &a.id).await.unwrap();

        let record = exports.commit_plan(&operator, &plan, None).await.unwrap();
        assert_eq!(record.items.len(), 1);
        assert_eq!(record.items[0].tile_id, b.id);
        assert_eq!(record.total_boxes, 3);
        assert_eq!(record.total_value_cents, 600);
        assert_eq!(db.catalog().get_tile(&b.id).await.unwrap().stock_qty, 7);

        let plan = exports.plan(&[ExportLineRequest::new(&b.id, 1)]).await.unwrap();
        db.catalog().delete_tile(&admin(), &b.id).await.unwrap();
        let err = exports.commit_plan(&operator, &plan, None).await.unwrap_err();
        assert!(matches!(err, CoreError::InvalidArgument(_)));
        assert_eq!(db.export_records().count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_admin_cannot_dispatch() {
        let db = setup().await;
        let a = db.catalog().create_tile(&admin(), new_tile("Marble", 100, 10)).await.unwrap();

        let err = db
            .exports()
            .create_export(&admin(), &[ExportLineRequest::new(&a.id, 1)], None)
            .await
            .unwrap_err();
        assert_eq!(err.status(), ErrorStatus::Unauthorized);
    }

    #[tokio::test]
    async fn test_over_export_floors_stock() {
        let db = setup().await;
        let a = db.catalog().create_tile(&admin(), new_tile("Marble", 100, 3)).await.unwrap();

        let record = db
            .exports()
            .create_export(&sub_admin("s1"), &[ExportLineRequest::new(&a.id, 5)], None)
            .await
            .unwrap();

        assert_eq!(record.total_boxes, 5);
        assert_eq!(db.catalog().get_tile(&a.id).await.unwrap().stock_qty, 0);
    }

    #[tokio::test]
    async fn test_visibility_is_scoped_to_operator() {
        let db = setup().await;
        let a = db.catalog().create_tile(&admin(), new_tile("Marble", 100, 50)).await.unwrap();
        let exports = db.exports();

        let first = exports
            .create_export(&sub_admin("s1"), &[ExportLineRequest::new(&a.id, 1)], None)
            .await
            .unwrap();
        let second = exports
            .create_export(&sub_admin("s2"), &[ExportLineRequest::new(&a.id, 2)], None)
            .await
            .unwrap();

        let mine = exports.list_exports(&sub_admin("s1")).await.unwrap();
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].id, first.id);

        let all = exports.list_exports(&admin()).await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].id, second.id);

        let err = exports.get_export(&sub_admin("s1"), &second.id).await.unwrap_err();
        assert_eq!(err.status(), ErrorStatus::NotFound);
        assert!(exports.get_export(&admin(), &second.id).await.is_ok());
    }

    #[tokio::test]
    async fn test_price_snapshot_survives_price_change() {
        let db = setup().await;
        let a = db.catalog().create_tile(&admin(), new_tile("Marble", 100, 10)).await.unwrap();
        let record = db
            .exports()
            .create_export(&sub_admin("s1"), &[ExportLineRequest::new(&a.id, 2)], None)
            .await
            .unwrap();

        let patch = TilePatch {
            price_per_box_cents: Some(999),
            ..Default::default()
        };
        db.catalog().update_tile(&admin(), &a.id, patch).await.unwrap();

        let stored = db.exports().get_export(&admin(), &record.id).await.unwrap();
        assert_eq!(stored.items[0].price_cents, 100);
        assert_eq!(stored.total_value_cents, 200);
    }

    #[tokio::test]
    async fn test_deleted_tile_keeps_export_line() {
        let db = setup().await;
        let a = db.catalog().create_tile(&admin(), new_tile("Marble", 100, 10)).await.unwrap();
        let record = db
            .exports()
            .create_export(&sub_admin("s1"), &[ExportLineRequest::new(&a.id, 2)], None)
            .await
            .unwrap();

        db.catalog().delete_tile(&admin(), &a.id).await.unwrap();

        let stored = db.exports().get_export(&admin(), &record.id).await.unwrap();
        assert_eq!(stored.items.len(), 1);
        assert_eq!(stored.items[0].tile_id, a.id);
        assert!(stored.items[0].tile.is_none());
        assert_eq!(db.ledger().history(&a.id).await.unwrap().len(), 0);
    }

    #[tokio::test]
    async fn test_export_rows_are_immutable() {
        let db = setup().await;
        let a = db.catalog().create_tile(&admin(), new_tile("Marble", 100, 10)).await.unwrap();
        let record = db
            .exports()
            .create_export(&sub_admin("s1"), &[ExportLineRequest::new(&a.id, 1)], None)
            .await
            .unwrap();

        let update = sqlx::query("UPDATE exports SET total_boxes = 99 WHERE id = ?1")
            .bind(&record.id)
            .execute(db.pool())
            .await;
        assert!(update.is_err());

        let delete = sqlx::query("DELETE FROM export_items WHERE export_id = ?1")
            .bind(&record.id)
            .execute(db.pool())
            .await;
        assert!(delete.is_err());
    }
}
