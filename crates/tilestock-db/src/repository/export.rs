//! # Export Repository
//!
//! Database operations for dispatch records and their lines.
//!
//! ## Snapshot Pattern
//! ```text
//! exports ──1:N──► export_items { tile_id, quantity, price_cents }
//!                          │
//!                          └─ LEFT JOIN tiles: the live summary disappears
//!                             when the tile is deleted, the line does not
//! ```
//!
//! Both tables are insert-only; triggers reject updates and deletes.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sqlx::{Executor, FromRow, QueryBuilder, Sqlite, SqlitePool};
use tracing::debug;

use crate::error::DbResult;
use tilestock_core::{ExportLineItem, ExportRecord, TileSummary};

#[derive(Debug, FromRow)]
struct ExportHeaderRow {
    id: String,
    actor_id: String,
    actor_username: String,
    total_boxes: i64,
    total_value_cents: i64,
    note: Option<String>,
    created_at: DateTime<Utc>,
}

impl ExportHeaderRow {
    fn into_record(self, items: Vec<ExportLineItem>) -> ExportRecord {
        ExportRecord {
            id: self.id,
            actor_id: self.actor_id,
            actor_username: self.actor_username,
            total_boxes: self.total_boxes,
            total_value_cents: self.total_value_cents,
            note: self.note,
            created_at: self.created_at,
            items,
        }
    }
}

#[derive(Debug, FromRow)]
struct ExportItemRow {
    id: String,
    export_id: String,
    tile_id: String,
    quantity: i64,
    price_cents: i64,
    tile_sku: Option<String>,
    tile_name: Option<String>,
}

impl From<ExportItemRow> for ExportLineItem {
    fn from(row: ExportItemRow) -> Self {
        let tile = match (row.tile_sku, row.tile_name) {
            (Some(sku), Some(name)) => Some(TileSummary {
                id: row.tile_id.clone(),
                sku,
                name,
            }),
            _ => None,
        };
        ExportLineItem {
            id: row.id,
            tile_id: row.tile_id,
            quantity: row.quantity,
            price_cents: row.price_cents,
            tile,
        }
    }
}

const HEADER_COLUMNS: &str =
    "id, actor_id, actor_username, total_boxes, total_value_cents, note, created_at";

/// Repository for export reads.
#[derive(Debug, Clone)]
pub struct ExportRepository {
    pool: SqlitePool,
}

impl ExportRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ExportRepository { pool }
    }

    /// Newest first. `actor_id` restricts the listing to one sub-admin.
    pub async fn list(&self, actor_id: Option<&str>) -> DbResult<Vec<ExportRecord>> {
        debug!(actor_id = ?actor_id, "Listing exports");

        let sql = format!(
            "SELECT {} FROM exports WHERE (?1 IS NULL OR actor_id = ?1) \
             ORDER BY created_at DESC, seq DESC",
            HEADER_COLUMNS
        );
        let headers = sqlx::query_as::<_, ExportHeaderRow>(&sql)
            .bind(actor_id)
            .fetch_all(&self.pool)
            .await?;

        let ids: Vec<&str> = headers.iter().map(|h| h.id.as_str()).collect();
        let mut items = self.items_for(&ids).await?;

        Ok(headers
            .into_iter()
            .map(|h| {
                let lines = items.remove(&h.id).unwrap_or_default();
                h.into_record(lines)
            })
            .collect())
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<ExportRecord>> {
        let sql = format!("SELECT {} FROM exports WHERE id = ?1", HEADER_COLUMNS);
        let header = sqlx::query_as::<_, ExportHeaderRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        match header {
            Some(h) => {
                let mut items = self.items_for(&[h.id.as_str()]).await?;
                let lines = items.remove(&h.id).unwrap_or_default();
                Ok(Some(h.into_record(lines)))
            }
            None => Ok(None),
        }
    }

    /// Counts exports (for diagnostics).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM exports")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    /// Lines for the given exports in line order, grouped by export id.
    async fn items_for(&self, export_ids: &[&str]) -> DbResult<HashMap<String, Vec<ExportLineItem>>> {
        let mut grouped: HashMap<String, Vec<ExportLineItem>> = HashMap::new();
        if export_ids.is_empty() {
            return Ok(grouped);
        }

        let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(
            r#"
            SELECT
                i.id, i.export_id, i.tile_id, i.quantity, i.price_cents,
                t.sku  AS tile_sku,
                t.name AS tile_name
            FROM export_items i
            LEFT JOIN tiles t ON t.id = i.tile_id
            WHERE i.export_id IN ("#,
        );
        let mut separated = builder.separated(", ");
        for id in export_ids {
            separated.push_bind(id.to_string());
        }
        separated.push_unseparated(") ORDER BY i.export_id, i.line_no");

        let rows = builder
            .build_query_as::<ExportItemRow>()
            .fetch_all(&self.pool)
            .await?;

        for row in rows {
            grouped
                .entry(row.export_id.clone())
                .or_default()
                .push(ExportLineItem::from(row));
        }
        Ok(grouped)
    }
}

// =============================================================================
// Executor-Scoped Statements
// =============================================================================

/// Inserts the header only; lines go through [`insert_item`].
pub async fn insert_header<'e, E>(executor: E, record: &ExportRecord) -> DbResult<()>
where
    E: Executor<'e, Database = Sqlite>,
{
    debug!(id = %record.id, actor = %record.actor_username, "Inserting export");

    sqlx::query(
        r#"
        INSERT INTO exports (
            id, actor_id, actor_username, total_boxes, total_value_cents, note, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
        "#,
    )
    .bind(&record.id)
    .bind(&record.actor_id)
    .bind(&record.actor_username)
    .bind(record.total_boxes)
    .bind(record.total_value_cents)
    .bind(&record.note)
    .bind(record.created_at)
    .execute(executor)
    .await?;

    Ok(())
}

pub async fn insert_item<'e, E>(
    executor: E,
    export_id: &str,
    line_no: i64,
    item: &ExportLineItem,
) -> DbResult<()>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query(
        r#"
        INSERT INTO export_items (id, export_id, line_no, tile_id, quantity, price_cents)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6)
        "#,
    )
    .bind(&item.id)
    .bind(export_id)
    .bind(line_no)
    .bind(&item.tile_id)
    .bind(item.quantity)
    .bind(item.price_cents)
    .execute(executor)
    .await?;

    Ok(())
}
