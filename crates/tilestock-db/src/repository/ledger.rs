//! # Stock Ledger Repository
//!
//! Append and read operations for `stock_ledger`. There are no update or
//! delete statements here; rows only disappear when their tile is deleted.
//!
//! ## Ordering
//! ```text
//! seq (AUTOINCREMENT)   insertion order, tie-breaker
//! created_at            clamped to never precede the previous entry
//!
//! display:  ORDER BY created_at DESC, seq DESC
//! replay:   ORDER BY seq ASC
//! ```

use chrono::{DateTime, Utc};
use sqlx::{Executor, FromRow, Sqlite, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::DbResult;
use tilestock_core::{LedgerEntryView, LedgerKind, StockLedgerEntry, TileSummary};

/// Ledger row joined with its tile.
#[derive(Debug, FromRow)]
struct LedgerRow {
    #[sqlx(flatten)]
    entry: StockLedgerEntry,
    tile_sku: Option<String>,
    tile_name: Option<String>,
}

impl From<LedgerRow> for LedgerEntryView {
    fn from(row: LedgerRow) -> Self {
        let tile = match (row.tile_sku, row.tile_name) {
            (Some(sku), Some(name)) => Some(TileSummary {
                id: row.entry.tile_id.clone(),
                sku,
                name,
            }),
            _ => None,
        };
        LedgerEntryView {
            entry: row.entry,
            tile,
        }
    }
}

/// Repository for ledger reads.
#[derive(Debug, Clone)]
pub struct LedgerRepository {
    pool: SqlitePool,
}

impl LedgerRepository {
    pub fn new(pool: SqlitePool) -> Self {
        LedgerRepository { pool }
    }

    /// Newest entries first, optionally for one tile.
    pub async fn list(&self, tile_id: Option<&str>, limit: i64) -> DbResult<Vec<LedgerEntryView>> {
        debug!(tile_id = ?tile_id, limit, "Listing ledger entries");

        let rows = sqlx::query_as::<_, LedgerRow>(
            r#"
            SELECT
                l.id, l.tile_id, l.kind, l.quantity, l.actor, l.note, l.created_at,
                t.sku  AS tile_sku,
                t.name AS tile_name
            FROM stock_ledger l
            LEFT JOIN tiles t ON t.id = l.tile_id
            WHERE (?1 IS NULL OR l.tile_id = ?1)
            ORDER BY l.created_at DESC, l.seq DESC
            LIMIT ?2
            "#,
        )
        .bind(tile_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(LedgerEntryView::from).collect())
    }

    /// Every entry for a tile in insertion order.
    pub async fn history(&self, tile_id: &str) -> DbResult<Vec<StockLedgerEntry>> {
        history(&self.pool, tile_id).await
    }

    /// Counts entries of one kind for a tile.
    pub async fn count_kind(&self, tile_id: &str, kind: LedgerKind) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM stock_ledger WHERE tile_id = ?1 AND kind = ?2",
        )
        .bind(tile_id)
        .bind(kind)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    /// Counts all entries (for diagnostics).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM stock_ledger")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

// =============================================================================
// Executor-Scoped Statements
// =============================================================================

pub async fn history<'e, E>(executor: E, tile_id: &str) -> DbResult<Vec<StockLedgerEntry>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let entries = sqlx::query_as::<_, StockLedgerEntry>(
        r#"
        SELECT id, tile_id, kind, quantity, actor, note, created_at
        FROM stock_ledger
        WHERE tile_id = ?1
        ORDER BY seq ASC
        "#,
    )
    .bind(tile_id)
    .fetch_all(executor)
    .await?;

    Ok(entries)
}

/// Timestamp for the next entry: `now`, or the last entry's time if the
/// clock has stepped backwards.
///
/// Call after the transaction holds the write lock so the last entry cannot
/// change underneath.
pub async fn next_timestamp<'e, E>(executor: E, now: DateTime<Utc>) -> DbResult<DateTime<Utc>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let last: Option<DateTime<Utc>> =
        sqlx::query_scalar("SELECT created_at FROM stock_ledger ORDER BY seq DESC LIMIT 1")
            .fetch_optional(executor)
            .await?;

    Ok(clamp_timestamp(now, last))
}

pub(crate) fn clamp_timestamp(now: DateTime<Utc>, last: Option<DateTime<Utc>>) -> DateTime<Utc> {
    match last {
        Some(last) if last > now => last,
        _ => now,
    }
}

pub async fn append<'e, E>(executor: E, entry: &StockLedgerEntry) -> DbResult<()>
where
    E: Executor<'e, Database = Sqlite>,
{
    debug!(
        tile_id = %entry.tile_id,
        kind = %entry.kind,
        quantity = entry.quantity,
        "Appending ledger entry"
    );

    sqlx::query(
        r#"
        INSERT INTO stock_ledger (id, tile_id, kind, quantity, actor, note, created_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
        "#,
    )
    .bind(&entry.id)
    .bind(&entry.tile_id)
    .bind(entry.kind)
    .bind(entry.quantity)
    .bind(&entry.actor)
    .bind(&entry.note)
    .bind(entry.created_at)
    .execute(executor)
    .await?;

    Ok(())
}

/// Builds an entry with a fresh id.
pub fn new_entry(
    tile_id: &str,
    kind: LedgerKind,
    quantity: i64,
    actor: &str,
    note: Option<String>,
    created_at: DateTime<Utc>,
) -> StockLedgerEntry {
    StockLedgerEntry {
        id: Uuid::new_v4().to_string(),
        tile_id: tile_id.to_string(),
        kind,
        quantity,
        actor: actor.to_string(),
        note,
        created_at,
    }
}
