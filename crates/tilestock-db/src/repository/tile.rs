//! # Tile Repository
//!
//! Database operations for the tile catalog.
//!
//! ## Two Kinds of Operations
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  TileRepository methods        pool-backed reads                       │
//! │    get_by_id, get_by_sku, list, get_many, low_stock, summary           │
//! │                                                                         │
//! │  module functions              run on any executor, usually `&mut *tx` │
//! │    register_sku, insert, apply_stock_delta, apply_patch,               │
//! │    set_code_image, delete                                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Write-First Updates
//! Stock and patch updates are a single `UPDATE .. RETURNING` that computes
//! the new value inside SQLite. Run as the first statement of a transaction it
//! takes the write lock before anything is read, so two concurrent REDUCE(10)
//! calls on stock 15 serialize to 5 then 0 instead of both writing 5.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sqlx::{Executor, QueryBuilder, Sqlite, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::DbResult;
use tilestock_core::{InventorySummary, LedgerKind, Tile, TilePatch};

/// Column list matching [`Tile`]'s `FromRow` layout.
pub(crate) const TILE_COLUMNS: &str = "id, sku, name, category, size, finish, color, thickness, \
     description, image_url, price_per_box_cents, stock_qty, min_stock, code_image, \
     created_at, updated_at";

/// Repository for tile reads.
#[derive(Debug, Clone)]
pub struct TileRepository {
    pool: SqlitePool,
}

impl TileRepository {
    /// Creates a new TileRepository.
    pub fn new(pool: SqlitePool) -> Self {
        TileRepository { pool }
    }

    /// Gets a tile by its ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Tile>> {
        fetch_by_id(&self.pool, id).await
    }

    /// Gets a tile by SKU, ignoring case.
    pub async fn get_by_sku(&self, sku: &str) -> DbResult<Option<Tile>> {
        let sql = format!(
            "SELECT {} FROM tiles WHERE sku = ?1 COLLATE NOCASE",
            TILE_COLUMNS
        );
        let tile = sqlx::query_as::<_, Tile>(&sql)
            .bind(sku.trim())
            .fetch_optional(&self.pool)
            .await?;

        Ok(tile)
    }

    /// Lists every tile, newest first.
    pub async fn list(&self) -> DbResult<Vec<Tile>> {
        let sql = format!(
            "SELECT {} FROM tiles ORDER BY created_at DESC, rowid DESC",
            TILE_COLUMNS
        );
        let tiles = sqlx::query_as::<_, Tile>(&sql)
            .fetch_all(&self.pool)
            .await?;

        debug!(count = tiles.len(), "Listed tiles");
        Ok(tiles)
    }

    /// Reads the given tiles in one query, keyed by id. Unknown ids are absent.
    pub async fn get_many(&self, ids: &[&str]) -> DbResult<HashMap<String, Tile>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let mut builder: QueryBuilder<Sqlite> =
            QueryBuilder::new(format!("SELECT {} FROM tiles WHERE id IN (", TILE_COLUMNS));
        let mut separated = builder.separated(", ");
        for id in ids {
            separated.push_bind(id.to_string());
        }
        separated.push_unseparated(")");

        let tiles = builder
            .build_query_as::<Tile>()
            .fetch_all(&self.pool)
            .await?;

        Ok(tiles.into_iter().map(|t| (t.id.clone(), t)).collect())
    }

    /// Tiles at or below their reorder threshold, emptiest first.
    pub async fn low_stock(&self) -> DbResult<Vec<Tile>> {
        let sql = format!(
            "SELECT {} FROM tiles WHERE stock_qty <= min_stock ORDER BY stock_qty ASC, name ASC",
            TILE_COLUMNS
        );
        let tiles = sqlx::query_as::<_, Tile>(&sql)
            .fetch_all(&self.pool)
            .await?;

        Ok(tiles)
    }

    /// Catalog-wide totals.
    pub async fn summary(&self) -> DbResult<InventorySummary> {
        let summary = sqlx::query_as::<_, InventorySummary>(
            r#"
            SELECT
                COUNT(*)                                                  AS tile_count,
                COALESCE(SUM(stock_qty), 0)                               AS total_boxes,
                COALESCE(SUM(stock_qty * price_per_box_cents), 0)         AS stock_value_cents,
                COALESCE(SUM(CASE WHEN stock_qty <= min_stock THEN 1 ELSE 0 END), 0)
                                                                          AS low_stock_count
            FROM tiles
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(summary)
    }

    /// Counts tiles (for diagnostics).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM tiles")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

// =============================================================================
// Executor-Scoped Statements
// =============================================================================

pub async fn fetch_by_id<'e, E>(executor: E, id: &str) -> DbResult<Option<Tile>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let sql = format!("SELECT {} FROM tiles WHERE id = ?1", TILE_COLUMNS);
    let tile = sqlx::query_as::<_, Tile>(&sql)
        .bind(id)
        .fetch_optional(executor)
        .await?;

    Ok(tile)
}

/// Records an issued SKU.
///
/// ## When This Fails
/// `DbError::UniqueViolation { field: "sku_registry.sku" }` when the SKU was
/// issued before, even if its tile has since been deleted.
pub async fn register_sku<'e, E>(executor: E, sku: &str, now: DateTime<Utc>) -> DbResult<()>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query("INSERT INTO sku_registry (sku, issued_at) VALUES (?1, ?2)")
        .bind(sku)
        .bind(now)
        .execute(executor)
        .await?;

    Ok(())
}

pub async fn insert<'e, E>(executor: E, tile: &Tile) -> DbResult<()>
where
    E: Executor<'e, Database = Sqlite>,
{
    debug!(id = %tile.id, sku = %tile.sku, "Inserting tile");

    sqlx::query(
        r#"
        INSERT INTO tiles (
            id, sku, name, category, size, finish, color, thickness,
            description, image_url, price_per_box_cents, stock_qty, min_stock,
            code_image, created_at, updated_at
        ) VALUES (
            ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8,
            ?9, ?10, ?11, ?12, ?13,
            ?14, ?15, ?16
        )
        "#,
    )
    .bind(&tile.id)
    .bind(&tile.sku)
    .bind(&tile.name)
    .bind(&tile.category)
    .bind(&tile.size)
    .bind(&tile.finish)
    .bind(&tile.color)
    .bind(&tile.thickness)
    .bind(&tile.description)
    .bind(&tile.image_url)
    .bind(tile.price_per_box_cents)
    .bind(tile.stock_qty)
    .bind(tile.min_stock)
    .bind(&tile.code_image)
    .bind(tile.created_at)
    .bind(tile.updated_at)
    .execute(executor)
    .await?;

    Ok(())
}

/// Applies one stock step in SQL and returns the updated row.
///
/// ## Delta Expressions
/// ```text
/// ADD          stock_qty + q, saturating at i64::MAX
/// REDUCE/SALE  MAX(0, stock_qty - q)
/// ADJUSTMENT   q
/// ```
///
/// `Ok(None)` when the tile does not exist.
pub async fn apply_stock_delta<'e, E>(
    executor: E,
    id: &str,
    kind: LedgerKind,
    quantity: i64,
    now: DateTime<Utc>,
) -> DbResult<Option<Tile>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let expr = match kind {
        LedgerKind::Add => {
            "CASE WHEN stock_qty > 9223372036854775807 - ?1 THEN 9223372036854775807 \
             ELSE stock_qty + ?1 END"
        }
        LedgerKind::Reduce | LedgerKind::Sale => "MAX(0, stock_qty - ?1)",
        LedgerKind::Adjustment => "?1",
    };

    debug!(id = %id, kind = %kind, quantity, "Applying stock delta");

    let sql = format!(
        "UPDATE tiles SET stock_qty = {}, updated_at = ?2 WHERE id = ?3 RETURNING {}",
        expr, TILE_COLUMNS
    );
    let tile = sqlx::query_as::<_, Tile>(&sql)
        .bind(quantity)
        .bind(now)
        .bind(id)
        .fetch_optional(executor)
        .await?;

    Ok(tile)
}

/// Applies a validated patch and returns the updated row.
///
/// Text fields are expected trimmed. `Ok(None)` when the tile does not exist.
pub async fn apply_patch<'e, E>(
    executor: E,
    id: &str,
    patch: &TilePatch,
    now: DateTime<Utc>,
) -> DbResult<Option<Tile>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let sql = format!(
        r#"
        UPDATE tiles SET
            name                = COALESCE(?1, name),
            category            = COALESCE(?2, category),
            size                = COALESCE(?3, size),
            finish              = COALESCE(?4, finish),
            color               = COALESCE(?5, color),
            thickness           = COALESCE(?6, thickness),
            price_per_box_cents = COALESCE(?7, price_per_box_cents),
            min_stock           = COALESCE(?8, min_stock),
            description         = CASE WHEN ?9 THEN ?10 ELSE description END,
            image_url           = CASE WHEN ?11 THEN ?12 ELSE image_url END,
            updated_at          = ?13
        WHERE id = ?14
        RETURNING {}
        "#,
        TILE_COLUMNS
    );

    let tile = sqlx::query_as::<_, Tile>(&sql)
        .bind(&patch.name)
        .bind(&patch.category)
        .bind(&patch.size)
        .bind(&patch.finish)
        .bind(&patch.color)
        .bind(&patch.thickness)
        .bind(patch.price_per_box_cents)
        .bind(patch.min_stock)
        .bind(patch.description.is_some())
        .bind(patch.description.clone().flatten())
        .bind(patch.image_url.is_some())
        .bind(patch.image_url.clone().flatten())
        .bind(now)
        .bind(id)
        .fetch_optional(executor)
        .await?;

    Ok(tile)
}

pub async fn set_code_image<'e, E>(executor: E, id: &str, code_image: &str) -> DbResult<()>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query("UPDATE tiles SET code_image = ?1 WHERE id = ?2")
        .bind(code_image)
        .bind(id)
        .execute(executor)
        .await?;

    Ok(())
}

/// Hard-deletes a tile. Its ledger rows cascade; export lines are untouched.
///
/// Returns whether a row was deleted.
pub async fn delete<'e, E>(executor: E, id: &str) -> DbResult<bool>
where
    E: Executor<'e, Database = Sqlite>,
{
    debug!(id = %id, "Deleting tile");

    let result = sqlx::query("DELETE FROM tiles WHERE id = ?1")
        .bind(id)
        .execute(executor)
        .await?;

    Ok(result.rows_affected() > 0)
}

/// Helper to generate a new tile ID.
pub fn generate_tile_id() -> String {
    Uuid::new_v4().to_string()
}
