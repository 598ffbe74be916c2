//! # Catalog Engine
//!
//! Tile create, update and delete, plus catalog reads and reports.
//!
//! ## Create Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  create_tile(admin, NewTile { stock_qty: 50, .. })                     │
//! │                                                                         │
//! │  attempt 1..=SKU_MAX_ATTEMPTS                                          │
//! │    sku = generator.propose(category, name)                             │
//! │    BEGIN                                                                │
//! │      INSERT sku_registry (sku)     ── UNIQUE fails ──► ROLLBACK, retry │
//! │      render code image from the tile snapshot                          │
//! │      INSERT tiles (stock_qty = 50)                                     │
//! │      INSERT stock_ledger (ADD 50, "Opening stock ...")  only if > 0    │
//! │    COMMIT                                                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{debug, info, warn};

use tilestock_core::code::render_tile_code;
use tilestock_core::sku::SkuGenerator;
use tilestock_core::validation::{
    normalize_optional, validate_new_tile, validate_required, validate_tile_patch,
};
use tilestock_core::{
    decode_sku, Actor, CodeRenderer, CoreError, CoreResult, InventorySummary, LedgerKind,
    NewTile, Tile, TilePatch, DEFAULT_MIN_STOCK, DEFAULT_THICKNESS, SKU_MAX_ATTEMPTS,
};

use super::{begin, commit};
use crate::repository::ledger;
use crate::repository::tile::{self, generate_tile_id, TileRepository};

const OPENING_NOTE: &str = "Opening stock on tile creation";

/// Tile catalog operations.
#[derive(Clone)]
pub struct CatalogEngine {
    pool: SqlitePool,
    renderer: Arc<dyn CodeRenderer>,
    skus: Arc<dyn SkuGenerator>,
}

impl CatalogEngine {
    pub fn new(
        pool: SqlitePool,
        renderer: Arc<dyn CodeRenderer>,
        skus: Arc<dyn SkuGenerator>,
    ) -> Self {
        CatalogEngine {
            pool,
            renderer,
            skus,
        }
    }

    fn tiles(&self) -> TileRepository {
        TileRepository::new(self.pool.clone())
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Creates a tile with a fresh SKU and its opening ledger entry.
    ///
    /// ## When This Fails
    /// - `Unauthorized`: actor is not an admin
    /// - `Validation`: missing attribute, non-positive price, bad quantity
    /// - `TransactionFailed`: storage error, or every SKU attempt collided
    pub async fn create_tile(&self, actor: &Actor, input: NewTile) -> CoreResult<Tile> {
        actor.require_admin("create tiles")?;
        validate_new_tile(&input)?;

        for attempt in 1..=SKU_MAX_ATTEMPTS {
            let sku = self.skus.propose(&input.category, &input.name);

            match self.try_create(actor, &input, sku.clone()).await? {
                Some(tile) => {
                    info!(id = %tile.id, sku = %tile.sku, stock = tile.stock_qty, "Tile created");
                    return Ok(tile);
                }
                None => debug!(sku = %sku, attempt, "SKU already issued, retrying"),
            }
        }

        warn!(attempts = SKU_MAX_ATTEMPTS, "Could not allocate a unique SKU");
        Err(CoreError::TransactionFailed(format!(
            "could not allocate a unique SKU after {} attempts",
            SKU_MAX_ATTEMPTS
        )))
    }

    /// One create attempt. `Ok(None)` when the SKU was already issued.
    async fn try_create(&self, actor: &Actor, input: &NewTile, sku: String) -> CoreResult<Option<Tile>> {
        let now = Utc::now();
        let mut tx = begin(&self.pool).await?;

        match tile::register_sku(&mut *tx, &sku, now).await {
            Ok(()) => {}
            Err(e) if e.is_unique_on("sku_registry.sku") => return Ok(None),
            Err(e) => return Err(e.into()),
        }

        let opening = input.stock_qty.unwrap_or(0);
        let mut created = Tile {
            id: generate_tile_id(),
            sku,
            name: validate_required("name", &input.name)?,
            category: validate_required("category", &input.category)?,
            size: validate_required("size", &input.size)?,
            finish: validate_required("finish", &input.finish)?,
            color: validate_required("color", &input.color)?,
            thickness: match &input.thickness {
                Some(t) => validate_required("thickness", t)?,
                None => DEFAULT_THICKNESS.to_string(),
            },
            description: normalize_optional("description", input.description.as_deref())?,
            image_url: normalize_optional("image_url", input.image_url.as_deref())?,
            price_per_box_cents: input.price_per_box_cents,
            stock_qty: opening,
            min_stock: input.min_stock.unwrap_or(DEFAULT_MIN_STOCK),
            code_image: String::new(),
            created_at: now,
            updated_at: now,
        };
        created.code_image = render_tile_code(self.renderer.as_ref(), &created)?;

        match tile::insert(&mut *tx, &created).await {
            Ok(()) => {}
            Err(e) if e.is_unique_on("tiles.sku") => return Ok(None),
            Err(e) => return Err(e.into()),
        }

        if opening > 0 {
            let at = ledger::next_timestamp(&mut *tx, now).await?;
            let entry = ledger::new_entry(
                &created.id,
                LedgerKind::Add,
                opening,
                &actor.username,
                Some(OPENING_NOTE.to_string()),
                at,
            );
            ledger::append(&mut *tx, &entry).await?;
        }

        commit(tx).await?;
        Ok(Some(created))
    }

    /// Applies a partial update and regenerates the code image.
    ///
    /// The SKU and stock are never changed here.
    pub async fn update_tile(&self, actor: &Actor, id: &str, patch: TilePatch) -> CoreResult<Tile> {
        actor.require_admin("update tiles")?;
        validate_tile_patch(&patch)?;
        let patch = normalize_patch(patch)?;

        let now = Utc::now();
        let mut tx = begin(&self.pool).await?;

        let mut updated = tile::apply_patch(&mut *tx, id, &patch, now)
            .await?
            .ok_or_else(|| CoreError::not_found("Tile", id))?;

        updated.code_image = render_tile_code(self.renderer.as_ref(), &updated)?;
        tile::set_code_image(&mut *tx, id, &updated.code_image).await?;

        commit(tx).await?;

        info!(id = %updated.id, sku = %updated.sku, "Tile updated");
        Ok(updated)
    }

    /// Hard-deletes a tile and its ledger. Export history keeps its lines.
    pub async fn delete_tile(&self, actor: &Actor, id: &str) -> CoreResult<()> {
        actor.require_admin("delete tiles")?;

        if !tile::delete(&self.pool, id).await? {
            return Err(CoreError::not_found("Tile", id));
        }

        info!(id = %id, "Tile deleted");
        Ok(())
    }

    // =========================================================================
    // Reads
    // =========================================================================

    pub async fn get_tile(&self, id: &str) -> CoreResult<Tile> {
        self.tiles()
            .get_by_id(id)
            .await?
            .ok_or_else(|| CoreError::not_found("Tile", id))
    }

    /// Looks a tile up by SKU, ignoring case.
    pub async fn get_by_sku(&self, sku: &str) -> CoreResult<Tile> {
        self.tiles()
            .get_by_sku(sku)
            .await?
            .ok_or_else(|| CoreError::not_found("Tile with SKU", sku.trim()))
    }

    /// Decodes raw scanner output and finds the tile it names.
    ///
    /// ## When This Fails
    /// - `CodeDecode`: no SKU could be extracted
    /// - `NotFound`: the SKU is not in the catalog
    pub async fn resolve_scan(&self, raw: &str) -> CoreResult<Tile> {
        let sku = decode_sku(raw)?;
        debug!(sku = %sku, "Resolving scanned code");
        self.get_by_sku(&sku).await
    }

    /// Every tile, newest first.
    pub async fn list_tiles(&self) -> CoreResult<Vec<Tile>> {
        Ok(self.tiles().list().await?)
    }

    /// Tiles with `stock_qty <= min_stock`.
    pub async fn low_stock(&self) -> CoreResult<Vec<Tile>> {
        Ok(self.tiles().low_stock().await?)
    }

    pub async fn inventory_summary(&self) -> CoreResult<InventorySummary> {
        Ok(self.tiles().summary().await?)
    }
}

/// Trims text fields; a blank description or image means "clear it".
fn normalize_patch(patch: TilePatch) -> CoreResult<TilePatch> {
    let trim = |v: Option<String>| v.map(|s| s.trim().to_string());

    let description = match patch.description {
        Some(value) => Some(normalize_optional("description", value.as_deref())?),
        None => None,
    };
    let image_url = match patch.image_url {
        Some(value) => Some(normalize_optional("image_url", value.as_deref())?),
        None => None,
    };

    Ok(TilePatch {
        name: trim(patch.name),
        category: trim(patch.category),
        size: trim(patch.size),
        finish: trim(patch.finish),
        color: trim(patch.color),
        thickness: trim(patch.thickness),
        price_per_box_cents: patch.price_per_box_cents,
        min_stock: patch.min_stock,
        description,
        image_url,
    })
}

// =============================================================================
// Unit Tests
// =============================================================================
