//! # Seed Data Generator
//!
//! Populates a development database with tiles, one dispatch operator and
//! a sample export.
//!
//! ## Usage
//! ```bash
//! # Generate 200 tiles (default)
//! cargo run -p tilestock-db --bin seed
//!
//! # Generate custom amount
//! cargo run -p tilestock-db --bin seed -- --count 500
//!
//! # Specify database path
//! cargo run -p tilestock-db --bin seed -- --db ./data/tilestock.db
//! ```
//!
//! Every tile goes through the catalog engine, so SKUs, code images and
//! opening ledger entries are produced exactly as in production.

use std::env;

use tilestock_core::export::ExportLineRequest;
use tilestock_core::{Actor, NewSubAdmin, NewTile, Role};
use tilestock_db::{Database, DbConfig};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const CATEGORIES: &[&str] = &["Ceramic", "Porcelain", "Vitrified", "Mosaic", "Stone"];

const NAMES: &[&str] = &[
    "Marble", "Carrara", "Onyx", "Travertine", "Slate", "Terracotta", "Basalt", "Quartz",
    "Granite", "Limestone", "Sandstone", "Calacatta", "Statuario", "Pietra", "Nero",
];

const SIZES: &[&str] = &["300x300", "600x600", "600x1200", "800x800", "200x1200"];

const FINISHES: &[&str] = &["Glossy", "Matt", "Satin", "Rustic", "Polished"];

const COLORS: &[&str] = &["White", "Ivory", "Grey", "Beige", "Black", "Brown"];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tilestock=debug,sqlx=warn"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let args: Vec<String> = env::args().collect();

    let mut count: usize = 200;
    let mut db_path = String::from("./tilestock_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--count" | "-c" => {
                if i + 1 < args.len() {
                    count = args[i + 1].parse().unwrap_or(200);
                    i += 1;
                }
            }
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Tilestock Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -c, --count <N>    Number of tiles to generate (default: 200)");
                println!("  -d, --db <PATH>    Database file path (default: ./tilestock_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    info!(db = %db_path, count, "Seeding database");

    let db = Database::new(DbConfig::new(&db_path)).await?;

    let existing = db.tiles().count().await?;
    if existing > 0 {
        warn!(existing, "Database already has tiles, skipping seed");
        return Ok(());
    }

    let admin = Actor::new("seed-admin", "admin", Role::Admin);
    let catalog = db.catalog();
    let start = std::time::Instant::now();

    let mut created = Vec::with_capacity(count);
    for seed in 0..count {
        match catalog.create_tile(&admin, generate_tile(seed)).await {
            Ok(tile) => created.push(tile),
            Err(e) => warn!(seed, error = %e, "Failed to create tile"),
        }
        if (seed + 1) % 50 == 0 {
            info!(generated = seed + 1, "Progress");
        }
    }

    let elapsed = start.elapsed();
    info!(
        generated = created.len(),
        elapsed_ms = elapsed.as_millis() as u64,
        "Tiles created"
    );

    let operator = db
        .accounts()
        .create_sub_admin(
            &admin,
            NewSubAdmin {
                username: "dock1".into(),
                pass_key: "dock1-dev".into(),
                display_name: "Dock Operator".into(),
            },
        )
        .await?;

    let cart: Vec<ExportLineRequest> = created
        .iter()
        .filter(|t| t.stock_qty > 0)
        .take(3)
        .map(|t| ExportLineRequest::new(&t.id, 2))
        .collect();
    if !cart.is_empty() {
        let record = db
            .exports()
            .create_export(&operator.actor(), &cart, Some("Seed dispatch"))
            .await?;
        info!(export_id = %record.id, total_boxes = record.total_boxes, "Sample export created");
    }

    let summary = catalog.inventory_summary().await?;
    info!(
        tiles = summary.tile_count,
        boxes = summary.total_boxes,
        low_stock = summary.low_stock_count,
        "Seed complete"
    );

    Ok(())
}

/// Builds deterministic tile input from an index.
fn generate_tile(seed: usize) -> NewTile {
    let name = NAMES[seed % NAMES.len()];
    let color = COLORS[(seed / NAMES.len()) % COLORS.len()];

    NewTile {
        name: format!("{} {}", name, color),
        category: CATEGORIES[seed % CATEGORIES.len()].to_string(),
        size: SIZES[(seed / 3) % SIZES.len()].to_string(),
        finish: FINISHES[(seed / 7) % FINISHES.len()].to_string(),
        color: color.to_string(),
        // 250.00 - 1249.00 per box
        price_per_box_cents: 25_000 + ((seed * 3_700) % 100_000) as i64,
        stock_qty: Some((seed % 61) as i64),
        min_stock: Some(5 + (seed % 4) as i64 * 5),
        ..Default::default()
    }
}
