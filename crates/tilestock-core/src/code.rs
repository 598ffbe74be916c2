//! # Code Payload
//!
//! Encoder and lenient decoder for the data printed into a tile's scannable
//! code, plus the [`CodeRenderer`] seam that turns a payload into an image
//! handle.
//!
//! ## Round Trip
//! ```text
//! ┌──────────┐  encode_payload  ┌──────────────────────────────┐  render  ┌───────────┐
//! │   Tile   │ ───────────────► │ {"sku":"CE-MAR-4821",...}    │ ───────► │ codeImage │
//! └──────────┘                  └──────────────────────────────┘          └───────────┘
//!                                              ▲
//!                                              │ printed, scanned, re-entered
//!                                              ▼
//!                               decode_sku(raw) ──► "CE-MAR-4821"
//! ```
//!
//! ## Accepted Scanner Output
//! | Raw input                       | Result                           |
//! |---------------------------------|----------------------------------|
//! | `{"sku":"CE-MAR-4821", ...}`    | `CE-MAR-4821`                    |
//! | `{"SKU":"CE-MAR-4821"}`         | `CE-MAR-4821` (key case ignored) |
//! | `{"sku_code":"..."}`, `code`, `id` | fallback identifier keys      |
//! | `CE-MAR-4821`                   | `CE-MAR-4821` (not JSON)         |
//! | `"CE-MAR-4821"`                 | `CE-MAR-4821` (JSON string)      |
//! | `{}`, `null`, `[..]`, blank     | `CodeDecode` error               |

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::Tile;

/// Identifier keys, in priority order, after normalization.
const SKU_KEYS: [&str; 4] = ["sku", "skucode", "code", "id"];

// =============================================================================
// Payload
// =============================================================================

/// Specification snapshot encoded into a tile's code.
///
/// Field order is the wire order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CodePayload {
    pub sku: String,
    pub name: String,
    pub category: String,
    pub size: String,
    pub finish: String,
    pub color: String,
    pub thickness: String,
    /// Major units (e.g. `450.5`).
    pub price_per_box: f64,
}

impl CodePayload {
    pub fn from_tile(tile: &Tile) -> Self {
        CodePayload {
            sku: tile.sku.clone(),
            name: tile.name.clone(),
            category: tile.category.clone(),
            size: tile.size.clone(),
            finish: tile.finish.clone(),
            color: tile.color.clone(),
            thickness: tile.thickness.clone(),
            price_per_box: Money::from_cents(tile.price_per_box_cents).as_major_f64(),
        }
    }
}

/// Serializes a payload. Deterministic for a given snapshot.
pub fn encode_payload(payload: &CodePayload) -> CoreResult<String> {
    serde_json::to_string(payload)
        .map_err(|e| CoreError::invalid(format!("unencodable code payload: {}", e)))
}

// =============================================================================
// Decoder
// =============================================================================

/// Extracts a SKU lookup key from raw scanner output.
///
/// ## Example
/// ```rust
/// use tilestock_core::decode_sku;
///
/// assert_eq!(decode_sku("ABC-123").unwrap(), "ABC-123");
/// assert_eq!(decode_sku(r#"{"SKU":"ABC-123"}"#).unwrap(), "ABC-123");
/// assert!(decode_sku("{}").is_err());
/// ```
pub fn decode_sku(raw: &str) -> CoreResult<String> {
    let trimmed = raw.trim();
    let fail = || CoreError::CodeDecode {
        raw: raw.to_string(),
    };

    if trimmed.is_empty() {
        return Err(fail());
    }

    let sku = match serde_json::from_str::<Value>(trimmed) {
        Ok(Value::Object(map)) => sku_from_object(&map),
        Ok(Value::String(s)) => Some(s.trim().to_string()),
        Ok(Value::Number(_)) => Some(trimmed.to_string()),
        Ok(_) => None,
        // Not structured: the whole input is the SKU.
        Err(_) => Some(trimmed.to_string()),
    };

    sku.filter(|s| !s.is_empty()).ok_or_else(fail)
}

fn sku_from_object(map: &Map<String, Value>) -> Option<String> {
    SKU_KEYS.iter().find_map(|wanted| {
        map.iter()
            .filter(|(key, _)| normalize_key(key) == *wanted)
            .find_map(|(_, value)| usable_identifier(value))
    })
}

/// `"SKU"`, `"Sku"`, `"sku_code"`, `"skuCode"`, `"SKU-CODE"` all normalize
/// onto the same key.
fn normalize_key(key: &str) -> String {
    key.chars()
        .filter(|c| !matches!(c, '_' | '-'))
        .flat_map(char::to_lowercase)
        .collect()
}

fn usable_identifier(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

// =============================================================================
// Renderer Seam
// =============================================================================

/// Turns a payload into the opaque handle stored as `Tile::code_image`.
///
/// Implementations run synchronously inside catalog and stock transactions,
/// so they must not block on I/O.
pub trait CodeRenderer: Send + Sync {
    fn render(&self, payload: &str) -> CoreResult<String>;
}

/// Stores the payload itself as the handle. Image generation is left to the
/// presentation layer.
#[derive(Debug, Clone, Copy, Default)]
pub struct PayloadRenderer;

impl CodeRenderer for PayloadRenderer {
    fn render(&self, payload: &str) -> CoreResult<String> {
        Ok(payload.to_string())
    }
}

/// Encodes the tile's current snapshot and renders it.
pub fn render_tile_code(renderer: &dyn CodeRenderer, tile: &Tile) -> CoreResult<String> {
    let payload = encode_payload(&CodePayload::from_tile(tile))?;
    renderer.render(&payload)
}

// =============================================================================
// Unit Tests
// =============================================================================
