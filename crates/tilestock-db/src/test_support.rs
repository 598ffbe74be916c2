//! Shared fixtures for the engine tests.

use std::collections::VecDeque;
use std::sync::Mutex;

use tilestock_core::sku::SkuGenerator;
use tilestock_core::{Actor, NewTile, Role};

use crate::pool::{Database, DbConfig};

pub(crate) async fn setup() -> Database {
    Database::new(DbConfig::in_memory()).await.unwrap()
}

pub(crate) fn admin() -> Actor {
    Actor::new("admin-1", "admin", Role::Admin)
}

pub(crate) fn sub_admin(id: &str) -> Actor {
    Actor::new(id, format!("operator-{}", id), Role::SubAdmin)
}

pub(crate) fn new_tile(name: &str, price_cents: i64, stock: i64) -> NewTile {
    NewTile {
        name: name.into(),
        category: "Ceramic".into(),
        size: "600x600".into(),
        finish: "Glossy".into(),
        color: "White".into(),
        price_per_box_cents: price_cents,
        stock_qty: Some(stock),
        ..Default::default()
    }
}

/// Hands out the given SKUs in order, then keeps repeating the last one.
pub(crate) struct FixedSkus {
    queue: Mutex<VecDeque<String>>,
    last: Mutex<String>,
}

impl FixedSkus {
    pub(crate) fn new(skus: &[&str]) -> Self {
        FixedSkus {
            queue: Mutex::new(skus.iter().map(|s| s.to_string()).collect()),
            last: Mutex::new(skus.last().map(|s| s.to_string()).unwrap_or_default()),
        }
    }
}

impl SkuGenerator for FixedSkus {
    fn propose(&self, _category: &str, _name: &str) -> String {
        match self.queue.lock().unwrap().pop_front() {
            Some(sku) => {
                *self.last.lock().unwrap() = sku.clone();
                sku
            }
            None => self.last.lock().unwrap().clone(),
        }
    }
}
