//! Shared builders for integration tests.

#![allow(dead_code)]

use bazaarlord::domain::{ItemId, OrderLevel, Product, QuickStatus, Snapshot};
use chrono::Utc;

/// Build order levels from `(price, amount)` pairs.
pub fn levels(pairs: &[(f64, u64)]) -> Vec<OrderLevel> {
    pairs.iter().map(|&(p, a)| OrderLevel::new(p, a, 1)).collect()
}

/// A product with explicit books and default quick status.
pub fn product(id: &str, bids: &[(f64, u64)], offers: &[(f64, u64)]) -> Product {
    Product {
        item_id: ItemId::from(id),
        buy_orders: levels(bids),
        sell_orders: levels(offers),
        quick_status: QuickStatus::default(),
    }
}

/// A liquid two-sided market with weighted prices matching the books.
pub fn liquid_product(
    id: &str,
    buy_price: f64,
    sell_price: f64,
    buy_week: u64,
    sell_week: u64,
) -> Product {
    Product {
        item_id: ItemId::from(id),
        buy_orders: levels(&[
            (buy_price, 1_000),
            (buy_price - 0.5, 1_000),
            (buy_price - 1.0, 1_000),
        ]),
        sell_orders: levels(&[
            (sell_price, 1_000),
            (sell_price + 0.5, 1_000),
            (sell_price + 1.0, 1_000),
        ]),
        quick_status: QuickStatus {
            buy_price,
            sell_price,
            buy_volume: 50_000,
            sell_volume: 50_000,
            buy_orders: 30,
            sell_orders: 30,
            buy_moving_week: buy_week,
            sell_moving_week: sell_week,
        },
    }
}

pub fn snapshot(products: Vec<Product>) -> Snapshot {
    Snapshot::new(Utc::now(), products)
}

pub fn assert_near(actual: f64, expected: f64, tolerance: f64) {
    assert!(
        (actual - expected).abs() <= tolerance,
        "expected {expected} ± {tolerance}, got {actual}"
    );
}
