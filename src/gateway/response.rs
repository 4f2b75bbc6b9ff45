//! Raw upstream payload types and their normalization into domain types.
//!
//! The upstream API's field naming is inverted relative to its actual
//! semantics: its "sell order list" holds the resting bids (orders you
//! instant-sell into) and its "buy order list" holds the resting offers
//! (orders you instant-buy from). The summary-statistic counters are
//! cross-wired the same way. Normalization swaps everything on the way
//! in; every downstream formula assumes the corrected orientation.

use std::collections::HashMap;

use serde::Deserialize;

use crate::domain::{ItemId, OrderLevel, Product, QuickStatus};

/// Top-level market snapshot payload.
#[derive(Debug, Deserialize)]
pub struct BazaarResponse {
    pub success: bool,
    #[serde(rename = "lastUpdated")]
    pub last_updated: i64,
    #[serde(default)]
    pub products: HashMap<String, RawProduct>,
}

/// One item's raw market state, upstream orientation.
#[derive(Debug, Deserialize)]
pub struct RawProduct {
    /// Upstream "sell" order list — actually the resting bids.
    #[serde(default)]
    pub sell_summary: Vec<RawOrder>,
    /// Upstream "buy" order list — actually the resting offers.
    #[serde(default)]
    pub buy_summary: Vec<RawOrder>,
    pub quick_status: RawQuickStatus,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawOrder {
    pub price_per_unit: f64,
    pub amount: u64,
    pub orders: u32,
}

/// Raw summary stats, upstream orientation (cross-wired like the lists).
#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct RawQuickStatus {
    #[serde(default)]
    pub buy_price: f64,
    #[serde(default)]
    pub buy_volume: u64,
    #[serde(default)]
    pub buy_orders: u32,
    #[serde(default)]
    pub buy_moving_week: u64,
    #[serde(default)]
    pub sell_price: f64,
    #[serde(default)]
    pub sell_volume: u64,
    #[serde(default)]
    pub sell_orders: u32,
    #[serde(default)]
    pub sell_moving_week: u64,
}

impl RawProduct {
    /// Normalize into the corrected orientation.
    ///
    /// Order lists and every summary counter swap sides: upstream
    /// `sell_summary` becomes `buy_orders`, upstream `sell_*` stats
    /// become `buy_*` stats, and vice versa.
    #[must_use]
    pub fn normalize(self, item_id: ItemId) -> Product {
        let raw = self.quick_status;
        Product {
            item_id,
            buy_orders: self.sell_summary.into_iter().map(OrderLevel::from).collect(),
            sell_orders: self.buy_summary.into_iter().map(OrderLevel::from).collect(),
            quick_status: QuickStatus {
                buy_price: raw.sell_price,
                sell_price: raw.buy_price,
                buy_volume: raw.sell_volume,
                sell_volume: raw.buy_volume,
                buy_orders: raw.sell_orders,
                sell_orders: raw.buy_orders,
                buy_moving_week: raw.sell_moving_week,
                sell_moving_week: raw.buy_moving_week,
            },
        }
    }
}

impl From<RawOrder> for OrderLevel {
    fn from(raw: RawOrder) -> Self {
        Self::new(raw.price_per_unit, raw.amount, raw.orders)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalization_swaps_lists_and_counters() {
        let payload = r#"{
            "sell_summary": [{"pricePerUnit": 95.0, "amount": 40, "orders": 3}],
            "buy_summary": [{"pricePerUnit": 100.0, "amount": 60, "orders": 4}],
            "quick_status": {
                "buyPrice": 101.0, "buyVolume": 600, "buyOrders": 4, "buyMovingWeek": 70000,
                "sellPrice": 94.0, "sellVolume": 400, "sellOrders": 3, "sellMovingWeek": 50000
            }
        }"#;
        let raw: RawProduct = serde_json::from_str(payload).unwrap();
        let product = raw.normalize(ItemId::from("TEST"));

        // Upstream "sell" list became the bids; best bid below best offer.
        assert_eq!(product.best_buy_price(), Some(95.0));
        assert_eq!(product.best_sell_price(), Some(100.0));
        assert!(product.has_valid_spread());

        let qs = product.quick_status;
        assert_eq!(qs.buy_price, 94.0);
        assert_eq!(qs.sell_price, 101.0);
        assert_eq!(qs.buy_volume, 400);
        assert_eq!(qs.sell_volume, 600);
        assert_eq!(qs.buy_orders, 3);
        assert_eq!(qs.sell_orders, 4);
        assert_eq!(qs.buy_moving_week, 50000);
        assert_eq!(qs.sell_moving_week, 70000);
    }

    #[test]
    fn missing_lists_default_to_empty() {
        let payload = r#"{"quick_status": {}}"#;
        let raw: RawProduct = serde_json::from_str(payload).unwrap();
        let product = raw.normalize(ItemId::from("EMPTY"));
        assert!(product.buy_orders.is_empty());
        assert!(product.sell_orders.is_empty());
    }
}
