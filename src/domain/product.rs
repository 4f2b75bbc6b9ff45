//! Normalized per-item market view.
//!
//! A [`Product`] is the corrected-orientation view of one item's order
//! books: `buy_orders` are resting bids sorted highest price first,
//! `sell_orders` are resting offers sorted lowest price first. The
//! gateway is responsible for producing this orientation from the
//! upstream feed's inverted field naming.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::id::ItemId;

/// Hours in the 7-day rolling window the upstream feed reports volume over.
pub const HOURS_PER_WEEK: f64 = 168.0;

/// A single price level in an order book.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct OrderLevel {
    /// Price per unit at this level.
    pub price_per_unit: f64,
    /// Total item count resting at this level.
    pub amount: u64,
    /// Number of distinct orders aggregated into this level.
    pub orders: u32,
}

impl OrderLevel {
    #[must_use]
    pub const fn new(price_per_unit: f64, amount: u64, orders: u32) -> Self {
        Self {
            price_per_unit,
            amount,
            orders,
        }
    }
}

/// Aggregate statistics for one item, corrected orientation.
///
/// `buy_*` fields describe the buy side (resting bids), `sell_*` fields
/// the sell side (resting offers). Weekly movement counters are 7-day
/// rolling trade volumes.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct QuickStatus {
    /// Volume-weighted average price over the top slice of buy orders.
    pub buy_price: f64,
    /// Volume-weighted average price over the top slice of sell orders.
    pub sell_price: f64,
    /// Total item count resting in buy orders.
    pub buy_volume: u64,
    /// Total item count resting in sell orders.
    pub sell_volume: u64,
    /// Number of open buy orders.
    pub buy_orders: u32,
    /// Number of open sell orders.
    pub sell_orders: u32,
    /// Items instant-sold into buy orders over the last 7 days.
    pub buy_moving_week: u64,
    /// Items instant-bought from sell orders over the last 7 days.
    pub sell_moving_week: u64,
}

/// One tradeable item's normalized market state.
#[derive(Debug, Clone, Serialize)]
pub struct Product {
    pub item_id: ItemId,
    /// Resting bids, best (highest) price first. Truncated by the
    /// upstream API to a bounded prefix, not the full book.
    pub buy_orders: Vec<OrderLevel>,
    /// Resting offers, best (lowest) price first. Truncated likewise.
    pub sell_orders: Vec<OrderLevel>,
    pub quick_status: QuickStatus,
}

impl Product {
    /// Best resting bid price, if any buy orders exist.
    #[must_use]
    pub fn best_buy_price(&self) -> Option<f64> {
        self.buy_orders.first().map(|l| l.price_per_unit)
    }

    /// Best resting offer price, if any sell orders exist.
    #[must_use]
    pub fn best_sell_price(&self) -> Option<f64> {
        self.sell_orders.first().map(|l| l.price_per_unit)
    }

    /// A valid two-sided spread: positive best bid at or below best offer.
    ///
    /// Items failing this are excluded from profit-seeking strategies.
    #[must_use]
    pub fn has_valid_spread(&self) -> bool {
        match (self.best_buy_price(), self.best_sell_price()) {
            (Some(buy), Some(sell)) => buy > 0.0 && sell >= buy,
            _ => false,
        }
    }

    /// Best offer minus best bid, when both sides exist.
    #[must_use]
    pub fn spread(&self) -> Option<f64> {
        match (self.best_buy_price(), self.best_sell_price()) {
            (Some(buy), Some(sell)) => Some(sell - buy),
            _ => None,
        }
    }

    /// Items per hour instant-sold into buy orders, from weekly movement.
    #[must_use]
    pub fn hourly_buy_rate(&self) -> f64 {
        self.quick_status.buy_moving_week as f64 / HOURS_PER_WEEK
    }

    /// Items per hour instant-bought from sell orders, from weekly movement.
    #[must_use]
    pub fn hourly_sell_rate(&self) -> f64 {
        self.quick_status.sell_moving_week as f64 / HOURS_PER_WEEK
    }

    /// Mean absolute percentage difference between the best order-book
    /// prices and the weighted-average prices, across both sides.
    ///
    /// A large divergence means the top of the book has moved away from
    /// the bulk of resting volume, which flipping and crafting treat as
    /// price volatility. Sides with missing data contribute nothing.
    #[must_use]
    pub fn price_volatility(&self) -> f64 {
        let qs = &self.quick_status;
        let mut total = 0.0;
        let mut sides = 0u32;

        if let Some(instant) = self.best_buy_price() {
            if qs.buy_price > 0.0 {
                total += ((instant - qs.buy_price).abs() / qs.buy_price) * 100.0;
                sides += 1;
            }
        }
        if let Some(instant) = self.best_sell_price() {
            if qs.sell_price > 0.0 {
                total += ((instant - qs.sell_price).abs() / qs.sell_price) * 100.0;
                sides += 1;
            }
        }

        if sides == 0 {
            0.0
        } else {
            total / f64::from(sides)
        }
    }
}

/// A full market snapshot: every product from one gateway fetch.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub last_updated: DateTime<Utc>,
    products: HashMap<ItemId, Product>,
}

impl Snapshot {
    #[must_use]
    pub fn new(last_updated: DateTime<Utc>, products: Vec<Product>) -> Self {
        Self {
            last_updated,
            products: products
                .into_iter()
                .map(|p| (p.item_id.clone(), p))
                .collect(),
        }
    }

    #[must_use]
    pub fn get(&self, item_id: &ItemId) -> Option<&Product> {
        self.products.get(item_id)
    }

    pub fn products(&self) -> impl Iterator<Item = &Product> {
        self.products.values()
    }

    pub fn item_ids(&self) -> impl Iterator<Item = &ItemId> {
        self.products.keys()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.products.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }
}
