//! Order-book depth walking.
//!
//! Simulates consuming resting orders from best price outward to price a
//! multi-unit trade realistically, instead of quoting the single best
//! level. Walking a sell-order book models an instant buy (and carries
//! the market's instant-transaction surcharge); walking a buy-order book
//! models an instant sell (no surcharge).

use crate::domain::OrderLevel;

/// Fee the market adds on instant purchases, as a fraction of the total.
pub const INSTANT_BUY_SURCHARGE: f64 = 0.04;

/// Result of walking an order book for a target quantity.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct WalkOutcome {
    /// Total cost (or revenue) of the quantity actually consumed.
    pub total_value: f64,
    /// Volume-weighted average execution price; 0 if nothing consumed.
    pub average_price: f64,
    /// Whether the book held enough volume for the full quantity.
    pub feasible: bool,
    /// Total volume resting across all levels.
    pub max_possible: u64,
}

/// Walk `orders` best-first, consuming up to `quantity` units.
///
/// Levels must already be sorted best price first (highest for bids,
/// lowest for offers). An empty book or zero quantity short-circuits to
/// the all-zero outcome.
#[must_use]
pub fn walk(orders: &[OrderLevel], quantity: u64) -> WalkOutcome {
    if orders.is_empty() || quantity == 0 {
        return WalkOutcome::default();
    }

    let mut remaining = quantity;
    let mut total_value = 0.0;
    let mut max_possible = 0u64;

    for level in orders {
        max_possible += level.amount;
        if remaining > 0 {
            let consumed = remaining.min(level.amount);
            total_value += level.price_per_unit * consumed as f64;
            remaining -= consumed;
        }
    }

    let consumed = quantity - remaining;
    WalkOutcome {
        total_value,
        average_price: if consumed == 0 {
            0.0
        } else {
            total_value / consumed as f64
        },
        feasible: max_possible >= quantity,
        max_possible,
    }
}

/// Walk a sell-order book simulating an instant purchase.
///
/// Applies [`INSTANT_BUY_SURCHARGE`] to the total and recomputes the
/// average to include it.
#[must_use]
pub fn walk_instant_buy(sell_orders: &[OrderLevel], quantity: u64) -> WalkOutcome {
    let mut outcome = walk(sell_orders, quantity);
    if outcome.total_value > 0.0 {
        let surcharged = outcome.total_value * (1.0 + INSTANT_BUY_SURCHARGE);
        outcome.average_price *= surcharged / outcome.total_value;
        outcome.total_value = surcharged;
    }
    outcome
}
