//! NPC arbitrage engine: buy from the bazaar, sell to a fixed-price
//! vendor.
//!
//! Acquisition is either an instant buy (walking the sell book with the
//! surcharge, stopping at the first level that can no longer beat the
//! vendor price) or a passive buy order at the best bid. Several
//! alternative composite rankings are supported as named sort modes.

use std::cmp::Ordering;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::analysis::INSTANT_BUY_SURCHARGE;
use crate::domain::{
    paginate, ItemId, OpportunityCache, PagedResult, Product, Snapshot, HOURS_PER_WEEK,
};
use crate::gateway::VendorItem;

/// How bazaar inventory is acquired before vendoring.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "snake_case")]
pub enum AcquisitionStrategy {
    /// Walk the sell book paying the instant-buy surcharge per level.
    #[default]
    InstaBuy,
    /// Place a buy order at the best bid; no surcharge, no walk.
    BuyOrder,
}

/// Sort orders for NPC arbitrage results.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "snake_case")]
pub enum NpcSortKey {
    #[default]
    TotalProfit,
    MarginPct,
    ProfitPerItem,
    WeeklySellMovement,
    MaxAffordable,
    /// Affordable count relative to hourly instant-sell throughput.
    InstasellRatio,
    ProfitPerHour,
    /// Rewards absolute and per-unit profit, penalizes huge positions.
    Balanced,
    /// Smoothed liquidity/efficiency curves over a margin-weighted base.
    Delta,
}

/// A scored vendor-arbitrage candidate. Immutable once produced.
#[derive(Debug, Clone, Serialize)]
pub struct NpcOpportunity {
    pub item_id: ItemId,
    pub item_name: String,
    pub vendor_price: f64,
    /// Average per-unit acquisition cost under the chosen strategy.
    pub acquisition_price: f64,
    pub profit_per_item: f64,
    pub margin_pct: f64,
    /// Units obtainable within budget (and, for instant buys, within
    /// profitable order-book depth).
    pub max_affordable: u64,
    pub total_profit: f64,
    pub weekly_sell_movement: u64,
    pub hourly_sell_rate: f64,
    pub instasell_ratio: f64,
}

/// Query parameters for an NPC arbitrage scan.
#[derive(Debug, Clone)]
pub struct NpcQuery {
    pub budget: u64,
    pub strategy: AcquisitionStrategy,
    pub sort: NpcSortKey,
    pub page: usize,
    pub page_size: usize,
    pub force_refresh: bool,
}

impl Default for NpcQuery {
    fn default() -> Self {
        Self {
            budget: 10_000_000,
            strategy: AcquisitionStrategy::default(),
            sort: NpcSortKey::default(),
            page: 1,
            page_size: 10,
            force_refresh: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct NpcCacheKey {
    budget: u64,
    strategy: AcquisitionStrategy,
}

/// NPC arbitrage engine tuning.
#[derive(Debug, Clone, Deserialize)]
pub struct NpcConfig {
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,
}

fn default_cache_ttl_secs() -> u64 {
    300
}

impl Default for NpcConfig {
    fn default() -> Self {
        Self {
            cache_ttl_secs: default_cache_ttl_secs(),
        }
    }
}

/// The NPC arbitrage engine.
pub struct NpcEngine {
    cache: OpportunityCache<NpcCacheKey, NpcOpportunity>,
}

impl NpcEngine {
    #[must_use]
    pub fn new(config: NpcConfig) -> Self {
        Self {
            cache: OpportunityCache::new(Duration::from_secs(config.cache_ttl_secs)),
        }
    }

    /// Find, rank, and page vendor-arbitrage opportunities.
    ///
    /// Cached per `(budget, strategy)`, written total-profit-descending;
    /// the requested sort is re-applied on every read without touching
    /// the cache entry.
    pub fn find_opportunities(
        &self,
        snapshot: &Snapshot,
        vendor_items: &[VendorItem],
        query: &NpcQuery,
    ) -> PagedResult<NpcOpportunity> {
        let key = NpcCacheKey {
            budget: query.budget,
            strategy: query.strategy,
        };
        if query.force_refresh {
            self.cache.invalidate(&key);
        }

        let (list, from_cache) = match self.cache.get(&key) {
            Some(hit) => (hit, true),
            None => {
                let scanned = self.scan(snapshot, vendor_items, query.budget, query.strategy);
                (self.cache.insert(key, scanned), false)
            }
        };

        let mut items: Vec<NpcOpportunity> = (*list).clone();
        sort_npc(&mut items, query.sort);
        paginate(&items, query.page, query.page_size, from_cache)
    }

    /// Drop all cached scans.
    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    /// Score every vendor-priced item. Pure with respect to the cache.
    #[must_use]
    pub fn scan(
        &self,
        snapshot: &Snapshot,
        vendor_items: &[VendorItem],
        budget: u64,
        strategy: AcquisitionStrategy,
    ) -> Vec<NpcOpportunity> {
        let mut opportunities: Vec<NpcOpportunity> = vendor_items
            .iter()
            .filter_map(|vendor| {
                let product = snapshot.get(&vendor.item_id)?;
                evaluate(product, vendor, budget, strategy)
            })
            .collect();

        debug!(
            candidates = vendor_items.len(),
            kept = opportunities.len(),
            "NPC arbitrage scan complete"
        );
        sort_npc(&mut opportunities, NpcSortKey::TotalProfit);
        opportunities
    }
}

/// Evaluate one vendor-priced item under the chosen strategy.
fn evaluate(
    product: &Product,
    vendor: &VendorItem,
    budget: u64,
    strategy: AcquisitionStrategy,
) -> Option<NpcOpportunity> {
    let (acquisition_price, max_affordable, total_cost) = match strategy {
        AcquisitionStrategy::InstaBuy => walk_profitable(product, vendor.npc_sell_price, budget)?,
        AcquisitionStrategy::BuyOrder => {
            let price = product.best_buy_price()?;
            if price <= 0.0 || price >= vendor.npc_sell_price {
                return None;
            }
            let affordable = (budget as f64 / price).floor() as u64;
            if affordable == 0 {
                return None;
            }
            (price, affordable, price * affordable as f64)
        }
    };

    let profit_per_item = vendor.npc_sell_price - acquisition_price;
    if profit_per_item <= 0.0 {
        return None;
    }

    let total_profit = vendor.npc_sell_price * max_affordable as f64 - total_cost;
    let margin_pct = profit_per_item / acquisition_price * 100.0;
    let weekly_sell_movement = product.quick_status.sell_moving_week;
    let hourly_sell_rate = weekly_sell_movement as f64 / HOURS_PER_WEEK;
    let instasell_ratio = if hourly_sell_rate > 0.0 {
        max_affordable as f64 / hourly_sell_rate
    } else {
        0.0
    };

    Some(NpcOpportunity {
        item_id: vendor.item_id.clone(),
        item_name: vendor.name.clone(),
        vendor_price: vendor.npc_sell_price,
        acquisition_price,
        profit_per_item,
        margin_pct,
        max_affordable,
        total_profit,
        weekly_sell_movement,
        hourly_sell_rate,
        instasell_ratio,
    })
}

/// Walk the sell book level by level under budget and profitability
/// constraints simultaneously.
///
/// A level is consumed only while its surcharged price stays below the
/// vendor price; deeper levels only get more expensive, so the walk
/// stops at the first unprofitable one. Returns
/// `(average_price, units, total_cost)`.
fn walk_profitable(product: &Product, vendor_price: f64, budget: u64) -> Option<(f64, u64, f64)> {
    let mut remaining_budget = budget as f64;
    let mut units = 0u64;
    let mut total_cost = 0.0;

    for level in &product.sell_orders {
        let taxed_price = level.price_per_unit * (1.0 + INSTANT_BUY_SURCHARGE);
        if taxed_price >= vendor_price {
            break;
        }
        let affordable = (remaining_budget / taxed_price).floor() as u64;
        if affordable == 0 {
            break;
        }
        let take = affordable.min(level.amount);
        units += take;
        let cost = taxed_price * take as f64;
        total_cost += cost;
        remaining_budget -= cost;
    }

    if units == 0 {
        return None;
    }
    Some((total_cost / units as f64, units, total_cost))
}

/// Sort by the requested key, descending, ties broken by item id.
pub fn sort_npc(opportunities: &mut [NpcOpportunity], key: NpcSortKey) {
    let by = |o: &NpcOpportunity| -> f64 {
        match key {
            NpcSortKey::TotalProfit => o.total_profit,
            NpcSortKey::MarginPct => o.margin_pct,
            NpcSortKey::ProfitPerItem => o.profit_per_item,
            NpcSortKey::WeeklySellMovement => o.weekly_sell_movement as f64,
            NpcSortKey::MaxAffordable => o.max_affordable as f64,
            NpcSortKey::InstasellRatio => o.instasell_ratio,
            NpcSortKey::ProfitPerHour => o.hourly_sell_rate * o.profit_per_item,
            NpcSortKey::Balanced => balanced_score(o),
            NpcSortKey::Delta => delta_score(o),
        }
    };

    opportunities.sort_by(|a, b| {
        by(b)
            .partial_cmp(&by(a))
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.item_id.cmp(&b.item_id))
    });
}

/// Rewards high absolute and per-unit profit while penalizing the need
/// to acquire huge quantities.
#[must_use]
pub fn balanced_score(o: &NpcOpportunity) -> f64 {
    let quantity_penalty = (o.max_affordable as f64 + 1.0).log10();
    if quantity_penalty <= 0.0 {
        return 0.0;
    }
    (o.total_profit + 1.0).log10()
        * (o.profit_per_item + 1.0).log10()
        * o.instasell_ratio.min(3.0)
        * (1.0 / quantity_penalty)
}

/// Product of smoothed margin, profit, liquidity, quantity-efficiency
/// and volume-stability curves.
#[must_use]
pub fn delta_score(o: &NpcOpportunity) -> f64 {
    let margin_factor = (o.margin_pct + 1.0).log10() * (o.margin_pct / 100.0).max(0.0).sqrt();
    let profit_factor = (o.profit_per_item + 1.0).log10().powf(1.2);
    let liquidity_factor = (o.instasell_ratio * 2.0).tanh() * 2.0;
    let efficiency_factor = 1.0 / (1.0 + (o.max_affordable as f64 / 10_000.0 - 2.0).exp());
    let stability_factor = (o.hourly_sell_rate + 1.0).log10().min(3.0);

    margin_factor * profit_factor * liquidity_factor * efficiency_factor * stability_factor
}
