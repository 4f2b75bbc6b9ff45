//! Market manipulation engine: identify thin markets whose entire sell
//! side can be bought out to reset price expectations.
//!
//! The upstream API truncates order books, so full acquisition cost is
//! estimated when the visible levels hold fewer items than the summary
//! stats report. Viability blends item-count, demand, cost-band and
//! oversupply sub-scores, hard-gated on affordability and on the market
//! actually absorbing the position.

use std::cmp::Ordering;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::{
    paginate, ItemId, OpportunityCache, PagedResult, Product, QuickStatus, RiskTier, Snapshot,
    HOURS_PER_WEEK,
};

/// Sentinel hours-to-liquidate for markets with no buy movement at all.
pub const LIQUIDATION_SENTINEL_HOURS: f64 = 999.0;

/// Blend weights for the overall manipulation score.
pub const ITEM_COUNT_WEIGHT: f64 = 0.25;
pub const DEMAND_RATIO_WEIGHT: f64 = 0.35;
pub const COST_WEIGHT: f64 = 0.25;
pub const OVERSUPPLY_WEIGHT: f64 = 0.15;

/// Blend weights for the demand sub-score.
pub const DEMAND_RATE_WEIGHT: f64 = 0.6;
pub const DEMAND_VOLUME_WEIGHT: f64 = 0.25;
pub const DEMAND_ORDERS_WEIGHT: f64 = 0.15;

/// Blend weights for the supply sub-score.
pub const SUPPLY_VOLUME_WEIGHT: f64 = 0.4;
pub const SUPPLY_ORDERS_WEIGHT: f64 = 0.35;
pub const SUPPLY_ITEMS_WEIGHT: f64 = 0.25;

/// Manipulation engine tuning. Serde defaults match shipped behavior.
#[derive(Debug, Clone, Deserialize)]
pub struct ManipulationConfig {
    /// Market fee on sales.
    #[serde(default = "default_tax_rate")]
    pub tax_rate: f64,
    /// Price assumed for order-book levels beyond the visible prefix,
    /// as a multiple of the worst visible price. Unvalidated heuristic,
    /// kept configurable for calibration.
    #[serde(default = "default_hidden_price_multiplier")]
    pub hidden_price_multiplier: f64,
    /// Multiple of the real target used for the displayed sell price.
    #[serde(default = "default_display_price_multiplier")]
    pub display_price_multiplier: f64,
    /// Multiplier per price-ladder step.
    #[serde(default = "default_ladder_step_multiplier")]
    pub ladder_step_multiplier: f64,
    #[serde(default = "default_max_ladder_steps")]
    pub max_ladder_steps: u32,
    /// Data-quality guard, not a real market limit.
    #[serde(default = "default_max_plausible_items")]
    pub max_plausible_items: u64,
    /// Item-count range scoring a full 100.
    #[serde(default = "default_item_sweet_spot_min")]
    pub item_sweet_spot_min: u64,
    #[serde(default = "default_item_sweet_spot_max")]
    pub item_sweet_spot_max: u64,
    /// Cost-per-item band scoring a full 100.
    #[serde(default = "default_ideal_cost_min")]
    pub ideal_cost_min: f64,
    #[serde(default = "default_ideal_cost_max")]
    pub ideal_cost_max: f64,
    /// Normalization ceilings for the log-ratio curves.
    #[serde(default = "default_max_hourly_buy_rate")]
    pub max_hourly_buy_rate: f64,
    #[serde(default = "default_max_side_volume")]
    pub max_side_volume: f64,
    #[serde(default = "default_max_side_orders")]
    pub max_side_orders: f64,
    #[serde(default = "default_max_total_items")]
    pub max_total_items: f64,
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,
}

fn default_tax_rate() -> f64 {
    0.01125
}
fn default_hidden_price_multiplier() -> f64 {
    1.2
}
fn default_display_price_multiplier() -> f64 {
    2.5
}
fn default_ladder_step_multiplier() -> f64 {
    1.75
}
fn default_max_ladder_steps() -> u32 {
    15
}
fn default_max_plausible_items() -> u64 {
    10_000_000
}
fn default_item_sweet_spot_min() -> u64 {
    30
}
fn default_item_sweet_spot_max() -> u64 {
    2_000
}
fn default_ideal_cost_min() -> f64 {
    700_000.0
}
fn default_ideal_cost_max() -> f64 {
    3_000_000.0
}
fn default_max_hourly_buy_rate() -> f64 {
    50_000.0
}
fn default_max_side_volume() -> f64 {
    10_000_000.0
}
fn default_max_side_orders() -> f64 {
    5_000.0
}
fn default_max_total_items() -> f64 {
    1_000_000.0
}
fn default_cache_ttl_secs() -> u64 {
    3_600
}

impl Default for ManipulationConfig {
    fn default() -> Self {
        Self {
            tax_rate: default_tax_rate(),
            hidden_price_multiplier: default_hidden_price_multiplier(),
            display_price_multiplier: default_display_price_multiplier(),
            ladder_step_multiplier: default_ladder_step_multiplier(),
            max_ladder_steps: default_max_ladder_steps(),
            max_plausible_items: default_max_plausible_items(),
            item_sweet_spot_min: default_item_sweet_spot_min(),
            item_sweet_spot_max: default_item_sweet_spot_max(),
            ideal_cost_min: default_ideal_cost_min(),
            ideal_cost_max: default_ideal_cost_max(),
            max_hourly_buy_rate: default_max_hourly_buy_rate(),
            max_side_volume: default_max_side_volume(),
            max_side_orders: default_max_side_orders(),
            max_total_items: default_max_total_items(),
            cache_ttl_secs: default_cache_ttl_secs(),
        }
    }
}

/// One rung of the price-stepping ladder toward the target price.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct LadderStep {
    pub step: u32,
    pub price: f64,
    /// Per-item profit if the market were sold at `min_sell_price` from
    /// this rung's price level.
    pub profit_per_item: f64,
}

/// A scored buyout candidate. Immutable once produced.
#[derive(Debug, Clone, Serialize)]
pub struct ManipulationOpportunity {
    pub item_id: ItemId,
    /// Full acquisition cost, estimated where the book is truncated.
    pub total_cost: f64,
    pub total_items: u64,
    /// Whether every resting sell order was visible in the snapshot.
    pub is_fully_visible: bool,
    pub avg_cost: f64,
    /// Break-even resale price after tax.
    pub min_sell_price: f64,
    /// Real per-item target achieving the requested ROI on the position.
    pub final_target_price: f64,
    /// Inflated psychological ceiling shown to the market.
    pub displayed_sell_target: f64,
    /// Buy-order price back-solved so after-tax proceeds hit the target.
    pub initial_buy_order_price: f64,
    pub projected_profit: f64,
    pub demand_score: f64,
    pub supply_score: f64,
    pub score: f64,
    pub risk: RiskTier,
    pub hours_to_liquidate: f64,
    pub ladder: Vec<LadderStep>,
}

/// Query parameters for a manipulation scan.
#[derive(Debug, Clone)]
pub struct ManipulationQuery {
    pub budget: u64,
    /// Position ROI multiplier, e.g. `1.5` targets +50%.
    pub target_roi: f64,
    pub max_risk: RiskTier,
    pub min_demand: f64,
    pub page: usize,
    pub page_size: usize,
    pub force_refresh: bool,
}

impl Default for ManipulationQuery {
    fn default() -> Self {
        Self {
            budget: 10_000_000,
            target_roi: 1.5,
            max_risk: RiskTier::Extreme,
            min_demand: 0.0,
            page: 1,
            page_size: 10,
            force_refresh: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct ManipulationCacheKey {
    budget: u64,
    /// ROI in basis points so the key stays hashable.
    target_roi_bp: u32,
    max_risk: RiskTier,
    min_demand_pct: u32,
}

impl ManipulationCacheKey {
    fn from_query(query: &ManipulationQuery) -> Self {
        Self {
            budget: query.budget,
            target_roi_bp: (query.target_roi * 100.0).round().max(0.0) as u32,
            max_risk: query.max_risk,
            min_demand_pct: query.min_demand.round().clamp(0.0, 100.0) as u32,
        }
    }
}

/// The market manipulation engine.
pub struct ManipulationEngine {
    config: ManipulationConfig,
    cache: OpportunityCache<ManipulationCacheKey, ManipulationOpportunity>,
}

impl ManipulationEngine {
    #[must_use]
    pub fn new(config: ManipulationConfig) -> Self {
        let ttl = Duration::from_secs(config.cache_ttl_secs);
        Self {
            config,
            cache: OpportunityCache::new(ttl),
        }
    }

    #[must_use]
    pub const fn config(&self) -> &ManipulationConfig {
        &self.config
    }

    /// Find, rank, and page buyout opportunities.
    ///
    /// Cached per full parameter tuple for an hour; identical queries
    /// page over the same score-sorted list until expiry or a forced
    /// refresh.
    pub fn find_opportunities(
        &self,
        snapshot: &Snapshot,
        query: &ManipulationQuery,
    ) -> PagedResult<ManipulationOpportunity> {
        let key = ManipulationCacheKey::from_query(query);
        if query.force_refresh {
            self.cache.invalidate(&key);
        }

        let (list, from_cache) = match self.cache.get(&key) {
            Some(hit) => (hit, true),
            None => {
                let scanned = self.scan(snapshot, query);
                (self.cache.insert(key, scanned), false)
            }
        };

        paginate(&list, query.page, query.page_size, from_cache)
    }

    /// Drop all cached scans.
    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    /// Score every item in the snapshot. Pure with respect to the cache.
    #[must_use]
    pub fn scan(&self, snapshot: &Snapshot, query: &ManipulationQuery) -> Vec<ManipulationOpportunity> {
        let mut opportunities: Vec<ManipulationOpportunity> = snapshot
            .products()
            .filter_map(|product| self.evaluate(product, query.budget, query.target_roi))
            .filter(|opp| opp.risk <= query.max_risk && opp.demand_score >= query.min_demand)
            .collect();

        debug!(
            candidates = snapshot.len(),
            kept = opportunities.len(),
            "Manipulation scan complete"
        );

        opportunities.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.item_id.cmp(&b.item_id))
        });
        opportunities
    }

    /// Evaluate one product as a buyout target.
    fn evaluate(&self, product: &Product, budget: u64, target_roi: f64) -> Option<ManipulationOpportunity> {
        let cfg = &self.config;
        let qs = &product.quick_status;

        let (total_cost, total_items, is_fully_visible) = self.acquisition_cost(product)?;
        if total_items == 0 || total_items > cfg.max_plausible_items {
            return None;
        }
        if total_cost > budget as f64 {
            return None;
        }

        let avg_cost = total_cost / total_items as f64;
        let min_sell_price = avg_cost / (1.0 - cfg.tax_rate);
        let final_target_price = total_cost * target_roi / total_items as f64;
        let displayed_sell_target = final_target_price * cfg.display_price_multiplier;
        let initial_buy_order_price = final_target_price * (1.0 - cfg.tax_rate);
        let projected_profit = initial_buy_order_price * total_items as f64 - total_cost;

        let demand_score = self.demand_score(qs);
        let supply_score = self.supply_score(qs, total_items);
        let score = self.manipulation_score(qs, total_cost, total_items, budget);

        let hourly_buy = qs.buy_moving_week as f64 / HOURS_PER_WEEK;
        let hours_to_liquidate = if hourly_buy > 0.0 {
            total_items as f64 / hourly_buy
        } else {
            LIQUIDATION_SENTINEL_HOURS
        };

        let budget_ratio = total_cost / budget as f64;
        let risk = classify_risk(score, budget_ratio);

        let ladder_start = product.best_buy_price().unwrap_or(avg_cost);
        let ladder = self.build_ladder(ladder_start, initial_buy_order_price, min_sell_price);

        Some(ManipulationOpportunity {
            item_id: product.item_id.clone(),
            total_cost,
            total_items,
            is_fully_visible,
            avg_cost,
            min_sell_price,
            final_target_price,
            displayed_sell_target,
            initial_buy_order_price,
            projected_profit,
            demand_score,
            supply_score,
            score,
            risk,
            hours_to_liquidate,
            ladder,
        })
    }

    /// Full-buyout cost, reconciling visible levels against the
    /// reported total.
    ///
    /// When the truncated book shows fewer items than the summary
    /// reports, the unseen remainder is assumed to rest
    /// `hidden_price_multiplier` above the worst visible price.
    fn acquisition_cost(&self, product: &Product) -> Option<(f64, u64, bool)> {
        if product.sell_orders.is_empty() {
            return None;
        }

        let visible_items: u64 = product.sell_orders.iter().map(|l| l.amount).sum();
        let visible_cost: f64 = product
            .sell_orders
            .iter()
            .map(|l| l.price_per_unit * l.amount as f64)
            .sum();
        let reported_total = product.quick_status.sell_volume;

        if visible_items >= reported_total {
            return Some((visible_cost, visible_items, true));
        }

        let worst_visible = product
            .sell_orders
            .iter()
            .map(|l| l.price_per_unit)
            .fold(f64::MIN, f64::max);
        let remainder = reported_total - visible_items;
        let hidden_cost =
            remainder as f64 * worst_visible * self.config.hidden_price_multiplier;

        Some((visible_cost + hidden_cost, reported_total, false))
    }

    /// Demand sub-score, 0-100.
    ///
    /// Structurally unsound when sell pressure dominates: capped at 10
    /// whenever weekly sell movement exceeds weekly buy movement.
    fn demand_score(&self, qs: &QuickStatus) -> f64 {
        let cfg = &self.config;
        let hourly_buy = qs.buy_moving_week as f64 / HOURS_PER_WEEK;

        let blended = log_ratio_curve(hourly_buy, cfg.max_hourly_buy_rate) * DEMAND_RATE_WEIGHT
            + log_ratio_curve(qs.buy_volume as f64, cfg.max_side_volume) * DEMAND_VOLUME_WEIGHT
            + log_ratio_curve(f64::from(qs.buy_orders), cfg.max_side_orders)
                * DEMAND_ORDERS_WEIGHT;

        if qs.sell_moving_week > qs.buy_moving_week {
            return blended.min(10.0);
        }

        let dominance = if qs.sell_moving_week == 0 {
            2.0
        } else {
            (qs.buy_moving_week as f64 / qs.sell_moving_week as f64).min(2.0)
        };
        (blended * dominance).min(100.0)
    }

    /// Supply sub-score, 0-100: lower supply values score higher.
    fn supply_score(&self, qs: &QuickStatus, total_items: u64) -> f64 {
        let cfg = &self.config;
        let inverse = |x: f64, max: f64| (100.0 - log_ratio_curve(x, max)).max(0.0);

        inverse(qs.sell_volume as f64, cfg.max_side_volume) * SUPPLY_VOLUME_WEIGHT
            + inverse(f64::from(qs.sell_orders), cfg.max_side_orders) * SUPPLY_ORDERS_WEIGHT
            + inverse(total_items as f64, cfg.max_total_items) * SUPPLY_ITEMS_WEIGHT
    }

    /// Overall manipulation viability, 0-100.
    ///
    /// Hard-gated to 0 when the buyout is unaffordable or the market's
    /// hourly absorption cannot plausibly clear the position.
    fn manipulation_score(
        &self,
        qs: &QuickStatus,
        total_cost: f64,
        total_items: u64,
        budget: u64,
    ) -> f64 {
        let cfg = &self.config;
        if total_cost > budget as f64 {
            return 0.0;
        }
        let hourly_buy = qs.buy_moving_week as f64 / HOURS_PER_WEEK;
        if hourly_buy < total_items as f64 {
            return 0.0;
        }

        let item_count_score = if total_items < cfg.item_sweet_spot_min {
            0.0
        } else if total_items <= cfg.item_sweet_spot_max {
            100.0
        } else {
            let ratio = cfg.item_sweet_spot_max as f64 / total_items as f64;
            100.0 * ratio * ratio
        };

        let demand_ratio_score =
            ((hourly_buy / total_items as f64).powf(0.8) * 40.0).min(100.0);

        let cost_per_item = total_cost / total_items as f64;
        let cost_score = if cost_per_item < cfg.ideal_cost_min {
            0.0
        } else if cost_per_item <= cfg.ideal_cost_max {
            100.0
        } else {
            let ratio = cfg.ideal_cost_max / cost_per_item;
            100.0 * ratio * ratio
        };

        let oversupply_score = if qs.sell_moving_week > qs.buy_moving_week && qs.buy_moving_week > 0
        {
            let ratio = qs.sell_moving_week as f64 / qs.buy_moving_week as f64;
            (100.0 - ratio.powf(1.5) * 20.0).max(0.0)
        } else {
            100.0
        };

        item_count_score * ITEM_COUNT_WEIGHT
            + demand_ratio_score * DEMAND_RATIO_WEIGHT
            + cost_score * COST_WEIGHT
            + oversupply_score * OVERSUPPLY_WEIGHT
    }

    /// Price-stepping ladder from the current market toward the target.
    fn build_ladder(&self, start: f64, target: f64, min_sell_price: f64) -> Vec<LadderStep> {
        let cfg = &self.config;
        let mut ladder = Vec::new();
        if start <= 0.0 || target <= 0.0 {
            return ladder;
        }

        let mut price = start;
        for step in 1..=cfg.max_ladder_steps {
            let capped = price.min(target);
            ladder.push(LadderStep {
                step,
                price: capped,
                profit_per_item: min_sell_price - capped,
            });
            if capped >= target {
                break;
            }
            price *= cfg.ladder_step_multiplier;
        }
        ladder
    }
}

/// Normalized log-ratio curve: `min(100, ((log10(x+1)/log10(max+1))*100)^1.5)`.
fn log_ratio_curve(x: f64, max: f64) -> f64 {
    if x <= 0.0 || max <= 0.0 {
        return 0.0;
    }
    let ratio = (x + 1.0).log10() / (max + 1.0).log10();
    ((ratio * 100.0).powf(1.5)).min(100.0)
}

/// Risk from viability score and budget exposure.
fn classify_risk(score: f64, budget_ratio: f64) -> RiskTier {
    if score >= 80.0 && budget_ratio <= 0.3 {
        RiskTier::Low
    } else if score >= 60.0 && budget_ratio <= 0.5 {
        RiskTier::Medium
    } else if score >= 40.0 && budget_ratio <= 0.7 {
        RiskTier::High
    } else {
        RiskTier::Extreme
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{OrderLevel, QuickStatus};
    use chrono::Utc;

    fn thin_market(id: &str, reported_total: u64) -> Product {
        Product {
            item_id: ItemId::from(id),
            buy_orders: vec![OrderLevel::new(900_000.0, 50, 3)],
            sell_orders: vec![
                OrderLevel::new(1_000_000.0, 30, 2),
                OrderLevel::new(1_100_000.0, 20, 1),
            ],
            quick_status: QuickStatus {
                buy_price: 900_000.0,
                sell_price: 1_000_000.0,
                buy_volume: 500,
                sell_volume: reported_total,
                buy_orders: 40,
                sell_orders: 3,
                buy_moving_week: 200_000,
                sell_moving_week: 100_000,
            },
        }
    }

    fn snapshot(products: Vec<Product>) -> Snapshot {
        Snapshot::new(Utc::now(), products)
    }

    #[test]
    fn fully_visible_book_costs_the_exact_sum() {
        let engine = ManipulationEngine::new(ManipulationConfig::default());
        let product = thin_market("X", 50);
        let (cost, items, visible) = engine.acquisition_cost(&product).unwrap();

        assert!(visible);
        assert_eq!(items, 50);
        assert_eq!(cost, 30.0 * 1_000_000.0 + 20.0 * 1_100_000.0);
    }

    #[test]
    fn truncated_book_estimates_the_hidden_remainder() {
        let engine = ManipulationEngine::new(ManipulationConfig::default());
        let product = thin_market("X", 80);
        let (cost, items, visible) = engine.acquisition_cost(&product).unwrap();

        assert!(!visible);
        assert_eq!(items, 80);
        let visible_cost = 30.0 * 1_000_000.0 + 20.0 * 1_100_000.0;
        assert!(cost > visible_cost);
        // 30 hidden items at worst visible price * 1.2.
        assert!((cost - (visible_cost + 30.0 * 1_100_000.0 * 1.2)).abs() < 1e-6);
    }

    #[test]
    fn unaffordable_buyout_is_rejected() {
        let engine = ManipulationEngine::new(ManipulationConfig::default());
        let query = ManipulationQuery {
            budget: 1_000_000,
            ..ManipulationQuery::default()
        };
        assert!(engine.scan(&snapshot(vec![thin_market("X", 50)]), &query).is_empty());
    }

    #[test]
    fn slow_absorption_gates_the_score_to_zero() {
        let engine = ManipulationEngine::new(ManipulationConfig::default());
        let mut product = thin_market("X", 50);
        // 49 items/hr absorbed < 50 items held.
        product.quick_status.buy_moving_week = 49 * 168;

        let opp = engine.evaluate(&product, 100_000_000, 1.5).unwrap();
        assert_eq!(opp.score, 0.0);
        assert_eq!(opp.risk, RiskTier::Extreme);
    }

    #[test]
    fn break_even_price_covers_the_tax() {
        let engine = ManipulationEngine::new(ManipulationConfig::default());
        let opp = engine
            .evaluate(&thin_market("X", 50), 100_000_000, 1.5)
            .unwrap();

        let proceeds = opp.min_sell_price * (1.0 - engine.config().tax_rate);
        assert!((proceeds - opp.avg_cost).abs() < 1e-6);
        assert!((opp.final_target_price - opp.total_cost * 1.5 / 50.0).abs() < 1e-6);
        assert!(
            (opp.displayed_sell_target - opp.final_target_price * 2.5).abs() < 1e-6
        );
    }

    #[test]
    fn ladder_climbs_and_caps_at_the_target() {
        let engine = ManipulationEngine::new(ManipulationConfig::default());
        let opp = engine
            .evaluate(&thin_market("X", 50), 100_000_000, 2.0)
            .unwrap();

        assert!(!opp.ladder.is_empty());
        assert!(opp.ladder.len() <= 15);
        let last = opp.ladder.last().unwrap();
        assert!(last.price <= opp.initial_buy_order_price + 1e-9);
        for pair in opp.ladder.windows(2) {
            assert!(pair[1].price >= pair[0].price);
        }
    }

    #[test]
    fn no_buy_movement_yields_the_sentinel() {
        let engine = ManipulationEngine::new(ManipulationConfig::default());
        let mut product = thin_market("X", 50);
        product.quick_status.buy_moving_week = 0;

        let opp = engine.evaluate(&product, 100_000_000, 1.5).unwrap();
        assert_eq!(opp.hours_to_liquidate, LIQUIDATION_SENTINEL_HOURS);
    }

    #[test]
    fn implausible_item_counts_are_dropped() {
        let engine = ManipulationEngine::new(ManipulationConfig::default());
        let product = thin_market("X", 20_000_000);
        assert!(engine.evaluate(&product, u64::MAX, 1.5).is_none());
    }

    #[test]
    fn paginated_reads_reuse_the_cache() {
        let engine = ManipulationEngine::new(ManipulationConfig::default());
        let query = ManipulationQuery {
            budget: 100_000_000,
            ..ManipulationQuery::default()
        };

        let first = engine.find_opportunities(&snapshot(vec![thin_market("X", 50)]), &query);
        assert!(!first.from_cache);
        assert_eq!(first.total_count, 1);

        // Underlying market vanishes; cached entry still serves.
        let second = engine.find_opportunities(&snapshot(vec![]), &query);
        assert!(second.from_cache);
        assert_eq!(second.total_count, 1);
    }
}
