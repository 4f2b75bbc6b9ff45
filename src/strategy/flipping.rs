//! Flipping opportunity engine: buy low via bid, sell high via offer.
//!
//! Scores every item in a snapshot on margin, realistic hourly trade
//! rate, liquidity and competition, then ranks with a log-weighted
//! composite that favors hourly profit over raw margin.

use std::cmp::Ordering;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::analysis::{competition_score, liquidity_score};
use crate::domain::{
    paginate, ItemId, OpportunityCache, PagedResult, Product, QuickStatus, RiskTier, Snapshot,
    HOURS_PER_WEEK,
};

/// Which price pair to flip between.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "snake_case")]
pub enum PriceMode {
    /// Best order-book prices on each side.
    #[default]
    Instant,
    /// Volume-weighted average prices from the summary stats.
    Weighted,
}

/// Sort orders for flip results.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "snake_case")]
pub enum FlipSortKey {
    /// Raw flip score.
    #[default]
    Score,
    /// Competition-adjusted flip score.
    AdjustedScore,
    /// Raw competition, most contested first.
    Competition,
    TotalProfit,
    ProfitPct,
    ProfitPerItem,
    ProfitPerHour,
    WeeklyBuyVolume,
    WeeklySellVolume,
    HourlyBuyRate,
    HourlySellRate,
    /// Safest first, competition-adjusted score as tiebreak.
    Risk,
}

/// Flipping engine tuning. Serde defaults match shipped behavior.
#[derive(Debug, Clone, Deserialize)]
pub struct FlippingConfig {
    /// Minimum absolute profit per item.
    #[serde(default = "default_min_profit_margin")]
    pub min_profit_margin: f64,
    /// Minimum percentage margin.
    #[serde(default = "default_min_profit_pct")]
    pub min_profit_pct: f64,
    /// Minimum weekly movement on a side before the market is viable.
    #[serde(default = "default_min_viable_volume")]
    pub min_viable_volume: u64,
    /// Assumed share of hourly movement one trader can capture.
    /// Unvalidated heuristic, kept configurable for calibration.
    #[serde(default = "default_market_share_fraction")]
    pub market_share_fraction: f64,
    /// Share of the competition blend taken from the buy side.
    #[serde(default = "default_buy_side_weight")]
    pub buy_side_weight: f64,
    #[serde(default = "default_low_liquidity_threshold")]
    pub low_liquidity_threshold: f64,
    #[serde(default = "default_medium_liquidity_threshold")]
    pub medium_liquidity_threshold: f64,
    #[serde(default = "default_high_volatility_threshold")]
    pub high_volatility_threshold: f64,
    #[serde(default = "default_medium_volatility_threshold")]
    pub medium_volatility_threshold: f64,
    /// Margin a LOW-risk opportunity must clear.
    #[serde(default = "default_low_risk_min_margin")]
    pub low_risk_min_margin: f64,
    #[serde(default = "default_low_risk_min_liquidity")]
    pub low_risk_min_liquidity: f64,
    #[serde(default = "default_low_risk_max_volatility")]
    pub low_risk_max_volatility: f64,
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,
}

fn default_min_profit_margin() -> f64 {
    5.0
}
fn default_min_profit_pct() -> f64 {
    1.0
}
fn default_min_viable_volume() -> u64 {
    10_000
}
fn default_market_share_fraction() -> f64 {
    0.20
}
fn default_buy_side_weight() -> f64 {
    crate::analysis::DEFAULT_BUY_SIDE_WEIGHT
}
fn default_low_liquidity_threshold() -> f64 {
    30.0
}
fn default_medium_liquidity_threshold() -> f64 {
    50.0
}
fn default_high_volatility_threshold() -> f64 {
    25.0
}
fn default_medium_volatility_threshold() -> f64 {
    10.0
}
fn default_low_risk_min_margin() -> f64 {
    50.0
}
fn default_low_risk_min_liquidity() -> f64 {
    70.0
}
fn default_low_risk_max_volatility() -> f64 {
    5.0
}
fn default_cache_ttl_secs() -> u64 {
    300
}

impl Default for FlippingConfig {
    fn default() -> Self {
        Self {
            min_profit_margin: default_min_profit_margin(),
            min_profit_pct: default_min_profit_pct(),
            min_viable_volume: default_min_viable_volume(),
            market_share_fraction: default_market_share_fraction(),
            buy_side_weight: default_buy_side_weight(),
            low_liquidity_threshold: default_low_liquidity_threshold(),
            medium_liquidity_threshold: default_medium_liquidity_threshold(),
            high_volatility_threshold: default_high_volatility_threshold(),
            medium_volatility_threshold: default_medium_volatility_threshold(),
            low_risk_min_margin: default_low_risk_min_margin(),
            low_risk_min_liquidity: default_low_risk_min_liquidity(),
            low_risk_max_volatility: default_low_risk_max_volatility(),
            cache_ttl_secs: default_cache_ttl_secs(),
        }
    }
}

/// Flip score weights: hourly profit dominates, then volume, then margin.
pub const PROFIT_PER_HOUR_WEIGHT: f64 = 4.0;
pub const ITEMS_PER_HOUR_WEIGHT: f64 = 2.0;
pub const MARGIN_WEIGHT: f64 = 1.5;

/// A scored flip candidate. Immutable once produced.
#[derive(Debug, Clone, Serialize)]
pub struct FlipOpportunity {
    pub item_id: ItemId,
    pub buy_price: f64,
    pub sell_price: f64,
    pub profit_margin: f64,
    pub profit_pct: f64,
    /// Realistic tradeable units per hour after the market-share cap.
    pub items_per_hour: f64,
    pub profit_per_hour: f64,
    /// Profit across the budget-constrained position, or hourly profit
    /// when no budget was given.
    pub total_profit: f64,
    pub weekly_buy_volume: u64,
    pub weekly_sell_volume: u64,
    pub hourly_buy_rate: f64,
    pub hourly_sell_rate: f64,
    pub liquidity: f64,
    pub competition: f64,
    pub volatility: f64,
    pub flip_score: f64,
    pub adjusted_score: f64,
    pub risk: RiskTier,
    /// Whether the budget cap bound the hourly rate.
    pub budget_limited: bool,
}

/// Query parameters for a paginated flip scan.
#[derive(Debug, Clone)]
pub struct FlipQuery {
    pub budget: Option<u64>,
    pub page: usize,
    pub page_size: usize,
    pub price_mode: PriceMode,
    pub sort: FlipSortKey,
    pub force_refresh: bool,
}

impl Default for FlipQuery {
    fn default() -> Self {
        Self {
            budget: None,
            page: 1,
            page_size: 10,
            price_mode: PriceMode::default(),
            sort: FlipSortKey::default(),
            force_refresh: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct FlipCacheKey {
    budget: Option<u64>,
    price_mode: PriceMode,
}

/// The flipping opportunity engine.
pub struct FlippingEngine {
    config: FlippingConfig,
    cache: OpportunityCache<FlipCacheKey, FlipOpportunity>,
}

impl FlippingEngine {
    #[must_use]
    pub fn new(config: FlippingConfig) -> Self {
        let ttl = Duration::from_secs(config.cache_ttl_secs);
        Self {
            config,
            cache: OpportunityCache::new(ttl),
        }
    }

    #[must_use]
    pub const fn config(&self) -> &FlippingConfig {
        &self.config
    }

    /// Find, rank, and page flip opportunities.
    ///
    /// The scan result is cached per `(budget, price_mode)`; sort and
    /// page are re-applied on every read, so pagination over one cache
    /// entry is stable even while the live market moves.
    pub fn find_opportunities(
        &self,
        snapshot: &Snapshot,
        query: &FlipQuery,
    ) -> PagedResult<FlipOpportunity> {
        let key = FlipCacheKey {
            budget: query.budget,
            price_mode: query.price_mode,
        };

        let (list, from_cache) = match (query.force_refresh, self.cache.get(&key)) {
            (false, Some(hit)) => (hit, true),
            _ => {
                let scanned = self.scan(snapshot, query.budget, query.price_mode);
                (self.cache.insert(key, scanned), false)
            }
        };

        let mut items: Vec<FlipOpportunity> = (*list).clone();
        sort_flips(&mut items, query.sort);
        paginate(&items, query.page, query.page_size, from_cache)
    }

    /// Drop all cached scans.
    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    /// Score every item in the snapshot. Pure with respect to the cache.
    #[must_use]
    pub fn scan(
        &self,
        snapshot: &Snapshot,
        budget: Option<u64>,
        mode: PriceMode,
    ) -> Vec<FlipOpportunity> {
        let mut opportunities: Vec<FlipOpportunity> = snapshot
            .products()
            .filter_map(|product| self.evaluate(product, budget, mode))
            .collect();
        debug!(
            candidates = snapshot.len(),
            kept = opportunities.len(),
            "Flip scan complete"
        );
        sort_flips(&mut opportunities, FlipSortKey::Score);
        opportunities
    }

    /// Evaluate one product, returning `None` for anything rejected.
    fn evaluate(
        &self,
        product: &Product,
        budget: Option<u64>,
        mode: PriceMode,
    ) -> Option<FlipOpportunity> {
        let cfg = &self.config;
        let qs = &product.quick_status;

        if !product.has_valid_spread() {
            return None;
        }
        let (buy_price, sell_price) = match mode {
            PriceMode::Instant => (product.best_buy_price()?, product.best_sell_price()?),
            PriceMode::Weighted => (qs.buy_price, qs.sell_price),
        };
        if buy_price <= 0.0 || sell_price <= 0.0 || sell_price <= buy_price {
            return None;
        }

        let profit_margin = sell_price - buy_price;
        let profit_pct = profit_margin / buy_price * 100.0;
        if profit_margin < cfg.min_profit_margin
            || profit_pct < cfg.min_profit_pct
            || qs.buy_moving_week < cfg.min_viable_volume
        {
            return None;
        }

        let hourly_buy_rate = product.hourly_buy_rate();
        let hourly_sell_rate = product.hourly_sell_rate();
        let our_buy_rate = hourly_buy_rate * cfg.market_share_fraction;
        let our_sell_rate = hourly_sell_rate * cfg.market_share_fraction;
        let mut items_per_hour = our_buy_rate.min(our_sell_rate);

        let mut budget_limited = false;
        if let Some(budget) = budget {
            let budget_cap = budget as f64 / buy_price;
            if budget_cap < items_per_hour {
                items_per_hour = budget_cap;
                budget_limited = true;
            }
        }
        if items_per_hour < 1.0 {
            return None;
        }

        let profit_per_hour = items_per_hour * profit_margin;
        let total_profit = match budget {
            Some(budget) => (budget as f64 / buy_price).floor() * profit_margin,
            None => profit_per_hour,
        };

        let liquidity = liquidity_score(qs.buy_moving_week, qs.sell_moving_week);
        let competition = competition_score(
            &product.buy_orders,
            &product.sell_orders,
            cfg.buy_side_weight,
        );
        let volatility = product.price_volatility();

        let flip_score = flip_score(profit_per_hour, items_per_hour, profit_margin);
        let adjusted_score = flip_score * competition_multiplier(competition);

        let risk = self.classify_risk(profit_margin, liquidity, volatility, qs);
        if risk == RiskTier::High {
            return None;
        }

        Some(FlipOpportunity {
            item_id: product.item_id.clone(),
            buy_price,
            sell_price,
            profit_margin,
            profit_pct,
            items_per_hour,
            profit_per_hour,
            total_profit,
            weekly_buy_volume: qs.buy_moving_week,
            weekly_sell_volume: qs.sell_moving_week,
            hourly_buy_rate,
            hourly_sell_rate,
            liquidity,
            competition,
            volatility,
            flip_score,
            adjusted_score,
            risk,
            budget_limited,
        })
    }

    fn classify_risk(
        &self,
        margin: f64,
        liquidity: f64,
        volatility: f64,
        qs: &QuickStatus,
    ) -> RiskTier {
        let cfg = &self.config;
        if liquidity < cfg.low_liquidity_threshold
            || qs.buy_moving_week < cfg.min_viable_volume
            || qs.sell_moving_week < cfg.min_viable_volume
            || volatility > cfg.high_volatility_threshold
        {
            RiskTier::High
        } else if volatility > cfg.medium_volatility_threshold
            || liquidity < cfg.medium_liquidity_threshold
        {
            RiskTier::Medium
        } else if margin >= cfg.low_risk_min_margin
            && liquidity >= cfg.low_risk_min_liquidity
            && volatility <= cfg.low_risk_max_volatility
        {
            RiskTier::Low
        } else {
            RiskTier::Medium
        }
    }
}

/// Log-weighted composite so order-of-magnitude differences dominate.
#[must_use]
pub fn flip_score(profit_per_hour: f64, items_per_hour: f64, margin: f64) -> f64 {
    (profit_per_hour + 1.0).log10() * PROFIT_PER_HOUR_WEIGHT
        + (items_per_hour + 1.0).log10() * ITEMS_PER_HOUR_WEIGHT
        + (margin + 1.0).log10() * MARGIN_WEIGHT
}

/// Multiplier applied to the flip score by competition level.
///
/// Lower competition means a friendlier market and a higher multiplier.
#[must_use]
pub fn competition_multiplier(competition: f64) -> f64 {
    if competition >= 80.0 {
        0.7
    } else if competition >= 60.0 {
        0.8
    } else if competition >= 40.0 {
        0.9
    } else if competition <= 20.0 {
        1.2
    } else if competition <= 40.0 {
        1.1
    } else {
        1.0
    }
}

/// Sort flips by the requested key, descending except risk.
///
/// Ties always break on item id so identical queries return
/// byte-identical orderings.
pub fn sort_flips(flips: &mut [FlipOpportunity], key: FlipSortKey) {
    let by = |f: &FlipOpportunity| -> f64 {
        match key {
            FlipSortKey::Score => f.flip_score,
            FlipSortKey::AdjustedScore => f.adjusted_score,
            FlipSortKey::Competition => f.competition,
            FlipSortKey::TotalProfit => f.total_profit,
            FlipSortKey::ProfitPct => f.profit_pct,
            FlipSortKey::ProfitPerItem => f.profit_margin,
            FlipSortKey::ProfitPerHour => f.profit_per_hour,
            FlipSortKey::WeeklyBuyVolume => f.weekly_buy_volume as f64,
            FlipSortKey::WeeklySellVolume => f.weekly_sell_volume as f64,
            FlipSortKey::HourlyBuyRate => f.hourly_buy_rate,
            FlipSortKey::HourlySellRate => f.hourly_sell_rate,
            FlipSortKey::Risk => f.adjusted_score,
        }
    };

    flips.sort_by(|a, b| {
        let primary = if key == FlipSortKey::Risk {
            a.risk.cmp(&b.risk)
        } else {
            Ordering::Equal
        };
        primary
            .then_with(|| by(b).partial_cmp(&by(a)).unwrap_or(Ordering::Equal))
            .then_with(|| a.item_id.cmp(&b.item_id))
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{OrderLevel, QuickStatus};
    use chrono::Utc;

    fn product(
        id: &str,
        buy_price: f64,
        sell_price: f64,
        buy_week: u64,
        sell_week: u64,
    ) -> Product {
        Product {
            item_id: ItemId::from(id),
            buy_orders: vec![
                OrderLevel::new(buy_price, 500, 4),
                OrderLevel::new(buy_price - 0.5, 500, 4),
                OrderLevel::new(buy_price - 1.0, 500, 4),
            ],
            sell_orders: vec![
                OrderLevel::new(sell_price, 500, 4),
                OrderLevel::new(sell_price + 0.5, 500, 4),
                OrderLevel::new(sell_price + 1.0, 500, 4),
            ],
            quick_status: QuickStatus {
                buy_price,
                sell_price,
                buy_volume: 10_000,
                sell_volume: 10_000,
                buy_orders: 12,
                sell_orders: 12,
                buy_moving_week: buy_week,
                sell_moving_week: sell_week,
            },
        }
    }

    fn snapshot(products: Vec<Product>) -> Snapshot {
        Snapshot::new(Utc::now(), products)
    }

    #[test]
    fn higher_hourly_profit_outranks_raw_margin() {
        // A: 10 margin at 1000/hr. B: 1 margin at 10000/hr.
        let a = product("ITEM_A", 100.0, 110.0, 168_000, 168_000);
        let b = product("ITEM_B", 100.0, 101.0, 1_680_000, 1_680_000);

        let engine = FlippingEngine::new(FlippingConfig {
            min_profit_margin: 0.5,
            min_profit_pct: 0.1,
            ..FlippingConfig::default()
        });
        let flips = engine.scan(&snapshot(vec![a, b]), None, PriceMode::Weighted);

        assert_eq!(flips.len(), 2);
        // Share-capped hourly profit is equal (200/hr * 10 vs 2000/hr * 1),
        // so the log-weighted volume term must put B first despite its
        // far smaller margin percentage.
        assert_eq!(flips[0].item_id.as_str(), "ITEM_B");
        assert!(flips[0].flip_score > flips[1].flip_score);
    }

    #[test]
    fn inverted_spread_is_rejected() {
        let engine = FlippingEngine::new(FlippingConfig::default());
        let flips = engine.scan(
            &snapshot(vec![product("X", 110.0, 100.0, 500_000, 500_000)]),
            None,
            PriceMode::Weighted,
        );
        assert!(flips.is_empty());
    }

    #[test]
    fn thin_weekly_volume_is_rejected() {
        let engine = FlippingEngine::new(FlippingConfig::default());
        let flips = engine.scan(
            &snapshot(vec![product("X", 100.0, 120.0, 500, 500)]),
            None,
            PriceMode::Weighted,
        );
        assert!(flips.is_empty());
    }

    #[test]
    fn budget_cap_marks_the_opportunity() {
        let engine = FlippingEngine::new(FlippingConfig::default());
        // 200/hr uncapped; budget affords only 50 units.
        let flips = engine.scan(
            &snapshot(vec![product("X", 100.0, 200.0, 168_000, 168_000)]),
            Some(5_000),
            PriceMode::Weighted,
        );
        assert_eq!(flips.len(), 1);
        assert!(flips[0].budget_limited);
        assert!((flips[0].items_per_hour - 50.0).abs() < 1e-9);
        assert_eq!(flips[0].total_profit, 50.0 * 100.0);
    }

    #[test]
    fn competition_multiplier_bands() {
        assert_eq!(competition_multiplier(85.0), 0.7);
        assert_eq!(competition_multiplier(65.0), 0.8);
        assert_eq!(competition_multiplier(45.0), 0.9);
        assert_eq!(competition_multiplier(30.0), 1.1);
        assert_eq!(competition_multiplier(10.0), 1.2);
    }

    #[test]
    fn risk_sort_puts_safer_tiers_first() {
        let engine = FlippingEngine::new(FlippingConfig::default());
        // Wide margin and no volatility -> low risk; thin margin with a
        // drifted weighted price -> medium risk.
        let calm = product("CALM", 1000.0, 1100.0, 600_000, 600_000);
        let volatile = {
            let mut p = product("WOBBLY", 100.0, 120.0, 600_000, 600_000);
            p.quick_status.buy_price = 88.0; // ~13.6% off instant
            p
        };

        let mut flips = engine.scan(&snapshot(vec![calm, volatile]), None, PriceMode::Instant);
        assert_eq!(flips.len(), 2);
        sort_flips(&mut flips, FlipSortKey::Risk);
        assert!(flips[0].risk <= flips[1].risk);
    }

    #[test]
    fn cached_scan_is_stable_across_reads() {
        let engine = FlippingEngine::new(FlippingConfig::default());
        let snap = snapshot(vec![product("X", 100.0, 200.0, 168_000, 168_000)]);
        let query = FlipQuery::default();

        let first = engine.find_opportunities(&snap, &query);
        assert!(!first.from_cache);

        // Same key served from cache even with a changed snapshot.
        let moved = snapshot(vec![product("X", 100.0, 150.0, 168_000, 168_000)]);
        let second = engine.find_opportunities(&moved, &query);
        assert!(second.from_cache);
        assert_eq!(second.items[0].sell_price, first.items[0].sell_price);
    }
}
