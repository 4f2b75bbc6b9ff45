//! Crafting arbitrage engine: price raw ingredients against the crafted
//! result under four pricing-strategy modes.
//!
//! Order legs quote the top of the opposite book; instant legs walk the
//! book at the estimated quantity (with the instant-buy surcharge on
//! the acquisition side) and clamp the craftable count to available
//! market depth.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::analysis::{walk, walk_instant_buy};
use crate::domain::{
    paginate, ItemId, PagedResult, Product, Recipe, RecipeBook, RiskTier, Snapshot,
};
use crate::error::{Error, Result};

/// How each leg of a craft is priced.
///
/// The first word is the ingredient-acquisition side, the second the
/// result-disposal side.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "snake_case")]
pub enum PricingStrategy {
    /// Buy ingredients and sell results via placed orders.
    #[default]
    OrderOrder,
    /// Buy via orders, dump results instantly.
    OrderInstant,
    /// Instant-buy ingredients, sell results via orders.
    InstantOrder,
    /// Both legs instant.
    InstantInstant,
}

impl PricingStrategy {
    #[must_use]
    pub const fn buys_instant(self) -> bool {
        matches!(self, Self::InstantOrder | Self::InstantInstant)
    }

    #[must_use]
    pub const fn sells_instant(self) -> bool {
        matches!(self, Self::OrderInstant | Self::InstantInstant)
    }
}

/// Which side of the craft ran out of market depth first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum DepthConstraint {
    None,
    Ingredient(ItemId),
    Result,
}

/// Crafting engine tuning.
#[derive(Debug, Clone, Deserialize)]
pub struct CraftingConfig {
    /// Volatility (percent) below which a craft is LOW risk.
    #[serde(default = "default_medium_volatility_threshold")]
    pub medium_volatility_threshold: f64,
    /// Volatility (percent) above which a craft is HIGH risk.
    #[serde(default = "default_high_volatility_threshold")]
    pub high_volatility_threshold: f64,
}

fn default_medium_volatility_threshold() -> f64 {
    10.0
}
fn default_high_volatility_threshold() -> f64 {
    25.0
}

impl Default for CraftingConfig {
    fn default() -> Self {
        Self {
            medium_volatility_threshold: default_medium_volatility_threshold(),
            high_volatility_threshold: default_high_volatility_threshold(),
        }
    }
}

/// A scored craft candidate. Immutable once produced.
#[derive(Debug, Clone, Serialize)]
pub struct CraftOpportunity {
    pub result_item: ItemId,
    pub result_count: u32,
    pub strategy: PricingStrategy,
    /// Cost of one craft's ingredients under the chosen strategy.
    pub ingredient_cost: f64,
    /// Revenue from one craft's results under the chosen strategy.
    pub result_revenue: f64,
    pub profit_per_craft: f64,
    pub profit_pct: f64,
    pub max_craftable: u64,
    pub total_profit: f64,
    pub constrained_by: DepthConstraint,
    pub volatility: f64,
    pub risk: RiskTier,
}

/// Query parameters for a crafting scan.
#[derive(Debug, Clone)]
pub struct CraftQuery {
    pub budget: u64,
    pub strategy: PricingStrategy,
    pub include_high_risk: bool,
    pub page: usize,
    pub page_size: usize,
}

impl Default for CraftQuery {
    fn default() -> Self {
        Self {
            budget: 10_000_000,
            strategy: PricingStrategy::default(),
            include_high_risk: false,
            page: 1,
            page_size: 10,
        }
    }
}

/// The crafting arbitrage engine.
pub struct CraftingEngine {
    config: CraftingConfig,
}

impl CraftingEngine {
    #[must_use]
    pub const fn new(config: CraftingConfig) -> Self {
        Self { config }
    }

    /// Rank and page craft opportunities.
    ///
    /// Crafting recomputes per request; results are cheap relative to
    /// the snapshot fetch and recipes books are small.
    #[must_use]
    pub fn find_opportunities(
        &self,
        snapshot: &Snapshot,
        recipes: &RecipeBook,
        query: &CraftQuery,
    ) -> PagedResult<CraftOpportunity> {
        let scanned = self.scan(snapshot, recipes, query);
        paginate(&scanned, query.page, query.page_size, false)
    }

    /// Evaluate every recipe in the book against one snapshot.
    ///
    /// Per-recipe failures are skipped, not fatal: one malformed market
    /// entry must not abort the whole batch. Ranked by total profit.
    #[must_use]
    pub fn scan(
        &self,
        snapshot: &Snapshot,
        recipes: &RecipeBook,
        query: &CraftQuery,
    ) -> Vec<CraftOpportunity> {
        let mut skipped = 0usize;
        let mut opportunities: Vec<CraftOpportunity> = recipes
            .iter()
            .filter_map(|recipe| {
                match self.evaluate(snapshot, recipe, query.budget, query.strategy) {
                    Some(opp) => Some(opp),
                    None => {
                        skipped += 1;
                        None
                    }
                }
            })
            .filter(|opp| query.include_high_risk || opp.risk != RiskTier::High)
            .collect();

        if skipped > 0 {
            debug!(skipped, "Recipes skipped during craft scan");
        }

        opportunities.sort_by(|a, b| {
            b.total_profit
                .partial_cmp(&a.total_profit)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.result_item.cmp(&b.result_item))
        });
        opportunities
    }

    /// Analyze one recipe by its result item.
    pub fn analyze(
        &self,
        snapshot: &Snapshot,
        recipes: &RecipeBook,
        item: &ItemId,
        budget: u64,
        strategy: PricingStrategy,
    ) -> Result<CraftOpportunity> {
        let recipe = recipes
            .get(item)
            .ok_or_else(|| Error::RecipeNotFound(item.clone()))?;
        self.evaluate(snapshot, recipe, budget, strategy)
            .ok_or_else(|| Error::ItemNotFound(item.clone()))
    }

    /// Evaluate one recipe. `None` when any referenced market is missing
    /// or empty, or nothing is craftable within budget and depth.
    fn evaluate(
        &self,
        snapshot: &Snapshot,
        recipe: &Recipe,
        budget: u64,
        strategy: PricingStrategy,
    ) -> Option<CraftOpportunity> {
        if recipe.ingredients.is_empty() || recipe.result_count == 0 {
            warn!(item = %recipe.result, "Malformed recipe skipped");
            return None;
        }
        let result_product = snapshot.get(&recipe.result)?;

        // First pass: simple top-of-book prices to bound the craft count.
        let simple_cost = self.price_ingredients(snapshot, recipe)?;
        if simple_cost <= 0.0 {
            return None;
        }
        let estimated_crafts = (budget as f64 / simple_cost).floor() as u64;
        if estimated_crafts == 0 {
            return None;
        }

        // Second pass: re-price with depth awareness at the estimated
        // quantity when any instant leg is active.
        let depth_qty = if strategy.buys_instant() || strategy.sells_instant() {
            Some(estimated_crafts)
        } else {
            None
        };

        let mut constrained_by = DepthConstraint::None;
        let mut depth_limit = u64::MAX;

        let ingredient_cost = match depth_qty {
            Some(crafts) if strategy.buys_instant() => {
                let (cost, limit, constraint) =
                    self.price_ingredients_depth(snapshot, recipe, crafts)?;
                if limit < depth_limit {
                    depth_limit = limit;
                    constrained_by = constraint;
                }
                cost
            }
            _ => simple_cost,
        };

        let result_revenue = match depth_qty {
            Some(crafts) if strategy.sells_instant() => {
                let units = crafts * u64::from(recipe.result_count);
                let outcome = walk(&result_product.buy_orders, units);
                if outcome.average_price <= 0.0 {
                    return None;
                }
                if !outcome.feasible {
                    let limit = outcome.max_possible / u64::from(recipe.result_count);
                    if limit < depth_limit {
                        depth_limit = limit;
                        constrained_by = DepthConstraint::Result;
                    }
                }
                outcome.average_price * f64::from(recipe.result_count)
            }
            _ => {
                result_product.best_buy_price()? * f64::from(recipe.result_count)
            }
        };

        if ingredient_cost <= 0.0 {
            return None;
        }

        let profit_per_craft = result_revenue - ingredient_cost;
        let profit_pct = profit_per_craft / ingredient_cost * 100.0;

        let budget_crafts = (budget as f64 / ingredient_cost).floor() as u64;
        let max_craftable = budget_crafts.min(depth_limit);
        if max_craftable == 0 {
            return None;
        }
        if max_craftable < depth_limit {
            // Budget bound first, so depth never actually constrained.
            constrained_by = DepthConstraint::None;
        }

        let total_profit = profit_per_craft * max_craftable as f64;
        let volatility = self.craft_volatility(snapshot, recipe, result_product);

        Some(CraftOpportunity {
            result_item: recipe.result.clone(),
            result_count: recipe.result_count,
            strategy,
            ingredient_cost,
            result_revenue,
            profit_per_craft,
            profit_pct,
            max_craftable,
            total_profit,
            constrained_by,
            volatility,
            risk: self.classify_risk(volatility),
        })
    }

    /// Price one craft's ingredients with top-of-book quotes.
    ///
    /// Order-mode acquisition quotes the best offer; instant-mode
    /// acquisition at this stage also quotes the best offer (the
    /// surcharge and depth come in on the second pass).
    fn price_ingredients(&self, snapshot: &Snapshot, recipe: &Recipe) -> Option<f64> {
        let mut cost = 0.0;
        for (ingredient, &required) in &recipe.ingredients {
            let product = snapshot.get(ingredient)?;
            let unit = product.best_sell_price()?;
            cost += unit * f64::from(required);
        }
        Some(cost)
    }

    /// Depth-priced ingredient cost per craft at `crafts` crafts.
    ///
    /// Returns `(cost_per_craft, craft_limit, constraint)` where
    /// `craft_limit` is the smallest number of crafts any ingredient's
    /// depth supports.
    fn price_ingredients_depth(
        &self,
        snapshot: &Snapshot,
        recipe: &Recipe,
        crafts: u64,
    ) -> Option<(f64, u64, DepthConstraint)> {
        let mut cost = 0.0;
        let mut limit = u64::MAX;
        let mut constraint = DepthConstraint::None;

        for (ingredient, &required) in &recipe.ingredients {
            let product = snapshot.get(ingredient)?;
            let units = crafts * u64::from(required);
            let outcome = walk_instant_buy(&product.sell_orders, units);
            if outcome.average_price <= 0.0 {
                return None;
            }
            if !outcome.feasible {
                let ingredient_limit = outcome.max_possible / u64::from(required);
                if ingredient_limit < limit {
                    limit = ingredient_limit;
                    constraint = DepthConstraint::Ingredient(ingredient.clone());
                }
            }
            cost += outcome.average_price * f64::from(required);
        }
        Some((cost, limit, constraint))
    }

    /// Mean price volatility across every market the craft touches.
    fn craft_volatility(
        &self,
        snapshot: &Snapshot,
        recipe: &Recipe,
        result_product: &Product,
    ) -> f64 {
        let mut total = result_product.price_volatility();
        let mut markets = 1usize;
        for ingredient in recipe.ingredients.keys() {
            if let Some(product) = snapshot.get(ingredient) {
                total += product.price_volatility();
                markets += 1;
            }
        }
        total / markets as f64
    }

    fn classify_risk(&self, volatility: f64) -> RiskTier {
        if volatility > self.config.high_volatility_threshold {
            RiskTier::High
        } else if volatility > self.config.medium_volatility_threshold {
            RiskTier::Medium
        } else {
            RiskTier::Low
        }
    }
}
