//! Application service tying the gateway, recipe book, and engines
//! together.
//!
//! Each user-facing query triggers at most one upstream fetch: the
//! analyzer keeps the latest snapshot and reuses it within a short TTL.
//! Engines stay pure functions of `(snapshot, params)` beyond their own
//! result caches.

use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::RwLock;
use serde::Serialize;
use tracing::debug;

use crate::analysis::liquidity_score;
use crate::config::Config;
use crate::domain::{ItemId, PagedResult, RecipeBook, Snapshot};
use crate::error::{Error, Result};
use crate::gateway::{MarketFeed, VendorFeed, VendorItem};
use crate::strategy::{
    CraftOpportunity, CraftQuery, CraftingEngine, FlipOpportunity, FlipQuery, FlippingEngine,
    ManipulationEngine, ManipulationOpportunity, ManipulationQuery, NpcEngine, NpcOpportunity,
    NpcQuery, PricingStrategy,
};

struct CachedSnapshot {
    snapshot: Arc<Snapshot>,
    fetched_at: Instant,
}

struct CachedVendor {
    items: Arc<Vec<VendorItem>>,
    fetched_at: Instant,
}

/// Single-item market view returned by a price check.
#[derive(Debug, Clone, Serialize)]
pub struct PriceCheck {
    pub item_id: ItemId,
    pub best_buy_price: Option<f64>,
    pub best_sell_price: Option<f64>,
    pub spread: Option<f64>,
    pub weighted_buy_price: f64,
    pub weighted_sell_price: f64,
    pub weekly_buy_movement: u64,
    pub weekly_sell_movement: u64,
    pub liquidity: f64,
}

/// The market analyzer: one instance owns all engines and caches.
pub struct Analyzer {
    feed: Arc<dyn MarketFeed>,
    vendor_feed: Arc<dyn VendorFeed>,
    recipes: RecipeBook,
    flipping: FlippingEngine,
    crafting: CraftingEngine,
    manipulation: ManipulationEngine,
    npc: NpcEngine,
    snapshot_ttl: Duration,
    snapshot: RwLock<Option<CachedSnapshot>>,
    vendor_cache: RwLock<Option<CachedVendor>>,
}

impl Analyzer {
    #[must_use]
    pub fn new(
        config: &Config,
        feed: Arc<dyn MarketFeed>,
        vendor_feed: Arc<dyn VendorFeed>,
        recipes: RecipeBook,
    ) -> Self {
        Self {
            feed,
            vendor_feed,
            recipes,
            flipping: FlippingEngine::new(config.flipping.clone()),
            crafting: CraftingEngine::new(config.crafting.clone()),
            manipulation: ManipulationEngine::new(config.manipulation.clone()),
            npc: NpcEngine::new(config.npc.clone()),
            snapshot_ttl: Duration::from_secs(config.network.snapshot_ttl_secs),
            snapshot: RwLock::new(None),
            vendor_cache: RwLock::new(None),
        }
    }

    /// Latest snapshot, re-fetched when stale.
    async fn snapshot(&self) -> Result<Arc<Snapshot>> {
        if let Some(cached) = self.snapshot.read().as_ref() {
            if cached.fetched_at.elapsed() <= self.snapshot_ttl {
                return Ok(Arc::clone(&cached.snapshot));
            }
        }

        debug!("Snapshot stale, fetching");
        let snapshot = Arc::new(self.feed.fetch_snapshot().await?);
        *self.snapshot.write() = Some(CachedSnapshot {
            snapshot: Arc::clone(&snapshot),
            fetched_at: Instant::now(),
        });
        Ok(snapshot)
    }

    async fn vendor_items(&self) -> Result<Arc<Vec<VendorItem>>> {
        if let Some(cached) = self.vendor_cache.read().as_ref() {
            if cached.fetched_at.elapsed() <= self.snapshot_ttl {
                return Ok(Arc::clone(&cached.items));
            }
        }

        let items = Arc::new(self.vendor_feed.fetch_vendor_prices().await?);
        *self.vendor_cache.write() = Some(CachedVendor {
            items: Arc::clone(&items),
            fetched_at: Instant::now(),
        });
        Ok(items)
    }

    pub async fn flips(&self, query: &FlipQuery) -> Result<PagedResult<FlipOpportunity>> {
        let snapshot = self.snapshot().await?;
        Ok(self.flipping.find_opportunities(&snapshot, query))
    }

    pub async fn crafts(&self, query: &CraftQuery) -> Result<PagedResult<CraftOpportunity>> {
        let snapshot = self.snapshot().await?;
        Ok(self
            .crafting
            .find_opportunities(&snapshot, &self.recipes, query))
    }

    /// Analyze a single recipe by its result item.
    pub async fn craft_for_item(
        &self,
        item: &ItemId,
        budget: u64,
        strategy: PricingStrategy,
    ) -> Result<CraftOpportunity> {
        let snapshot = self.snapshot().await?;
        self.crafting
            .analyze(&snapshot, &self.recipes, item, budget, strategy)
    }

    pub async fn manipulations(
        &self,
        query: &ManipulationQuery,
    ) -> Result<PagedResult<ManipulationOpportunity>> {
        let snapshot = self.snapshot().await?;
        Ok(self.manipulation.find_opportunities(&snapshot, query))
    }

    pub async fn npc_arbitrage(&self, query: &NpcQuery) -> Result<PagedResult<NpcOpportunity>> {
        let snapshot = self.snapshot().await?;
        let vendor_items = self.vendor_items().await?;
        Ok(self.npc.find_opportunities(&snapshot, &vendor_items, query))
    }

    /// Look up one item's current market state.
    pub async fn price_check(&self, item: &ItemId) -> Result<PriceCheck> {
        let snapshot = self.snapshot().await?;
        let product = snapshot
            .get(item)
            .ok_or_else(|| Error::ItemNotFound(item.clone()))?;
        let qs = &product.quick_status;

        Ok(PriceCheck {
            item_id: product.item_id.clone(),
            best_buy_price: product.best_buy_price(),
            best_sell_price: product.best_sell_price(),
            spread: product.spread(),
            weighted_buy_price: qs.buy_price,
            weighted_sell_price: qs.sell_price,
            weekly_buy_movement: qs.buy_moving_week,
            weekly_sell_movement: qs.sell_moving_week,
            liquidity: liquidity_score(qs.buy_moving_week, qs.sell_moving_week),
        })
    }

    /// Drop every engine cache and the snapshot, forcing fresh data on
    /// the next query.
    pub fn clear_caches(&self) {
        self.flipping.clear_cache();
        self.manipulation.clear_cache();
        self.npc.clear_cache();
        *self.snapshot.write() = None;
        *self.vendor_cache.write() = None;
    }
}
