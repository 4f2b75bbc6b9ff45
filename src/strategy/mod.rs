//! Opportunity engines: flipping, crafting arbitrage, market
//! manipulation, and NPC vendor arbitrage.

pub mod crafting;
pub mod flipping;
pub mod manipulation;
pub mod npc;

pub use crafting::{
    CraftOpportunity, CraftQuery, CraftingConfig, CraftingEngine, DepthConstraint, PricingStrategy,
};
pub use flipping::{
    FlipOpportunity, FlipQuery, FlipSortKey, FlippingConfig, FlippingEngine, PriceMode,
};
pub use manipulation::{
    LadderStep, ManipulationConfig, ManipulationEngine, ManipulationOpportunity, ManipulationQuery,
};
pub use npc::{AcquisitionStrategy, NpcConfig, NpcEngine, NpcOpportunity, NpcQuery, NpcSortKey};
