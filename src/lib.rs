//! Bazaarlord - bazaar order-book analysis and opportunity detection.
//!
//! This crate ingests raw order-book snapshots from a game's bazaar API
//! and derives ranked, paginated, cached trading opportunities for four
//! strategies.
//!
//! # Architecture
//!
//! Data flows gateway -> analysis -> engines:
//!
//! - **`gateway`** - Upstream REST boundary. Normalizes the feed's
//!   inverted buy/sell field naming into a corrected [`domain::Product`]
//!   orientation every downstream formula assumes.
//! - **`analysis`** - Market microstructure primitives: order-book depth
//!   walking, liquidity scoring, competition pattern detection.
//! - **`strategy`** - The opportunity engines:
//!   - `FlippingEngine` - buy low via bid, sell high via offer
//!   - `CraftingEngine` - raw ingredients vs crafted result, four
//!     pricing-strategy modes
//!   - `ManipulationEngine` - thin-market buyout viability
//!   - `NpcEngine` - bazaar acquisition vs fixed vendor price
//!
//! # Modules
//!
//! - [`config`] - TOML configuration with per-engine tuning sections
//! - [`domain`] - Shared types: products, recipes, risk tiers, paging,
//!   the injected TTL cache
//! - [`error`] - Error types for the crate
//! - [`gateway`] - Market and vendor REST clients
//! - [`analysis`] - Depth walker and scoring heuristics
//! - [`strategy`] - The four opportunity engines
//! - [`app`] - The [`app::Analyzer`] service owning engines and caches
//! - [`cli`] - Command-line shell
//!
//! # Example
//!
//! ```
//! use bazaarlord::strategy::{FlippingConfig, FlippingEngine};
//!
//! let engine = FlippingEngine::new(FlippingConfig::default());
//! assert_eq!(engine.config().market_share_fraction, 0.20);
//! ```

pub mod analysis;
pub mod app;
pub mod cli;
pub mod config;
pub mod domain;
pub mod error;
pub mod gateway;
pub mod strategy;
