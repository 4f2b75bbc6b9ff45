//! Market microstructure analysis: depth walking, liquidity and
//! competition heuristics shared by the opportunity engines.

pub mod competition;
pub mod depth;
pub mod liquidity;

pub use competition::{competition_score, side_competition, DEFAULT_BUY_SIDE_WEIGHT};
pub use depth::{walk, walk_instant_buy, WalkOutcome, INSTANT_BUY_SURCHARGE};
pub use liquidity::liquidity_score;
