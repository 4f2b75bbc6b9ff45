//! Risk tiers shared by every opportunity engine.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Risk classification for an opportunity.
///
/// Ordering is by increasing risk, so `Low < Medium < High < Extreme`
/// and sorting by tier puts the safest opportunities first.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskTier {
    Low,
    Medium,
    High,
    Extreme,
}

impl fmt::Display for RiskTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Low => "LOW",
            Self::Medium => "MEDIUM",
            Self::High => "HIGH",
            Self::Extreme => "EXTREME",
        };
        write!(f, "{s}")
    }
}
