//! Competition scoring from order-clustering patterns.
//!
//! Heavily contested items show characteristic order-book shapes:
//! long runs of fixed-increment undercuts, near-zero gaps between the
//! top orders, a tight overall spread, and one dense price cluster.
//! Four detectors each score a side 0-100 and are blended with fixed
//! weights; the buy side dominates the final blend since flippers
//! compete mostly on bids.

use crate::domain::OrderLevel;

/// Detector blend weights: increments / gaps / spread / clusters.
pub const INCREMENT_WEIGHT: f64 = 0.4;
pub const GAP_WEIGHT: f64 = 0.25;
pub const SPREAD_WEIGHT: f64 = 0.2;
pub const CLUSTER_WEIGHT: f64 = 0.15;

/// Default share of the final score taken from the buy side.
pub const DEFAULT_BUY_SIDE_WEIGHT: f64 = 0.7;

/// Overall score for a side with too few orders to analyze.
pub const NEUTRAL_COMPETITION: f64 = 10.0;
/// Sub-detector fallback when its own input is too small.
pub const NEUTRAL_DETECTOR: f64 = 50.0;

/// Minimum orders on a side before pattern detection is meaningful.
const MIN_ORDERS_FOR_ANALYSIS: usize = 3;

/// Candidate undercut increments, coarsest last.
const INCREMENT_CANDIDATES: [f64; 6] = [0.1, 0.2, 0.3, 0.4, 0.5, 1.0];
/// Absolute tolerance when matching a price step to a candidate increment.
const INCREMENT_TOLERANCE: f64 = 0.01;

/// Gap larger than this (percent) counts as significant.
const SIGNIFICANT_GAP_PCT: f64 = 0.5;
/// Price span between clusters (percent) that splits them.
const CLUSTER_GAP_PCT: f64 = 0.3;
/// Cluster size that reads as one coordinated undercut war.
const DOMINANT_CLUSTER_SIZE: usize = 6;

const GAP_PRICES_ANALYZED: usize = 10;
const SPREAD_PRICES_ANALYZED: usize = 10;
const CLUSTER_PRICES_ANALYZED: usize = 15;

/// Blended competition score for a full product, 0-100.
///
/// `buy_side_weight` is the share taken from the buy side; the rest
/// comes from the sell side.
#[must_use]
pub fn competition_score(
    buy_orders: &[OrderLevel],
    sell_orders: &[OrderLevel],
    buy_side_weight: f64,
) -> f64 {
    let buy = side_competition(buy_orders);
    let sell = side_competition(sell_orders);
    buy * buy_side_weight + sell * (1.0 - buy_side_weight)
}

/// Competition score for one side of the book, 0-100.
#[must_use]
pub fn side_competition(orders: &[OrderLevel]) -> f64 {
    if orders.len() < MIN_ORDERS_FOR_ANALYSIS {
        return NEUTRAL_COMPETITION;
    }

    let prices: Vec<f64> = orders.iter().map(|l| l.price_per_unit).collect();

    increment_score(&prices) * INCREMENT_WEIGHT
        + gap_score(&prices) * GAP_WEIGHT
        + spread_score(&prices) * SPREAD_WEIGHT
        + cluster_score(&prices) * CLUSTER_WEIGHT
}

/// Detect fixed-increment undercutting from the best price outward.
///
/// Tries each candidate increment and keeps the longest run of
/// consecutive orders whose successive steps match it, then maps the
/// run length through a step function with bonuses for tight steps.
fn increment_score(prices: &[f64]) -> f64 {
    if prices.len() < 2 {
        return NEUTRAL_DETECTOR;
    }

    let mut best_run = 0usize;
    let mut best_increment = 0.0f64;

    for &candidate in &INCREMENT_CANDIDATES {
        let mut run = 0usize;
        for pair in prices.windows(2) {
            let step = (pair[0] - pair[1]).abs();
            if (step - candidate).abs() <= INCREMENT_TOLERANCE {
                run += 1;
            } else {
                break;
            }
        }
        if run > best_run {
            best_run = run;
            best_increment = candidate;
        }
    }

    // A run of N matching steps means N+1 orders follow the pattern.
    let fitted_orders = if best_run == 0 { 0 } else { best_run + 1 };

    let base: f64 = match fitted_orders {
        n if n >= 5 => 95.0,
        4 => 85.0,
        3 => 75.0,
        2 => 60.0,
        _ => 15.0,
    };

    let tightness_bonus = if fitted_orders >= 2 && best_increment <= 0.1 {
        5.0
    } else if fitted_orders >= 2 && best_increment <= 0.2 {
        3.0
    } else {
        0.0
    };

    (base + tightness_bonus).min(100.0)
}

/// Score from percentage gaps between consecutive top prices.
///
/// Tiny average gaps mean orders are stacked right on top of each
/// other; frequent or large gaps mean the side is uncontested.
fn gap_score(prices: &[f64]) -> f64 {
    let top = &prices[..prices.len().min(GAP_PRICES_ANALYZED)];
    if top.len() < 2 {
        return NEUTRAL_DETECTOR;
    }

    let mut significant = 0usize;
    let mut total_gap_pct = 0.0;
    let mut gaps = 0usize;

    for pair in top.windows(2) {
        if pair[0] <= 0.0 {
            continue;
        }
        let gap_pct = (pair[1] - pair[0]).abs() / pair[0] * 100.0;
        total_gap_pct += gap_pct;
        gaps += 1;
        if gap_pct > SIGNIFICANT_GAP_PCT {
            significant += 1;
        }
    }

    if gaps == 0 {
        return NEUTRAL_DETECTOR;
    }
    let average_gap_pct = total_gap_pct / gaps as f64;

    if average_gap_pct < 0.1 {
        85.0
    } else if significant >= 3 || average_gap_pct > 1.0 {
        20.0
    } else if significant >= 1 {
        45.0
    } else {
        70.0
    }
}

/// Score from the percentage spread between the best and 10th-best price.
fn spread_score(prices: &[f64]) -> f64 {
    let best = prices[0];
    if best <= 0.0 {
        return NEUTRAL_DETECTOR;
    }
    let reference = prices[prices.len().min(SPREAD_PRICES_ANALYZED) - 1];
    let spread_pct = (reference - best).abs() / best * 100.0;

    if spread_pct > 10.0 {
        20.0
    } else if spread_pct > 5.0 {
        35.0
    } else if spread_pct > 2.0 {
        50.0
    } else if spread_pct >= 0.5 {
        70.0
    } else {
        90.0
    }
}

/// Segment the top prices into clusters and score the shape.
///
/// One dominant cluster means everyone is fighting over the same price
/// point; many small clusters mean scattered, independent orders.
fn cluster_score(prices: &[f64]) -> f64 {
    let top = &prices[..prices.len().min(CLUSTER_PRICES_ANALYZED)];
    if top.len() < 2 {
        return NEUTRAL_DETECTOR;
    }

    let mut cluster_sizes = Vec::new();
    let mut current = 1usize;

    for pair in top.windows(2) {
        let gap_pct = if pair[0] > 0.0 {
            (pair[1] - pair[0]).abs() / pair[0] * 100.0
        } else {
            f64::INFINITY
        };
        if gap_pct > CLUSTER_GAP_PCT {
            cluster_sizes.push(current);
            current = 1;
        } else {
            current += 1;
        }
    }
    cluster_sizes.push(current);

    let largest = cluster_sizes.iter().copied().max().unwrap_or(1);

    if largest >= DOMINANT_CLUSTER_SIZE {
        80.0
    } else if cluster_sizes.len() >= 4 {
        25.0
    } else if cluster_sizes.len() == 1 {
        70.0
    } else {
        45.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn book(prices: &[f64]) -> Vec<OrderLevel> {
        prices.iter().map(|&p| OrderLevel::new(p, 100, 1)).collect()
    }

    #[test]
    fn thin_side_gets_the_neutral_default() {
        assert_eq!(side_competition(&book(&[100.0, 99.9])), NEUTRAL_COMPETITION);
        assert_eq!(side_competition(&[]), NEUTRAL_COMPETITION);
    }

    #[test]
    fn tight_undercut_ladder_scores_high() {
        // Six bids undercutting each other by exactly 0.1.
        let ladder = book(&[100.0, 99.9, 99.8, 99.7, 99.6, 99.5]);
        let score = side_competition(&ladder);
        assert!(score > 70.0, "expected contested ladder, got {score}");
    }

    #[test]
    fn scattered_orders_score_low() {
        let sparse = book(&[100.0, 92.0, 80.0, 65.0, 50.0, 30.0]);
        let score = side_competition(&sparse);
        assert!(score < 35.0, "expected sparse side, got {score}");
    }

    #[test]
    fn increment_run_length_steps_the_score() {
        assert_eq!(increment_score(&[100.0, 99.9, 99.8]), 80.0); // 3 fit + tight bonus
        assert_eq!(increment_score(&[100.0, 99.5, 99.0, 98.5]), 85.0); // 4 fit, 0.5 step
        assert_eq!(increment_score(&[100.0, 87.0, 55.0]), 15.0); // no pattern
    }

    #[test]
    fn blend_weights_favor_the_buy_side() {
        let contested = book(&[100.0, 99.9, 99.8, 99.7, 99.6, 99.5]);
        let quiet = book(&[110.0, 130.0, 160.0, 200.0]);

        let buy_hot = competition_score(&contested, &quiet, DEFAULT_BUY_SIDE_WEIGHT);
        let sell_hot = competition_score(&quiet, &contested, DEFAULT_BUY_SIDE_WEIGHT);
        assert!(buy_hot > sell_hot);
    }
}
