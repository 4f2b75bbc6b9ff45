//! Liquidity scoring from volume magnitude and buy/sell balance.

/// Weekly volume at which the magnitude term saturates.
pub const VOLUME_DIVISOR: f64 = 1_000_000.0;
/// Points available from the volume-magnitude term.
pub const MAX_VOLUME_POINTS: f64 = 50.0;
/// Points available from the buy/sell balance term.
pub const MAX_BALANCE_POINTS: f64 = 40.0;
/// Weekly volume above which the viability bonus is granted.
pub const PREFERRED_VOLUME: f64 = 100_000.0;
/// Flat bonus for markets clearing [`PREFERRED_VOLUME`].
pub const VIABILITY_BONUS: f64 = 10.0;

/// Score a market's liquidity 0-100 from its weekly traded volumes.
///
/// Three additive terms: volume magnitude (capped), buy/sell balance
/// ratio, and a flat minimum-viability bonus. Clamped to 100.
#[must_use]
pub fn liquidity_score(buy_volume: u64, sell_volume: u64) -> f64 {
    let buy = buy_volume as f64;
    let sell = sell_volume as f64;
    let total = buy + sell;

    let volume_points = (total / VOLUME_DIVISOR).min(1.0) * MAX_VOLUME_POINTS;

    let balance_ratio = if buy.max(sell) > 0.0 {
        buy.min(sell) / buy.max(sell)
    } else {
        0.0
    };
    let balance_points = balance_ratio * MAX_BALANCE_POINTS;

    let bonus = if total >= PREFERRED_VOLUME {
        VIABILITY_BONUS
    } else {
        0.0
    };

    (volume_points + balance_points + bonus).min(100.0)
}
