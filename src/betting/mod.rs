//! Position sizing from the calibrated probability
//!
//! - [`kelly_recommendation`]: fractional Kelly with confidence-tiered caps and
//!   edge thresholds, the main engine output
//! - [`basic::basic_kelly`]: the standalone betting calculator
//! - [`arbitrage::arbitrage_signal`]: confidence-independent edge check
//! - [`hedge::hedge`]: two-sided hedge allocation
//!
//! Kelly for a binary contract bought at price `m` with win probability `p`:
//!
//! ```text
//! edge  = (p - m) / m            (relative edge, YES side)
//! odds  = 1 / m
//! f*    = edge / (odds - 1)  =  (p - m) / (1 - m)
//! ```
//! The NO side mirrors this with `1 - m` and `1 - p`.

pub mod arbitrage;
pub mod basic;
pub mod hedge;

#[cfg(test)]
mod tests;

pub use arbitrage::{arbitrage_signal, ArbitrageSignal};
pub use basic::{basic_kelly, BasicKellyConfig, BasicKellyInput, BasicKellyResult};
pub use hedge::{hedge, HedgeResult};

use crate::config::{EdgeThreshold, KellyConfig};
use crate::stats::{clamp_probability, safe_div, EPSILON};
use crate::types::{to_cents, BetSide, BettingRecommendation, ConfidenceTier};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

/// Edges below this are shrunk super-linearly when edge scaling is on
const SMALL_EDGE: f64 = 0.05;

/// Map a confidence factor onto a betting tier
pub fn confidence_tier(confidence: f64, config: &KellyConfig) -> ConfidenceTier {
    if confidence >= config.high_confidence {
        ConfidenceTier::High
    } else if confidence >= config.medium_confidence {
        ConfidenceTier::Medium
    } else if confidence >= config.low_confidence {
        ConfidenceTier::Low
    } else {
        ConfidenceTier::None
    }
}

/// Maximum fraction of bankroll allowed for a tier
pub fn tier_cap(tier: ConfidenceTier, config: &KellyConfig) -> f64 {
    match tier {
        ConfidenceTier::High => config.high_cap,
        ConfidenceTier::Medium => config.medium_cap,
        ConfidenceTier::Low => config.low_cap,
        ConfidenceTier::None => 0.0,
    }
}

/// Minimum |edge| for a tier
pub fn edge_threshold(tier: ConfidenceTier, threshold: &EdgeThreshold) -> f64 {
    match (threshold, tier) {
        (EdgeThreshold::Flat(t), _) => *t,
        (EdgeThreshold::Tiered { high, .. }, ConfidenceTier::High) => *high,
        (EdgeThreshold::Tiered { medium, .. }, ConfidenceTier::Medium) => *medium,
        (EdgeThreshold::Tiered { low, .. }, ConfidenceTier::Low) => *low,
        (EdgeThreshold::Tiered { low, .. }, ConfidenceTier::None) => *low,
    }
}

/// Side and signed relative edge; positive for YES, negative for NO
///
/// A market priced at exactly 0 or 1 has no edge on either side.
pub fn relative_edge(probability: f64, market_probability: f64) -> (BetSide, f64) {
    let p = clamp_probability(probability);
    let m = clamp_probability(market_probability);

    if is_certain_price(m) || (p - m).abs() < EPSILON {
        (BetSide::None, 0.0)
    } else if p > m {
        (BetSide::Yes, (p - m) / m.max(EPSILON))
    } else {
        (BetSide::No, -((m - p) / (1.0 - m).max(EPSILON)))
    }
}

/// YES price already settled at 0% or 100%
pub fn is_certain_price(market_probability: f64) -> bool {
    let m = clamp_probability(market_probability);
    m <= 0.0 || m >= 1.0
}

/// Full Kelly fraction for a side; `|edge| / (odds - 1)`
pub fn kelly_fraction(side: BetSide, edge: f64, market_probability: f64, edge_scaling: bool) -> f64 {
    let m = clamp_probability(market_probability);
    let mut magnitude = edge.abs();
    if edge_scaling && magnitude < SMALL_EDGE {
        magnitude = magnitude.powf(1.5);
    }

    let odds = match side {
        BetSide::Yes => safe_div(1.0, m),
        BetSide::No => safe_div(1.0, 1.0 - m),
        BetSide::None => return 0.0,
    };

    safe_div(magnitude, (odds - 1.0).max(0.0))
}

/// Confidence-tiered fractional Kelly recommendation
///
/// `market_probability` is the YES price in [0, 1]. The bet is zero unless
/// there is a favorable side, the confidence reaches a tier, the edge clears
/// that tier's threshold and the safe fraction is positive; `reasoning`
/// names the first gate that failed.
pub fn kelly_recommendation(
    probability: f64,
    market_probability: f64,
    bankroll: Decimal,
    confidence: f64,
    config: &KellyConfig,
) -> BettingRecommendation {
    let (side, edge) = relative_edge(probability, market_probability);
    let kelly = kelly_fraction(side, edge, market_probability, config.edge_scaling);
    let safe = finite_fraction(kelly * config.multiplier);

    let tier = confidence_tier(confidence, config);
    let cap = tier_cap(tier, config);
    let threshold = edge_threshold(tier, &config.edge_threshold);

    let gate = if is_certain_price(market_probability) {
        Err(format!(
            "Certain market price ({:.0}%): no edge to bet",
            clamp_probability(market_probability) * 100.0
        ))
    } else if side == BetSide::None {
        Err("No favorable side: calibrated probability matches the market price".to_string())
    } else if tier == ConfidenceTier::None {
        Err(format!(
            "Confidence too low to bet ({:.1}% < {:.1}% minimum)",
            confidence * 100.0,
            config.low_confidence * 100.0
        ))
    } else if edge.abs() < threshold {
        Err(format!(
            "Edge too small: {:.1}% on {} is below the {:.1}% threshold for {} confidence",
            edge.abs() * 100.0,
            side,
            threshold * 100.0,
            tier
        ))
    } else if safe <= 0.0 {
        Err("Kelly sizing returned no stake".to_string())
    } else {
        Ok(())
    };

    let bankroll = bankroll.max(Decimal::ZERO);
    let (should_bet, recommended_bet_size, reasoning) = match gate {
        Ok(()) => {
            let fraction = safe.min(cap);
            let size = to_cents(fraction * bankroll.to_f64().unwrap_or(0.0));
            let reasoning = format!(
                "Bet {}: {:.1}% edge with {} confidence; {:.1}% fractional Kelly{}",
                side,
                edge.abs() * 100.0,
                tier,
                safe * 100.0,
                if safe > cap {
                    format!(", capped at {:.0}% of bankroll", cap * 100.0)
                } else {
                    String::new()
                }
            );
            (true, size, reasoning)
        }
        Err(reason) => (false, Decimal::ZERO, reason),
    };

    tracing::debug!(
        side = %side,
        edge,
        kelly,
        tier = %tier,
        should_bet,
        "Kelly recommendation"
    );

    BettingRecommendation {
        bet_side: side,
        edge,
        kelly_fraction: kelly,
        safe_fraction: safe,
        confidence_tier: tier,
        tier_cap: cap,
        recommended_bet_size,
        should_bet,
        reasoning,
    }
}

fn finite_fraction(f: f64) -> f64 {
    if f.is_finite() {
        f.max(0.0)
    } else {
        0.0
    }
}
