//! Per-trader influence weighting
//!
//! Turns one trader record into a signed raw weight:
//!
//! ```text
//! weight = sign(sentiment) * base(position, score) * pnl * entry * supply
//! ```
//!
//! The score transform and the shape of each multiplier depend on the
//! configured [`WeightingStrategy`]:
//! - **Exponential** (classic): `exp(score / k)`, rewards high scores heavily
//!   and overflows for scores beyond roughly ±250 * k / 25
//! - **Logarithmic** (advanced): `sign(score) * ln(1 + |score|)` with a
//!   log-dampened position base and noise deadbands
//! - **Saturating** (v1 gravity): `0.5 + 0.5 * tanh(score / 40)` on a
//!   `log2(position + 1)` base


use crate::config::{WeightingConfig, WeightingStrategy};
use crate::types::Trader;

/// Advantages smaller than this are treated as noise in advanced mode
const ENTRY_DEADBAND: f64 = 0.01;
/// Advanced entry multiplier stays within 1 ± this
const ADVANCED_ENTRY_LIMIT: f64 = 0.05;
/// Floor for the advanced PnL multiplier so a loss never flips the sign
const MIN_PNL_MULTIPLIER: f64 = 0.1;

/// Signed raw influence of one trader
///
/// `market_probability` is the current YES price in [0, 1]. Traders with no
/// position carry zero weight.
pub fn raw_weight(trader: &Trader, market_probability: f64, config: &WeightingConfig) -> f64 {
    if trader.position_size <= 0.0 {
        return 0.0;
    }

    let base = base_magnitude(trader, config);
    let pnl = pnl_multiplier(trader, config.strategy);
    let entry = entry_multiplier(trader, market_probability, config);
    let supply = supply_multiplier(trader, config);

    trader.sentiment.sign() * base * pnl * entry * supply
}

/// Conviction-score transform
pub fn score_weight(score: f64, config: &WeightingConfig) -> f64 {
    match config.strategy {
        WeightingStrategy::Exponential => (score / config.exp_scale).exp(),
        WeightingStrategy::Logarithmic => score.signum() * score.abs().ln_1p(),
        WeightingStrategy::Saturating => 0.5 + 0.5 * (score / config.tanh_scale).tanh(),
    }
}

fn base_magnitude(trader: &Trader, config: &WeightingConfig) -> f64 {
    let position = trader.position_size;
    let sw = score_weight(trader.conviction_score, config);

    match config.strategy {
        WeightingStrategy::Exponential => position * sw,
        WeightingStrategy::Logarithmic => {
            let dampening = 1.0 + (1.0 + position / 1000.0).log10() / 10.0;
            position * dampening * sw
        }
        WeightingStrategy::Saturating => (position + 1.0).log2() * sw,
    }
}

/// Realized/unrealized PnL multiplier; 1 when no PnL is known
pub fn pnl_multiplier(trader: &Trader, strategy: WeightingStrategy) -> f64 {
    match strategy {
        WeightingStrategy::Logarithmic => match trader.total_pnl() {
            Some(pnl) if pnl != 0.0 => {
                let adj = pnl.signum() * (1.0 + pnl.abs() / 100.0).log10() / 2.0;
                (1.0 + adj).max(MIN_PNL_MULTIPLIER)
            }
            _ => 1.0,
        },
        WeightingStrategy::Exponential | WeightingStrategy::Saturating => {
            let realized = trader.realized_pnl.unwrap_or(0.0);
            let unrealized = trader.unrealized_pnl.unwrap_or(0.0);
            1.0 + 0.5 * (realized / 1000.0).tanh() + 0.5 * (unrealized / 1000.0).tanh()
        }
    }
}

/// How favorable the trader's entry was, signed by sentiment
///
/// Positive when a YES trader bought below the current price or a NO trader
/// entered above it.
pub fn entry_advantage(trader: &Trader, market_probability: f64) -> Option<f64> {
    trader
        .entry_price
        .map(|entry| trader.sentiment.sign() * (market_probability - entry))
}

pub fn entry_multiplier(trader: &Trader, market_probability: f64, config: &WeightingConfig) -> f64 {
    let Some(advantage) = entry_advantage(trader, market_probability) else {
        return 1.0;
    };
    let scaled = config.entry_coefficient * advantage;

    match config.strategy {
        WeightingStrategy::Logarithmic => {
            if advantage.abs() < ENTRY_DEADBAND {
                1.0
            } else {
                1.0 + scaled.clamp(-ADVANCED_ENTRY_LIMIT, ADVANCED_ENTRY_LIMIT)
            }
        }
        WeightingStrategy::Exponential | WeightingStrategy::Saturating => {
            1.0 + scaled.clamp(-0.5, 1.0)
        }
    }
}

/// Flat whale bonus once ownership reaches the threshold
pub fn supply_multiplier(trader: &Trader, config: &WeightingConfig) -> f64 {
    match trader.supply_ownership {
        Some(ownership) if ownership >= config.whale_threshold => config.whale_bonus,
        _ => 1.0,
    }
}

/// Keep the `n` traders with the highest selection score (0 keeps all)
///
/// Ties keep their input order.
pub fn select_top(traders: &[Trader], n: usize) -> Vec<Trader> {
    if n == 0 || traders.len() <= n {
        return traders.to_vec();
    }

    let mut ranked: Vec<&Trader> = traders.iter().collect();
    ranked.sort_by(|a, b| b.selection_score().total_cmp(&a.selection_score()));
    ranked.truncate(n);

    tracing::debug!(
        kept = n,
        dropped = traders.len() - n,
        "Truncated trader pool to most influential"
    );

    ranked.into_iter().cloned().collect()
}
