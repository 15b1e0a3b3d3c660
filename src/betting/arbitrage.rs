//! Confidence-independent edge check between the crowd and the market

use crate::config::ArbitrageConfig;
use crate::stats::{clamp_probability, logistic};
use crate::types::{to_cents, BetSide};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArbitrageSignal {
    pub side: BetSide,
    /// calibrated YES - market YES
    pub yes_edge: f64,
    /// calibrated NO - market NO (always -yes_edge)
    pub no_edge: f64,
    /// Edge of the chosen side after the cutoff or logistic ramp
    pub effective_edge: f64,
    pub stake: Decimal,
    pub has_edge: bool,
}

/// Compare the calibrated YES probability with the market YES price
///
/// Classic mode zeroes any edge below the threshold. With smoothing the edge
/// is multiplied by `1 / (1 + exp(-k (edge - threshold)))` instead, and an
/// opportunity is reported as soon as the stake reaches one cent.
pub fn arbitrage_signal(
    probability: f64,
    market_probability: f64,
    bankroll: Decimal,
    config: &ArbitrageConfig,
) -> ArbitrageSignal {
    let p = clamp_probability(probability);
    let m = clamp_probability(market_probability);
    let yes_edge = p - m;
    let no_edge = (1.0 - p) - (1.0 - m);

    let (side, edge) = if yes_edge > 0.0 && yes_edge >= no_edge {
        (BetSide::Yes, yes_edge)
    } else if no_edge > 0.0 {
        (BetSide::No, no_edge)
    } else {
        (BetSide::None, 0.0)
    };

    let effective_edge = if side == BetSide::None {
        0.0
    } else if config.smoothing {
        edge * logistic(config.steepness * (edge - config.threshold))
    } else if edge >= config.threshold {
        edge
    } else {
        0.0
    };

    let bankroll = bankroll.to_f64().unwrap_or(0.0).max(0.0);
    let stake = to_cents(bankroll * effective_edge * config.kelly_fraction);
    let has_edge = if config.smoothing {
        stake > Decimal::ZERO
    } else {
        effective_edge > 0.0
    };

    ArbitrageSignal {
        side: if has_edge { side } else { BetSide::None },
        yes_edge,
        no_edge,
        effective_edge,
        stake,
        has_edge,
    }
}
