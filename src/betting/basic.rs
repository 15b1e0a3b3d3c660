//! Standalone betting calculator
//!
//! Quarter-Kelly on a gravity score with a flat 5% bankroll cap and no
//! confidence tiers. Extreme prices that the crowd strongly disputes get their
//! edge halved: thin, lopsided markets are where the estimate is least
//! trustworthy.

use crate::stats::{clamp_probability, safe_div};
use crate::types::{to_cents, BetSide};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BasicKellyInput {
    /// YES price in cents (0-100)
    pub market_price_cents: f64,
    /// Consensus score in [-1, 1]
    pub gravity_score: f64,
    pub bankroll: Decimal,
    pub bet_type: BetSide,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BasicKellyConfig {
    pub kelly_multiplier: f64,
    pub max_bankroll_fraction: f64,
    pub min_edge: f64,
    pub min_bet: Decimal,
    /// Prices below this (or above 1 - this) count as extreme
    pub extreme_price: f64,
    /// Disagreement with the market that triggers the volatility discount
    pub volatility_gap: f64,
}

impl Default for BasicKellyConfig {
    fn default() -> Self {
        Self {
            kelly_multiplier: 0.25,
            max_bankroll_fraction: 0.05,
            min_edge: 0.01,
            min_bet: Decimal::ONE,
            extreme_price: 0.15,
            volatility_gap: 0.30,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BasicKellyResult {
    /// YES probability implied by the gravity score
    pub probability: f64,
    pub market_price: f64,
    /// Net payout per dollar staked on the chosen side
    pub payout_ratio: f64,
    /// Expected profit per dollar staked, after any volatility discount
    pub edge: f64,
    pub kelly_fraction: f64,
    pub high_volatility: bool,
    pub final_bet: Decimal,
    pub reasoning: String,
}

/// YES probability for a gravity score: (g + 1) / 2
pub fn gravity_probability(gravity_score: f64) -> f64 {
    let g = if gravity_score.is_nan() { 0.0 } else { gravity_score.clamp(-1.0, 1.0) };
    (g + 1.0) / 2.0
}

pub fn basic_kelly(input: &BasicKellyInput, config: &BasicKellyConfig) -> BasicKellyResult {
    let p = gravity_probability(input.gravity_score);
    let m = clamp_probability(input.market_price_cents / 100.0);
    let bankroll = input.bankroll.to_f64().unwrap_or(0.0).max(0.0);

    let (price, p_win) = match input.bet_type {
        BetSide::Yes => (m, p),
        BetSide::No => (1.0 - m, 1.0 - p),
        BetSide::None => {
            return BasicKellyResult {
                probability: p,
                market_price: m,
                payout_ratio: 0.0,
                edge: 0.0,
                kelly_fraction: 0.0,
                high_volatility: false,
                final_bet: Decimal::ZERO,
                reasoning: "No side selected".to_string(),
            };
        }
    };

    let payout_ratio = safe_div(1.0 - price, price);
    let mut edge = p_win * payout_ratio - (1.0 - p_win);

    let extreme = m < config.extreme_price || m > 1.0 - config.extreme_price;
    let high_volatility = extreme && (p - m).abs() >= config.volatility_gap;
    if high_volatility && edge > 0.0 {
        edge *= 0.5;
    }

    let kelly = safe_div(edge, payout_ratio).max(0.0);
    let raw_bet = (kelly * config.kelly_multiplier * bankroll).min(bankroll * config.max_bankroll_fraction);
    let mut final_bet = to_cents(raw_bet);

    let reasoning = if edge < config.min_edge {
        final_bet = Decimal::ZERO;
        format!(
            "Edge {:.2}% on {} is below the {:.2}% minimum",
            edge * 100.0,
            input.bet_type,
            config.min_edge * 100.0
        )
    } else if final_bet < config.min_bet {
        final_bet = Decimal::ZERO;
        format!("Stake {} is below the {} minimum bet", to_cents(raw_bet), config.min_bet)
    } else if high_volatility {
        format!(
            "Bet {} (edge halved: extreme price {:.0}% disputed by {:.0} points)",
            input.bet_type,
            m * 100.0,
            (p - m).abs() * 100.0
        )
    } else {
        format!("Bet {} with {:.2}% edge", input.bet_type, edge * 100.0)
    };

    BasicKellyResult {
        probability: p,
        market_price: m,
        payout_ratio,
        edge,
        kelly_fraction: kelly,
        high_volatility,
        final_bet,
        reasoning,
    }
}
