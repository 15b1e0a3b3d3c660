//! Two-sided hedge calculator
//!
//! When YES + NO costs less than $1, buying equal share counts of both sides
//! locks in `$1 - (yes + no)` per pair whatever the outcome.
//!
//! Example: YES @ 8¢ + NO @ 79¢ = 87¢ per pair, 13¢ profit at settlement.

use crate::error::{Error, Result};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HedgeResult {
    /// Cost of one YES + one NO share in dollars
    pub total_cost: Decimal,
    /// total_cost < $1
    pub arbitrage: bool,
    /// Shares bought on each side
    pub shares: Decimal,
    pub amount_yes: Decimal,
    pub amount_no: Decimal,
    /// Net result if YES resolves
    pub net_if_yes: Decimal,
    /// Net result if NO resolves
    pub net_if_no: Decimal,
    /// Guaranteed return on the budget (negative without arbitrage)
    pub roi: Decimal,
}

/// Split `budget` across both sides so each outcome pays the same
pub fn hedge(yes_price_cents: Decimal, no_price_cents: Decimal, budget: Decimal) -> Result<HedgeResult> {
    for (side, price) in [("YES", yes_price_cents), ("NO", no_price_cents)] {
        if price <= Decimal::ZERO || price >= dec!(100) {
            return Err(Error::InvalidInput(format!(
                "{} price must be between 0 and 100 cents, got {}",
                side, price
            )));
        }
    }
    if budget < Decimal::ZERO {
        return Err(Error::InvalidInput(format!("budget must be non-negative, got {}", budget)));
    }

    let yes = yes_price_cents / dec!(100);
    let no = no_price_cents / dec!(100);
    let total_cost = yes + no;

    let shares = budget / total_cost;
    let amount_yes = (shares * yes).round_dp(2);
    let amount_no = budget - amount_yes;

    // Each side pays $1 per share held
    let net_if_yes = (amount_yes / yes - budget).round_dp(2);
    let net_if_no = (amount_no / no - budget).round_dp(2);
    let roi = if budget > Decimal::ZERO {
        (Decimal::ONE - total_cost) / total_cost
    } else {
        Decimal::ZERO
    };

    Ok(HedgeResult {
        total_cost,
        arbitrage: total_cost < Decimal::ONE,
        shares: shares.round_dp(4),
        amount_yes,
        amount_no,
        net_if_yes,
        net_if_no,
        roi: roi.round_dp(4),
    })
}
