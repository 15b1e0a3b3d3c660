//! Core value types flowing through the consensus pipeline

use crate::error::Result;
use chrono::{DateTime, Utc};
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Which outcome a trader is positioned for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Yes,
    No,
}

impl Sentiment {
    /// Sign convention: yes = +1, no = -1
    pub fn sign(&self) -> f64 {
        match self {
            Sentiment::Yes => 1.0,
            Sentiment::No => -1.0,
        }
    }
}

/// One trader's position in the market
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trader {
    #[serde(default)]
    pub name: Option<String>,
    pub sentiment: Sentiment,
    /// "Smart score", nominally [-100, 100]
    pub conviction_score: f64,
    /// Dollar position, never negative after sanitizing
    pub position_size: f64,
    /// YES price (0-1) at which the position was opened
    #[serde(default)]
    pub entry_price: Option<f64>,
    #[serde(default)]
    pub realized_pnl: Option<f64>,
    #[serde(default)]
    pub unrealized_pnl: Option<f64>,
    /// Fraction (0-1) of outcome supply held
    #[serde(default)]
    pub supply_ownership: Option<f64>,
}

impl Trader {
    pub fn new(sentiment: Sentiment, conviction_score: f64, position_size: f64) -> Self {
        Self {
            name: None,
            sentiment,
            conviction_score,
            position_size,
            entry_price: None,
            realized_pnl: None,
            unrealized_pnl: None,
            supply_ownership: None,
        }
    }

    pub fn yes(conviction_score: f64, position_size: f64) -> Self {
        Self::new(Sentiment::Yes, conviction_score, position_size)
    }

    pub fn no(conviction_score: f64, position_size: f64) -> Self {
        Self::new(Sentiment::No, conviction_score, position_size)
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_entry_price(mut self, entry_price: f64) -> Self {
        self.entry_price = Some(entry_price);
        self
    }

    pub fn with_pnl(mut self, realized: f64, unrealized: f64) -> Self {
        self.realized_pnl = Some(realized);
        self.unrealized_pnl = Some(unrealized);
        self
    }

    pub fn with_supply_ownership(mut self, ownership: f64) -> Self {
        self.supply_ownership = Some(ownership);
        self
    }

    /// Repair values a live-editing UI can produce instead of rejecting them
    ///
    /// Scores are left unclamped: extreme scores are meaningful to the
    /// exponential weighting mode.
    pub fn sanitized(&self) -> Self {
        let unit = |v: Option<f64>| v.filter(|x| x.is_finite()).map(|x| x.clamp(0.0, 1.0));
        let finite = |v: Option<f64>| v.filter(|x| x.is_finite());

        Self {
            name: self.name.clone(),
            sentiment: self.sentiment,
            conviction_score: if self.conviction_score.is_finite() {
                self.conviction_score
            } else {
                0.0
            },
            position_size: if self.position_size.is_finite() && self.position_size > 0.0 {
                self.position_size
            } else {
                0.0
            },
            entry_price: unit(self.entry_price),
            realized_pnl: finite(self.realized_pnl),
            unrealized_pnl: finite(self.unrealized_pnl),
            supply_ownership: unit(self.supply_ownership),
        }
    }

    /// Ranking key for top-N truncation: |score * ln(position + 1)|
    pub fn selection_score(&self) -> f64 {
        (self.conviction_score * (self.position_size.max(0.0) + 1.0).ln()).abs()
    }

    /// Combined realized + unrealized PnL, if either is known
    pub fn total_pnl(&self) -> Option<f64> {
        match (self.realized_pnl, self.unrealized_pnl) {
            (None, None) => None,
            (r, u) => Some(r.unwrap_or(0.0) + u.unwrap_or(0.0)),
        }
    }
}

/// Parse a JSON array of traders
pub fn traders_from_json(json: &str) -> Result<Vec<Trader>> {
    Ok(serde_json::from_str(json)?)
}

/// Read a JSON array of traders from disk
pub fn load_traders(path: impl AsRef<Path>) -> Result<Vec<Trader>> {
    let raw = std::fs::read_to_string(path)?;
    traders_from_json(&raw)
}

/// Trader with the derived values of one evaluation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeightedTrader {
    pub trader: Trader,
    /// Signed influence before normalization
    pub raw_weight: f64,
    pub selection_score: f64,
    /// Non-negative normalized share, sums to 1 across the pool
    pub influence_share: f64,
    /// Share with the trader's sign reapplied
    pub signed_influence: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregationResult {
    /// Signed "gravity" consensus in [-1, 1]
    pub consensus_score: f64,
    /// (consensus_score + 1) / 2
    pub raw_probability: f64,
    pub influence_shares: Vec<f64>,
    /// Softmax temperature when the softmax design was used
    pub temperature: Option<f64>,
}

impl AggregationResult {
    pub fn neutral() -> Self {
        Self {
            consensus_score: 0.0,
            raw_probability: 0.5,
            influence_shares: Vec::new(),
            temperature: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProbabilityRange {
    pub lower: f64,
    pub upper: f64,
}

impl ProbabilityRange {
    pub fn width(&self) -> f64 {
        self.upper - self.lower
    }

    pub fn contains(&self, p: f64) -> bool {
        self.lower <= p && p <= self.upper
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalibrationResult {
    pub confidence_factor: f64,
    pub calibrated_probability: f64,
    pub probability_range: ProbabilityRange,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BetSide {
    Yes,
    No,
    None,
}

impl fmt::Display for BetSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BetSide::Yes => write!(f, "YES"),
            BetSide::No => write!(f, "NO"),
            BetSide::None => write!(f, "NONE"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfidenceTier {
    None,
    Low,
    Medium,
    High,
}

impl fmt::Display for ConfidenceTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ConfidenceTier::High => "high",
            ConfidenceTier::Medium => "medium",
            ConfidenceTier::Low => "low",
            ConfidenceTier::None => "none",
        };
        write!(f, "{}", s)
    }
}

/// Output of the confidence-tiered Kelly policy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BettingRecommendation {
    pub bet_side: BetSide,
    /// Relative edge of the chosen side; negative when the side is NO
    pub edge: f64,
    /// Full Kelly fraction, uncapped
    pub kelly_fraction: f64,
    /// Fractional Kelly (kelly * multiplier)
    pub safe_fraction: f64,
    pub confidence_tier: ConfidenceTier,
    /// Maximum fraction of bankroll for this tier
    pub tier_cap: f64,
    pub recommended_bet_size: Decimal,
    pub should_bet: bool,
    pub reasoning: String,
}

/// Market parameters supplied alongside the trader list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketInput {
    /// YES price in cents / percent (0-100)
    pub market_price: f64,
    pub bankroll: Decimal,
    /// Age of the trader snapshot, for confidence decay
    #[serde(default)]
    pub data_age_days: Option<f64>,
}

impl MarketInput {
    pub fn new(market_price: f64, bankroll: Decimal) -> Self {
        Self {
            market_price,
            bankroll,
            data_age_days: None,
        }
    }

    /// Build an input whose data age is the time between two instants
    pub fn observed_at(
        market_price: f64,
        bankroll: Decimal,
        observed: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Self {
        let age = (now - observed).num_seconds() as f64 / 86_400.0;
        Self {
            market_price,
            bankroll,
            data_age_days: Some(age.max(0.0)),
        }
    }

    /// Market-implied YES probability in [0, 1]
    pub fn implied_probability(&self) -> f64 {
        if self.market_price.is_finite() {
            (self.market_price / 100.0).clamp(0.0, 1.0)
        } else {
            0.5
        }
    }

    /// Bankroll as f64, never negative
    pub fn bankroll_f64(&self) -> f64 {
        self.bankroll.to_f64().unwrap_or(0.0).max(0.0)
    }
}

/// Convert a dollar amount to Decimal cents, never rounding a stake up
///
/// Float noise below a micro-dollar is removed first; non-finite becomes 0.
pub fn to_cents(amount: f64) -> Decimal {
    Decimal::from_f64(amount)
        .map(|d| d.round_dp(6).round_dp_with_strategy(2, RoundingStrategy::ToZero))
        .unwrap_or(Decimal::ZERO)
}
