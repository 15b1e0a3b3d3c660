//! Consensus engine
//!
//! Runs the full pipeline for one market snapshot:
//!
//! ```text
//! sanitize → top-N → weight → temperature → aggregate → confidence
//!          → decay → calibrate → uncertainty → Kelly → arbitrage
//! ```
//!
//! Every stage is a pure function of the trader list, the market input and
//! the engine's config, so the same inputs always give the same report.


use crate::aggregation::{aggregate, heuristic_temperature, sign_of, TemperatureSolver};
use crate::betting::{arbitrage_signal, kelly_recommendation, ArbitrageSignal};
use crate::calibration::{
    calibrate_probability, confidence_factor, decay_confidence, probability_range,
    signal_breakdown, ConfidenceSignals,
};
use crate::config::{ActiveConfig, AggregationStrategy, EngineConfig, Mode};
use crate::error::{Error, Result};
use crate::types::{
    AggregationResult, BettingRecommendation, CalibrationResult, MarketInput, Trader,
    WeightedTrader,
};
use crate::weighting::{raw_weight, select_top};
use serde::{Deserialize, Serialize};

/// Everything one evaluation produced
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsensusReport {
    pub mode: Mode,
    /// Traders supplied
    pub traders_total: usize,
    /// Traders left after top-N truncation
    pub traders_considered: usize,
    pub weighted: Vec<WeightedTrader>,
    pub aggregation: AggregationResult,
    pub calibration: CalibrationResult,
    pub signals: ConfidenceSignals,
    /// Confidence was reduced for stale data
    pub decayed: bool,
    pub betting: BettingRecommendation,
    pub arbitrage: ArbitrageSignal,
}

/// Pool after sanitizing, truncation and weighting
struct Prepared {
    traders_total: usize,
    traders: Vec<Trader>,
    weights: Vec<f64>,
}

/// Consensus engine bound to one immutable config
pub struct ConsensusEngine {
    config: EngineConfig,
}

impl ConsensusEngine {
    pub fn new(config: EngineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Engine over the current snapshot of a shared config
    pub fn from_active(active: &ActiveConfig) -> Self {
        Self {
            config: (*active.snapshot()).clone(),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Evaluate with the heuristic softmax temperature
    pub fn evaluate(&self, traders: &[Trader], market: &MarketInput) -> ConsensusReport {
        let prepared = self.prepare(traders, market);
        let temperature = match self.config.aggregation.strategy {
            AggregationStrategy::Softmax => {
                heuristic_temperature(&prepared.weights, &self.config.aggregation.temperature)
            }
            AggregationStrategy::GravityRatio => self.config.aggregation.temperature.base,
        };
        self.finish(prepared, market, temperature)
    }

    /// Evaluate with a caller-supplied temperature solver
    ///
    /// The solver is only consulted by the softmax design.
    pub async fn evaluate_with_solver(
        &self,
        traders: &[Trader],
        market: &MarketInput,
        solver: &dyn TemperatureSolver,
    ) -> Result<ConsensusReport> {
        let prepared = self.prepare(traders, market);
        let temperature = match self.config.aggregation.strategy {
            AggregationStrategy::Softmax => {
                let t = solver
                    .solve(&prepared.weights, &self.config.aggregation.temperature)
                    .await?;
                if !(t.is_finite() && t > 0.0) {
                    return Err(Error::Solver(format!(
                        "{} solver returned invalid temperature {}",
                        solver.name(),
                        t
                    )));
                }
                tracing::debug!(solver = solver.name(), temperature = t, "Temperature solved");
                t
            }
            AggregationStrategy::GravityRatio => self.config.aggregation.temperature.base,
        };
        Ok(self.finish(prepared, market, temperature))
    }

    fn prepare(&self, traders: &[Trader], market: &MarketInput) -> Prepared {
        let sanitized: Vec<Trader> = traders.iter().map(Trader::sanitized).collect();
        let selected = select_top(&sanitized, self.config.aggregation.top_n);

        let m = market.implied_probability();
        let weights: Vec<f64> = selected
            .iter()
            .map(|t| raw_weight(t, m, &self.config.weighting))
            .collect();

        tracing::debug!(
            total = traders.len(),
            considered = selected.len(),
            "Trader pool weighted"
        );

        Prepared {
            traders_total: traders.len(),
            traders: selected,
            weights,
        }
    }

    fn finish(&self, prepared: Prepared, market: &MarketInput, temperature: f64) -> ConsensusReport {
        let cfg = &self.config;
        let Prepared {
            traders_total,
            traders,
            weights,
        } = prepared;

        let aggregation = aggregate(&weights, temperature, &cfg.aggregation);
        tracing::debug!(
            consensus = aggregation.consensus_score,
            raw_probability = aggregation.raw_probability,
            temperature = ?aggregation.temperature,
            "Aggregated"
        );

        let weighted: Vec<WeightedTrader> = traders
            .iter()
            .zip(&weights)
            .enumerate()
            .map(|(i, (trader, &w))| {
                let share = aggregation.influence_shares.get(i).copied().unwrap_or(0.0);
                WeightedTrader {
                    trader: trader.clone(),
                    raw_weight: w,
                    selection_score: trader.selection_score(),
                    influence_share: share,
                    signed_influence: share * sign_of(w),
                }
            })
            .collect();

        // No capital behind the pool means no information
        let capital: f64 = traders.iter().map(|t| t.position_size).sum();
        let signals = signal_breakdown(&traders, &cfg.confidence);
        let mut confidence = if capital > 0.0 {
            confidence_factor(&traders, &cfg.confidence)
        } else {
            0.0
        };

        let mut decayed = false;
        if let Some(days) = market.data_age_days {
            if cfg.decay.enabled {
                let before = confidence;
                confidence = decay_confidence(confidence, days, &cfg.decay);
                decayed = confidence < before;
            }
        }
        tracing::debug!(confidence, decayed, "Confidence estimated");

        let calibrated = calibrate_probability(aggregation.raw_probability, confidence);
        let range = probability_range(calibrated, &traders, &cfg.uncertainty);
        let calibration = CalibrationResult {
            confidence_factor: confidence,
            calibrated_probability: calibrated,
            probability_range: range,
        };
        tracing::debug!(
            calibrated,
            lower = range.lower,
            upper = range.upper,
            "Calibrated"
        );

        let m = market.implied_probability();
        let bankroll = market.bankroll;
        let betting = kelly_recommendation(calibrated, m, bankroll, confidence, &cfg.kelly);
        let arbitrage = arbitrage_signal(calibrated, m, bankroll, &cfg.arbitrage);

        ConsensusReport {
            mode: cfg.mode,
            traders_total,
            traders_considered: traders.len(),
            weighted,
            aggregation,
            calibration,
            signals,
            decayed,
            betting,
            arbitrage,
        }
    }
}
