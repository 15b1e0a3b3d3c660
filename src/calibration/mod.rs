//! Confidence estimation and probability calibration
//!
//! The confidence factor is an interpolation weight between trusting the
//! crowd completely (1) and assuming no information at all (0):
//!
//! ```text
//! calibrated = 0.5 + (raw - 0.5) * confidence
//! ```

pub mod decay;
pub mod uncertainty;


pub use decay::decay_confidence;
pub use uncertainty::{moment_range, probability_range, wilson_range};

use crate::config::{ConfidenceConfig, ConfidenceStrategy};
use crate::stats::{clamp_probability, herfindahl, mean, safe_div};
use crate::types::{Sentiment, Trader};
use serde::{Deserialize, Serialize};

/// The three independent [0, 1] signals of the multi-signal design
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceSignals {
    /// Imbalance of "smart money" capital between YES and NO
    pub skew: f64,
    /// Average absolute conviction score / 100
    pub score_quality: f64,
    /// Herfindahl index of positions * 10
    pub concentration: f64,
}

/// Compute the individual confidence signals for a pool
pub fn signal_breakdown(traders: &[Trader], config: &ConfidenceConfig) -> ConfidenceSignals {
    if traders.is_empty() {
        return ConfidenceSignals::default();
    }

    let (smart_yes, smart_no) = traders
        .iter()
        .filter(|t| t.conviction_score > config.smart_threshold)
        .fold((0.0, 0.0), |(yes, no), t| match t.sentiment {
            Sentiment::Yes => (yes + t.position_size, no),
            Sentiment::No => (yes, no + t.position_size),
        });
    let skew = safe_div((smart_yes - smart_no).abs(), smart_yes + smart_no).min(1.0);

    let score_quality = (average_abs_score(traders) / 100.0).min(1.0);

    let positions: Vec<f64> = traders.iter().map(|t| t.position_size).collect();
    let concentration = (herfindahl(&positions) * 10.0).min(1.0);

    ConfidenceSignals {
        skew,
        score_quality,
        concentration,
    }
}

fn average_abs_score(traders: &[Trader]) -> f64 {
    let scores: Vec<f64> = traders.iter().map(|t| t.conviction_score.abs()).collect();
    mean(&scores)
}

/// Confidence factor in [0, 1]; degenerate inputs give 0
pub fn confidence_factor(traders: &[Trader], config: &ConfidenceConfig) -> f64 {
    let confidence = match config.strategy {
        ConfidenceStrategy::MultiSignal => {
            let signals = signal_breakdown(traders, config);
            combine_signals(&signals, config)
        }
        ConfidenceStrategy::Bayesian => bayesian_confidence(traders, config),
    };

    if confidence.is_nan() {
        0.0
    } else {
        confidence.clamp(0.0, 1.0)
    }
}

/// Weighted sum of the signals, optionally power-scaled
pub fn combine_signals(signals: &ConfidenceSignals, config: &ConfidenceConfig) -> f64 {
    let combined = config.skew_weight * signals.skew
        + config.score_weight * signals.score_quality
        + config.concentration_weight * signals.concentration;
    let combined = combined.clamp(0.0, 1.0);

    match config.power {
        Some(power) => combined.powf(power),
        None => combined,
    }
}

/// Bayesian pseudo-count blend of the observed average score toward a prior
///
/// `(n * avg + m * prior) / (n + m)`, with the average score mapped to [0, 1].
pub fn bayesian_confidence(traders: &[Trader], config: &ConfidenceConfig) -> f64 {
    let n = traders.len() as f64;
    let m = config.prior_strength;
    if n + m <= 0.0 {
        return 0.0;
    }
    let observed = (average_abs_score(traders) / 100.0).clamp(0.0, 1.0);
    (n * observed + m * config.prior_probability) / (n + m)
}

/// Pull the raw probability toward 0.5 by `1 - confidence`
pub fn calibrate_probability(raw_probability: f64, confidence: f64) -> f64 {
    let raw = clamp_probability(raw_probability);
    let confidence = if confidence.is_nan() {
        0.0
    } else {
        confidence.clamp(0.0, 1.0)
    };
    clamp_probability(0.5 + (raw - 0.5) * confidence)
}
