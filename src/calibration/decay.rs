//! Aging of confidence for stale trader snapshots

use crate::config::{DecayConfig, DecayFormula};

/// Decay `confidence` by the age of the data
///
/// With [`DecayFormula::Exponential`] the value reaches e^-1 (about 36.8%)
/// after one `half_life_days`, not 50%; [`DecayFormula::HalfLife`] gives
/// true half-life behaviour.
pub fn decay_confidence(confidence: f64, days_elapsed: f64, config: &DecayConfig) -> f64 {
    if !config.enabled || config.half_life_days <= 0.0 || !days_elapsed.is_finite() {
        return confidence;
    }

    let days = days_elapsed.max(0.0);
    let rate = match config.formula {
        DecayFormula::Exponential => days / config.half_life_days,
        DecayFormula::HalfLife => std::f64::consts::LN_2 * days / config.half_life_days,
    };

    confidence * (-rate).exp()
}
