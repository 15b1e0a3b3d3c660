//! Probability intervals around the calibrated estimate
//!
//! Both bands always contain the point estimate, even when it sits outside
//! the clamping bounds.

use crate::config::{UncertaintyConfig, UncertaintyStrategy};
use crate::stats::{clamp_probability, moments, wilson_margin};
use crate::types::{ProbabilityRange, Trader};

/// Band for `p` with the configured estimator
pub fn probability_range(p: f64, traders: &[Trader], config: &UncertaintyConfig) -> ProbabilityRange {
    match config.strategy {
        UncertaintyStrategy::Wilson => wilson_range(p, traders.len(), config),
        UncertaintyStrategy::Moments => {
            let scores: Vec<f64> = traders.iter().map(|t| t.conviction_score).collect();
            moment_range(p, &scores, config)
        }
    }
}

/// Wilson-score band, margin capped and bounds clamped to [floor, ceiling]
pub fn wilson_range(p: f64, n: usize, config: &UncertaintyConfig) -> ProbabilityRange {
    let p = clamp_probability(p);
    let margin = wilson_margin(p, n, config.z).min(config.max_margin);
    contain(p, p - margin, p + margin, config.floor, config.ceiling)
}

/// Approximate band widened or narrowed by the skew and excess kurtosis of
/// the conviction scores
///
/// This is a Cornish-Fisher-flavoured heuristic, not a rigorous asymmetric
/// interval. Scores in [-100, 100] map to probability units by `/ 200`, and
/// the spread shrinks with `sqrt(n)`. Pools of fewer than two traders get the
/// maximum margin; invalid corrections fall back to a symmetric band.
pub fn moment_range(p: f64, scores: &[f64], config: &UncertaintyConfig) -> ProbabilityRange {
    let p = clamp_probability(p);
    if scores.len() < 2 {
        return contain(p, p - config.max_margin, p + config.max_margin, 0.0, 1.0);
    }

    let m = moments(scores);
    let sd = (m.std_dev / 200.0) / (scores.len() as f64).sqrt();
    let z = config.z;
    let skew_term = (z * z - 1.0) * m.skewness / 6.0;
    let kurt_term = (z * z * z - 3.0 * z) * m.kurtosis / 24.0;

    let upper_width = sd * (z + skew_term + kurt_term);
    let lower_width = sd * (z - skew_term + kurt_term);

    let valid = |w: f64| w.is_finite() && w >= 0.0;
    let (lower_width, upper_width) = if valid(lower_width) && valid(upper_width) {
        (lower_width, upper_width)
    } else {
        tracing::debug!(
            skewness = m.skewness,
            kurtosis = m.kurtosis,
            "Moment correction invalid, using symmetric band"
        );
        (sd * z, sd * z)
    };

    contain(
        p,
        p - lower_width.min(config.max_margin),
        p + upper_width.min(config.max_margin),
        0.0,
        1.0,
    )
}

fn contain(p: f64, lower: f64, upper: f64, floor: f64, ceiling: f64) -> ProbabilityRange {
    ProbabilityRange {
        lower: lower.max(floor).min(p),
        upper: upper.min(ceiling).max(p),
    }
}
