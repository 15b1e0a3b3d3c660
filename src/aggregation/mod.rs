//! Aggregation of raw trader weights into a consensus score
//!
//! Two interchangeable designs:
//! - **Gravity ratio**: `Σw / Σ|w|`. Simple; one huge weight can saturate it.
//! - **Temperature softmax**: softmax over normalized magnitudes, signs
//!   reapplied, then each trader's share capped (default 12%) and the excess
//!   redistributed so shares still sum to 1.

pub mod temperature;


pub use temperature::{
    heuristic_temperature, EntropyTargetSolver, FixedTemperature, HeuristicTemperature,
    TemperatureSolver,
};

use crate::config::{AggregationConfig, AggregationStrategy};
use crate::stats::EPSILON;
use crate::types::AggregationResult;

/// Aggregate with the configured strategy
///
/// `temperature` is only consulted by the softmax design; pass the value
/// produced by a [`TemperatureSolver`] or [`heuristic_temperature`].
pub fn aggregate(weights: &[f64], temperature: f64, config: &AggregationConfig) -> AggregationResult {
    match config.strategy {
        AggregationStrategy::GravityRatio => gravity_ratio(weights),
        AggregationStrategy::Softmax => softmax_aggregate(weights, temperature, config.influence_cap),
    }
}

/// Direct sum-of-absolute normalization
pub fn gravity_ratio(weights: &[f64]) -> AggregationResult {
    let weights = &clean(weights);
    if weights.is_empty() {
        return AggregationResult::neutral();
    }

    if let Some(result) = saturated(weights) {
        return result;
    }

    let total: f64 = weights.iter().map(|w| w.abs()).sum();
    let sum: f64 = weights.iter().sum();

    if total < EPSILON {
        return with_shares(0.0, uniform(weights.len()), None);
    }

    let shares = weights.iter().map(|w| w.abs() / total).collect();
    with_shares((sum / total).clamp(-1.0, 1.0), shares, None)
}

/// Temperature-scaled softmax with per-trader influence cap
///
/// Magnitudes are divided by the largest magnitude first, so the temperature
/// is independent of the dollar scale of the weights. Every trader enters the
/// softmax and the cap, zero weights included: they hold share but carry no
/// sign, which pulls the consensus toward neutral.
pub fn softmax_aggregate(weights: &[f64], temperature: f64, cap: f64) -> AggregationResult {
    let weights = &clean(weights);
    if weights.is_empty() {
        return AggregationResult {
            temperature: Some(temperature),
            ..AggregationResult::neutral()
        };
    }

    let shares = match saturated(weights) {
        Some(result) => cap_shares(&result.influence_shares, cap),
        None => cap_shares(&softmax(&normalized_magnitudes(weights), temperature), cap),
    };
    let consensus = signed_sum(weights, &shares);

    with_shares(consensus, shares, Some(temperature))
}

/// Magnitudes scaled into [0, 1] by the largest one
pub fn normalized_magnitudes(weights: &[f64]) -> Vec<f64> {
    let max = weights.iter().map(|w| w.abs()).fold(0.0_f64, f64::max);
    if max < EPSILON {
        return vec![0.0; weights.len()];
    }
    weights.iter().map(|w| w.abs() / max).collect()
}

/// Numerically stable softmax of `values / temperature`
pub fn softmax(values: &[f64], temperature: f64) -> Vec<f64> {
    if values.is_empty() {
        return Vec::new();
    }
    let t = temperature.max(EPSILON);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let exps: Vec<f64> = values.iter().map(|v| ((v - max) / t).exp()).collect();
    let total: f64 = exps.iter().sum();
    exps.iter().map(|e| e / total).collect()
}

/// Cap every share at `cap` and rescale the rest to keep the total at 1
///
/// When `n * cap < 1` no distribution can satisfy both constraints, so the
/// effective cap becomes `1 / n`.
pub fn cap_shares(shares: &[f64], cap: f64) -> Vec<f64> {
    let n = shares.len();
    if n == 0 {
        return Vec::new();
    }
    let cap = cap.max(1.0 / n as f64);

    let mut result = shares.to_vec();
    let mut capped = vec![false; n];

    // Each pass caps at least one more share, so this ends within n passes
    for _ in 0..=n {
        let fixed_mass: f64 = capped.iter().filter(|c| **c).count() as f64 * cap;
        let free_mass: f64 = shares
            .iter()
            .zip(&capped)
            .filter(|(_, c)| !**c)
            .map(|(s, _)| *s)
            .sum();
        let remaining = (1.0 - fixed_mass).max(0.0);

        let mut changed = false;
        for i in 0..n {
            if capped[i] {
                result[i] = cap;
                continue;
            }
            result[i] = if free_mass > EPSILON {
                shares[i] / free_mass * remaining
            } else {
                remaining / capped.iter().filter(|c| !**c).count() as f64
            };
            if result[i] > cap {
                capped[i] = true;
                changed = true;
            }
        }

        if !changed {
            break;
        }
    }

    for (i, share) in result.iter_mut().enumerate() {
        if capped[i] {
            *share = cap;
        }
    }
    result
}

fn signed_sum(weights: &[f64], shares: &[f64]) -> f64 {
    weights
        .iter()
        .zip(shares)
        .map(|(w, s)| sign_of(*w) * s)
        .sum::<f64>()
        .clamp(-1.0, 1.0)
}

/// -1, 0 or +1 (zero weight keeps no sign)
pub fn sign_of(weight: f64) -> f64 {
    if weight > 0.0 {
        1.0
    } else if weight < 0.0 {
        -1.0
    } else {
        0.0
    }
}

/// NaN weights (e.g. an overflowed weight times a zero multiplier) count as 0
fn clean(weights: &[f64]) -> Vec<f64> {
    weights
        .iter()
        .map(|w| if w.is_nan() { 0.0 } else { *w })
        .collect()
}

fn uniform(n: usize) -> Vec<f64> {
    vec![1.0 / n as f64; n]
}

fn with_shares(consensus: f64, shares: Vec<f64>, temperature: Option<f64>) -> AggregationResult {
    AggregationResult {
        consensus_score: consensus,
        raw_probability: (consensus + 1.0) / 2.0,
        influence_shares: shares,
        temperature,
    }
}

/// Limit behaviour when some weights overflowed to ±infinity
///
/// The infinite traders split all influence equally and everybody else
/// contributes nothing.
fn saturated(weights: &[f64]) -> Option<AggregationResult> {
    let infinite = weights.iter().filter(|w| w.is_infinite()).count();
    if infinite == 0 {
        return None;
    }

    tracing::warn!(
        infinite,
        total = weights.len(),
        "Trader weights overflowed; treating them as saturated"
    );

    let share = 1.0 / infinite as f64;
    let shares: Vec<f64> = weights
        .iter()
        .map(|w| if w.is_infinite() { share } else { 0.0 })
        .collect();
    let consensus = signed_sum(weights, &shares);
    Some(with_shares(consensus, shares, None))
}
