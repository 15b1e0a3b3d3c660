//! Softmax temperature selection
//!
//! Larger or more dispersed pools get a higher temperature (flatter shares);
//! small pools get a sharper distribution since each trader says more.

use super::{normalized_magnitudes, softmax};
use crate::config::TemperatureConfig;
use crate::error::{Error, Result};
use crate::stats::{robust_dispersion, EPSILON};
use async_trait::async_trait;

/// Heuristic temperature for a set of raw weights
///
/// `T = clamp(base + size_w * log2(max(2, N)) + disp_w * robust_dispersion^0.8)`
/// where N is the full pool size and the dispersion is measured on the
/// normalized magnitudes, zero weights included.
pub fn heuristic_temperature(weights: &[f64], config: &TemperatureConfig) -> f64 {
    let magnitudes = finite_magnitudes(weights);
    let n = weights.len().max(2) as f64;
    let dispersion = robust_dispersion(&magnitudes);

    let t = config.base + config.size_weight * n.log2() + config.dispersion_weight * dispersion.powf(0.8);
    if t.is_finite() {
        t.clamp(config.min, config.max)
    } else {
        config.max
    }
}

fn finite_magnitudes(weights: &[f64]) -> Vec<f64> {
    let finite: Vec<f64> = weights.iter().copied().filter(|w| w.is_finite()).collect();
    normalized_magnitudes(&finite)
}

/// Pluggable temperature choice for the softmax aggregation
#[async_trait]
pub trait TemperatureSolver: Send + Sync {
    /// Pick a temperature for these raw weights
    async fn solve(&self, weights: &[f64], config: &TemperatureConfig) -> Result<f64>;

    /// Solver name for logging
    fn name(&self) -> &str;
}

/// The default heuristic, wrapped as a solver
#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicTemperature;

#[async_trait]
impl TemperatureSolver for HeuristicTemperature {
    async fn solve(&self, weights: &[f64], config: &TemperatureConfig) -> Result<f64> {
        Ok(heuristic_temperature(weights, config))
    }

    fn name(&self) -> &str {
        "heuristic"
    }
}

/// Always returns the same temperature
#[derive(Debug, Clone, Copy)]
pub struct FixedTemperature(pub f64);

#[async_trait]
impl TemperatureSolver for FixedTemperature {
    async fn solve(&self, _weights: &[f64], _config: &TemperatureConfig) -> Result<f64> {
        if self.0.is_finite() && self.0 > 0.0 {
            Ok(self.0)
        } else {
            Err(Error::Solver(format!("fixed temperature must be positive, got {}", self.0)))
        }
    }

    fn name(&self) -> &str {
        "fixed"
    }
}

/// Bisection search for the temperature whose share distribution reaches a
/// target normalized entropy (0 = one trader holds everything, 1 = uniform)
#[derive(Debug, Clone, Copy)]
pub struct EntropyTargetSolver {
    pub target_entropy: f64,
    pub max_iterations: usize,
    pub tolerance: f64,
}

impl EntropyTargetSolver {
    pub fn new(target_entropy: f64) -> Self {
        Self {
            target_entropy,
            max_iterations: 60,
            tolerance: 1e-6,
        }
    }
}

impl Default for EntropyTargetSolver {
    fn default() -> Self {
        Self::new(0.85)
    }
}

/// Shannon entropy of a distribution divided by ln(n)
pub fn normalized_entropy(shares: &[f64]) -> f64 {
    if shares.len() < 2 {
        return 1.0;
    }
    let h: f64 = shares
        .iter()
        .filter(|s| **s > 0.0)
        .map(|s| -s * s.ln())
        .sum();
    h / (shares.len() as f64).ln()
}

#[async_trait]
impl TemperatureSolver for EntropyTargetSolver {
    async fn solve(&self, weights: &[f64], config: &TemperatureConfig) -> Result<f64> {
        if !(self.target_entropy > 0.0 && self.target_entropy < 1.0) {
            return Err(Error::Solver(format!(
                "target entropy must be in (0, 1), got {}",
                self.target_entropy
            )));
        }

        let magnitudes = finite_magnitudes(weights);
        let spread = magnitudes.iter().copied().fold(0.0_f64, f64::max)
            - magnitudes.iter().copied().fold(f64::INFINITY, f64::min);
        // Nothing to tune: every temperature gives the same shares
        if magnitudes.len() < 2 || spread < EPSILON {
            return Ok(heuristic_temperature(weights, config));
        }

        let entropy_at = |t: f64| normalized_entropy(&softmax(&magnitudes, t));

        let (mut lo, mut hi) = (config.min.ln(), config.max.ln());
        if entropy_at(config.min) >= self.target_entropy {
            return Ok(config.min);
        }
        if entropy_at(config.max) <= self.target_entropy {
            return Ok(config.max);
        }

        for _ in 0..self.max_iterations {
            let mid = 0.5 * (lo + hi);
            let h = entropy_at(mid.exp());
            if (h - self.target_entropy).abs() < self.tolerance {
                return Ok(mid.exp());
            }
            if h < self.target_entropy {
                lo = mid;
            } else {
                hi = mid;
            }
        }

        let t = (0.5 * (lo + hi)).exp();
        tracing::debug!(temperature = t, "Entropy solver hit iteration limit");
        Ok(t)
    }

    fn name(&self) -> &str {
        "entropy_target"
    }
}
