//! Numeric primitives shared by the consensus pipeline
//!
//! Everything here is pure and total: empty slices and degenerate inputs
//! return neutral values instead of NaN.


/// Denominator guard used across the engine
pub const EPSILON: f64 = 1e-9;

/// Scale factor turning a MAD into a normal-equivalent standard deviation
pub const MAD_NORMAL_SCALE: f64 = 1.4826;

/// z-score for a two-sided ~95% interval
pub const Z_95: f64 = 1.96;

/// Divide, returning 0 when the denominator is (nearly) zero
pub fn safe_div(numerator: f64, denominator: f64) -> f64 {
    if denominator.abs() < EPSILON {
        0.0
    } else {
        numerator / denominator
    }
}

/// Replace NaN / infinity with a fallback
pub fn finite_or(value: f64, fallback: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        fallback
    }
}

/// Clamp into [0, 1], mapping NaN to 0.5
pub fn clamp_probability(p: f64) -> f64 {
    if p.is_nan() {
        0.5
    } else {
        p.clamp(0.0, 1.0)
    }
}

/// Standard logistic function
pub fn logistic(x: f64) -> f64 {
    if x >= 0.0 {
        1.0 / (1.0 + (-x).exp())
    } else {
        let e = x.exp();
        e / (1.0 + e)
    }
}

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

fn sorted(values: &[f64]) -> Vec<f64> {
    let mut v: Vec<f64> = values.iter().copied().filter(|x| !x.is_nan()).collect();
    v.sort_by(|a, b| a.total_cmp(b));
    v
}

/// Quantile with linear interpolation between closest ranks (q in [0, 1])
pub fn quantile(values: &[f64], q: f64) -> f64 {
    let v = sorted(values);
    if v.is_empty() {
        return 0.0;
    }
    let q = q.clamp(0.0, 1.0);
    let pos = q * (v.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    if lo == hi {
        return v[lo];
    }
    let frac = pos - lo as f64;
    v[lo] + (v[hi] - v[lo]) * frac
}

pub fn median(values: &[f64]) -> f64 {
    quantile(values, 0.5)
}

/// Median absolute deviation from the median
pub fn median_abs_deviation(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let m = median(values);
    let deviations: Vec<f64> = values.iter().map(|x| (x - m).abs()).collect();
    median(&deviations)
}

/// MAD scaled to be comparable with a standard deviation, resistant to whales
pub fn robust_dispersion(values: &[f64]) -> f64 {
    MAD_NORMAL_SCALE * median_abs_deviation(values)
}

/// First four moments of a sample
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Moments {
    pub mean: f64,
    pub std_dev: f64,
    pub skewness: f64,
    /// Excess kurtosis (normal = 0)
    pub kurtosis: f64,
}

/// Population moments; skewness and kurtosis are 0 when the spread is 0
pub fn moments(values: &[f64]) -> Moments {
    let n = values.len() as f64;
    if values.is_empty() {
        return Moments { mean: 0.0, std_dev: 0.0, skewness: 0.0, kurtosis: 0.0 };
    }
    let mu = mean(values);
    let m2 = values.iter().map(|x| (x - mu).powi(2)).sum::<f64>() / n;
    let std_dev = m2.sqrt();
    if std_dev < EPSILON {
        return Moments { mean: mu, std_dev: 0.0, skewness: 0.0, kurtosis: 0.0 };
    }
    let m3 = values.iter().map(|x| (x - mu).powi(3)).sum::<f64>() / n;
    let m4 = values.iter().map(|x| (x - mu).powi(4)).sum::<f64>() / n;
    Moments {
        mean: mu,
        std_dev,
        skewness: m3 / std_dev.powi(3),
        kurtosis: m4 / (m2 * m2) - 3.0,
    }
}

/// Herfindahl-Hirschman index of non-negative amounts (sum of squared shares)
pub fn herfindahl(amounts: &[f64]) -> f64 {
    let total: f64 = amounts.iter().filter(|a| **a > 0.0).sum();
    if total < EPSILON {
        return 0.0;
    }
    amounts
        .iter()
        .filter(|a| **a > 0.0)
        .map(|a| (a / total).powi(2))
        .sum()
}

/// Wilson-score half-width for proportion `p` over `n` observations
///
/// Returns infinity for n = 0 so callers fall back to their maximum margin.
pub fn wilson_margin(p: f64, n: usize, z: f64) -> f64 {
    if n == 0 {
        return f64::INFINITY;
    }
    let p = clamp_probability(p);
    let n = n as f64;
    let z2 = z * z;
    z * (p * (1.0 - p) / n + z2 / (4.0 * n * n)).sqrt() / (1.0 + z2 / n)
}
