//! Computes statistically justified sample sizes and confidence intervals.
//!
//! Grounded on `n8n/core/sampling_engine.py`'s `SamplingEngine.calculate_sample_size`
//! / `_get_z_score`: the standard margin-of-error formula with finite
//! population correction, a lookup table for the common confidence levels,
//! and a rational-approximation fallback for anything else (no `scipy`
//! equivalent is worth a dependency for five lookup misses).

use crate::error::{DiffError, DiffResult};

/// `n = z(c)² p(1-p) / E²` with finite-population correction.
#[derive(Debug, Clone, Copy)]
pub struct SamplingPlanner {
    pub confidence_level: f64,
    pub margin_of_error: f64,
    pub min_sample_size: u64,
    pub max_sample_size: u64,
}

impl Default for SamplingPlanner {
    fn default() -> Self {
        Self {
            confidence_level: 0.95,
            margin_of_error: 0.01,
            min_sample_size: 1000,
            max_sample_size: 1_000_000,
        }
    }
}

/// The common confidence levels used in practice; anything else falls
/// through to `approximate_z_score`.
const Z_SCORE_TABLE: &[(f64, f64)] = &[
    (0.90, 1.645),
    (0.95, 1.96),
    (0.99, 2.576),
    (0.995, 2.807),
    (0.999, 3.291),
];

impl SamplingPlanner {
    pub fn new(confidence_level: f64, margin_of_error: f64) -> DiffResult<Self> {
        if !(0.0..1.0).contains(&confidence_level) {
            return Err(DiffError::validation("confidence_level must be in (0, 1)"));
        }
        if margin_of_error <= 0.0 || margin_of_error >= 1.0 {
            return Err(DiffError::validation("margin_of_error must be in (0, 1)"));
        }
        Ok(Self {
            confidence_level,
            margin_of_error,
            ..Default::default()
        })
    }

    fn z_score(&self) -> f64 {
        z_score_for(self.confidence_level)
    }

    /// Sample size for a population of `population_size`, clipped to
    /// `[min_sample_size, max_sample_size]` and rounded up. `expected_proportion`
    /// defaults to 0.5 (maximum variance) when unknown.
    pub fn sample_size(&self, population_size: u64, expected_proportion: f64) -> u64 {
        let z = self.z_score();
        let p = expected_proportion.clamp(0.0, 1.0);
        let e = self.margin_of_error;

        let n = (z * z * p * (1.0 - p)) / (e * e);
        let n = n.ceil();

        let adjusted = if population_size > 0 {
            let pop = population_size as f64;
            (n / (1.0 + (n - 1.0) / pop)).ceil()
        } else {
            n
        };

        let clipped = (adjusted as u64).clamp(self.min_sample_size, self.max_sample_size);
        clipped.min(population_size.max(clipped))
    }

    /// The per-proportion confidence interval half-width,
    /// `z(c) · sqrt(p̂(1-p̂)/n)`, for a sample of size `n` and observed
    /// proportion `p_hat`.
    pub fn confidence_interval(&self, n: u64, p_hat: f64) -> f64 {
        if n == 0 {
            return f64::INFINITY;
        }
        let p = p_hat.clamp(0.0, 1.0);
        self.z_score() * (p * (1.0 - p) / n as f64).sqrt()
    }
}

fn z_score_for(confidence_level: f64) -> f64 {
    for (level, z) in Z_SCORE_TABLE {
        if (level - confidence_level).abs() < 1e-9 {
            return *z;
        }
    }
    approximate_z_score(confidence_level)
}

/// Rational (Beasley-Springer-Moro-style) approximation of the inverse
/// normal CDF, used only for confidence levels outside the lookup table.
fn approximate_z_score(confidence_level: f64) -> f64 {
    let alpha = 1.0 - confidence_level;
    let p = 1.0 - alpha / 2.0;
    inverse_normal_cdf(p)
}

fn inverse_normal_cdf(p: f64) -> f64 {
    // Acklam's algorithm, sufficient precision (~1e-9) for sampling purposes.
    let a = [
        -3.969683028665376e+01,
        2.209460984245205e+02,
        -2.759285104469687e+02,
        1.383577518672690e+02,
        -3.066479806614716e+01,
        2.506628277459239e+00,
    ];
    let b = [
        -5.447609879822406e+01,
        1.615858368580409e+02,
        -1.556989798598866e+02,
        6.680131188771972e+01,
        -1.328068155288572e+01,
    ];
    let c = [
        -7.784894002430293e-03,
        -3.223964580411365e-01,
        -2.400758277161838e+00,
        -2.549732539343734e+00,
        4.374664141464968e+00,
        2.938163982698783e+00,
    ];
    let d = [
        7.784695709041462e-03,
        3.224671290700398e-01,
        2.445134137142996e+00,
        3.754408661907416e+00,
    ];

    let p_low = 0.02425;
    let p_high = 1.0 - p_low;

    if p < p_low {
        let q = (-2.0 * p.ln()).sqrt();
        (((((c[0] * q + c[1]) * q + c[2]) * q + c[3]) * q + c[4]) * q + c[5])
            / ((((d[0] * q + d[1]) * q + d[2]) * q + d[3]) * q + 1.0)
    } else if p <= p_high {
        let q = p - 0.5;
        let r = q * q;
        (((((a[0] * r + a[1]) * r + a[2]) * r + a[3]) * r + a[4]) * r + a[5]) * q
            / (((((b[0] * r + b[1]) * r + b[2]) * r + b[3]) * r + b[4]) * r + 1.0)
    } else {
        let q = (-2.0 * (1.0 - p).ln()).sqrt();
        -(((((c[0] * q + c[1]) * q + c[2]) * q + c[3]) * q + c[4]) * q + c[5])
            / ((((d[0] * q + d[1]) * q + d[2]) * q + d[3]) * q + 1.0)
    }
}
