//! Per-leaf sufficient statistics: class-conditional observers per dimension.
//!
//! Each leaf keeps one [`Observer`] per projected dimension. Numeric
//! dimensions are summarized per class by running Gaussian statistics;
//! categorical dimensions by per-value counts. Observers answer two
//! questions: what is the information gain of splitting on this dimension,
//! and how likely is a value under each class (for naive-Bayes leaves).

use serde::{Deserialize, Serialize};

/// Variance floor for Gaussian likelihoods.
const SIGMA_FLOOR: f64 = 1e-3;

/// Likelihood for classes with no observations on a dimension.
const LIKELIHOOD_FLOOR: f64 = 1e-9;

// ============================================================================
// Error function
// ============================================================================

/// Abramowitz & Stegun 7.1.26 rational approximation, |error| < 1.5e-7.
fn erf(x: f64) -> f64 {
    let sign = x.signum();
    let x = x.abs();
    let t = 1.0 / (1.0 + 0.327_591_1 * x);
    let poly = t
        * (0.254_829_592
            + t * (-0.284_496_736 + t * (1.421_413_741 + t * (-1.453_152_027 + t * 1.061_405_429))));
    sign * (1.0 - poly * (-x * x).exp())
}

// ============================================================================
// GaussianStats
// ============================================================================

/// Running Gaussian summary of one class on one numeric dimension.
///
/// Uses Welford's algorithm for the mean and M2 accumulator, plus the
/// observed range for numeric split candidates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GaussianStats {
    count: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl Default for GaussianStats {
    fn default() -> Self {
        Self {
            count: 0,
            mean: 0.0,
            m2: 0.0,
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
        }
    }
}

impl GaussianStats {
    /// Fold one observation into the summary.
    pub fn observe(&mut self, value: f64) {
        self.count += 1;
        let delta = value - self.mean;
        self.mean += delta / self.count as f64;
        self.m2 += delta * (value - self.mean);
        self.min = self.min.min(value);
        self.max = self.max.max(value);
    }

    /// Number of observations.
    #[inline]
    pub fn count(&self) -> u64 {
        self.count
    }

    /// Sample mean (0 before any observation).
    #[inline]
    pub fn mean(&self) -> f64 {
        self.mean
    }

    /// Unbiased sample variance (0 with fewer than two observations).
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / (self.count - 1) as f64
        }
    }

    /// Smallest observed value.
    #[inline]
    pub fn min(&self) -> f64 {
        self.min
    }

    /// Largest observed value.
    #[inline]
    pub fn max(&self) -> f64 {
        self.max
    }

    /// Fraction of this class's mass lying at or below `t`.
    ///
    /// Degenerates to a step function at the mean when the variance is zero.
    pub fn cdf(&self, t: f64) -> f64 {
        if self.count == 0 {
            return 0.0;
        }
        let std = self.variance().sqrt();
        if std == 0.0 {
            return if t >= self.mean { 1.0 } else { 0.0 };
        }
        0.5 * (1.0 + erf((t - self.mean) / (std * std::f64::consts::SQRT_2)))
    }

    /// Log-density of `value` under the fitted Gaussian, variance-floored.
    pub fn log_pdf(&self, value: f64) -> f64 {
        if self.count == 0 {
            return LIKELIHOOD_FLOOR.ln();
        }
        let sigma = self.variance().sqrt().max(SIGMA_FLOOR);
        let z = (value - self.mean) / sigma;
        -0.5 * (2.0 * std::f64::consts::PI * sigma * sigma).ln() - 0.5 * z * z
    }
}

// ============================================================================
// Observer
// ============================================================================

/// Class-conditional statistics for one projected dimension.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Observer {
    /// Numeric dimension: one Gaussian summary per class.
    Numeric { per_class: Vec<GaussianStats> },
    /// Categorical dimension: flat `[class][value]` counts.
    Categorical { cardinality: u32, counts: Vec<u64> },
}

impl Observer {
    /// Fresh numeric observer for `num_classes` classes.
    pub fn numeric(num_classes: usize) -> Self {
        Observer::Numeric {
            per_class: vec![GaussianStats::default(); num_classes],
        }
    }

    /// Fresh categorical observer for `num_classes` classes over
    /// `cardinality` values.
    pub fn categorical(num_classes: usize, cardinality: u32) -> Self {
        Observer::Categorical {
            cardinality,
            counts: vec![0; num_classes * cardinality as usize],
        }
    }

    /// Fold one (value, label) observation into the statistics.
    pub fn observe(&mut self, value: f32, label: usize) {
        match self {
            Observer::Numeric { per_class } => per_class[label].observe(value as f64),
            Observer::Categorical { cardinality, counts } => {
                let v = (value as usize).min(*cardinality as usize - 1);
                counts[label * *cardinality as usize + v] += 1;
            }
        }
    }

    /// Best binary numeric split on this dimension: `(gain, threshold)`.
    ///
    /// Evaluates `split_points` candidate thresholds evenly spaced across the
    /// observed range, estimating per-class mass on each side from the
    /// Gaussian summaries. Returns `None` for categorical observers or when
    /// no usable range has been observed.
    pub fn best_numeric_split(&self, split_points: u32) -> Option<(f64, f32)> {
        let per_class = match self {
            Observer::Numeric { per_class } => per_class,
            Observer::Categorical { .. } => return None,
        };

        let mut lo = f64::INFINITY;
        let mut hi = f64::NEG_INFINITY;
        let mut masses = Vec::with_capacity(per_class.len());
        for stats in per_class {
            masses.push(stats.count() as f64);
            if stats.count() > 0 {
                lo = lo.min(stats.min());
                hi = hi.max(stats.max());
            }
        }
        if !(hi > lo) {
            return None;
        }

        let parent = entropy(&masses);
        let total: f64 = masses.iter().sum();
        let mut left = vec![0.0; per_class.len()];
        let mut right = vec![0.0; per_class.len()];
        let mut best: Option<(f64, f32)> = None;

        for i in 1..=split_points {
            let t = lo + (hi - lo) * i as f64 / (split_points + 1) as f64;
            let mut n_left = 0.0;
            for (c, stats) in per_class.iter().enumerate() {
                let below = stats.count() as f64 * stats.cdf(t);
                left[c] = below;
                right[c] = stats.count() as f64 - below;
                n_left += below;
            }
            let n_right = total - n_left;
            let gain =
                parent - (n_left / total) * entropy(&left) - (n_right / total) * entropy(&right);
            if best.map_or(true, |(g, _)| gain > g) {
                best = Some((gain, t as f32));
            }
        }
        best
    }

    /// Information gain of the multiway split on this categorical dimension.
    ///
    /// Returns `None` for numeric observers or before any observation.
    pub fn categorical_split_gain(&self) -> Option<f64> {
        let (cardinality, counts) = match self {
            Observer::Categorical { cardinality, counts } => (*cardinality as usize, counts),
            Observer::Numeric { .. } => return None,
        };

        let num_classes = counts.len() / cardinality;
        let class_masses: Vec<f64> = (0..num_classes)
            .map(|c| {
                counts[c * cardinality..(c + 1) * cardinality]
                    .iter()
                    .sum::<u64>() as f64
            })
            .collect();
        let total: f64 = class_masses.iter().sum();
        if total == 0.0 {
            return None;
        }

        let parent = entropy(&class_masses);
        let mut children = 0.0;
        let mut value_masses = vec![0.0; num_classes];
        for v in 0..cardinality {
            let mut n_v = 0.0;
            for (c, mass) in value_masses.iter_mut().enumerate() {
                *mass = counts[c * cardinality + v] as f64;
                n_v += *mass;
            }
            if n_v > 0.0 {
                children += (n_v / total) * entropy(&value_masses);
            }
        }
        Some(parent - children)
    }

    /// Log-likelihood of `value` under class `label` on this dimension.
    ///
    /// Categorical likelihoods are Laplace-smoothed.
    pub fn log_likelihood(&self, value: f32, label: usize) -> f64 {
        match self {
            Observer::Numeric { per_class } => per_class[label].log_pdf(value as f64),
            Observer::Categorical { cardinality, counts } => {
                let cardinality = *cardinality as usize;
                let v = (value as usize).min(cardinality - 1);
                let row = &counts[label * cardinality..(label + 1) * cardinality];
                let class_total: u64 = row.iter().sum();
                ((row[v] + 1) as f64 / (class_total as f64 + cardinality as f64)).ln()
            }
        }
    }
}

/// Shannon entropy (bits) of an unnormalized mass vector.
pub fn entropy(masses: &[f64]) -> f64 {
    let total: f64 = masses.iter().sum();
    if total <= 0.0 {
        return 0.0;
    }
    let mut h = 0.0;
    for &m in masses {
        if m > 0.0 {
            let p = m / total;
            h -= p * p.log2();
        }
    }
    h
}
