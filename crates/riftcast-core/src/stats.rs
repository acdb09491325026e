//! Running statistics over trial results.
//!
//! [`ScalarStats`] summarises a sample set by mean, population variance,
//! min and max. Two summaries merge exactly, so partial results from
//! independent trials fold into one.

use serde::{Deserialize, Serialize};

/// Summary of a set of scalar samples.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScalarStats {
    /// Arithmetic mean
    pub mean: f64,
    /// Population variance (σ²)
    pub variance: f64,
    /// Minimum value
    pub min: f64,
    /// Maximum value
    pub max: f64,
    /// Number of samples contributing to these stats
    pub sample_count: u64,
}

impl Default for ScalarStats {
    fn default() -> Self {
        Self::empty()
    }
}

impl ScalarStats {
    /// Stats of a single value.
    #[must_use]
    pub fn from_value(value: f64) -> Self {
        Self {
            mean: value,
            variance: 0.0,
            min: value,
            max: value,
            sample_count: 1,
        }
    }

    /// Stats of no samples.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            mean: 0.0,
            variance: 0.0,
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
            sample_count: 0,
        }
    }

    /// Stats of `samples`, folded in order.
    #[must_use]
    pub fn from_samples(samples: &[f64]) -> Self {
        samples.iter().fold(Self::empty(), |acc, &v| acc.push(v))
    }

    /// Adds one sample.
    #[must_use]
    pub fn push(self, value: f64) -> Self {
        Self::merge(&self, &Self::from_value(value))
    }

    /// Combines two summaries with the parallel variance formula.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn merge(a: &Self, b: &Self) -> Self {
        if a.sample_count == 0 {
            return *b;
        }
        if b.sample_count == 0 {
            return *a;
        }

        let n_a = a.sample_count as f64;
        let n_b = b.sample_count as f64;
        let n_total = n_a + n_b;

        let delta = b.mean - a.mean;
        let mean = a.mean + delta * (n_b / n_total);
        let variance =
            (a.variance * n_a + b.variance * n_b + delta * delta * n_a * n_b / n_total) / n_total;

        Self {
            mean,
            variance,
            min: a.min.min(b.min),
            max: a.max.max(b.max),
            sample_count: a.sample_count + b.sample_count,
        }
    }

    /// Standard deviation.
    #[must_use]
    pub fn std_dev(&self) -> f64 {
        self.variance.sqrt()
    }

    /// Standard error of the mean. Zero for fewer than two samples.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn std_error(&self) -> f64 {
        if self.sample_count < 2 {
            0.0
        } else {
            self.std_dev() / (self.sample_count as f64).sqrt()
        }
    }
}
