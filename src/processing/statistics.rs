use serde::{Deserialize, Deserializer, Serialize};

use crate::error::PipelineError;

/// Descriptive statistics for a run of values.
///
/// The serde aliases accept the percentile-style keys (`25%`, `50%`, `75%`)
/// that externally generated statistics files use.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DescriptiveStats {
    #[serde(deserialize_with = "count_from_number")]
    pub count: usize,
    #[serde(deserialize_with = "float_or_nan")]
    pub mean: f64,
    #[serde(alias = "50%", deserialize_with = "float_or_nan")]
    pub median: f64,
    #[serde(alias = "std_dev", deserialize_with = "float_or_nan")]
    pub std: f64,
    #[serde(deserialize_with = "float_or_nan")]
    pub min: f64,
    #[serde(deserialize_with = "float_or_nan")]
    pub max: f64,
    #[serde(alias = "25%", deserialize_with = "float_or_nan")]
    pub q1: f64,
    #[serde(alias = "75%", deserialize_with = "float_or_nan")]
    pub q3: f64,
}

impl DescriptiveStats {
    /// Compute statistics from `values`. Fails on empty or non-finite input
    /// rather than producing NaN.
    pub fn compute(values: &[f64]) -> Result<Self, PipelineError> {
        if values.is_empty() {
            return Err(PipelineError::EmptyInput);
        }
        if values.iter().any(|v| !v.is_finite()) {
            return Err(PipelineError::NonFiniteInput);
        }

        let mut sorted = values.to_vec();
        sorted.sort_by(f64::total_cmp);

        let count = sorted.len();
        let mean = mean(&sorted)?;
        let variance = sorted.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / count as f64;
        let (q1, q3) = quartiles_sorted(&sorted);

        Ok(Self {
            count,
            mean,
            median: median_sorted(&sorted),
            std: variance.sqrt(),
            min: sorted[0],
            max: sorted[count - 1],
            q1,
            q3,
        })
    }

    pub fn range(&self) -> f64 {
        self.max - self.min
    }

    pub fn iqr(&self) -> f64 {
        self.q3 - self.q1
    }

    /// Format as a multi-line report string.
    pub fn report(&self, label: &str) -> String {
        format!(
            "{}:\n  Count: {}\n  Mean: {:.3}\n  Median: {:.3}\n  Std Dev: {:.3}\n  Min: {:.3}\n  Max: {:.3}\n  Q1: {:.3}\n  Q3: {:.3}\n",
            label, self.count, self.mean, self.median, self.std, self.min, self.max, self.q1, self.q3
        )
    }
}

/// Counts written by numeric tooling sometimes arrive as floats (`1234.0`).
fn count_from_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<usize, D::Error> {
    let raw = f64::deserialize(deserializer)?;
    if raw.is_finite() && raw >= 0.0 && raw.fract() == 0.0 {
        Ok(raw as usize)
    } else {
        Err(serde::de::Error::custom(format!("invalid count {raw}")))
    }
}

/// `null` stands for a value the producer could not compute (JSON has no NaN).
fn float_or_nan<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(f64::NAN))
}

/// Median of an already sorted, non-empty slice.
fn median_sorted(sorted: &[f64]) -> f64 {
    let n = sorted.len();
    if n % 2 == 0 {
        (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
    } else {
        sorted[n / 2]
    }
}

/// Median-of-halves quartiles. The halves are split by position, so the
/// middle element of an odd-length slice belongs to neither half.
fn quartiles_sorted(sorted: &[f64]) -> (f64, f64) {
    let n = sorted.len();
    if n == 1 {
        return (sorted[0], sorted[0]);
    }
    let half = n / 2;
    (median_sorted(&sorted[..half]), median_sorted(&sorted[n - half..]))
}

pub fn mean(values: &[f64]) -> Result<f64, PipelineError> {
    if values.is_empty() {
        return Err(PipelineError::EmptyInput);
    }
    Ok(values.iter().sum::<f64>() / values.len() as f64)
}

/// Linear-interpolated percentile (`p` in 0..=100) of a non-empty slice.
pub fn percentile(values: &[f64], p: f64) -> Result<f64, PipelineError> {
    if values.is_empty() {
        return Err(PipelineError::EmptyInput);
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let rank = (p.clamp(0.0, 100.0) / 100.0) * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    Ok(sorted[lo] + (sorted[hi] - sorted[lo]) * (rank - lo as f64))
}
