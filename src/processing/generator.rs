use std::f64::consts::PI;
use std::fmt;
use std::str::FromStr;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::PipelineError;

/// The synthetic datasets the chart page can show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DatasetKind {
    Sine,
    SineNoisy,
    Scatter,
    Linear,
    #[serde(alias = "hist")]
    HistogramMixture,
}

impl DatasetKind {
    pub const ALL: [DatasetKind; 5] = [
        DatasetKind::Sine,
        DatasetKind::SineNoisy,
        DatasetKind::Scatter,
        DatasetKind::Linear,
        DatasetKind::HistogramMixture,
    ];

    pub fn tag(&self) -> &'static str {
        match self {
            DatasetKind::Sine => "sine",
            DatasetKind::SineNoisy => "sine-noisy",
            DatasetKind::Scatter => "scatter",
            DatasetKind::Linear => "linear",
            DatasetKind::HistogramMixture => "histogram-mixture",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            DatasetKind::Sine => "Sine wave",
            DatasetKind::SineNoisy => "Sine wave (noisy)",
            DatasetKind::Scatter => "Random scatter",
            DatasetKind::Linear => "Linear + noise",
            DatasetKind::HistogramMixture => "Histogram mixture",
        }
    }

    /// Axis title used for the x axis of this dataset.
    pub fn x_label(&self) -> &'static str {
        match self {
            DatasetKind::Sine | DatasetKind::SineNoisy => "x (radians)",
            DatasetKind::HistogramMixture => "value",
            _ => "x",
        }
    }
}

impl Default for DatasetKind {
    fn default() -> Self {
        DatasetKind::Sine
    }
}

impl fmt::Display for DatasetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for DatasetKind {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "sine" => Ok(DatasetKind::Sine),
            "sine-noisy" => Ok(DatasetKind::SineNoisy),
            "scatter" => Ok(DatasetKind::Scatter),
            "linear" => Ok(DatasetKind::Linear),
            "histogram-mixture" | "hist" => Ok(DatasetKind::HistogramMixture),
            _ => Err(PipelineError::UnknownDataset(s.to_string())),
        }
    }
}

/// A dataset kind plus the number of points to draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DatasetSpec {
    pub kind: DatasetKind,
    pub point_count: usize,
}

impl DatasetSpec {
    pub fn new(kind: DatasetKind, point_count: usize) -> Self {
        Self { kind, point_count }
    }
}

/// An ordered run of (x, y) pairs. Fields are private so a generated
/// series cannot be edited after the fact.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Series {
    x: Vec<f64>,
    y: Vec<f64>,
}

impl Series {
    /// Build a series from parallel columns.
    pub fn from_columns(x: Vec<f64>, y: Vec<f64>) -> Result<Self, PipelineError> {
        if x.len() != y.len() {
            return Err(PipelineError::LengthMismatch { x: x.len(), y: y.len() });
        }
        Ok(Self { x, y })
    }

    pub fn x(&self) -> &[f64] {
        &self.x
    }

    pub fn y(&self) -> &[f64] {
        &self.y
    }

    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    pub fn points(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.x.iter().copied().zip(self.y.iter().copied())
    }
}

/// `n` evenly spaced values from `start` to `end` inclusive.
/// A single point collapses to `start`.
pub fn linspace(start: f64, end: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (end - start) / (n - 1) as f64;
            // Pin the last value so rounding never overshoots the interval.
            (0..n)
                .map(|i| if i == n - 1 { end } else { start + i as f64 * step })
                .collect()
        }
    }
}

/// Draw a series for `spec`, taking all randomness from `rng`.
pub fn generate<R: Rng + ?Sized>(spec: DatasetSpec, rng: &mut R) -> Series {
    let n = spec.point_count;
    let (x, y) = match spec.kind {
        DatasetKind::Sine | DatasetKind::SineNoisy => {
            let x = linspace(0.0, 4.0 * PI, n);
            let mut y: Vec<f64> = x.iter().map(|t| t.sin()).collect();
            if spec.kind == DatasetKind::SineNoisy {
                for v in &mut y {
                    *v += rng.gen_range(-0.2..=0.2);
                }
            }
            (x, y)
        }
        DatasetKind::Scatter => (0..n)
            .map(|_| (rng.gen_range(0.0..=10.0), rng.gen_range(-3.0..=3.0)))
            .unzip(),
        DatasetKind::Linear => {
            let x = linspace(0.0, 10.0, n);
            let y = x
                .iter()
                .map(|xv| 0.9 * xv + rng.gen_range(-1.5..=1.5))
                .collect();
            (x, y)
        }
        DatasetKind::HistogramMixture => (0..n)
            .map(|i| {
                let component = if rng.gen_bool(0.6) {
                    rng.gen_range(2.0..=3.5)
                } else {
                    rng.gen_range(6.0..=8.0)
                };
                (i as f64, component + rng.gen_range(-0.2..=0.2))
            })
            .unzip(),
    };
    Series { x, y }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn rng() -> StdRng {
        StdRng::seed_from_u64(7)
    }

    #[test]
    fn sine_spans_zero_to_four_pi() {
        for n in [2, 3, 50, 1000] {
            let s = generate(DatasetSpec::new(DatasetKind::Sine, n), &mut rng());
            assert_eq!(s.len(), n);
            assert_eq!(s.x()[0], 0.0);
            assert_eq!(s.x()[n - 1], 4.0 * PI);
            assert!(s.x().windows(2).all(|w| w[0] < w[1]));
            for (x, y) in s.points() {
                assert_relative_eq!(y, x.sin());
            }
        }
    }

    #[test]
    fn single_point_returns_start() {
        let s = generate(DatasetSpec::new(DatasetKind::Linear, 1), &mut rng());
        assert_eq!(s.x(), &[0.0]);
        assert_eq!(linspace(3.0, 9.0, 1), vec![3.0]);
        assert!(linspace(0.0, 1.0, 0).is_empty());
    }

    #[test]
    fn noisy_sine_stays_within_noise_band() {
        let s = generate(DatasetSpec::new(DatasetKind::SineNoisy, 400), &mut rng());
        for (x, y) in s.points() {
            assert!((y - x.sin()).abs() <= 0.2 + 1e-12);
        }
    }

    #[test]
    fn scatter_stays_in_bounds() {
        let s = generate(DatasetSpec::new(DatasetKind::Scatter, 100), &mut rng());
        assert_eq!(s.len(), 100);
        assert!(s.x().iter().all(|v| (0.0..=10.0).contains(v)));
        assert!(s.y().iter().all(|v| (-3.0..=3.0).contains(v)));
    }

    #[test]
    fn linear_noise_is_bounded() {
        let s = generate(DatasetSpec::new(DatasetKind::Linear, 300), &mut rng());
        assert_eq!(s.x()[299], 10.0);
        for (x, y) in s.points() {
            assert!((y - 0.9 * x).abs() <= 1.5 + 1e-12);
        }
    }

    #[test]
    fn mixture_values_fall_in_either_component() {
        let s = generate(DatasetSpec::new(DatasetKind::HistogramMixture, 500), &mut rng());
        assert_eq!(s.x()[499], 499.0);
        for &v in s.y() {
            let low = (1.8..=3.7).contains(&v);
            let high = (5.8..=8.2).contains(&v);
            assert!(low || high, "{v} outside both components");
        }
        let low_share = s.y().iter().filter(|v| **v < 5.0).count() as f64 / 500.0;
        assert!((0.45..=0.75).contains(&low_share));
    }

    #[test]
    fn same_seed_same_series() {
        let spec = DatasetSpec::new(DatasetKind::Scatter, 64);
        let a = generate(spec, &mut StdRng::seed_from_u64(42));
        let b = generate(spec, &mut StdRng::seed_from_u64(42));
        assert_eq!(a, b);
    }

    #[test]
    fn tags_parse_and_unknown_fails() {
        for kind in DatasetKind::ALL {
            assert_eq!(kind.tag().parse::<DatasetKind>(), Ok(kind));
        }
        assert_eq!("hist".parse::<DatasetKind>(), Ok(DatasetKind::HistogramMixture));
        assert_eq!(
            "cosine".parse::<DatasetKind>(),
            Err(PipelineError::UnknownDataset("cosine".to_string()))
        );
    }

    #[test]
    fn series_rejects_mismatched_columns() {
        let err = Series::from_columns(vec![1.0, 2.0], vec![1.0]).unwrap_err();
        assert_eq!(err, PipelineError::LengthMismatch { x: 2, y: 1 });
    }
}
