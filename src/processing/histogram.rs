use crate::processing::statistics::{percentile, DescriptiveStats};

const MAX_AUTO_BINS: usize = 100;

/// Equal-width histogram. `edges` has one more entry than `counts`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Histogram {
    pub edges: Vec<f64>,
    pub counts: Vec<usize>,
}

impl Histogram {
    pub fn bin_width(&self) -> f64 {
        match self.edges.as_slice() {
            [first, second, ..] => second - first,
            _ => 0.0,
        }
    }

    /// Bin centers paired with counts, ready for a bar chart.
    pub fn bars(&self) -> impl Iterator<Item = (f64, usize)> + '_ {
        self.edges
            .windows(2)
            .map(|w| (w[0] + w[1]) / 2.0)
            .zip(self.counts.iter().copied())
    }

    pub fn total(&self) -> usize {
        self.counts.iter().sum()
    }
}

/// Bin `values` into `bins` equal-width bins spanning [min, max].
/// Non-finite values are skipped; the last bin includes `max`.
pub fn histogram(values: &[f64], bins: usize) -> Histogram {
    let finite: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if finite.is_empty() || bins == 0 {
        return Histogram::default();
    }

    let min = finite.iter().copied().fold(f64::INFINITY, f64::min);
    let max = finite.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    if (max - min).abs() < f64::EPSILON {
        return Histogram {
            edges: vec![min - 0.5, max + 0.5],
            counts: vec![finite.len()],
        };
    }

    let step = (max - min) / bins as f64;
    let edges = (0..=bins).map(|i| min + i as f64 * step).collect();
    let mut counts = vec![0; bins];
    for v in finite {
        let idx = (((v - min) / step).floor() as usize).min(bins - 1);
        counts[idx] += 1;
    }

    Histogram { edges, counts }
}

/// Freedman-Diaconis bin count, falling back to Sturges when the
/// interquartile range is zero.
pub fn auto_bins(values: &[f64]) -> usize {
    let Ok(stats) = DescriptiveStats::compute(values) else {
        return 1;
    };
    let n = stats.count as f64;
    let sturges = (n.log2().ceil() as usize + 1).clamp(1, MAX_AUTO_BINS);

    let width = 2.0 * stats.iqr() * n.powf(-1.0 / 3.0);
    if width <= 0.0 || stats.range() <= 0.0 {
        return sturges;
    }
    ((stats.range() / width).ceil() as usize).clamp(1, MAX_AUTO_BINS)
}

/// Drop values outside the [`lo`, `hi`] percentile band.
pub fn clip_to_percentiles(values: &[f64], lo: f64, hi: f64) -> Vec<f64> {
    let (Ok(low), Ok(high)) = (percentile(values, lo), percentile(values, hi)) else {
        return Vec::new();
    };
    values
        .iter()
        .copied()
        .filter(|v| *v >= low && *v <= high)
        .collect()
}
