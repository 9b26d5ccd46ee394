use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::error::PipelineError;
use crate::processing::fit::{fit_linear, LinearFit};
use crate::processing::generator::{generate, DatasetKind, DatasetSpec, Series};
use crate::processing::smoothing::smooth;
use crate::processing::statistics::DescriptiveStats;

/// Parameters for one pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineRequest {
    pub dataset: DatasetKind,
    pub point_count: usize,
    pub smoothing_window: usize,
    pub fit_trend: bool,
}

/// Everything derived from one generated series.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineOutput {
    pub series: Series,
    pub smoothed: Vec<f64>,
    /// Statistics of the smoothed values.
    pub stats: DescriptiveStats,
    pub trend: Option<LinearFit>,
}

/// Generates datasets and derives smoothing, statistics and trend from them.
///
/// The random source lives here so that a seeded pipeline replays the same
/// sequence of datasets.
pub struct StatsPipeline {
    rng: StdRng,
}

impl StatsPipeline {
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    pub fn generate(&mut self, spec: DatasetSpec) -> Series {
        generate(spec, &mut self.rng)
    }

    pub fn run(&mut self, request: &PipelineRequest) -> Result<PipelineOutput, PipelineError> {
        let series = self.generate(DatasetSpec::new(request.dataset, request.point_count));
        let smoothed = smooth(series.y(), request.smoothing_window);
        let stats = DescriptiveStats::compute(&smoothed)?;

        let trend = if request.fit_trend {
            match fit_linear(series.x(), &smoothed) {
                Ok(fit) => Some(fit),
                Err(e) => {
                    tracing::warn!("Skipping trend line for {}: {e}", request.dataset);
                    None
                }
            }
        } else {
            None
        };

        tracing::debug!(
            "Pipeline run: {} x{} window={} trend={}",
            request.dataset,
            request.point_count,
            request.smoothing_window,
            trend.is_some()
        );

        Ok(PipelineOutput {
            series,
            smoothed,
            stats,
            trend,
        })
    }
}
