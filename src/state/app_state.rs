use crate::config::{Settings, POINT_COUNT_RANGE, SMOOTHING_RANGE};
use crate::error::PipelineError;
use crate::processing::fit::LinearFit;
use crate::processing::generator::{DatasetKind, Series};
use crate::processing::histogram::{auto_bins, clip_to_percentiles, histogram, Histogram};
use crate::processing::pipeline::{PipelineRequest, StatsPipeline};
use crate::processing::statistics::DescriptiveStats;
use crate::state::energy_state::EnergyState;
use crate::state::theme::Theme;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// How the series is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlotKind {
    Line,
    MarkersLine,
    Bar,
    Histogram,
}

impl PlotKind {
    pub const ALL: [PlotKind; 4] = [
        PlotKind::Line,
        PlotKind::MarkersLine,
        PlotKind::Bar,
        PlotKind::Histogram,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            PlotKind::Line => "Line",
            PlotKind::MarkersLine => "Markers + line",
            PlotKind::Bar => "Bar",
            PlotKind::Histogram => "Histogram",
        }
    }
}

impl Default for PlotKind {
    fn default() -> Self {
        PlotKind::MarkersLine
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    Chart,
    EnergyCuts,
}

/// User-editable inputs of the chart page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChartControls {
    pub dataset: DatasetKind,
    pub plot_kind: PlotKind,
    pub point_count: usize,
    pub smoothing_window: usize,
    pub show_trend: bool,
    /// Bin only the 2nd-98th percentile band in histogram mode.
    pub clip_outliers: bool,
}

impl ChartControls {
    pub fn from_settings(settings: &Settings) -> Self {
        let mut controls = Self {
            dataset: settings.dataset,
            plot_kind: PlotKind::default(),
            point_count: settings.point_count,
            smoothing_window: settings.smoothing_window,
            show_trend: settings.show_trend,
            clip_outliers: false,
        };
        controls.select_dataset(settings.dataset);
        controls
    }

    /// Switch dataset. The mixture dataset is only meaningful as a histogram.
    pub fn select_dataset(&mut self, dataset: DatasetKind) {
        self.dataset = dataset;
        if dataset == DatasetKind::HistogramMixture {
            self.plot_kind = PlotKind::Histogram;
        }
    }

    /// Histogram mode never carries a trend line.
    pub fn wants_trend(&self) -> bool {
        self.show_trend && self.plot_kind != PlotKind::Histogram
    }

    pub fn request(&self) -> PipelineRequest {
        PipelineRequest {
            dataset: self.dataset,
            point_count: self
                .point_count
                .clamp(*POINT_COUNT_RANGE.start(), *POINT_COUNT_RANGE.end()),
            smoothing_window: self
                .smoothing_window
                .clamp(*SMOOTHING_RANGE.start(), *SMOOTHING_RANGE.end()),
            fit_trend: self.wants_trend(),
        }
    }
}

/// Everything the chart page renders, derived from one pipeline run.
#[derive(Debug, Clone)]
pub struct ChartView {
    pub dataset: DatasetKind,
    pub plot_kind: PlotKind,
    pub series: Series,
    pub smoothed: Vec<f64>,
    pub stats: Option<DescriptiveStats>,
    pub trend: Option<LinearFit>,
    /// Binned smoothed values, present in histogram mode.
    pub histogram: Option<Histogram>,
    pub error: Option<PipelineError>,
}

impl ChartView {
    pub fn build(controls: &ChartControls, pipeline: &mut StatsPipeline) -> Self {
        let histogram_mode = controls.plot_kind == PlotKind::Histogram;
        match pipeline.run(&controls.request()) {
            Ok(out) => {
                tracing::debug!("{}", out.stats.report(controls.dataset.label()));
                let histogram = histogram_mode.then(|| {
                    let values = if controls.clip_outliers {
                        clip_to_percentiles(&out.smoothed, 2.0, 98.0)
                    } else {
                        out.smoothed.clone()
                    };
                    histogram(&values, auto_bins(&values))
                });
                Self {
                    dataset: controls.dataset,
                    plot_kind: controls.plot_kind,
                    series: out.series,
                    smoothed: out.smoothed,
                    stats: Some(out.stats),
                    trend: out.trend,
                    histogram,
                    error: None,
                }
            }
            Err(e) => {
                tracing::error!("Pipeline failed for {}: {e}", controls.dataset);
                Self {
                    dataset: controls.dataset,
                    plot_kind: controls.plot_kind,
                    series: Series::default(),
                    smoothed: Vec::new(),
                    stats: None,
                    trend: None,
                    histogram: None,
                    error: Some(e),
                }
            }
        }
    }

    pub fn x_label(&self) -> &'static str {
        if self.plot_kind == PlotKind::Histogram {
            "value"
        } else {
            self.dataset.x_label()
        }
    }

    pub fn y_label(&self) -> &'static str {
        if self.plot_kind == PlotKind::Histogram {
            "count"
        } else {
            "y"
        }
    }
}

/// Application state: chart inputs, the view derived from them, and the
/// energy-cut page.
pub struct AppState {
    pub theme: Theme,
    pub tab: Tab,
    pub controls: ChartControls,
    pub show_table: bool,
    pub energy: EnergyState,
    pipeline: StatsPipeline,
    applied: ChartControls,
    view: ChartView,
}

impl AppState {
    pub fn new(settings: &Settings, energy: EnergyState) -> Self {
        let mut pipeline = match settings.seed {
            Some(seed) => StatsPipeline::seeded(seed),
            None => StatsPipeline::from_entropy(),
        };
        let controls = ChartControls::from_settings(settings);
        let view = ChartView::build(&controls, &mut pipeline);
        Self {
            theme: settings.theme,
            tab: Tab::Chart,
            controls,
            show_table: false,
            energy,
            pipeline,
            applied: controls,
            view,
        }
    }

    /// The view for the current controls, regenerated only when they changed.
    pub fn chart_view(&mut self) -> &ChartView {
        if self.applied != self.controls {
            self.regenerate();
        }
        &self.view
    }

    /// Draw a fresh dataset even if the controls did not change.
    pub fn regenerate(&mut self) {
        self.view = ChartView::build(&self.controls, &mut self.pipeline);
        self.applied = self.controls;
    }

    /// The last rendered view without triggering a rebuild.
    pub fn current_view(&self) -> &ChartView {
        &self.view
    }
}
