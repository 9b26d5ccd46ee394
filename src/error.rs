use thiserror::Error;

use crate::data::energy::EnergyCut;

/// Errors raised by the numeric pipeline.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum PipelineError {
    /// Statistics or a fit were requested on an empty sequence.
    #[error("input sequence is empty")]
    EmptyInput,

    /// The input contains NaN or infinite values.
    #[error("input contains non-finite values")]
    NonFiniteInput,

    /// All x values are equal, so the least-squares slope is undefined.
    #[error("x values have zero variance, cannot fit a line")]
    DegenerateInput,

    #[error("x and y lengths differ ({x} vs {y})")]
    LengthMismatch { x: usize, y: usize },

    #[error("unknown dataset '{0}'")]
    UnknownDataset(String),
}

/// Errors raised while reading energy-cut statistics and images.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed statistics file: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("no statistics available for the {cut} cut")]
    MissingStats { cut: EnergyCut },

    #[error("cannot decode image: {0}")]
    Image(#[from] image::ImageError),
}

/// Errors raised while loading the settings file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read settings: {0}")]
    Io(#[from] std::io::Error),

    #[error("cannot parse settings: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid settings: {0}")]
    Invalid(String),
}

/// Errors surfaced by an insight request.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum InsightError {
    #[error("nothing to summarize")]
    EmptySummary,

    #[error("insight service failed: {0}")]
    Service(String),

    /// The worker thread went away without publishing a result.
    #[error("insight worker stopped before answering")]
    WorkerLost,
}

impl InsightError {
    pub fn service(message: impl Into<String>) -> Self {
        Self::Service(message.into())
    }
}
