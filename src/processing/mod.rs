pub mod fit;
pub mod generator;
pub mod histogram;
pub mod pipeline;
pub mod smoothing;
pub mod statistics;
