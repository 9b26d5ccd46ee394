pub mod energy;
pub mod export;
pub mod scan;
