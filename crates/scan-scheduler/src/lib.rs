//! Debounced background scanning over host mutation batches.

pub mod model;
pub mod runtime;

pub use model::{ScanConfig, ScanSink};
pub use runtime::ScanScheduler;
