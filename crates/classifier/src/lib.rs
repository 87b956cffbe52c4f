//! Confidence classifier.
//!
//! Combines weak signals (learned patterns, static keyword and domain
//! lists, geometry, behavior flags) into one additive score capped at
//! 1.0. An optional external scorer can replace the computed value
//! outright. No single signal failure ever aborts a classification.

pub mod errors;
pub mod extract;
pub mod model;
pub mod ports;
pub mod scorer;
pub mod statics;

pub use errors::ClassifierError;
pub use model::Confidence;
pub use ports::ExternalScorer;
pub use scorer::ConfidenceClassifier;
