pub mod errors;
pub mod model;
pub mod store;

pub use errors::PatternError;
pub use model::{LearnSample, LearnedPatterns, PositionSample, SizeSample};
pub use store::PatternStore;

#[cfg(test)]
mod tests;
