use async_trait::async_trait;

use crate::errors::ClassifierError;

/// Number of inputs the external scorer receives.
pub const FEATURE_COUNT: usize = 10;

/// Optional plug-in scorer.
///
/// When configured, its prediction *replaces* the additive score
/// entirely; it is an override, not an ensemble member.
#[async_trait]
pub trait ExternalScorer: Send + Sync {
    /// Feature order: width, height, top, left, class-name length,
    /// id length, is-frame flag, is-script flag, role-attribute length,
    /// aria-label length.
    async fn predict(&self, features: [f64; FEATURE_COUNT]) -> Result<f64, ClassifierError>;
}
