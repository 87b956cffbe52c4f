use serde::{Deserialize, Serialize};

/// Outcome of scoring one node.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Confidence {
    /// Additive score in [0, 1].
    pub value: f64,
    /// Human-readable contributions, one per signal that fired.
    pub reasons: Vec<String>,
    /// `value >= confidence_threshold` at scoring time.
    pub is_likely: bool,
}

/// Signal weights; additive, capped at 1.0.
pub mod weights {
    pub const PER_KEYWORD: f64 = 0.15;
    pub const SELECTOR_MEMORY: f64 = 0.30;
    pub const SIZE_MATCH: f64 = 0.15;
    pub const TYPICAL_AD_SIZE: f64 = 0.10;
    pub const POSITION_MATCH: f64 = 0.15;
    pub const EDGE_PLACEMENT: f64 = 0.05;
    pub const LEARNED_DOMAIN: f64 = 0.30;
    pub const SUSPICIOUS_DOMAIN: f64 = 0.25;
    pub const INTERACTION_HANDLER: f64 = 0.10;
    pub const ANIMATED_STYLE: f64 = 0.05;
}

/// Bounding-box area range typical of display ads.
pub const TYPICAL_AD_AREA: std::ops::Range<f64> = 10_000.0..200_000.0;
