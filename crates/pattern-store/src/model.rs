use std::collections::{BTreeSet, VecDeque};

use serde::{Deserialize, Serialize};

use adshield_core_types::Selector;

/// Capacity of the geometric fingerprint sequences (FIFO eviction).
pub const GEOMETRY_CAP: usize = 100;

pub const THRESHOLD_DEFAULT: f64 = 0.75;
pub const THRESHOLD_MIN: f64 = 0.6;
pub const THRESHOLD_MAX: f64 = 0.9;

pub const LEARNING_RATE_DEFAULT: f64 = 0.1;
pub const LEARNING_RATE_FLOOR: f64 = 0.05;
pub const LEARNING_RATE_DECAY: f64 = 0.95;

/// Width/height fingerprint of a suppressed node.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SizeSample {
    pub width: f64,
    pub height: f64,
}

impl SizeSample {
    /// Both extents within 50 layout units.
    pub fn near(&self, other: &SizeSample) -> bool {
        (self.width - other.width).abs() < 50.0 && (self.height - other.height).abs() < 50.0
    }
}

/// Viewport-relative position fingerprint (top and right edges, 0..1).
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PositionSample {
    pub top: f64,
    pub right: f64,
}

impl PositionSample {
    /// Both coordinates within 0.1 of the viewport.
    pub fn near(&self, other: &PositionSample) -> bool {
        (self.top - other.top).abs() < 0.1 && (self.right - other.right).abs() < 0.1
    }
}

/// The persisted learned state.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LearnedPatterns {
    pub keywords: BTreeSet<String>,
    pub selectors: BTreeSet<String>,
    pub domains: BTreeSet<String>,
    pub sizes: VecDeque<SizeSample>,
    pub positions: VecDeque<PositionSample>,
    pub confidence_threshold: f64,
    pub learning_rate: f64,
}

impl Default for LearnedPatterns {
    fn default() -> Self {
        Self {
            keywords: BTreeSet::new(),
            selectors: BTreeSet::new(),
            domains: BTreeSet::new(),
            sizes: VecDeque::new(),
            positions: VecDeque::new(),
            confidence_threshold: THRESHOLD_DEFAULT,
            learning_rate: LEARNING_RATE_DEFAULT,
        }
    }
}

impl LearnedPatterns {
    /// Restore out-of-range persisted values to their documented bounds.
    pub fn clamp(&mut self) {
        self.confidence_threshold = self
            .confidence_threshold
            .clamp(THRESHOLD_MIN, THRESHOLD_MAX);
        self.learning_rate = self
            .learning_rate
            .clamp(LEARNING_RATE_FLOOR, LEARNING_RATE_DEFAULT);
    }
}

/// Signal extracted from one labeled node, ready to learn from.
#[derive(Clone, Debug, Default)]
pub struct LearnSample {
    /// Lowercased identity tokens, length > 3.
    pub tokens: Vec<String>,
    pub selector: Option<Selector>,
    pub size: Option<SizeSample>,
    pub position: Option<PositionSample>,
    /// Hostname when the node loads a remote resource.
    pub hostname: Option<String>,
}

impl LearnSample {
    /// True when extraction yielded no usable signal at all.
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
            && self.selector.as_ref().map_or(true, |s| s.is_empty())
            && self.size.is_none()
            && self.position.is_none()
            && self.hostname.is_none()
    }
}
