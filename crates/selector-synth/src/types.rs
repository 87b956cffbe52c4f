//! Core types for selector synthesis

use serde::{Deserialize, Serialize};

/// Synthesis strategy enumeration, in priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SynthStrategy {
    /// Unique identifier attribute
    UniqueId,

    /// Compound class selector
    ClassCompound,

    /// Single stable attribute (`role`, `aria-label`, `data-testid`)
    Attribute,

    /// Structural tag path with ordinals
    StructuralPath,
}

impl SynthStrategy {
    /// Get strategy name as string
    pub fn name(&self) -> &'static str {
        match self {
            SynthStrategy::UniqueId => "unique-id",
            SynthStrategy::ClassCompound => "class-compound",
            SynthStrategy::Attribute => "attribute",
            SynthStrategy::StructuralPath => "structural-path",
        }
    }

    /// Get all strategies in fallback order
    pub fn fallback_chain() -> Vec<SynthStrategy> {
        vec![
            SynthStrategy::UniqueId,
            SynthStrategy::ClassCompound,
            SynthStrategy::Attribute,
            SynthStrategy::StructuralPath,
        ]
    }

    /// Maximum resolution count at which this strategy's selector is
    /// still accepted as stable.
    pub fn max_matches(&self) -> usize {
        match self {
            SynthStrategy::UniqueId => 1,
            SynthStrategy::ClassCompound | SynthStrategy::Attribute => 3,
            // the structural path is the last resort; accepted as-is
            SynthStrategy::StructuralPath => usize::MAX,
        }
    }
}
