//! Selector synthesis.
//!
//! Four strategies in fallback order:
//! 1. UniqueId - `#id` when it resolves to exactly one node
//! 2. ClassCompound - joined class list, accepted at <= 3 matches
//! 3. Attribute - `role` / `aria-label` / `data-testid`, <= 3 matches
//! 4. StructuralPath - tag path with same-tag ordinals, capped at 4 levels

pub mod synthesizer;
pub mod types;

pub use synthesizer::SelectorSynthesizer;
pub use types::SynthStrategy;
