//! Rule & suppression engine.
//!
//! Owns the confirmed rule list, per-origin exclusions, the per-node
//! suppression state machine, bounded undo/redo stacks and the global
//! pause flag. Every persistent mutation is a single update-then-persist
//! step.

pub mod engine;
pub mod errors;
pub mod model;

pub use engine::RuleEngine;
pub use errors::EngineError;
pub use model::{
    ActionKind, CandidateInfo, ExclusionDocument, RemovedRecord, SuppressionState, UndoAction,
};
