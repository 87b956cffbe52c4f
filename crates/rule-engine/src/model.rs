use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use adshield_core_types::{NodeId, Selector};

/// Restoration history capacity; oldest records are overwritten first.
pub const REMOVED_HISTORY_CAP: usize = 10;

/// Undo/redo stack capacity; oldest actions are dropped.
pub const UNDO_STACK_CAP: usize = 50;

/// Per-node suppression state.
///
/// Heuristic suppression is reversible on negative feedback; manual
/// suppression only via undo or an explicit exclusion.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SuppressionState {
    Heuristic,
    Manual,
}

/// Transient record of a heuristic match awaiting user review.
#[derive(Clone, Debug)]
pub struct CandidateInfo {
    pub selector: Selector,
    pub confidence: f64,
    pub reason: String,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum ActionKind {
    Block,
}

/// One undo/redo-able action.
#[derive(Clone, Debug)]
pub struct UndoAction {
    pub kind: ActionKind,
    pub selector: Selector,
    pub timestamp: DateTime<Utc>,
}

impl UndoAction {
    pub fn block(selector: Selector) -> Self {
        Self {
            kind: ActionKind::Block,
            selector,
            timestamp: Utc::now(),
        }
    }
}

/// Snapshot taken before a manual suppression so the original content
/// can be put back on undo.
#[derive(Clone, Debug)]
pub struct RemovedRecord {
    pub selector: Selector,
    pub parent: Option<NodeId>,
    /// Next sibling at suppression time; the insertion anchor on restore.
    pub anchor: Option<NodeId>,
    pub reason: String,
    pub timestamp: DateTime<Utc>,
}

/// Exclusion export/import document.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ExclusionDocument {
    pub hostname: String,
    pub exclusions: Vec<String>,
}
