use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use adshield_core_types::NodeId;

fn default_flush_idle_ms() -> u64 {
    500
}

fn default_rule_throttle_ms() -> u64 {
    500
}

fn default_candidate_batch() -> usize {
    30
}

fn default_resource_batch() -> usize {
    10
}

fn default_batch_yield_ms() -> u64 {
    30
}

fn default_interesting_tags() -> Vec<String> {
    ["div", "section", "aside", "ins", "a", "img", "iframe", "script"]
        .iter()
        .map(|t| t.to_string())
        .collect()
}

/// Tuning knobs for the background scan loop.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Quiet period after the last mutation before a flush runs.
    pub flush_idle_ms: u64,
    /// Minimum gap between tree-wide rule re-application passes.
    pub rule_throttle_ms: u64,
    /// Heuristic candidates examined per batch.
    pub candidate_batch: usize,
    /// Remote-resource nodes examined per batch.
    pub resource_batch: usize,
    /// Pause between consecutive batches.
    pub batch_yield_ms: u64,
    /// Tags worth classifying; anything else is ignored on insert.
    pub interesting_tags: Vec<String>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            flush_idle_ms: default_flush_idle_ms(),
            rule_throttle_ms: default_rule_throttle_ms(),
            candidate_batch: default_candidate_batch(),
            resource_batch: default_resource_batch(),
            batch_yield_ms: default_batch_yield_ms(),
            interesting_tags: default_interesting_tags(),
        }
    }
}

impl ScanConfig {
    pub fn flush_idle(&self) -> Duration {
        Duration::from_millis(self.flush_idle_ms)
    }

    pub fn rule_throttle(&self) -> Duration {
        Duration::from_millis(self.rule_throttle_ms)
    }

    pub fn batch_yield(&self) -> Duration {
        Duration::from_millis(self.batch_yield_ms)
    }

    pub fn is_interesting(&self, tag: &str) -> bool {
        self.interesting_tags.iter().any(|t| t == tag)
    }

    /// Tags whose ad signal is the resource they load, not their markup.
    pub fn is_resource_tag(tag: &str) -> bool {
        matches!(tag, "img" | "iframe" | "script")
    }
}

/// What the scheduler drives. Implemented by the engine so the loop
/// stays free of engine internals.
#[async_trait]
pub trait ScanSink: Send + Sync {
    /// Nothing runs while paused; queued nodes are dropped.
    async fn paused(&self) -> bool;

    /// Whether the heuristic pass is opted in for the current page.
    async fn heuristics_enabled(&self) -> bool;

    /// Re-apply every confirmed rule tree-wide.
    async fn apply_rules(&self);

    /// Classify one batch of attribute/keyword candidates.
    async fn process_candidates(&self, nodes: Vec<NodeId>);

    /// Classify one batch of remote-resource nodes.
    async fn process_resources(&self, nodes: Vec<NodeId>);
}
