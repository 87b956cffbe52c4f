//! The port the engine talks to the host content tree through.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::broadcast;

use adshield_core_types::{BoundingBox, NodeId, Origin, Selector, Viewport};

use crate::errors::HostError;

/// One batch of tree mutations as reported by the host.
#[derive(Clone, Debug, Default)]
pub struct MutationBatch {
    pub inserted: Vec<NodeId>,
}

/// Host content-tree access.
///
/// Every node-taking method fails soft on a detached or unknown handle,
/// returning empty maps, `None`, or `false` rather than an error. Only
/// selector parsing can fail, and callers flatten that to an empty
/// match set.
#[async_trait]
pub trait HostTree: Send + Sync {
    /// Resolve a selector against the whole tree, document order.
    async fn query(&self, selector: &Selector) -> Result<Vec<NodeId>, HostError>;

    /// True when the node matches the selector.
    async fn matches(&self, node: NodeId, selector: &Selector) -> bool;

    /// All attributes, including `id` and `class` when present.
    async fn attributes(&self, node: NodeId) -> HashMap<String, String>;

    async fn attribute(&self, node: NodeId, name: &str) -> Option<String>;

    async fn class_list(&self, node: NodeId) -> Vec<String>;

    async fn add_class(&self, node: NodeId, class: &str);

    async fn remove_class(&self, node: NodeId, class: &str);

    async fn tag_name(&self, node: NodeId) -> Option<String>;

    async fn parent(&self, node: NodeId) -> Option<NodeId>;

    async fn children(&self, node: NodeId) -> Vec<NodeId>;

    async fn next_sibling(&self, node: NodeId) -> Option<NodeId>;

    async fn bounding_box(&self, node: NodeId) -> Option<BoundingBox>;

    /// Whether the node has an attached interaction handler.
    async fn has_interaction_handler(&self, node: NodeId) -> bool;

    /// Whether the node carries active animation/transition styling.
    async fn has_animation(&self, node: NodeId) -> bool;

    async fn is_attached(&self, node: NodeId) -> bool;

    async fn viewport(&self) -> Viewport;

    async fn origin(&self) -> Origin;

    /// Subscribe to subtree-change notifications.
    fn subscribe_mutations(&self) -> broadcast::Receiver<MutationBatch>;
}

/// Resolve a selector, flattening parse failures to no matches.
pub async fn query_or_empty(host: &dyn HostTree, selector: &Selector) -> Vec<NodeId> {
    match host.query(selector).await {
        Ok(nodes) => nodes,
        Err(err) => {
            tracing::debug!(selector = %selector, "selector resolution failed: {}", err);
            Vec::new()
        }
    }
}
