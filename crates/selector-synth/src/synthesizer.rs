//! Strategy chain producing a minimal stable selector for a node.

use std::sync::Arc;

use tracing::debug;

use adshield_core_types::{MarkerIds, NodeId, Selector};
use adshield_host_dom::ports::query_or_empty;
use adshield_host_dom::HostTree;

use crate::types::SynthStrategy;

/// Attributes tried by the [`SynthStrategy::Attribute`] strategy, in order.
const ATTRIBUTE_ORDER: [&str; 3] = ["role", "aria-label", "data-testid"];

/// Maximum depth of a synthesized structural path.
const MAX_PATH_DEPTH: usize = 4;

pub struct SelectorSynthesizer {
    host: Arc<dyn HostTree>,
    markers: MarkerIds,
}

impl SelectorSynthesizer {
    pub fn new(host: Arc<dyn HostTree>, markers: MarkerIds) -> Self {
        Self { host, markers }
    }

    /// Synthesize a selector for the node; empty when the node is not a
    /// concrete attached element. Never mutates the tree; bounded by
    /// the fixed strategy chain and the path depth cap.
    pub async fn synthesize(&self, node: NodeId) -> Selector {
        if !self.host.is_attached(node).await {
            return Selector::empty();
        }

        for strategy in SynthStrategy::fallback_chain() {
            let candidate = match strategy {
                SynthStrategy::UniqueId => self.try_unique_id(node).await,
                SynthStrategy::ClassCompound => self.try_class_compound(node).await,
                SynthStrategy::Attribute => self.try_attribute(node).await,
                SynthStrategy::StructuralPath => self.structural_path(node).await,
            };
            if let Some(selector) = candidate {
                if self.accepted(&selector, node, strategy).await {
                    debug!(strategy = strategy.name(), selector = %selector, "synthesized");
                    return selector;
                }
            }
        }

        Selector::empty()
    }

    async fn accepted(&self, selector: &Selector, node: NodeId, strategy: SynthStrategy) -> bool {
        let matches = query_or_empty(self.host.as_ref(), selector).await;
        !matches.is_empty()
            && matches.len() <= strategy.max_matches()
            && matches.contains(&node)
    }

    async fn try_unique_id(&self, node: NodeId) -> Option<Selector> {
        let id = self.host.attribute(node, "id").await?;
        if !is_ident(&id) {
            return None;
        }
        Some(Selector::new(format!("#{id}")))
    }

    async fn try_class_compound(&self, node: NodeId) -> Option<Selector> {
        let classes: Vec<String> = self
            .host
            .class_list(node)
            .await
            .into_iter()
            .filter(|c| !c.trim().is_empty())
            .filter(|c| !self.markers.owns(c))
            .filter(|c| is_ident(c))
            .collect();
        if classes.is_empty() {
            return None;
        }
        Some(Selector::new(format!(".{}", classes.join("."))))
    }

    async fn try_attribute(&self, node: NodeId) -> Option<Selector> {
        for attr in ATTRIBUTE_ORDER {
            let Some(value) = self.host.attribute(node, attr).await else {
                continue;
            };
            if value.is_empty() || value.contains('"') {
                continue;
            }
            let selector = Selector::new(format!("[{attr}=\"{value}\"]"));
            if self.accepted(&selector, node, SynthStrategy::Attribute).await {
                return Some(selector);
            }
        }
        None
    }

    async fn structural_path(&self, node: NodeId) -> Option<Selector> {
        let mut levels: Vec<String> = Vec::new();
        let mut current = node;

        loop {
            let tag = self.host.tag_name(current).await?;
            let mut level = tag.clone();

            if let Some(id) = self.host.attribute(current, "id").await.filter(|i| is_ident(i)) {
                // a unique ancestor id anchors the whole path
                levels.insert(0, format!("{tag}#{id}"));
                break;
            }

            if let Some(ordinal) = self.same_tag_ordinal(current, &tag).await {
                level.push_str(&format!(":nth-of-type({ordinal})"));
            }
            levels.insert(0, level);

            match self.host.parent(current).await {
                Some(parent) if levels.len() < MAX_PATH_DEPTH => current = parent,
                _ => break,
            }
        }

        Some(Selector::new(levels.join(" > ")))
    }

    /// 1-based ordinal among same-tag siblings; `None` when the node is
    /// the only child of its tag (no qualifier needed).
    async fn same_tag_ordinal(&self, node: NodeId, tag: &str) -> Option<usize> {
        let parent = self.host.parent(node).await?;
        let siblings = self.host.children(parent).await;
        let mut same_tag = 0;
        let mut ordinal = None;
        for sibling in siblings {
            if self.host.tag_name(sibling).await.as_deref() == Some(tag) {
                same_tag += 1;
                if sibling == node {
                    ordinal = Some(same_tag);
                }
            }
        }
        if same_tag > 1 {
            ordinal
        } else {
            None
        }
    }
}

/// Conservative identifier check; anything the selector dialect cannot
/// round-trip is skipped rather than escaped.
fn is_ident(value: &str) -> bool {
    !value.is_empty()
        && value
            .chars()
            .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
}
