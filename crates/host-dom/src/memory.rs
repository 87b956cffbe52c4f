//! In-memory host tree.
//!
//! Arena of nodes behind a `parking_lot` lock, with a broadcast channel
//! standing in for the host's subtree-change subscription.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;
use tokio::sync::broadcast;

use adshield_core_types::{BoundingBox, NodeId, Origin, Selector, Viewport};

use crate::errors::HostError;
use crate::ports::{HostTree, MutationBatch};
use crate::selector::{AttrOp, Combinator, Compound, ParsedSelector};
use crate::snapshot::{NodeSpec, PageSnapshot};

const MUTATION_CHANNEL_CAPACITY: usize = 256;

#[derive(Clone, Debug)]
struct NodeData {
    tag: String,
    dom_id: Option<String>,
    classes: Vec<String>,
    attrs: HashMap<String, String>,
    bbox: Option<BoundingBox>,
    parent: Option<u64>,
    children: Vec<u64>,
    has_handler: bool,
    has_animation: bool,
}

#[derive(Debug, Default)]
struct DomInner {
    nodes: HashMap<u64, NodeData>,
    root: Option<u64>,
    next_id: u64,
}

impl DomInner {
    fn alloc(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    fn insert_spec(&mut self, parent: Option<u64>, spec: &NodeSpec, out: &mut Vec<NodeId>) -> u64 {
        let id = self.alloc();
        let data = NodeData {
            tag: spec.tag.to_ascii_lowercase(),
            dom_id: spec.id.clone(),
            classes: spec.classes.clone(),
            attrs: spec.attrs.clone(),
            bbox: spec.bbox,
            parent,
            children: Vec::new(),
            has_handler: spec.has_handler,
            has_animation: spec.has_animation,
        };
        self.nodes.insert(id, data);
        if let Some(parent_id) = parent {
            if let Some(parent_data) = self.nodes.get_mut(&parent_id) {
                parent_data.children.push(id);
            }
        } else {
            self.root = Some(id);
        }
        out.push(NodeId(id));
        for child in &spec.children {
            self.insert_spec(Some(id), child, out);
        }
        id
    }

    fn detach(&mut self, id: u64) {
        let Some(parent) = self.nodes.get(&id).and_then(|n| n.parent) else {
            return;
        };
        if let Some(parent_data) = self.nodes.get_mut(&parent) {
            parent_data.children.retain(|c| *c != id);
        }
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            if let Some(data) = self.nodes.remove(&current) {
                stack.extend(data.children);
            }
        }
    }

    /// Depth-first document order.
    fn document_order(&self) -> Vec<u64> {
        let mut out = Vec::with_capacity(self.nodes.len());
        let Some(root) = self.root else {
            return out;
        };
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            let Some(data) = self.nodes.get(&id) else {
                continue;
            };
            out.push(id);
            for child in data.children.iter().rev() {
                stack.push(*child);
            }
        }
        out
    }

    fn effective_attr(&self, data: &NodeData, name: &str) -> Option<String> {
        match name {
            "id" => data.dom_id.clone(),
            "class" => {
                if data.classes.is_empty() {
                    None
                } else {
                    Some(data.classes.join(" "))
                }
            }
            _ => data.attrs.get(name).cloned(),
        }
    }

    fn compound_matches(&self, id: u64, compound: &Compound) -> bool {
        let Some(data) = self.nodes.get(&id) else {
            return false;
        };
        if let Some(tag) = &compound.tag {
            if data.tag != *tag {
                return false;
            }
        }
        if let Some(wanted) = &compound.id {
            if data.dom_id.as_deref() != Some(wanted.as_str()) {
                return false;
            }
        }
        for class in &compound.classes {
            if !data.classes.iter().any(|c| c == class) {
                return false;
            }
        }
        for check in &compound.attrs {
            let actual = self.effective_attr(data, &check.name);
            let ok = match (check.op, &actual, &check.value) {
                (AttrOp::Exists, Some(_), _) => true,
                (AttrOp::Equals, Some(actual), Some(expected)) => actual == expected,
                (AttrOp::Contains, Some(actual), Some(expected)) => actual.contains(expected),
                _ => false,
            };
            if !ok {
                return false;
            }
        }
        if let Some(ordinal) = compound.ordinal {
            if self.same_tag_ordinal(id) != Some(ordinal) {
                return false;
            }
        }
        true
    }

    /// 1-based index among siblings sharing this node's tag.
    fn same_tag_ordinal(&self, id: u64) -> Option<usize> {
        let data = self.nodes.get(&id)?;
        let Some(parent) = data.parent else {
            return Some(1);
        };
        let siblings = &self.nodes.get(&parent)?.children;
        let mut index = 0;
        for sibling in siblings {
            let Some(sibling_data) = self.nodes.get(sibling) else {
                continue;
            };
            if sibling_data.tag == data.tag {
                index += 1;
            }
            if *sibling == id {
                return Some(index);
            }
        }
        None
    }

    fn chain_matches(&self, parts: &[(Combinator, Compound)], id: u64) -> bool {
        let Some(((combinator, compound), rest)) = parts.split_last() else {
            return true;
        };
        if !self.compound_matches(id, compound) {
            return false;
        }
        if rest.is_empty() {
            return true;
        }
        match combinator {
            Combinator::Subject => true,
            Combinator::Child => {
                let Some(parent) = self.nodes.get(&id).and_then(|n| n.parent) else {
                    return false;
                };
                self.chain_matches(rest, parent)
            }
            Combinator::Descendant => {
                let mut current = self.nodes.get(&id).and_then(|n| n.parent);
                while let Some(ancestor) = current {
                    if self.chain_matches(rest, ancestor) {
                        return true;
                    }
                    current = self.nodes.get(&ancestor).and_then(|n| n.parent);
                }
                false
            }
        }
    }
}

/// In-memory [`HostTree`] implementation.
pub struct MemoryDom {
    inner: RwLock<DomInner>,
    origin: Origin,
    viewport: Viewport,
    mutations: broadcast::Sender<MutationBatch>,
}

impl MemoryDom {
    pub fn new(origin: Origin, viewport: Viewport) -> Self {
        let (mutations, _) = broadcast::channel(MUTATION_CHANNEL_CAPACITY);
        Self {
            inner: RwLock::new(DomInner::default()),
            origin,
            viewport,
            mutations,
        }
    }

    pub fn from_snapshot(snapshot: &PageSnapshot) -> (Self, NodeId) {
        let dom = Self::new(Origin::new(snapshot.origin.clone()), snapshot.viewport);
        let root = dom.insert(None, &snapshot.root);
        (dom, root)
    }

    /// Insert a subtree and broadcast the inserted handles as one
    /// mutation batch. With no parent the subtree becomes the document
    /// root (or a root child if one already exists).
    pub fn insert(&self, parent: Option<NodeId>, spec: &NodeSpec) -> NodeId {
        let mut inserted = Vec::new();
        let id = {
            let mut inner = self.inner.write();
            let parent_id = match parent {
                Some(NodeId(p)) if inner.nodes.contains_key(&p) => Some(p),
                Some(_) | None => inner.root,
            };
            inner.insert_spec(parent_id, spec, &mut inserted)
        };
        let _ = self.mutations.send(MutationBatch {
            inserted: inserted.clone(),
        });
        NodeId(id)
    }

    /// Detach a node and its subtree; further operations on those
    /// handles fail soft.
    pub fn detach(&self, node: NodeId) {
        self.inner.write().detach(node.0);
    }

    pub fn node_count(&self) -> usize {
        self.inner.read().nodes.len()
    }
}

#[async_trait]
impl HostTree for MemoryDom {
    async fn query(&self, selector: &Selector) -> Result<Vec<NodeId>, HostError> {
        if selector.is_empty() {
            return Ok(Vec::new());
        }
        let parsed = ParsedSelector::parse(selector.as_str())?;
        let inner = self.inner.read();
        Ok(inner
            .document_order()
            .into_iter()
            .filter(|id| inner.chain_matches(&parsed.parts, *id))
            .map(NodeId)
            .collect())
    }

    async fn matches(&self, node: NodeId, selector: &Selector) -> bool {
        if selector.is_empty() {
            return false;
        }
        let Ok(parsed) = ParsedSelector::parse(selector.as_str()) else {
            return false;
        };
        self.inner.read().chain_matches(&parsed.parts, node.0)
    }

    async fn attributes(&self, node: NodeId) -> HashMap<String, String> {
        let inner = self.inner.read();
        let Some(data) = inner.nodes.get(&node.0) else {
            return HashMap::new();
        };
        let mut attrs = data.attrs.clone();
        if let Some(id) = &data.dom_id {
            attrs.insert("id".into(), id.clone());
        }
        if !data.classes.is_empty() {
            attrs.insert("class".into(), data.classes.join(" "));
        }
        attrs
    }

    async fn attribute(&self, node: NodeId, name: &str) -> Option<String> {
        let inner = self.inner.read();
        let data = inner.nodes.get(&node.0)?;
        inner.effective_attr(data, name)
    }

    async fn class_list(&self, node: NodeId) -> Vec<String> {
        self.inner
            .read()
            .nodes
            .get(&node.0)
            .map(|data| data.classes.clone())
            .unwrap_or_default()
    }

    async fn add_class(&self, node: NodeId, class: &str) {
        let mut inner = self.inner.write();
        if let Some(data) = inner.nodes.get_mut(&node.0) {
            if !data.classes.iter().any(|c| c == class) {
                data.classes.push(class.to_string());
            }
        }
    }

    async fn remove_class(&self, node: NodeId, class: &str) {
        let mut inner = self.inner.write();
        if let Some(data) = inner.nodes.get_mut(&node.0) {
            data.classes.retain(|c| c != class);
        }
    }

    async fn tag_name(&self, node: NodeId) -> Option<String> {
        self.inner
            .read()
            .nodes
            .get(&node.0)
            .map(|data| data.tag.clone())
    }

    async fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.inner
            .read()
            .nodes
            .get(&node.0)
            .and_then(|data| data.parent)
            .map(NodeId)
    }

    async fn children(&self, node: NodeId) -> Vec<NodeId> {
        self.inner
            .read()
            .nodes
            .get(&node.0)
            .map(|data| data.children.iter().copied().map(NodeId).collect())
            .unwrap_or_default()
    }

    async fn next_sibling(&self, node: NodeId) -> Option<NodeId> {
        let inner = self.inner.read();
        let parent = inner.nodes.get(&node.0)?.parent?;
        let siblings = &inner.nodes.get(&parent)?.children;
        let position = siblings.iter().position(|c| *c == node.0)?;
        siblings.get(position + 1).copied().map(NodeId)
    }

    async fn bounding_box(&self, node: NodeId) -> Option<BoundingBox> {
        self.inner
            .read()
            .nodes
            .get(&node.0)
            .and_then(|data| data.bbox)
    }

    async fn has_interaction_handler(&self, node: NodeId) -> bool {
        self.inner
            .read()
            .nodes
            .get(&node.0)
            .map(|data| data.has_handler)
            .unwrap_or(false)
    }

    async fn has_animation(&self, node: NodeId) -> bool {
        self.inner
            .read()
            .nodes
            .get(&node.0)
            .map(|data| data.has_animation)
            .unwrap_or(false)
    }

    async fn is_attached(&self, node: NodeId) -> bool {
        self.inner.read().nodes.contains_key(&node.0)
    }

    async fn viewport(&self) -> Viewport {
        self.viewport
    }

    async fn origin(&self) -> Origin {
        self.origin.clone()
    }

    fn subscribe_mutations(&self) -> broadcast::Receiver<MutationBatch> {
        self.mutations.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_dom() -> (MemoryDom, NodeId) {
        let root = NodeSpec::new("body")
            .with_child(
                NodeSpec::new("main").with_id("content").with_child(
                    NodeSpec::new("article").with_classes(&["post", "featured"]),
                ),
            )
            .with_child(
                NodeSpec::new("aside")
                    .with_classes(&["ad-banner", "sidebar"])
                    .with_attr("role", "complementary"),
            )
            .with_child(NodeSpec::new("aside").with_classes(&["sidebar"]));
        let dom = MemoryDom::new(Origin::new("example.com"), Viewport::default());
        let root_id = dom.insert(None, &root);
        (dom, root_id)
    }

    #[tokio::test]
    async fn queries_by_id_class_and_attribute() {
        let (dom, _) = sample_dom();
        assert_eq!(dom.query(&Selector::new("#content")).await.unwrap().len(), 1);
        assert_eq!(
            dom.query(&Selector::new(".ad-banner.sidebar"))
                .await
                .unwrap()
                .len(),
            1
        );
        assert_eq!(
            dom.query(&Selector::new(r#"[role="complementary"]"#))
                .await
                .unwrap()
                .len(),
            1
        );
        assert_eq!(dom.query(&Selector::new("aside")).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn nth_of_type_counts_same_tag_siblings() {
        let (dom, _) = sample_dom();
        let second = dom
            .query(&Selector::new("body > aside:nth-of-type(2)"))
            .await
            .unwrap();
        assert_eq!(second.len(), 1);
        let classes = dom.class_list(second[0]).await;
        assert_eq!(classes, vec!["sidebar"]);
    }

    #[tokio::test]
    async fn invalid_selector_is_an_error_empty_selector_is_not() {
        let (dom, _) = sample_dom();
        assert!(dom.query(&Selector::new(":hover")).await.is_err());
        assert!(dom.query(&Selector::empty()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn detached_nodes_fail_soft() {
        let (dom, _) = sample_dom();
        let aside = dom.query(&Selector::new(".ad-banner")).await.unwrap()[0];
        dom.detach(aside);
        assert!(!dom.is_attached(aside).await);
        assert!(dom.attributes(aside).await.is_empty());
        assert!(dom.bounding_box(aside).await.is_none());
        assert!(dom.query(&Selector::new(".ad-banner")).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn insert_broadcasts_mutation_batch() {
        let (dom, root) = sample_dom();
        let mut rx = dom.subscribe_mutations();
        dom.insert(Some(root), &NodeSpec::new("div").with_classes(&["late-ad"]));
        let batch = rx.recv().await.unwrap();
        assert_eq!(batch.inserted.len(), 1);
    }
}
