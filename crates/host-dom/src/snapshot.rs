//! Serializable page snapshot loaded into a [`MemoryDom`](crate::MemoryDom).

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use adshield_core_types::{BoundingBox, Viewport};

/// A whole page: origin, viewport and the element tree.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PageSnapshot {
    pub origin: String,
    #[serde(default)]
    pub viewport: Viewport,
    pub root: NodeSpec,
}

/// One element in a snapshot document.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NodeSpec {
    pub tag: String,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub classes: Vec<String>,
    #[serde(default)]
    pub attrs: HashMap<String, String>,
    #[serde(default)]
    pub bbox: Option<BoundingBox>,
    #[serde(default)]
    pub has_handler: bool,
    #[serde(default)]
    pub has_animation: bool,
    #[serde(default)]
    pub children: Vec<NodeSpec>,
}

impl NodeSpec {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            id: None,
            classes: Vec::new(),
            attrs: HashMap::new(),
            bbox: None,
            has_handler: false,
            has_animation: false,
            children: Vec::new(),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_classes(mut self, classes: &[&str]) -> Self {
        self.classes = classes.iter().map(|c| c.to_string()).collect();
        self
    }

    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.insert(name.into(), value.into());
        self
    }

    pub fn with_bbox(mut self, x: f64, y: f64, width: f64, height: f64) -> Self {
        self.bbox = Some(BoundingBox::new(x, y, width, height));
        self
    }

    pub fn with_handler(mut self) -> Self {
        self.has_handler = true;
        self
    }

    pub fn with_animation(mut self) -> Self {
        self.has_animation = true;
        self
    }

    pub fn with_child(mut self, child: NodeSpec) -> Self {
        self.children.push(child);
        self
    }
}
