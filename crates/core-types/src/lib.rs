use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Shared error type carried across the AdShield engine crates.
#[derive(Debug, Error, Clone)]
pub enum ShieldError {
    #[error("{message}")]
    Message { message: String },
}

impl ShieldError {
    pub fn new(message: impl Into<String>) -> Self {
        Self::Message {
            message: message.into(),
        }
    }
}

/// Opaque handle to an element in the host content tree.
///
/// The engine never owns the node; the handle may go stale at any time
/// and every host operation on a stale handle fails soft.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct NodeId(pub u64);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node#{}", self.0)
    }
}

/// Immutable identifier for a class of equivalent tree nodes.
///
/// An empty selector means synthesis failed (non-element input); it
/// resolves to an empty match set everywhere.
#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
pub struct Selector(String);

impl Selector {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn empty() -> Self {
        Self(String::new())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Selector {
    fn from(raw: &str) -> Self {
        Self(raw.to_string())
    }
}

/// Page origin (hostname); keys the per-origin exclusion sets.
#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
pub struct Origin(String);

impl Origin {
    pub fn new(hostname: impl Into<String>) -> Self {
        Self(hostname.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Bounding box of a node, in host layout units.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl BoundingBox {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn area(&self) -> f64 {
        self.width.max(0.0) * self.height.max(0.0)
    }
}

/// Host viewport dimensions.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    pub fn area(&self) -> f64 {
        self.width.max(0.0) * self.height.max(0.0)
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1280.0,
            height: 800.0,
        }
    }
}

/// Marker classes minted per session for the host style layer.
///
/// `hidden` marks manual suppression, `heuristic` marks reversible
/// heuristic suppression. Minted fresh each session so pages cannot
/// pre-bake countermeasures against a fixed class name.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct MarkerIds {
    pub hidden: String,
    pub heuristic: String,
}

impl MarkerIds {
    pub fn mint() -> Self {
        Self {
            hidden: mint_marker("ash"),
            heuristic: mint_marker("ash"),
        }
    }

    /// True when a class name was minted by this engine instance.
    pub fn owns(&self, class: &str) -> bool {
        class.contains(&self.hidden) || class.contains(&self.heuristic)
    }
}

fn mint_marker(prefix: &str) -> String {
    format!("_{}{}", prefix, Uuid::new_v4().simple())
}
