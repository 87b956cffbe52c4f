//! Host content-tree boundary.
//!
//! The engine only sees the tree through the [`HostTree`] port: selector
//! resolution, geometry, attributes, marker-class toggling and a
//! mutation subscription. [`MemoryDom`] implements the port over an
//! in-process node arena and backs both the test suites and the CLI's
//! snapshot scans.

pub mod errors;
pub mod memory;
pub mod ports;
pub mod selector;
pub mod snapshot;

pub use errors::HostError;
pub use memory::MemoryDom;
pub use ports::{HostTree, MutationBatch};
pub use selector::ParsedSelector;
pub use snapshot::{NodeSpec, PageSnapshot};
