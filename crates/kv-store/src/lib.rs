//! Persistence collaborator for the AdShield engine.
//!
//! The engine treats storage as an opaque, synchronous get/put service
//! that is durable across page reloads. Corrupted or missing values are
//! the caller's problem to default; this crate only moves JSON values.

pub mod errors;
pub mod file;
pub mod memory;

pub use errors::KvError;
pub use file::JsonFileKv;
pub use memory::MemoryKv;

use serde_json::Value;

/// Opaque key-value persistence port.
pub trait KvStore: Send + Sync {
    /// Fetch a value; `None` when the key is absent or unreadable.
    fn get(&self, key: &str) -> Option<Value>;

    /// Store a value durably.
    fn put(&self, key: &str, value: Value) -> Result<(), KvError>;
}
