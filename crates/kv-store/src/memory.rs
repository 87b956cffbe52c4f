use std::collections::HashMap;

use parking_lot::RwLock;
use serde_json::Value;

use crate::{KvError, KvStore};

/// In-memory store for unit tests and single-session runs.
#[derive(Debug, Default)]
pub struct MemoryKv {
    map: RwLock<HashMap<String, Value>>,
}

impl MemoryKv {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KvStore for MemoryKv {
    fn get(&self, key: &str) -> Option<Value> {
        self.map.read().get(key).cloned()
    }

    fn put(&self, key: &str, value: Value) -> Result<(), KvError> {
        self.map.write().insert(key.to_string(), value);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn roundtrips_values() {
        let kv = MemoryKv::new();
        assert!(kv.get("missing").is_none());
        kv.put("threshold", json!(0.75)).unwrap();
        assert_eq!(kv.get("threshold"), Some(json!(0.75)));
    }
}
