use std::collections::HashMap;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use parking_lot::RwLock;
use serde_json::Value;
use tracing::warn;

use crate::{KvError, KvStore};

/// Single-file JSON store.
///
/// The whole map is rewritten atomically (tmp then rename) on every put
/// so a crash never leaves a half-written document behind.
#[derive(Debug)]
pub struct JsonFileKv {
    path: PathBuf,
    cache: RwLock<HashMap<String, Value>>,
}

impl JsonFileKv {
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let cache = match fs::read(&path) {
            Ok(bytes) => match serde_json::from_slice::<HashMap<String, Value>>(&bytes) {
                Ok(map) => map,
                Err(err) => {
                    warn!(path = %path.display(), "corrupt store, starting empty: {}", err);
                    HashMap::new()
                }
            },
            Err(_) => HashMap::new(),
        };
        Self {
            path,
            cache: RwLock::new(cache),
        }
    }

    fn write_atomic(path: &Path, data: &[u8]) -> Result<(), KvError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let tmp = path.with_extension("tmp");
        let mut file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&tmp)?;
        file.write_all(data)?;
        file.sync_all()?;
        fs::rename(tmp, path)?;
        Ok(())
    }
}

impl KvStore for JsonFileKv {
    fn get(&self, key: &str) -> Option<Value> {
        self.cache.read().get(key).cloned()
    }

    fn put(&self, key: &str, value: Value) -> Result<(), KvError> {
        let snapshot = {
            let mut cache = self.cache.write();
            cache.insert(key.to_string(), value);
            cache.clone()
        };
        let data =
            serde_json::to_vec_pretty(&snapshot).map_err(|err| KvError::Encode(err.to_string()))?;
        Self::write_atomic(&self.path, &data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");
        {
            let kv = JsonFileKv::open(&path);
            kv.put("rules", json!(["#ad"])).unwrap();
        }
        let kv = JsonFileKv::open(&path);
        assert_eq!(kv.get("rules"), Some(json!(["#ad"])));
    }

    #[test]
    fn corrupt_file_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");
        fs::write(&path, b"not json").unwrap();
        let kv = JsonFileKv::open(&path);
        assert!(kv.get("rules").is_none());
    }
}
