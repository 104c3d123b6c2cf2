//! Key-value storage backends for the persisted cache.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::{debug, warn};

use crate::error::StorageError;

/// Store file name inside the cache directory
const STORE_FILE: &str = "store.json";

/// Flat string-to-string storage with multi-key operations.
///
/// `set_many` and `remove_many` apply all keys together: a reader never
/// observes some of the entries updated and others not.
pub trait KeyValueStore: Send + Sync {
    /// Values for `keys`, in the same order. Missing keys are `None`.
    fn get_many(&self, keys: &[&str]) -> Result<Vec<Option<String>>, StorageError>;

    fn set_many(&self, entries: &[(&str, String)]) -> Result<(), StorageError>;

    fn remove_many(&self, keys: &[&str]) -> Result<(), StorageError>;

    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.get_many(&[key])?.into_iter().next().flatten())
    }

    fn set(&self, key: &str, value: String) -> Result<(), StorageError> {
        self.set_many(&[(key, value)])
    }
}

/// In-process store. Contents are lost when dropped.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    fn get_many(&self, keys: &[&str]) -> Result<Vec<Option<String>>, StorageError> {
        let entries = self.entries();
        Ok(keys.iter().map(|k| entries.get(*k).cloned()).collect())
    }

    fn set_many(&self, new_entries: &[(&str, String)]) -> Result<(), StorageError> {
        let mut entries = self.entries();
        for (key, value) in new_entries {
            entries.insert((*key).to_string(), value.clone());
        }
        Ok(())
    }

    fn remove_many(&self, keys: &[&str]) -> Result<(), StorageError> {
        let mut entries = self.entries();
        for key in keys {
            entries.remove(*key);
        }
        Ok(())
    }
}

/// Store backed by a single JSON object file.
///
/// Every mutation rewrites the whole file through a temporary file and a
/// rename, so the on-disk state is always either the old or the new map.
pub struct FileStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileStore {
    /// Open (or create) the store in `cache_dir`.
    pub fn open(cache_dir: impl AsRef<Path>) -> Result<Self, StorageError> {
        let cache_dir = cache_dir.as_ref();
        std::fs::create_dir_all(cache_dir)?;
        Ok(Self {
            path: cache_dir.join(STORE_FILE),
            lock: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load_map(&self) -> Result<HashMap<String, String>, StorageError> {
        if !self.path.exists() {
            return Ok(HashMap::new());
        }
        let contents = std::fs::read_to_string(&self.path)?;
        serde_json::from_str(&contents).map_err(|e| StorageError::Corrupt {
            key: STORE_FILE.to_string(),
            reason: e.to_string(),
        })
    }

    /// Load for a read-modify-write. A corrupt file is discarded.
    fn load_map_for_update(&self) -> Result<HashMap<String, String>, StorageError> {
        match self.load_map() {
            Err(StorageError::Corrupt { reason, .. }) => {
                warn!(path = %self.path.display(), %reason, "Discarding corrupt store file");
                Ok(HashMap::new())
            }
            other => other,
        }
    }

    fn save_map(&self, map: &HashMap<String, String>) -> Result<(), StorageError> {
        let tmp = self.path.with_extension("json.tmp");
        let contents = serde_json::to_string(map)?;
        std::fs::write(&tmp, contents)?;
        std::fs::rename(&tmp, &self.path)?;
        debug!(path = %self.path.display(), keys = map.len(), "Wrote store file");
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get_many(&self, keys: &[&str]) -> Result<Vec<Option<String>>, StorageError> {
        let _guard = self.lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let map = self.load_map()?;
        Ok(keys.iter().map(|k| map.get(*k).cloned()).collect())
    }

    fn set_many(&self, entries: &[(&str, String)]) -> Result<(), StorageError> {
        let _guard = self.lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let mut map = self.load_map_for_update()?;
        for (key, value) in entries {
            map.insert((*key).to_string(), value.clone());
        }
        self.save_map(&map)
    }

    fn remove_many(&self, keys: &[&str]) -> Result<(), StorageError> {
        let _guard = self.lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let mut map = self.load_map_for_update()?;
        let before = map.len();
        for key in keys {
            map.remove(*key);
        }
        if map.len() == before {
            return Ok(());
        }
        self.save_map(&map)
    }
}
