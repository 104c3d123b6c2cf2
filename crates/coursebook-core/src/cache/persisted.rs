use std::marker::PhantomData;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::error::StorageError;
use crate::models::Entity;

use super::store::KeyValueStore;

/// Fixed storage keys for one paginated list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheKeys {
    pub entities: &'static str,
    pub page: &'static str,
    pub has_more: &'static str,
    pub last_refresh: &'static str,
    /// Prefix for single-entity entries, `<prefix>_<id>`
    pub entity_prefix: &'static str,
}

impl CacheKeys {
    pub const STUDENTS: CacheKeys = CacheKeys {
        entities: "students_data",
        page: "student_page",
        has_more: "student_has_more",
        last_refresh: "last_refresh",
        entity_prefix: "student",
    };

    pub const ITEMS: CacheKeys = CacheKeys {
        entities: "items_data",
        page: "item_page",
        has_more: "item_has_more",
        last_refresh: "items_last_refresh",
        entity_prefix: "item",
    };

    fn list_keys(&self) -> [&'static str; 4] {
        [self.entities, self.page, self.has_more, self.last_refresh]
    }

    fn entity_key(&self, id: &str) -> String {
        format!("{}_{}", self.entity_prefix, id)
    }
}

/// Persisted mirror of a list's page state.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheRecord<T> {
    pub entities: Vec<T>,
    pub page: u32,
    pub has_more: bool,
    pub last_refresh: Option<DateTime<Utc>>,
}

impl<T> Default for CacheRecord<T> {
    fn default() -> Self {
        Self {
            entities: Vec::new(),
            page: 1,
            has_more: true,
            last_refresh: None,
        }
    }
}

impl<T> CacheRecord<T> {
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

/// Typed view of one list's entries in a [`KeyValueStore`].
pub struct PersistedCache<S, T> {
    store: Arc<S>,
    keys: CacheKeys,
    _entity: PhantomData<fn() -> T>,
}

impl<S, T> Clone for PersistedCache<S, T> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            keys: self.keys,
            _entity: PhantomData,
        }
    }
}

impl<S: KeyValueStore, T: Entity> PersistedCache<S, T> {
    pub fn new(store: Arc<S>, keys: CacheKeys) -> Self {
        Self {
            store,
            keys,
            _entity: PhantomData,
        }
    }

    pub fn keys(&self) -> CacheKeys {
        self.keys
    }

    /// Load the cached list. Missing or unreadable data yields the default record.
    pub fn read(&self) -> CacheRecord<T> {
        match self.try_read() {
            Ok(record) => record,
            Err(e) => {
                warn!(key = self.keys.entities, error = %e, "Failed to load cached list, starting empty");
                CacheRecord::default()
            }
        }
    }

    fn try_read(&self) -> Result<CacheRecord<T>, StorageError> {
        let values = self.store.get_many(&self.keys.list_keys())?;
        let [entities, page, has_more, last_refresh]: [Option<String>; 4] =
            values.try_into().map_err(|_| StorageError::Corrupt {
                key: self.keys.entities.to_string(),
                reason: "store returned wrong number of values".to_string(),
            })?;

        let entities = match entities {
            Some(json) => serde_json::from_str(&json).map_err(|e| StorageError::Corrupt {
                key: self.keys.entities.to_string(),
                reason: e.to_string(),
            })?,
            None => Vec::new(),
        };

        let page = match page {
            Some(raw) => match raw.trim().parse::<u32>() {
                Ok(p) if p >= 1 => p,
                _ => {
                    return Err(StorageError::Corrupt {
                        key: self.keys.page.to_string(),
                        reason: format!("invalid page number '{}'", raw),
                    })
                }
            },
            None => 1,
        };

        let has_more = has_more
            .filter(|raw| !raw.is_empty())
            .map(|raw| raw == "true")
            .unwrap_or(true);

        let last_refresh = last_refresh.and_then(|raw| match DateTime::parse_from_rfc3339(&raw) {
            Ok(ts) => Some(ts.with_timezone(&Utc)),
            Err(e) => {
                debug!(key = self.keys.last_refresh, error = %e, "Ignoring unparseable refresh timestamp");
                None
            }
        });

        Ok(CacheRecord {
            entities,
            page,
            has_more,
            last_refresh,
        })
    }

    /// Replace all four list entries in one store operation.
    ///
    /// A record without a timestamp is stamped with the current time.
    pub fn write(&self, record: &CacheRecord<T>) -> Result<(), StorageError> {
        let last_refresh = record.last_refresh.unwrap_or_else(Utc::now);
        let entries = [
            (self.keys.entities, serde_json::to_string(&record.entities)?),
            (self.keys.page, record.page.to_string()),
            (self.keys.has_more, record.has_more.to_string()),
            (self.keys.last_refresh, last_refresh.to_rfc3339()),
        ];
        self.store.set_many(&entries)?;
        debug!(
            key = self.keys.entities,
            count = record.entities.len(),
            page = record.page,
            has_more = record.has_more,
            "Saved list to cache"
        );
        Ok(())
    }

    /// Remove all four list entries.
    pub fn clear(&self) -> Result<(), StorageError> {
        self.store.remove_many(&self.keys.list_keys())
    }

    pub fn save_entity(&self, entity: &T) -> Result<(), StorageError> {
        let json = serde_json::to_string(entity)?;
        self.store.set(&self.keys.entity_key(entity.id()), json)
    }

    /// Load a single saved entity. Missing or unreadable entries yield `None`.
    pub fn load_entity(&self, id: &str) -> Option<T> {
        let key = self.keys.entity_key(id);
        let raw = match self.store.get(&key) {
            Ok(raw) => raw?,
            Err(e) => {
                warn!(%key, error = %e, "Failed to load cached entity");
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(entity) => Some(entity),
            Err(e) => {
                warn!(%key, error = %e, "Failed to parse cached entity");
                None
            }
        }
    }
}
