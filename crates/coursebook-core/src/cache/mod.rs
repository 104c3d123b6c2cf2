//! Local persisted cache for paginated lists.
//!
//! This module provides `PersistedCache`, a typed view over a flat
//! `KeyValueStore`. Each list is stored as four entries (entities JSON,
//! page, has-more flag, refresh timestamp) written together, so a restart
//! resumes from the last successful fetch.
//!
//! Backends:
//! - `FileStore`: one JSON file in the cache directory
//! - `MemoryStore`: in-process, for tests and diskless sessions

pub mod persisted;
pub mod store;

pub use persisted::{CacheKeys, CacheRecord, PersistedCache};
pub use store::{FileStore, KeyValueStore, MemoryStore};
