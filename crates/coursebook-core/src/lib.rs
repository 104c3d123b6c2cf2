//! coursebook-core: paginated, cached student and course lists.
//!
//! This crate holds the state management behind a student/course list UI:
//!
//! - `source`: paginated mock data sources with simulated latency
//! - `cache`: a persisted cache of the accumulated list, surviving restarts
//! - `staleness`: when a cached list must be refreshed
//! - `controller`: first load, pull-to-refresh and load-more on scroll
//! - `filter`: search and category grouping for display
//!
//! A typical session opens a `FileStore` in the cache directory, builds a
//! `PaginationController` over a data source, spawns it, and drives the
//! returned `ListHandle` from the presentation layer.

pub mod cache;
pub mod config;
pub mod controller;
pub mod error;
pub mod filter;
pub mod models;
pub mod source;
pub mod staleness;

pub use cache::{CacheKeys, CacheRecord, FileStore, KeyValueStore, MemoryStore, PersistedCache};
pub use config::Config;
pub use controller::{
    Command, Footer, ListHandle, ListSnapshot, ListState, Outcome, PaginationController,
    PendingRequest, RejectReason,
};
pub use error::{ControllerError, FetchError, StorageError};
pub use filter::{course_sections, filter_by_text, group_by_category, Section};
pub use models::{Categorized, Course, CourseCategory, Entity, Item, Searchable, Student};
pub use source::{DataSource, ItemSource, MockStudentSource, Page};
pub use staleness::{is_stale, StalenessPolicy};
