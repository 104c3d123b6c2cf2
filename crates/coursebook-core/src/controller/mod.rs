//! Pagination controller.
//!
//! `PaginationController` owns the in-memory page state of one list and keeps
//! it in step with the persisted cache:
//!
//! - startup serves the cached list, refreshing first if it is empty or stale
//! - refresh fetches page 1 and replaces list and cache together
//! - load-more fetches the next page and appends to list and cache together
//!
//! A failed fetch leaves both untouched and sets a notice on the snapshot.
//! State changes are published on a `watch` channel. For use from several
//! call sites, [`PaginationController::spawn`] moves the controller into a task
//! behind a [`ListHandle`] command queue.

mod handle;
mod snapshot;

pub use handle::{Command, ListHandle, PendingRequest};
pub use snapshot::{Footer, ListSnapshot, ListState, Outcome, RejectReason};

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::cache::{CacheRecord, KeyValueStore, PersistedCache};
use crate::config::Config;
use crate::error::{ControllerError, StorageError};
use crate::models::Entity;
use crate::source::{DataSource, Page};
use crate::staleness::StalenessPolicy;

pub struct PaginationController<D: DataSource, S> {
    source: D,
    cache: PersistedCache<S, D::Entity>,
    staleness: StalenessPolicy,
    page_size: usize,
    state: ListState,
    /// In-memory page state, same shape as what is persisted
    record: CacheRecord<D::Entity>,
    seen: HashSet<String>,
    notice: Option<String>,
    updates: watch::Sender<ListSnapshot<D::Entity>>,
}

impl<D, S> PaginationController<D, S>
where
    D: DataSource,
    S: KeyValueStore + 'static,
{
    pub fn new(source: D, cache: PersistedCache<S, D::Entity>, config: &Config) -> Self {
        let (updates, _) = watch::channel(ListSnapshot::default());
        Self {
            source,
            cache,
            staleness: StalenessPolicy::new(config.stale_after()),
            page_size: config.page_size,
            state: ListState::Idle,
            record: CacheRecord::default(),
            seen: HashSet::new(),
            notice: None,
            updates,
        }
    }

    /// Override the page size from `config`.
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn subscribe(&self) -> watch::Receiver<ListSnapshot<D::Entity>> {
        self.updates.subscribe()
    }

    pub fn snapshot(&self) -> ListSnapshot<D::Entity> {
        self.updates.borrow().clone()
    }

    pub fn state(&self) -> ListState {
        self.state
    }

    fn publish(&self) {
        self.updates.send_replace(ListSnapshot {
            entities: self.record.entities.clone(),
            page: self.record.page,
            has_more: self.record.has_more,
            refreshing: self.state == ListState::Refreshing,
            loading_more: self.state == ListState::LoadingMore,
            last_refresh: self.record.last_refresh,
            notice: self.notice.clone(),
        });
    }

    fn persist(&self) {
        if let Err(e) = self.cache.write(&self.record) {
            // The list stays usable for this session
            warn!(error = %e, "Failed to save list to cache");
        }
    }

    /// Serve the persisted list, refreshing first if it is empty or stale.
    pub async fn startup(&mut self) -> Result<Outcome, ControllerError> {
        let cached = self.cache.read();
        let stale = self.staleness.is_stale(cached.last_refresh, Utc::now());

        if !cached.is_empty() {
            self.seen = cached.entities.iter().map(|e| e.id().to_string()).collect();
            self.record = cached;
            self.publish();
            debug!(
                count = self.record.entities.len(),
                page = self.record.page,
                stale,
                "Loaded list from cache"
            );
            if !stale {
                return Ok(Outcome::FromCache);
            }
        }

        info!(empty = self.record.is_empty(), "Cached list missing or stale, refreshing");
        self.refresh().await
    }

    /// Fetch page 1 and replace the list.
    pub async fn refresh(&mut self) -> Result<Outcome, ControllerError> {
        self.state = ListState::Refreshing;
        self.notice = None;
        self.publish();

        let page = match self.fetch(1).await {
            Ok(page) => page,
            Err(e) => return Err(self.fail(e)),
        };

        let mut seen = HashSet::with_capacity(page.entities.len());
        let entities: Vec<D::Entity> = page
            .entities
            .into_iter()
            .filter(|e| seen.insert(e.id().to_string()))
            .collect();
        let count = entities.len();

        self.record = CacheRecord {
            entities,
            page: 1,
            has_more: page.has_more,
            last_refresh: Some(next_stamp(self.record.last_refresh, Utc::now())),
        };
        self.seen = seen;
        self.state = ListState::Idle;
        self.persist();
        self.publish();

        info!(count, has_more = self.record.has_more, "Refreshed list");
        Ok(Outcome::Refreshed { count })
    }

    /// Fetch the next page and append it. A no-op while busy or after the last page.
    pub async fn load_more(&mut self) -> Result<Outcome, ControllerError> {
        if self.state != ListState::Idle {
            debug!(state = ?self.state, "Ignoring load-more while busy");
            return Ok(Outcome::Rejected(RejectReason::Busy));
        }
        let next = match self.record.page.checked_add(1) {
            Some(next) if self.record.has_more => next,
            _ => {
                debug!(page = self.record.page, "Ignoring load-more, no more pages");
                return Ok(Outcome::Rejected(RejectReason::Exhausted));
            }
        };

        self.state = ListState::LoadingMore;
        self.notice = None;
        self.publish();

        let page = match self.fetch(next).await {
            Ok(page) => page,
            Err(e) => return Err(self.fail(e)),
        };

        let before = self.record.entities.len();
        for entity in page.entities {
            if self.seen.insert(entity.id().to_string()) {
                self.record.entities.push(entity);
            } else {
                warn!(id = entity.id(), page = next, "Dropping duplicate entity");
            }
        }
        let count = self.record.entities.len() - before;

        self.record.page = next;
        self.record.has_more = page.has_more;
        self.state = ListState::Idle;
        self.persist();
        self.publish();

        debug!(page = next, count, has_more = self.record.has_more, "Appended page");
        Ok(Outcome::Appended { count })
    }

    /// Drop the persisted list and reset to an empty first page.
    pub fn clear(&mut self) -> Result<(), StorageError> {
        self.cache.clear()?;
        self.record = CacheRecord::default();
        self.seen.clear();
        self.notice = None;
        self.publish();
        Ok(())
    }

    async fn fetch(&self, page: u32) -> Result<Page<D::Entity>, ControllerError> {
        Ok(self.source.fetch_page(page, self.page_size).await?)
    }

    /// Return to idle with the prior list intact.
    fn fail(&mut self, error: ControllerError) -> ControllerError {
        warn!(error = %error, state = ?self.state, "Fetch failed, keeping previous list");
        self.state = ListState::Idle;
        self.notice = Some(error.notice());
        self.publish();
        error
    }
}

/// Refresh timestamps never move backwards.
fn next_stamp(previous: Option<DateTime<Utc>>, now: DateTime<Utc>) -> DateTime<Utc> {
    match previous {
        Some(prev) if prev > now => prev,
        _ => now,
    }
}
