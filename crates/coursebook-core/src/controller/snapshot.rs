use chrono::{DateTime, Utc};

use crate::staleness::age_display;

/// Activity of a list controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ListState {
    #[default]
    Idle,
    Refreshing,
    LoadingMore,
}

/// What the end-of-list footer should show.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Footer {
    /// A page append is in flight
    Loading,
    /// Every page has been loaded
    NoMore,
    Hidden,
}

/// Result of a controller operation that completed without a fetch error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Startup served the persisted list without fetching
    FromCache,
    /// Page 1 replaced the list
    Refreshed { count: usize },
    /// The next page was appended
    Appended { count: usize },
    /// The request was a no-op
    Rejected(RejectReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// Another operation was in flight
    Busy,
    /// No more pages to load
    Exhausted,
}

/// List state as seen by the presentation layer.
#[derive(Debug, Clone, PartialEq)]
pub struct ListSnapshot<T> {
    pub entities: Vec<T>,
    pub page: u32,
    pub has_more: bool,
    pub refreshing: bool,
    pub loading_more: bool,
    pub last_refresh: Option<DateTime<Utc>>,
    /// User-visible message from the last failed operation
    pub notice: Option<String>,
}

impl<T> Default for ListSnapshot<T> {
    fn default() -> Self {
        Self {
            entities: Vec::new(),
            page: 1,
            has_more: true,
            refreshing: false,
            loading_more: false,
            last_refresh: None,
            notice: None,
        }
    }
}

impl<T> ListSnapshot<T> {
    pub fn state(&self) -> ListState {
        if self.refreshing {
            ListState::Refreshing
        } else if self.loading_more {
            ListState::LoadingMore
        } else {
            ListState::Idle
        }
    }

    pub fn footer(&self) -> Footer {
        if self.loading_more {
            Footer::Loading
        } else if !self.has_more && !self.entities.is_empty() {
            Footer::NoMore
        } else {
            Footer::Hidden
        }
    }

    /// "Updated ..." label for the list header.
    pub fn updated_display(&self, now: DateTime<Utc>) -> String {
        age_display(self.last_refresh, now)
    }
}
