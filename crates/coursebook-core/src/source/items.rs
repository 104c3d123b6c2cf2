use std::future::Future;
use std::time::Duration;

use tracing::debug;

use super::{entity_number, simulate_latency, DataSource, Page};
use crate::config::DEFAULT_FETCH_DELAY_MS;
use crate::error::FetchError;
use crate::models::Item;

/// Items per page in the plain list demo.
pub const ITEM_PAGE_SIZE: usize = 20;

/// Pages of items served before `has_more` turns false.
pub const ITEM_MAX_PAGES: u32 = 5;

/// Deterministic source of numbered [`Item`]s.
#[derive(Debug, Clone)]
pub struct ItemSource {
    max_pages: u32,
    delay: Duration,
}

impl Default for ItemSource {
    fn default() -> Self {
        Self {
            max_pages: ITEM_MAX_PAGES,
            delay: Duration::from_millis(DEFAULT_FETCH_DELAY_MS),
        }
    }
}

impl ItemSource {
    pub fn new(max_pages: u32, delay: Duration) -> Self {
        Self { max_pages, delay }
    }

    pub fn max_pages(&self) -> u32 {
        self.max_pages
    }
}

impl DataSource for ItemSource {
    type Entity = Item;

    fn fetch_page(
        &self,
        page: u32,
        page_size: usize,
    ) -> impl Future<Output = Result<Page<Item>, FetchError>> + Send {
        let max_pages = self.max_pages;
        let delay = self.delay;
        async move {
            if page == 0 {
                return Err(FetchError::PageOutOfRange(page));
            }
            simulate_latency(delay).await;

            let entities = if page <= max_pages {
                (0..page_size)
                    .map(|i| Item::numbered(entity_number(page, page_size, i)))
                    .collect()
            } else {
                Vec::new()
            };
            debug!(page, count = entities.len(), "Generated items");

            Ok(Page {
                page,
                entities,
                has_more: page < max_pages,
            })
        }
    }
}
