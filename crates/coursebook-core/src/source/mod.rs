//! Paginated data sources.
//!
//! A [`DataSource`] returns one page of entities at a time after a simulated
//! delay. The controller treats it as a black box: the only contract is the
//! page size and the `has_more` flag.

pub mod items;
pub mod students;

pub use items::ItemSource;
pub use students::MockStudentSource;

use std::future::Future;
use std::time::Duration;

use crate::error::FetchError;
use crate::models::Entity;

/// One fetched page.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub page: u32,
    pub entities: Vec<T>,
    pub has_more: bool,
}

pub trait DataSource: Send + Sync + 'static {
    type Entity: Entity;

    /// Fetch 1-based page `page` holding up to `page_size` entities.
    fn fetch_page(
        &self,
        page: u32,
        page_size: usize,
    ) -> impl Future<Output = Result<Page<Self::Entity>, FetchError>> + Send;
}

/// Id of the entity at `index` within 1-based page `page`.
pub(crate) fn entity_number(page: u32, page_size: usize, index: usize) -> u64 {
    (page as u64 - 1) * page_size as u64 + index as u64 + 1
}

pub(crate) async fn simulate_latency(delay: Duration) {
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
}
