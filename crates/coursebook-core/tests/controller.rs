use std::collections::HashSet;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::Utc;
use coursebook_core::{
    CacheKeys, CacheRecord, Command, Config, DataSource, FetchError, FileStore, Footer, Item,
    ItemSource, KeyValueStore, ListState, MemoryStore, MockStudentSource, Outcome,
    PaginationController, Page, PersistedCache, RejectReason, StorageError,
};
use tokio::sync::{mpsc, Semaphore};

const PAGE_SIZE: usize = 20;
const MAX_PAGES: u32 = 3;

/// Item source that records calls and can be failed or held at a gate.
#[derive(Clone)]
struct TestSource {
    inner: ItemSource,
    calls: Arc<Mutex<Vec<u32>>>,
    fail: Arc<AtomicBool>,
    gate: Option<Arc<Semaphore>>,
    entered: Option<mpsc::UnboundedSender<u32>>,
}

impl TestSource {
    fn new() -> Self {
        Self {
            inner: ItemSource::new(MAX_PAGES, Duration::ZERO),
            calls: Arc::new(Mutex::new(Vec::new())),
            fail: Arc::new(AtomicBool::new(false)),
            gate: None,
            entered: None,
        }
    }

    fn gated(gate: Arc<Semaphore>, entered: mpsc::UnboundedSender<u32>) -> Self {
        Self {
            gate: Some(gate),
            entered: Some(entered),
            ..Self::new()
        }
    }

    fn calls(&self) -> Vec<u32> {
        self.calls.lock().unwrap().clone()
    }

    fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }
}

impl DataSource for TestSource {
    type Entity = Item;

    fn fetch_page(
        &self,
        page: u32,
        page_size: usize,
    ) -> impl Future<Output = Result<Page<Item>, FetchError>> + Send {
        async move {
            self.calls.lock().unwrap().push(page);
            if let Some(entered) = &self.entered {
                let _ = entered.send(page);
            }
            if let Some(gate) = &self.gate {
                gate.acquire().await.unwrap().forget();
            }
            if self.fail.load(Ordering::SeqCst) {
                return Err(FetchError::Unavailable("connection reset".to_string()));
            }
            self.inner.fetch_page(page, page_size).await
        }
    }
}

/// Store whose writes always fail.
struct ReadOnlyStore(MemoryStore);

impl KeyValueStore for ReadOnlyStore {
    fn get_many(&self, keys: &[&str]) -> Result<Vec<Option<String>>, StorageError> {
        self.0.get_many(keys)
    }

    fn set_many(&self, _entries: &[(&str, String)]) -> Result<(), StorageError> {
        Err(StorageError::Io(std::io::Error::new(
            std::io::ErrorKind::PermissionDenied,
            "read-only",
        )))
    }

    fn remove_many(&self, keys: &[&str]) -> Result<(), StorageError> {
        self.0.remove_many(keys)
    }
}

fn config() -> Config {
    Config {
        page_size: PAGE_SIZE,
        max_pages: MAX_PAGES,
        ..Config::default()
    }
    .without_delay()
}

fn items_cache<S: KeyValueStore>(store: &Arc<S>) -> PersistedCache<S, Item> {
    PersistedCache::new(Arc::clone(store), CacheKeys::ITEMS)
}

fn controller<S: KeyValueStore + 'static>(
    source: TestSource,
    store: &Arc<S>,
) -> PaginationController<TestSource, S> {
    PaginationController::new(source, items_cache(store), &config())
}

fn ids(items: &[Item]) -> Vec<String> {
    items.iter().map(|i| i.id.clone()).collect()
}

#[tokio::test]
async fn test_cold_start_fetches_first_page() {
    let store = Arc::new(MemoryStore::new());
    let source = TestSource::new();
    let mut controller = controller(source.clone(), &store);

    let outcome = controller.startup().await.unwrap();
    assert_eq!(outcome, Outcome::Refreshed { count: PAGE_SIZE });
    assert_eq!(source.calls(), vec![1]);

    let snap = controller.snapshot();
    assert_eq!(snap.entities.len(), PAGE_SIZE);
    assert_eq!(snap.page, 1);
    assert!(snap.has_more);
    assert_eq!(snap.state(), ListState::Idle);
    assert!(snap.last_refresh.is_some());

    let cached = items_cache(&store).read();
    assert_eq!(cached.entities, snap.entities);
    assert_eq!(cached.page, 1);
    assert!(cached.has_more);
}

#[tokio::test]
async fn test_fresh_cache_skips_fetch() {
    let store = Arc::new(MemoryStore::new());
    items_cache(&store)
        .write(&CacheRecord {
            entities: vec![Item::numbered(1), Item::numbered(2)],
            page: 2,
            has_more: true,
            last_refresh: Some(Utc::now() - chrono::Duration::minutes(10)),
        })
        .unwrap();

    let source = TestSource::new();
    let mut controller = controller(source.clone(), &store);

    assert_eq!(controller.startup().await.unwrap(), Outcome::FromCache);
    assert!(source.calls().is_empty());

    let snap = controller.snapshot();
    assert_eq!(ids(&snap.entities), vec!["1", "2"]);
    assert_eq!(snap.page, 2);
}

#[tokio::test]
async fn test_stale_cache_is_refreshed() {
    let store = Arc::new(MemoryStore::new());
    let old = Utc::now() - chrono::Duration::minutes(61);
    items_cache(&store)
        .write(&CacheRecord {
            entities: vec![Item::numbered(500)],
            page: 4,
            has_more: false,
            last_refresh: Some(old),
        })
        .unwrap();

    let source = TestSource::new();
    let mut controller = controller(source.clone(), &store);
    let mut updates = controller.subscribe();

    assert_eq!(
        controller.startup().await.unwrap(),
        Outcome::Refreshed { count: PAGE_SIZE }
    );
    assert_eq!(source.calls(), vec![1]);

    let snap = updates.borrow_and_update().clone();
    assert_eq!(snap.entities.first().map(|i| i.id.as_str()), Some("1"));
    assert_eq!(snap.page, 1);
    assert!(snap.has_more);
    assert!(snap.last_refresh.unwrap() > old);
}

#[tokio::test]
async fn test_stale_cache_kept_when_refresh_fails() {
    let store = Arc::new(MemoryStore::new());
    items_cache(&store)
        .write(&CacheRecord {
            entities: vec![Item::numbered(1)],
            page: 1,
            has_more: true,
            last_refresh: Some(Utc::now() - chrono::Duration::hours(3)),
        })
        .unwrap();

    let source = TestSource::new();
    source.set_failing(true);
    let mut controller = controller(source.clone(), &store);

    assert!(controller.startup().await.is_err());
    let snap = controller.snapshot();
    assert_eq!(ids(&snap.entities), vec!["1"]);
    assert!(snap.notice.is_some());
    assert!(!snap.refreshing);
}

#[tokio::test]
async fn test_load_more_appends_next_page() {
    let store = Arc::new(MemoryStore::new());
    let source = TestSource::new();
    let mut controller = controller(source.clone(), &store);
    controller.startup().await.unwrap();
    let first_stamp = controller.snapshot().last_refresh;

    let before = controller.snapshot().entities;
    assert_eq!(
        controller.load_more().await.unwrap(),
        Outcome::Appended { count: PAGE_SIZE }
    );

    let snap = controller.snapshot();
    assert_eq!(snap.page, 2);
    assert_eq!(snap.entities.len(), 2 * PAGE_SIZE);
    assert_eq!(&snap.entities[..PAGE_SIZE], &before[..]);
    let unique: HashSet<_> = snap.entities.iter().map(|i| i.id.clone()).collect();
    assert_eq!(unique.len(), snap.entities.len());
    // Appends do not count as a refresh
    assert_eq!(snap.last_refresh, first_stamp);

    let cached = items_cache(&store).read();
    assert_eq!(cached.entities, snap.entities);
    assert_eq!(cached.page, 2);
    assert_eq!(cached.has_more, snap.has_more);
}

#[tokio::test]
async fn test_refresh_resets_to_first_page() {
    let store = Arc::new(MemoryStore::new());
    let source = TestSource::new();
    let mut controller = controller(source.clone(), &store);
    controller.startup().await.unwrap();
    controller.load_more().await.unwrap();
    let stamp = controller.snapshot().last_refresh.unwrap();

    assert_eq!(
        controller.refresh().await.unwrap(),
        Outcome::Refreshed { count: PAGE_SIZE }
    );

    let snap = controller.snapshot();
    assert_eq!(snap.page, 1);
    assert_eq!(ids(&snap.entities), ids(&source.inner.fetch_page(1, PAGE_SIZE).await.unwrap().entities));
    assert!(snap.last_refresh.unwrap() >= stamp);
    assert_eq!(items_cache(&store).read().page, 1);
}

#[tokio::test]
async fn test_reach_end_without_more_is_noop() {
    let store = Arc::new(MemoryStore::new());
    let source = TestSource::new();
    let mut controller = controller(source.clone(), &store);
    controller.startup().await.unwrap();
    for _ in 1..MAX_PAGES {
        controller.load_more().await.unwrap();
    }

    let snap = controller.snapshot();
    assert!(!snap.has_more);
    assert_eq!(snap.footer(), Footer::NoMore);
    let calls = source.calls().len();

    assert_eq!(
        controller.load_more().await.unwrap(),
        Outcome::Rejected(RejectReason::Exhausted)
    );
    assert_eq!(source.calls().len(), calls);
    assert_eq!(controller.snapshot().entities.len(), MAX_PAGES as usize * PAGE_SIZE);
}

#[tokio::test]
async fn test_last_representable_page_is_exhausted() {
    let store = Arc::new(MemoryStore::new());
    items_cache(&store)
        .write(&CacheRecord {
            entities: vec![Item::numbered(1)],
            page: u32::MAX,
            has_more: true,
            last_refresh: Some(Utc::now()),
        })
        .unwrap();

    let source = TestSource::new();
    let mut controller = controller(source.clone(), &store);
    assert_eq!(controller.startup().await.unwrap(), Outcome::FromCache);

    assert_eq!(
        controller.load_more().await.unwrap(),
        Outcome::Rejected(RejectReason::Exhausted)
    );
    assert!(source.calls().is_empty());
    assert_eq!(controller.state(), ListState::Idle);
    assert_eq!(controller.snapshot().page, u32::MAX);
}

#[tokio::test]
async fn test_failed_load_more_keeps_state_and_cache() {
    let store = Arc::new(MemoryStore::new());
    let source = TestSource::new();
    let mut controller = controller(source.clone(), &store);
    controller.startup().await.unwrap();
    let before = controller.snapshot();
    let cached_before = items_cache(&store).read();

    source.set_failing(true);
    let err = controller.load_more().await.unwrap_err();
    assert!(err.to_string().contains("connection reset"));

    let snap = controller.snapshot();
    assert_eq!(snap.entities, before.entities);
    assert_eq!(snap.page, 1);
    assert_eq!(controller.state(), ListState::Idle);
    assert!(!snap.loading_more);
    assert!(snap.notice.as_deref().unwrap().contains("Failed to load data"));
    assert_eq!(items_cache(&store).read(), cached_before);

    // Next success clears the notice
    source.set_failing(false);
    controller.load_more().await.unwrap();
    assert_eq!(controller.snapshot().notice, None);
    assert_eq!(controller.snapshot().page, 2);
}

#[tokio::test]
async fn test_write_failure_still_updates_list() {
    let store = Arc::new(ReadOnlyStore(MemoryStore::new()));
    let source = TestSource::new();
    let mut controller = controller(source, &store);

    controller.startup().await.unwrap();
    controller.load_more().await.unwrap();

    let snap = controller.snapshot();
    assert_eq!(snap.entities.len(), 2 * PAGE_SIZE);
    assert_eq!(snap.notice, None);
    assert!(items_cache(&store).read().is_empty());
}

#[tokio::test]
async fn test_clear_resets_list_and_cache() {
    let store = Arc::new(MemoryStore::new());
    let mut controller = controller(TestSource::new(), &store);
    controller.startup().await.unwrap();

    controller.clear().unwrap();
    assert!(controller.snapshot().entities.is_empty());
    assert!(items_cache(&store).read().is_empty());
    assert!(store.is_empty());
}

#[tokio::test]
async fn test_handle_refresh_queued_behind_load_more() {
    let store = Arc::new(MemoryStore::new());
    let gate = Arc::new(Semaphore::new(0));
    let (entered_tx, mut entered_rx) = mpsc::unbounded_channel();
    let source = TestSource::gated(Arc::clone(&gate), entered_tx);
    let (handle, task) = controller(source.clone(), &store).spawn();

    let startup = handle.submit(Command::Startup);
    assert_eq!(entered_rx.recv().await, Some(1));
    assert!(handle.snapshot().refreshing);
    gate.add_permits(1);
    assert_eq!(startup.outcome().await, Ok(Outcome::Refreshed { count: PAGE_SIZE }));

    let load_more = handle.submit(Command::LoadMore);
    assert_eq!(entered_rx.recv().await, Some(2));
    assert!(handle.snapshot().loading_more);
    assert_eq!(handle.snapshot().footer(), Footer::Loading);

    // Both arrive while the append is in flight
    let refresh = handle.submit(Command::Refresh);
    let second_load = handle.submit(Command::LoadMore);
    gate.add_permits(2);

    assert_eq!(load_more.outcome().await, Ok(Outcome::Appended { count: PAGE_SIZE }));
    assert_eq!(
        second_load.outcome().await,
        Ok(Outcome::Rejected(RejectReason::Busy))
    );
    assert_eq!(refresh.outcome().await, Ok(Outcome::Refreshed { count: PAGE_SIZE }));

    let snap = handle.snapshot();
    assert_eq!(snap.page, 1);
    assert_eq!(snap.entities.len(), PAGE_SIZE);
    assert_eq!(source.calls(), vec![1, 2, 1]);
    assert_eq!(items_cache(&store).read().page, 1);

    drop(handle);
    task.await.unwrap();
}

#[tokio::test]
async fn test_handle_coalesces_repeated_refresh() {
    let store = Arc::new(MemoryStore::new());
    let gate = Arc::new(Semaphore::new(0));
    let (entered_tx, mut entered_rx) = mpsc::unbounded_channel();
    let source = TestSource::gated(Arc::clone(&gate), entered_tx);
    let (handle, task) = controller(source.clone(), &store).spawn();

    let startup = handle.submit(Command::Startup);
    assert_eq!(entered_rx.recv().await, Some(1));
    gate.add_permits(1);
    startup.outcome().await.unwrap();

    let load_more = handle.submit(Command::LoadMore);
    assert_eq!(entered_rx.recv().await, Some(2));

    // Three pull-to-refresh gestures during one append
    let refreshes: Vec<_> = (0..3).map(|_| handle.submit(Command::Refresh)).collect();
    gate.add_permits(2);

    assert_eq!(load_more.outcome().await, Ok(Outcome::Appended { count: PAGE_SIZE }));
    for refresh in refreshes {
        assert_eq!(refresh.outcome().await, Ok(Outcome::Refreshed { count: PAGE_SIZE }));
    }
    assert_eq!(source.calls(), vec![1, 2, 1]);
    assert_eq!(handle.snapshot().page, 1);

    drop(handle);
    task.await.unwrap();
}

#[tokio::test]
async fn test_handle_callbacks_and_subscription() {
    let store = Arc::new(MemoryStore::new());
    let (handle, _task) = controller(TestSource::new(), &store).spawn();
    let mut updates = handle.subscribe();

    handle.startup().await.unwrap();
    assert_eq!(
        handle.on_reach_end().await.unwrap(),
        Outcome::Appended { count: PAGE_SIZE }
    );
    assert!(updates.has_changed().unwrap());
    assert_eq!(updates.borrow_and_update().page, 2);

    assert_eq!(
        handle.on_pull_to_refresh().await.unwrap(),
        Outcome::Refreshed { count: PAGE_SIZE }
    );
    assert_eq!(handle.snapshot().page, 1);
}

#[tokio::test]
async fn test_handle_reports_closed_controller() {
    let store = Arc::new(MemoryStore::new());
    let (handle, task) = controller(TestSource::new(), &store).spawn();
    task.abort();
    let _ = task.await;

    assert_eq!(
        handle.on_pull_to_refresh().await,
        Err(coursebook_core::ControllerError::Closed)
    );
}

#[tokio::test]
async fn test_students_resume_after_restart() {
    let dir = tempfile::tempdir().unwrap();
    let config = Config::default().without_delay();

    let first_session = {
        let store = Arc::new(FileStore::open(dir.path()).unwrap());
        let cache = PersistedCache::new(store, CacheKeys::STUDENTS);
        let mut controller =
            PaginationController::new(MockStudentSource::seeded(&config, 3), cache, &config);
        controller.startup().await.unwrap();
        controller.load_more().await.unwrap();
        controller.snapshot()
    };
    assert_eq!(first_session.entities.len(), 2 * config.page_size);

    let store = Arc::new(FileStore::open(dir.path()).unwrap());
    let cache = PersistedCache::new(store, CacheKeys::STUDENTS);
    let mut controller =
        PaginationController::new(MockStudentSource::new(&config), cache, &config);

    assert_eq!(controller.startup().await.unwrap(), Outcome::FromCache);
    let snap = controller.snapshot();
    assert_eq!(snap.entities, first_session.entities);
    assert_eq!(snap.page, 2);

    controller.load_more().await.unwrap();
    let snap = controller.snapshot();
    assert_eq!(snap.page, 3);
    assert_eq!(snap.entities.last().map(|s| s.id.as_str()), Some("30"));
}
