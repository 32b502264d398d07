//! Paginated gallery controller.
//!
//! Owns the accumulated item list and the per-instance busy state for a
//! remote ordered collection. All mutation of the gallery state happens
//! here; other components receive records by value.

use std::sync::{Arc, Mutex};

use log::{debug, warn};

use crate::store::{GreetingStore, PageRequest, PageResponse};
use crate::{Error, GreetingRecord, Notification, NotifyHandler, Result};

/// Tagged busy state for the paginator.
///
/// Replaces a pair of booleans so that the two load modes are mutually
/// exclusive by construction and a failure is distinguishable from rest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadState {
    Idle,
    LoadingInitial,
    LoadingMore,
    Failed,
}

impl LoadState {
    fn is_busy(self) -> bool {
        matches!(self, LoadState::LoadingInitial | LoadState::LoadingMore)
    }
}

/// Result of a load call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// A fetch ran and appended/replaced this many records
    Loaded(usize),
    /// Nothing to do: no more pages, or a load already in flight
    Skipped,
}

struct GalleryState {
    items: Vec<GreetingRecord>,
    page_index: usize,
    has_more: bool,
    load: LoadState,
}

/// Paginated, appendable retrieval controller for a remote ordered collection.
///
/// At most one fetch per instance is in flight at a time; a second trigger
/// while one is running is a no-op, not a queued duplicate.
pub struct GalleryPaginator {
    store: Arc<dyn GreetingStore>,
    page_size: usize,
    state: Mutex<GalleryState>,
    on_notify: Mutex<Option<NotifyHandler>>,
}

impl GalleryPaginator {
    pub fn new(store: Arc<dyn GreetingStore>, page_size: usize) -> Self {
        Self {
            store,
            page_size: page_size.max(1),
            state: Mutex::new(GalleryState {
                items: Vec::new(),
                page_index: 0,
                has_more: true,
                load: LoadState::Idle,
            }),
            on_notify: Mutex::new(None),
        }
    }

    /// Register a callback for notifications (fire-and-forget surface).
    pub fn on_notify<F>(&self, cb: F)
    where
        F: Fn(&Notification) + Send + Sync + 'static,
    {
        *self.on_notify.lock().unwrap() = Some(Arc::new(cb));
    }

    /// Remove a previously registered notification callback if any
    pub fn clear_on_notify(&self) {
        *self.on_notify.lock().unwrap() = None;
    }

    /// Snapshot of the accumulated items, retrieval order preserved.
    pub fn items(&self) -> Vec<GreetingRecord> {
        self.state.lock().unwrap().items.clone()
    }

    pub fn has_more(&self) -> bool {
        self.state.lock().unwrap().has_more
    }

    pub fn load_state(&self) -> LoadState {
        self.state.lock().unwrap().load
    }

    pub fn is_loading(&self) -> bool {
        self.load_state() == LoadState::LoadingInitial
    }

    pub fn is_loading_more(&self) -> bool {
        self.load_state() == LoadState::LoadingMore
    }

    /// Next page index to be fetched (monotonically increasing).
    pub fn page_index(&self) -> usize {
        self.state.lock().unwrap().page_index
    }

    /// Fetch page 0 and replace the accumulated items entirely.
    ///
    /// Fails closed: on a store error the items are cleared, `has_more`
    /// drops to `false`, a notification is emitted, and the error is
    /// returned. The gallery stays usable; retry is another call.
    pub async fn load_initial(&self) -> Result<LoadOutcome> {
        {
            let mut state = self.state.lock().unwrap();
            if state.load.is_busy() {
                debug!("load_initial skipped: load already in flight");
                return Ok(LoadOutcome::Skipped);
            }
            state.load = LoadState::LoadingInitial;
        }

        let request = PageRequest { offset: 0, limit: self.page_size, want_total: true };
        match self.fetch_validated(request).await {
            Ok(page) => {
                let count = page.rows.len();
                let has_more = self.compute_has_more(0, count, page.total);
                let mut state = self.state.lock().unwrap();
                state.items = page.rows;
                state.page_index = 1;
                state.has_more = has_more;
                state.load = LoadState::Idle;
                Ok(LoadOutcome::Loaded(count))
            }
            Err(err) => Err(self.fail_closed(err)),
        }
    }

    /// Fetch the next page and append it.
    ///
    /// No-op when there is nothing more to fetch or a load is already in
    /// flight. Results are appended in store-returned order and the page
    /// index only ever moves forward, so no item is re-requested.
    pub async fn load_more(&self) -> Result<LoadOutcome> {
        let page_num = {
            let mut state = self.state.lock().unwrap();
            if !state.has_more {
                debug!("load_more skipped: no more pages");
                return Ok(LoadOutcome::Skipped);
            }
            if state.load.is_busy() {
                debug!("load_more skipped: load already in flight");
                return Ok(LoadOutcome::Skipped);
            }
            state.load = LoadState::LoadingMore;
            state.page_index
        };

        let request = PageRequest {
            offset: page_num * self.page_size,
            limit: self.page_size,
            want_total: true,
        };
        match self.fetch_validated(request).await {
            Ok(page) => {
                let count = page.rows.len();
                let has_more = self.compute_has_more(page_num, count, page.total);
                let mut state = self.state.lock().unwrap();
                state.items.extend(page.rows);
                state.page_index = page_num + 1;
                state.has_more = has_more;
                state.load = LoadState::Idle;
                Ok(LoadOutcome::Loaded(count))
            }
            Err(err) => Err(self.fail_closed(err)),
        }
    }

    async fn fetch_validated(&self, request: PageRequest) -> Result<PageResponse> {
        let page = self.store.fetch_page(request).await?;
        for row in &page.rows {
            row.validate()
                .map_err(|e| Error::Retrieval(format!("store returned invalid record: {}", e)))?;
        }
        Ok(page)
    }

    /// Prefer the store-reported total; fall back to comparing the batch
    /// size against the page size. The fallback is wrong exactly when the
    /// remaining count equals the page size: the extra `load_more` then
    /// returns an empty batch and settles `has_more` to false.
    fn compute_has_more(&self, page_num: usize, batch_len: usize, total: Option<u64>) -> bool {
        match total {
            Some(total) => ((page_num as u64 + 1) * self.page_size as u64) < total,
            None => batch_len == self.page_size,
        }
    }

    fn fail_closed(&self, err: Error) -> Error {
        warn!("gallery retrieval failed: {}", err);
        {
            let mut state = self.state.lock().unwrap();
            state.items.clear();
            state.has_more = false;
            state.load = LoadState::Failed;
        }
        let handler = self.on_notify.lock().unwrap().clone();
        if let Some(cb) = handler {
            cb(&Notification::error("Error", "Failed to load greetings."));
        }
        err
    }
}

/// Cosmetic preview truncation for gallery tiles.
///
/// Caller-side policy only: the full-size rendering path never sees this.
/// Char-boundary safe; appends an ellipsis marker when anything was cut.
pub fn truncate_preview(text: &str, budget: usize) -> String {
    if text.chars().count() <= budget {
        return text.to_string();
    }
    let mut out: String = text.chars().take(budget).collect();
    out.push_str("...");
    out
}

/// First whitespace-separated token of the display name, as shown on
/// gallery tiles.
pub fn display_first_name(record: &GreetingRecord) -> &str {
    record.name.split_whitespace().next().unwrap_or("")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use futures::future::BoxFuture;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn rows(n: usize) -> Vec<GreetingRecord> {
        (0..n)
            .map(|i| {
                let mut r = GreetingRecord::new(
                    &format!("Student {}", i),
                    "CSE",
                    "2",
                    "Happy New Year",
                    "Body text",
                    "Quote",
                );
                r.id = format!("id-{}", i);
                r
            })
            .collect()
    }

    /// Store wrapper counting fetches, used to pin the no-op guarantees.
    struct CountingStore {
        inner: MemoryStore,
        calls: AtomicUsize,
    }

    impl CountingStore {
        fn new(inner: MemoryStore) -> Self {
            Self { inner, calls: AtomicUsize::new(0) }
        }
    }

    impl GreetingStore for CountingStore {
        fn fetch_page(&self, req: PageRequest) -> BoxFuture<'_, Result<PageResponse>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inner.fetch_page(req)
        }
    }

    /// Store that parks every fetch until released, for busy-flag tests.
    struct GatedStore {
        inner: MemoryStore,
        gate: Arc<tokio::sync::Notify>,
    }

    impl GreetingStore for GatedStore {
        fn fetch_page(&self, req: PageRequest) -> BoxFuture<'_, Result<PageResponse>> {
            let gate = self.gate.clone();
            Box::pin(async move {
                gate.notified().await;
                self.inner.fetch_page(req).await
            })
        }
    }

    #[tokio::test]
    async fn load_initial_populates_first_page() {
        let paginator = GalleryPaginator::new(Arc::new(MemoryStore::new(rows(20))), 8);
        let outcome = paginator.load_initial().await.unwrap();
        assert_eq!(outcome, LoadOutcome::Loaded(8));
        assert_eq!(paginator.items().len(), 8);
        assert!(paginator.has_more());
        assert_eq!(paginator.page_index(), 1);
        assert_eq!(paginator.load_state(), LoadState::Idle);
        assert!(!paginator.is_loading() && !paginator.is_loading_more());
    }

    #[tokio::test]
    async fn load_more_appends_in_order_without_duplicates() {
        let paginator = GalleryPaginator::new(Arc::new(MemoryStore::new(rows(20))), 8);
        paginator.load_initial().await.unwrap();
        paginator.load_more().await.unwrap();
        let items = paginator.items();
        assert_eq!(items.len(), 16);
        let ids: Vec<&str> = items.iter().map(|r| r.id.as_str()).collect();
        let expected: Vec<String> = (0..16).map(|i| format!("id-{}", i)).collect();
        assert_eq!(ids, expected.iter().map(|s| s.as_str()).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn has_more_false_exactly_at_total_exhaustion() {
        let paginator = GalleryPaginator::new(Arc::new(MemoryStore::new(rows(16))), 8);
        paginator.load_initial().await.unwrap();
        assert!(paginator.has_more());
        paginator.load_more().await.unwrap();
        assert!(!paginator.has_more());
        assert_eq!(paginator.items().len(), 16);
    }

    #[tokio::test]
    async fn countless_store_boundary_needs_one_extra_fetch() {
        // 9 items, page size 9, no total: the fallback cannot tell a full
        // final page from a non-final one
        let paginator = GalleryPaginator::new(Arc::new(MemoryStore::without_total(rows(9))), 9);
        paginator.load_initial().await.unwrap();
        assert!(paginator.has_more());
        let outcome = paginator.load_more().await.unwrap();
        assert_eq!(outcome, LoadOutcome::Loaded(0));
        assert!(!paginator.has_more());
        assert_eq!(paginator.items().len(), 9);
    }

    #[tokio::test]
    async fn load_more_is_noop_when_exhausted() {
        let store = Arc::new(CountingStore::new(MemoryStore::new(rows(3))));
        let paginator = GalleryPaginator::new(store.clone(), 8);
        paginator.load_initial().await.unwrap();
        assert!(!paginator.has_more());
        let outcome = paginator.load_more().await.unwrap();
        assert_eq!(outcome, LoadOutcome::Skipped);
        assert_eq!(store.calls.load(Ordering::SeqCst), 1);
        assert_eq!(paginator.items().len(), 3);
    }

    #[tokio::test]
    async fn concurrent_load_more_runs_one_fetch() {
        let gate = Arc::new(tokio::sync::Notify::new());
        let store = Arc::new(GatedStore {
            inner: MemoryStore::new(rows(20)),
            gate: gate.clone(),
        });
        let paginator = Arc::new(GalleryPaginator::new(store, 8));

        let first = {
            let paginator = paginator.clone();
            tokio::spawn(async move { paginator.load_initial().await })
        };
        // Let the first load reach the parked fetch
        tokio::task::yield_now().await;
        assert!(paginator.load_state().is_busy());

        // Second trigger while in flight: ignored, not queued
        let second = paginator.load_more().await.unwrap();
        assert_eq!(second, LoadOutcome::Skipped);

        gate.notify_one();
        let first = first.await.unwrap().unwrap();
        assert_eq!(first, LoadOutcome::Loaded(8));
        assert_eq!(paginator.load_state(), LoadState::Idle);
    }

    #[tokio::test]
    async fn retrieval_failure_fails_closed_and_recovers() {
        let store = Arc::new(MemoryStore::new(rows(20)));
        let paginator = GalleryPaginator::new(store.clone(), 8);
        let seen = Arc::new(Mutex::new(Vec::new()));
        {
            let seen = seen.clone();
            paginator.on_notify(move |n| seen.lock().unwrap().push(n.clone()));
        }

        paginator.load_initial().await.unwrap();
        store.set_fail(true);
        let err = paginator.load_more().await.unwrap_err();
        assert!(matches!(err, Error::Retrieval(_)));
        assert!(paginator.items().is_empty());
        assert!(!paginator.has_more());
        assert_eq!(paginator.load_state(), LoadState::Failed);
        assert_eq!(seen.lock().unwrap().len(), 1);

        // Failed is not busy: a fresh load_initial is the retry path
        store.set_fail(false);
        paginator.load_initial().await.unwrap();
        assert_eq!(paginator.items().len(), 8);
        assert_eq!(paginator.load_state(), LoadState::Idle);
    }

    #[tokio::test]
    async fn invalid_store_row_is_a_retrieval_error() {
        let mut bad = rows(2);
        bad[1].name = "   ".to_string();
        let paginator = GalleryPaginator::new(Arc::new(MemoryStore::new(bad)), 8);
        let err = paginator.load_initial().await.unwrap_err();
        assert!(matches!(err, Error::Retrieval(_)));
        assert!(paginator.items().is_empty());
    }

    #[test]
    fn preview_truncation_appends_marker() {
        let long = "x".repeat(200);
        let preview = truncate_preview(&long, 120);
        assert_eq!(preview.chars().count(), 123);
        assert!(preview.ends_with("..."));
    }

    #[test]
    fn preview_truncation_leaves_short_text_alone() {
        assert_eq!(truncate_preview("short", 120), "short");
    }

    #[test]
    fn preview_truncation_is_char_boundary_safe() {
        let text = "\u{2728}".repeat(10);
        let preview = truncate_preview(&text, 4);
        assert!(preview.starts_with('\u{2728}'));
        assert!(preview.ends_with("..."));
    }

    #[test]
    fn first_name_for_tiles() {
        let r = GreetingRecord::new("Asha Rao", "CSE", "2", "t", "b", "q");
        assert_eq!(display_first_name(&r), "Asha");
    }
}
