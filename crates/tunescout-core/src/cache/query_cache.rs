use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, Notify};
use tokio::task::JoinHandle;

use crate::cache::{
    CacheResult, DehydratedEntry, DehydratedState, FetchOutcome, FetchStatus, QueryCacheEntry,
    SkipReason,
};
use crate::catalog::Catalog;
use crate::models::{Album, CoreError, CoreErrorKind, Cursor, ErrorInfo, Page, QueryKey};

/// Process-wide cache of cursor-paginated catalog queries.
///
/// Cloning yields another handle to the same state. At most one fetch per
/// key is in flight at any time; later callers either join it (first page)
/// or skip (next page).
#[derive(Clone)]
pub struct QueryCache {
    inner: Arc<Mutex<CacheState>>,
    catalog: Arc<dyn Catalog>,
}

#[derive(Default)]
struct CacheState {
    entries: HashMap<QueryKey, QueryCacheEntry>,
    in_flight: HashMap<QueryKey, Arc<Notify>>,
}

impl QueryCache {
    pub fn new(catalog: Arc<dyn Catalog>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(CacheState::default())),
            catalog,
        }
    }

    /// Loads the first page for `key` unless it is already cached.
    ///
    /// Returns `Ok(None)` for disabled keys without contacting the catalog.
    /// Entries never go stale, so a cached entry is returned as is.
    pub async fn fetch_first_page(&self, key: &QueryKey) -> CacheResult<Option<QueryCacheEntry>> {
        if !key.is_enabled() {
            return Ok(None);
        }

        let mut joined = false;
        loop {
            let mut state = self.inner.lock().await;
            if let Some(entry) = state.entries.get(key) {
                if !entry.pages.is_empty() {
                    return Ok(Some(entry.clone()));
                }
                if joined && entry.status == FetchStatus::Error {
                    return Err(entry_error(entry));
                }
            }

            if let Some(done) = state.in_flight.get(key).cloned() {
                let notified = done.notified();
                tokio::pin!(notified);
                // Register before releasing the lock so the completion cannot be missed.
                notified.as_mut().enable();
                drop(state);
                notified.await;
                joined = true;
                continue;
            }

            state.begin(key, FetchStatus::Loading);
            break;
        }

        self.run_fetch(key.clone(), None).await?;
        self.warm_ahead(key).await;
        Ok(self.entry(key).await)
    }

    /// Appends the page following the last cached page.
    ///
    /// A no-op when the entry is absent, terminal, or already fetching.
    pub async fn fetch_next_page(&self, key: &QueryKey) -> CacheResult<FetchOutcome> {
        let outcome = self.next_page(key).await?;
        if outcome.was_fetched() {
            self.warm_ahead(key).await;
        }
        Ok(outcome)
    }

    async fn next_page(&self, key: &QueryKey) -> CacheResult<FetchOutcome> {
        if !key.is_enabled() {
            return Ok(FetchOutcome::Skipped(SkipReason::Disabled));
        }

        let cursor = {
            let mut state = self.inner.lock().await;
            if state.in_flight.contains_key(key) {
                return Ok(FetchOutcome::Skipped(SkipReason::InFlight));
            }
            let Some(entry) = state.entries.get(key) else {
                return Ok(FetchOutcome::Skipped(SkipReason::Absent));
            };
            let Some(last_page) = entry.pages.last() else {
                return Ok(FetchOutcome::Skipped(SkipReason::Absent));
            };
            let Some(cursor) = last_page.next_cursor.clone() else {
                return Ok(FetchOutcome::Skipped(SkipReason::Terminal));
            };
            state.begin(key, FetchStatus::LoadingMore);
            cursor
        };

        self.run_fetch(key.clone(), Some(cursor)).await
    }

    /// Seeds `key` with a single page without fetching.
    pub async fn set_data(&self, key: QueryKey, page: Page) {
        let mut state = self.inner.lock().await;
        let in_flight = state.in_flight.contains_key(&key);
        let entry = state
            .entries
            .entry(key.clone())
            .or_insert_with(|| QueryCacheEntry::new(key));
        entry.pages = vec![page];
        entry.error = None;
        if !in_flight {
            entry.status = FetchStatus::Settled;
        }
    }

    /// Warms the first page for `key` in the background. Failures are
    /// logged and dropped.
    pub fn prefetch(&self, key: QueryKey) -> JoinHandle<()> {
        let cache = self.clone();
        tokio::spawn(async move {
            if !key.is_enabled() || cache.is_cached_or_fetching(&key).await {
                return;
            }
            if let Err(error) = cache.fetch_first_page(&key).await {
                tracing::debug!(
                    key = ?key,
                    kind = ?error.kind,
                    message = %error.message,
                    "prefetch failed"
                );
            }
        })
    }

    /// Loads the next page for `key` in the background without warming
    /// further pages. Failures are logged and dropped.
    pub fn prefetch_next_page(&self, key: QueryKey) -> JoinHandle<()> {
        let cache = self.clone();
        tokio::spawn(async move {
            match cache.next_page(&key).await {
                Ok(outcome) => {
                    tracing::debug!(key = ?key, ?outcome, "next page warm-up finished");
                }
                Err(error) => tracing::debug!(
                    key = ?key,
                    kind = ?error.kind,
                    message = %error.message,
                    "next page warm-up failed"
                ),
            }
        })
    }

    pub async fn entry(&self, key: &QueryKey) -> Option<QueryCacheEntry> {
        self.inner.lock().await.entries.get(key).cloned()
    }

    pub async fn is_fetching(&self, key: &QueryKey) -> bool {
        self.inner.lock().await.in_flight.contains_key(key)
    }

    pub async fn has_next_page(&self, key: &QueryKey) -> bool {
        self.inner
            .lock()
            .await
            .entries
            .get(key)
            .is_some_and(QueryCacheEntry::has_next_page)
    }

    pub async fn len(&self) -> usize {
        self.inner.lock().await.entries.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Settled entries with at least one page.
    pub async fn dehydrate(&self) -> DehydratedState {
        let state = self.inner.lock().await;
        dehydrated(state.entries.values())
    }

    /// Like [`QueryCache::dehydrate`], restricted to `keys`.
    pub async fn dehydrate_keys(&self, keys: &[QueryKey]) -> DehydratedState {
        let state = self.inner.lock().await;
        dehydrated(keys.iter().filter_map(|key| state.entries.get(key)))
    }

    /// Seeds every dehydrated entry whose key holds no pages and is not
    /// fetching. Returns the number of entries restored.
    pub async fn hydrate(&self, dehydrated: DehydratedState) -> usize {
        let mut state = self.inner.lock().await;
        let mut restored = 0;
        for DehydratedEntry { key, pages } in dehydrated.entries {
            if pages.is_empty() || state.in_flight.contains_key(&key) {
                continue;
            }
            if state
                .entries
                .get(&key)
                .is_some_and(|entry| !entry.pages.is_empty())
            {
                continue;
            }
            state.entries.insert(
                key.clone(),
                QueryCacheEntry {
                    key,
                    pages,
                    status: FetchStatus::Settled,
                    error: None,
                },
            );
            restored += 1;
        }
        restored
    }

    /// Artist album listings stay one page ahead of what has been asked for.
    async fn warm_ahead(&self, key: &QueryKey) {
        if matches!(key, QueryKey::ArtistAlbums { .. }) && self.has_next_page(key).await {
            drop(self.prefetch_next_page(key.clone()));
        }
    }

    async fn is_cached_or_fetching(&self, key: &QueryKey) -> bool {
        let state = self.inner.lock().await;
        state.in_flight.contains_key(key)
            || state
                .entries
                .get(key)
                .is_some_and(|entry| !entry.pages.is_empty())
    }

    /// Runs the catalog call on its own task so the in-flight marker is
    /// cleared even if the caller stops waiting.
    async fn run_fetch(&self, key: QueryKey, cursor: Option<Cursor>) -> CacheResult<FetchOutcome> {
        let operation = key.operation();
        let cache = self.clone();
        let task = tokio::spawn(async move {
            let result = cache.load(&key, cursor.clone()).await;
            if let Err(error) = &result {
                tracing::warn!(
                    key = ?key,
                    kind = ?error.kind,
                    message = %error.message,
                    "catalog fetch failed"
                );
            }
            cache.finish(&key, cursor.as_ref(), result).await
        });

        task.await.map_err(|join_error| {
            CoreError::new(
                CoreErrorKind::Internal,
                format!("cache fetch task failed: {join_error}"),
            )
            .with_operation(operation)
        })?
    }

    async fn load(&self, key: &QueryKey, cursor: Option<Cursor>) -> CacheResult<Page> {
        let catalog = self.catalog.clone();
        let operation = key.operation();
        let key = key.clone();
        tracing::debug!(key = ?key, continuation = cursor.is_some(), "fetching catalog page");
        tokio::task::spawn_blocking(move || catalog.fetch_page(&key, cursor.as_ref()))
            .await
            .map_err(|join_error| {
                CoreError::new(
                    CoreErrorKind::Internal,
                    format!("catalog fetch join failure: {join_error}"),
                )
                .with_operation(operation)
            })?
            .map_err(|error| error.with_operation(operation))
    }

    async fn finish(
        &self,
        key: &QueryKey,
        cursor: Option<&Cursor>,
        result: CacheResult<Page>,
    ) -> CacheResult<FetchOutcome> {
        let (outcome, done) = {
            let mut state = self.inner.lock().await;
            let done = state.in_flight.remove(key);
            (state.store(key, cursor, result), done)
        };
        if let Some(done) = done {
            done.notify_waiters();
        }
        outcome
    }
}

impl CacheState {
    fn begin(&mut self, key: &QueryKey, status: FetchStatus) {
        self.in_flight.insert(key.clone(), Arc::new(Notify::new()));
        let entry = self
            .entries
            .entry(key.clone())
            .or_insert_with(|| QueryCacheEntry::new(key.clone()));
        entry.status = status;
    }

    fn store(
        &mut self,
        key: &QueryKey,
        cursor: Option<&Cursor>,
        result: CacheResult<Page>,
    ) -> CacheResult<FetchOutcome> {
        let entry = self
            .entries
            .entry(key.clone())
            .or_insert_with(|| QueryCacheEntry::new(key.clone()));

        let page = match result {
            Ok(page) => page,
            Err(error) => {
                entry.status = FetchStatus::Error;
                entry.error = Some(ErrorInfo::from(&error));
                return Err(error);
            }
        };

        let albums = page.albums.clone();
        match cursor {
            Some(cursor) if entry.next_cursor() != Some(cursor) => {
                entry.status = FetchStatus::Settled;
                tracing::debug!(key = ?key, "dropping page for a reseeded entry");
                return Ok(FetchOutcome::Skipped(SkipReason::Superseded));
            }
            Some(_) => entry.pages.push(page),
            None => entry.pages = vec![page],
        }
        entry.status = FetchStatus::Settled;
        entry.error = None;

        self.seed_album_details(key, albums);
        Ok(FetchOutcome::Fetched)
    }

    /// Album cards already carry what the album detail view needs.
    fn seed_album_details(&mut self, source: &QueryKey, albums: Vec<Album>) {
        if matches!(source, QueryKey::Album { .. }) {
            return;
        }
        for album in albums {
            let key = QueryKey::album(album.id.clone());
            if self.in_flight.contains_key(&key) {
                continue;
            }
            self.entries.insert(
                key.clone(),
                QueryCacheEntry {
                    key,
                    pages: vec![Page {
                        albums: vec![album],
                        ..Page::default()
                    }],
                    status: FetchStatus::Settled,
                    error: None,
                },
            );
        }
    }
}

fn dehydrated<'a>(entries: impl Iterator<Item = &'a QueryCacheEntry>) -> DehydratedState {
    let mut entries: Vec<DehydratedEntry> = entries
        .filter(|entry| entry.status == FetchStatus::Settled && !entry.pages.is_empty())
        .map(|entry| DehydratedEntry {
            key: entry.key.clone(),
            pages: entry.pages.clone(),
        })
        .collect();
    entries.sort_by_cached_key(|entry| format!("{:?}", entry.key));
    DehydratedState { entries }
}

fn entry_error(entry: &QueryCacheEntry) -> CoreError {
    entry
        .error
        .clone()
        .map(CoreError::from)
        .unwrap_or_else(|| CoreError::new(CoreErrorKind::Internal, "fetch failed without detail"))
        .with_operation(entry.key.operation())
}
