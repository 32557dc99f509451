use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::task::JoinHandle;
use url::Url;

use crate::cache::QueryCache;
use crate::config::{DEFAULT_DEBOUNCE, DEFAULT_SEARCH_LIMIT};
use crate::controller::location::{LocationUpdate, search_location, search_term_from_url};
use crate::controller::state::{DisplayState, derive_display_state};
use crate::debounce::Debouncer;
use crate::models::{CatalogOperation, CoreError, CoreErrorKind, CoreResult, QueryKey, ResultItem};
use crate::persistence::LastSearchStore;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct SearchOptions {
    pub limit: u32,
    pub debounce: Duration,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            limit: DEFAULT_SEARCH_LIMIT,
            debounce: DEFAULT_DEBOUNCE,
        }
    }
}

/// Everything the result list needs for one render.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct SearchView {
    pub input: String,
    pub state: DisplayState,
    pub items: Vec<ResultItem>,
    /// Cached results of the last successful search, shown while idle.
    pub fallback_items: Vec<ResultItem>,
    pub has_next_page: bool,
    /// Skeleton cards to render below `items`.
    pub placeholders: usize,
}

/// Drives the search page: raw input, its debounced value, the cache entry
/// for that value and the remembered last search.
pub struct SearchController {
    cache: QueryCache,
    store: Arc<dyn LastSearchStore>,
    debouncer: Debouncer<String>,
    options: SearchOptions,
    page_url: Url,
    last_search_term: Option<String>,
}

impl SearchController {
    /// Starts from the `search` parameter of `page_url` and loads the
    /// remembered term from `store`.
    pub async fn mount(
        cache: QueryCache,
        store: Arc<dyn LastSearchStore>,
        page_url: Url,
        options: SearchOptions,
    ) -> Self {
        let initial = search_term_from_url(&page_url).unwrap_or_default();
        let last_search_term = load_last_search_term(store.clone()).await;

        Self {
            cache,
            store,
            debouncer: Debouncer::new(initial, options.debounce),
            options,
            page_url,
            last_search_term,
        }
    }

    pub fn cache(&self) -> &QueryCache {
        &self.cache
    }

    pub fn options(&self) -> SearchOptions {
        self.options
    }

    pub fn input(&self) -> String {
        self.debouncer.input()
    }

    pub fn debounced_term(&self) -> String {
        self.debouncer.settled()
    }

    pub fn last_search_term(&self) -> Option<&str> {
        self.last_search_term.as_deref()
    }

    pub fn page_url(&self) -> &Url {
        &self.page_url
    }

    /// Key whose cache entry drives the current view.
    pub fn current_key(&self) -> QueryKey {
        QueryKey::search(self.debouncer.settled(), self.options.limit)
    }

    /// Records a keystroke and returns the matching in-place URL update.
    pub fn set_input(&mut self, term: &str) -> LocationUpdate {
        self.debouncer.set(term.to_string());
        self.page_url = search_location(&self.page_url, term);
        LocationUpdate {
            url: self.page_url.to_string(),
        }
    }

    /// Applies a page URL change made outside the input box, such as history
    /// back or forward. Its `search` parameter becomes the raw input and is
    /// debounced like a keystroke.
    pub fn on_location_change(&mut self, url: &Url) {
        self.page_url = url.clone();
        self.debouncer.set(search_term_from_url(url).unwrap_or_default());
    }

    /// Resolves once the raw input has settled or the controller is disposed.
    pub async fn settled(&self) -> String {
        let mut updates = self.debouncer.subscribe();
        while self.debouncer.is_pending() && !self.debouncer.is_disposed() {
            if updates.changed().await.is_err() {
                break;
            }
        }
        self.debouncer.settled()
    }

    /// Starts the first-page fetch for the settled term without waiting for
    /// it. While idle, warms the remembered term instead.
    pub fn ensure_current_fetch(&self) -> Option<JoinHandle<()>> {
        if self.debouncer.is_pending() {
            return None;
        }
        let key = if self.input().trim().is_empty() {
            QueryKey::search(self.last_search_term.clone()?, self.options.limit)
        } else {
            self.current_key()
        };
        key.is_enabled().then(|| self.cache.prefetch(key))
    }

    /// Derives the view for the current input. A failed fetch is returned as
    /// an error for the page-level failure boundary.
    pub async fn view(&mut self) -> CoreResult<SearchView> {
        let input = self.debouncer.input();
        let debounced = self.debouncer.settled();
        let key = QueryKey::search(debounced.clone(), self.options.limit);
        let entry = if key.is_enabled() {
            self.cache.entry(&key).await
        } else {
            None
        };

        let state = derive_display_state(
            &input,
            &debounced,
            entry.as_ref(),
            self.last_search_term.as_deref(),
        );

        let mut fallback_items = Vec::new();
        match &state {
            DisplayState::Error(info) => {
                return Err(CoreError::from(info.clone()).with_operation(CatalogOperation::Search));
            }
            DisplayState::Results { .. } => self.remember(&debounced).await,
            DisplayState::Idle {
                fallback_term: Some(term),
            } => {
                let fallback_key = QueryKey::search(term.clone(), self.options.limit);
                if let Some(fallback) = self.cache.entry(&fallback_key).await {
                    fallback_items = fallback.items();
                }
            }
            _ => {}
        }

        let items = match (&state, &entry) {
            (DisplayState::Results { .. } | DisplayState::LoadingMore, Some(entry)) => {
                entry.items()
            }
            _ => Vec::new(),
        };
        let has_next_page = state.shows_results()
            && entry.as_ref().is_some_and(|entry| entry.has_next_page());
        let placeholders = if state.is_loading() {
            self.options.limit as usize * 3
        } else {
            0
        };

        Ok(SearchView {
            input,
            state,
            items,
            fallback_items,
            has_next_page,
            placeholders,
        })
    }

    /// Cancels the pending debounce timer.
    pub fn dispose(&self) {
        self.debouncer.dispose();
    }

    async fn remember(&mut self, term: &str) {
        if self.last_search_term.as_deref() == Some(term) {
            return;
        }
        self.last_search_term = Some(term.to_string());

        let store = self.store.clone();
        let owned = term.to_string();
        let outcome = tokio::task::spawn_blocking(move || store.set_last_search_term(&owned))
            .await
            .map_err(|join_error| {
                CoreError::new(
                    CoreErrorKind::Internal,
                    format!("last search persistence join failure: {join_error}"),
                )
            })
            .and_then(|result| result);
        if let Err(error) = outcome {
            tracing::error!(
                term = %term,
                kind = ?error.kind,
                message = %error.message,
                "failed to persist last search term"
            );
        }
    }
}

async fn load_last_search_term(store: Arc<dyn LastSearchStore>) -> Option<String> {
    match tokio::task::spawn_blocking(move || store.last_search_term()).await {
        Ok(Ok(term)) => term.filter(|term| !term.trim().is_empty()),
        Ok(Err(error)) => {
            tracing::warn!(
                kind = ?error.kind,
                message = %error.message,
                "failed to read last search term"
            );
            None
        }
        Err(join_error) => {
            tracing::warn!(error = %join_error, "last search lookup task failed");
            None
        }
    }
}
