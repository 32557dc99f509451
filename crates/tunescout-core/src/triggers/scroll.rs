use std::sync::atomic::{AtomicBool, Ordering};

use crate::cache::{CacheResult, FetchOutcome, QueryCache};
use crate::models::QueryKey;

/// Loads the next page when the end-of-list sentinel scrolls into view.
pub struct ScrollLoader {
    cache: QueryCache,
    visible: AtomicBool,
}

impl ScrollLoader {
    pub fn new(cache: QueryCache) -> Self {
        Self {
            cache,
            visible: AtomicBool::new(false),
        }
    }

    pub fn is_visible(&self) -> bool {
        self.visible.load(Ordering::SeqCst)
    }

    /// Handles a visibility change of the sentinel for the list showing
    /// `key`. Only the hidden → visible edge can trigger a fetch, and the
    /// cache skips it when a fetch for `key` is already running.
    ///
    /// Returns `None` when the change did not trigger anything.
    pub async fn on_visibility(
        &self,
        key: &QueryKey,
        visible: bool,
    ) -> CacheResult<Option<FetchOutcome>> {
        let was_visible = self.visible.swap(visible, Ordering::SeqCst);
        if !visible || was_visible {
            return Ok(None);
        }
        self.cache.fetch_next_page(key).await.map(Some)
    }
}
