use serde::{Deserialize, Serialize};

use crate::models::{Cursor, ErrorInfo, Page, QueryKey, ResultItem};

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum FetchStatus {
    Idle,
    Loading,
    LoadingMore,
    Error,
    Settled,
}

impl FetchStatus {
    pub fn is_fetching(self) -> bool {
        matches!(self, Self::Loading | Self::LoadingMore)
    }
}

/// Snapshot of one cached query. Pages are in fetch order.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct QueryCacheEntry {
    pub key: QueryKey,
    pub pages: Vec<Page>,
    pub status: FetchStatus,
    pub error: Option<ErrorInfo>,
}

impl QueryCacheEntry {
    pub(crate) fn new(key: QueryKey) -> Self {
        Self {
            key,
            pages: Vec::new(),
            status: FetchStatus::Idle,
            error: None,
        }
    }

    pub fn is_fetching(&self) -> bool {
        self.status.is_fetching()
    }

    pub fn next_cursor(&self) -> Option<&Cursor> {
        self.pages.last().and_then(|page| page.next_cursor.as_ref())
    }

    pub fn has_next_page(&self) -> bool {
        self.next_cursor().is_some()
    }

    pub fn result_count(&self) -> usize {
        self.pages.iter().map(Page::result_count).sum()
    }

    pub fn items(&self) -> Vec<ResultItem> {
        self.pages.iter().flat_map(Page::items).collect()
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum FetchOutcome {
    Fetched,
    Skipped(SkipReason),
}

impl FetchOutcome {
    pub fn was_fetched(self) -> bool {
        self == Self::Fetched
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SkipReason {
    /// The key has an empty term or id.
    Disabled,
    /// No first page has been loaded yet.
    Absent,
    /// The last page carried no cursor.
    Terminal,
    InFlight,
    /// The entry was reseeded while the page was loading; the page was dropped.
    Superseded,
}
