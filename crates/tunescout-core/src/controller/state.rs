use serde::{Deserialize, Serialize};

use crate::cache::{FetchStatus, QueryCacheEntry};
use crate::models::{CoreErrorKind, ErrorInfo};

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum DisplayState {
    /// No active term; show the last successful search if there is one.
    Idle { fallback_term: Option<String> },
    /// The raw input has not settled yet.
    Typing,
    LoadingFirstPage,
    /// A continuation is loading; earlier pages stay visible.
    LoadingMore,
    Empty,
    Results { has_next_page: bool },
    Error(ErrorInfo),
}

impl DisplayState {
    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Typing | Self::LoadingFirstPage | Self::LoadingMore)
    }

    pub fn shows_results(&self) -> bool {
        matches!(self, Self::Results { .. } | Self::LoadingMore)
    }
}

/// Decides what the result list shows for the current input.
///
/// `entry` must be the cache entry for `debounced`; results belonging to any
/// other term are never consulted.
pub fn derive_display_state(
    raw: &str,
    debounced: &str,
    entry: Option<&QueryCacheEntry>,
    last_search_term: Option<&str>,
) -> DisplayState {
    if raw.trim().is_empty() {
        return DisplayState::Idle {
            fallback_term: last_search_term
                .filter(|term| !term.trim().is_empty())
                .map(str::to_string),
        };
    }

    if raw != debounced {
        return DisplayState::Typing;
    }

    let Some(entry) = entry else {
        return DisplayState::LoadingFirstPage;
    };

    match entry.status {
        FetchStatus::Error => DisplayState::Error(entry.error.clone().unwrap_or(ErrorInfo {
            kind: CoreErrorKind::Internal,
            message: "fetch failed without detail".to_string(),
        })),
        FetchStatus::Idle | FetchStatus::Loading | FetchStatus::LoadingMore
            if entry.pages.is_empty() =>
        {
            DisplayState::LoadingFirstPage
        }
        FetchStatus::Loading | FetchStatus::LoadingMore => DisplayState::LoadingMore,
        FetchStatus::Idle | FetchStatus::Settled if entry.result_count() == 0 => {
            DisplayState::Empty
        }
        FetchStatus::Idle | FetchStatus::Settled => DisplayState::Results {
            has_next_page: entry.has_next_page(),
        },
    }
}
