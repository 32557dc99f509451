use serde::{Deserialize, Serialize};

use crate::models::{CoreError, CoreErrorKind, CoreResult, Page, QueryKey};

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct DehydratedEntry {
    pub key: QueryKey,
    pub pages: Vec<Page>,
}

/// Settled cache entries in a serializable form, used to hand server-side
/// fetches to a client and to persist the cache between runs.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct DehydratedState {
    pub entries: Vec<DehydratedEntry>,
}

impl DehydratedState {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, key: &QueryKey) -> Option<&DehydratedEntry> {
        self.entries.iter().find(|entry| &entry.key == key)
    }

    pub fn to_json(&self) -> CoreResult<String> {
        serde_json::to_string(self).map_err(|error| {
            CoreError::new(
                CoreErrorKind::Internal,
                format!("failed to serialize cache state: {error}"),
            )
        })
    }

    pub fn from_json(raw: &str) -> CoreResult<Self> {
        serde_json::from_str(raw).map_err(|error| {
            CoreError::new(
                CoreErrorKind::ParseFailure,
                format!("invalid dehydrated cache state: {error}"),
            )
        })
    }
}
