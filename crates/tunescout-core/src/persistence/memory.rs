use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use crate::cache::DehydratedState;
use crate::models::{CoreError, CoreErrorKind};
use crate::persistence::{
    LAST_SEARCH_TERM_KEY, LastSearchStore, PersistenceResult, QueryCacheSnapshotStore,
};

/// Non-durable store for short-lived sessions and tests.
#[derive(Default)]
pub struct InMemoryStore {
    values: Mutex<HashMap<String, String>>,
    snapshot: Mutex<Option<DehydratedState>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn values(&self) -> PersistenceResult<MutexGuard<'_, HashMap<String, String>>> {
        self.values.lock().map_err(|_| poisoned())
    }
}

impl LastSearchStore for InMemoryStore {
    fn last_search_term(&self) -> PersistenceResult<Option<String>> {
        Ok(self.values()?.get(LAST_SEARCH_TERM_KEY).cloned())
    }

    fn set_last_search_term(&self, term: &str) -> PersistenceResult<()> {
        self.values()?
            .insert(LAST_SEARCH_TERM_KEY.to_string(), term.to_string());
        Ok(())
    }
}

impl QueryCacheSnapshotStore for InMemoryStore {
    fn save_snapshot(&self, state: &DehydratedState) -> PersistenceResult<()> {
        *self.snapshot.lock().map_err(|_| poisoned())? = Some(state.clone());
        Ok(())
    }

    fn load_snapshot(&self) -> PersistenceResult<Option<DehydratedState>> {
        Ok(self.snapshot.lock().map_err(|_| poisoned())?.clone())
    }
}

fn poisoned() -> CoreError {
    CoreError::new(CoreErrorKind::Internal, "in-memory store mutex poisoned")
}
