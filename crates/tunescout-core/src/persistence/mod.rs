pub mod memory;

pub use memory::InMemoryStore;

use crate::cache::DehydratedState;
use crate::models::CoreError;

pub type PersistenceResult<T> = Result<T, CoreError>;

/// Durable client-side key for the last term that produced visible results.
pub const LAST_SEARCH_TERM_KEY: &str = "lastSearchTerm";

pub trait MigrationStore: Send + Sync {
    fn current_version(&self) -> PersistenceResult<i64>;

    fn apply_migration(&self, target_version: i64) -> PersistenceResult<()>;
}

pub trait LastSearchStore: Send + Sync {
    fn last_search_term(&self) -> PersistenceResult<Option<String>>;

    fn set_last_search_term(&self, term: &str) -> PersistenceResult<()>;
}

pub trait QueryCacheSnapshotStore: Send + Sync {
    fn save_snapshot(&self, state: &DehydratedState) -> PersistenceResult<()>;

    fn load_snapshot(&self) -> PersistenceResult<Option<DehydratedState>>;
}
