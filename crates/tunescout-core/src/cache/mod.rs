pub mod dehydrate;
pub mod entry;
pub mod query_cache;

pub use dehydrate::{DehydratedEntry, DehydratedState};
pub use entry::{FetchOutcome, FetchStatus, QueryCacheEntry, SkipReason};
pub use query_cache::QueryCache;

use crate::models::CoreError;

pub type CacheResult<T> = Result<T, CoreError>;
