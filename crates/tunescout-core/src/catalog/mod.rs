pub mod http;
pub mod spotify;

pub use http::{ClientCredentials, HttpCatalogSource};
pub use spotify::SpotifyCatalog;

use crate::models::{CatalogOperation, CoreError, Cursor, Page, QueryKey};

pub type CatalogResult<T> = Result<T, CoreError>;

/// Raw transport to the remote catalog. Each call returns the upstream JSON
/// body untouched.
pub trait CatalogSource: Send + Sync {
    fn search(&self, term: &str, limit: u32) -> CatalogResult<String>;

    fn artist_albums(&self, artist_id: &str, limit: u32) -> CatalogResult<String>;

    fn album_tracks(&self, album_id: &str, limit: u32) -> CatalogResult<String>;

    fn album(&self, album_id: &str) -> CatalogResult<String>;

    /// Continues a listing from a cursor issued by an earlier response.
    fn follow(&self, operation: CatalogOperation, cursor: &Cursor) -> CatalogResult<String>;
}

/// Typed catalog used by the query cache. Calls block; the cache runs them
/// off the async executor.
pub trait Catalog: Send + Sync {
    fn fetch_page(&self, key: &QueryKey, cursor: Option<&Cursor>) -> CatalogResult<Page>;
}
