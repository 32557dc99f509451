pub mod entity;
pub mod error;
pub mod page;
pub mod query;

pub use entity::{Album, AlbumRef, Artist, ArtistRef, Image, ResultItem, Track};
pub use error::{CoreError, CoreErrorKind, CoreResult, ErrorInfo};
pub use page::{Cursor, Page};
pub use query::{CatalogOperation, QueryKey, SearchQuery};
