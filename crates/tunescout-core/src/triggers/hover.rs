use tokio::task::JoinHandle;

use crate::cache::QueryCache;
use crate::config::DEFAULT_PREFETCH_LIMIT;
use crate::models::{QueryKey, ResultItem};

/// Warms the child listing of a hovered card: an album's tracks or an
/// artist's albums.
pub struct HoverPrefetcher {
    cache: QueryCache,
    page_size: u32,
}

impl HoverPrefetcher {
    pub fn new(cache: QueryCache) -> Self {
        Self::with_page_size(cache, DEFAULT_PREFETCH_LIMIT)
    }

    pub fn with_page_size(cache: QueryCache, page_size: u32) -> Self {
        Self { cache, page_size }
    }

    pub fn child_key(&self, item: &ResultItem) -> Option<QueryKey> {
        match item {
            ResultItem::Album(album) => {
                Some(QueryKey::album_tracks(album.id.clone(), self.page_size))
            }
            ResultItem::Artist(artist) => {
                Some(QueryKey::artist_albums(artist.id.clone(), self.page_size))
            }
            ResultItem::Track(_) => None,
        }
    }

    /// Fire-and-forget; the returned handle may be dropped.
    pub fn on_pointer_enter(&self, item: &ResultItem) -> Option<JoinHandle<()>> {
        let key = self.child_key(item)?;
        Some(self.cache.prefetch(key))
    }
}
