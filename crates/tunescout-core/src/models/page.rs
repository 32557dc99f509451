use serde::{Deserialize, Serialize};

use crate::models::ResultItem;
use crate::models::entity::{Album, Artist, Track};

/// Continuation token issued by the catalog. Nothing outside a catalog
/// transport should read the inner value.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cursor(String);

impl Cursor {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn token(&self) -> &str {
        &self.0
    }
}

#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct Page {
    #[serde(default)]
    pub albums: Vec<Album>,
    #[serde(default)]
    pub tracks: Vec<Track>,
    #[serde(default)]
    pub artists: Vec<Artist>,
    pub next_cursor: Option<Cursor>,
}

impl Page {
    pub fn is_terminal(&self) -> bool {
        self.next_cursor.is_none()
    }

    pub fn result_count(&self) -> usize {
        self.albums.len() + self.tracks.len() + self.artists.len()
    }

    /// Albums first, then tracks, then artists.
    pub fn items(&self) -> impl Iterator<Item = ResultItem> + '_ {
        self.albums
            .iter()
            .cloned()
            .map(ResultItem::Album)
            .chain(self.tracks.iter().cloned().map(ResultItem::Track))
            .chain(self.artists.iter().cloned().map(ResultItem::Artist))
    }
}
