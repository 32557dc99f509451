use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct SearchQuery {
    pub term: String,
    pub limit: u32,
}

impl SearchQuery {
    pub fn new(term: impl Into<String>, limit: u32) -> Self {
        Self {
            term: term.into(),
            limit,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum CatalogOperation {
    Search,
    ArtistAlbums,
    AlbumTracks,
    Album,
}

impl CatalogOperation {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Search => "search",
            Self::ArtistAlbums => "artist_albums",
            Self::AlbumTracks => "album_tracks",
            Self::Album => "album",
        }
    }
}

/// Cache identity: the catalog operation plus its parameters.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(tag = "operation", rename_all = "snake_case")]
pub enum QueryKey {
    Search(SearchQuery),
    ArtistAlbums { artist_id: String, limit: u32 },
    AlbumTracks { album_id: String, limit: u32 },
    Album { album_id: String },
}

impl QueryKey {
    pub fn search(term: impl Into<String>, limit: u32) -> Self {
        Self::Search(SearchQuery::new(term, limit))
    }

    pub fn artist_albums(artist_id: impl Into<String>, limit: u32) -> Self {
        Self::ArtistAlbums {
            artist_id: artist_id.into(),
            limit,
        }
    }

    pub fn album_tracks(album_id: impl Into<String>, limit: u32) -> Self {
        Self::AlbumTracks {
            album_id: album_id.into(),
            limit,
        }
    }

    pub fn album(album_id: impl Into<String>) -> Self {
        Self::Album {
            album_id: album_id.into(),
        }
    }

    pub fn operation(&self) -> CatalogOperation {
        match self {
            Self::Search(_) => CatalogOperation::Search,
            Self::ArtistAlbums { .. } => CatalogOperation::ArtistAlbums,
            Self::AlbumTracks { .. } => CatalogOperation::AlbumTracks,
            Self::Album { .. } => CatalogOperation::Album,
        }
    }

    /// The catalog rejects empty terms and ids, so such keys never fetch.
    pub fn is_enabled(&self) -> bool {
        let subject = match self {
            Self::Search(query) => query.term.as_str(),
            Self::ArtistAlbums { artist_id, .. } => artist_id.as_str(),
            Self::AlbumTracks { album_id, .. } | Self::Album { album_id } => album_id.as_str(),
        };
        !subject.trim().is_empty()
    }
}
