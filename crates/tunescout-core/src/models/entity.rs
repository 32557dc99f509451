use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct Image {
    pub url: String,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct ArtistRef {
    pub id: String,
    pub name: String,
}

#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct AlbumRef {
    pub id: String,
    pub name: String,
}

#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct Album {
    pub id: String,
    pub name: String,
    pub artists: Vec<ArtistRef>,
    pub images: Vec<Image>,
    pub release_date: Option<String>,
    pub total_tracks: Option<u32>,
}

#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct Track {
    pub id: String,
    pub name: String,
    pub artists: Vec<ArtistRef>,
    pub duration_ms: u64,
    pub preview_url: Option<String>,
    pub album: Option<AlbumRef>,
}

#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct Artist {
    pub id: String,
    pub name: String,
    pub images: Vec<Image>,
    pub genres: Vec<String>,
}

/// One card in a result list.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ResultItem {
    Album(Album),
    Track(Track),
    Artist(Artist),
}

impl ResultItem {
    pub fn id(&self) -> &str {
        match self {
            Self::Album(album) => &album.id,
            Self::Track(track) => &track.id,
            Self::Artist(artist) => &artist.id,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Album(album) => &album.name,
            Self::Track(track) => &track.name,
            Self::Artist(artist) => &artist.name,
        }
    }
}
