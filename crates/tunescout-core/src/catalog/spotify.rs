use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::catalog::{Catalog, CatalogResult, CatalogSource};
use crate::models::{
    Album, AlbumRef, Artist, ArtistRef, CatalogOperation, CoreError, CoreErrorKind, Cursor, Image,
    Page, QueryKey, Track,
};

/// Maps Spotify Web API payloads onto catalog pages. The `next` link of a
/// listing becomes the page cursor.
pub struct SpotifyCatalog<S: CatalogSource> {
    source: S,
}

impl<S: CatalogSource> SpotifyCatalog<S> {
    pub fn new(source: S) -> Self {
        Self { source }
    }

    pub fn source(&self) -> &S {
        &self.source
    }
}

impl<S: CatalogSource> Catalog for SpotifyCatalog<S> {
    fn fetch_page(&self, key: &QueryKey, cursor: Option<&Cursor>) -> CatalogResult<Page> {
        if !key.is_enabled() {
            return Err(CoreError::new(
                CoreErrorKind::InvalidInput,
                "catalog queries require a non-empty term or id",
            )
            .with_operation(key.operation()));
        }

        let operation = key.operation();
        let raw = match (key, cursor) {
            (QueryKey::Album { .. }, Some(_)) => {
                return Err(CoreError::new(
                    CoreErrorKind::InvalidInput,
                    "album lookups are not paginated",
                )
                .with_operation(operation));
            }
            (_, Some(cursor)) => self.source.follow(operation, cursor)?,
            (QueryKey::Search(query), None) => self.source.search(&query.term, query.limit)?,
            (QueryKey::ArtistAlbums { artist_id, limit }, None) => {
                self.source.artist_albums(artist_id, *limit)?
            }
            (QueryKey::AlbumTracks { album_id, limit }, None) => {
                self.source.album_tracks(album_id, *limit)?
            }
            (QueryKey::Album { album_id }, None) => self.source.album(album_id)?,
        };

        match operation {
            CatalogOperation::Search => parse_search_page(&raw),
            CatalogOperation::ArtistAlbums => parse_artist_albums_page(&raw),
            CatalogOperation::AlbumTracks => parse_album_tracks_page(&raw),
            CatalogOperation::Album => parse_album_page(&raw),
        }
    }
}

#[derive(Deserialize)]
struct SpotifyPaging<T> {
    #[serde(default = "Vec::new")]
    items: Vec<Option<T>>,
    next: Option<String>,
}

impl<T> SpotifyPaging<T> {
    // Search listings occasionally contain null slots.
    fn into_parts(self) -> (Vec<T>, Option<String>) {
        (self.items.into_iter().flatten().collect(), self.next)
    }
}

#[derive(Deserialize)]
struct SpotifySearchResponse {
    albums: Option<SpotifyPaging<SpotifyAlbum>>,
    tracks: Option<SpotifyPaging<SpotifyTrack>>,
    artists: Option<SpotifyPaging<SpotifyArtist>>,
}

#[derive(Deserialize)]
struct SpotifyImage {
    url: String,
    width: Option<u32>,
    height: Option<u32>,
}

#[derive(Deserialize)]
struct SpotifyArtistRef {
    id: String,
    name: String,
}

#[derive(Deserialize)]
struct SpotifyAlbumRef {
    id: String,
    name: String,
}

#[derive(Deserialize)]
struct SpotifyAlbum {
    id: String,
    name: String,
    #[serde(default)]
    artists: Vec<SpotifyArtistRef>,
    #[serde(default)]
    images: Vec<SpotifyImage>,
    release_date: Option<String>,
    total_tracks: Option<u32>,
}

#[derive(Deserialize)]
struct SpotifyTrack {
    id: String,
    name: String,
    #[serde(default)]
    artists: Vec<SpotifyArtistRef>,
    #[serde(default)]
    duration_ms: u64,
    preview_url: Option<String>,
    album: Option<SpotifyAlbumRef>,
}

#[derive(Deserialize)]
struct SpotifyArtist {
    id: String,
    name: String,
    #[serde(default)]
    images: Vec<SpotifyImage>,
    #[serde(default)]
    genres: Vec<String>,
}

pub(crate) fn parse_search_page(raw: &str) -> CatalogResult<Page> {
    let response: SpotifySearchResponse = parse_json(raw, CatalogOperation::Search)?;

    let (albums, albums_next) = split_listing(response.albums);
    let (tracks, tracks_next) = split_listing(response.tracks);
    let (artists, artists_next) = split_listing(response.artists);

    Ok(Page {
        albums: albums.into_iter().map(map_album).collect(),
        tracks: tracks.into_iter().map(map_track).collect(),
        artists: artists.into_iter().map(map_artist).collect(),
        next_cursor: albums_next.or(tracks_next).or(artists_next).map(Cursor::new),
    })
}

pub(crate) fn parse_artist_albums_page(raw: &str) -> CatalogResult<Page> {
    let listing: SpotifyPaging<SpotifyAlbum> = parse_json(raw, CatalogOperation::ArtistAlbums)?;
    let (albums, next) = listing.into_parts();
    Ok(Page {
        albums: albums.into_iter().map(map_album).collect(),
        next_cursor: next.map(Cursor::new),
        ..Page::default()
    })
}

pub(crate) fn parse_album_tracks_page(raw: &str) -> CatalogResult<Page> {
    let listing: SpotifyPaging<SpotifyTrack> = parse_json(raw, CatalogOperation::AlbumTracks)?;
    let (tracks, next) = listing.into_parts();
    Ok(Page {
        tracks: tracks.into_iter().map(map_track).collect(),
        next_cursor: next.map(Cursor::new),
        ..Page::default()
    })
}

pub(crate) fn parse_album_page(raw: &str) -> CatalogResult<Page> {
    let album: SpotifyAlbum = parse_json(raw, CatalogOperation::Album)?;
    Ok(Page {
        albums: vec![map_album(album)],
        ..Page::default()
    })
}

fn split_listing<T>(listing: Option<SpotifyPaging<T>>) -> (Vec<T>, Option<String>) {
    listing.map(SpotifyPaging::into_parts).unwrap_or_default()
}

fn parse_json<T: DeserializeOwned>(raw: &str, operation: CatalogOperation) -> CatalogResult<T> {
    serde_json::from_str(raw).map_err(|error| {
        CoreError::new(
            CoreErrorKind::ParseFailure,
            format!("invalid {} response from catalog: {error}", operation.as_str()),
        )
        .with_operation(operation)
    })
}

fn map_image(image: SpotifyImage) -> Image {
    Image {
        url: image.url,
        width: image.width,
        height: image.height,
    }
}

fn map_artist_ref(artist: SpotifyArtistRef) -> ArtistRef {
    ArtistRef {
        id: artist.id,
        name: artist.name,
    }
}

fn map_album(album: SpotifyAlbum) -> Album {
    Album {
        id: album.id,
        name: album.name,
        artists: album.artists.into_iter().map(map_artist_ref).collect(),
        images: album.images.into_iter().map(map_image).collect(),
        release_date: album.release_date,
        total_tracks: album.total_tracks,
    }
}

fn map_track(track: SpotifyTrack) -> Track {
    Track {
        id: track.id,
        name: track.name,
        artists: track.artists.into_iter().map(map_artist_ref).collect(),
        duration_ms: track.duration_ms,
        preview_url: track.preview_url,
        album: track.album.map(|album| AlbumRef {
            id: album.id,
            name: album.name,
        }),
    }
}

fn map_artist(artist: SpotifyArtist) -> Artist {
    Artist {
        id: artist.id,
        name: artist.name,
        images: artist.images.into_iter().map(map_image).collect(),
        genres: artist.genres,
    }
}
