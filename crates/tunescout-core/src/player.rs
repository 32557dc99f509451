use serde::Serialize;

use crate::models::Track;

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PlayerStatus {
    Playing { index: usize, source: String },
    /// The current track has no preview clip.
    NoPreview { playlist: bool },
}

/// Preview playback over a fixed track list. Finishing a clip advances to
/// the next track, wrapping after the last one.
#[derive(Clone, Debug, Default)]
pub struct PreviewPlaylist {
    tracks: Vec<Track>,
    index: usize,
}

impl PreviewPlaylist {
    pub fn new(tracks: Vec<Track>) -> Self {
        Self { tracks, index: 0 }
    }

    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn is_playlist(&self) -> bool {
        self.tracks.len() > 1
    }

    pub fn current(&self) -> Option<&Track> {
        self.tracks.get(self.index)
    }

    pub fn preview_source(&self) -> Option<&str> {
        self.current()?.preview_url.as_deref()
    }

    pub fn next(&mut self) -> Option<&Track> {
        if self.tracks.is_empty() {
            return None;
        }
        self.index = (self.index + 1) % self.tracks.len();
        self.current()
    }

    pub fn previous(&mut self) -> Option<&Track> {
        self.index = self.index.saturating_sub(1);
        self.current()
    }

    /// Jumps to `index` if it is in range.
    pub fn select(&mut self, index: usize) -> Option<&Track> {
        if index >= self.tracks.len() {
            return None;
        }
        self.index = index;
        self.current()
    }

    pub fn on_ended(&mut self) -> Option<&Track> {
        self.next()
    }

    pub fn status(&self) -> PlayerStatus {
        match self.preview_source() {
            Some(source) => PlayerStatus::Playing {
                index: self.index,
                source: source.to_string(),
            },
            None => PlayerStatus::NoPreview {
                playlist: self.is_playlist(),
            },
        }
    }
}
