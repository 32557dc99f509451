#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use tunescout_core::cache::QueryCache;
use tunescout_core::catalog::{Catalog, CatalogResult};
use tunescout_core::models::{
    Album, ArtistRef, CoreError, CoreErrorKind, Cursor, Page, QueryKey, Track,
};

type Script = HashMap<(QueryKey, Option<Cursor>), Result<Page, CoreErrorKind>>;

/// Scripted catalog. Unscripted requests answer with an empty terminal page.
pub struct FakeCatalog {
    script: Mutex<Script>,
    calls: Mutex<Vec<(QueryKey, Option<Cursor>)>>,
    call_count: AtomicUsize,
    delay: Duration,
}

impl FakeCatalog {
    pub fn new() -> Self {
        Self::with_delay(Duration::ZERO)
    }

    pub fn with_delay(delay: Duration) -> Self {
        Self {
            script: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
            call_count: AtomicUsize::new(0),
            delay,
        }
    }

    pub fn respond(self, key: QueryKey, cursor: Option<&str>, page: Page) -> Self {
        self.script
            .lock()
            .unwrap()
            .insert((key, cursor.map(Cursor::new)), Ok(page));
        self
    }

    pub fn fail(self, key: QueryKey, cursor: Option<&str>, kind: CoreErrorKind) -> Self {
        self.script
            .lock()
            .unwrap()
            .insert((key, cursor.map(Cursor::new)), Err(kind));
        self
    }

    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }

    pub fn calls(&self) -> Vec<(QueryKey, Option<Cursor>)> {
        self.calls.lock().unwrap().clone()
    }
}

impl Catalog for FakeCatalog {
    fn fetch_page(&self, key: &QueryKey, cursor: Option<&Cursor>) -> CatalogResult<Page> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        self.calls
            .lock()
            .unwrap()
            .push((key.clone(), cursor.cloned()));
        if !self.delay.is_zero() {
            std::thread::sleep(self.delay);
        }

        match self
            .script
            .lock()
            .unwrap()
            .get(&(key.clone(), cursor.cloned()))
        {
            Some(Ok(page)) => Ok(page.clone()),
            Some(Err(kind)) => Err(CoreError::new(*kind, "scripted failure")),
            None => Ok(Page::default()),
        }
    }
}

pub fn album(id: &str) -> Album {
    Album {
        id: id.to_string(),
        name: format!("Album {id}"),
        artists: vec![ArtistRef {
            id: "4tZwfgrHOc3mvqYlEYSvVi".to_string(),
            name: "Daft Punk".to_string(),
        }],
        images: Vec::new(),
        release_date: Some("2001-03-12".to_string()),
        total_tracks: Some(14),
    }
}

pub fn track(id: &str) -> Track {
    Track {
        id: id.to_string(),
        name: format!("Track {id}"),
        artists: Vec::new(),
        duration_ms: 320_000,
        preview_url: Some(format!("https://p.scdn.co/mp3-preview/{id}")),
        album: None,
    }
}

/// Albums `a{start}`..`a{start + count - 1}`.
pub fn album_page(start: usize, count: usize, next: Option<&str>) -> Page {
    Page {
        albums: (start..start + count)
            .map(|index| album(&format!("a{index}")))
            .collect(),
        next_cursor: next.map(Cursor::new),
        ..Page::default()
    }
}

pub fn cache_over(catalog: &std::sync::Arc<FakeCatalog>) -> QueryCache {
    QueryCache::new(catalog.clone())
}

/// Polls until `key` has a fetch in flight.
pub async fn wait_until_fetching(cache: &QueryCache, key: &QueryKey) {
    for _ in 0..200 {
        if cache.is_fetching(key).await {
            return;
        }
        tokio::time::sleep(Duration::from_millis(2)).await;
    }
    panic!("fetch for {key:?} never started");
}

/// Polls until the entry for `key` holds `pages` pages.
pub async fn wait_for_pages(cache: &QueryCache, key: &QueryKey, pages: usize) {
    for _ in 0..200 {
        if cache.entry(key).await.is_some_and(|entry| entry.pages.len() == pages) {
            return;
        }
        tokio::time::sleep(Duration::from_millis(2)).await;
    }
    panic!("entry for {key:?} never reached {pages} pages");
}

pub fn temp_db_path(test_name: &str) -> std::path::PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    std::env::temp_dir().join(format!("tunescout-{test_name}-{nanos}.sqlite3"))
}
