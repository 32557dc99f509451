use std::collections::HashMap;

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct ScrollOffset {
    pub x: u32,
    pub y: u32,
}

/// Scroll offsets remembered per page URL, saved when leaving a page and
/// restored on return.
#[derive(Debug, Default)]
pub struct ScrollRestoration {
    positions: HashMap<String, ScrollOffset>,
}

impl ScrollRestoration {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn save(&mut self, url: &str, offset: ScrollOffset) {
        self.positions.insert(url.to_string(), offset);
    }

    pub fn restore(&self, url: &str) -> Option<ScrollOffset> {
        self.positions.get(url).copied()
    }

    pub fn forget(&mut self, url: &str) -> Option<ScrollOffset> {
        self.positions.remove(url)
    }
}
