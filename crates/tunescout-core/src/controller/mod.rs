pub mod location;
pub mod search;
pub mod state;

pub use location::{LocationUpdate, SEARCH_PARAM, parse_url, search_location, search_term_from_url};
pub use search::{SearchController, SearchOptions, SearchView};
pub use state::{DisplayState, derive_display_state};
