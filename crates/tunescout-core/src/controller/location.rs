use url::Url;

use crate::models::{CoreError, CoreErrorKind, CoreResult};

/// Query parameter holding the active search term.
pub const SEARCH_PARAM: &str = "search";

/// In-place history update for the current page. Applying it must not
/// trigger a navigation or reset the scroll position.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct LocationUpdate {
    pub url: String,
}

pub fn parse_url(raw: &str) -> CoreResult<Url> {
    Url::parse(raw).map_err(|error| {
        CoreError::new(
            CoreErrorKind::InvalidInput,
            format!("invalid request url '{raw}': {error}"),
        )
    })
}

/// Term from the `search` parameter; blank values count as absent.
pub fn search_term_from_url(url: &Url) -> Option<String> {
    url.query_pairs()
        .find(|(name, _)| name == SEARCH_PARAM)
        .map(|(_, value)| value.into_owned())
        .filter(|value| !value.trim().is_empty())
}

/// `url` with its `search` parameter set to `term`, other parameters kept
/// in order.
pub fn search_location(url: &Url, term: &str) -> Url {
    let retained: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(name, _)| name != SEARCH_PARAM)
        .map(|(name, value)| (name.into_owned(), value.into_owned()))
        .collect();

    let mut updated = url.clone();
    updated
        .query_pairs_mut()
        .clear()
        .extend_pairs(retained)
        .append_pair(SEARCH_PARAM, term);
    updated
}
