use serde::{Deserialize, Serialize};

use crate::auth::{AuthGate, GateDecision, GateRequest};
use crate::cache::{DehydratedState, QueryCache};
use crate::controller::search_term_from_url;
use crate::models::QueryKey;

/// Result of rendering the search page on the server.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(tag = "render", rename_all = "snake_case")]
pub enum ServerRender {
    Page {
        search_term: Option<String>,
        headers: Vec<(String, String)>,
        /// Cache contents for the client to hydrate from.
        state: DehydratedState,
    },
    Redirect {
        location: String,
    },
}

/// Gates `request` and, when a `search` parameter is present, loads its
/// first page so the client renders results without another round trip.
///
/// The state holds only what this request rendered: the search entry and the
/// album details it seeded, even when `cache` is shared across requests.
///
/// A failed fetch still renders the page; the client retries the query on
/// its own.
pub async fn render_search_page(
    gate: &AuthGate,
    cache: &QueryCache,
    request: &GateRequest,
    limit: u32,
) -> ServerRender {
    let headers = match gate.evaluate(request) {
        GateDecision::Redirect { location } => return ServerRender::Redirect { location },
        GateDecision::Allow { headers } => headers,
        GateDecision::PassThrough => Vec::new(),
    };

    let search_term = search_term_from_url(&request.url);
    let mut rendered_keys = Vec::new();
    if let Some(term) = &search_term {
        let key = QueryKey::search(term.clone(), limit);
        match cache.fetch_first_page(&key).await {
            Ok(entry) => {
                let seeded = entry.iter().flat_map(|entry| &entry.pages);
                rendered_keys.extend(
                    seeded
                        .flat_map(|page| &page.albums)
                        .map(|album| QueryKey::album(album.id.clone())),
                );
            }
            Err(error) => tracing::warn!(
                key = ?key,
                kind = ?error.kind,
                message = %error.message,
                "server-side search prefetch failed"
            ),
        }
        rendered_keys.push(key);
    }

    ServerRender::Page {
        search_term,
        headers,
        state: cache.dehydrate_keys(&rendered_keys).await,
    }
}
