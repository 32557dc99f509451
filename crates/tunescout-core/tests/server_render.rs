mod support;

use std::sync::Arc;

use support::{FakeCatalog, album_page, cache_over};
use tunescout_core::auth::{AuthGate, GateRequest, SessionIdentity};
use tunescout_core::cache::QueryCache;
use tunescout_core::controller::parse_url;
use tunescout_core::models::{CoreErrorKind, QueryKey};
use tunescout_core::server::{ServerRender, render_search_page};

fn request(url: &str, session: Option<&str>) -> GateRequest {
    GateRequest::new(parse_url(url).unwrap(), session.map(SessionIdentity::new))
}

#[tokio::test]
async fn search_parameter_is_prefetched_into_the_dehydrated_state() {
    let key = QueryKey::search("daft punk", 5);
    let catalog =
        Arc::new(FakeCatalog::new().respond(key.clone(), None, album_page(0, 5, Some("c1"))));
    let cache = cache_over(&catalog);

    let render = render_search_page(
        &AuthGate::default(),
        &cache,
        &request("https://tunescout.app/?search=daft%20punk", None),
        5,
    )
    .await;

    let ServerRender::Page {
        search_term,
        headers,
        state,
    } = &render
    else {
        panic!("expected a rendered page, got {render:?}");
    };
    assert_eq!(search_term.as_deref(), Some("daft punk"));
    assert!(headers.iter().any(|(name, _)| name == "x-modified-edge"));
    assert_eq!(state.get(&key).unwrap().pages[0].albums.len(), 5);

    let json = serde_json::to_string(&render).unwrap();
    let decoded: ServerRender = serde_json::from_str(&json).unwrap();
    assert_eq!(decoded, render);

    let ServerRender::Page { state, .. } = decoded else {
        unreachable!();
    };
    let client = QueryCache::new(Arc::new(FakeCatalog::new()));
    client.hydrate(state).await;
    assert_eq!(client.entry(&key).await.unwrap().items().len(), 5);
}

#[tokio::test]
async fn page_without_a_term_renders_empty_state() {
    let catalog = Arc::new(FakeCatalog::new());
    let render = render_search_page(
        &AuthGate::default(),
        &cache_over(&catalog),
        &request("https://tunescout.app/", None),
        5,
    )
    .await;

    let ServerRender::Page {
        search_term, state, ..
    } = render
    else {
        panic!("expected a rendered page");
    };
    assert_eq!(search_term, None);
    assert!(state.is_empty());
    assert_eq!(catalog.call_count(), 0);
}

#[tokio::test]
async fn gated_pages_redirect_before_fetching() {
    let catalog = Arc::new(FakeCatalog::new());
    let render = render_search_page(
        &AuthGate::default(),
        &cache_over(&catalog),
        &request("https://tunescout.app/account?search=daft", None),
        5,
    )
    .await;

    let ServerRender::Redirect { location } = render else {
        panic!("expected a redirect");
    };
    assert!(location.starts_with("https://tunescout.app/auth/sign-in?redirect_url="));
    assert_eq!(catalog.call_count(), 0);

    let allowed = render_search_page(
        &AuthGate::default(),
        &cache_over(&catalog),
        &request("https://tunescout.app/account", Some("user_1")),
        5,
    )
    .await;
    assert!(matches!(allowed, ServerRender::Page { .. }));
}

#[tokio::test]
async fn failed_prefetch_still_renders_the_page() {
    let key = QueryKey::search("daft punk", 5);
    let catalog = Arc::new(FakeCatalog::new().fail(key.clone(), None, CoreErrorKind::Timeout));
    let render = render_search_page(
        &AuthGate::default(),
        &cache_over(&catalog),
        &request("https://tunescout.app/?search=daft+punk", None),
        5,
    )
    .await;

    let ServerRender::Page { state, .. } = render else {
        panic!("expected a rendered page");
    };
    assert!(state.get(&key).is_none());
}

#[tokio::test]
async fn render_state_excludes_entries_from_other_requests() {
    let rendered = QueryKey::search("daft punk", 5);
    let other = QueryKey::search("boards of canada", 5);
    let catalog = Arc::new(
        FakeCatalog::new()
            .respond(rendered.clone(), None, album_page(0, 2, None))
            .respond(other.clone(), None, album_page(100, 3, None)),
    );
    let cache = cache_over(&catalog);
    cache.fetch_first_page(&other).await.unwrap();

    let render = render_search_page(
        &AuthGate::default(),
        &cache,
        &request("https://tunescout.app/?search=daft+punk", None),
        5,
    )
    .await;

    let ServerRender::Page { state, .. } = render else {
        panic!("expected a rendered page");
    };
    assert!(state.get(&other).is_none());
    assert!(state.get(&QueryKey::album("a100")).is_none());
    assert!(state.get(&rendered).is_some());
    assert!(state.get(&QueryKey::album("a0")).is_some());
    assert!(state.get(&QueryKey::album("a1")).is_some());
    assert_eq!(state.entries.len(), 3);
}
