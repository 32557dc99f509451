mod support;

use std::sync::Arc;
use std::time::Duration;

use support::{FakeCatalog, album_page, cache_over};
use tunescout_core::cache::FetchOutcome;
use tunescout_core::controller::{DisplayState, SearchController, SearchOptions, parse_url};
use tunescout_core::models::{CatalogOperation, CoreErrorKind, QueryKey};
use tunescout_core::persistence::{InMemoryStore, LastSearchStore};
use tunescout_core::triggers::ScrollLoader;

const OPTIONS: SearchOptions = SearchOptions {
    limit: 5,
    debounce: Duration::from_millis(20),
};

fn daft_punk() -> QueryKey {
    QueryKey::search("daft punk", 5)
}

fn daft_punk_catalog() -> Arc<FakeCatalog> {
    Arc::new(
        FakeCatalog::new()
            .respond(daft_punk(), None, album_page(0, 5, Some("c1")))
            .respond(daft_punk(), Some("c1"), album_page(5, 5, None)),
    )
}

async fn mount(
    catalog: &Arc<FakeCatalog>,
    store: &Arc<InMemoryStore>,
    url: &str,
) -> SearchController {
    SearchController::mount(
        cache_over(catalog),
        store.clone(),
        parse_url(url).unwrap(),
        OPTIONS,
    )
    .await
}

#[tokio::test]
async fn typing_a_term_then_scrolling_loads_two_pages() {
    let catalog = daft_punk_catalog();
    let store = Arc::new(InMemoryStore::new());
    let mut controller = mount(&catalog, &store, "https://tunescout.app/?tab=albums").await;

    let location = controller.set_input("daft punk");
    assert_eq!(
        location.url,
        "https://tunescout.app/?tab=albums&search=daft+punk"
    );

    let typing = controller.view().await.unwrap();
    assert_eq!(typing.state, DisplayState::Typing);
    assert_eq!(typing.placeholders, 15);
    assert!(typing.items.is_empty());

    assert_eq!(controller.settled().await, "daft punk");
    controller.ensure_current_fetch().unwrap().await.unwrap();

    let first = controller.view().await.unwrap();
    assert_eq!(first.state, DisplayState::Results { has_next_page: true });
    assert_eq!(first.items.len(), 5);
    assert!(first.has_next_page);
    assert_eq!(first.placeholders, 0);

    let loader = ScrollLoader::new(controller.cache().clone());
    let outcome = loader
        .on_visibility(&controller.current_key(), true)
        .await
        .unwrap();
    assert_eq!(outcome, Some(FetchOutcome::Fetched));

    let second = controller.view().await.unwrap();
    assert_eq!(second.items.len(), 10);
    assert!(second.items.iter().all(|item| matches!(
        item,
        tunescout_core::models::ResultItem::Album(_)
    )));
    assert!(!second.has_next_page);
    assert_eq!(catalog.call_count(), 2);
    assert_eq!(store.last_search_term().unwrap().as_deref(), Some("daft punk"));
}

#[tokio::test]
async fn empty_input_is_idle_and_never_fetches() {
    let catalog = daft_punk_catalog();
    let store = Arc::new(InMemoryStore::new());
    let mut controller = mount(&catalog, &store, "https://tunescout.app/").await;

    let view = controller.view().await.unwrap();
    assert_eq!(view.state, DisplayState::Idle { fallback_term: None });
    assert!(controller.ensure_current_fetch().is_none());

    controller.set_input("   ");
    controller.settled().await;
    assert!(controller.ensure_current_fetch().is_none());
    assert_eq!(catalog.call_count(), 0);
}

#[tokio::test]
async fn a_term_without_matches_shows_the_empty_state() {
    let catalog = daft_punk_catalog();
    let store = Arc::new(InMemoryStore::new());
    let mut controller = mount(&catalog, &store, "https://tunescout.app/").await;

    controller.set_input("zzzznotfound");
    controller.settled().await;
    controller.ensure_current_fetch().unwrap().await.unwrap();

    let view = controller.view().await.unwrap();
    assert_eq!(view.state, DisplayState::Empty);
    assert!(view.items.is_empty());
    assert_eq!(store.last_search_term().unwrap(), None);
}

#[tokio::test]
async fn idle_page_falls_back_to_the_last_search() {
    let catalog = daft_punk_catalog();
    let store = Arc::new(InMemoryStore::new());
    store.set_last_search_term("daft punk").unwrap();
    let mut controller = mount(&catalog, &store, "https://tunescout.app/").await;
    assert_eq!(controller.last_search_term(), Some("daft punk"));

    controller.ensure_current_fetch().unwrap().await.unwrap();
    let view = controller.view().await.unwrap();

    assert_eq!(
        view.state,
        DisplayState::Idle {
            fallback_term: Some("daft punk".to_string())
        }
    );
    assert!(view.items.is_empty());
    assert_eq!(view.fallback_items.len(), 5);
}

#[tokio::test]
async fn search_parameter_settles_immediately_on_mount() {
    let catalog = daft_punk_catalog();
    let store = Arc::new(InMemoryStore::new());
    let mut controller =
        mount(&catalog, &store, "https://tunescout.app/?search=daft+punk").await;

    assert_eq!(controller.debounced_term(), "daft punk");
    let loading = controller.view().await.unwrap();
    assert_eq!(loading.state, DisplayState::LoadingFirstPage);
    assert!(loading.placeholders > 0);

    controller.ensure_current_fetch().unwrap().await.unwrap();
    assert!(controller.view().await.unwrap().state.shows_results());
}

#[tokio::test]
async fn failed_search_surfaces_as_an_error() {
    let catalog = Arc::new(FakeCatalog::new().fail(
        daft_punk(),
        None,
        CoreErrorKind::UpstreamFailure,
    ));
    let store = Arc::new(InMemoryStore::new());
    let mut controller =
        mount(&catalog, &store, "https://tunescout.app/?search=daft+punk").await;

    controller.ensure_current_fetch().unwrap().await.unwrap();
    let error = controller.view().await.unwrap_err();
    assert_eq!(error.kind, CoreErrorKind::UpstreamFailure);
    assert_eq!(error.operation, Some(CatalogOperation::Search));
}

#[tokio::test]
async fn dispose_keeps_the_last_settled_term() {
    let catalog = daft_punk_catalog();
    let store = Arc::new(InMemoryStore::new());
    let mut controller = mount(&catalog, &store, "https://tunescout.app/").await;

    controller.set_input("daft");
    controller.dispose();
    tokio::time::sleep(Duration::from_millis(60)).await;

    assert_eq!(controller.debounced_term(), "");
    assert_eq!(controller.settled().await, "");
    assert_eq!(catalog.call_count(), 0);
}

#[tokio::test]
async fn history_navigation_drives_the_input() {
    let catalog = daft_punk_catalog();
    let store = Arc::new(InMemoryStore::new());
    let mut controller = mount(&catalog, &store, "https://tunescout.app/").await;

    controller.set_input("daft punk");
    controller.settled().await;
    controller.ensure_current_fetch().unwrap().await.unwrap();
    assert!(controller.view().await.unwrap().state.shows_results());

    let forward = parse_url("https://tunescout.app/?tab=albums&search=zzzznotfound").unwrap();
    controller.on_location_change(&forward);
    assert_eq!(controller.input(), "zzzznotfound");
    assert_eq!(controller.page_url(), &forward);
    assert_eq!(controller.view().await.unwrap().state, DisplayState::Typing);

    assert_eq!(controller.settled().await, "zzzznotfound");
    controller.ensure_current_fetch().unwrap().await.unwrap();
    assert_eq!(controller.view().await.unwrap().state, DisplayState::Empty);

    controller.on_location_change(&parse_url("https://tunescout.app/").unwrap());
    assert_eq!(controller.input(), "");
    let view = controller.view().await.unwrap();
    assert_eq!(
        view.state,
        DisplayState::Idle {
            fallback_term: Some("daft punk".to_string())
        }
    );
    assert_eq!(view.fallback_items.len(), 5);

    let location = controller.set_input("daft");
    assert_eq!(location.url, "https://tunescout.app/?search=daft");
}

#[tokio::test]
async fn a_superseded_term_never_reaches_the_view() {
    let daft = QueryKey::search("daft", 5);
    let catalog = Arc::new(
        FakeCatalog::with_delay(Duration::from_millis(100))
            .respond(daft.clone(), None, album_page(0, 5, None)),
    );
    let store = Arc::new(InMemoryStore::new());
    let mut controller = mount(&catalog, &store, "https://tunescout.app/").await;

    controller.set_input("daft");
    controller.settled().await;
    let stale = controller.ensure_current_fetch().unwrap();

    controller.set_input("daft punk");
    assert_eq!(controller.settled().await, "daft punk");
    stale.await.unwrap();

    assert!(controller.cache().entry(&daft).await.is_some());
    let view = controller.view().await.unwrap();
    assert_eq!(view.state, DisplayState::LoadingFirstPage);
    assert!(view.items.is_empty());
    assert!(!view.has_next_page);
    assert_eq!(store.last_search_term().unwrap(), None);
}
