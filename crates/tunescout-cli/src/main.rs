use std::error::Error;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::{EnvFilter, fmt};
use tunescout_core::auth::{AuthGate, GateRequest, SessionIdentity};
use tunescout_core::cache::QueryCache;
use tunescout_core::catalog::{HttpCatalogSource, SpotifyCatalog};
use tunescout_core::config::{AppConfig, ConfigError};
use tunescout_core::controller::{SearchController, SearchOptions, parse_url};
use tunescout_core::models::ResultItem;
use tunescout_core::persistence::{LastSearchStore, QueryCacheSnapshotStore};
use tunescout_core::server::render_search_page;
use tunescout_core::sqlite::SqliteStore;
use tunescout_core::triggers::{HoverPrefetcher, ScrollLoader};

const PAGE_URL: &str = "https://tunescout.local/";

type CliResult<T> = Result<T, Box<dyn Error>>;

/// Called only by the subcommands that reach the catalog or the database.
type ConfigLoader = fn() -> Result<AppConfig, ConfigError>;

#[derive(Parser)]
#[command(name = "tunescout")]
#[command(about = "Search the music catalog from the terminal")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Search the catalog and print results as JSON lines
    Search {
        term: String,
        /// Pages to load, the first included
        #[arg(long, default_value_t = 1)]
        pages: u32,
        /// Warm album tracks and artist albums for every result
        #[arg(long)]
        prefetch: bool,
    },
    /// Print the auth gate decision for a request URL
    Gate {
        url: String,
        #[arg(long)]
        session: Option<String>,
    },
    /// Print the server render for a request URL
    Render {
        url: String,
        #[arg(long)]
        session: Option<String>,
    },
    /// Print the remembered search term
    Last,
}

#[derive(Serialize)]
struct ResultLine<'a> {
    page: u32,
    #[serde(flatten)]
    item: &'a ResultItem,
}

#[tokio::main]
async fn main() {
    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    if let Err(error) = run(cli.command, AppConfig::from_env).await {
        eprintln!("tunescout: {error}");
        std::process::exit(1);
    }
}

async fn run(command: Commands, load_config: ConfigLoader) -> CliResult<()> {
    match command {
        Commands::Search {
            term,
            pages,
            prefetch,
        } => search(&load_config()?, &term, pages, prefetch).await,
        Commands::Gate { url, session } => {
            let request = gate_request(&url, session)?;
            print_json(&AuthGate::default().evaluate(&request))
        }
        Commands::Render { url, session } => {
            let config = load_config()?;
            let request = gate_request(&url, session)?;
            let cache = QueryCache::new(catalog(&config)?);
            let render =
                render_search_page(&AuthGate::default(), &cache, &request, config.search_limit)
                    .await;
            print_json(&render)
        }
        Commands::Last => {
            let store = open_store(&load_config()?)?;
            match store.last_search_term()? {
                Some(term) => println!("{term}"),
                None => tracing::info!("no search term remembered yet"),
            }
            Ok(())
        }
    }
}

async fn search(config: &AppConfig, term: &str, pages: u32, prefetch: bool) -> CliResult<()> {
    let store = Arc::new(open_store(config)?);
    let cache = QueryCache::new(catalog(config)?);

    match store.load_snapshot() {
        Ok(Some(snapshot)) => {
            let restored = cache.hydrate(snapshot).await;
            tracing::debug!(restored, "hydrated query cache from snapshot");
        }
        Ok(None) => {}
        Err(error) => tracing::warn!(
            kind = ?error.kind,
            message = %error.message,
            "ignoring unreadable query cache snapshot"
        ),
    }

    let options = SearchOptions {
        limit: config.search_limit,
        debounce: config.debounce,
    };
    let mut controller =
        SearchController::mount(cache.clone(), store.clone(), parse_url(PAGE_URL)?, options).await;
    let location = controller.set_input(term);
    tracing::debug!(url = %location.url, "search location updated");
    controller.settled().await;

    if let Some(fetch) = controller.ensure_current_fetch() {
        fetch.await?;
    }

    let key = controller.current_key();
    let loader = ScrollLoader::new(cache.clone());
    let hover = HoverPrefetcher::with_page_size(cache.clone(), config.prefetch_limit);
    let mut printed = 0;
    let mut warming = Vec::new();

    for page in 1..=pages.max(1) {
        if page > 1 {
            loader.on_visibility(&key, false).await?;
            if loader.on_visibility(&key, true).await?.is_none() {
                break;
            }
        }

        let view = controller.view().await?;
        for item in view.items.iter().skip(printed) {
            println!("{}", serde_json::to_string(&ResultLine { page, item })?);
            if prefetch {
                warming.extend(hover.on_pointer_enter(item));
            }
        }
        printed = view.items.len();
        if !view.has_next_page {
            break;
        }
    }

    for handle in warming {
        handle.await?;
    }
    controller.dispose();

    tracing::info!(term = %term, results = printed, "search finished");

    let snapshot = cache.dehydrate().await;
    if let Err(error) = store.save_snapshot(&snapshot) {
        tracing::warn!(
            kind = ?error.kind,
            message = %error.message,
            "failed to save query cache snapshot"
        );
    }
    Ok(())
}

fn open_store(config: &AppConfig) -> CliResult<SqliteStore> {
    let store = SqliteStore::new(&config.database_path);
    store.migrate_to_latest()?;
    Ok(store)
}

fn catalog(config: &AppConfig) -> CliResult<Arc<SpotifyCatalog<HttpCatalogSource>>> {
    let source = HttpCatalogSource::new(
        &config.catalog_base_url,
        config.token_url.clone(),
        config.require_credentials()?.clone(),
        config.http_timeout,
    )?;
    Ok(Arc::new(SpotifyCatalog::new(source)))
}

fn gate_request(url: &str, session: Option<String>) -> CliResult<GateRequest> {
    Ok(GateRequest::new(parse_url(url)?, session.map(SessionIdentity::new)))
}

fn print_json(value: &impl Serialize) -> CliResult<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
