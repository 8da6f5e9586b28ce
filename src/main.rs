//! Article-Lens main entry point
//!
//! This is the command-line interface for crawling articles into the corpus
//! and searching it.

use article_lens::config::{load_config_with_hash, Config};
use article_lens::crawler::{crawl, CrawlOptions};
use article_lens::output::{
    load_statistics, print_crawl_report, print_search_results, print_statistics,
};
use article_lens::search::IndexHandle;
use article_lens::server::{self, AppState};
use article_lens::storage::{open_storage, CorpusStore};
use article_lens::url::{load_url_list, normalize_url};
use anyhow::{bail, Context};
use clap::Parser;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::watch;
use tracing_subscriber::EnvFilter;

/// Article-Lens: a resumable article corpus with TF-IDF search
///
/// Crawls a list of article URLs into a durable SQLite corpus, resuming
/// where a previous run stopped, and ranks stored articles against
/// free-text queries.
#[derive(Parser, Debug)]
#[command(name = "article-lens")]
#[command(version = "1.0.0")]
#[command(about = "A resumable article corpus with TF-IDF search", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Crawl the URLs listed in FILE (one per line)
    #[arg(long, value_name = "FILE", conflicts_with = "url")]
    input: Option<PathBuf>,

    /// Crawl a single URL
    #[arg(long, value_name = "URL", conflicts_with = "input")]
    url: Option<String>,

    /// Clear the corpus before crawling instead of resuming
    #[arg(long)]
    no_resume: bool,

    /// Re-extract URLs that are already stored
    #[arg(long)]
    force: bool,

    /// Show corpus statistics and the last run, then exit
    #[arg(long, conflicts_with_all = ["search", "serve", "input", "url"])]
    stats: bool,

    /// Run one query against the corpus and exit
    #[arg(long, value_name = "QUERY", conflicts_with_all = ["stats", "serve", "input", "url"])]
    search: Option<String>,

    /// Number of results for --search
    #[arg(long, value_name = "N", requires = "search")]
    top_k: Option<usize>,

    /// Build the index and run the search service
    #[arg(long, conflicts_with_all = ["stats", "search", "input", "url"])]
    serve: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load and validate configuration
    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = match load_config_with_hash(&cli.config) {
        Ok((cfg, hash)) => {
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            (cfg, hash)
        }
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    let store: Arc<dyn CorpusStore> = Arc::new(
        open_storage(Path::new(&config.storage.database_path)).with_context(|| {
            format!("failed to open corpus at {}", config.storage.database_path)
        })?,
    );

    // Handle different modes
    if cli.stats {
        handle_stats(store.as_ref())?;
    } else if let Some(query) = &cli.search {
        let top_k = cli.top_k.unwrap_or(config.server.default_top_k);
        handle_search(store, query, top_k).await?;
    } else if cli.serve {
        handle_serve(&config, store).await?;
    } else {
        let options = CrawlOptions {
            resume: !cli.no_resume,
            force: cli.force,
        };
        handle_crawl(&config, &config_hash, store, &cli, options).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("article_lens=info,warn"),
            1 => EnvFilter::new("article_lens=debug,info"),
            2 => EnvFilter::new("article_lens=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the --stats mode: shows statistics from the database
fn handle_stats(store: &dyn CorpusStore) -> anyhow::Result<()> {
    let report = load_statistics(store)?;
    print_statistics(&report);
    Ok(())
}

/// Handles the --search mode: builds the index and prints ranked results
async fn handle_search(
    store: Arc<dyn CorpusStore>,
    query: &str,
    top_k: usize,
) -> anyhow::Result<()> {
    let index = Arc::new(IndexHandle::default());
    index.rebuild(store).await?;

    let hits = index.search(query, top_k)?;
    print_search_results(query, &hits);
    Ok(())
}

/// Handles the --serve mode: builds the index once and serves queries until Ctrl-C
async fn handle_serve(
    config: &Config,
    store: Arc<dyn CorpusStore>,
) -> anyhow::Result<()> {
    let index = Arc::new(IndexHandle::default());
    let built = index
        .rebuild(Arc::clone(&store))
        .await
        .context("failed to build the search index")?;
    tracing::info!(
        "Index ready: {} articles, {} terms",
        built.article_count(),
        built.vocabulary_size()
    );

    let state = AppState::new(index, store, &config.server);
    server::serve(state, &config.server.bind, async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl-C: {}", e);
        }
    })
    .await?;

    Ok(())
}

/// Handles the main crawl operation
async fn handle_crawl(
    config: &Config,
    config_hash: &str,
    store: Arc<dyn CorpusStore>,
    cli: &Cli,
    options: CrawlOptions,
) -> anyhow::Result<()> {
    let urls = if let Some(path) = &cli.input {
        load_url_list(path)
            .with_context(|| format!("failed to read URL list {}", path.display()))?
    } else if let Some(url) = &cli.url {
        vec![normalize_url(url)?.to_string()]
    } else {
        bail!("nothing to do: pass --input FILE, --url URL, --stats, --search or --serve");
    };

    if urls.is_empty() {
        tracing::warn!("Input contains no valid URLs");
    }
    if options.resume {
        tracing::info!("Starting crawl (URLs already in the corpus are skipped)");
    } else {
        tracing::info!("Starting fresh crawl (corpus will be cleared)");
    }

    // Ctrl-C stops scheduling new work; finished articles are already stored
    let (cancel_tx, cancel_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, stopping crawl");
            let _ = cancel_tx.send(true);
        }
    });

    match crawl(config, config_hash, store, &urls, options, cancel_rx).await {
        Ok(report) => {
            print_crawl_report(&report);
            Ok(())
        }
        Err(e) => {
            tracing::error!("Crawl failed: {}", e);
            Err(e.into())
        }
    }
}
