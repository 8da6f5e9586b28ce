//! Crawler module for article acquisition
//!
//! This module contains the acquisition side of the corpus:
//! - Page fetching with rotating client fingerprints
//! - Anti-bot challenge detection
//! - Retry with exponential backoff for transient failures
//! - Article parsing and keyword extraction
//! - Overall crawl coordination

mod challenge;
mod coordinator;
mod error;
mod extractor;
mod fetcher;
mod keywords;
mod parser;
mod retry;

pub use challenge::{AnyOf, ChallengeDetector, MarkerChallengeDetector};
pub use coordinator::{Coordinator, CrawlOptions, CrawlReport};
pub use error::{ExtractionError, Retryable};
pub use extractor::Extractor;
pub use fetcher::{
    build_http_client, FetchedPage, Fingerprint, FingerprintPool, HttpFetcher, PageFetcher,
};
pub use keywords::{extract_keywords, MAX_KEYWORDS};
pub use parser::{clean_text, parse_article, parse_claps, parse_reading_time, MAX_CLAPS};
pub use retry::RetryPolicy;

use crate::config::Config;
use crate::storage::CorpusStore;
use crate::LensError;
use std::sync::Arc;
use tokio::sync::watch;

/// Runs a complete crawl operation from configuration
///
/// This is the main entry point for a crawl. It will:
/// 1. Build the HTTP extraction worker
/// 2. Record a new run in the store
/// 3. Extract every pending URL under the concurrency bound
/// 4. Report aggregate counts
///
/// # Arguments
///
/// * `config` - The loaded configuration
/// * `config_hash` - Hash of the configuration file, recorded with the run
/// * `store` - The corpus to append to
/// * `urls` - Normalized input URLs
/// * `options` - Resume and force flags
/// * `cancel` - Turns true when the crawl should stop
///
/// # Returns
///
/// * `Ok(CrawlReport)` - Crawl completed or was cancelled
/// * `Err(LensError)` - Crawl failed
pub async fn crawl(
    config: &Config,
    config_hash: &str,
    store: Arc<dyn CorpusStore>,
    urls: &[String],
    options: CrawlOptions,
    cancel: watch::Receiver<bool>,
) -> Result<CrawlReport, LensError> {
    let extractor = Arc::new(Extractor::from_config(config)?);
    let coordinator = Coordinator::new(
        store,
        extractor,
        config.crawler.max_concurrency as usize,
    )
    .with_config_hash(config_hash);

    coordinator.run_until_cancelled(urls, options, cancel).await
}
