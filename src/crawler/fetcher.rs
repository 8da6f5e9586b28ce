//! HTTP fetcher implementation
//!
//! This module handles raw page retrieval for the extraction worker:
//! - The `PageFetcher` seam, so the fetch mechanism can be swapped
//! - Client fingerprints rotated between attempts
//! - A `reqwest` based fetcher with transport error classification

use crate::config::{CrawlerConfig, FingerprintConfig};
use crate::crawler::ExtractionError;
use async_trait::async_trait;
use rand::seq::SliceRandom;
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, USER_AGENT};
use reqwest::{Client, StatusCode};
use std::time::Duration;

/// Browser user agents used when the configuration lists none
const DEFAULT_USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (X11; Linux x86_64; rv:121.0) Gecko/20100101 Firefox/121.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 14_2) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.2 Safari/605.1.15",
];

const DEFAULT_ACCEPT_LANGUAGE: &str = "en-US,en;q=0.9";

/// A fetched page, before any interpretation
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// Final URL after redirects
    pub final_url: String,
    /// HTTP status code
    pub status: u16,
    /// Page body content
    pub body: String,
}

impl FetchedPage {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Simulated client identity for one request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fingerprint {
    pub user_agent: String,
    pub accept_language: String,
}

/// Pool of fingerprints; a random one is drawn per attempt
#[derive(Debug, Clone)]
pub struct FingerprintPool {
    user_agents: Vec<String>,
    accept_languages: Vec<String>,
}

impl FingerprintPool {
    pub fn new(user_agents: Vec<String>, accept_languages: Vec<String>) -> Self {
        let user_agents = if user_agents.is_empty() {
            DEFAULT_USER_AGENTS.iter().map(|s| s.to_string()).collect()
        } else {
            user_agents
        };
        let accept_languages = if accept_languages.is_empty() {
            vec![DEFAULT_ACCEPT_LANGUAGE.to_string()]
        } else {
            accept_languages
        };

        Self {
            user_agents,
            accept_languages,
        }
    }

    pub fn from_config(config: &FingerprintConfig) -> Self {
        Self::new(config.user_agents.clone(), config.accept_languages.clone())
    }

    /// Draws a fingerprint at random
    pub fn pick(&self) -> Fingerprint {
        let mut rng = rand::thread_rng();
        let user_agent = self
            .user_agents
            .choose(&mut rng)
            .cloned()
            .unwrap_or_else(|| DEFAULT_USER_AGENTS[0].to_string());
        let accept_language = self
            .accept_languages
            .choose(&mut rng)
            .cloned()
            .unwrap_or_else(|| DEFAULT_ACCEPT_LANGUAGE.to_string());

        Fingerprint {
            user_agent,
            accept_language,
        }
    }
}

impl Default for FingerprintPool {
    fn default() -> Self {
        Self::new(Vec::new(), Vec::new())
    }
}

/// Fetches raw pages
///
/// Implementations return `NotFound` for gone pages and `Timeout` for
/// transport failures; every other response is handed back as a
/// `FetchedPage` so challenge detection can look at it.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(
        &self,
        url: &str,
        fingerprint: &Fingerprint,
    ) -> Result<FetchedPage, ExtractionError>;
}

/// `reqwest` based page fetcher
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Builds a fetcher whose client times out after the configured page load time
    pub fn from_config(config: &CrawlerConfig) -> Result<Self, reqwest::Error> {
        Ok(Self::new(build_http_client(Duration::from_secs(
            config.page_load_timeout_secs,
        ))?))
    }
}

/// Builds an HTTP client with proper configuration
///
/// The user agent is not set here; it is sent per request from the
/// attempt's fingerprint.
///
/// # Arguments
///
/// * `timeout` - Total time allowed for one request
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
pub fn build_http_client(timeout: Duration) -> Result<Client, reqwest::Error> {
    Client::builder()
        .timeout(timeout)
        .connect_timeout(timeout.min(Duration::from_secs(10)))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Maps a transport-level error onto the extraction taxonomy
///
/// Connection failures are treated like timeouts: both are transient.
fn classify_transport_error(url: &str, error: &reqwest::Error) -> ExtractionError {
    if error.is_timeout() {
        ExtractionError::Timeout(format!("{} timed out", url))
    } else if error.is_connect() {
        ExtractionError::Timeout(format!("could not connect to {}: {}", url, error))
    } else {
        ExtractionError::Timeout(format!("request to {} failed: {}", url, error))
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(
        &self,
        url: &str,
        fingerprint: &Fingerprint,
    ) -> Result<FetchedPage, ExtractionError> {
        let response = self
            .client
            .get(url)
            .header(USER_AGENT, &fingerprint.user_agent)
            .header(ACCEPT_LANGUAGE, &fingerprint.accept_language)
            .header(
                ACCEPT,
                "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
            )
            .send()
            .await
            .map_err(|e| classify_transport_error(url, &e))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND || status == StatusCode::GONE {
            return Err(ExtractionError::NotFound(status.as_u16()));
        }

        let final_url = response.url().to_string();
        let body = response
            .text()
            .await
            .map_err(|e| classify_transport_error(url, &e))?;

        Ok(FetchedPage {
            final_url,
            status: status.as_u16(),
            body,
        })
    }
}
