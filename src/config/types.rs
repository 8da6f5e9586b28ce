use serde::Deserialize;

/// Main configuration structure for Article-Lens
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub crawler: CrawlerConfig,
    pub retry: RetryConfig,
    #[serde(default)]
    pub fingerprints: FingerprintConfig,
    #[serde(default)]
    pub challenge: ChallengeConfig,
    pub storage: StorageConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Maximum number of extractions in flight at once
    #[serde(rename = "max-concurrency")]
    pub max_concurrency: u32,

    /// Base delay before each request (milliseconds)
    #[serde(rename = "request-delay-ms")]
    pub request_delay_ms: u64,

    /// Random extra delay added on top of `request_delay_ms` (milliseconds)
    #[serde(rename = "request-jitter-ms", default)]
    pub request_jitter_ms: u64,

    /// Per-request timeout (seconds)
    #[serde(rename = "page-load-timeout-secs")]
    pub page_load_timeout_secs: u64,
}

/// Retry/backoff configuration for retryable extraction failures
#[derive(Debug, Clone, Deserialize)]
pub struct RetryConfig {
    /// Total attempts per URL, including the first one
    #[serde(rename = "max-attempts")]
    pub max_attempts: u32,

    /// Backoff before the second attempt (milliseconds); doubles afterwards
    #[serde(rename = "base-delay-ms")]
    pub base_delay_ms: u64,

    /// Upper bound for a single backoff (milliseconds)
    #[serde(rename = "max-delay-ms")]
    pub max_delay_ms: u64,

    /// Random jitter added to every backoff (milliseconds)
    #[serde(rename = "jitter-ms", default)]
    pub jitter_ms: u64,
}

/// Client fingerprints rotated between attempts
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FingerprintConfig {
    /// User-Agent strings; built-in browser strings are used when empty
    #[serde(rename = "user-agents", default)]
    pub user_agents: Vec<String>,

    /// Accept-Language values; `en-US,en;q=0.9` is used when empty
    #[serde(rename = "accept-languages", default)]
    pub accept_languages: Vec<String>,
}

/// Markers for the anti-bot challenge detector
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChallengeConfig {
    /// Case-insensitive substrings of the page `<title>`
    #[serde(rename = "title-markers", default)]
    pub title_markers: Vec<String>,

    /// Case-insensitive substrings of the raw body
    #[serde(rename = "body-markers", default)]
    pub body_markers: Vec<String>,
}

/// Corpus storage configuration
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Path to the SQLite database file
    #[serde(rename = "database-path")]
    pub database_path: String,
}

/// Search service configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Address to bind the HTTP server to (host:port)
    #[serde(default = "default_bind")]
    pub bind: String,

    /// Result count when a request does not set `top_k`
    #[serde(rename = "default-top-k", default = "default_top_k")]
    pub default_top_k: usize,

    /// Largest `top_k` a request may ask for
    #[serde(rename = "max-top-k", default = "default_max_top_k")]
    pub max_top_k: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            default_top_k: default_top_k(),
            max_top_k: default_max_top_k(),
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1:5001".to_string()
}

fn default_top_k() -> usize {
    10
}

fn default_max_top_k() -> usize {
    50
}
