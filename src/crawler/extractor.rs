//! Extraction worker
//!
//! Fetches one URL and turns it into an `Article`. Each attempt uses a fresh
//! fingerprint, waits the politeness delay, checks for anti-bot challenges
//! and then parses the page. Transient failures are retried by the
//! configured `RetryPolicy`. The worker holds no per-URL state and never
//! touches the corpus.

use crate::config::Config;
use crate::crawler::{
    parse_article, ChallengeDetector, ExtractionError, FingerprintPool, HttpFetcher,
    MarkerChallengeDetector, PageFetcher, RetryPolicy,
};
use crate::storage::Article;
use crate::LensError;
use std::sync::Arc;
use std::time::Duration;

pub struct Extractor {
    fetcher: Arc<dyn PageFetcher>,
    detector: Arc<dyn ChallengeDetector>,
    retry: RetryPolicy,
    fingerprints: FingerprintPool,
    request_delay: Duration,
    request_jitter: Duration,
}

impl Extractor {
    /// Creates an extractor without any politeness delay
    pub fn new(
        fetcher: Arc<dyn PageFetcher>,
        detector: Arc<dyn ChallengeDetector>,
        retry: RetryPolicy,
        fingerprints: FingerprintPool,
    ) -> Self {
        Self {
            fetcher,
            detector,
            retry,
            fingerprints,
            request_delay: Duration::ZERO,
            request_jitter: Duration::ZERO,
        }
    }

    /// Sets the delay (plus random jitter) awaited before every request
    pub fn with_request_delay(mut self, delay: Duration, jitter: Duration) -> Self {
        self.request_delay = delay;
        self.request_jitter = jitter;
        self
    }

    /// Builds an HTTP extractor from configuration
    ///
    /// # Returns
    ///
    /// * `Ok(Extractor)` - Ready-to-use extractor
    /// * `Err(LensError)` - The HTTP client could not be built
    pub fn from_config(config: &Config) -> Result<Self, LensError> {
        let fetcher = HttpFetcher::from_config(&config.crawler)?;

        Ok(Self::new(
            Arc::new(fetcher),
            Arc::new(MarkerChallengeDetector::from_config(&config.challenge)),
            RetryPolicy::from_config(&config.retry),
            FingerprintPool::from_config(&config.fingerprints),
        )
        .with_request_delay(
            Duration::from_millis(config.crawler.request_delay_ms),
            Duration::from_millis(config.crawler.request_jitter_ms),
        ))
    }

    /// Extracts one article, retrying transient failures
    ///
    /// # Returns
    ///
    /// * `Ok(Article)` - The extracted article, keyed by `url`
    /// * `Err(ExtractionError)` - Terminal failure, or retries exhausted
    pub async fn extract(&self, url: &str) -> Result<Article, ExtractionError> {
        self.retry
            .run(move |attempt| self.attempt(url, attempt))
            .await
    }

    async fn attempt(&self, url: &str, attempt: u32) -> Result<Article, ExtractionError> {
        let delay = self.politeness_delay();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let fingerprint = self.fingerprints.pick();
        tracing::debug!(
            "Fetching {} (attempt {}, agent {})",
            url,
            attempt,
            fingerprint.user_agent
        );

        let page = self.fetcher.fetch(url, &fingerprint).await?;

        if self.detector.is_challenge(&page) {
            return Err(ExtractionError::AntiBotChallenge(format!(
                "{} answered with a challenge page (HTTP {})",
                url, page.status
            )));
        }

        match page.status {
            200..=299 => parse_article(&page.body, url),
            500..=599 => Err(ExtractionError::Timeout(format!(
                "{} returned server error {}",
                url, page.status
            ))),
            status => Err(ExtractionError::NotFound(status)),
        }
    }

    fn politeness_delay(&self) -> Duration {
        let jitter_ms = self.request_jitter.as_millis() as u64;
        let jitter = if jitter_ms == 0 {
            Duration::ZERO
        } else {
            Duration::from_millis(rand::random::<u64>() % (jitter_ms + 1))
        };
        self.request_delay + jitter
    }
}
