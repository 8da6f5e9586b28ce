//! Anti-bot challenge detection
//!
//! A challenge page is an interstitial served instead of the article (a
//! browser check, a captcha, a rate-limit wall). Detection is a predicate
//! over the fetched page so signatures can be extended without touching the
//! extraction flow.

use crate::config::ChallengeConfig;
use crate::crawler::FetchedPage;
use scraper::{Html, Selector};

const DEFAULT_TITLE_MARKERS: &[&str] = &["just a moment", "attention required", "access denied"];

const DEFAULT_BODY_MARKERS: &[&str] = &[
    "cf-browser-verification",
    "challenge-platform",
    "cf-chl-",
    "g-recaptcha",
];

/// Statuses that only ever mean "you are being blocked"
const DEFAULT_BLOCK_STATUSES: &[u16] = &[403, 429];

/// Decides whether a fetched page is a challenge rather than content
pub trait ChallengeDetector: Send + Sync {
    fn is_challenge(&self, page: &FetchedPage) -> bool;
}

impl<F> ChallengeDetector for F
where
    F: Fn(&FetchedPage) -> bool + Send + Sync,
{
    fn is_challenge(&self, page: &FetchedPage) -> bool {
        self(page)
    }
}

/// Matches block statuses and case-insensitive title/body substrings
#[derive(Debug, Clone)]
pub struct MarkerChallengeDetector {
    title_markers: Vec<String>,
    body_markers: Vec<String>,
    block_statuses: Vec<u16>,
}

impl MarkerChallengeDetector {
    pub fn new(title_markers: Vec<String>, body_markers: Vec<String>, block_statuses: Vec<u16>) -> Self {
        Self {
            title_markers: title_markers.into_iter().map(|m| m.to_lowercase()).collect(),
            body_markers: body_markers.into_iter().map(|m| m.to_lowercase()).collect(),
            block_statuses,
        }
    }

    /// Configured markers extend the built-in ones
    pub fn from_config(config: &ChallengeConfig) -> Self {
        let mut title_markers: Vec<String> =
            DEFAULT_TITLE_MARKERS.iter().map(|s| s.to_string()).collect();
        title_markers.extend(config.title_markers.iter().cloned());

        let mut body_markers: Vec<String> =
            DEFAULT_BODY_MARKERS.iter().map(|s| s.to_string()).collect();
        body_markers.extend(config.body_markers.iter().cloned());

        Self::new(title_markers, body_markers, DEFAULT_BLOCK_STATUSES.to_vec())
    }
}

impl Default for MarkerChallengeDetector {
    fn default() -> Self {
        Self::from_config(&ChallengeConfig::default())
    }
}

impl ChallengeDetector for MarkerChallengeDetector {
    fn is_challenge(&self, page: &FetchedPage) -> bool {
        if self.block_statuses.contains(&page.status) {
            return true;
        }

        if let Some(title) = page_title(&page.body) {
            let title = title.to_lowercase();
            if self.title_markers.iter().any(|m| title.contains(m.as_str())) {
                return true;
            }
        }

        let body = page.body.to_lowercase();
        self.body_markers.iter().any(|m| body.contains(m.as_str()))
    }
}

/// Flags a page when any inner detector does
pub struct AnyOf(Vec<Box<dyn ChallengeDetector>>);

impl AnyOf {
    pub fn new(detectors: Vec<Box<dyn ChallengeDetector>>) -> Self {
        Self(detectors)
    }
}

impl ChallengeDetector for AnyOf {
    fn is_challenge(&self, page: &FetchedPage) -> bool {
        self.0.iter().any(|d| d.is_challenge(page))
    }
}

fn page_title(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let selector = Selector::parse("title").ok()?;
    document
        .select(&selector)
        .next()
        .map(|el| el.text().collect::<String>().trim().to_string())
        .filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(status: u16, body: &str) -> FetchedPage {
        FetchedPage {
            final_url: "https://example.com/p".to_string(),
            status,
            body: body.to_string(),
        }
    }

    #[test]
    fn test_title_marker() {
        let detector = MarkerChallengeDetector::default();
        let p = page(
            200,
            "<html><head><title>Just a moment...</title></head><body></body></html>",
        );
        assert!(detector.is_challenge(&p));
    }

    #[test]
    fn test_body_marker() {
        let detector = MarkerChallengeDetector::default();
        let p = page(
            503,
            r#"<html><body><div id="cf-browser-verification">checking</div></body></html>"#,
        );
        assert!(detector.is_challenge(&p));
    }

    #[test]
    fn test_block_status() {
        let detector = MarkerChallengeDetector::default();
        assert!(detector.is_challenge(&page(429, "slow down")));
        assert!(detector.is_challenge(&page(403, "")));
    }

    #[test]
    fn test_regular_article_is_not_a_challenge() {
        let detector = MarkerChallengeDetector::default();
        let p = page(
            200,
            "<html><head><title>Deep Learning Basics | Blog</title></head><body><h1>Deep Learning Basics</h1></body></html>",
        );
        assert!(!detector.is_challenge(&p));
    }

    #[test]
    fn test_configured_markers_extend_defaults() {
        let config = ChallengeConfig {
            title_markers: vec!["Please Verify".to_string()],
            body_markers: vec![],
        };
        let detector = MarkerChallengeDetector::from_config(&config);
        assert!(detector.is_challenge(&page(
            200,
            "<html><head><title>please verify you are human</title></head></html>"
        )));
        assert!(detector.is_challenge(&page(
            200,
            "<html><head><title>Just a moment</title></head></html>"
        )));
    }

    #[test]
    fn test_any_of_and_closures() {
        let detector = AnyOf::new(vec![
            Box::new(MarkerChallengeDetector::new(vec![], vec![], vec![])),
            Box::new(|p: &FetchedPage| p.body.contains("robot check")),
        ]);
        assert!(detector.is_challenge(&page(200, "<p>robot check</p>")));
        assert!(!detector.is_challenge(&page(200, "<p>hello</p>")));
    }
}
