//! Storage module for the article corpus
//!
//! This module handles all database operations, including:
//! - SQLite database initialization and schema management
//! - The append-only article table (dedup and resume authority)
//! - Atomic point-in-time snapshots for indexing
//! - Crawl run and failure bookkeeping

mod schema;
mod sqlite;
mod traits;

pub use sqlite::SqliteStorage;
pub use traits::{CorpusStore, StorageError, StorageResult};

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::Path;

/// Initializes or opens a corpus database
///
/// # Arguments
///
/// * `path` - Path to the SQLite database file
///
/// # Returns
///
/// * `Ok(SqliteStorage)` - Successfully initialized storage
/// * `Err(StorageError)` - Failed to initialize storage
pub fn open_storage(path: &Path) -> StorageResult<SqliteStorage> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    SqliteStorage::new(path)
}

/// An extracted article
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Article {
    /// Corpus key; unique and non-empty
    pub url: String,
    /// Empty only when `partial` is set
    pub title: String,
    pub claps: u64,
    pub content: Option<String>,
    pub subtitle: Option<String>,
    pub author: Option<String>,
    /// Absolute link to the author's profile
    pub author_url: Option<String>,
    /// Estimated reading time in minutes
    pub reading_time: Option<u32>,
    /// Content images in page order, without duplicates
    pub image_urls: Vec<String>,
    /// Distinct links pointing away from the article's host
    pub num_external_links: u32,
    /// Ranked key phrases from the body
    pub keywords: Vec<String>,
    /// Set when the title could not be extracted
    pub partial: bool,
    pub scraped_at: DateTime<Utc>,
}

impl Article {
    /// Creates an article with only the required fields set
    pub fn new(url: impl Into<String>, title: impl Into<String>, claps: u64) -> Self {
        Self {
            url: url.into(),
            title: title.into(),
            claps,
            content: None,
            subtitle: None,
            author: None,
            author_url: None,
            reading_time: None,
            image_urls: Vec::new(),
            num_external_links: 0,
            keywords: Vec::new(),
            partial: false,
            scraped_at: Utc::now(),
        }
    }

    /// Sets the article body
    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    pub fn num_images(&self) -> usize {
        self.image_urls.len()
    }

    /// Text that participates in indexing: title, subtitle and content
    pub fn searchable_text(&self) -> String {
        let mut text = self.title.clone();
        for part in [&self.subtitle, &self.content].into_iter().flatten() {
            text.push(' ');
            text.push_str(part);
        }
        text
    }
}

/// An article together with its position in extraction order
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoredArticle {
    /// Insertion sequence; kept across forced re-scrapes
    pub seq: i64,
    #[serde(flatten)]
    pub article: Article,
}

/// Immutable point-in-time view of the corpus, ordered by `seq`
#[derive(Debug, Clone)]
pub struct CorpusSnapshot {
    articles: Vec<StoredArticle>,
    taken_at: DateTime<Utc>,
}

impl CorpusSnapshot {
    pub fn new(articles: Vec<StoredArticle>, taken_at: DateTime<Utc>) -> Self {
        Self { articles, taken_at }
    }

    pub fn len(&self) -> usize {
        self.articles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.articles.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, StoredArticle> {
        self.articles.iter()
    }

    pub fn taken_at(&self) -> DateTime<Utc> {
        self.taken_at
    }

    pub fn into_articles(self) -> Vec<StoredArticle> {
        self.articles
    }
}

impl<'a> IntoIterator for &'a CorpusSnapshot {
    type Item = &'a StoredArticle;
    type IntoIter = std::slice::Iter<'a, StoredArticle>;

    fn into_iter(self) -> Self::IntoIter {
        self.articles.iter()
    }
}

/// What `append` did with an article
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppendOutcome {
    /// New row written
    Inserted,
    /// Existing row overwritten in place (forced re-scrape)
    Replaced,
    /// URL already present and `force` was not set
    Skipped,
}

/// Represents a crawl run
#[derive(Debug, Clone)]
pub struct RunRecord {
    pub id: i64,
    pub started_at: String,
    pub finished_at: Option<String>,
    pub config_hash: String,
    pub status: RunStatus,
    pub counts: RunCounts,
}

/// Aggregate per-run counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunCounts {
    pub done: u64,
    pub skipped: u64,
    pub failed: u64,
}

/// Status of a crawl run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Running,
    Completed,
    Cancelled,
    Failed,
}

impl RunStatus {
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
            Self::Failed => "failed",
        }
    }

    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "running" => Some(Self::Running),
            "completed" => Some(Self::Completed),
            "cancelled" => Some(Self::Cancelled),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }
}

/// A permanent per-URL failure recorded during a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailureRecord {
    pub run_id: i64,
    pub url: String,
    pub kind: String,
    pub message: String,
    pub recorded_at: String,
}

/// Aggregate statistics over the stored corpus
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CorpusStatistics {
    pub article_count: u64,
    pub total_claps: u64,
    pub avg_claps: f64,
    pub unique_authors: u64,
    pub partial_articles: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_status_roundtrip() {
        for status in &[
            RunStatus::Running,
            RunStatus::Completed,
            RunStatus::Cancelled,
            RunStatus::Failed,
        ] {
            let db_str = status.to_db_string();
            assert_eq!(Some(*status), RunStatus::from_db_string(db_str));
        }
    }

    #[test]
    fn test_run_status_invalid() {
        assert_eq!(RunStatus::from_db_string("interrupted"), None);
    }

    #[test]
    fn test_searchable_text_joins_present_parts() {
        let mut article = Article::new("https://example.com/a", "Title", 1).with_content("Body");
        assert_eq!(article.searchable_text(), "Title Body");

        article.subtitle = Some("Sub".to_string());
        assert_eq!(article.searchable_text(), "Title Sub Body");
    }

    #[test]
    fn test_snapshot_accessors() {
        let stored = StoredArticle {
            seq: 1,
            article: Article::new("https://example.com/a", "A", 0),
        };
        let snapshot = CorpusSnapshot::new(vec![stored], Utc::now());
        assert_eq!(snapshot.len(), 1);
        assert!(!snapshot.is_empty());
        assert_eq!(snapshot.iter().next().map(|s| s.seq), Some(1));
    }
}
