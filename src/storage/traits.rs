//! Storage traits and error types
//!
//! This module defines the trait interface for corpus backends and
//! associated error types.

use crate::storage::{
    AppendOutcome, Article, CorpusSnapshot, CorpusStatistics, FailureRecord, RunCounts,
    RunRecord, RunStatus, StoredArticle,
};
use thiserror::Error;

/// Errors that can occur during storage operations
///
/// `InvalidArticle` rejects one article. Any other variant stops the
/// current crawl run; rows flushed before the failure stay intact.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage lock poisoned")]
    Poisoned,

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid article: {0}")]
    InvalidArticle(String),

    #[error("Run not found: {0}")]
    RunNotFound(i64),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for corpus backend implementations
///
/// Implementations serialize writes internally, so a shared reference is
/// enough to append. Every successful `append` is durable when it returns.
pub trait CorpusStore: Send + Sync {
    // ===== Articles =====

    /// Returns true if an article with this URL is stored
    fn contains(&self, url: &str) -> StorageResult<bool>;

    /// Appends an article
    ///
    /// A no-op returning `Skipped` if the URL is present and `force` is false.
    /// With `force`, an existing row is overwritten in place and keeps its
    /// sequence number.
    fn append(&self, article: &Article, force: bool) -> StorageResult<AppendOutcome>;

    /// Takes an atomic, ordered point-in-time copy of every article
    fn snapshot(&self) -> StorageResult<CorpusSnapshot>;

    /// Deletes every article, run and failure
    fn reset(&self) -> StorageResult<()>;

    /// Gets an article by URL
    fn get(&self, url: &str) -> StorageResult<Option<StoredArticle>>;

    /// Gets an article by its extraction sequence number
    fn get_by_seq(&self, seq: i64) -> StorageResult<Option<StoredArticle>>;

    /// Counts stored articles
    fn count(&self) -> StorageResult<u64>;

    // ===== Runs =====

    /// Creates a new crawl run in the `running` state
    fn create_run(&self, config_hash: &str) -> StorageResult<i64>;

    /// Marks a run finished with its final status and counts
    fn finish_run(&self, run_id: i64, status: RunStatus, counts: RunCounts)
        -> StorageResult<()>;

    /// Gets the most recent run
    fn latest_run(&self) -> StorageResult<Option<RunRecord>>;

    // ===== Failures =====

    /// Records a permanent per-URL failure
    fn record_failure(
        &self,
        run_id: i64,
        url: &str,
        kind: &str,
        message: &str,
    ) -> StorageResult<()>;

    /// Gets all failures recorded for a run, in recording order
    fn failures_for_run(&self, run_id: i64) -> StorageResult<Vec<FailureRecord>>;

    // ===== Statistics =====

    /// Aggregate statistics over stored articles
    fn statistics(&self) -> StorageResult<CorpusStatistics>;
}
