//! Corpus statistics
//!
//! This module loads aggregate statistics and the most recent crawl run
//! from the store and prints them.

use crate::storage::{CorpusStatistics, CorpusStore, FailureRecord, RunRecord, StorageResult};

/// Corpus statistics plus the most recent run
#[derive(Debug, Clone)]
pub struct CorpusReport {
    pub statistics: CorpusStatistics,

    /// Most recent crawl run, if any
    pub last_run: Option<RunRecord>,

    /// Failures recorded by the most recent run
    pub last_failures: Vec<FailureRecord>,
}

/// Loads statistics from storage
///
/// # Arguments
///
/// * `store` - The corpus to query
///
/// # Returns
///
/// * `Ok(CorpusReport)` - Successfully loaded statistics
/// * `Err(StorageError)` - Failed to query statistics
pub fn load_statistics(store: &dyn CorpusStore) -> StorageResult<CorpusReport> {
    let statistics = store.statistics()?;
    let last_run = store.latest_run()?;
    let last_failures = match &last_run {
        Some(run) => store.failures_for_run(run.id)?,
        None => Vec::new(),
    };

    Ok(CorpusReport {
        statistics,
        last_run,
        last_failures,
    })
}

/// Prints statistics to stdout in a formatted manner
pub fn print_statistics(report: &CorpusReport) {
    let stats = &report.statistics;

    println!("=== Corpus Statistics ===\n");

    println!("Overview:");
    println!("  Articles: {}", stats.article_count);
    println!("  Partial articles (no title): {}", stats.partial_articles);
    println!("  Unique authors: {}", stats.unique_authors);
    println!("  Total claps: {}", stats.total_claps);
    println!("  Average claps: {:.1}", stats.avg_claps);
    println!();

    let Some(run) = &report.last_run else {
        println!("No crawl runs recorded yet.");
        return;
    };

    println!("Last Run (#{}):", run.id);
    println!("  Status: {}", run.status.to_db_string());
    println!("  Started: {}", run.started_at);
    if let Some(finished) = &run.finished_at {
        println!("  Finished: {}", finished);
    }
    println!("  Config hash: {}", run.config_hash);
    println!(
        "  Done: {}, skipped: {}, failed: {}",
        run.counts.done, run.counts.skipped, run.counts.failed
    );

    if !report.last_failures.is_empty() {
        println!();
        println!("Failures ({}):", report.last_failures.len());
        for failure in &report.last_failures {
            println!("  - [{}] {}: {}", failure.kind, failure.url, failure.message);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{Article, RunCounts, RunStatus, SqliteStorage};

    #[test]
    fn test_load_statistics_empty_store() {
        let store = SqliteStorage::new_in_memory().unwrap();
        let report = load_statistics(&store).unwrap();

        assert_eq!(report.statistics, CorpusStatistics::default());
        assert!(report.last_run.is_none());
        assert!(report.last_failures.is_empty());
    }

    #[test]
    fn test_load_statistics_with_run_and_failures() {
        let store = SqliteStorage::new_in_memory().unwrap();
        store
            .append(&Article::new("https://a.test/1", "One", 10), false)
            .unwrap();
        let run_id = store.create_run("hash").unwrap();
        store
            .record_failure(run_id, "https://a.test/2", "not_found", "HTTP 404")
            .unwrap();
        store
            .finish_run(
                run_id,
                RunStatus::Completed,
                RunCounts {
                    done: 1,
                    skipped: 0,
                    failed: 1,
                },
            )
            .unwrap();

        let report = load_statistics(&store).unwrap();

        assert_eq!(report.statistics.article_count, 1);
        assert_eq!(report.statistics.total_claps, 10);
        let run = report.last_run.unwrap();
        assert_eq!(run.id, run_id);
        assert_eq!(run.counts.failed, 1);
        assert_eq!(report.last_failures.len(), 1);
        assert_eq!(report.last_failures[0].kind, "not_found");
    }
}
