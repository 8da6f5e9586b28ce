//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the CorpusStore trait.

use crate::storage::schema::initialize_schema;
use crate::storage::traits::{CorpusStore, StorageError, StorageResult};
use crate::storage::{
    AppendOutcome, Article, CorpusSnapshot, CorpusStatistics, FailureRecord, RunCounts,
    RunRecord, RunStatus, StoredArticle,
};
use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

const ARTICLE_COLUMNS: &str = "seq, url, title, claps, content, subtitle, author, author_url,
     reading_time, image_urls, num_external_links, keywords, partial, scraped_at";

const RUN_COLUMNS: &str =
    "id, started_at, finished_at, config_hash, status, done, skipped, failed";

/// SQLite storage backend
///
/// The connection sits behind a mutex: writers are serialized and a
/// snapshot is read inside a single transaction, so no reader ever sees a
/// half-written row.
pub struct SqliteStorage {
    conn: Mutex<Connection>,
}

impl SqliteStorage {
    /// Creates a new SqliteStorage instance
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteStorage)` - Successfully opened/created database
    /// * `Err(StorageError)` - Failed to open database
    pub fn new(path: &Path) -> StorageResult<Self> {
        let conn = Connection::open(path)?;

        // synchronous = FULL: a committed append survives a crash
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = FULL;
            PRAGMA foreign_keys = ON;
            PRAGMA busy_timeout = 5000;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Creates an in-memory database (for tests and throwaway corpora)
    pub fn new_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> StorageResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| StorageError::Poisoned)
    }
}

/// Rejects articles that would break corpus invariants
fn validate_article(article: &Article) -> StorageResult<i64> {
    if article.url.trim().is_empty() {
        return Err(StorageError::InvalidArticle("url is empty".to_string()));
    }

    if article.title.trim().is_empty() && !article.partial {
        return Err(StorageError::InvalidArticle(format!(
            "{} has an empty title but is not flagged partial",
            article.url
        )));
    }

    i64::try_from(article.claps).map_err(|_| {
        StorageError::InvalidArticle(format!("{} has out-of-range claps", article.url))
    })
}

fn article_from_row(row: &Row<'_>) -> rusqlite::Result<StoredArticle> {
    let claps: i64 = row.get(3)?;
    let claps = u64::try_from(claps)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(3, Type::Integer, Box::new(e)))?;

    let scraped_at: String = row.get(13)?;
    let scraped_at = DateTime::parse_from_rfc3339(&scraped_at)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(13, Type::Text, Box::new(e)))?
        .with_timezone(&Utc);

    Ok(StoredArticle {
        seq: row.get(0)?,
        article: Article {
            url: row.get(1)?,
            title: row.get(2)?,
            claps,
            content: row.get(4)?,
            subtitle: row.get(5)?,
            author: row.get(6)?,
            author_url: row.get(7)?,
            reading_time: row.get(8)?,
            image_urls: json_list(row, 9)?,
            num_external_links: row.get(10)?,
            keywords: json_list(row, 11)?,
            partial: row.get(12)?,
            scraped_at,
        },
    })
}

fn json_list(row: &Row<'_>, idx: usize) -> rusqlite::Result<Vec<String>> {
    let raw: String = row.get(idx)?;
    serde_json::from_str(&raw)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn run_from_row(row: &Row<'_>) -> rusqlite::Result<RunRecord> {
    let status: String = row.get(4)?;
    let counter = |idx: usize| -> rusqlite::Result<u64> {
        let value: i64 = row.get(idx)?;
        Ok(u64::try_from(value).unwrap_or(0))
    };

    Ok(RunRecord {
        id: row.get(0)?,
        started_at: row.get(1)?,
        finished_at: row.get(2)?,
        config_hash: row.get(3)?,
        status: RunStatus::from_db_string(&status).unwrap_or(RunStatus::Failed),
        counts: RunCounts {
            done: counter(5)?,
            skipped: counter(6)?,
            failed: counter(7)?,
        },
    })
}

fn to_db_count(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

impl CorpusStore for SqliteStorage {
    // ===== Articles =====

    fn contains(&self, url: &str) -> StorageResult<bool> {
        let conn = self.lock()?;
        let found = conn
            .query_row(
                "SELECT 1 FROM articles WHERE url = ?1",
                params![url],
                |_| Ok(()),
            )
            .optional()?;
        Ok(found.is_some())
    }

    fn append(&self, article: &Article, force: bool) -> StorageResult<AppendOutcome> {
        let claps = validate_article(article)?;
        let scraped_at = article.scraped_at.to_rfc3339();
        let image_urls = serde_json::to_string(&article.image_urls)?;
        let keywords = serde_json::to_string(&article.keywords)?;

        let mut conn = self.lock()?;
        let tx = conn.transaction()?;

        let exists = tx
            .query_row(
                "SELECT 1 FROM articles WHERE url = ?1",
                params![article.url],
                |_| Ok(()),
            )
            .optional()?
            .is_some();

        let outcome = match (exists, force) {
            (true, false) => return Ok(AppendOutcome::Skipped),
            (true, true) => {
                tx.execute(
                    "UPDATE articles SET title = ?2, claps = ?3, content = ?4, subtitle = ?5,
                     author = ?6, author_url = ?7, reading_time = ?8, image_urls = ?9,
                     num_external_links = ?10, keywords = ?11, partial = ?12, scraped_at = ?13
                     WHERE url = ?1",
                    params![
                        article.url,
                        article.title,
                        claps,
                        article.content,
                        article.subtitle,
                        article.author,
                        article.author_url,
                        article.reading_time,
                        image_urls,
                        article.num_external_links,
                        keywords,
                        article.partial,
                        scraped_at
                    ],
                )?;
                AppendOutcome::Replaced
            }
            (false, _) => {
                tx.execute(
                    "INSERT INTO articles (url, title, claps, content, subtitle, author,
                     author_url, reading_time, image_urls, num_external_links, keywords,
                     partial, scraped_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
                    params![
                        article.url,
                        article.title,
                        claps,
                        article.content,
                        article.subtitle,
                        article.author,
                        article.author_url,
                        article.reading_time,
                        image_urls,
                        article.num_external_links,
                        keywords,
                        article.partial,
                        scraped_at
                    ],
                )?;
                AppendOutcome::Inserted
            }
        };

        tx.commit()?;
        Ok(outcome)
    }

    fn snapshot(&self) -> StorageResult<CorpusSnapshot> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        let taken_at = Utc::now();

        let articles = {
            let mut stmt = tx.prepare(&format!(
                "SELECT {} FROM articles ORDER BY seq ASC",
                ARTICLE_COLUMNS
            ))?;
            let rows = stmt
                .query_map([], article_from_row)?
                .collect::<Result<Vec<_>, _>>()?;
            rows
        };

        tx.commit()?;
        Ok(CorpusSnapshot::new(articles, taken_at))
    }

    fn reset(&self) -> StorageResult<()> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        tx.execute_batch(
            "
            DELETE FROM failures;
            DELETE FROM runs;
            DELETE FROM articles;
            DELETE FROM sqlite_sequence WHERE name IN ('articles', 'runs', 'failures');
        ",
        )?;
        tx.commit()?;
        Ok(())
    }

    fn get(&self, url: &str) -> StorageResult<Option<StoredArticle>> {
        let conn = self.lock()?;
        let article = conn
            .query_row(
                &format!("SELECT {} FROM articles WHERE url = ?1", ARTICLE_COLUMNS),
                params![url],
                article_from_row,
            )
            .optional()?;
        Ok(article)
    }

    fn get_by_seq(&self, seq: i64) -> StorageResult<Option<StoredArticle>> {
        let conn = self.lock()?;
        let article = conn
            .query_row(
                &format!("SELECT {} FROM articles WHERE seq = ?1", ARTICLE_COLUMNS),
                params![seq],
                article_from_row,
            )
            .optional()?;
        Ok(article)
    }

    fn count(&self) -> StorageResult<u64> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM articles", [], |row| row.get(0))?;
        Ok(u64::try_from(count).unwrap_or(0))
    }

    // ===== Runs =====

    fn create_run(&self, config_hash: &str) -> StorageResult<i64> {
        let conn = self.lock()?;
        let now = Utc::now().to_rfc3339();
        conn.execute(
            "INSERT INTO runs (started_at, config_hash, status) VALUES (?1, ?2, ?3)",
            params![now, config_hash, RunStatus::Running.to_db_string()],
        )?;
        Ok(conn.last_insert_rowid())
    }

    fn finish_run(
        &self,
        run_id: i64,
        status: RunStatus,
        counts: RunCounts,
    ) -> StorageResult<()> {
        let conn = self.lock()?;
        let now = Utc::now().to_rfc3339();
        let changed = conn.execute(
            "UPDATE runs SET status = ?1, finished_at = ?2, done = ?3, skipped = ?4, failed = ?5
             WHERE id = ?6",
            params![
                status.to_db_string(),
                now,
                to_db_count(counts.done),
                to_db_count(counts.skipped),
                to_db_count(counts.failed),
                run_id
            ],
        )?;

        if changed == 0 {
            return Err(StorageError::RunNotFound(run_id));
        }
        Ok(())
    }

    fn latest_run(&self) -> StorageResult<Option<RunRecord>> {
        let conn = self.lock()?;
        let run = conn
            .query_row(
                &format!("SELECT {} FROM runs ORDER BY id DESC LIMIT 1", RUN_COLUMNS),
                [],
                run_from_row,
            )
            .optional()?;
        Ok(run)
    }

    // ===== Failures =====

    fn record_failure(
        &self,
        run_id: i64,
        url: &str,
        kind: &str,
        message: &str,
    ) -> StorageResult<()> {
        let conn = self.lock()?;
        let now = Utc::now().to_rfc3339();
        conn.execute(
            "INSERT INTO failures (run_id, url, kind, message, recorded_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![run_id, url, kind, message, now],
        )?;
        Ok(())
    }

    fn failures_for_run(&self, run_id: i64) -> StorageResult<Vec<FailureRecord>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT run_id, url, kind, message, recorded_at FROM failures
             WHERE run_id = ?1 ORDER BY id ASC",
        )?;

        let failures = stmt
            .query_map(params![run_id], |row| {
                Ok(FailureRecord {
                    run_id: row.get(0)?,
                    url: row.get(1)?,
                    kind: row.get(2)?,
                    message: row.get(3)?,
                    recorded_at: row.get(4)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(failures)
    }

    // ===== Statistics =====

    fn statistics(&self) -> StorageResult<CorpusStatistics> {
        let conn = self.lock()?;
        let (count, total_claps, unique_authors, partial): (i64, i64, i64, i64) = conn
            .query_row(
                "SELECT COUNT(*), COALESCE(SUM(claps), 0), COUNT(DISTINCT author),
                 COALESCE(SUM(partial), 0) FROM articles",
                [],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
            )?;

        let article_count = u64::try_from(count).unwrap_or(0);
        let total_claps = u64::try_from(total_claps).unwrap_or(0);
        let avg_claps = if article_count > 0 {
            total_claps as f64 / article_count as f64
        } else {
            0.0
        };

        Ok(CorpusStatistics {
            article_count,
            total_claps,
            avg_claps,
            unique_authors: u64::try_from(unique_authors).unwrap_or(0),
            partial_articles: u64::try_from(partial).unwrap_or(0),
        })
    }
}
