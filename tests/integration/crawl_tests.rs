//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and test
//! the full crawl cycle end-to-end against a SQLite corpus on disk.

use article_lens::config::{parse_config, Config};
use article_lens::crawler::{crawl, CrawlOptions, CrawlReport};
use article_lens::storage::{open_storage, CorpusStore, RunStatus, SqliteStorage};
use std::sync::Arc;
use tempfile::TempDir;
use tokio::sync::watch;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration writing to `db_path`, with no politeness delay
fn create_test_config(db_path: &str, max_attempts: u32) -> Config {
    parse_config(&format!(
        r#"
[crawler]
max-concurrency = 2
request-delay-ms = 0
page-load-timeout-secs = 5

[retry]
max-attempts = {}
base-delay-ms = 10
max-delay-ms = 50

[storage]
database-path = "{}"
"#,
        max_attempts, db_path
    ))
    .expect("test config should be valid")
}

fn article_page(title: &str, claps: &str) -> String {
    format!(
        r#"<html><head><title>{title} | Test Blog</title></head><body>
        <h1>{title}</h1>
        <article><p>This article is about {title} in some detail.</p></article>
        <span data-testid="clapCount">{claps}</span>
        </body></html>"#
    )
}

async fn mount_article(server: &MockServer, route: &str, title: &str, claps: &str, hits: u64) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_string(article_page(title, claps)))
        .expect(hits)
        .mount(server)
        .await;
}

struct Fixture {
    _dir: TempDir,
    config: Config,
    store: Arc<SqliteStorage>,
}

impl Fixture {
    fn new(max_attempts: u32) -> Self {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let db_path = dir.path().join("corpus").join("articles.db");
        let config = create_test_config(&db_path.to_string_lossy(), max_attempts);
        let store = Arc::new(open_storage(&db_path).expect("Failed to open DB"));
        Self {
            _dir: dir,
            config,
            store,
        }
    }

    async fn crawl(&self, urls: &[String], options: CrawlOptions) -> CrawlReport {
        let (_tx, rx) = watch::channel(false);
        let store: Arc<dyn CorpusStore> = self.store.clone();
        crawl(&self.config, "test-hash", store, urls, options, rx)
            .await
            .expect("Crawl failed")
    }
}

#[tokio::test]
async fn test_full_crawl_then_resume_is_idempotent() {
    let server = MockServer::start().await;
    let base = server.uri();

    // Each article must be fetched exactly once across both runs
    mount_article(&server, "/rust-ownership", "Rust Ownership", "1.2K", 1).await;
    mount_article(&server, "/async-runtimes", "Async Runtimes", "300", 1).await;
    mount_article(&server, "/sqlite-wal", "SQLite WAL", "42", 1).await;

    let urls = vec![
        format!("{}/rust-ownership", base),
        format!("{}/async-runtimes", base),
        format!("{}/sqlite-wal", base),
    ];
    let fixture = Fixture::new(3);

    let first = fixture.crawl(&urls, CrawlOptions::default()).await;
    assert_eq!(first.done, 3);
    assert_eq!(first.failed, 0);
    assert_eq!(fixture.store.count().unwrap(), 3);

    let before = fixture.store.snapshot().unwrap().into_articles();

    let second = fixture.crawl(&urls, CrawlOptions::default()).await;
    assert_eq!(second.done, 0);
    assert_eq!(second.skipped, 3);

    let after = fixture.store.snapshot().unwrap().into_articles();
    assert_eq!(before, after);

    let stored = fixture.store.get(&urls[0]).unwrap().unwrap();
    assert_eq!(stored.article.title, "Rust Ownership");
    assert_eq!(stored.article.claps, 1200);
}

#[tokio::test]
async fn test_not_found_is_isolated() {
    let server = MockServer::start().await;
    let base = server.uri();
    mount_article(&server, "/good", "Good Article", "7", 1).await;
    Mock::given(method("GET"))
        .and(path("/gone"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let urls = vec![format!("{}/gone", base), format!("{}/good", base)];
    let fixture = Fixture::new(3);
    let report = fixture.crawl(&urls, CrawlOptions::default()).await;

    assert_eq!(report.done, 1);
    assert_eq!(report.failed, 1);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].url, urls[0]);
    assert_eq!(report.failures[0].kind, "not_found");
    assert_eq!(fixture.store.count().unwrap(), 1);

    let run = fixture.store.latest_run().unwrap().unwrap();
    assert_eq!(run.status, RunStatus::Completed);
    assert_eq!(run.counts.failed, 1);
}

#[tokio::test]
async fn test_challenge_is_retried_until_article_arrives() {
    let server = MockServer::start().await;
    let base = server.uri();

    // Mounted first, so it answers until exhausted
    Mock::given(method("GET"))
        .and(path("/guarded"))
        .respond_with(ResponseTemplate::new(503).set_body_string(
            "<html><head><title>Just a moment...</title></head><body></body></html>",
        ))
        .up_to_n_times(2)
        .mount(&server)
        .await;
    mount_article(&server, "/guarded", "Guarded Article", "15", 1).await;

    let urls = vec![format!("{}/guarded", base)];
    let fixture = Fixture::new(3);
    let report = fixture.crawl(&urls, CrawlOptions::default()).await;

    assert_eq!(report.done, 1);
    assert_eq!(report.failed, 0);
    let stored = fixture.store.get(&urls[0]).unwrap().unwrap();
    assert_eq!(stored.article.title, "Guarded Article");
}

#[tokio::test]
async fn test_persistent_block_fails_after_max_attempts() {
    let server = MockServer::start().await;
    let base = server.uri();
    Mock::given(method("GET"))
        .and(path("/blocked"))
        .respond_with(ResponseTemplate::new(429))
        .expect(2)
        .mount(&server)
        .await;

    let urls = vec![format!("{}/blocked", base)];
    let fixture = Fixture::new(2);
    let report = fixture.crawl(&urls, CrawlOptions::default()).await;

    assert_eq!(report.done, 0);
    assert_eq!(report.failed, 1);
    assert_eq!(report.failures[0].kind, "anti_bot_challenge");
    assert_eq!(fixture.store.count().unwrap(), 0);
}

#[tokio::test]
async fn test_no_resume_clears_corpus_first() {
    let server = MockServer::start().await;
    let base = server.uri();
    mount_article(&server, "/one", "First Article", "1", 1).await;
    mount_article(&server, "/two", "Second Article", "2", 2).await;

    let fixture = Fixture::new(3);
    fixture
        .crawl(
            &[format!("{}/one", base), format!("{}/two", base)],
            CrawlOptions::default(),
        )
        .await;
    assert_eq!(fixture.store.count().unwrap(), 2);

    let report = fixture
        .crawl(
            &[format!("{}/two", base)],
            CrawlOptions {
                resume: false,
                force: false,
            },
        )
        .await;

    assert_eq!(report.done, 1);
    assert_eq!(report.skipped, 0);
    assert_eq!(fixture.store.count().unwrap(), 1);
    assert!(!fixture.store.contains(&format!("{}/one", base)).unwrap());
}

#[tokio::test]
async fn test_corpus_survives_reopen() {
    let server = MockServer::start().await;
    let base = server.uri();
    mount_article(&server, "/durable", "Durable Article", "99", 1).await;

    let fixture = Fixture::new(3);
    let urls = vec![format!("{}/durable", base)];
    fixture.crawl(&urls, CrawlOptions::default()).await;

    let reopened = SqliteStorage::new(std::path::Path::new(&fixture.config.storage.database_path))
        .expect("Failed to reopen DB");
    assert!(reopened.contains(&urls[0]).unwrap());
    assert_eq!(reopened.count().unwrap(), 1);
}

#[tokio::test]
async fn test_huge_clap_counter_does_not_stop_the_crawl() {
    let server = MockServer::start().await;
    let base = server.uri();
    mount_article(&server, "/ok1", "First Fine", "10", 1).await;
    mount_article(&server, "/huge", "Huge Counter", "99999999999999999999", 1).await;
    mount_article(&server, "/ok2", "Second Fine", "20", 1).await;

    let urls = vec![
        format!("{}/ok1", base),
        format!("{}/huge", base),
        format!("{}/ok2", base),
    ];
    let fixture = Fixture::new(3);
    let report = fixture.crawl(&urls, CrawlOptions::default()).await;

    assert_eq!(report.done, 3);
    assert_eq!(report.failed, 0);
    assert_eq!(fixture.store.count().unwrap(), 3);
    let huge = fixture.store.get(&urls[1]).unwrap().unwrap();
    assert_eq!(huge.article.claps, i64::MAX as u64);
}
