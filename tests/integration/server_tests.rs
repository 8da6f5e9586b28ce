//! Integration tests for the search service router

use article_lens::config::ServerConfig;
use article_lens::search::IndexHandle;
use article_lens::server::{router, AppState};
use article_lens::storage::{Article, CorpusStore, SqliteStorage};
use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

fn app(max_top_k: usize) -> Router {
    let store = Arc::new(SqliteStorage::new_in_memory().expect("in-memory store"));
    let mut education = Article::new("https://blog.test/a", "education policy reform", 50);
    education.author = Some("Alice".to_string());
    let mut learning = Article::new("https://blog.test/b", "deep learning basics", 200);
    learning.author = Some("Bob".to_string());
    store.append(&education, false).unwrap();
    store.append(&learning, false).unwrap();

    let index = Arc::new(IndexHandle::default());
    index.rebuild_blocking(store.as_ref()).unwrap();

    let config = ServerConfig {
        max_top_k,
        ..ServerConfig::default()
    };
    let store: Arc<dyn CorpusStore> = store;
    router(AppState::new(index, store, &config))
}

async fn get(app: Router, uri: &str) -> (StatusCode, Value) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).expect("request"))
        .await
        .expect("router response");
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    let json = serde_json::from_slice(&bytes).expect("json body");
    (status, json)
}

#[tokio::test]
async fn test_search_returns_ranked_articles() {
    let (status, body) = get(app(50), "/search?query=machine%20learning&top_k=1").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["query"], "machine learning");
    assert_eq!(body["count"], 1);
    assert_eq!(body["articles"][0]["url"], "https://blog.test/b");
    assert_eq!(body["articles"][0]["claps"], 200);
    assert_eq!(body["articles"][0]["author"], "Bob");
    let score = body["articles"][0]["score"].as_f64().unwrap();
    assert!(score > 0.0 && score <= 1.0);
}

#[tokio::test]
async fn test_search_uses_default_top_k_and_cap() {
    let (_, body) = get(app(50), "/search?query=unrelated%20xyz%20term").await;
    assert_eq!(body["count"], 2);
    assert_eq!(body["articles"][0]["url"], "https://blog.test/b");
    assert_eq!(body["articles"][1]["url"], "https://blog.test/a");

    let (_, capped) = get(app(1), "/search?query=learning&top_k=25").await;
    assert_eq!(capped["count"], 1);
}

#[tokio::test]
async fn test_missing_or_empty_query_is_bad_request() {
    let (status, body) = get(app(50), "/search").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("empty"));

    let (status, _) = get(app(50), "/search?query=%20%20").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = get(app(50), "/search?query=rust&top_k=lots").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("top_k"));
}

#[tokio::test]
async fn test_stats() {
    let (status, body) = get(app(50), "/stats").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["article_count"], 2);
    assert_eq!(body["vocabulary_size"], 6);
    assert!(body["last_built"].is_string());
    assert_eq!(body["total_claps"], 250);
    assert_eq!(body["avg_claps"], 125.0);
    assert_eq!(body["unique_authors"], 2);
}

#[tokio::test]
async fn test_article_by_sequence() {
    let (status, body) = get(app(50), "/articles/2").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["seq"], 2);
    assert_eq!(body["url"], "https://blog.test/b");
    assert_eq!(body["title"], "deep learning basics");

    let (status, body) = get(app(50), "/articles/99").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_service_description() {
    let (status, body) = get(app(50), "/").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["article_count"], 2);
    assert!(body["endpoints"].is_array());
}
