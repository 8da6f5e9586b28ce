//! Request handlers for the search service

use crate::search::SearchHit;
use crate::server::{ApiError, AppState};
use crate::storage::StoredArticle;
use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Raw query parameters; parsed by hand so bad input gets a JSON error
#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub query: Option<String>,
    pub top_k: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub query: String,
    pub count: usize,
    pub articles: Vec<SearchHit>,
}

#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub article_count: usize,
    pub vocabulary_size: usize,
    pub last_built: Option<DateTime<Utc>>,
    pub total_claps: u64,
    pub avg_claps: f64,
    pub unique_authors: u64,
}

#[derive(Debug, Serialize)]
pub struct ServiceInfo {
    pub service: &'static str,
    pub version: &'static str,
    pub article_count: usize,
    pub endpoints: Vec<&'static str>,
}

pub async fn handle_index(State(state): State<AppState>) -> Json<ServiceInfo> {
    Json(ServiceInfo {
        service: "article-lens search",
        version: env!("CARGO_PKG_VERSION"),
        article_count: state.index.current().article_count(),
        endpoints: vec![
            "GET /search?query=<text>&top_k=<n>",
            "GET /stats",
            "GET /articles/{seq}",
        ],
    })
}

pub async fn handle_search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<SearchResponse>, ApiError> {
    let query = params.query.unwrap_or_default();
    let top_k = match params.top_k.as_deref().map(str::trim) {
        None | Some("") => state.default_top_k,
        Some(raw) => raw.parse::<usize>().map_err(|_| {
            ApiError::InvalidQuery(format!("top_k must be a non-negative integer, got '{}'", raw))
        })?,
    }
    .min(state.max_top_k);

    let articles = state.index.current().search(&query, top_k)?;
    tracing::debug!("Query '{}' returned {} results", query, articles.len());

    Ok(Json(SearchResponse {
        query,
        count: articles.len(),
        articles,
    }))
}

pub async fn handle_stats(State(state): State<AppState>) -> Result<Json<StatsResponse>, ApiError> {
    let index = state.index.current().stats();
    let corpus = state.store.statistics()?;

    Ok(Json(StatsResponse {
        article_count: index.article_count,
        vocabulary_size: index.vocabulary_size,
        last_built: index.last_built,
        total_claps: corpus.total_claps,
        avg_claps: corpus.avg_claps,
        unique_authors: corpus.unique_authors,
    }))
}

pub async fn handle_article(
    State(state): State<AppState>,
    Path(seq): Path<i64>,
) -> Result<Json<StoredArticle>, ApiError> {
    state
        .store
        .get_by_seq(seq)?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("no article with sequence {}", seq)))
}
