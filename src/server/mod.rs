//! Read-only HTTP search service
//!
//! Exposes ranked search and corpus statistics over the active index. The
//! service never mutates the store or the index.

mod error;
mod handlers;

pub use error::ApiError;
pub use handlers::{SearchParams, SearchResponse, ServiceInfo, StatsResponse};

use crate::config::ServerConfig;
use crate::search::IndexHandle;
use crate::storage::CorpusStore;
use crate::LensError;
use axum::routing::get;
use axum::Router;
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;

/// Shared state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub index: Arc<IndexHandle>,
    pub store: Arc<dyn CorpusStore>,
    pub default_top_k: usize,
    pub max_top_k: usize,
}

impl AppState {
    pub fn new(index: Arc<IndexHandle>, store: Arc<dyn CorpusStore>, config: &ServerConfig) -> Self {
        Self {
            index,
            store,
            default_top_k: config.default_top_k,
            max_top_k: config.max_top_k,
        }
    }
}

/// Builds the service router
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::handle_index))
        .route("/search", get(handlers::handle_search))
        .route("/stats", get(handlers::handle_stats))
        .route("/articles/{seq}", get(handlers::handle_article))
        .with_state(state)
}

/// Serves the router on `bind` until `shutdown` resolves
///
/// # Arguments
///
/// * `state` - Shared service state; the index should already be built
/// * `bind` - Address to listen on (host:port)
/// * `shutdown` - Future that resolves when the server should stop
pub async fn serve<F>(state: AppState, bind: &str, shutdown: F) -> Result<(), LensError>
where
    F: Future<Output = ()> + Send + 'static,
{
    let listener = TcpListener::bind(bind).await?;
    tracing::info!("Search service listening on {}", listener.local_addr()?);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await?;

    tracing::info!("Search service stopped");
    Ok(())
}
