//! Shared, swappable search index
//!
//! Readers clone the active `Arc<SearchIndex>` under a momentary read lock
//! and query it without holding any lock. A rebuild constructs the new
//! index off to the side and only takes the write lock for the pointer swap.

use crate::search::{IndexBuildError, SearchHit, SearchIndex, StandardPipeline, TextPipeline};
use crate::storage::{CorpusStore, StorageError};
use crate::LensError;
use chrono::Utc;
use std::sync::{Arc, PoisonError, RwLock};

pub struct IndexHandle {
    active: RwLock<Arc<SearchIndex>>,
    pipeline: Arc<dyn TextPipeline>,
}

impl IndexHandle {
    /// Creates a handle serving an empty, never-built index
    pub fn new(pipeline: Arc<dyn TextPipeline>) -> Self {
        Self {
            active: RwLock::new(Arc::new(SearchIndex::empty(Arc::clone(&pipeline)))),
            pipeline,
        }
    }

    /// The index queries should run against right now
    pub fn current(&self) -> Arc<SearchIndex> {
        let guard = self.active.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&*guard)
    }

    /// Replaces the active index
    pub fn install(&self, index: SearchIndex) {
        let index = Arc::new(index);
        let mut guard = self.active.write().unwrap_or_else(PoisonError::into_inner);
        *guard = index;
    }

    /// Snapshots the store, builds a new index and swaps it in
    ///
    /// An empty corpus installs an empty index. Runs on the calling thread;
    /// use `rebuild` from async code.
    ///
    /// # Returns
    ///
    /// * `Ok(Arc<SearchIndex>)` - The newly active index
    /// * `Err(StorageError)` - The snapshot could not be taken; the previous index stays active
    pub fn rebuild_blocking(&self, store: &dyn CorpusStore) -> Result<Arc<SearchIndex>, StorageError> {
        let snapshot = store.snapshot()?;

        let index = match SearchIndex::build(&snapshot, Arc::clone(&self.pipeline)) {
            Ok(index) => index,
            Err(IndexBuildError::EmptyCorpus) => {
                tracing::warn!("Corpus is empty; serving an empty index");
                SearchIndex::empty(Arc::clone(&self.pipeline)).with_last_built(Utc::now())
            }
        };

        self.install(index);
        Ok(self.current())
    }

    /// Rebuilds on the blocking pool so the async runtime keeps serving queries
    pub async fn rebuild(
        self: &Arc<Self>,
        store: Arc<dyn CorpusStore>,
    ) -> Result<Arc<SearchIndex>, LensError> {
        let handle = Arc::clone(self);
        let index =
            tokio::task::spawn_blocking(move || handle.rebuild_blocking(store.as_ref())).await??;
        Ok(index)
    }

    /// Runs a query against the active index
    pub fn search(&self, query: &str, top_k: usize) -> Result<Vec<SearchHit>, LensError> {
        Ok(self.current().search(query, top_k)?)
    }
}

impl Default for IndexHandle {
    fn default() -> Self {
        Self::new(Arc::new(StandardPipeline::new()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{Article, SqliteStorage};

    #[test]
    fn test_new_handle_is_empty_and_unbuilt() {
        let handle = IndexHandle::default();
        let index = handle.current();
        assert_eq!(index.article_count(), 0);
        assert!(index.last_built().is_none());
        assert!(handle.search("anything", 3).unwrap().is_empty());
    }

    #[test]
    fn test_rebuild_from_empty_store_degrades() {
        let store = SqliteStorage::new_in_memory().unwrap();
        let handle = IndexHandle::default();
        let index = handle.rebuild_blocking(&store).unwrap();
        assert_eq!(index.article_count(), 0);
        assert!(index.last_built().is_some());
    }

    #[test]
    fn test_readers_keep_old_index_across_swap() {
        let store = SqliteStorage::new_in_memory().unwrap();
        store
            .append(&Article::new("https://a.test/1", "deep learning", 3), false)
            .unwrap();
        let handle = IndexHandle::default();
        handle.rebuild_blocking(&store).unwrap();
        let before = handle.current();

        store
            .append(&Article::new("https://a.test/2", "policy reform", 1), false)
            .unwrap();
        let after = handle.rebuild_blocking(&store).unwrap();

        assert_eq!(before.article_count(), 1);
        assert_eq!(after.article_count(), 2);
        assert!(after.vocabulary_size() >= before.vocabulary_size());
        assert_eq!(handle.current().article_count(), 2);
    }

    #[test]
    fn test_invalid_query_through_handle() {
        let handle = IndexHandle::default();
        assert!(matches!(
            handle.search(" ", 3),
            Err(LensError::Query(crate::search::QueryError::InvalidQuery(_)))
        ));
    }

    #[tokio::test]
    async fn test_async_rebuild() {
        let store = Arc::new(SqliteStorage::new_in_memory().unwrap());
        store
            .append(&Article::new("https://a.test/1", "async rebuild", 0), false)
            .unwrap();
        let handle = Arc::new(IndexHandle::default());
        let index = handle.rebuild(store).await.unwrap();
        assert_eq!(index.article_count(), 1);
    }
}
