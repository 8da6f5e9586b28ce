//! TF-IDF index over one corpus snapshot
//!
//! Document vectors use raw term counts times `idf(t) = ln((N + 1) / (df + 1)) + 1`
//! and are L2-normalized. Vectors are stored as postings per term so a
//! query only touches documents that share a term with it.

use crate::search::TextPipeline;
use crate::storage::CorpusSnapshot;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

pub type TermId = u32;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IndexBuildError {
    #[error("Corpus is empty; nothing to index")]
    EmptyCorpus,
}

/// Per-term statistics
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TermStats {
    pub id: TermId,
    pub df: u32,
    pub idf: f64,
}

/// The article fields a search result needs
#[derive(Debug, Clone, PartialEq)]
pub struct IndexedDocument {
    pub seq: i64,
    pub url: String,
    pub title: String,
    pub claps: u64,
    pub author: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Posting {
    /// Position in `SearchIndex::documents`
    pub doc: usize,
    /// Normalized tf-idf weight
    pub weight: f64,
}

/// Summary exposed by the stats endpoint
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndexStats {
    pub article_count: usize,
    pub vocabulary_size: usize,
    pub last_built: Option<DateTime<Utc>>,
}

/// Immutable vocabulary plus document vectors
pub struct SearchIndex {
    pub(crate) pipeline: Arc<dyn TextPipeline>,
    pub(crate) vocabulary: HashMap<String, TermStats>,
    pub(crate) postings: HashMap<TermId, Vec<Posting>>,
    pub(crate) documents: Vec<IndexedDocument>,
    last_built: Option<DateTime<Utc>>,
}

impl SearchIndex {
    /// An index with no documents; queries against it return nothing
    pub fn empty(pipeline: Arc<dyn TextPipeline>) -> Self {
        Self {
            pipeline,
            vocabulary: HashMap::new(),
            postings: HashMap::new(),
            documents: Vec::new(),
            last_built: None,
        }
    }

    /// Builds an index from a snapshot
    ///
    /// # Arguments
    ///
    /// * `snapshot` - Articles in extraction order
    /// * `pipeline` - Normalization applied to every article and later to queries
    ///
    /// # Returns
    ///
    /// * `Ok(SearchIndex)` - The finished index
    /// * `Err(IndexBuildError::EmptyCorpus)` - The snapshot has no articles
    pub fn build(
        snapshot: &CorpusSnapshot,
        pipeline: Arc<dyn TextPipeline>,
    ) -> Result<Self, IndexBuildError> {
        if snapshot.is_empty() {
            return Err(IndexBuildError::EmptyCorpus);
        }

        let mut term_ids: HashMap<String, TermId> = HashMap::new();
        let mut df: Vec<u32> = Vec::new();
        let mut counts_per_doc: Vec<HashMap<TermId, u32>> = Vec::with_capacity(snapshot.len());
        let mut documents = Vec::with_capacity(snapshot.len());

        for stored in snapshot {
            let mut counts: HashMap<TermId, u32> = HashMap::new();
            for term in pipeline.normalize(&stored.article.searchable_text()) {
                let next_id = term_ids.len() as TermId;
                let id = *term_ids.entry(term).or_insert_with(|| {
                    df.push(0);
                    next_id
                });
                *counts.entry(id).or_insert(0) += 1;
            }
            for id in counts.keys() {
                df[*id as usize] += 1;
            }

            counts_per_doc.push(counts);
            documents.push(IndexedDocument {
                seq: stored.seq,
                url: stored.article.url.clone(),
                title: stored.article.title.clone(),
                claps: stored.article.claps,
                author: stored.article.author.clone(),
            });
        }

        let n = documents.len() as f64;
        let idf: Vec<f64> = df.iter().map(|&d| smoothed_idf(n, d as f64)).collect();

        let mut postings: HashMap<TermId, Vec<Posting>> = HashMap::new();
        for (doc, counts) in counts_per_doc.into_iter().enumerate() {
            let weights: Vec<(TermId, f64)> = counts
                .into_iter()
                .map(|(id, tf)| (id, tf as f64 * idf[id as usize]))
                .collect();
            for (id, weight) in l2_normalize(weights) {
                postings.entry(id).or_default().push(Posting { doc, weight });
            }
        }

        let vocabulary = term_ids
            .into_iter()
            .map(|(term, id)| {
                let stats = TermStats {
                    id,
                    df: df[id as usize],
                    idf: idf[id as usize],
                };
                (term, stats)
            })
            .collect::<HashMap<_, _>>();

        tracing::info!(
            "Built index: {} articles, {} terms",
            documents.len(),
            vocabulary.len()
        );

        Ok(Self {
            pipeline,
            vocabulary,
            postings,
            documents,
            last_built: Some(Utc::now()),
        })
    }

    /// Marks an empty index as built at `at`
    pub(crate) fn with_last_built(mut self, at: DateTime<Utc>) -> Self {
        self.last_built = Some(at);
        self
    }

    pub fn article_count(&self) -> usize {
        self.documents.len()
    }

    pub fn vocabulary_size(&self) -> usize {
        self.vocabulary.len()
    }

    pub fn last_built(&self) -> Option<DateTime<Utc>> {
        self.last_built
    }

    pub fn term(&self, term: &str) -> Option<TermStats> {
        self.vocabulary.get(term).copied()
    }

    pub fn stats(&self) -> IndexStats {
        IndexStats {
            article_count: self.article_count(),
            vocabulary_size: self.vocabulary_size(),
            last_built: self.last_built,
        }
    }
}

pub(crate) fn smoothed_idf(n: f64, df: f64) -> f64 {
    ((n + 1.0) / (df + 1.0)).ln() + 1.0
}

/// Scales weights to unit length; an all-zero vector is returned empty
pub(crate) fn l2_normalize(weights: Vec<(TermId, f64)>) -> Vec<(TermId, f64)> {
    let norm = weights.iter().map(|(_, w)| w * w).sum::<f64>().sqrt();
    if norm == 0.0 {
        return Vec::new();
    }
    weights.into_iter().map(|(id, w)| (id, w / norm)).collect()
}
