//! Query engine: cosine similarity against the active index

use crate::search::index::{l2_normalize, SearchIndex, TermId};
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    #[error("Invalid query: {0}")]
    InvalidQuery(String),
}

/// One ranked result
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchHit {
    pub url: String,
    pub title: String,
    pub claps: u64,
    pub author: Option<String>,
    /// Cosine similarity in `[0, 1]`
    pub score: f64,
}

impl SearchIndex {
    /// Ranks stored articles against a free-text query
    ///
    /// Ordering is by score, then claps (higher first), then extraction
    /// order. When some article matches, only matching articles are
    /// returned. Terms missing from the vocabulary carry no weight, so a
    /// query that shares nothing with the corpus still returns articles,
    /// ordered by claps.
    ///
    /// # Returns
    ///
    /// * `Ok(Vec<SearchHit>)` - At most `min(top_k, article_count)` hits
    /// * `Err(QueryError::InvalidQuery)` - The query is empty or whitespace
    pub fn search(&self, query: &str, top_k: usize) -> Result<Vec<SearchHit>, QueryError> {
        if query.trim().is_empty() {
            return Err(QueryError::InvalidQuery(
                "query must not be empty".to_string(),
            ));
        }
        if top_k == 0 || self.documents.is_empty() {
            return Ok(Vec::new());
        }

        let scores = self.score_documents(query);

        let mut ranked: Vec<(usize, f64)> = scores.into_iter().enumerate().collect();
        ranked.sort_by(|(a, score_a), (b, score_b)| {
            let (doc_a, doc_b) = (&self.documents[*a], &self.documents[*b]);
            score_b
                .partial_cmp(score_a)
                .unwrap_or(Ordering::Equal)
                .then_with(|| doc_b.claps.cmp(&doc_a.claps))
                .then_with(|| doc_a.seq.cmp(&doc_b.seq))
        });

        // Sorted by score, so the first entry tells whether anything matched
        let any_match = ranked.first().map_or(false, |(_, score)| *score > 0.0);

        Ok(ranked
            .into_iter()
            .filter(|(_, score)| !any_match || *score > 0.0)
            .take(top_k)
            .map(|(doc, score)| {
                let document = &self.documents[doc];
                SearchHit {
                    url: document.url.clone(),
                    title: document.title.clone(),
                    claps: document.claps,
                    author: document.author.clone(),
                    score,
                }
            })
            .collect())
    }

    /// Cosine score for every document, indexed like `documents`
    fn score_documents(&self, query: &str) -> Vec<f64> {
        let mut counts: HashMap<TermId, (u32, f64)> = HashMap::new();
        for term in self.pipeline.normalize(query) {
            if let Some(stats) = self.vocabulary.get(&term) {
                counts.entry(stats.id).or_insert((0, stats.idf)).0 += 1;
            }
        }

        let weights = counts
            .into_iter()
            .map(|(id, (tf, idf))| (id, tf as f64 * idf))
            .collect();

        let mut scores = vec![0.0; self.documents.len()];
        for (id, query_weight) in l2_normalize(weights) {
            for posting in self.postings.get(&id).into_iter().flatten() {
                scores[posting.doc] += query_weight * posting.weight;
            }
        }

        for score in &mut scores {
            *score = score.clamp(0.0, 1.0);
        }
        scores
    }
}
