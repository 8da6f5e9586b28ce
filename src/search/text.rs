//! Text normalization shared by indexing and querying
//!
//! The pipeline is deterministic: the same input always yields the same
//! terms, so corpus text and queries land in the same term space.

use rust_stemmers::{Algorithm, Stemmer};
use std::collections::HashSet;

/// English stopwords dropped before stemming
pub(crate) const STOPWORDS: &[&str] = &[
    "a", "about", "above", "after", "again", "against", "all", "also", "am", "an", "and", "any",
    "are", "as", "at", "be", "because", "been", "before", "being", "below", "between", "both",
    "but", "by", "can", "could", "did", "do", "does", "doing", "down", "during", "each", "few",
    "for", "from", "further", "had", "has", "have", "having", "he", "her", "here", "hers",
    "herself", "him", "himself", "his", "how", "if", "in", "into", "is", "it", "its", "itself",
    "just", "me", "more", "most", "my", "myself", "no", "nor", "not", "now", "of", "off", "on",
    "once", "only", "or", "other", "our", "ours", "ourselves", "out", "over", "own", "same",
    "she", "should", "so", "some", "such", "than", "that", "the", "their", "theirs", "them",
    "themselves", "then", "there", "these", "they", "this", "those", "through", "to", "too",
    "under", "until", "up", "very", "was", "we", "were", "what", "when", "where", "which",
    "while", "who", "whom", "why", "will", "with", "would", "you", "your", "yours", "yourself",
    "yourselves",
];

/// Turns raw text into index terms
pub trait TextPipeline: Send + Sync {
    fn normalize(&self, text: &str) -> Vec<String>;
}

/// Lowercase, tokenize, drop stopwords, Snowball English stemming
pub struct StandardPipeline {
    stemmer: Stemmer,
    stopwords: HashSet<&'static str>,
}

impl StandardPipeline {
    pub fn new() -> Self {
        Self {
            stemmer: Stemmer::create(Algorithm::English),
            stopwords: STOPWORDS.iter().copied().collect(),
        }
    }

    fn keep(&self, token: &str) -> bool {
        token.chars().count() >= 2
            && !token.chars().all(|c| c.is_numeric())
            && !self.stopwords.contains(token)
    }
}

impl Default for StandardPipeline {
    fn default() -> Self {
        Self::new()
    }
}

impl TextPipeline for StandardPipeline {
    fn normalize(&self, text: &str) -> Vec<String> {
        text.to_lowercase()
            .split(|c: char| !c.is_alphanumeric())
            .filter(|token| self.keep(token))
            .map(|token| self.stemmer.stem(token).into_owned())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_basic() {
        let pipeline = StandardPipeline::new();
        assert_eq!(
            pipeline.normalize("Deep Learning, basics!"),
            vec!["deep", "learn", "basic"]
        );
    }

    #[test]
    fn test_stopwords_numbers_and_short_tokens_dropped() {
        let pipeline = StandardPipeline::new();
        assert_eq!(
            pipeline.normalize("The 2024 state of a x AI"),
            vec!["state", "ai"]
        );
    }

    #[test]
    fn test_query_and_document_share_terms() {
        let pipeline = StandardPipeline::new();
        let doc = pipeline.normalize("Machine learning models");
        let query = pipeline.normalize("machine learned model");
        assert_eq!(doc, query);
    }

    #[test]
    fn test_empty_and_punctuation_only() {
        let pipeline = StandardPipeline::new();
        assert!(pipeline.normalize("").is_empty());
        assert!(pipeline.normalize(" -- !! ").is_empty());
    }

    #[test]
    fn test_deterministic() {
        let pipeline = StandardPipeline::new();
        let text = "Education policy reform in practice";
        assert_eq!(pipeline.normalize(text), pipeline.normalize(text));
    }
}
