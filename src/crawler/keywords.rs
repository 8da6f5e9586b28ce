//! Keyword extraction for article bodies
//!
//! Rapid automatic keyword extraction: candidate phrases are the runs of
//! words between stopwords and punctuation. Each word scores
//! `degree / frequency` over all candidates, and a phrase scores the sum of
//! its words.

use crate::search::STOPWORDS;
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

/// Keywords kept per article
pub const MAX_KEYWORDS: usize = 10;

/// Extracts up to `limit` ranked key phrases from `text`
///
/// Phrases come back lowercased, highest score first. Ties are broken
/// alphabetically so the result is deterministic.
pub fn extract_keywords(text: &str, limit: usize) -> Vec<String> {
    let stopwords: HashSet<&str> = STOPWORDS.iter().copied().collect();
    let phrases = candidate_phrases(text, &stopwords);

    let mut frequency: HashMap<&str, f64> = HashMap::new();
    let mut degree: HashMap<&str, f64> = HashMap::new();
    for phrase in &phrases {
        for word in phrase {
            *frequency.entry(word.as_str()).or_default() += 1.0;
            *degree.entry(word.as_str()).or_default() += phrase.len() as f64;
        }
    }

    let mut scored: HashMap<String, f64> = HashMap::new();
    for phrase in &phrases {
        let score: f64 = phrase
            .iter()
            .map(|word| degree[word.as_str()] / frequency[word.as_str()])
            .sum();
        scored.entry(phrase.join(" ")).or_insert(score);
    }

    let mut ranked: Vec<(String, f64)> = scored.into_iter().collect();
    ranked.sort_by(|(a, score_a), (b, score_b)| {
        score_b
            .partial_cmp(score_a)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.cmp(b))
    });

    ranked.into_iter().take(limit).map(|(phrase, _)| phrase).collect()
}

fn candidate_phrases(text: &str, stopwords: &HashSet<&str>) -> Vec<Vec<String>> {
    let mut phrases = Vec::new();

    let fragments = text.split(|c: char| !(c.is_alphanumeric() || c.is_whitespace() || c == '\''));
    for fragment in fragments {
        let mut current: Vec<String> = Vec::new();
        for word in fragment.split_whitespace() {
            let word = word.trim_matches('\'').to_lowercase();
            let is_word = word.chars().any(char::is_alphabetic);
            if !is_word || stopwords.contains(word.as_str()) {
                if !current.is_empty() {
                    phrases.push(std::mem::take(&mut current));
                }
            } else {
                current.push(word);
            }
        }
        if !current.is_empty() {
            phrases.push(current);
        }
    }

    phrases
}
