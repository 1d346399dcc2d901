use std::collections::{BTreeMap, HashMap};
use std::sync::LazyLock;

use regex::Regex;

use super::error::ScoringError;
use super::stopwords::is_stopword;

/// Vocabulary cap for the two-document TF-IDF fit.
pub const DEFAULT_MAX_FEATURES: usize = 5000;

static TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b\w\w+\b").expect("token pattern is valid"));

/// Unigram + bigram TF-IDF cosine between two texts, refit on every call.
#[derive(Debug, Clone, Copy)]
pub struct KeywordOverlap {
    max_features: usize,
}

impl Default for KeywordOverlap {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_FEATURES)
    }
}

impl KeywordOverlap {
    pub fn new(max_features: usize) -> Self {
        Self { max_features }
    }

    /// Returns 0 for blank input, an error when nothing survives stop-word removal.
    pub fn score(&self, left: &str, right: &str) -> Result<f64, ScoringError> {
        if left.trim().is_empty() || right.trim().is_empty() {
            return Ok(0.0);
        }
        if self.max_features == 0 {
            return Err(ScoringError::ComputationFailed {
                reason: "max_features must be positive".to_string(),
            });
        }

        let docs = [term_counts(left), term_counts(right)];
        let vocabulary = self.vocabulary(&docs);
        if vocabulary.is_empty() {
            return Err(ScoringError::EmptyVocabulary);
        }

        let n_docs = docs.len() as f64;
        let idf: HashMap<&str, f64> = vocabulary
            .iter()
            .map(|term| {
                let df = docs.iter().filter(|doc| doc.contains_key(*term)).count() as f64;
                (*term, ((1.0 + n_docs) / (1.0 + df)).ln() + 1.0)
            })
            .collect();

        let weigh = |doc: &BTreeMap<String, usize>| {
            let weighted: HashMap<&str, f64> = vocabulary
                .iter()
                .filter_map(|term| doc.get(*term).map(|count| (*term, *count as f64 * idf[term])))
                .collect();
            l2_normalize(weighted)
        };
        let left_vec = weigh(&docs[0]);
        let right_vec = weigh(&docs[1]);

        let dot: f64 = left_vec
            .iter()
            .filter_map(|(term, weight)| right_vec.get(term).map(|other| weight * other))
            .sum();
        Ok(dot.clamp(0.0, 1.0))
    }

    /// Most frequent terms across both documents, ties broken alphabetically.
    fn vocabulary<'d>(&self, docs: &'d [BTreeMap<String, usize>]) -> Vec<&'d str> {
        let mut totals: BTreeMap<&str, usize> = BTreeMap::new();
        for doc in docs {
            for (term, count) in doc {
                *totals.entry(term.as_str()).or_default() += count;
            }
        }
        let mut ranked: Vec<(&str, usize)> = totals.into_iter().collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1));
        ranked.truncate(self.max_features);
        ranked.into_iter().map(|(term, _)| term).collect()
    }
}

fn term_counts(text: &str) -> BTreeMap<String, usize> {
    let lowered = text.to_lowercase();
    let tokens: Vec<&str> = TOKEN
        .find_iter(&lowered)
        .map(|m| m.as_str())
        .filter(|token| !is_stopword(token))
        .collect();

    let mut counts = BTreeMap::new();
    for token in &tokens {
        *counts.entry((*token).to_string()).or_default() += 1;
    }
    for pair in tokens.windows(2) {
        *counts.entry(format!("{} {}", pair[0], pair[1])).or_default() += 1;
    }
    counts
}

fn l2_normalize(mut vector: HashMap<&str, f64>) -> HashMap<&str, f64> {
    let norm = vector.values().map(|w| w * w).sum::<f64>().sqrt();
    if norm > 0.0 {
        for weight in vector.values_mut() {
            *weight /= norm;
        }
    }
    vector
}
