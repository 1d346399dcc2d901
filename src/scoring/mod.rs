//! Poster/judge match scoring.
//!
//! Four independent components are combined by [`ScoreWeights`]:
//! semantic (embedding cosine), lexical (TF-IDF cosine), field (discipline
//! keyword Jaccard) and expertise (profile vocabulary heuristic). A failing
//! component is zeroed and reported; it never aborts the pair.

mod error;
pub mod expertise;
pub mod field;
pub mod lexical;
pub mod stopwords;

pub use error::ScoringError;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::embedding::{cosine_similarity, SentenceEmbedder};
use crate::models::{Component, Judge, Poster, Professor, ScoreComponents};
use crate::text::normalize;

use expertise::expertise_score;
use field::field_similarity;
use lexical::KeywordOverlap;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreWeights {
    pub semantic: f64,
    pub lexical: f64,
    /// Computed for every pair but weighted zero unless configured otherwise.
    pub field: f64,
    pub expertise: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            semantic: 0.35,
            lexical: 0.25,
            field: 0.0,
            expertise: 0.40,
        }
    }
}

impl ScoreWeights {
    pub fn combine(&self, components: &ScoreComponents) -> f64 {
        self.semantic * components.semantic
            + self.lexical * components.lexical
            + self.field * components.field
            + self.expertise * components.expertise
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MatchScore {
    pub score: f64,
    pub components: ScoreComponents,
}

/// Scorer state shared read-only by every pair computation.
#[derive(Debug)]
pub struct MatchScorer<'e> {
    embedder: &'e SentenceEmbedder,
    overlap: KeywordOverlap,
    weights: ScoreWeights,
}

impl<'e> MatchScorer<'e> {
    pub fn new(embedder: &'e SentenceEmbedder, overlap: KeywordOverlap, weights: ScoreWeights) -> Self {
        Self {
            embedder,
            overlap,
            weights,
        }
    }

    pub fn weights(&self) -> ScoreWeights {
        self.weights
    }

    /// Scores one pair. A judge without a linked profile scores zero everywhere.
    pub fn score(&self, poster: &Poster, judge: &Judge, professor: Option<&Professor>) -> MatchScore {
        let Some(professor) = professor else {
            return MatchScore {
                score: 0.0,
                components: ScoreComponents::default(),
            };
        };

        let abstract_text = normalize(&poster.abstract_text);
        let profile_text = professor.profile_text();
        let mut failures = Vec::new();

        let semantic = settle(
            Component::Semantic,
            self.semantic(&abstract_text, &profile_text),
            poster,
            judge,
            &mut failures,
        );
        let lexical = settle(
            Component::Lexical,
            self.overlap.score(&abstract_text, &profile_text),
            poster,
            judge,
            &mut failures,
        );

        let components = ScoreComponents {
            semantic,
            lexical,
            field: field_similarity(&poster.program, &judge.department),
            expertise: expertise_score(&profile_text),
            failures,
        };

        MatchScore {
            score: self.weights.combine(&components),
            components,
        }
    }

    fn semantic(&self, abstract_text: &str, profile_text: &str) -> Result<f64, ScoringError> {
        if abstract_text.is_empty() || profile_text.is_empty() {
            return Ok(0.0);
        }
        let poster_vec = self.embedder.embed(abstract_text)?;
        let profile_vec = self.embedder.embed(profile_text)?;
        if poster_vec.len() != profile_vec.len() {
            return Err(ScoringError::ComputationFailed {
                reason: format!(
                    "embedding width mismatch ({} vs {})",
                    poster_vec.len(),
                    profile_vec.len()
                ),
            });
        }
        Ok(cosine_similarity(&poster_vec, &profile_vec))
    }
}

fn settle(
    component: Component,
    outcome: Result<f64, ScoringError>,
    poster: &Poster,
    judge: &Judge,
    failures: &mut Vec<Component>,
) -> f64 {
    match outcome {
        Ok(value) if value.is_finite() => value,
        Ok(value) => {
            warn!(poster_id = poster.id, judge_id = judge.id, %component, value, "non-finite component score, using 0");
            failures.push(component);
            0.0
        }
        Err(err) => {
            warn!(poster_id = poster.id, judge_id = judge.id, %component, error = %err, "component score failed, using 0");
            failures.push(component);
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::EmbedderConfig;
    use crate::models::Availability;

    fn embedder() -> SentenceEmbedder {
        SentenceEmbedder::load(EmbedderConfig::stub()).unwrap()
    }

    fn poster(abstract_text: &str, program: &str) -> Poster {
        Poster {
            id: 1,
            program: program.to_string(),
            abstract_text: abstract_text.to_string(),
        }
    }

    fn judge(department: &str) -> Judge {
        Judge {
            id: 10,
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            department: department.to_string(),
            availability: Availability::Both,
        }
    }

    fn professor(research: &str) -> Professor {
        Professor {
            name: "Ada Lovelace".to_string(),
            current_research: research.to_string(),
            ..Professor::default()
        }
    }

    #[test]
    fn default_weights_leave_field_unused() {
        let weights = ScoreWeights::default();
        assert_eq!(weights.field, 0.0);
        let components = ScoreComponents {
            semantic: 1.0,
            lexical: 1.0,
            field: 1.0,
            expertise: 1.0,
            failures: vec![],
        };
        assert!((weights.combine(&components) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn unlinked_judge_scores_zero() {
        let embedder = embedder();
        let scorer = MatchScorer::new(&embedder, KeywordOverlap::default(), ScoreWeights::default());
        let result = scorer.score(&poster("robots", "Computer Science"), &judge("Computer Science"), None);
        assert_eq!(result.score, 0.0);
        assert_eq!(result.components, ScoreComponents::default());
    }

    #[test]
    fn identical_texts_combine_all_components() {
        let embedder = embedder();
        let scorer = MatchScorer::new(&embedder, KeywordOverlap::default(), ScoreWeights::default());
        let text = "advanced research on swarm robotics";
        let result = scorer.score(
            &poster(text, "Computer Science"),
            &judge("Computer Science"),
            Some(&professor(text)),
        );

        let c = &result.components;
        assert!((c.semantic - 1.0).abs() < 1e-6);
        assert!((c.lexical - 1.0).abs() < 1e-9);
        assert_eq!(c.field, 1.0);
        assert!((c.expertise - 0.6).abs() < 1e-12);
        assert!(c.failures.is_empty());
        let expected = 0.35 + 0.25 + 0.40 * 0.6;
        assert!((result.score - expected).abs() < 1e-6);
    }

    #[test]
    fn empty_abstract_zeroes_text_components() {
        let embedder = embedder();
        let scorer = MatchScorer::new(&embedder, KeywordOverlap::default(), ScoreWeights::default());
        let result = scorer.score(&poster("", "Art"), &judge("Music"), Some(&professor("expert")));
        assert_eq!(result.components.semantic, 0.0);
        assert_eq!(result.components.lexical, 0.0);
        assert!((result.score - 0.40 * 0.8).abs() < 1e-12);
    }

    #[test]
    fn failing_component_degrades_to_zero_and_is_recorded() {
        let embedder = embedder();
        let scorer = MatchScorer::new(&embedder, KeywordOverlap::default(), ScoreWeights::default());
        // Only stop words: the TF-IDF fit has no vocabulary.
        let result = scorer.score(
            &poster("the and of", "Art"),
            &judge("Music"),
            Some(&professor("it is a")),
        );
        assert_eq!(result.components.lexical, 0.0);
        assert_eq!(result.components.failures, vec![Component::Lexical]);
    }
}
