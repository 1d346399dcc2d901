use thiserror::Error;

use crate::embedding::EmbeddingError;

#[derive(Debug, Error)]
pub enum ScoringError {
    #[error("embedding error: {0}")]
    Embedding(#[from] EmbeddingError),

    #[error("empty vocabulary; texts contain only stop words")]
    EmptyVocabulary,

    #[error("scoring computation failed: {reason}")]
    ComputationFailed { reason: String },
}
