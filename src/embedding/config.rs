use std::path::PathBuf;

use crate::embedding::error::EmbeddingError;

/// Output width of the stub backend (matches MiniLM-style sentence encoders).
pub const STUB_EMBEDDING_DIM: usize = 384;

/// Token budget per text; longer abstracts are truncated.
pub const DEFAULT_MAX_SEQ_LEN: usize = 256;

/// Configuration for [`SentenceEmbedder`](super::SentenceEmbedder).
#[derive(Debug, Clone)]
pub struct EmbedderConfig {
    /// Directory holding `config.json`, `tokenizer.json` and `model.safetensors`.
    pub model_dir: PathBuf,
    pub max_seq_len: usize,
    /// Deterministic hash-seeded vectors, no model files needed.
    pub testing_stub: bool,
}

impl Default for EmbedderConfig {
    fn default() -> Self {
        Self {
            model_dir: PathBuf::new(),
            max_seq_len: DEFAULT_MAX_SEQ_LEN,
            testing_stub: false,
        }
    }
}

impl EmbedderConfig {
    pub fn new<P: Into<PathBuf>>(model_dir: P) -> Self {
        Self {
            model_dir: model_dir.into(),
            ..Default::default()
        }
    }

    pub fn stub() -> Self {
        Self {
            testing_stub: true,
            ..Default::default()
        }
    }

    pub fn config_path(&self) -> PathBuf {
        self.model_dir.join("config.json")
    }

    pub fn tokenizer_path(&self) -> PathBuf {
        self.model_dir.join("tokenizer.json")
    }

    pub fn weights_path(&self) -> PathBuf {
        self.model_dir.join("model.safetensors")
    }

    pub fn validate(&self) -> Result<(), EmbeddingError> {
        if self.testing_stub {
            return Ok(());
        }

        if self.model_dir.as_os_str().is_empty() {
            return Err(EmbeddingError::InvalidConfig {
                reason: "model directory is required unless stub embeddings are enabled"
                    .to_string(),
            });
        }

        if self.max_seq_len == 0 {
            return Err(EmbeddingError::InvalidConfig {
                reason: "max_seq_len must be positive".to_string(),
            });
        }

        for path in [self.config_path(), self.tokenizer_path(), self.weights_path()] {
            if !path.exists() {
                return Err(EmbeddingError::ModelNotFound { path });
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stub_config_needs_no_files() {
        assert!(EmbedderConfig::stub().validate().is_ok());
    }

    #[test]
    fn empty_model_dir_is_rejected() {
        let err = EmbedderConfig::default().validate().unwrap_err();
        assert!(matches!(err, EmbeddingError::InvalidConfig { .. }));
    }

    #[test]
    fn missing_model_files_are_reported() {
        let dir = tempfile::tempdir().unwrap();
        let err = EmbedderConfig::new(dir.path()).validate().unwrap_err();
        match err {
            EmbeddingError::ModelNotFound { path } => {
                assert_eq!(path, dir.path().join("config.json"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
