//! Sentence embeddings for the semantic component.
//!
//! The model is loaded once and shared read-only across pair computations.
//! Use [`EmbedderConfig::stub`] for tests and dry runs without model files.

pub mod config;
mod error;

pub use config::EmbedderConfig;
pub use error::EmbeddingError;

use std::collections::HashMap;
use std::sync::Arc;

use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::bert::{BertModel, Config as BertConfig};
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use config::STUB_EMBEDDING_DIM;

enum EmbedderBackend {
    Model {
        model: Arc<BertModel>,
        tokenizer: Arc<tokenizers::Tokenizer>,
        device: Device,
        hidden_size: usize,
    },
    Stub,
}

/// Mean-pooled BERT sentence encoder with a per-text memo.
pub struct SentenceEmbedder {
    backend: EmbedderBackend,
    config: EmbedderConfig,
    memo: Mutex<HashMap<String, Arc<Vec<f32>>>>,
}

impl std::fmt::Debug for SentenceEmbedder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SentenceEmbedder")
            .field(
                "backend",
                &match &self.backend {
                    EmbedderBackend::Model { device, .. } => format!("Model({device:?})"),
                    EmbedderBackend::Stub => "Stub".to_string(),
                },
            )
            .field("max_seq_len", &self.config.max_seq_len)
            .finish()
    }
}

impl SentenceEmbedder {
    pub fn load(config: EmbedderConfig) -> Result<Self, EmbeddingError> {
        config.validate()?;

        if config.testing_stub {
            warn!("sentence embedder running in STUB mode, semantic scores are not meaningful");
            return Ok(Self {
                backend: EmbedderBackend::Stub,
                config,
                memo: Mutex::new(HashMap::new()),
            });
        }

        let device = Device::Cpu;
        let (model, tokenizer, hidden_size) = Self::load_model(&config, &device)?;

        info!(
            model_dir = %config.model_dir.display(),
            hidden_size,
            max_seq_len = config.max_seq_len,
            "sentence embedding model loaded"
        );

        Ok(Self {
            backend: EmbedderBackend::Model {
                model: Arc::new(model),
                tokenizer: Arc::new(tokenizer),
                device,
                hidden_size,
            },
            config,
            memo: Mutex::new(HashMap::new()),
        })
    }

    fn load_model(
        config: &EmbedderConfig,
        device: &Device,
    ) -> Result<(BertModel, tokenizers::Tokenizer, usize), EmbeddingError> {
        let mut tokenizer = tokenizers::Tokenizer::from_file(config.tokenizer_path()).map_err(|e| {
            EmbeddingError::TokenizationFailed {
                reason: format!("failed to load tokenizer: {e}"),
            }
        })?;
        limit_sequence_length(&mut tokenizer, config.max_seq_len)?;

        let raw_config = std::fs::read_to_string(config.config_path())?;
        let bert_config: BertConfig =
            serde_json::from_str(&raw_config).map_err(|e| EmbeddingError::ModelLoadFailed {
                reason: format!("failed to parse model config: {e}"),
            })?;

        // SAFETY: the weights file is opened read-only and is not modified while mapped.
        let vb = unsafe {
            VarBuilder::from_mmaped_safetensors(&[config.weights_path()], DType::F32, device)
        }
        .map_err(|e| EmbeddingError::ModelLoadFailed {
            reason: format!("failed to map weights: {e}"),
        })?;

        let model = if vb.contains_tensor("bert.embeddings.word_embeddings.weight") {
            BertModel::load(vb.pp("bert"), &bert_config)
        } else {
            BertModel::load(vb, &bert_config)
        }
        .map_err(|e| EmbeddingError::ModelLoadFailed {
            reason: format!("failed to build BERT model: {e}"),
        })?;

        Ok((model, tokenizer, bert_config.hidden_size))
    }

    /// Embeds one text. Identical texts are encoded once per embedder.
    pub fn embed(&self, text: &str) -> Result<Arc<Vec<f32>>, EmbeddingError> {
        if let Some(hit) = self.memo.lock().get(text) {
            return Ok(Arc::clone(hit));
        }

        let vector = Arc::new(match &self.backend {
            EmbedderBackend::Model {
                model,
                tokenizer,
                device,
                hidden_size,
            } => self.embed_with_model(text, model, tokenizer, device, *hidden_size)?,
            EmbedderBackend::Stub => embed_stub(text),
        });

        self.memo
            .lock()
            .insert(text.to_string(), Arc::clone(&vector));
        Ok(vector)
    }

    fn embed_with_model(
        &self,
        text: &str,
        model: &BertModel,
        tokenizer: &tokenizers::Tokenizer,
        device: &Device,
        hidden_size: usize,
    ) -> Result<Vec<f32>, EmbeddingError> {
        let encoding =
            tokenizer
                .encode(text, true)
                .map_err(|e| EmbeddingError::TokenizationFailed {
                    reason: e.to_string(),
                })?;

        let tokens = encoding.get_ids();
        let mask = encoding.get_attention_mask();
        if tokens.is_empty() {
            return Ok(vec![0.0; hidden_size]);
        }

        debug!(
            text_len = text.len(),
            token_count = tokens.len(),
            "encoding text"
        );

        let input_ids = Tensor::new(tokens, device)?.unsqueeze(0)?;
        let token_type_ids = input_ids.zeros_like()?;
        let attention_mask = Tensor::new(mask, device)?.unsqueeze(0)?;

        // [1, seq_len, hidden]
        let hidden = model.forward(&input_ids, &token_type_ids, Some(&attention_mask))?;

        let weights = attention_mask.to_dtype(DType::F32)?.unsqueeze(2)?;
        let summed = hidden.broadcast_mul(&weights)?.sum(1)?;
        let counts = weights.sum(1)?;
        let pooled = summed
            .broadcast_div(&counts)?
            .squeeze(0)?
            .to_vec1::<f32>()?;

        Ok(l2_normalize(pooled))
    }

    pub fn is_stub(&self) -> bool {
        matches!(self.backend, EmbedderBackend::Stub)
    }
}

/// Truncates encodings inside the tokenizer so special tokens such as the
/// trailing `[SEP]` survive at `max_len`.
fn limit_sequence_length(tokenizer: &mut tokenizers::Tokenizer, max_len: usize) -> Result<(), EmbeddingError> {
    let truncation = tokenizers::TruncationParams {
        max_length: max_len,
        ..Default::default()
    };
    tokenizer
        .with_truncation(Some(truncation))
        .map_err(|e| EmbeddingError::InvalidConfig {
            reason: format!("failed to configure truncation: {e}"),
        })?;
    Ok(())
}

fn embed_stub(text: &str) -> Vec<f32> {
    use std::hash::{DefaultHasher, Hash, Hasher};

    let mut hasher = DefaultHasher::new();
    text.hash(&mut hasher);
    let mut state = hasher.finish();

    let mut embedding = Vec::with_capacity(STUB_EMBEDDING_DIM);
    for _ in 0..STUB_EMBEDDING_DIM {
        state = state.wrapping_mul(6364136223846793005).wrapping_add(1);
        let value = ((state >> 32) as f32 / u32::MAX as f32) * 2.0 - 1.0;
        embedding.push(value);
    }

    l2_normalize(embedding)
}

fn l2_normalize(mut embedding: Vec<f32>) -> Vec<f32> {
    let norm: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for x in &mut embedding {
            *x /= norm;
        }
    }
    embedding
}

/// Cosine similarity in `[-1, 1]`; zero when either vector has no magnitude.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    let (mut dot, mut norm_a, mut norm_b) = (0.0f64, 0.0f64, 0.0f64);
    for (x, y) in a.iter().zip(b) {
        let (x, y) = (f64::from(*x), f64::from(*y));
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    (dot / (norm_a.sqrt() * norm_b.sqrt())).clamp(-1.0, 1.0)
}
