//! MiniLM sentence embedder (BERT encoder + mean pooling).
//!
//! Use [`MiniLmConfig::stub`] for tests and deployments without model files.

/// MiniLM configuration.
pub mod config;


pub use config::{MINILM_EMBEDDING_DIM, MINILM_MAX_SEQ_LEN, MiniLmConfig};

use std::sync::Arc;

use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::bert::{BertModel, Config as BertConfig};
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use super::TitleEmbedder;
use crate::embedding::device::select_device;
use crate::embedding::error::EmbeddingError;
use crate::embedding::utils::load_tokenizer;

/// Directions each stub token adds to.
const STUB_TOUCHES_PER_TOKEN: usize = 4;

enum EmbedderBackend {
    Model {
        model: Arc<Mutex<BertModel>>,
        tokenizer: Arc<tokenizers::Tokenizer>,
        device: Device,
        hidden_size: usize,
    },
    Stub,
}

/// Sentence embedder for titles (supports stub mode).
pub struct MiniLmEmbedder {
    backend: EmbedderBackend,
    config: MiniLmConfig,
}

impl std::fmt::Debug for MiniLmEmbedder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MiniLmEmbedder")
            .field(
                "backend",
                &match &self.backend {
                    EmbedderBackend::Model { device, .. } => format!("Model({:?})", device),
                    EmbedderBackend::Stub => "Stub".to_string(),
                },
            )
            .field("embedding_dim", &self.embedding_dim())
            .field("max_seq_len", &self.config.max_seq_len)
            .finish()
    }
}

impl MiniLmEmbedder {
    /// Loads the embedder from a config (stub mode is supported).
    pub fn load(config: MiniLmConfig) -> Result<Self, EmbeddingError> {
        config.validate()?;

        if config.testing_stub {
            warn!(
                embedding_dim = config.embedding_dim,
                "MiniLM running in STUB mode (hashed bag-of-words)"
            );
            return Ok(Self {
                backend: EmbedderBackend::Stub,
                config,
            });
        }

        let device = select_device();
        let (model, tokenizer, hidden_size) = Self::load_model(&config, &device)?;

        info!(
            model_dir = %config.model_dir.display(),
            hidden_size,
            max_seq_len = config.max_seq_len,
            "MiniLM model loaded"
        );

        Ok(Self {
            backend: EmbedderBackend::Model {
                model: Arc::new(Mutex::new(model)),
                tokenizer: Arc::new(tokenizer),
                device,
                hidden_size,
            },
            config,
        })
    }

    fn load_model(
        config: &MiniLmConfig,
        device: &Device,
    ) -> Result<(BertModel, tokenizers::Tokenizer, usize), EmbeddingError> {
        let tokenizer = load_tokenizer(&config.model_dir, config.max_seq_len).map_err(|e| {
            EmbeddingError::TokenizationFailed {
                reason: format!("Failed to load tokenizer: {}", e),
            }
        })?;

        let config_content = std::fs::read_to_string(config.config_path())?;
        let bert_config: BertConfig =
            serde_json::from_str(&config_content).map_err(|e| EmbeddingError::ModelLoadFailed {
                reason: format!("Failed to parse config.json: {}", e),
            })?;

        // SAFETY: the weights file is opened read-only and not modified while mapped.
        let vb = unsafe {
            VarBuilder::from_mmaped_safetensors(&[config.weights_path()], DType::F32, device)?
        };

        // sentence-transformers exports either bare or `bert.`-prefixed tensors.
        let model = if vb.contains_tensor("bert.embeddings.word_embeddings.weight") {
            BertModel::load(vb.pp("bert"), &bert_config)
        } else {
            BertModel::load(vb, &bert_config)
        }
        .map_err(|e| EmbeddingError::ModelLoadFailed {
            reason: format!("Failed to load BERT weights: {}", e),
        })?;

        Ok((model, tokenizer, bert_config.hidden_size))
    }

    /// Generates a unit-length embedding for a single title.
    pub fn embed_one(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        match &self.backend {
            EmbedderBackend::Model {
                model,
                tokenizer,
                device,
                hidden_size,
            } => self.embed_with_model(text, model, tokenizer, device, *hidden_size),
            EmbedderBackend::Stub => Ok(self.embed_stub(text)),
        }
    }

    fn embed_with_model(
        &self,
        text: &str,
        model: &Mutex<BertModel>,
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

        let ids = encoding.get_ids();
        if ids.is_empty() {
            return Ok(vec![0.0; hidden_size]);
        }

        debug!(
            text_len = text.len(),
            token_count = ids.len(),
            "Embedding title (BERT forward pass)"
        );

        // [1, seq_len]
        let input_ids = Tensor::new(ids, device)?.unsqueeze(0)?;
        let token_type_ids = input_ids.zeros_like()?;
        let attention_mask = input_ids.ones_like()?;

        // [1, seq_len, hidden] -> mean over tokens -> [hidden]
        let hidden = model
            .lock()
            .forward(&input_ids, &token_type_ids, Some(&attention_mask))
            .map_err(|e| EmbeddingError::InferenceFailed {
                reason: format!("BERT forward pass failed: {}", e),
            })?;
        let pooled = hidden.mean(1)?.squeeze(0)?.to_vec1::<f32>()?;

        Ok(l2_normalize(pooled))
    }

    /// Hashed bag-of-words: titles sharing words share directions, so the
    /// similarity tier and clustering behave sensibly without a model.
    fn embed_stub(&self, text: &str) -> Vec<f32> {
        let dim = self.config.embedding_dim;
        let mut embedding = vec![0.0f32; dim];
        let mut tokens = 0usize;

        for token in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
        {
            tokens += 1;
            let digest = blake3::hash(token.to_lowercase().as_bytes());
            let bytes = digest.as_bytes();
            for k in 0..STUB_TOUCHES_PER_TOKEN {
                let mut idx_bytes = [0u8; 4];
                idx_bytes.copy_from_slice(&bytes[k * 4..k * 4 + 4]);
                let idx = u32::from_le_bytes(idx_bytes) as usize % dim;
                let sign = if bytes[16 + k] & 1 == 0 { 1.0 } else { -1.0 };
                embedding[idx] += sign;
            }
        }

        if tokens == 0 || embedding.iter().all(|x| *x == 0.0) {
            let digest = blake3::hash(text.as_bytes());
            let mut seed_bytes = [0u8; 8];
            seed_bytes.copy_from_slice(&digest.as_bytes()[..8]);
            let mut state = u64::from_le_bytes(seed_bytes);
            for value in embedding.iter_mut() {
                state = state.wrapping_mul(6364136223846793005).wrapping_add(1);
                *value = ((state >> 32) as f32 / u32::MAX as f32) * 2.0 - 1.0;
            }
        }

        l2_normalize(embedding)
    }

    /// Returns `true` if running in stub mode.
    pub fn is_stub(&self) -> bool {
        matches!(self.backend, EmbedderBackend::Stub)
    }

    /// Returns the embedder configuration.
    pub fn config(&self) -> &MiniLmConfig {
        &self.config
    }
}

impl TitleEmbedder for MiniLmEmbedder {
    fn embed_batch(&self, titles: &[&str]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        // Sequential; padding-aware batching is not worth it at title lengths.
        titles.iter().map(|title| self.embed_one(title)).collect()
    }

    fn embedding_dim(&self) -> usize {
        match &self.backend {
            EmbedderBackend::Model { hidden_size, .. } => *hidden_size,
            EmbedderBackend::Stub => self.config.embedding_dim,
        }
    }
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
