//! MiniLM sentence embedder using Candle.

use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::Instant;

use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::bert::{BertModel, Config, HiddenAct, PositionEmbeddingType};
use hf_hub::api::sync::Api;
use lru::LruCache;
use tokenizers::Tokenizer;
use tracing::{debug, info};

use crate::pooling::l2_normalize;
use crate::{EmbedError, EmbeddingConfig, Result};

/// Sentence embedder for specification text.
///
/// Downloads the model from Hugging Face Hub on first use and provides
/// batched inference for generating embeddings.
pub struct SentenceEmbedder {
    model: BertModel,
    tokenizer: Tokenizer,
    device: Device,
    config: EmbeddingConfig,
    dim: usize,
    cache: Option<Arc<std::sync::Mutex<LruCache<String, Vec<f32>>>>>,
}

impl SentenceEmbedder {
    /// Load the configured model and tokenizer.
    pub async fn new(config: EmbeddingConfig) -> Result<Self> {
        let start = Instant::now();
        info!("Loading sentence model: {}", config.model_id);

        let device = Self::select_device(&config);
        debug!("Using device: {:?}", device);

        // Hub downloads use the blocking API; keep them off the runtime.
        let model_id = config.model_id.clone();
        let (bert_config, tokenizer, weights_path) = tokio::task::spawn_blocking(move || {
            use hf_hub::{Repo, RepoType};

            let api = Api::new().map_err(|e| EmbedError::Download(format!("API init: {e}")))?;
            let repo = api.repo(Repo::new(model_id, RepoType::Model));

            let config_path = repo
                .get("config.json")
                .map_err(|e| EmbedError::Download(format!("config.json: {e}")))?;
            let bert_config = Self::load_config(&config_path)?;

            let tokenizer_path = repo
                .get("tokenizer.json")
                .map_err(|e| EmbedError::Download(format!("tokenizer.json: {e}")))?;
            let tokenizer = Tokenizer::from_file(&tokenizer_path)
                .map_err(|e| EmbedError::Tokenizer(e.to_string()))?;

            let weights_path = repo
                .get("model.safetensors")
                .or_else(|_| repo.get("pytorch_model.bin"))
                .map_err(|e| EmbedError::Download(format!("model weights: {e}")))?;

            Ok::<_, EmbedError>((bert_config, tokenizer, weights_path))
        })
        .await
        .map_err(|e| EmbedError::Download(e.to_string()))??;

        let vb = if weights_path.extension().map(|e| e == "safetensors").unwrap_or(false) {
            unsafe { VarBuilder::from_mmaped_safetensors(&[&weights_path], DType::F32, &device)? }
        } else {
            VarBuilder::from_pth(&weights_path, DType::F32, &device)?
        };

        let dim = bert_config.hidden_size;
        let model = BertModel::load(vb, &bert_config)?;
        info!("Model loaded in {:.2}s ({dim}-dim)", start.elapsed().as_secs_f32());

        let cache = if config.cache_size > 0 {
            NonZeroUsize::new(config.cache_size)
                .map(|n| Arc::new(std::sync::Mutex::new(LruCache::new(n))))
        } else {
            None
        };

        Ok(Self { model, tokenizer, device, config, dim, cache })
    }

    fn select_device(config: &EmbeddingConfig) -> Device {
        if !config.use_gpu {
            return Device::Cpu;
        }

        #[cfg(feature = "cuda")]
        {
            match Device::new_cuda(0) {
                Ok(device) => {
                    info!("CUDA device available");
                    return device;
                }
                Err(e) => debug!("CUDA not available: {e}, falling back to CPU"),
            }
        }

        #[cfg(feature = "metal")]
        {
            match Device::new_metal(0) {
                Ok(device) => {
                    info!("Metal device available");
                    return device;
                }
                Err(e) => debug!("Metal not available: {e}, falling back to CPU"),
            }
        }

        Device::Cpu
    }

    /// Load the BERT config, tolerating missing fields (MiniLM defaults).
    fn load_config(path: &std::path::Path) -> Result<Config> {
        let content = std::fs::read_to_string(path)?;
        let json: serde_json::Value = serde_json::from_str(&content)?;

        let hidden_act = match json.get("hidden_act").and_then(|v| v.as_str()) {
            Some("relu") => HiddenAct::Relu,
            Some("gelu_new") | Some("gelu_approximate") => HiddenAct::GeluApproximate,
            _ => HiddenAct::Gelu,
        };

        Ok(Config {
            vocab_size: json.get("vocab_size").and_then(|v| v.as_u64()).unwrap_or(30522) as usize,
            hidden_size: json.get("hidden_size").and_then(|v| v.as_u64()).unwrap_or(384) as usize,
            num_hidden_layers: json.get("num_hidden_layers").and_then(|v| v.as_u64()).unwrap_or(6)
                as usize,
            num_attention_heads: json
                .get("num_attention_heads")
                .and_then(|v| v.as_u64())
                .unwrap_or(12) as usize,
            intermediate_size: json
                .get("intermediate_size")
                .and_then(|v| v.as_u64())
                .unwrap_or(1536) as usize,
            hidden_act,
            hidden_dropout_prob: json
                .get("hidden_dropout_prob")
                .and_then(|v| v.as_f64())
                .unwrap_or(0.1),
            max_position_embeddings: json
                .get("max_position_embeddings")
                .and_then(|v| v.as_u64())
                .unwrap_or(512) as usize,
            type_vocab_size: json.get("type_vocab_size").and_then(|v| v.as_u64()).unwrap_or(2)
                as usize,
            initializer_range: json
                .get("initializer_range")
                .and_then(|v| v.as_f64())
                .unwrap_or(0.02),
            layer_norm_eps: json.get("layer_norm_eps").and_then(|v| v.as_f64()).unwrap_or(1e-12),
            pad_token_id: json.get("pad_token_id").and_then(|v| v.as_u64()).unwrap_or(0) as usize,
            position_embedding_type: PositionEmbeddingType::Absolute,
            use_cache: true,
            classifier_dropout: None,
            model_type: None,
        })
    }

    /// Embed a list of texts, preserving input order.
    pub async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let start = Instant::now();
        let mut indexed: Vec<(usize, Vec<f32>)> = Vec::with_capacity(texts.len());
        let mut pending_indices = Vec::new();
        let mut pending_texts = Vec::new();

        if let Some(cache) = &self.cache {
            let mut guard = cache.lock().map_err(|_| {
                EmbedError::Inference("embedding cache poisoned".to_string())
            })?;
            for (i, text) in texts.iter().enumerate() {
                if let Some(hit) = guard.get(text) {
                    indexed.push((i, hit.clone()));
                } else {
                    pending_indices.push(i);
                    pending_texts.push(text.clone());
                }
            }
        } else {
            pending_indices = (0..texts.len()).collect();
            pending_texts = texts.to_vec();
        }

        for batch_start in (0..pending_texts.len()).step_by(self.config.batch_size) {
            let batch_end = (batch_start + self.config.batch_size).min(pending_texts.len());
            let batch = &pending_texts[batch_start..batch_end];

            let vectors = self.embed_batch(batch)?;

            if let Some(cache) = &self.cache {
                let mut guard = cache.lock().map_err(|_| {
                    EmbedError::Inference("embedding cache poisoned".to_string())
                })?;
                for (text, vector) in batch.iter().zip(vectors.iter()) {
                    guard.put(text.clone(), vector.clone());
                }
            }

            for (j, vector) in vectors.into_iter().enumerate() {
                indexed.push((pending_indices[batch_start + j], vector));
            }
        }

        indexed.sort_by_key(|(i, _)| *i);
        let result: Vec<Vec<f32>> = indexed.into_iter().map(|(_, v)| v).collect();

        debug!(
            "Embedded {} texts in {:.2}ms",
            texts.len(),
            start.elapsed().as_secs_f32() * 1000.0
        );

        Ok(result)
    }

    /// Embed one batch synchronously.
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let text_refs: Vec<&str> = texts.iter().map(|s| s.as_str()).collect();
        let encodings = self
            .tokenizer
            .encode_batch(text_refs, true)
            .map_err(|e| EmbedError::Tokenizer(e.to_string()))?;

        let limit = self.config.max_length.min(512);
        let mut input_ids = Vec::with_capacity(texts.len());
        let mut attention_mask = Vec::with_capacity(texts.len());
        let mut token_type_ids = Vec::with_capacity(texts.len());

        for encoding in &encodings {
            let len = encoding.get_ids().len().min(limit);
            input_ids.push(encoding.get_ids()[..len].to_vec());
            attention_mask.push(encoding.get_attention_mask()[..len].to_vec());
            token_type_ids.push(encoding.get_type_ids()[..len].to_vec());
        }

        let max_len = input_ids.iter().map(|v| v.len()).max().unwrap_or(0);
        for ((ids, mask), types) in input_ids
            .iter_mut()
            .zip(attention_mask.iter_mut())
            .zip(token_type_ids.iter_mut())
        {
            let pad = max_len - ids.len();
            ids.extend(std::iter::repeat_n(0, pad));
            mask.extend(std::iter::repeat_n(0, pad));
            types.extend(std::iter::repeat_n(0, pad));
        }

        let batch_size = texts.len();
        let input_ids = Tensor::new(input_ids, &self.device)?.reshape((batch_size, max_len))?;
        // F32 mask so the pooling multiplications broadcast
        let attention_mask = Tensor::new(attention_mask, &self.device)?
            .reshape((batch_size, max_len))?
            .to_dtype(DType::F32)?;
        let token_type_ids =
            Tensor::new(token_type_ids, &self.device)?.reshape((batch_size, max_len))?;

        let hidden = self.model.forward(&input_ids, &token_type_ids, Some(&attention_mask))?;
        let pooled = self.config.pooling.apply(&hidden, &attention_mask)?;

        let output = if self.config.normalize { l2_normalize(&pooled)? } else { pooled };
        Ok(output.to_vec2::<f32>()?)
    }

    /// Embed a single text.
    pub async fn embed_one(&self, text: &str) -> Result<Vec<f32>> {
        let embeddings = self.embed(&[text.to_string()]).await?;
        embeddings
            .into_iter()
            .next()
            .ok_or_else(|| EmbedError::InvalidInput("No embedding produced".to_string()))
    }

    /// Embedding dimension (384 for all-MiniLM-L6-v2).
    pub fn dimension(&self) -> usize {
        self.dim
    }

    /// The loaded model id.
    pub fn model_name(&self) -> &str {
        &self.config.model_id
    }

    /// Whether inference runs on a GPU device.
    pub fn is_gpu(&self) -> bool {
        matches!(self.device, Device::Cuda(_) | Device::Metal(_))
    }

    /// Drop all cached query embeddings.
    pub fn clear_cache(&self) {
        if let Some(cache) = &self.cache {
            if let Ok(mut guard) = cache.lock() {
                guard.clear();
            }
        }
    }
}
