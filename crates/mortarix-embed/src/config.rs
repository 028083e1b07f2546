//! Configuration for the embedding service.

use serde::{Deserialize, Serialize};

/// Configuration for the MiniLM sentence embedder.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// Hugging Face model ID
    pub model_id: String,

    /// Maximum sequence length in tokens (default: 256)
    pub max_length: usize,

    /// Batch size for inference (default: 32)
    pub batch_size: usize,

    /// L2-normalize embeddings (default: false — the semantic index
    /// consumes raw vectors under squared-Euclidean distance)
    pub normalize: bool,

    /// Pooling strategy (default: mean)
    pub pooling: super::PoolingStrategy,

    /// Use GPU if available (default: false)
    pub use_gpu: bool,

    /// Maximum cache size for query embeddings (number of entries)
    pub cache_size: usize,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            model_id: "sentence-transformers/all-MiniLM-L6-v2".to_string(),
            max_length: 256,
            batch_size: 32,
            normalize: false,
            pooling: super::PoolingStrategy::Mean,
            use_gpu: false,
            cache_size: 1_000,
        }
    }
}

impl EmbeddingConfig {
    /// Create config for CPU-only inference.
    pub fn cpu() -> Self {
        Self { use_gpu: false, ..Default::default() }
    }

    /// Create config for GPU inference (falls back to CPU when no device
    /// is available).
    pub fn gpu() -> Self {
        Self { use_gpu: true, ..Default::default() }
    }

    /// Use a custom model.
    pub fn with_model(mut self, model_id: impl Into<String>) -> Self {
        self.model_id = model_id.into();
        self
    }

    /// Set batch size.
    pub fn with_batch_size(mut self, size: usize) -> Self {
        self.batch_size = size;
        self
    }

    /// Toggle L2 normalization of the pooled embeddings.
    pub fn with_normalize(mut self, normalize: bool) -> Self {
        self.normalize = normalize;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_targets_minilm() {
        let cfg = EmbeddingConfig::default();
        assert_eq!(cfg.model_id, "sentence-transformers/all-MiniLM-L6-v2");
        assert!(!cfg.normalize);
    }

    #[test]
    fn builder_overrides() {
        let cfg = EmbeddingConfig::cpu()
            .with_model("custom/model")
            .with_batch_size(8)
            .with_normalize(true);
        assert_eq!(cfg.model_id, "custom/model");
        assert_eq!(cfg.batch_size, 8);
        assert!(cfg.normalize);
        assert!(!cfg.use_gpu);
    }
}
