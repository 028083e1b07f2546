//! Mortarix Embedding Service
//!
//! Pure Rust sentence embeddings using Candle (Hugging Face).
//! No Python dependency - direct model loading from Hugging Face Hub.
//!
//! # Features
//! - 384-dim embeddings from sentence-transformers/all-MiniLM-L6-v2
//! - GPU support (CUDA, Metal) with automatic fallback to CPU
//! - Batched inference for throughput
//! - LRU cache for repeated query embeddings
//!
//! # Example
//! ```rust,no_run
//! use mortarix_embed::{SentenceEmbedder, EmbeddingConfig};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let embedder = SentenceEmbedder::new(EmbeddingConfig::default()).await?;
//!
//!     let texts = vec![
//!         "Cement shall be 43 Grade Ordinary Portland.".to_string(),
//!         "Fine Aggregate is used in concrete.".to_string(),
//!     ];
//!
//!     let embeddings = embedder.embed(&texts).await?;
//!     println!("Embedding dimension: {}", embeddings[0].len()); // 384
//!
//!     Ok(())
//! }
//! ```

pub mod embedder;
pub mod config;
pub mod pooling;
pub mod error;

pub use embedder::SentenceEmbedder;
pub use config::EmbeddingConfig;
pub use error::{EmbedError, Result};
pub use pooling::PoolingStrategy;
