//! Pooling strategies for collapsing token embeddings into one sentence
//! vector.

use candle_core::Tensor;
use serde::{Deserialize, Serialize};

/// How token-level model output becomes a single sentence embedding.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default)]
pub enum PoolingStrategy {
    /// Attention-mask-weighted mean over tokens. What MiniLM sentence
    /// models were trained with.
    #[default]
    Mean,

    /// First ([CLS]) token only.
    Cls,

    /// Per-dimension max over non-padding tokens.
    Max,
}

impl PoolingStrategy {
    /// Apply pooling.
    ///
    /// `hidden` has shape (batch, seq_len, dim), `attention_mask`
    /// (batch, seq_len); the result is (batch, dim).
    pub fn apply(&self, hidden: &Tensor, attention_mask: &Tensor) -> candle_core::Result<Tensor> {
        match self {
            PoolingStrategy::Mean => masked_mean(hidden, attention_mask),
            PoolingStrategy::Cls => first_token(hidden),
            PoolingStrategy::Max => masked_max(hidden, attention_mask),
        }
    }
}

fn masked_mean(hidden: &Tensor, attention_mask: &Tensor) -> candle_core::Result<Tensor> {
    let mask = attention_mask.unsqueeze(2)?.expand(hidden.shape())?;
    let summed = (hidden * &mask)?.sum(1)?;
    // Clamp the token count so fully-masked rows do not divide by zero
    let counts = attention_mask.unsqueeze(2)?.sum(1)?.clamp(1e-9f32, f32::MAX)?;
    summed.broadcast_div(&counts)
}

fn first_token(hidden: &Tensor) -> candle_core::Result<Tensor> {
    hidden.narrow(1, 0, 1)?.squeeze(1)
}

fn masked_max(hidden: &Tensor, attention_mask: &Tensor) -> candle_core::Result<Tensor> {
    // Push padding positions to a large negative value so they never win
    let mask = attention_mask.unsqueeze(2)?.expand(hidden.shape())?;
    let offset = (&mask - 1.0)?;
    let floor = Tensor::new(-1e9f32, hidden.device())?;
    let masked = hidden.broadcast_add(&offset.broadcast_mul(&floor)?)?;
    masked.max(1)
}

/// L2-normalize a (batch, dim) tensor row-wise.
pub fn l2_normalize(embeddings: &Tensor) -> candle_core::Result<Tensor> {
    let norms = embeddings.sqr()?.sum_keepdim(1)?.sqrt()?.clamp(1e-9f32, f32::MAX)?;
    embeddings.broadcast_div(&norms)
}
