//! Semantic index: a flat nearest-neighbour structure over sentence
//! embeddings, built exactly once per document and read-only afterwards.
//!
//! Construction failure is a degradation, not an error — the engine falls
//! back to keyword-only matching when no index is available.

use mortarix_common::Sentence;
use mortarix_embed::SentenceEmbedder;
use tracing::{debug, warn};

/// Default number of semantic neighbours returned per query.
pub const DEFAULT_K: usize = 35;

/// One vector per sentence, queried with exhaustive squared-L2 scan.
/// A few thousand sentences per document makes approximation pointless.
pub struct SemanticIndex {
    sentences: Vec<Sentence>,
    vectors: Vec<Vec<f32>>,
    dim: usize,
}

impl SemanticIndex {
    /// Embed every sentence and build the index. Returns `None` when the
    /// embedder fails (model unavailable, inference fault): degraded mode.
    pub async fn build(embedder: &SentenceEmbedder, sentences: &[Sentence]) -> Option<Self> {
        if sentences.is_empty() {
            return None;
        }

        let texts: Vec<String> = sentences.iter().map(|s| s.text.clone()).collect();
        match embedder.embed(&texts).await {
            Ok(vectors) => {
                debug!(sentences = sentences.len(), dim = embedder.dimension(), "semantic index built");
                Some(Self::from_vectors(sentences.to_vec(), vectors))
            }
            Err(e) => {
                warn!("semantic index unavailable, degrading to keyword-only matching: {e}");
                None
            }
        }
    }

    /// Build from precomputed vectors. Vectors must be positionally aligned
    /// with `sentences`; rows with a deviating dimension are never matched.
    pub fn from_vectors(sentences: Vec<Sentence>, vectors: Vec<Vec<f32>>) -> Self {
        let dim = vectors.first().map(|v| v.len()).unwrap_or(0);
        Self { sentences, vectors, dim }
    }

    pub fn len(&self) -> usize {
        self.sentences.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sentences.is_empty()
    }

    pub fn dimension(&self) -> usize {
        self.dim
    }

    /// Top-k neighbours of a query text, ascending by distance.
    pub async fn query(
        &self,
        embedder: &SentenceEmbedder,
        text: &str,
        k: usize,
    ) -> mortarix_embed::Result<Vec<(Sentence, f32)>> {
        let query = embedder.embed_one(text).await?;
        Ok(self.query_vec(&query, k))
    }

    /// Top-k neighbours of a query vector, ascending by distance.
    pub fn query_vec(&self, query: &[f32], k: usize) -> Vec<(Sentence, f32)> {
        nearest(&self.vectors, query, k)
            .into_iter()
            .map(|(i, dist)| (self.sentences[i].clone(), dist))
            .collect()
    }
}

/// Exhaustive squared-L2 scan. Ties break on the lower row index so results
/// are stable across runs for fixed inputs.
pub fn nearest(vectors: &[Vec<f32>], query: &[f32], k: usize) -> Vec<(usize, f32)> {
    let mut scored: Vec<(usize, f32)> = vectors
        .iter()
        .enumerate()
        .filter(|(_, v)| v.len() == query.len())
        .map(|(i, v)| (i, squared_l2(v, query)))
        .collect();

    scored.sort_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)));
    scored.truncate(k);
    scored
}

fn squared_l2(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b.iter()).map(|(x, y)| (x - y) * (x - y)).sum()
}
