//! Text embedding: trait, errors, and implementations.
//!
//! Queries and document chunks are mapped to fixed-dimension vectors
//! (384 dims for the default all-MiniLM-L6-v2 model). The ONNX-backed
//! implementation lives in [`onnx`]; [`mock`] provides a deterministic
//! hash-based embedder for tests and model-less operation.
pub mod download;
pub mod mock;
pub mod onnx;

use thiserror::Error;

/// Errors that can occur during embedding operations.
#[derive(Error, Debug)]
pub enum EmbedderError {
    #[error("inference failed: {0}")]
    InferenceFailed(String),

    #[error("model load failed: {0}")]
    ModelLoadFailed(String),

    #[error("tokenizer error: {0}")]
    TokenizerError(String),
}

/// Trait for text embedding implementations.
///
/// All implementations must be `Send + Sync` to allow concurrent use
/// behind `Arc`.
pub trait Embedder: Send + Sync {
    /// Embed a single text string into a vector.
    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbedderError>;

    /// Embed multiple text strings into vectors.
    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbedderError>;

    /// Return the dimensionality of the embedding vectors.
    fn dimensions(&self) -> usize;

    /// Human-readable model identifier, surfaced in `/stats`.
    fn model_name(&self) -> &str;
}

/// L2-normalize a vector, returning the normalized copy.
pub(crate) fn l2_normalize(vec: &[f32]) -> Vec<f32> {
    let norm_sq: f32 = vec.iter().map(|v| v * v).sum();
    if norm_sq == 0.0 {
        return vec.to_vec();
    }

    let inv_norm = 1.0 / norm_sq.sqrt();
    vec.iter().map(|v| v * inv_norm).collect()
}
