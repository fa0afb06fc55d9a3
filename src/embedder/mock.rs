//! Deterministic hash-based embedder for tests and model-less operation.
use std::hash::{DefaultHasher, Hash, Hasher};

use super::{Embedder, EmbedderError, l2_normalize};

/// Embedder producing deterministic unit vectors derived from a text hash.
///
/// Similar texts do NOT get similar vectors; only identity is preserved.
/// Sufficient for exercising the pipeline without downloading a model.
pub struct MockEmbedder {
    dimensions: usize,
}

impl MockEmbedder {
    #[must_use]
    pub fn new(dimensions: usize) -> Self {
        Self { dimensions }
    }
}

impl Default for MockEmbedder {
    fn default() -> Self {
        Self { dimensions: 384 }
    }
}

/// xorshift64 step, seeded per text.
fn next_state(state: u64) -> u64 {
    let mut x = state;
    x ^= x << 13;
    x ^= x >> 7;
    x ^= x << 17;
    x
}

impl Embedder for MockEmbedder {
    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbedderError> {
        let mut hasher = DefaultHasher::new();
        text.hash(&mut hasher);
        // Zero seed would make xorshift degenerate
        let mut state = hasher.finish() | 1;

        let mut embedding = Vec::with_capacity(self.dimensions);
        for _ in 0..self.dimensions {
            state = next_state(state);
            // Map to [-0.5, 0.5] so components carry sign
            embedding.push((state >> 11) as f32 / (1u64 << 53) as f32 - 0.5);
        }

        Ok(l2_normalize(&embedding))
    }

    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbedderError> {
        texts.iter().map(|t| self.embed(t)).collect()
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn model_name(&self) -> &str {
        "mock"
    }
}
