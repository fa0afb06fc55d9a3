//! Request and response DTOs for the HTTP API.
use serde::{Deserialize, Serialize};

use crate::api::ApiError;
use crate::store::ScoredChunk;

fn default_k() -> usize {
    3
}

fn default_num_variations() -> usize {
    2
}

/// Body of `POST /query`.
#[derive(Debug, Deserialize)]
pub struct QueryRequest {
    pub query: String,

    #[serde(default = "default_k")]
    pub k: usize,

    #[serde(default = "default_num_variations")]
    pub num_variations: usize,

    #[serde(default)]
    pub min_score: f32,
}

impl QueryRequest {
    /// Range checks mirrored from the documented API contract.
    pub fn validate(&self) -> Result<(), ApiError> {
        if self.query.trim().is_empty() {
            return Err(ApiError::Validation("query must not be empty".into()));
        }
        if !(1..=10).contains(&self.k) {
            return Err(ApiError::Validation("k must be in 1..=10".into()));
        }
        if self.num_variations > 5 {
            return Err(ApiError::Validation(
                "num_variations must be at most 5".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.min_score) {
            return Err(ApiError::Validation("min_score must be in [0, 1]".into()));
        }
        Ok(())
    }
}

/// One retrieved chunk in a query response.
#[derive(Debug, Serialize)]
pub struct ChunkResult {
    pub content: String,
    pub score: f32,
    pub source: String,
    pub chunk_index: usize,
    pub total_chunks: usize,
}

impl From<ScoredChunk> for ChunkResult {
    fn from(scored: ScoredChunk) -> Self {
        Self {
            content: scored.chunk.content,
            score: scored.score,
            source: scored.chunk.source,
            chunk_index: scored.chunk.chunk_index,
            total_chunks: scored.chunk.total_chunks,
        }
    }
}

/// Body of a successful `POST /query` response.
#[derive(Debug, Serialize)]
pub struct QueryResponse {
    pub answer: String,
    pub chunks: Vec<ChunkResult>,
    /// Distinct source file names, in rank order.
    pub sources: Vec<String>,
    /// End-to-end time in seconds.
    pub query_time: f64,
    pub num_chunks_retrieved: usize,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub vector_store_loaded: bool,
    pub num_vectors: usize,
    pub llm_ready: bool,
}

#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub num_vectors: usize,
    pub embedding_dim: usize,
    pub num_sources: usize,
    pub embedding_model: String,
    pub llm_model: String,
}
