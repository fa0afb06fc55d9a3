use serde::{Deserialize, Serialize};

/// A contiguous slice of document text, produced by the chunker.
///
/// Immutable once created. `chunk_index`/`total_chunks` identify the
/// chunk's position within its source document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    pub content: String,
    pub source: String,
    pub chunk_index: usize,
    pub total_chunks: usize,
}

/// A chunk paired with its similarity score from a vector search.
///
/// Transient: produced during retrieval, never persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredChunk {
    #[serde(flatten)]
    pub chunk: Chunk,
    pub score: f32,
}

/// Summary statistics for a vector store.
#[derive(Debug, Clone, Serialize)]
pub struct StoreStats {
    pub num_vectors: usize,
    pub embedding_dim: usize,
    pub num_sources: usize,
}
