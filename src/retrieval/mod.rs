//! Query-time retrieval: LLM-based query rewriting and multi-query
//! search with merge, dedup, and re-ranking.
pub mod retriever;
pub mod rewriter;

pub use retriever::{Retriever, SearchOptions};
pub use rewriter::QueryRewriter;

use thiserror::Error;

use crate::embedder::EmbedderError;
use crate::store::StoreError;

/// Errors raised during retrieval.
#[derive(Error, Debug)]
pub enum RetrievalError {
    #[error(transparent)]
    Embed(#[from] EmbedderError),

    #[error(transparent)]
    Store(#[from] StoreError),
}
