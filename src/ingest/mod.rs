//! Build-time ingestion: document loading, chunking, and the offline
//! pipeline that fills the vector store.
pub mod chunker;
pub mod loader;
pub mod pipeline;

use thiserror::Error;

/// Errors raised while loading documents.
#[derive(Error, Debug)]
pub enum IngestError {
    #[error("file not found: {0}")]
    NotFound(String),

    #[error("unsupported file format: {0} (supported: .pdf, .docx)")]
    UnsupportedFormat(String),

    #[error("failed to parse {path}: {reason}")]
    Parse { path: String, reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
