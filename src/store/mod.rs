//! Vector store backed by SQLite and sqlite-vec.
//!
//! Holds an append-only, ordered collection of (embedding, chunk) pairs.
//! A store is built in memory via [`VectorStore::add_vectors`], persisted
//! with [`VectorStore::save`], and reopened with [`VectorStore::load`].
//! Deletions are not supported; insertion positions are stable.
use rusqlite::Connection;
use sqlite_vec::sqlite3_vec_init;
use std::path::Path;
use std::sync::Once;
use std::time::Duration;
use thiserror::Error;
use tracing::info;

pub mod chunks;
pub mod models;
pub mod search;

pub use models::{Chunk, ScoredChunk, StoreStats};

/// Errors raised by vector store operations.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("store file not found: {0}")]
    NotFound(String),

    #[error("chunks and embeddings length mismatch: {chunks} chunks, {embeddings} embeddings")]
    LengthMismatch { chunks: usize, embeddings: usize },

    #[error("embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("not a valid vector store: {0}")]
    InvalidFormat(String),

    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),
}

fn schema_sql(dim: usize) -> String {
    format!(
        r#"
CREATE TABLE IF NOT EXISTS store_meta (
    id INTEGER PRIMARY KEY CHECK (id = 1),
    embedding_dim INTEGER NOT NULL,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS chunks (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    source TEXT NOT NULL,
    chunk_index INTEGER NOT NULL,
    total_chunks INTEGER NOT NULL,
    content TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_chunk_source ON chunks(source);

CREATE VIRTUAL TABLE IF NOT EXISTS vec_chunks USING vec0(
    embedding FLOAT[{dim}]
);
"#
    )
}

static INIT_VEC: Once = Once::new();

/// Register the sqlite-vec extension. Safe to call multiple times.
fn init_sqlite_vec() {
    INIT_VEC.call_once(|| unsafe {
        rusqlite::ffi::sqlite3_auto_extension(Some(std::mem::transmute(
            sqlite3_vec_init as *const (),
        )));
    });
}

/// An ordered collection of (embedding, chunk) pairs with cosine search.
#[derive(Debug)]
pub struct VectorStore {
    pub(crate) conn: Connection,
    dim: usize,
}

impl VectorStore {
    /// Create an empty in-memory store for the given embedding dimension.
    pub fn new(dim: usize) -> Result<Self, StoreError> {
        init_sqlite_vec();
        let conn = Connection::open_in_memory()?;

        let vec_version: String = conn.query_row("SELECT vec_version()", [], |row| row.get(0))?;
        info!("sqlite-vec version: {vec_version}");

        conn.execute_batch(&schema_sql(dim))?;
        conn.execute(
            "INSERT OR IGNORE INTO store_meta (id, embedding_dim, created_at) VALUES (1, ?, ?)",
            rusqlite::params![dim as i64, chrono::Utc::now().to_rfc3339()],
        )?;

        Ok(Self { conn, dim })
    }

    /// Reopen a store previously written by [`VectorStore::save`].
    ///
    /// Fails with [`StoreError::NotFound`] when `path` does not exist and
    /// [`StoreError::InvalidFormat`] when the file lacks the store schema.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(StoreError::NotFound(path.display().to_string()));
        }

        init_sqlite_vec();
        let conn = Connection::open(path)?;

        let has_meta: usize = conn.query_row(
            "SELECT count(*) FROM sqlite_master WHERE type = 'table' AND name = 'store_meta'",
            [],
            |row| row.get(0),
        )?;
        if has_meta == 0 {
            return Err(StoreError::InvalidFormat(path.display().to_string()));
        }

        let dim: usize = conn.query_row(
            "SELECT embedding_dim FROM store_meta WHERE id = 1",
            [],
            |row| row.get::<_, i64>(0).map(|v| v as usize),
        )?;

        info!("Loaded vector store from {} (dim {dim})", path.display());

        Ok(Self { conn, dim })
    }

    /// Persist the full store (vectors + chunk metadata) to `path`.
    ///
    /// An existing file at `path` is replaced.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), StoreError> {
        let path = path.as_ref();
        let mut dst = Connection::open(path)?;

        {
            let backup = rusqlite::backup::Backup::new(&self.conn, &mut dst)?;
            backup.run_to_completion(64, Duration::from_millis(0), None)?;
        }

        info!("Saved vector store to {}", path.display());
        Ok(())
    }

    /// The embedding dimension this store was created with.
    #[must_use]
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Number of stored (embedding, chunk) pairs.
    pub fn len(&self) -> Result<usize, StoreError> {
        let count: i64 = self
            .conn
            .query_row("SELECT count(*) FROM chunks", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    pub fn is_empty(&self) -> Result<bool, StoreError> {
        Ok(self.len()? == 0)
    }
}

/// Serialize a float32 vector into bytes for the vec0 virtual table.
pub(crate) fn serialize_vector(vec: &[f32]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(vec.len() * 4);
    for v in vec {
        bytes.extend_from_slice(&v.to_le_bytes());
    }
    bytes
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_store_empty() {
        let store = VectorStore::new(384).unwrap();
        assert_eq!(store.dim(), 384);
        assert_eq!(store.len().unwrap(), 0);
        assert!(store.is_empty().unwrap());
    }

    #[test]
    fn test_schema_tables_exist() {
        let store = VectorStore::new(8).unwrap();
        let tables: usize = store
            .conn
            .query_row(
                "SELECT count(*) FROM sqlite_master WHERE type='table' AND name IN ('store_meta', 'chunks', 'vec_chunks')",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(tables, 3);
    }

    #[test]
    fn test_serialize_vector() {
        let vec = vec![1.0, 2.0, -3.5];
        let bytes = serialize_vector(&vec);
        assert_eq!(bytes.len(), 12);

        // 1.0f32 -> little endian 00 00 80 3f
        assert_eq!(&bytes[0..4], &[0x00, 0x00, 0x80, 0x3f]);
        assert_eq!(&bytes[4..8], &[0x00, 0x00, 0x00, 0x40]);
        assert_eq!(&bytes[8..12], &[0x00, 0x00, 0x60, 0xc0]);
    }

    #[test]
    fn test_load_missing_path() {
        let err = VectorStore::load("/nonexistent/store.db").unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[test]
    fn test_load_rejects_foreign_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("not_a_store.db");

        // A valid SQLite file without the store schema
        let conn = Connection::open(&path).unwrap();
        conn.execute_batch("CREATE TABLE misc (x INTEGER);").unwrap();
        drop(conn);

        let err = VectorStore::load(&path).unwrap_err();
        assert!(matches!(err, StoreError::InvalidFormat(_)));
    }

    #[test]
    fn test_save_load_round_trip_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.db");

        let store = VectorStore::new(16).unwrap();
        store.save(&path).unwrap();

        let reloaded = VectorStore::load(&path).unwrap();
        assert_eq!(reloaded.dim(), 16);
        assert_eq!(reloaded.len().unwrap(), 0);
    }
}
