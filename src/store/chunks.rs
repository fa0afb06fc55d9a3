use super::{Chunk, StoreError, StoreStats, VectorStore, serialize_vector};
use rusqlite::params;

impl VectorStore {
    /// Append (embedding, chunk) pairs to the store.
    ///
    /// Inputs must be equal-length and every embedding must match the
    /// store's dimension; both are checked before anything is written.
    pub fn add_vectors(
        &mut self,
        embeddings: &[Vec<f32>],
        chunks: &[Chunk],
    ) -> Result<(), StoreError> {
        if chunks.len() != embeddings.len() {
            return Err(StoreError::LengthMismatch {
                chunks: chunks.len(),
                embeddings: embeddings.len(),
            });
        }
        for embedding in embeddings {
            if embedding.len() != self.dim() {
                return Err(StoreError::DimensionMismatch {
                    expected: self.dim(),
                    actual: embedding.len(),
                });
            }
        }

        let tx = self.conn.transaction()?;

        for (chunk, embedding) in chunks.iter().zip(embeddings) {
            tx.execute(
                "INSERT INTO chunks (source, chunk_index, total_chunks, content) VALUES (?, ?, ?, ?)",
                params![
                    chunk.source,
                    chunk.chunk_index as i64,
                    chunk.total_chunks as i64,
                    chunk.content
                ],
            )?;
            let row_id = tx.last_insert_rowid();

            tx.execute(
                "INSERT INTO vec_chunks (rowid, embedding) VALUES (?, ?)",
                params![row_id, serialize_vector(embedding)],
            )?;
        }

        tx.commit()?;
        Ok(())
    }

    /// Store statistics for `/stats` and the ingest summary.
    pub fn stats(&self) -> Result<StoreStats, StoreError> {
        let num_sources: i64 = self.conn.query_row(
            "SELECT count(DISTINCT source) FROM chunks",
            [],
            |row| row.get(0),
        )?;

        Ok(StoreStats {
            num_vectors: self.len()?,
            embedding_dim: self.dim(),
            num_sources: num_sources as usize,
        })
    }

    /// Distinct source file names, in first-inserted order.
    pub fn sources(&self) -> Result<Vec<String>, StoreError> {
        let mut stmt = self
            .conn
            .prepare("SELECT source FROM chunks GROUP BY source ORDER BY min(id)")?;
        let rows = stmt.query_map([], |row| row.get(0))?;

        let mut sources = Vec::new();
        for row in rows {
            sources.push(row?);
        }
        Ok(sources)
    }
}
