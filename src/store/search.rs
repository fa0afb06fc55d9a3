use super::{Chunk, ScoredChunk, StoreError, VectorStore, serialize_vector};
use rusqlite::params;

/// Map a cosine distance in [0, 2] to a similarity score clipped to [0, 1].
fn distance_to_score(distance: f64) -> f32 {
    let score = 1.0 - distance / 2.0;
    score.clamp(0.0, 1.0) as f32
}

fn map_search_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<ScoredChunk> {
    let distance: f64 = row.get(4)?;

    Ok(ScoredChunk {
        chunk: Chunk {
            source: row.get(0)?,
            chunk_index: row.get::<_, i64>(1)? as usize,
            total_chunks: row.get::<_, i64>(2)? as usize,
            content: row.get(3)?,
        },
        score: distance_to_score(distance),
    })
}

impl VectorStore {
    /// Top-k nearest chunks to `query_vector` by cosine similarity.
    ///
    /// `k` is capped at the store size; an empty store yields no results.
    pub fn search(&self, query_vector: &[f32], k: usize) -> Result<Vec<ScoredChunk>, StoreError> {
        if query_vector.len() != self.dim() {
            return Err(StoreError::DimensionMismatch {
                expected: self.dim(),
                actual: query_vector.len(),
            });
        }

        let mut stmt = self.conn.prepare(
            r#"
            SELECT
                c.source,
                c.chunk_index,
                c.total_chunks,
                c.content,
                vec_distance_cosine(v.embedding, ?) as distance
            FROM vec_chunks v
            JOIN chunks c ON v.rowid = c.id
            ORDER BY distance ASC
            LIMIT ?
            "#,
        )?;

        let rows = stmt.query_map(
            params![serialize_vector(query_vector), k as i64],
            map_search_row,
        )?;

        let mut results = Vec::new();
        for row in rows {
            results.push(row?);
        }

        Ok(results)
    }
}
