//! Offline ingestion pipeline: load → chunk → embed → store.
use std::path::PathBuf;

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{info, warn};

use crate::embedder::Embedder;
use crate::ingest::{chunker, loader};
use crate::store::VectorStore;

/// Outcome of an ingestion run.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct IngestReport {
    pub documents: usize,
    pub chunks: usize,
    /// Documents that produced no chunks (empty after extraction).
    pub empty: usize,
}

/// One-shot batch pipeline over a set of document paths.
pub struct Pipeline<'a, E: Embedder + ?Sized> {
    embedder: &'a E,
    chunk_size: usize,
    chunk_overlap: usize,
}

impl<'a, E: Embedder + ?Sized> Pipeline<'a, E> {
    pub fn new(embedder: &'a E, chunk_size: usize, chunk_overlap: usize) -> Self {
        Self {
            embedder,
            chunk_size,
            chunk_overlap,
        }
    }

    /// Load, chunk, embed, and store every supported document in `paths`.
    pub fn ingest(&self, paths: &[PathBuf], store: &mut VectorStore) -> Result<IngestReport> {
        let documents = loader::load_documents(paths).context("document loading failed")?;

        let mut report = IngestReport {
            documents: documents.len(),
            ..Default::default()
        };

        let pb = ProgressBar::new(documents.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("  {bar:40.cyan/blue} {pos}/{len} {msg}")
                .expect("valid template"),
        );

        for doc in &documents {
            pb.set_message(doc.source.clone());

            let chunks = chunker::split_document(doc, self.chunk_size, self.chunk_overlap);
            if chunks.is_empty() {
                warn!("{}: no text extracted, skipping", doc.source);
                report.empty += 1;
                pb.inc(1);
                continue;
            }

            let texts: Vec<&str> = chunks.iter().map(|c| c.content.as_str()).collect();
            let embeddings = self
                .embedder
                .embed_batch(&texts)
                .with_context(|| format!("embedding failed for {}", doc.source))?;

            store
                .add_vectors(&embeddings, &chunks)
                .with_context(|| format!("store insert failed for {}", doc.source))?;

            report.chunks += chunks.len();
            pb.inc(1);
        }

        pb.finish_and_clear();
        info!(
            "Ingested {} chunks from {} documents ({} empty)",
            report.chunks, report.documents, report.empty
        );

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedder::mock::MockEmbedder;
    use std::fs;

    #[test]
    fn test_ingest_empty_directory() {
        let dir = tempfile::tempdir().unwrap();
        let embedder = MockEmbedder::new(16);
        let mut store = VectorStore::new(16).unwrap();

        let pipeline = Pipeline::new(&embedder, 500, 100);
        let report = pipeline
            .ingest(&[dir.path().to_path_buf()], &mut store)
            .unwrap();

        assert_eq!(report.documents, 0);
        assert_eq!(report.chunks, 0);
        assert!(store.is_empty().unwrap());
    }

    #[test]
    fn test_ingest_skips_unparseable_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("broken.pdf"), "not a pdf").unwrap();

        let embedder = MockEmbedder::new(16);
        let mut store = VectorStore::new(16).unwrap();

        let pipeline = Pipeline::new(&embedder, 500, 100);
        let report = pipeline
            .ingest(&[dir.path().to_path_buf()], &mut store)
            .unwrap();

        // Loader drops the broken file before the pipeline sees it
        assert_eq!(report.documents, 0);
        assert!(store.is_empty().unwrap());
    }
}
