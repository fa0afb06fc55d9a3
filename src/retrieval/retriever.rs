//! Multi-query retrieval with merge, dedup, and re-ranking.
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::debug;

use crate::embedder::Embedder;
use crate::retrieval::{QueryRewriter, RetrievalError};
use crate::store::{ScoredChunk, VectorStore};

/// Knobs for a retrieval run.
#[derive(Debug, Clone)]
pub struct SearchOptions {
    /// Final number of results.
    pub k: usize,
    /// Number of query paraphrases to request.
    pub num_variations: usize,
    /// Minimum similarity score; lower-scoring chunks are dropped.
    pub min_score: f32,
    /// Results fetched per query variant. Defaults to `k` when `None`.
    pub k_per_query: Option<usize>,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            k: 5,
            num_variations: 2,
            min_score: 0.0,
            k_per_query: None,
        }
    }
}

/// Orchestrates query rewriting, vector search, and result merging.
pub struct Retriever {
    store: Arc<Mutex<VectorStore>>,
    embedder: Arc<dyn Embedder>,
    rewriter: Option<QueryRewriter>,
}

impl Retriever {
    pub fn new(store: Arc<Mutex<VectorStore>>, embedder: Arc<dyn Embedder>) -> Self {
        Self {
            store,
            embedder,
            rewriter: None,
        }
    }

    /// Attach a query rewriter, enabling multi-query retrieval.
    #[must_use]
    pub fn with_rewriter(mut self, rewriter: QueryRewriter) -> Self {
        self.rewriter = Some(rewriter);
        self
    }

    /// Single-query retrieval: embed, search, filter by `min_score`.
    pub async fn retrieve(
        &self,
        query: &str,
        k: usize,
        min_score: f32,
    ) -> Result<Vec<ScoredChunk>, RetrievalError> {
        let mut results = self.search_one(query, k).await?;
        results.retain(|r| r.score >= min_score);
        Ok(results)
    }

    /// Multi-query retrieval with paraphrasing.
    ///
    /// Runs the original query plus up to `num_variations` paraphrases,
    /// unions the result sets deduplicated by chunk identity
    /// (source, chunk_index) keeping the highest observed score, drops
    /// entries below `min_score`, and returns the top `k` by score.
    /// Equal scores keep first-observed order.
    ///
    /// Rewriting is best-effort: without a rewriter, or when the LLM
    /// fails, only the original query is searched.
    pub async fn retrieve_with_rephrasing(
        &self,
        query: &str,
        options: &SearchOptions,
    ) -> Result<Vec<ScoredChunk>, RetrievalError> {
        let k_per_query = options.k_per_query.unwrap_or(options.k);

        let mut queries = vec![query.to_string()];
        if options.num_variations > 0 {
            if let Some(rewriter) = &self.rewriter {
                queries.extend(rewriter.rewrite(query, options.num_variations).await);
            }
        }
        debug!("Searching with {} query variant(s)", queries.len());

        // Union across variants; first hit wins the slot, later hits only
        // raise the score.
        let mut merged: Vec<ScoredChunk> = Vec::new();
        let mut by_identity: HashMap<(String, usize), usize> = HashMap::new();

        for q in &queries {
            for hit in self.search_one(q, k_per_query).await? {
                let key = (hit.chunk.source.clone(), hit.chunk.chunk_index);
                match by_identity.get(&key) {
                    Some(&slot) => {
                        if hit.score > merged[slot].score {
                            merged[slot].score = hit.score;
                        }
                    }
                    None => {
                        by_identity.insert(key, merged.len());
                        merged.push(hit);
                    }
                }
            }
        }

        merged.retain(|r| r.score >= options.min_score);
        // Stable sort: ties keep insertion order
        merged.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
        merged.truncate(options.k);

        Ok(merged)
    }

    async fn search_one(&self, query: &str, k: usize) -> Result<Vec<ScoredChunk>, RetrievalError> {
        let query_vector = self.embedder.embed(query)?;
        let store = self.store.lock().await;
        Ok(store.search(&query_vector, k)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedder::EmbedderError;
    use crate::llm::mock::MockLlm;
    use crate::store::Chunk;

    /// Embedder mapping known query strings to fixed unit vectors so
    /// search outcomes are exact.
    struct RoutedEmbedder;

    impl RoutedEmbedder {
        fn vector_for(text: &str) -> Vec<f32> {
            if text.contains("cats") {
                vec![1.0, 0.0, 0.0, 0.0]
            } else if text.contains("feline") {
                vec![0.0, 1.0, 0.0, 0.0]
            } else {
                vec![0.0, 0.0, 1.0, 0.0]
            }
        }
    }

    impl Embedder for RoutedEmbedder {
        fn embed(&self, text: &str) -> Result<Vec<f32>, EmbedderError> {
            Ok(Self::vector_for(text))
        }

        fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbedderError> {
            texts.iter().map(|t| self.embed(t)).collect()
        }

        fn dimensions(&self) -> usize {
            4
        }

        fn model_name(&self) -> &str {
            "routed"
        }
    }

    fn chunk(source: &str, index: usize, content: &str) -> Chunk {
        Chunk {
            content: content.to_string(),
            source: source.to_string(),
            chunk_index: index,
            total_chunks: 3,
        }
    }

    /// Store with three chunks along distinct axes. The first query axis
    /// is closest to chunk 0, the second to chunk 1.
    fn seeded_store() -> Arc<Mutex<VectorStore>> {
        let mut store = VectorStore::new(4).unwrap();
        let chunks = vec![
            chunk("cats.pdf", 0, "cats are felines"),
            chunk("cats.pdf", 1, "cats sleep a lot"),
            chunk("dogs.pdf", 0, "dogs bark"),
        ];
        let embeddings = vec![
            vec![0.9, 0.1, 0.0, 0.0],
            vec![0.1, 0.9, 0.0, 0.0],
            vec![0.0, 0.0, 0.0, 1.0],
        ];
        store.add_vectors(&embeddings, &chunks).unwrap();
        Arc::new(Mutex::new(store))
    }

    fn retriever_with_variant() -> Retriever {
        // The rewriter will produce exactly one variant: "feline question"
        let llm = MockLlm::new("feline question here");
        Retriever::new(seeded_store(), Arc::new(RoutedEmbedder))
            .with_rewriter(QueryRewriter::new(Arc::new(llm)))
    }

    #[tokio::test]
    async fn test_retrieve_plain() {
        let retriever = Retriever::new(seeded_store(), Arc::new(RoutedEmbedder));
        let results = retriever.retrieve("query about cats", 2, 0.0).await.unwrap();

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].chunk.content, "cats are felines");
    }

    #[tokio::test]
    async fn test_retrieve_min_score_filters() {
        let retriever = Retriever::new(seeded_store(), Arc::new(RoutedEmbedder));
        let results = retriever.retrieve("query about cats", 3, 0.9).await.unwrap();

        for r in &results {
            assert!(r.score >= 0.9);
        }
        // Orthogonal chunks score ~0.5 and must be gone
        assert!(results.iter().all(|r| r.chunk.source != "dogs.pdf"));
    }

    #[tokio::test]
    async fn test_rephrasing_merges_and_dedups() {
        let retriever = retriever_with_variant();
        let options = SearchOptions {
            k: 10,
            num_variations: 1,
            min_score: 0.0,
            k_per_query: Some(2),
        };
        let results = retriever
            .retrieve_with_rephrasing("query about cats", &options)
            .await
            .unwrap();

        // Both query variants hit the two cats.pdf chunks; each appears once
        let cat_hits: Vec<_> = results
            .iter()
            .filter(|r| r.chunk.source == "cats.pdf")
            .collect();
        assert_eq!(cat_hits.len(), 2);

        // Dedup kept the higher of the two observed scores: each chunk is
        // near-parallel to one query variant, so its merged score must be
        // the high one.
        for hit in cat_hits {
            assert!(hit.score > 0.9, "expected max score kept, got {}", hit.score);
        }
    }

    #[tokio::test]
    async fn test_rephrasing_respects_min_score() {
        let retriever = retriever_with_variant();
        let options = SearchOptions {
            k: 10,
            num_variations: 1,
            min_score: 0.8,
            k_per_query: Some(3),
        };
        let results = retriever
            .retrieve_with_rephrasing("query about cats", &options)
            .await
            .unwrap();

        assert!(results.iter().all(|r| r.score >= 0.8));
        assert!(results.iter().all(|r| r.chunk.source != "dogs.pdf"));
    }

    #[tokio::test]
    async fn test_rephrasing_sorted_descending_and_truncated() {
        let retriever = retriever_with_variant();
        let options = SearchOptions {
            k: 1,
            num_variations: 1,
            min_score: 0.0,
            k_per_query: Some(3),
        };
        let results = retriever
            .retrieve_with_rephrasing("query about cats", &options)
            .await
            .unwrap();

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].chunk.source, "cats.pdf");
    }

    #[tokio::test]
    async fn test_rephrasing_falls_back_on_llm_failure() {
        let llm = MockLlm::unavailable();
        let retriever = Retriever::new(seeded_store(), Arc::new(RoutedEmbedder))
            .with_rewriter(QueryRewriter::new(Arc::new(llm)));

        let options = SearchOptions {
            k: 2,
            num_variations: 2,
            min_score: 0.0,
            k_per_query: None,
        };
        let results = retriever
            .retrieve_with_rephrasing("query about cats", &options)
            .await
            .unwrap();

        // Original query alone still returns results
        assert!(!results.is_empty());
        assert_eq!(results[0].chunk.content, "cats are felines");
    }

    #[tokio::test]
    async fn test_rephrasing_without_rewriter() {
        let retriever = Retriever::new(seeded_store(), Arc::new(RoutedEmbedder));
        let options = SearchOptions::default();
        let results = retriever
            .retrieve_with_rephrasing("query about cats", &options)
            .await
            .unwrap();
        assert!(!results.is_empty());
    }

    #[tokio::test]
    async fn test_empty_store_yields_no_results() {
        let store = Arc::new(Mutex::new(VectorStore::new(4).unwrap()));
        let retriever = Retriever::new(store, Arc::new(RoutedEmbedder));
        let results = retriever
            .retrieve_with_rephrasing("query about cats", &SearchOptions::default())
            .await
            .unwrap();
        assert!(results.is_empty());
    }
}
