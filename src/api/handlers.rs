//! Request handlers for the HTTP API.
use std::sync::Arc;
use std::time::Instant;

use axum::Json;
use axum::extract::State;
use tracing::info;

use crate::api::error::ApiError;
use crate::api::models::{
    ChunkResult, HealthResponse, QueryRequest, QueryResponse, StatsResponse,
};
use crate::api::server::AppContext;
use crate::retrieval::SearchOptions;
use crate::store::ScoredChunk;

/// `GET /health`
pub async fn health(State(ctx): State<Arc<AppContext>>) -> Json<HealthResponse> {
    let num_vectors = match &ctx.store {
        Some(store) => store.lock().await.len().unwrap_or(0),
        None => 0,
    };

    Json(HealthResponse {
        status: "ok",
        vector_store_loaded: ctx.store.is_some(),
        num_vectors,
        llm_ready: ctx.llm.is_ready().await,
    })
}

/// `GET /stats`
pub async fn stats(State(ctx): State<Arc<AppContext>>) -> Result<Json<StatsResponse>, ApiError> {
    let store = ctx
        .store
        .as_ref()
        .ok_or_else(|| ApiError::Unavailable("vector store not loaded".into()))?;

    let stats = store
        .lock()
        .await
        .stats()
        .map_err(|e| ApiError::Internal(e.into()))?;

    Ok(Json(StatsResponse {
        num_vectors: stats.num_vectors,
        embedding_dim: stats.embedding_dim,
        num_sources: stats.num_sources,
        embedding_model: ctx.embedder.model_name().to_string(),
        llm_model: ctx.llm.model_name().to_string(),
    }))
}

/// `POST /query`
///
/// Body parsing errors are reported as 400 rather than axum's default
/// deserialization rejection.
pub async fn query(
    State(ctx): State<Arc<AppContext>>,
    Json(body): Json<serde_json::Value>,
) -> Result<Json<QueryResponse>, ApiError> {
    let request: QueryRequest = serde_json::from_value(body)
        .map_err(|e| ApiError::Validation(format!("invalid request body: {e}")))?;
    request.validate()?;

    let retriever = ctx
        .retriever
        .as_ref()
        .ok_or_else(|| ApiError::Unavailable("vector store not loaded; run ingest first".into()))?;

    let started = Instant::now();

    let options = SearchOptions {
        k: request.k,
        num_variations: request.num_variations,
        min_score: request.min_score,
        k_per_query: Some(request.k),
    };
    let retrieved: Vec<ScoredChunk> = if request.num_variations > 0 {
        retriever
            .retrieve_with_rephrasing(&request.query, &options)
            .await?
    } else {
        retriever
            .retrieve(&request.query, request.k, request.min_score)
            .await?
    };

    if retrieved.is_empty() {
        return Err(ApiError::NotFound(
            "no relevant chunks found for the query".into(),
        ));
    }

    let max_context = request.k.min(ctx.config.llm.max_context_chunks);
    let answer = ctx
        .llm
        .generate_with_context(&request.query, &retrieved, max_context)
        .await?;

    let mut sources: Vec<String> = Vec::new();
    for scored in &retrieved {
        if !sources.contains(&scored.chunk.source) {
            sources.push(scored.chunk.source.clone());
        }
    }

    let query_time = started.elapsed().as_secs_f64();
    info!(
        "Answered query in {query_time:.2}s ({} chunks, {} sources)",
        retrieved.len(),
        sources.len()
    );

    Ok(Json(QueryResponse {
        num_chunks_retrieved: retrieved.len(),
        chunks: retrieved.into_iter().map(ChunkResult::from).collect(),
        sources,
        answer,
        query_time,
    }))
}
