//! Application context and axum server setup.
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::Router;
use axum::routing::{get, post};
use tokio::net::TcpListener;
use tokio::sync::Mutex;
use tracing::info;

use crate::api::handlers;
use crate::config::Config;
use crate::embedder::Embedder;
use crate::llm::LlmBackend;
use crate::retrieval::{QueryRewriter, Retriever};
use crate::store::VectorStore;

/// Shared application state, constructed once at startup and injected
/// into every handler.
pub struct AppContext {
    pub config: Config,
    /// `None` when no store has been ingested yet; `/query` then returns 503.
    pub store: Option<Arc<Mutex<VectorStore>>>,
    pub embedder: Arc<dyn Embedder>,
    pub llm: Arc<dyn LlmBackend>,
    pub retriever: Option<Retriever>,
}

impl AppContext {
    pub fn new(
        config: Config,
        store: Option<VectorStore>,
        embedder: Arc<dyn Embedder>,
        llm: Arc<dyn LlmBackend>,
    ) -> Self {
        let store = store.map(|s| Arc::new(Mutex::new(s)));

        let retriever = store.as_ref().map(|store| {
            Retriever::new(store.clone(), embedder.clone())
                .with_rewriter(QueryRewriter::new(llm.clone()))
        });

        Self {
            config,
            store,
            embedder,
            llm,
            retriever,
        }
    }
}

/// Build the application router.
pub fn router(ctx: Arc<AppContext>) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/stats", get(handlers::stats))
        .route("/query", post(handlers::query))
        .with_state(ctx)
}

/// Bind and serve until ctrl-c.
pub async fn serve(ctx: Arc<AppContext>) -> Result<()> {
    let addr = format!("{}:{}", ctx.config.server.host, ctx.config.server.port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    info!("Serving HTTP API on http://{addr}");

    let app = router(ctx);
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutting down");
        })
        .await
        .context("HTTP server error")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedder::mock::MockEmbedder;
    use crate::llm::mock::MockLlm;

    #[test]
    fn test_context_without_store_has_no_retriever() {
        let ctx = AppContext::new(
            Config::default(),
            None,
            Arc::new(MockEmbedder::default()),
            Arc::new(MockLlm::new("answer")),
        );
        assert!(ctx.store.is_none());
        assert!(ctx.retriever.is_none());
    }

    #[test]
    fn test_context_with_store_builds_retriever() {
        let store = VectorStore::new(384).unwrap();
        let ctx = AppContext::new(
            Config::default(),
            Some(store),
            Arc::new(MockEmbedder::default()),
            Arc::new(MockLlm::new("answer")),
        );
        assert!(ctx.store.is_some());
        assert!(ctx.retriever.is_some());
    }
}
