use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use docqa::api::{self, AppContext};
use docqa::config::{Config, ModelConfig};
use docqa::embedder::{Embedder, download, mock::MockEmbedder, onnx::OnnxEmbedder};
use docqa::ingest::pipeline::Pipeline;
use docqa::llm::ollama::OllamaClient;
use docqa::store::{StoreError, VectorStore};

#[derive(Parser)]
#[command(name = "docqa", version, about = "Local document question answering")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Build the vector store from PDF/DOCX documents
    Ingest {
        /// Path to the configuration file
        #[arg(long, default_value = "config.json")]
        config: String,

        /// Documents or directories to ingest (overrides configured patterns)
        #[arg(long)]
        input: Vec<PathBuf>,

        /// Store output path (overrides the configured path)
        #[arg(long)]
        output: Option<String>,
    },

    /// Serve the HTTP query API
    Serve {
        /// Path to the configuration file
        #[arg(long, default_value = "config.json")]
        config: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        // Ingestion is synchronous work (blocking HTTP, file IO, inference);
        // keep it off the async runtime.
        Command::Ingest {
            config,
            input,
            output,
        } => tokio::task::spawn_blocking(move || ingest(&config, input, output)).await?,
        Command::Serve { config } => serve(&config).await,
    }
}

/// Load the ONNX embedder, downloading model files when missing.
/// Falls back to the mock embedder so the pipeline stays usable offline.
fn build_embedder(model: &ModelConfig) -> Arc<dyn Embedder> {
    let model_dir = Path::new(&model.dir);

    let onnx = download::ensure_model_files(model_dir, &model.name).and_then(|()| {
        OnnxEmbedder::new(model_dir, &model.name, model.dimensions).map_err(Into::into)
    });

    match onnx {
        Ok(embedder) => Arc::new(embedder),
        Err(e) => {
            warn!("ONNX embedder unavailable ({e}); falling back to mock embedder");
            Arc::new(MockEmbedder::new(model.dimensions))
        }
    }
}

fn ingest(config_path: &str, input: Vec<PathBuf>, output: Option<String>) -> Result<()> {
    let config = Config::load(config_path)?;
    config.validate().context("invalid configuration")?;

    let documents = if input.is_empty() {
        config.document_files()?
    } else {
        input
    };
    anyhow::ensure!(
        !documents.is_empty(),
        "no documents to ingest; check document_patterns or pass --input"
    );

    let store_path = output.unwrap_or_else(|| config.store_path.clone());
    let embedder = build_embedder(&config.model);

    let mut store = VectorStore::new(embedder.dimensions())?;
    let pipeline = Pipeline::new(embedder.as_ref(), config.chunk_size, config.chunk_overlap);
    let report = pipeline.ingest(&documents, &mut store)?;

    anyhow::ensure!(report.chunks > 0, "no chunks produced; nothing to save");

    store.save(&store_path)?;
    info!(
        "Wrote {} chunks from {} documents to {store_path}",
        report.chunks, report.documents
    );

    Ok(())
}

async fn serve(config_path: &str) -> Result<()> {
    let config = Config::load(config_path)?;
    config.validate().context("invalid configuration")?;

    let model_config = config.model.clone();
    let embedder = tokio::task::spawn_blocking(move || build_embedder(&model_config)).await?;

    let store = match VectorStore::load(&config.store_path) {
        Ok(store) => Some(store),
        Err(StoreError::NotFound(path)) => {
            warn!("Vector store {path} not found; /query will return 503 until ingest runs");
            None
        }
        Err(e) => return Err(e).context("failed to load vector store"),
    };

    let llm = OllamaClient::new(&config.llm.base_url, &config.llm.model);
    match llm.has_model().await {
        Ok(true) => info!("LLM ready: {}", config.llm.model),
        Ok(false) => warn!(
            "Model {} not found on Ollama server; run `ollama pull {}`",
            config.llm.model, config.llm.model
        ),
        Err(e) => warn!("Ollama not reachable ({e}); /query will fail until it is up"),
    }

    let ctx = Arc::new(AppContext::new(config, store, embedder, Arc::new(llm)));
    api::server::serve(ctx).await
}
