//! LLM access: backend trait, typed generation options, and the grounded
//! answer prompt.
//!
//! The production backend is a local Ollama server ([`ollama`]); [`mock`]
//! provides a canned backend for tests.
pub mod mock;
pub mod ollama;

use async_trait::async_trait;
use thiserror::Error;

use crate::store::ScoredChunk;

/// Errors raised by LLM operations.
#[derive(Error, Debug)]
pub enum LlmError {
    #[error("LLM server unavailable: {0}")]
    Unavailable(String),

    #[error("unexpected LLM response: {0}")]
    InvalidResponse(String),
}

/// Typed generation options. Replaces ad-hoc prompt templating.
#[derive(Debug, Clone)]
pub struct GenerateOptions {
    pub system: Option<String>,
    pub max_tokens: u32,
    pub temperature: f32,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            system: None,
            max_tokens: 500,
            temperature: 0.7,
        }
    }
}

/// System prompt for context-grounded answering.
const GROUNDED_SYSTEM_PROMPT: &str = "You are a helpful assistant. Answer questions based ONLY on the provided context documents. \
Be confident and direct in your answers. If the context mentions something, \
assume it's accurate and answer accordingly. Extract relevant information and provide a clear, \
structured answer. Only say 'not enough information' if the context truly doesn't address \
the question at all. Use the information from the context to give a comprehensive answer.";

/// Build the grounded-answer prompt from retrieved chunks.
///
/// At most `max_context_chunks` chunks are included, each labeled with its
/// source document.
fn build_context_prompt(query: &str, chunks: &[ScoredChunk], max_context_chunks: usize) -> String {
    let context: Vec<String> = chunks
        .iter()
        .take(max_context_chunks)
        .enumerate()
        .map(|(i, c)| {
            format!(
                "[Document {} - {}]:\n{}",
                i + 1,
                c.chunk.source,
                c.chunk.content
            )
        })
        .collect();

    format!(
        "Use the following context documents to answer the question.\n\
         Be direct and confident. Extract the relevant information and provide a clear answer.\n\n\
         Context:\n{}\n\nQuestion: {query}\n\nAnswer based on the context:",
        context.join("\n\n")
    )
}

/// Trait for LLM backends.
#[async_trait]
pub trait LlmBackend: Send + Sync {
    /// Issue a single generation request.
    async fn generate(&self, prompt: &str, options: &GenerateOptions) -> Result<String, LlmError>;

    /// Whether the backend is reachable and serving.
    async fn is_ready(&self) -> bool;

    /// Model identifier, surfaced in `/stats`.
    fn model_name(&self) -> &str;

    /// Generate an answer grounded in retrieved context chunks.
    async fn generate_with_context(
        &self,
        query: &str,
        chunks: &[ScoredChunk],
        max_context_chunks: usize,
    ) -> Result<String, LlmError> {
        let prompt = build_context_prompt(query, chunks, max_context_chunks);
        let options = GenerateOptions {
            system: Some(GROUNDED_SYSTEM_PROMPT.to_string()),
            ..Default::default()
        };
        self.generate(&prompt, &options).await
    }
}
