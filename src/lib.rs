//! # docqa — Local Document Question Answering
//!
//! Chunks PDF/DOCX files, embeds the chunks, stores them in a vector
//! index, and answers natural-language queries grounded in retrieved
//! chunks via a local LLM (Ollama).
//!
//! ## Architecture
//!
//! - **[`config`]** — Configuration loading, validation, and pattern expansion
//! - **[`ingest`]** — PDF/DOCX text extraction, overlap chunking, offline pipeline
//! - **[`embedder`]** — Text embedding via ONNX Runtime (all-MiniLM-L6-v2)
//! - **[`store`]** — SQLite + sqlite-vec vector store (append, search, save/load)
//! - **[`retrieval`]** — Query rewriting and multi-query merge/dedup/re-rank
//! - **[`llm`]** — Ollama client with typed generation options
//! - **[`api`]** — axum HTTP API (`/health`, `/stats`, `/query`)

pub mod api;
pub mod config;
pub mod embedder;
pub mod ingest;
pub mod llm;
pub mod retrieval;
pub mod store;
