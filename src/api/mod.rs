//! HTTP API layer (axum).
//!
//! Exposes the pipeline over JSON/REST: `GET /health`, `GET /stats`, and
//! `POST /query`. All state lives in an explicit [`server::AppContext`]
//! injected into handlers; there are no globals.
pub mod error;
pub mod handlers;
pub mod models;
pub mod server;

pub use error::ApiError;
pub use server::AppContext;
