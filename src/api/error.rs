//! API error taxonomy and HTTP status mapping.
use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::llm::LlmError;
use crate::retrieval::RetrievalError;

/// Request-scoped errors, each mapped to a status code.
#[derive(Error, Debug)]
pub enum ApiError {
    /// Bad request parameters → 400.
    #[error("{0}")]
    Validation(String),

    /// Empty retrieval → 404.
    #[error("{0}")]
    NotFound(String),

    /// Component not initialized or unreachable → 503.
    #[error("{0}")]
    Unavailable(String),

    /// Unexpected failure → 500; details are logged, not returned.
    #[error("internal error")]
    Internal(anyhow::Error),
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err)
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let Self::Internal(source) = &self {
            error!("Internal error handling request: {source:#}");
        }

        let body = Json(json!({ "error": self.to_string() }));
        (self.status(), body).into_response()
    }
}

impl From<RetrievalError> for ApiError {
    fn from(err: RetrievalError) -> Self {
        Self::Internal(err.into())
    }
}

impl From<LlmError> for ApiError {
    fn from(err: LlmError) -> Self {
        match err {
            LlmError::Unavailable(msg) => Self::Unavailable(format!("LLM unavailable: {msg}")),
            other => Self::Internal(other.into()),
        }
    }
}
