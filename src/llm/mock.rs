//! Canned LLM backend for tests.
use async_trait::async_trait;

use super::{GenerateOptions, LlmBackend, LlmError};

/// Backend returning a fixed response, or failing on demand.
pub struct MockLlm {
    response: String,
    available: bool,
}

impl MockLlm {
    /// A backend that always answers with `response`.
    #[must_use]
    pub fn new(response: &str) -> Self {
        Self {
            response: response.to_string(),
            available: true,
        }
    }

    /// A backend that fails every request with [`LlmError::Unavailable`].
    #[must_use]
    pub fn unavailable() -> Self {
        Self {
            response: String::new(),
            available: false,
        }
    }
}

#[async_trait]
impl LlmBackend for MockLlm {
    async fn generate(&self, _prompt: &str, _options: &GenerateOptions) -> Result<String, LlmError> {
        if !self.available {
            return Err(LlmError::Unavailable("mock is offline".to_string()));
        }
        Ok(self.response.clone())
    }

    async fn is_ready(&self) -> bool {
        self.available
    }

    fn model_name(&self) -> &str {
        "mock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_returns_response() {
        let llm = MockLlm::new("canned answer");
        let out = llm.generate("anything", &GenerateOptions::default()).await.unwrap();
        assert_eq!(out, "canned answer");
        assert!(llm.is_ready().await);
    }

    #[tokio::test]
    async fn test_mock_unavailable() {
        let llm = MockLlm::unavailable();
        let err = llm
            .generate("anything", &GenerateOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, LlmError::Unavailable(_)));
        assert!(!llm.is_ready().await);
    }
}
