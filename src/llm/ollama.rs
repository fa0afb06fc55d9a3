//! Client for a local Ollama server.
//!
//! Uses the chat endpoint with streaming disabled. An unreachable server
//! or non-success status maps to [`LlmError::Unavailable`], which the API
//! layer turns into a 503 for that request only.
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{GenerateOptions, LlmBackend, LlmError};

const GENERATE_TIMEOUT: Duration = Duration::from_secs(120);
const PROBE_TIMEOUT: Duration = Duration::from_secs(3);

/// Ollama-backed implementation of [`LlmBackend`].
pub struct OllamaClient {
    http: reqwest::Client,
    base_url: String,
    model: String,
}

// ── Wire types ───────────────────────────────────────────────────────

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    stream: bool,
    options: ChatRequestOptions,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatRequestOptions {
    temperature: f32,
    num_predict: u32,
}

#[derive(Deserialize)]
struct ChatResponse {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    content: String,
}

#[derive(Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<ModelTag>,
}

#[derive(Deserialize)]
struct ModelTag {
    name: String,
}

// ── Client ───────────────────────────────────────────────────────────

impl OllamaClient {
    /// Create a client for `base_url` (e.g. `http://localhost:11434`).
    #[must_use]
    pub fn new(base_url: &str, model: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
        }
    }

    /// List model names known to the server.
    pub async fn list_models(&self) -> Result<Vec<String>, LlmError> {
        let url = format!("{}/api/tags", self.base_url);
        let resp = self
            .http
            .get(&url)
            .timeout(PROBE_TIMEOUT)
            .send()
            .await
            .map_err(|e| LlmError::Unavailable(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(LlmError::Unavailable(format!(
                "{url} returned {}",
                resp.status()
            )));
        }

        let tags: TagsResponse = resp
            .json()
            .await
            .map_err(|e| LlmError::InvalidResponse(e.to_string()))?;

        Ok(tags.models.into_iter().map(|m| m.name).collect())
    }

    /// Whether the configured model is present on the server.
    pub async fn has_model(&self) -> Result<bool, LlmError> {
        let models = self.list_models().await?;
        Ok(models.iter().any(|m| {
            m == &self.model || m.strip_suffix(":latest") == Some(self.model.as_str())
        }))
    }
}

#[async_trait]
impl LlmBackend for OllamaClient {
    async fn generate(&self, prompt: &str, options: &GenerateOptions) -> Result<String, LlmError> {
        let mut messages = Vec::new();
        if let Some(system) = &options.system {
            messages.push(ChatMessage {
                role: "system",
                content: system,
            });
        }
        messages.push(ChatMessage {
            role: "user",
            content: prompt,
        });

        let request = ChatRequest {
            model: &self.model,
            messages,
            stream: false,
            options: ChatRequestOptions {
                temperature: options.temperature,
                num_predict: options.max_tokens,
            },
        };

        let url = format!("{}/api/chat", self.base_url);
        debug!("Generating with {} ({} chars prompt)", self.model, prompt.len());

        let resp = self
            .http
            .post(&url)
            .timeout(GENERATE_TIMEOUT)
            .json(&request)
            .send()
            .await
            .map_err(|e| LlmError::Unavailable(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(LlmError::Unavailable(format!(
                "{url} returned {}",
                resp.status()
            )));
        }

        let body: ChatResponse = resp
            .json()
            .await
            .map_err(|e| LlmError::InvalidResponse(e.to_string()))?;

        Ok(body.message.content)
    }

    async fn is_ready(&self) -> bool {
        self.list_models().await.is_ok()
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trailing_slash_stripped() {
        let client = OllamaClient::new("http://localhost:11434/", "llama3.2");
        assert_eq!(client.base_url, "http://localhost:11434");
        assert_eq!(client.model_name(), "llama3.2");
    }

    #[test]
    fn test_chat_request_wire_format() {
        let request = ChatRequest {
            model: "llama3.2",
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: "be helpful",
                },
                ChatMessage {
                    role: "user",
                    content: "hello",
                },
            ],
            stream: false,
            options: ChatRequestOptions {
                temperature: 0.7,
                num_predict: 200,
            },
        };

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["model"], "llama3.2");
        assert_eq!(json["stream"], false);
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][1]["content"], "hello");
        assert_eq!(json["options"]["num_predict"], 200);
    }

    #[test]
    fn test_chat_response_parse() {
        let body = r#"{"model":"llama3.2","message":{"role":"assistant","content":"An answer."},"done":true}"#;
        let parsed: ChatResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.message.content, "An answer.");
    }

    #[test]
    fn test_tags_response_parse() {
        let body = r#"{"models":[{"name":"llama3.2:latest","size":123},{"name":"mistral:7b"}]}"#;
        let parsed: TagsResponse = serde_json::from_str(body).unwrap();
        let names: Vec<String> = parsed.models.into_iter().map(|m| m.name).collect();
        assert_eq!(names, vec!["llama3.2:latest", "mistral:7b"]);
    }

    /// Integration test requiring a running Ollama server.
    #[tokio::test]
    #[ignore]
    async fn test_generate_against_local_server() {
        let client = OllamaClient::new("http://localhost:11434", "llama3.2");
        let answer = client
            .generate("Say the word hello.", &GenerateOptions::default())
            .await
            .unwrap();
        assert!(!answer.is_empty());
    }
}
