//! LLM-based query rewriting.
//!
//! Asks the LLM for paraphrases of the user's query to widen retrieval.
//! Strictly best-effort: any LLM failure or unusable output degrades to
//! an empty variant list and the caller searches with the original query
//! alone.
use std::sync::Arc;

use tracing::warn;

use crate::llm::{GenerateOptions, LlmBackend};

const REPHRASE_SYSTEM_PROMPT: &str =
    "You are a helpful assistant that rephrases questions for better document search.";

/// Variants shorter than this are discarded as noise (chars).
const MIN_VARIATION_LEN: usize = 10;

fn build_rephrase_prompt(query: &str, num_variations: usize) -> String {
    format!(
        "Generate {num_variations} different ways to ask this question for document search.\n\
         Each variation should use different words but have the same meaning.\n\
         Focus on terms that might appear in formal documents.\n\n\
         Original query: {query}\n\n\
         Generate {num_variations} variations (one per line, no numbering):"
    )
}

/// Strip list markers the model may add despite instructions.
fn strip_list_marker(line: &str) -> &str {
    let line = line.trim_start_matches(['-', '*', '•']).trim_start();
    match line.split_once(['.', ')']) {
        Some((prefix, rest)) if !prefix.is_empty() && prefix.chars().all(|c| c.is_ascii_digit()) => {
            rest.trim_start()
        }
        _ => line,
    }
}

/// Parse line-oriented LLM output into clean, distinct variants.
fn parse_variations(response: &str, original: &str, limit: usize) -> Vec<String> {
    let original_lower = original.trim().to_lowercase();
    let mut variations: Vec<String> = Vec::new();

    for line in response.lines() {
        let line = strip_list_marker(line.trim()).trim();
        if line.chars().count() <= MIN_VARIATION_LEN {
            continue;
        }
        if line.to_lowercase() == original_lower {
            continue;
        }
        if variations.iter().any(|v| v == line) {
            continue;
        }
        variations.push(line.to_string());
        if variations.len() == limit {
            break;
        }
    }

    variations
}

/// Rewrites queries through an LLM backend.
pub struct QueryRewriter {
    llm: Arc<dyn LlmBackend>,
}

impl QueryRewriter {
    pub fn new(llm: Arc<dyn LlmBackend>) -> Self {
        Self { llm }
    }

    /// Produce up to `num_variations` distinct paraphrases of `query`.
    ///
    /// The original query is never included in the result. Never fails:
    /// LLM errors yield an empty list.
    pub async fn rewrite(&self, query: &str, num_variations: usize) -> Vec<String> {
        if num_variations == 0 {
            return Vec::new();
        }

        let prompt = build_rephrase_prompt(query, num_variations);
        let options = GenerateOptions {
            system: Some(REPHRASE_SYSTEM_PROMPT.to_string()),
            max_tokens: 200,
            temperature: 0.7,
        };

        match self.llm.generate(&prompt, &options).await {
            Ok(response) => parse_variations(&response, query, num_variations),
            Err(e) => {
                warn!("Query rephrasing failed: {e}. Using original query only.");
                Vec::new()
            }
        }
    }
}
