//! ONNX Runtime embedder using the `ort` crate.
//!
//! Runs a sentence-transformer model (all-MiniLM-L6-v2 by default) with
//! BERT-style inputs, mean-pools the hidden states under the attention
//! mask, and L2-normalizes the result.
use std::path::Path;
use std::sync::Mutex;

use ort::session::Session;
use ort::value::Tensor;
use tokenizers::Tokenizer;
use tracing::info;

use super::{Embedder, EmbedderError, l2_normalize};

/// all-MiniLM-L6-v2 is trained with a 256-token sequence limit.
const MAX_SEQUENCE_LENGTH: usize = 256;

/// ONNX-backed embedder implementing the [`Embedder`] trait.
pub struct OnnxEmbedder {
    session: Mutex<Session>,
    tokenizer: Tokenizer,
    dimensions: usize,
    model_name: String,
}

impl OnnxEmbedder {
    /// Load `model.onnx` and `tokenizer.json` from `model_dir`.
    pub fn new(model_dir: &Path, model_name: &str, dimensions: usize) -> Result<Self, EmbedderError> {
        let model_path = model_dir.join("model.onnx");
        if !model_path.exists() {
            return Err(EmbedderError::ModelLoadFailed(format!(
                "model.onnx not found in {}",
                model_dir.display()
            )));
        }

        info!("Initializing ONNX Runtime...");

        let session = Session::builder()
            .map_err(|e| EmbedderError::ModelLoadFailed(format!("session builder error: {e}")))?
            .with_intra_threads(4)
            .map_err(|e| EmbedderError::ModelLoadFailed(format!("thread config error: {e}")))?
            .with_inter_threads(4)
            .map_err(|e| EmbedderError::ModelLoadFailed(format!("thread config error: {e}")))?
            .commit_from_file(&model_path)
            .map_err(|e| EmbedderError::ModelLoadFailed(format!("model load error: {e}")))?;

        let tokenizer = load_tokenizer(model_dir)?;

        info!(
            "ONNX model {model_name} loaded (vocab size: {})",
            tokenizer.get_vocab_size(false)
        );

        Ok(Self {
            session: Mutex::new(session),
            tokenizer,
            dimensions,
            model_name: model_name.to_string(),
        })
    }
}

fn load_tokenizer(model_dir: &Path) -> Result<Tokenizer, EmbedderError> {
    let tokenizer_path = model_dir.join("tokenizer.json");
    if !tokenizer_path.exists() {
        return Err(EmbedderError::TokenizerError(format!(
            "tokenizer.json not found in {}",
            model_dir.display()
        )));
    }

    let mut tokenizer = Tokenizer::from_file(&tokenizer_path)
        .map_err(|e| EmbedderError::TokenizerError(format!("failed to load tokenizer: {e}")))?;

    let _ = tokenizer.with_truncation(Some(tokenizers::TruncationParams {
        max_length: MAX_SEQUENCE_LENGTH,
        ..Default::default()
    }));
    tokenizer.with_padding(Some(tokenizers::PaddingParams {
        ..Default::default()
    }));

    Ok(tokenizer)
}

impl Embedder for OnnxEmbedder {
    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbedderError> {
        let encoding = self
            .tokenizer
            .encode(text, true)
            .map_err(|e| EmbedderError::TokenizerError(format!("failed to encode text: {e}")))?;

        let input_ids: Vec<i64> = encoding.get_ids().iter().map(|&id| id as i64).collect();
        let attention_mask: Vec<i64> = encoding
            .get_attention_mask()
            .iter()
            .map(|&m| m as i64)
            .collect();
        let seq_len = input_ids.len();

        // (shape, data) tuple form avoids ndarray version coupling with ort
        let input_ids_val = Tensor::from_array(([1usize, seq_len], input_ids))
            .map_err(|e| EmbedderError::InferenceFailed(format!("input_ids error: {e}")))?;
        let attention_mask_val =
            Tensor::from_array(([1usize, seq_len], attention_mask.clone())).map_err(|e| {
                EmbedderError::InferenceFailed(format!("attention_mask error: {e}"))
            })?;
        let token_type_ids_val = Tensor::from_array(([1usize, seq_len], vec![0i64; seq_len]))
            .map_err(|e| EmbedderError::InferenceFailed(format!("token_type_ids error: {e}")))?;

        let mut session = self
            .session
            .lock()
            .map_err(|e| EmbedderError::InferenceFailed(format!("lock poisoned: {e}")))?;
        let outputs = session
            .run(ort::inputs![
                "input_ids" => input_ids_val,
                "attention_mask" => attention_mask_val,
                "token_type_ids" => token_type_ids_val,
            ])
            .map_err(|e| EmbedderError::InferenceFailed(format!("inference failed: {e}")))?;

        // Output shape: [batch_size=1, seq_length, hidden_size]
        let (_shape, hidden_data) = outputs[0]
            .try_extract_tensor::<f32>()
            .map_err(|e| EmbedderError::InferenceFailed(format!("output extraction: {e}")))?;

        let embedding = mean_pooling(hidden_data, &attention_mask, seq_len, self.dimensions);
        Ok(l2_normalize(&embedding))
    }

    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbedderError> {
        texts.iter().map(|t| self.embed(t)).collect()
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }
}

/// Mean pooling over hidden states weighted by attention mask.
///
/// `hidden_data` is a flat array with shape `[1, seq_len, hidden_size]`.
fn mean_pooling(
    hidden_data: &[f32],
    attention_mask: &[i64],
    seq_len: usize,
    hidden_size: usize,
) -> Vec<f32> {
    let mut result = vec![0.0f32; hidden_size];
    let mut mask_sum: f32 = 0.0;

    for t in 0..seq_len {
        let mask = attention_mask[t] as f32;
        mask_sum += mask;

        for h in 0..hidden_size {
            result[h] += hidden_data[t * hidden_size + h] * mask;
        }
    }

    if mask_sum > 0.0 {
        for v in &mut result {
            *v /= mask_sum;
        }
    }

    result
}
