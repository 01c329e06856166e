use std::path::Path;
use tokenizers::{Tokenizer, TruncationParams};

use super::error::ModelError;

/// Loads `tokenizer.json` from a checkpoint directory, truncating encodings
/// to `max_len` tokens.
///
/// Sequence classifiers have a fixed position-embedding table, so anything
/// past `max_len` would index out of it.
pub fn load_tokenizer(model_dir: &Path, max_len: usize) -> Result<Tokenizer, ModelError> {
    let path = model_dir.join("tokenizer.json");
    let mut tokenizer = Tokenizer::from_file(&path).map_err(|e| load_error(e.to_string()))?;

    tokenizer
        .with_truncation(Some(TruncationParams {
            max_length: max_len,
            ..Default::default()
        }))
        .map_err(|e| load_error(format!("truncation: {e}")))?;

    Ok(tokenizer)
}

fn load_error(reason: String) -> ModelError {
    ModelError::Load {
        component: "tokenizer",
        reason,
    }
}
