// ============================================================
// Layer 6 — Tokenizer Store
// ============================================================
// Writes a HuggingFace WordLevel tokenizer whose ids are exactly
// the line numbers of vocab.dat, so raw text at `ask` time maps
// to the same ids the model was trained on.
//
// The JSON is written by hand and loaded back with
// Tokenizer::from_file; no trainer is involved.
//
//   normalizer    Lowercase, only when the vocabulary is lowercase
//   pre_tokenizer WhitespaceSplit (text is pre-split into words)
//   model         WordLevel, unknown words → vocab.unk_token()

use anyhow::{Context, Result};
use std::path::PathBuf;
use tokenizers::Tokenizer;

use crate::data::vocab::Vocabulary;

const TOKENIZER_FILE: &str = "tokenizer.json";

pub struct TokenizerStore {
    dir: PathBuf,
}

impl TokenizerStore {
    pub fn new(dir: impl Into<String>) -> Self {
        Self { dir: PathBuf::from(dir.into()) }
    }

    /// Load a previously saved tokenizer from JSON file
    pub fn load(&self) -> Result<Tokenizer> {
        let path = self.dir.join(TOKENIZER_FILE);
        Tokenizer::from_file(&path)
            .map_err(|e| anyhow::anyhow!(
                "Cannot load tokenizer from '{}': {}", path.display(), e
            ))
    }

    pub fn build_and_save(&self, vocab: &Vocabulary) -> Result<Tokenizer> {
        std::fs::create_dir_all(&self.dir)
            .with_context(|| format!("Cannot create '{}'", self.dir.display()))?;

        // First occurrence of a token keeps its line id
        let mut map = serde_json::Map::with_capacity(vocab.len());
        for (id, token) in vocab.tokens().iter().enumerate() {
            if !token.is_empty() && !map.contains_key(token) {
                map.insert(token.clone(), serde_json::json!(id));
            }
        }

        let normalizer = if vocab.is_lowercase() {
            serde_json::json!({ "type": "Lowercase" })
        } else {
            serde_json::Value::Null
        };

        let tokenizer_json = serde_json::json!({
            "version": "1.0",
            "truncation": null,
            "padding": null,
            "added_tokens": [],
            "normalizer": normalizer,
            "pre_tokenizer": { "type": "WhitespaceSplit" },
            "post_processor": null,
            "decoder": null,
            "model": {
                "type": "WordLevel",
                "vocab": map,
                "unk_token": vocab.unk_token()
            }
        });

        let tok_path = self.dir.join(TOKENIZER_FILE);
        std::fs::write(&tok_path, serde_json::to_string_pretty(&tokenizer_json)?)
            .with_context(|| format!("Cannot write tokenizer JSON '{}'", tok_path.display()))?;

        tracing::info!(
            "Tokenizer built with {} words, saved to '{}'",
            vocab.len(),
            tok_path.display()
        );

        Tokenizer::from_file(&tok_path)
            .map_err(|e| anyhow::anyhow!("Cannot reload tokenizer: {e}"))
    }
}

/// One id per pre-split word.
pub fn word_ids(tokenizer: &Tokenizer, words: &[String]) -> Result<Vec<u32>> {
    let encoding = tokenizer
        .encode(words.join(" "), false)
        .map_err(|e| anyhow::anyhow!("Tokenisation error: {e}"))?;
    let ids = encoding.get_ids().to_vec();
    if ids.len() != words.len() {
        anyhow::bail!("Tokenizer produced {} ids for {} words", ids.len(), words.len());
    }
    Ok(ids)
}
