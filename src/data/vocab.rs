// ============================================================
// Layer 4 — Vocabulary
// ============================================================
// Reads `vocab.dat`: one token per line, id = line index.
//
// The preprocessed SQuAD layout reserves the first ids:
//   0 → <pad>   1 → <sos>   2 → <unk>
// <unk> is looked up by name so other vocabularies still work.

use anyhow::{Context, Result};
use std::{collections::HashMap, fs, path::Path};

/// Id of the padding token, always the first vocabulary line
pub const PAD_ID: u32 = 0;
const UNK_TOKEN: &str = "<unk>";
const DEFAULT_UNK_ID: u32 = 2;

#[derive(Debug, Clone)]
pub struct Vocabulary {
    tokens: Vec<String>,
    index:  HashMap<String, u32>,
}

impl Vocabulary {
    pub fn from_tokens(tokens: Vec<String>) -> Self {
        let mut index = HashMap::with_capacity(tokens.len());
        for (i, tok) in tokens.iter().enumerate() {
            // First occurrence wins, matching line-number ids
            index.entry(tok.clone()).or_insert(i as u32);
        }
        Self { tokens, index }
    }

    /// Reads `vocab.dat`; an empty file is an error
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Cannot read vocabulary '{}'", path.display()))?;
        let tokens: Vec<String> = text
            .lines()
            .map(|l| l.trim_end_matches('\r').to_string())
            .collect();
        if tokens.is_empty() {
            anyhow::bail!("Vocabulary '{}' is empty", path.display());
        }
        tracing::info!("Loaded vocabulary of {} tokens", tokens.len());
        Ok(Self::from_tokens(tokens))
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    /// Line number of `token`, if present
    pub fn id(&self, token: &str) -> Option<u32> {
        self.index.get(token).copied()
    }

    pub fn unk_token(&self) -> &str {
        match self.index.get(UNK_TOKEN) {
            Some(_) => UNK_TOKEN,
            None    => self.tokens
                .get(DEFAULT_UNK_ID as usize)
                .map(String::as_str)
                .unwrap_or(UNK_TOKEN),
        }
    }

    /// True when no token has an uppercase letter, i.e. the corpus
    /// was lowercased before the vocabulary was built.
    pub fn is_lowercase(&self) -> bool {
        self.tokens.iter().all(|t| !t.chars().any(char::is_uppercase))
    }
}
