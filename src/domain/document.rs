// ============================================================
// Layer 3 — Document Domain Type
// ============================================================
// A passage the `ask` command reads answers from. By the time a
// Document exists, its text has already been pulled out of the
// .txt or .docx container.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    /// File name (or "inline" for --context text), reported next
    /// to the answer so the user knows where it came from
    pub source: String,

    /// Raw text before cleaning and tokenisation
    pub text: String,
}

impl Document {
    pub fn new(source: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            text:   text.into(),
        }
    }

    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_whitespace_only_document_is_blank() {
        assert!(Document::new("a.txt", " \n\t ").is_blank());
        assert!(!Document::new("a.txt", "text").is_blank());
    }
}
