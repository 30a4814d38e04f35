// ============================================================
// Layer 3 — Core Traits (Abstractions)
// ============================================================
// The application layer programs against these traits, not
// against concrete loaders or models:
//   - DocumentLoader implements DocumentSource
//   - AskUseCase     implements QuestionAnswerer
//
// Reference: Rust Book §10 (Traits: Defining Shared Behaviour)

use anyhow::Result;
use crate::domain::document::Document;

// ─── DocumentSource ───────────────────────────────────────────────────────────
/// Any component that can produce passages to answer questions from.
pub trait DocumentSource {
    fn load_all(&self) -> Result<Vec<Document>>;
}

// ─── QuestionAnswerer ─────────────────────────────────────────────────────────
/// Any component that can answer a natural language question.
pub trait QuestionAnswerer {
    /// Returns the best answer found, or a short explanation
    /// when there is nothing to read from.
    fn answer(&self, question: &str) -> Result<String>;
}
