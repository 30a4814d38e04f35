// ============================================================
// Layer 3 — QaPair Domain Type
// ============================================================
// One labelled reading-comprehension example.
//
// Extractive Q&A never generates text: the answer is a SPAN of
// the context, given as inclusive token indices.
//
// Example:
//   Question: "who wrote hamlet ?"
//   Context:  "hamlet is a tragedy written by william shakespeare ."
//   Answer:   context tokens 6..=7 → "william shakespeare"
//
// The question and context are held as vocabulary ids, the form
// the model consumes. The context tokens and the reference answer
// text are optional; when present, EM/F1 is computed on words
// instead of on id strings.
//
// Reference: Rajpurkar et al. (2016) SQuAD

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QaPair {
    pub question_ids: Vec<u32>,
    pub context_ids:  Vec<u32>,

    /// Index of the FIRST answer token in the context
    pub answer_start: usize,

    /// Index of the LAST answer token in the context (inclusive)
    pub answer_end: usize,

    /// Whitespace-tokenised context text, aligned with `context_ids`
    pub context_tokens: Option<Vec<String>>,

    /// Reference answer as written by the annotator
    pub answer_text: Option<String>,
}

impl QaPair {
    pub fn new(
        question_ids: Vec<u32>,
        context_ids:  Vec<u32>,
        answer_start: usize,
        answer_end:   usize,
    ) -> Self {
        Self {
            question_ids,
            context_ids,
            answer_start,
            answer_end,
            context_tokens: None,
            answer_text:    None,
        }
    }

    pub fn with_context_tokens(mut self, tokens: Vec<String>) -> Self {
        self.context_tokens = Some(tokens);
        self
    }

    pub fn with_answer_text(mut self, text: impl Into<String>) -> Self {
        self.answer_text = Some(text.into());
        self
    }

    /// Returns the length of the answer span in tokens
    pub fn span_length(&self) -> usize {
        self.answer_end.saturating_sub(self.answer_start) + 1
    }

    /// True when the question and context fit the padded widths
    /// without truncation and the gold span lies inside the context.
    pub fn fits(&self, question_maxlen: usize, context_maxlen: usize) -> bool {
        !self.question_ids.is_empty()
            && self.question_ids.len() <= question_maxlen
            && !self.context_ids.is_empty()
            && self.context_ids.len() <= context_maxlen
            && self.answer_start <= self.answer_end
            && self.answer_end < self.context_ids.len()
    }

    /// Text of the context between two token positions (inclusive).
    /// Falls back to the ids joined by spaces when no context tokens
    /// were loaded. Out-of-range positions are clamped.
    pub fn span_text(&self, start: usize, end: usize) -> String {
        let len = self.context_ids.len();
        if len == 0 || start > end {
            return String::new();
        }
        let end   = end.min(len - 1);
        let start = start.min(end);

        match &self.context_tokens {
            Some(tokens) if tokens.len() == len => tokens[start..=end].join(" "),
            _ => self.context_ids[start..=end]
                .iter()
                .map(|id| id.to_string())
                .collect::<Vec<_>>()
                .join(" "),
        }
    }

    /// The reference answer: the annotator's text if loaded,
    /// otherwise the text of the gold span.
    pub fn gold_answer(&self) -> String {
        match &self.answer_text {
            Some(text) => text.clone(),
            None       => self.span_text(self.answer_start, self.answer_end),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hamlet() -> QaPair {
        let tokens: Vec<String> = "hamlet is a tragedy written by william shakespeare ."
            .split_whitespace()
            .map(String::from)
            .collect();
        QaPair::new(vec![4, 5, 6], (10..19).collect(), 6, 7).with_context_tokens(tokens)
    }

    #[test]
    fn test_span_text_uses_context_tokens() {
        assert_eq!(hamlet().span_text(6, 7), "william shakespeare");
        assert_eq!(hamlet().gold_answer(), "william shakespeare");
    }

    #[test]
    fn test_span_text_falls_back_to_ids() {
        let pair = QaPair::new(vec![1], vec![7, 8, 9], 1, 2);
        assert_eq!(pair.span_text(1, 2), "8 9");
    }

    #[test]
    fn test_span_text_clamps_past_the_end() {
        assert_eq!(hamlet().span_text(7, 100), "shakespeare .");
        assert_eq!(hamlet().span_text(5, 2), "");
    }

    #[test]
    fn test_answer_text_wins_over_span() {
        let pair = hamlet().with_answer_text("Shakespeare");
        assert_eq!(pair.gold_answer(), "Shakespeare");
        assert_eq!(pair.span_length(), 2);
    }

    #[test]
    fn test_fits_checks_lengths_and_span() {
        let pair = hamlet();
        assert!(pair.fits(3, 9));
        assert!(!pair.fits(2, 9));  // question too long
        assert!(!pair.fits(3, 7));  // span end truncated away
        assert!(!pair.fits(3, 8));  // context too long, span still inside
    }
}
