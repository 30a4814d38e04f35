// ============================================================
// Layer 2 — Ask Use Case
// ============================================================
// Answers a free-text question from a passage or a directory of
// documents:
//   1. Gather documents (--context text, or .txt/.docx files)
//   2. Clean and split into words, map words to vocabulary ids
//   3. Slide overlapping windows of `context_maxlen` words
//   4. Predict a span in every window, keep the best score

use anyhow::Result;
use burn::prelude::Backend;
use std::fmt;
use tokenizers::Tokenizer;

use crate::data::{chunker::Chunker, loader::DocumentLoader, preprocessor::Preprocessor};
use crate::domain::{
    document::Document,
    traits::{DocumentSource, QuestionAnswerer},
};
use crate::infra::{
    checkpoint::CheckpointManager,
    tokenizer_store::{word_ids, TokenizerStore},
};
use crate::ml::inferencer::Inferencer;

/// Where `ask` reads passages from
pub enum ContextSource {
    Text(String),
    Directory(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Answer {
    pub text:   String,
    pub score:  f32,
    pub source: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AskOutcome {
    Answered(Answer),
    EmptyQuestion,
    NoDocuments,
    NoText,
}

impl fmt::Display for AskOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Answered(a)   => write!(f, "{} (score {:.4}, from {})", a.text, a.score, a.source),
            Self::EmptyQuestion => f.write_str("The question has no words to look up."),
            Self::NoDocuments   => f.write_str("No documents found."),
            Self::NoText        => f.write_str("Could not extract text from documents."),
        }
    }
}

/// Answers questions against a fixed set of passages with a loaded model
pub struct AskUseCase<B: Backend> {
    tokenizer:    Tokenizer,
    inferencer:   Inferencer<B>,
    source:       ContextSource,
    preprocessor: Preprocessor,
}

impl AskUseCase<burn::backend::Wgpu> {
    pub fn from_checkpoint(checkpoint_dir: &str, source: ContextSource) -> Result<Self> {
        let tokenizer  = TokenizerStore::new(checkpoint_dir).load()?;
        let ckpt       = CheckpointManager::new(checkpoint_dir);
        let inferencer = Inferencer::from_checkpoint(&ckpt)?;
        Ok(Self::new(tokenizer, inferencer, source))
    }
}

impl<B: Backend> AskUseCase<B> {
    pub fn new(tokenizer: Tokenizer, inferencer: Inferencer<B>, source: ContextSource) -> Self {
        Self { tokenizer, inferencer, source, preprocessor: Preprocessor::new() }
    }

    fn documents(&self) -> Result<Vec<Document>> {
        match &self.source {
            ContextSource::Text(text)     => Ok(vec![Document::new("inline", text.clone())]),
            ContextSource::Directory(dir) => DocumentLoader::new(dir.clone()).load_all(),
        }
    }

    pub fn ask(&self, question: &str) -> Result<AskOutcome> {
        let prep = &self.preprocessor;

        let question_words = prep.words(&prep.clean(question));
        if question_words.is_empty() {
            return Ok(AskOutcome::EmptyQuestion);
        }
        let question_ids = word_ids(&self.tokenizer, &question_words)?;

        let docs = self.documents()?;
        if docs.is_empty() {
            return Ok(AskOutcome::NoDocuments);
        }

        // A quarter-window overlap keeps short answers whole in some window
        let window  = self.inferencer.context_maxlen();
        let chunker = Chunker::new(window, window / 4);

        let mut best: Option<Answer> = None;
        let mut windows_read = 0usize;

        for doc in docs.iter().filter(|d| !d.is_blank()) {
            let words = prep.words(&prep.clean(&doc.text));
            if words.is_empty() {
                continue;
            }
            let ids = word_ids(&self.tokenizer, &words)?;

            for (w_words, w_ids) in chunker.windows(&words).into_iter().zip(chunker.windows(&ids)) {
                windows_read += 1;
                let Some(span) = self.inferencer.predict(&question_ids, w_ids)? else {
                    continue;
                };
                if best.as_ref().map_or(true, |b| span.score > b.score) {
                    best = Some(Answer {
                        text:   w_words[span.start..=span.end].join(" "),
                        score:  span.score,
                        source: doc.source.clone(),
                    });
                }
            }
        }

        tracing::info!("Read {} windows from {} documents", windows_read, docs.len());
        Ok(best.map_or(AskOutcome::NoText, AskOutcome::Answered))
    }
}

impl<B: Backend> QuestionAnswerer for AskUseCase<B> {
    fn answer(&self, question: &str) -> Result<String> {
        Ok(self.ask(question)?.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::vocab::Vocabulary;
    use crate::ml::model::SpanQaConfig;
    use burn::backend::NdArray;

    type B = NdArray;

    const WORDS: [&str; 10] = ["<pad>", "<sos>", "<unk>", "who", "wrote", "hamlet", "?", "shakespeare", "in", "."];

    fn use_case(dir: &std::path::Path, source: ContextSource) -> AskUseCase<B> {
        let vocab = Vocabulary::from_tokens(WORDS.iter().map(|w| w.to_string()).collect());
        let tokenizer = TokenizerStore::new(dir.display().to_string())
            .build_and_save(&vocab)
            .unwrap();
        let device = Default::default();
        let model  = SpanQaConfig::new(WORDS.len(), 4, 3, 4, 4).init::<B>(&device);
        AskUseCase::new(tokenizer, Inferencer::new(model, 3, device), source)
    }

    #[test]
    fn test_answer_comes_from_the_passage() {
        let dir = tempfile::tempdir().unwrap();
        let passage = "Shakespeare wrote Hamlet, in 1600. Hamlet is long.";
        let qa = use_case(dir.path(), ContextSource::Text(passage.to_string()));

        match qa.ask("Who wrote Hamlet?").unwrap() {
            AskOutcome::Answered(answer) => {
                assert_eq!(answer.source, "inline");
                let words = Preprocessor::new().words(passage);
                let found: Vec<&str> = answer.text.split(' ').collect();
                assert!(!found.is_empty() && found.len() <= 3);
                assert!(found.iter().all(|w| words.iter().any(|p| p == w)));
                assert!(answer.score > 0.0);
            }
            other => panic!("expected an answer, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_inputs_give_messages() {
        let dir = tempfile::tempdir().unwrap();

        let blank = use_case(dir.path(), ContextSource::Text("   \n ".to_string()));
        assert_eq!(blank.ask("Who?").unwrap(), AskOutcome::NoText);
        assert_eq!(blank.ask(" ").unwrap(), AskOutcome::EmptyQuestion);

        let docs = tempfile::tempdir().unwrap();
        let empty = use_case(dir.path(), ContextSource::Directory(docs.path().display().to_string()));
        assert_eq!(empty.answer("Who?").unwrap(), "No documents found.");
    }

    #[test]
    fn test_reads_documents_from_directory() {
        let dir  = tempfile::tempdir().unwrap();
        let docs = tempfile::tempdir().unwrap();
        std::fs::write(docs.path().join("a.txt"), "who wrote hamlet ? shakespeare").unwrap();

        let qa = use_case(dir.path(), ContextSource::Directory(docs.path().display().to_string()));
        match qa.ask("who wrote hamlet").unwrap() {
            AskOutcome::Answered(answer) => assert!(answer.source.ends_with("a.txt")),
            other => panic!("expected an answer, got {other:?}"),
        }
    }
}
