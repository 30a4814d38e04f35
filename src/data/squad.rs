// ============================================================
// Layer 4 — SQuAD Split Reader
// ============================================================
// Reads one split ("train", "val", ...) of a preprocessed SQuAD
// directory into QaPairs.
//
// Files per split, one example per line, all with the same
// number of lines:
//
//   {split}.ids.question   "12 7 391 4"        (required)
//   {split}.ids.context    "5 88 23 ..."       (required)
//   {split}.span           "14 16"             (required)
//   {split}.context        "the river ..."     (optional)
//   {split}.answer         "Seine"             (optional)
//
// Examples that do not fit the padded widths are dropped here,
// before batching, so every sample reaching the model has its
// gold span inside the context window. Token ids outside the
// vocabulary are an error.
//
// The answer text is kept only when the context text lines up
// with the ids, so predictions and references are both words.

use anyhow::{Context, Result};
use std::{fs, path::Path};

use crate::domain::qa_pair::QaPair;

/// Padded widths the examples must fit into, and the vocabulary
/// size every token id must stay below
#[derive(Debug, Clone, Copy)]
pub struct SplitLimits {
    pub question_maxlen: usize,
    pub context_maxlen:  usize,
    pub vocab_size:      usize,
}

/// True when all three id / span files of `split` are in `dir`

pub fn split_exists(dir: &Path, split: &str) -> bool {
    ["ids.question", "ids.context", "span"]
        .iter()
        .all(|ext| dir.join(format!("{split}.{ext}")).exists())
}

/// Reads `{split}.*` from `dir`. Line counts must agree across files;
/// a bad id or span fails with `file:line`.
pub fn load_split(dir: &Path, split: &str, limits: SplitLimits) -> Result<Vec<QaPair>> {
    let q_path = dir.join(format!("{split}.ids.question"));
    let c_path = dir.join(format!("{split}.ids.context"));
    let s_path = dir.join(format!("{split}.span"));

    let questions = read_lines(&q_path)?;
    let contexts  = read_lines(&c_path)?;
    let spans     = read_lines(&s_path)?;
    expect_same_len(&q_path, questions.len(), &c_path, contexts.len())?;
    expect_same_len(&q_path, questions.len(), &s_path, spans.len())?;

    let context_text = read_optional(dir, split, "context", questions.len(), &q_path)?;
    let answer_text  = read_optional(dir, split, "answer",  questions.len(), &q_path)?;

    let mut pairs      = Vec::with_capacity(questions.len());
    let mut dropped    = 0usize;
    let mut misaligned = 0usize;
    let vocab = limits.vocab_size;

    for i in 0..questions.len() {
        let line = i + 1;
        let question_ids = parse_ids(&questions[i], &q_path, line, vocab)?;
        let context_ids  = parse_ids(&contexts[i],  &c_path, line, vocab)?;
        let (start, end) = parse_span(&spans[i], &s_path, line)?;

        let mut pair = QaPair::new(question_ids, context_ids, start, end);
        if let Some(texts) = &context_text {
            let tokens: Vec<String> = texts[i].split_whitespace().map(String::from).collect();
            if tokens.len() == pair.context_ids.len() {
                pair = pair.with_context_tokens(tokens);
            } else {
                misaligned += 1;
                tracing::debug!(
                    "{split} line {line}: context text has {} tokens, ids have {}",
                    tokens.len(),
                    pair.context_ids.len()
                );
            }
        }
        if let Some(answers) = &answer_text {
            if pair.context_tokens.is_some() {
                pair = pair.with_answer_text(answers[i].trim());
            }
        }

        if pair.fits(limits.question_maxlen, limits.context_maxlen) {
            pairs.push(pair);
        } else {
            dropped += 1;
        }
    }

    if answer_text.is_some() && (context_text.is_none() || misaligned > 0) {
        tracing::warn!(
            "'{}': {} examples have no context text aligned with their ids; \
             their answers are scored as id strings",
            split,
            if context_text.is_none() { questions.len() } else { misaligned },
        );
    }
    tracing::info!(
        "Loaded {} '{}' examples ({} dropped: longer than {}/{} tokens)",
        pairs.len(),
        split,
        dropped,
        limits.question_maxlen,
        limits.context_maxlen,
    );
    if !pairs.is_empty() {
        let total: usize = pairs.iter().map(QaPair::span_length).sum();
        tracing::debug!("Mean answer length: {:.2} tokens", total as f64 / pairs.len() as f64);
    }
    Ok(pairs)
}

fn read_lines(path: &Path) -> Result<Vec<String>> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Cannot read '{}'", path.display()))?;
    Ok(text.lines().map(|l| l.trim_end_matches('\r').to_string()).collect())
}

fn read_optional(
    dir:      &Path,
    split:    &str,
    ext:      &str,
    expected: usize,
    anchor:   &Path,
) -> Result<Option<Vec<String>>> {
    let path = dir.join(format!("{split}.{ext}"));
    if !path.exists() {
        return Ok(None);
    }
    let lines = read_lines(&path)?;
    expect_same_len(anchor, expected, &path, lines.len())?;
    Ok(Some(lines))
}

fn expect_same_len(a: &Path, a_len: usize, b: &Path, b_len: usize) -> Result<()> {
    if a_len != b_len {
        anyhow::bail!(
            "'{}' has {} lines but '{}' has {}",
            b.display(),
            b_len,
            a.display(),
            a_len
        );
    }
    Ok(())
}

fn parse_ids(line: &str, path: &Path, line_no: usize, vocab_size: usize) -> Result<Vec<u32>> {
    line.split_whitespace()
        .map(|tok| {
            let id = tok.parse::<u32>().with_context(|| {
                format!("{}:{}: bad token id '{}'", path.display(), line_no, tok)
            })?;
            if id as usize >= vocab_size {
                anyhow::bail!(
                    "{}:{}: token id {} is outside the vocabulary of {} words",
                    path.display(), line_no, id, vocab_size
                );
            }
            Ok(id)
        })
        .collect()
}

fn parse_span(line: &str, path: &Path, line_no: usize) -> Result<(usize, usize)> {
    let nums: Vec<usize> = line
        .split_whitespace()
        .map(|tok| {
            tok.parse::<usize>().with_context(|| {
                format!("{}:{}: bad span index '{}'", path.display(), line_no, tok)
            })
        })
        .collect::<Result<_>>()?;

    match nums.as_slice() {
        [start, end] if start <= end => Ok((*start, *end)),
        [start, end] => anyhow::bail!(
            "{}:{}: span start {} is after end {}",
            path.display(), line_no, start, end
        ),
        _ => anyhow::bail!(
            "{}:{}: expected 'start end', got '{}'",
            path.display(), line_no, line
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LIMITS: SplitLimits = SplitLimits { question_maxlen: 4, context_maxlen: 6, vocab_size: 20 };

    fn write_split(dir: &Path, questions: &str, contexts: &str, spans: &str) {
        fs::write(dir.join("train.ids.question"), questions).unwrap();
        fs::write(dir.join("train.ids.context"), contexts).unwrap();
        fs::write(dir.join("train.span"), spans).unwrap();
    }

    #[test]
    fn test_loads_pairs_with_optional_text() {
        let dir = tempfile::tempdir().unwrap();
        write_split(dir.path(), "3 4\n5\n", "6 7 8\n9 10 11 12\n", "1 2\n0 0\n");
        fs::write(dir.path().join("train.context"), "a b c\nd e f g\n").unwrap();
        fs::write(dir.path().join("train.answer"), "b c\nd\n").unwrap();

        assert!(split_exists(dir.path(), "train"));
        let pairs = load_split(dir.path(), "train", LIMITS).unwrap();
        assert_eq!(pairs.len(), 2);
        assert_eq!(pairs[0].question_ids, vec![3, 4]);
        assert_eq!((pairs[0].answer_start, pairs[0].answer_end), (1, 2));
        assert_eq!(pairs[0].span_text(1, 2), "b c");
        assert_eq!(pairs[1].gold_answer(), "d");
    }

    #[test]
    fn test_drops_examples_outside_the_window() {
        let dir = tempfile::tempdir().unwrap();
        // second question too long, third span past context_maxlen,
        // fourth context too long even though its span is inside
        write_split(
            dir.path(),
            "1\n1 2 3 4 5\n1\n1\n",
            "1 2\n1 2\n1 2 3 4 5 6 7 8\n1 2 3 4 5 6 7 8 9 10\n",
            "0 1\n0 0\n6 7\n0 1\n",
        );
        let pairs = load_split(dir.path(), "train", LIMITS).unwrap();
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].context_ids, vec![1, 2]);
    }

    #[test]
    fn test_id_outside_vocabulary_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        write_split(dir.path(), "1\n2\n", "1 2\n3 20\n", "0 0\n0 0\n");
        let err = load_split(dir.path(), "train", LIMITS).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("train.ids.context:2:"), "{msg}");
        assert!(msg.contains("20"));
    }

    #[test]
    fn test_misaligned_context_drops_answer_text() {
        let dir = tempfile::tempdir().unwrap();
        write_split(dir.path(), "3\n3\n", "6 7 8\n6 7\n", "1 2\n0 1\n");
        fs::write(dir.path().join("train.context"), "a b c\nd e f\n").unwrap();
        fs::write(dir.path().join("train.answer"), "b c\nd e\n").unwrap();

        let pairs = load_split(dir.path(), "train", LIMITS).unwrap();
        assert_eq!(pairs[0].gold_answer(), "b c");
        // two ids but three words: reference falls back to the id span
        assert!(pairs[1].context_tokens.is_none());
        assert_eq!(pairs[1].gold_answer(), "6 7");
    }

    #[test]
    fn test_mismatched_line_counts_are_an_error() {
        let dir = tempfile::tempdir().unwrap();
        write_split(dir.path(), "1\n2\n", "1 2\n", "0 0\n0 0\n");
        let err = load_split(dir.path(), "train", LIMITS).unwrap_err();
        assert!(err.to_string().contains("train.ids.context"));
    }

    #[test]
    fn test_bad_id_reports_line() {
        let dir = tempfile::tempdir().unwrap();
        write_split(dir.path(), "1\nx\n", "1 2\n1 2\n", "0 0\n0 0\n");
        let err = load_split(dir.path(), "train", LIMITS).unwrap_err();
        assert!(err.to_string().contains(":2:"));
    }

    #[test]
    fn test_reversed_span_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        write_split(dir.path(), "1\n", "1 2 3\n", "2 1\n");
        assert!(load_split(dir.path(), "train", LIMITS).is_err());
    }

    #[test]
    fn test_missing_split_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        assert!(!split_exists(dir.path(), "val"));
        assert!(load_split(dir.path(), "val", LIMITS).is_err());
    }
}
