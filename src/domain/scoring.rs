// ============================================================
// Layer 3 — SQuAD Answer Scoring
// ============================================================
// Exact match (EM) and token-overlap F1 between a predicted
// answer string and the reference answer.
//
// Both metrics compare NORMALISED text:
//   1. lowercase
//   2. drop ASCII punctuation
//   3. drop the articles "a", "an", "the"
//   4. collapse whitespace
//
// Reference: official SQuAD v1.1 evaluation script

use std::collections::HashMap;

const ARTICLES: [&str; 3] = ["a", "an", "the"];

pub fn normalize_answer(text: &str) -> String {
    let lowered: String = text
        .to_lowercase()
        .chars()
        .filter(|c| !c.is_ascii_punctuation())
        .collect();

    lowered
        .split_whitespace()
        .filter(|w| !ARTICLES.contains(w))
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn exact_match_score(prediction: &str, ground_truth: &str) -> bool {
    normalize_answer(prediction) == normalize_answer(ground_truth)
}

/// Token-overlap F1 between normalized answers, in [0, 1]
pub fn f1_score(prediction: &str, ground_truth: &str) -> f64 {
    let pred  = normalize_answer(prediction);
    let truth = normalize_answer(ground_truth);
    let pred_tokens:  Vec<&str> = pred.split_whitespace().collect();
    let truth_tokens: Vec<&str> = truth.split_whitespace().collect();

    if pred_tokens.is_empty() && truth_tokens.is_empty() {
        return 1.0;
    }

    // Multiset intersection
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for t in &truth_tokens {
        *counts.entry(t).or_insert(0) += 1;
    }
    let mut common = 0usize;
    for t in &pred_tokens {
        if let Some(n) = counts.get_mut(t) {
            if *n > 0 {
                *n -= 1;
                common += 1;
            }
        }
    }

    if common == 0 {
        return 0.0;
    }
    let precision = common as f64 / pred_tokens.len() as f64;
    let recall    = common as f64 / truth_tokens.len() as f64;
    2.0 * precision * recall / (precision + recall)
}

/// Running means of F1 and EM over a set of predictions,
/// reported as percentages like the SQuAD leaderboard.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AnswerScores {
    pub f1:      f64,
    pub em:      f64,
    pub samples: usize,
}

impl AnswerScores {
    pub fn from_pairs<'a, I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut f1 = 0.0;
        let mut em = 0.0;
        let mut n  = 0usize;
        for (prediction, truth) in pairs {
            f1 += f1_score(prediction, truth);
            if exact_match_score(prediction, truth) {
                em += 1.0;
            }
            n += 1;
        }
        if n == 0 {
            return Self::default();
        }
        Self {
            f1:      100.0 * f1 / n as f64,
            em:      100.0 * em / n as f64,
            samples: n,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_strips_case_punctuation_and_articles() {
        assert_eq!(normalize_answer("The  Eiffel Tower!"), "eiffel tower");
        assert_eq!(normalize_answer("an apple, a pear"), "apple pear");
    }

    #[test]
    fn test_exact_match_after_normalisation() {
        assert!(exact_match_score("the Beatles", "Beatles."));
        assert!(!exact_match_score("Beatles", "The Rolling Stones"));
    }

    #[test]
    fn test_f1_partial_overlap() {
        // pred: {william, shakespeare, wrote}, truth: {shakespeare}
        let f1 = f1_score("William Shakespeare wrote", "Shakespeare");
        let p  = 1.0 / 3.0;
        let r  = 1.0;
        assert!((f1 - 2.0 * p * r / (p + r)).abs() < 1e-9);
    }

    #[test]
    fn test_f1_counts_repeated_tokens_once_each() {
        // only one "paris" in the truth can be matched
        let f1 = f1_score("paris paris", "paris");
        assert!((f1 - 2.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_f1_edge_cases() {
        assert_eq!(f1_score("london", "paris"), 0.0);
        assert_eq!(f1_score("the", "a"), 1.0);
        assert_eq!(f1_score("", "paris"), 0.0);
    }

    #[test]
    fn test_answer_scores_are_percentages() {
        let scores = AnswerScores::from_pairs(vec![
            ("paris", "Paris"),
            ("london", "berlin"),
        ]);
        assert_eq!(scores.samples, 2);
        assert!((scores.em - 50.0).abs() < 1e-9);
        assert!((scores.f1 - 50.0).abs() < 1e-9);
        assert_eq!(AnswerScores::from_pairs(Vec::new()), AnswerScores::default());
    }
}
