// ============================================================
// Layer 3 — Answer Span Decoding
// ============================================================
// Turns the model's start/end probability vectors into a span.
//
// Two strategies:
//   argmax_span — independent argmax of start and end. Cheap,
//                 but may return end < start.
//   best_span   — maximise p_start[s] * p_end[e] subject to
//                 s <= e < s + max_answer_len. Always well formed.
//
// Reference: Seo et al. (2017) BiDAF, §4 (answer decoding)

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end:   usize,
    /// p_start[start] * p_end[end]
    pub score: f32,
}

impl Span {
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start) + 1
    }
}

fn argmax(values: &[f32]) -> Option<usize> {
    let mut best: Option<(usize, f32)> = None;
    for (i, &v) in values.iter().enumerate() {
        match best {
            Some((_, b)) if v <= b => {}
            _ => best = Some((i, v)),
        }
    }
    best.map(|(i, _)| i)
}

/// Independent argmax over the first `len` positions of each vector.
pub fn argmax_span(start_probs: &[f32], end_probs: &[f32], len: usize) -> Option<Span> {
    let len   = len.min(start_probs.len()).min(end_probs.len());
    let start = argmax(&start_probs[..len])?;
    let end   = argmax(&end_probs[..len])?;
    Some(Span { start, end, score: start_probs[start] * end_probs[end] })
}

/// Highest-scoring well-formed span within the first `len` positions.
/// Ties keep the earliest span.
pub fn best_span(
    start_probs:    &[f32],
    end_probs:      &[f32],
    len:            usize,
    max_answer_len: usize,
) -> Option<Span> {
    let len = len.min(start_probs.len()).min(end_probs.len());
    if len == 0 {
        return None;
    }
    let max_answer_len = max_answer_len.max(1);

    let mut best = Span { start: 0, end: 0, score: f32::NEG_INFINITY };
    for s in 0..len {
        for e in s..(s + max_answer_len).min(len) {
            let score = start_probs[s] * end_probs[e];
            if score > best.score {
                best = Span { start: s, end: e, score };
            }
        }
    }
    Some(best)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_best_span_prefers_joint_maximum() {
        let start = [0.1, 0.6, 0.2, 0.1];
        let end   = [0.1, 0.1, 0.7, 0.1];
        let span  = best_span(&start, &end, 4, 30).unwrap();
        assert_eq!((span.start, span.end), (1, 2));
        assert!((span.score - 0.42).abs() < 1e-6);
    }

    #[test]
    fn test_best_span_never_ends_before_start() {
        // argmax would give start=2, end=0
        let start = [0.1, 0.2, 0.7];
        let end   = [0.8, 0.1, 0.1];
        let naive = argmax_span(&start, &end, 3).unwrap();
        assert!(naive.end < naive.start);

        let span = best_span(&start, &end, 3, 30).unwrap();
        assert!(span.start <= span.end);
    }

    #[test]
    fn test_best_span_respects_max_answer_len() {
        let start = [0.9, 0.05, 0.05];
        let end   = [0.0, 0.0, 1.0];
        let span  = best_span(&start, &end, 3, 2).unwrap();
        assert!(span.len() <= 2);
        assert_eq!(span.end, 2);
    }

    #[test]
    fn test_best_span_ignores_positions_past_len() {
        let start = [0.2, 0.1, 0.7];
        let end   = [0.3, 0.1, 0.6];
        let span  = best_span(&start, &end, 2, 30).unwrap();
        assert_eq!((span.start, span.end), (0, 0));
    }

    #[test]
    fn test_empty_input_has_no_span() {
        assert!(best_span(&[], &[], 0, 30).is_none());
        assert!(argmax_span(&[], &[], 0).is_none());
    }

    #[test]
    fn test_ties_keep_earliest_span() {
        let probs = [0.5, 0.5];
        let span  = best_span(&probs, &probs, 2, 30).unwrap();
        assert_eq!((span.start, span.end), (0, 0));
    }
}
