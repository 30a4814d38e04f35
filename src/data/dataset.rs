use burn::data::dataset::Dataset;
use serde::{Deserialize, Serialize};

use crate::data::vocab::PAD_ID;
use crate::domain::qa_pair::QaPair;

/// One padded training sample. Question and context are padded
/// separately; masks hold 1 for real tokens and 0 for padding.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QaSample {
    pub question_ids:   Vec<u32>,
    pub question_mask:  Vec<u32>,
    pub context_ids:    Vec<u32>,
    pub context_mask:   Vec<u32>,
    pub start_position: usize,
    pub end_position:   usize,
}

fn pad(ids: &[u32], width: usize) -> (Vec<u32>, Vec<u32>) {
    let len = ids.len().min(width);
    let mut padded = ids[..len].to_vec();
    let mut mask   = vec![1u32; len];
    padded.resize(width, PAD_ID);
    mask.resize(width, 0);
    (padded, mask)
}

impl QaSample {
    /// Pad (or truncate) a pair to fixed widths. Span indices are
    /// clamped into the window; pairs from `load_split` always fit.
    pub fn from_pair(pair: &QaPair, question_maxlen: usize, context_maxlen: usize) -> Self {
        Self::from_ids(
            &pair.question_ids,
            &pair.context_ids,
            pair.answer_start,
            pair.answer_end,
            question_maxlen,
            context_maxlen,
        )
    }

    pub fn from_ids(
        question_ids:    &[u32],
        context_ids:     &[u32],
        start:           usize,
        end:             usize,
        question_maxlen: usize,
        context_maxlen:  usize,
    ) -> Self {
        let (question_ids, question_mask) = pad(question_ids, question_maxlen);
        let (context_ids, context_mask)   = pad(context_ids, context_maxlen);
        let last = context_maxlen.saturating_sub(1);
        Self {
            question_ids,
            question_mask,
            context_ids,
            context_mask,
            start_position: start.min(last),
            end_position:   end.min(last),
        }
    }

    pub fn context_len(&self) -> usize {
        self.context_mask.iter().filter(|&&m| m == 1).count()
    }
}

pub struct QaDataset {
    samples: Vec<QaSample>,
}

impl QaDataset {
    pub fn new(samples: Vec<QaSample>) -> Self { Self { samples } }

    pub fn from_pairs(pairs: &[QaPair], question_maxlen: usize, context_maxlen: usize) -> Self {
        Self::new(
            pairs
                .iter()
                .map(|p| QaSample::from_pair(p, question_maxlen, context_maxlen))
                .collect(),
        )
    }

    pub fn sample_count(&self) -> usize { self.samples.len() }
}

impl Dataset<QaSample> for QaDataset {
    fn get(&self, index: usize) -> Option<QaSample> {
        self.samples.get(index).cloned()
    }

    fn len(&self) -> usize {
        self.samples.len()
    }
}
