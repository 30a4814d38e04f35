// ============================================================
// Layer 4 — Q&A Batcher
// ============================================================
// Implements Burn's Batcher trait: stacks N padded QaSamples
// into tensors the model consumes.
//
//   question_ids / question_mask   [N, JQ]
//   context_ids  / context_mask    [N, JX]
//   start_positions / end_positions [N]
//
// Every sample is already padded to the same widths, so batching
// is a flatten followed by a reshape.
//
// Reference: Burn Book §4 (Batcher)

use burn::{
    data::dataloader::batcher::Batcher,
    prelude::*,
};

use crate::data::dataset::QaSample;

#[derive(Debug, Clone)]
pub struct QaBatch<B: Backend> {
    pub question_ids:    Tensor<B, 2, Int>,
    pub question_mask:   Tensor<B, 2, Int>,
    pub context_ids:     Tensor<B, 2, Int>,
    pub context_mask:    Tensor<B, 2, Int>,
    pub start_positions: Tensor<B, 1, Int>,
    pub end_positions:   Tensor<B, 1, Int>,
}

#[derive(Clone, Debug)]
pub struct QaBatcher<B: Backend> {
    pub device: B::Device,
}

impl<B: Backend> QaBatcher<B> {
    pub fn new(device: B::Device) -> Self {
        Self { device }
    }

    fn matrix<F>(&self, items: &[QaSample], width: usize, field: F) -> Tensor<B, 2, Int>
    where
        F: Fn(&QaSample) -> &[u32],
    {
        let flat: Vec<i32> = items
            .iter()
            .flat_map(|s| field(s).iter().map(|&x| x as i32))
            .collect();
        Tensor::<B, 1, Int>::from_ints(flat.as_slice(), &self.device)
            .reshape([items.len(), width])
    }
}

impl<B: Backend> Batcher<QaSample, QaBatch<B>> for QaBatcher<B> {
    fn batch(&self, items: Vec<QaSample>) -> QaBatch<B> {
        let jq = items[0].question_ids.len();
        let jx = items[0].context_ids.len();

        let question_ids  = self.matrix(&items, jq, |s| s.question_ids.as_slice());
        let question_mask = self.matrix(&items, jq, |s| s.question_mask.as_slice());
        let context_ids   = self.matrix(&items, jx, |s| s.context_ids.as_slice());
        let context_mask  = self.matrix(&items, jx, |s| s.context_mask.as_slice());

        let starts: Vec<i32> = items.iter().map(|s| s.start_position as i32).collect();
        let ends:   Vec<i32> = items.iter().map(|s| s.end_position as i32).collect();

        QaBatch {
            question_ids,
            question_mask,
            context_ids,
            context_mask,
            start_positions: Tensor::<B, 1, Int>::from_ints(starts.as_slice(), &self.device),
            end_positions:   Tensor::<B, 1, Int>::from_ints(ends.as_slice(), &self.device),
        }
    }
}
