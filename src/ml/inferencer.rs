// ============================================================
// Layer 5 — Inferencer
// ============================================================
// Runs a trained model on one (question, context window) pair
// of vocabulary ids and returns the best answer span.
//
// The context must already fit in `context_maxlen` tokens;
// longer documents are windowed by the caller. The question is
// truncated to `question_maxlen`.

use anyhow::Result;
use burn::{data::dataloader::batcher::Batcher, prelude::*};

use crate::data::{batcher::QaBatcher, dataset::QaSample};
use crate::domain::span::{argmax_span, best_span, Span};
use crate::infra::checkpoint::CheckpointManager;
use crate::ml::model::{SpanProbabilities, SpanQaModel};

type InferBackend = burn::backend::Wgpu;

/// A model ready to score single context windows
pub struct Inferencer<B: Backend> {
    model:          SpanQaModel<B>,
    max_answer_len: usize,
    device:         B::Device,
}

impl Inferencer<InferBackend> {
    /// Restores the best (else latest) checkpoint onto the default WGPU device
    pub fn from_checkpoint(ckpt_manager: &CheckpointManager) -> Result<Self> {
        let device = burn::backend::wgpu::WgpuDevice::default();
        let (cfg, model) = ckpt_manager.restore::<InferBackend>(&device)?;
        tracing::info!("Model loaded from checkpoint");
        Ok(Self::new(model, cfg.max_answer_len, device))
    }
}

impl<B: Backend> Inferencer<B> {
    /// `max_answer_len` caps the decoded span in tokens
    pub fn new(model: SpanQaModel<B>, max_answer_len: usize, device: B::Device) -> Self {
        Self { model, max_answer_len, device }
    }

    /// Widest context window `predict` accepts
    pub fn context_maxlen(&self) -> usize {
        self.model.context_maxlen
    }

    /// Best span inside `context_ids`, or None for an empty context.
    pub fn predict(&self, question_ids: &[u32], context_ids: &[u32]) -> Result<Option<Span>> {
        if context_ids.is_empty() {
            return Ok(None);
        }
        let (qmax, cmax) = (self.model.question_maxlen, self.model.context_maxlen);
        if context_ids.len() > cmax {
            anyhow::bail!("Context of {} tokens exceeds the model width {}", context_ids.len(), cmax);
        }
        let question = &question_ids[..question_ids.len().min(qmax)];

        let sample = QaSample::from_ids(question, context_ids, 0, 0, qmax, cmax);
        let batch  = QaBatcher::<B>::new(self.device.clone()).batch(vec![sample]);
        let probs  = SpanProbabilities::from_logits(self.model.forward_batch(&batch))?;

        let (start, end) = probs.row(0);
        let span = best_span(start, end, context_ids.len(), self.max_answer_len);
        if let (Some(span), Some(naive)) = (&span, argmax_span(start, end, context_ids.len())) {
            tracing::debug!(
                "Span [{},{}] ({} tokens) conf={:.4}, independent argmax [{},{}]",
                span.start, span.end, span.len(), span.score, naive.start, naive.end,
            );
        }
        Ok(span)
    }
}
