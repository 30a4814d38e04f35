// ============================================================
// Layer 5 — Evaluation
// ============================================================
// Two measures of how well the model is doing:
//
//   validation_cost — mean cross-entropy over a loader, plus
//                     exact start / end position accuracy
//   evaluate_answer — decode spans for a random sample of
//                     examples and score the answer TEXT with
//                     SQuAD F1 / EM
//
// Both take a model on a plain Backend: callers pass
// `model.valid()` so no autodiff graph is built.

use anyhow::Result;
use burn::{data::dataloader::batcher::Batcher, prelude::*};
use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};

use crate::data::{
    batcher::{QaBatch, QaBatcher},
    dataset::QaSample,
};
use crate::domain::{qa_pair::QaPair, scoring::AnswerScores, span::best_span};
use crate::ml::model::{SpanProbabilities, SpanQaModel};

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ValidationReport {
    /// Mean per-batch loss
    pub loss:      f64,
    /// Fraction of examples whose argmax start is the gold start
    pub start_acc: f64,
    pub end_acc:   f64,
    pub samples:   usize,
}

/// Mean loss and exact start / end accuracy over `batches`.
/// An empty iterator gives a NaN loss.
pub fn validation_cost<B, I>(model: &SpanQaModel<B>, batches: I) -> ValidationReport
where
    B: Backend,
    I: IntoIterator<Item = QaBatch<B>>,
{
    let mut loss_sum      = 0.0f64;
    let mut batch_count   = 0usize;
    let mut correct_start = 0usize;
    let mut correct_end   = 0usize;
    let mut total         = 0usize;

    for batch in batches {
        let (loss, logits) = model.forward_loss(&batch);
        loss_sum    += loss.into_scalar().elem::<f64>();
        batch_count += 1;

        let n = batch.start_positions.dims()[0];
        total += n;

        let pred_start = logits.start.argmax(1).reshape([n]);
        let pred_end   = logits.end.argmax(1).reshape([n]);
        correct_start += pred_start
            .equal(batch.start_positions)
            .int().sum().into_scalar().elem::<i64>() as usize;
        correct_end += pred_end
            .equal(batch.end_positions)
            .int().sum().into_scalar().elem::<i64>() as usize;
    }

    if batch_count == 0 {
        return ValidationReport { loss: f64::NAN, ..Default::default() };
    }
    ValidationReport {
        loss:      loss_sum / batch_count as f64,
        start_acc: correct_start as f64 / total.max(1) as f64,
        end_acc:   correct_end   as f64 / total.max(1) as f64,
        samples:   total,
    }
}

#[derive(Debug, Clone, Copy)]
pub struct AnswerEvalOptions {
    /// How many examples to score; 0 means all of them
    pub sample:         usize,
    pub batch_size:     usize,
    pub max_answer_len: usize,
    pub seed:           u64,
}

/// SQuAD F1 / EM of decoded answers on a seeded sample of `pairs`.
/// Pass `log` to report the scores at info level.
pub fn evaluate_answer<B: Backend>(
    model:  &SpanQaModel<B>,
    pairs:  &[QaPair],
    opts:   AnswerEvalOptions,
    device: &B::Device,
    log:    bool,
) -> Result<AnswerScores> {
    let chosen: Vec<&QaPair> = if opts.sample == 0 || opts.sample >= pairs.len() {
        pairs.iter().collect()
    } else {
        let mut rng = StdRng::seed_from_u64(opts.seed);
        pairs.choose_multiple(&mut rng, opts.sample).collect()
    };

    let batcher = QaBatcher::<B>::new(device.clone());
    let mut predictions: Vec<(String, String)> = Vec::with_capacity(chosen.len());

    for chunk in chosen.chunks(opts.batch_size.max(1)) {
        let samples: Vec<QaSample> = chunk
            .iter()
            .map(|p| QaSample::from_pair(p, model.question_maxlen, model.context_maxlen))
            .collect();
        let lengths: Vec<usize> = samples.iter().map(QaSample::context_len).collect();
        let batch = batcher.batch(samples);
        let probs = SpanProbabilities::from_logits(model.forward_batch(&batch))?;

        for (i, (pair, len)) in chunk.iter().zip(lengths).enumerate() {
            let (start, end) = probs.row(i);
            let predicted = best_span(start, end, len, opts.max_answer_len)
                .map(|span| pair.span_text(span.start, span.end))
                .unwrap_or_default();
            predictions.push((predicted, pair.gold_answer()));
        }
    }

    let scores = AnswerScores::from_pairs(
        predictions.iter().map(|(p, t)| (p.as_str(), t.as_str())),
    );
    if log {
        tracing::info!("F1: {:.2}, EM: {:.2}, for {} samples", scores.f1, scores.em, scores.samples);
    }
    Ok(scores)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::dataset::QaDataset;
    use crate::ml::model::SpanQaConfig;
    use burn::{backend::NdArray, data::dataloader::DataLoaderBuilder};

    type B = NdArray;

    fn pairs() -> Vec<QaPair> {
        (0..5)
            .map(|i| {
                QaPair::new(vec![1 + i, 2], vec![3, 4, 5, 6], 1, 2)
                    .with_context_tokens(vec!["w".into(), "x".into(), "y".into(), "z".into()])
            })
            .collect()
    }

    fn opts(sample: usize) -> AnswerEvalOptions {
        AnswerEvalOptions { sample, batch_size: 2, max_answer_len: 3, seed: 3 }
    }

    #[test]
    fn test_evaluate_answer_scores_a_sample() {
        let device = Default::default();
        let model  = SpanQaConfig::new(10, 4, 3, 2, 4).init::<B>(&device);

        let scores = evaluate_answer(&model, &pairs(), opts(3), &device, false).unwrap();
        assert_eq!(scores.samples, 3);
        assert!((0.0..=100.0).contains(&scores.f1));
        assert!(scores.em <= scores.f1 + 1e-9);

        let all = evaluate_answer(&model, &pairs(), opts(0), &device, true).unwrap();
        assert_eq!(all.samples, 5);
    }

    #[test]
    fn test_validation_cost_over_loader() {
        let device = Default::default();
        let model  = SpanQaConfig::new(10, 4, 3, 2, 4).init::<B>(&device);
        let loader = DataLoaderBuilder::new(QaBatcher::<B>::new(device))
            .batch_size(2)
            .build(QaDataset::from_pairs(&pairs(), 2, 4));

        let report = validation_cost(&model, loader.iter());
        assert_eq!(report.samples, 5);
        assert!(report.loss.is_finite() && report.loss > 0.0);
        assert!((0.0..=1.0).contains(&report.start_acc));
    }

    #[test]
    fn test_validation_cost_of_nothing_is_nan() {
        let model  = SpanQaConfig::new(10, 4, 3, 2, 4).init::<B>(&Default::default());
        let report = validation_cost::<B, _>(&model, Vec::new());
        assert!(report.loss.is_nan());
        assert_eq!(report.samples, 0);
    }
}
