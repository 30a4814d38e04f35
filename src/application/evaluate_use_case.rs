// ============================================================
// Layer 2 — Evaluate Use Case
// ============================================================
// Scores a trained checkpoint on one split of the data dir:
//
//   Step 1: Rebuild the model from train_config.json + weights
//   Step 2: Load the split with the training length limits
//   Step 3: Validation cost and position accuracy
//   Step 4: SQuAD F1 / EM on a random sample (0 = whole split)

use anyhow::Result;
use burn::{data::dataloader::DataLoaderBuilder, prelude::Backend};
use std::path::Path;

use crate::application::train_use_case::TrainConfig;
use crate::data::{batcher::QaBatcher, dataset::QaDataset, squad::load_split};
use crate::domain::scoring::AnswerScores;
use crate::infra::checkpoint::CheckpointManager;
use crate::ml::{
    evaluator::{evaluate_answer, validation_cost, AnswerEvalOptions, ValidationReport},
    model::SpanQaModel,
};

#[derive(Debug, Clone)]
pub struct EvaluateConfig {
    pub data_dir:       String,
    pub checkpoint_dir: String,
    pub split:          String,
    pub sample:         usize,
}

#[derive(Debug, Clone, Copy)]
pub struct EvaluationReport {
    pub validation: ValidationReport,
    pub scores:     AnswerScores,
}

/// Loads the best checkpoint and scores it on one split
pub struct EvaluateUseCase {
    config: EvaluateConfig,
}

impl EvaluateUseCase {
    pub fn new(config: EvaluateConfig) -> Self {
        Self { config }
    }

    pub fn execute(&self) -> Result<EvaluationReport> {
        let device = burn::backend::wgpu::WgpuDevice::default();
        let ckpt = CheckpointManager::new(&self.config.checkpoint_dir);
        let (train_cfg, model) = ckpt.restore::<burn::backend::Wgpu>(&device)?;
        evaluate_split(&self.config, &train_cfg, &model, &device)
    }
}

/// Scores `model` on `cfg.split` using the lengths and vocabulary
/// recorded in `train_cfg`.
pub fn evaluate_split<B: Backend>(
    cfg:       &EvaluateConfig,
    train_cfg: &TrainConfig,
    model:     &SpanQaModel<B>,
    device:    &B::Device,
) -> Result<EvaluationReport> {
    let pairs = load_split(Path::new(&cfg.data_dir), &cfg.split, train_cfg.limits())?;
    if pairs.is_empty() {
        anyhow::bail!("Split '{}' has no examples within the model's lengths", cfg.split);
    }
    tracing::info!("Evaluating {} examples from '{}'", pairs.len(), cfg.split);

    let loader = DataLoaderBuilder::new(QaBatcher::<B>::new(device.clone()))
        .batch_size(train_cfg.batch_size.max(1))
        .build(QaDataset::from_pairs(&pairs, train_cfg.question_maxlen, train_cfg.context_maxlen));
    let validation = validation_cost(model, loader.iter());

    let opts = AnswerEvalOptions {
        sample:         cfg.sample,
        batch_size:     train_cfg.batch_size.max(1),
        max_answer_len: train_cfg.max_answer_len,
        seed:           train_cfg.seed,
    };
    let scores = evaluate_answer(model, &pairs, opts, device, true)?;

    Ok(EvaluationReport { validation, scores })
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;
    use std::fs;

    type B = NdArray;

    fn write_split(dir: &Path) {
        fs::write(dir.join("val.ids.question"), "3 4\n5\n3 5 4\n").unwrap();
        fs::write(dir.join("val.ids.context"), "6 7 8\n6 6 7 8\n8 7\n").unwrap();
        fs::write(dir.join("val.span"), "0 1\n2 3\n1 1\n").unwrap();
    }

    fn train_cfg() -> TrainConfig {
        TrainConfig {
            vocab_size:      10,
            embedding_size:  4,
            state_size:      3,
            question_maxlen: 3,
            context_maxlen:  4,
            batch_size:      2,
            max_answer_len:  2,
            ..Default::default()
        }
    }

    #[test]
    fn test_evaluate_split_reports_cost_and_scores() {
        let dir = tempfile::tempdir().unwrap();
        write_split(dir.path());
        let cfg = EvaluateConfig {
            data_dir:       dir.path().display().to_string(),
            checkpoint_dir: String::new(),
            split:          "val".to_string(),
            sample:         0,
        };
        let device = Default::default();
        let model  = train_cfg().model_config().init::<B>(&device);

        let report = evaluate_split(&cfg, &train_cfg(), &model, &device).unwrap();
        assert_eq!(report.validation.samples, 3);
        assert_eq!(report.scores.samples, 3);
        assert!(report.validation.loss.is_finite());
        assert!((0.0..=100.0).contains(&report.scores.em));
    }

    #[test]
    fn test_ids_beyond_the_model_vocabulary_are_an_error() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("val.ids.question"), "3 4\n").unwrap();
        fs::write(dir.path().join("val.ids.context"), "6 50 8\n").unwrap();
        fs::write(dir.path().join("val.span"), "0 1\n").unwrap();
        let cfg = EvaluateConfig {
            data_dir:       dir.path().display().to_string(),
            checkpoint_dir: String::new(),
            split:          "val".to_string(),
            sample:         0,
        };
        let device = Default::default();
        let model  = train_cfg().model_config().init::<B>(&device);

        let err = evaluate_split(&cfg, &train_cfg(), &model, &device).unwrap_err();
        assert!(err.to_string().contains("val.ids.context:1:"));
    }

    #[test]
    fn test_missing_split_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = EvaluateConfig {
            data_dir:       dir.path().display().to_string(),
            checkpoint_dir: String::new(),
            split:          "val".to_string(),
            sample:         10,
        };
        let device = Default::default();
        let model  = train_cfg().model_config().init::<B>(&device);
        assert!(evaluate_split(&cfg, &train_cfg(), &model, &device).is_err());
    }
}
