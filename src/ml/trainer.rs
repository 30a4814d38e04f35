// ============================================================
// Layer 5 — Training Loop
// ============================================================
// Train + validate with Burn's DataLoader and a chosen optimiser.
//
//   - Training runs on Autodiff<B>; model.valid() gives the same
//     weights on the inner backend for validation and F1 / EM
//   - The learning rate follows ExponentialDecay by global step
//   - Every epoch is checkpointed; the epoch with the best
//     validation F1 is marked so evaluate / ask load it
//   - `patience` epochs without F1 improvement stop the run
//
// Reference: Burn Book §5, Kingma & Ba (2015) Adam

use anyhow::Result;
use burn::{
    data::dataloader::DataLoaderBuilder,
    grad_clipping::GradientClippingConfig,
    module::AutodiffModule,
    optim::{AdamConfig, GradientsParams, Optimizer, SgdConfig},
    prelude::*,
    tensor::backend::AutodiffBackend,
};

use crate::application::train_use_case::TrainConfig;
use crate::data::{batcher::QaBatcher, dataset::QaDataset, embeddings::EmbeddingMatrix};
use crate::domain::qa_pair::QaPair;
use crate::infra::{
    checkpoint::CheckpointManager,
    metrics::{EpochMetrics, MetricsLogger},
};
use crate::ml::{
    evaluator::{evaluate_answer, validation_cost, AnswerEvalOptions},
    model::SpanQaModel,
    optim::OptimizerKind,
};

type TrainBackend = burn::backend::Autodiff<burn::backend::Wgpu>;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrainSummary {
    pub epochs_run: usize,
    pub best_epoch: usize,
    pub best_f1:    f64,
}

/// Trains on the default WGPU device
pub fn run_training(
    cfg:          &TrainConfig,
    train:        &[QaPair],
    val:          &[QaPair],
    embeddings:   Option<&EmbeddingMatrix>,
    ckpt_manager: &CheckpointManager,
) -> Result<TrainSummary> {
    let device = burn::backend::wgpu::WgpuDevice::default();
    tracing::info!("Using WGPU device: {:?}", device);
    train_loop::<TrainBackend>(cfg, train, val, embeddings, ckpt_manager, device)
}

/// Builds the model and optimiser named in `cfg` and trains on `device`.
/// Checkpoints and metrics.csv go to `ckpt_manager`'s directory.
pub fn train_loop<B: AutodiffBackend>(
    cfg:          &TrainConfig,
    train:        &[QaPair],
    val:          &[QaPair],
    embeddings:   Option<&EmbeddingMatrix>,
    ckpt_manager: &CheckpointManager,
    device:       B::Device,
) -> Result<TrainSummary> {
    // ── Build model ───────────────────────────────────────────────────────────
    let model_cfg = cfg.model_config();
    let model: SpanQaModel<B> = match embeddings {
        Some(vectors) => model_cfg.init_with_embeddings(&device, vectors, cfg.retrain_embeddings)?,
        None          => model_cfg.init(&device),
    };
    tracing::info!(
        "Model ready: {} trainable parameters (state_size={}, embedding_size={})",
        model.num_params(), cfg.state_size, cfg.embedding_size,
    );

    // ── Optimiser ─────────────────────────────────────────────────────────────
    let clipping = cfg.max_grad_norm.map(GradientClippingConfig::Norm);
    match cfg.optimizer {
        OptimizerKind::Adam => {
            let optim = AdamConfig::new()
                .with_epsilon(1e-8)
                .with_grad_clipping(clipping)
                .init::<B, SpanQaModel<B>>();
            fit(cfg, model, optim, train, val, ckpt_manager, device)
        }
        OptimizerKind::Sgd => {
            let optim = SgdConfig::new()
                .with_gradient_clipping(clipping)
                .init::<B, SpanQaModel<B>>();
            fit(cfg, model, optim, train, val, ckpt_manager, device)
        }
    }
}

fn fit<B, O>(
    cfg:          &TrainConfig,
    mut model:    SpanQaModel<B>,
    mut optim:    O,
    train:        &[QaPair],
    val:          &[QaPair],
    ckpt_manager: &CheckpointManager,
    device:       B::Device,
) -> Result<TrainSummary>
where
    B: AutodiffBackend,
    O: Optimizer<SpanQaModel<B>, B>,
{
    let schedule = cfg.learning_rate_schedule();
    let metrics  = MetricsLogger::new(&cfg.checkpoint_dir)?;
    let eval_opts = AnswerEvalOptions {
        sample:         cfg.eval_sample,
        batch_size:     cfg.batch_size,
        max_answer_len: cfg.max_answer_len,
        seed:           cfg.seed,
    };

    let train_dataset = QaDataset::from_pairs(train, cfg.question_maxlen, cfg.context_maxlen);
    let val_dataset   = QaDataset::from_pairs(val, cfg.question_maxlen, cfg.context_maxlen);
    tracing::info!(
        "{} training / {} validation samples, batch size {}",
        train_dataset.sample_count(), val_dataset.sample_count(), cfg.batch_size,
    );

    // ── Training data loader (AutodiffBackend) ────────────────────────────────
    let train_loader = DataLoaderBuilder::new(QaBatcher::<B>::new(device.clone()))
        .batch_size(cfg.batch_size)
        .shuffle(cfg.seed)
        .num_workers(1)
        .build(train_dataset);

    // ── Validation data loader (InnerBackend — no autodiff overhead) ──────────
    let val_loader = DataLoaderBuilder::new(QaBatcher::<B::InnerBackend>::new(device.clone()))
        .batch_size(cfg.batch_size)
        .num_workers(1)
        .build(val_dataset);

    let mut step        = 0usize;
    let mut best_f1     = f64::NEG_INFINITY;
    let mut best_epoch  = 0usize;
    let mut stale       = 0usize;
    let mut epochs_run  = 0usize;

    // ── Epoch loop ────────────────────────────────────────────────────────────
    for epoch in 1..=cfg.epochs {
        epochs_run = epoch;

        // ── Training phase ────────────────────────────────────────────────────
        let mut loss_sum = 0.0f64;
        let mut batches  = 0usize;

        for batch in train_loader.iter() {
            let (loss, _) = model.forward_loss(&batch);
            loss_sum += loss.clone().into_scalar().elem::<f64>();
            batches  += 1;

            let lr    = schedule.at(step);
            let grads = GradientsParams::from_grads(loss.backward(), &model);
            model = optim.step(lr, model, grads);
            step += 1;

            if cfg.print_every > 0 && batches % cfg.print_every == 0 {
                tracing::info!(
                    "Epoch {} batch {} | loss={:.4} | lr={:.2e}",
                    epoch, batches, loss_sum / batches as f64, lr,
                );
            }
        }
        let train_loss = if batches > 0 { loss_sum / batches as f64 } else { f64::NAN };

        // ── Validation phase ──────────────────────────────────────────────────
        let model_valid = model.valid();
        let report = validation_cost(&model_valid, val_loader.iter());

        tracing::info!("Evaluating answers on train");
        let train_scores = evaluate_answer(&model_valid, train, eval_opts, &device, true)?;
        tracing::info!("Evaluating answers on val");
        let val_scores = evaluate_answer(&model_valid, val, eval_opts, &device, true)?;

        tracing::info!(
            "Epoch {:>3}/{} | train_loss={:.4} | val_loss={:.4} | start_acc={:.1}% | end_acc={:.1}% | val_f1={:.2} | val_em={:.2}",
            epoch, cfg.epochs, train_loss, report.loss,
            report.start_acc * 100.0, report.end_acc * 100.0,
            val_scores.f1, val_scores.em,
        );

        // ── Checkpoint + metrics ──────────────────────────────────────────────
        ckpt_manager.save_model(&model, epoch)?;

        let row = EpochMetrics {
            epoch,
            train_loss,
            val_loss:  report.loss,
            start_acc: report.start_acc,
            end_acc:   report.end_acc,
            train_f1:  train_scores.f1,
            train_em:  train_scores.em,
            val_f1:    val_scores.f1,
            val_em:    val_scores.em,
        };
        metrics.log(&row)?;

        if row.is_improvement(best_f1) {
            best_f1    = row.val_f1;
            best_epoch = epoch;
            stale      = 0;
            ckpt_manager.mark_best(epoch)?;
            tracing::info!("New best validation F1 {:.2} at epoch {}", best_f1, epoch);
        } else {
            stale += 1;
            if cfg.patience > 0 && stale >= cfg.patience {
                tracing::info!("No F1 improvement for {} epochs, stopping early", stale);
                break;
            }
        }
    }

    tracing::info!("Training complete! Best epoch {} (val F1 {:.2})", best_epoch, best_f1);
    tracing::info!("Metrics written to '{}'", metrics.csv_path().display());
    Ok(TrainSummary { epochs_run, best_epoch, best_f1 })
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::{Autodiff, NdArray};
    use std::fs;

    type B = Autodiff<NdArray>;

    fn pairs(n: u32) -> Vec<QaPair> {
        (0..n)
            .map(|i| QaPair::new(vec![1 + i % 3, 2], vec![3, 4, 5, 6, 7], 1 + (i % 2) as usize, 2))
            .collect()
    }

    fn config(dir: &std::path::Path) -> TrainConfig {
        TrainConfig {
            checkpoint_dir:  dir.display().to_string(),
            vocab_size:      10,
            embedding_size:  4,
            state_size:      3,
            question_maxlen: 2,
            context_maxlen:  5,
            batch_size:      2,
            epochs:          2,
            max_answer_len:  3,
            eval_sample:     4,
            print_every:     1,
            dropout:         0.0,
            ..Default::default()
        }
    }

    #[test]
    fn test_train_loop_checkpoints_and_logs_every_epoch() {
        let dir  = tempfile::tempdir().unwrap();
        let cfg  = config(dir.path());
        let ckpt = CheckpointManager::new(&cfg.checkpoint_dir);

        let summary = train_loop::<B>(&cfg, &pairs(6), &pairs(3), None, &ckpt, Default::default()).unwrap();
        assert_eq!(summary.epochs_run, 2);
        assert!(summary.best_epoch >= 1);

        let csv = fs::read_to_string(dir.path().join("metrics.csv")).unwrap();
        assert_eq!(csv.lines().count(), 3);
        assert!(dir.path().join("best_epoch.json").exists());
        assert!(dir.path().join("latest_epoch.json").exists());
    }

    #[test]
    fn test_patience_stops_early_with_sgd() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = TrainConfig {
            epochs:        5,
            patience:      1,
            optimizer:     OptimizerKind::Sgd,
            learning_rate: 0.0,
            ..config(dir.path())
        };
        let ckpt = CheckpointManager::new(&cfg.checkpoint_dir);

        // lr = 0 keeps the weights fixed, so F1 never improves after epoch 1
        let summary = train_loop::<B>(&cfg, &pairs(4), &pairs(2), None, &ckpt, Default::default()).unwrap();
        assert_eq!(summary.best_epoch, 1);
        assert_eq!(summary.epochs_run, 2);
    }
}
