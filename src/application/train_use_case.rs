// ============================================================
// Layer 2 — TrainUseCase
// ============================================================
// Orchestrates the full training pipeline in order:
//
//   Step 1: Load the vocabulary          (Layer 4 - data)
//   Step 2: Load train / val splits      (Layer 4 - data)
//   Step 3: Load pretrained embeddings   (Layer 4 - data, optional)
//   Step 4: Save config + tokenizer      (Layer 6 - infra)
//   Step 5: Run training loop            (Layer 5 - ml)
//
// Reference: Burn Book §5 (Training)

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::data::{
    embeddings::load_glove,
    splitter::split_train_val,
    squad::{load_split, split_exists, SplitLimits},
    vocab::Vocabulary,
};
use crate::infra::{checkpoint::CheckpointManager, tokenizer_store::TokenizerStore};
use crate::ml::{
    model::SpanQaConfig,
    optim::{ExponentialDecay, OptimizerKind},
    trainer::{run_training, TrainSummary},
};

const VOCAB_FILE: &str = "vocab.dat";
const TRAIN_FRACTION: f64 = 0.8;

// ─── Training Configuration ──────────────────────────────────────────────────
// All hyperparameters for a training run. Saved next to the
// checkpoints so evaluation and inference rebuild the same model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainConfig {
    pub data_dir:           String,
    pub checkpoint_dir:     String,
    pub embed_path:         Option<String>,
    pub embedding_size:     usize,
    pub state_size:         usize,
    pub question_maxlen:    usize,
    pub context_maxlen:     usize,
    pub batch_size:         usize,
    pub epochs:             usize,
    pub learning_rate:      f64,
    pub optimizer:          OptimizerKind,
    pub max_grad_norm:      Option<f32>,
    pub decay_rate:         f64,
    pub decay_steps:        usize,
    pub staircase:          bool,
    pub dropout:            f64,
    pub retrain_embeddings: bool,
    pub max_answer_len:     usize,
    pub eval_sample:        usize,
    pub print_every:        usize,
    pub patience:           usize,
    pub seed:               u64,
    /// Filled in from vocab.dat before the config is saved
    pub vocab_size:         usize,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            data_dir:           "data/squad".to_string(),
            checkpoint_dir:     "checkpoints".to_string(),
            embed_path:         None,
            embedding_size:     100,
            state_size:         100,
            question_maxlen:    30,
            context_maxlen:     300,
            batch_size:         32,
            epochs:             10,
            learning_rate:      1e-3,
            optimizer:          OptimizerKind::Adam,
            max_grad_norm:      Some(10.0),
            decay_rate:         1.0,
            decay_steps:        1000,
            staircase:          false,
            dropout:            0.15,
            retrain_embeddings: false,
            max_answer_len:     15,
            eval_sample:        100,
            print_every:        100,
            patience:           0,
            seed:               42,
            vocab_size:         0,
        }
    }
}

impl TrainConfig {
    pub fn model_config(&self) -> SpanQaConfig {
        SpanQaConfig::new(
            self.vocab_size,
            self.embedding_size,
            self.state_size,
            self.question_maxlen,
            self.context_maxlen,
        )
        .with_dropout(self.dropout)
    }

    pub fn limits(&self) -> SplitLimits {
        SplitLimits {
            question_maxlen: self.question_maxlen,
            context_maxlen:  self.context_maxlen,
            vocab_size:      self.vocab_size,
        }
    }

    pub fn learning_rate_schedule(&self) -> ExponentialDecay {
        ExponentialDecay {
            initial:   self.learning_rate,
            rate:      self.decay_rate,
            steps:     self.decay_steps,
            staircase: self.staircase,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            anyhow::bail!("batch_size must be at least 1");
        }
        if self.question_maxlen == 0 || self.context_maxlen == 0 {
            anyhow::bail!("question_maxlen and context_maxlen must be positive");
        }
        if !(0.0..1.0).contains(&self.dropout) {
            anyhow::bail!("dropout must be in [0, 1), got {}", self.dropout);
        }
        if self.decay_rate <= 0.0 {
            anyhow::bail!("decay_rate must be positive, got {}", self.decay_rate);
        }
        if self.max_answer_len == 0 {
            anyhow::bail!("max_answer_len must be at least 1");
        }
        Ok(())
    }
}

// ─── TrainUseCase ─────────────────────────────────────────────────────────────
/// Runs a full training job from a `TrainConfig`
pub struct TrainUseCase {
    config: TrainConfig,
}

impl TrainUseCase {
    pub fn new(config: TrainConfig) -> Self {
        Self { config }
    }

    pub fn execute(&self) -> Result<TrainSummary> {
        let mut cfg = self.config.clone();
        cfg.validate()?;
        let data_dir = Path::new(&cfg.data_dir);

        // ── Step 1: Vocabulary ───────────────────────────────────────────────
        let vocab = Vocabulary::load(&data_dir.join(VOCAB_FILE))?;
        cfg.vocab_size = vocab.len();

        // ── Step 2: Splits ───────────────────────────────────────────────────
        tracing::info!("Loading SQuAD splits from '{}'", cfg.data_dir);
        let train = load_split(data_dir, "train", cfg.limits())?;
        let (train, val) = if split_exists(data_dir, "val") {
            (train, load_split(data_dir, "val", cfg.limits())?)
        } else {
            tracing::info!("No val split found, holding out {:.0}% of train", (1.0 - TRAIN_FRACTION) * 100.0);
            split_train_val(train, TRAIN_FRACTION, cfg.seed)
        };
        if train.is_empty() {
            anyhow::bail!("No training examples fit within the configured lengths");
        }
        tracing::info!("Split: {} train, {} validation", train.len(), val.len());

        // ── Step 3: Pretrained embeddings ────────────────────────────────────
        let embeddings = match &cfg.embed_path {
            Some(path) => {
                let matrix = load_glove(Path::new(path), &vocab, cfg.embedding_size, cfg.seed)?;
                if matrix.found == 0 {
                    tracing::warn!("No vocabulary word has a vector in '{}'", path);
                }
                Some(matrix)
            }
            None => None,
        };

        // ── Step 4: Persist what inference needs ─────────────────────────────
        let ckpt_manager = CheckpointManager::new(&cfg.checkpoint_dir);
        ckpt_manager.save_config(&cfg)?;
        TokenizerStore::new(&cfg.checkpoint_dir).build_and_save(&vocab)?;

        // ── Step 5: Training loop (Layer 5) ──────────────────────────────────
        run_training(&cfg, &train, &val, embeddings.as_ref(), &ckpt_manager)
    }
}
