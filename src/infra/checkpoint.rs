// ============================================================
// Layer 6 — Checkpoint Manager
// ============================================================
// Saves and restores model weights using Burn's CompactRecorder.
//
// File naming convention:
//   checkpoints/
//     model_epoch_1.mpk.gz   ← weights after epoch 1
//     model_epoch_2.mpk.gz   ← weights after epoch 2
//     ...
//     latest_epoch.json      ← number of the last saved epoch
//     best_epoch.json        ← epoch with the best validation F1
//     train_config.json      ← hyperparameters, used to rebuild
//                              the model before loading weights
//
// Loading prefers the best epoch and falls back to the latest.
//
// Reference: Burn Book §5 (Records and Checkpointing)

use anyhow::{Context, Result};
use std::{fs, path::PathBuf};
use burn::{
    prelude::*,
    record::{CompactRecorder, Recorder},
};

use crate::application::train_use_case::TrainConfig;
use crate::ml::model::SpanQaModel;

const LATEST_FILE: &str = "latest_epoch.json";
const BEST_FILE:   &str = "best_epoch.json";
const CONFIG_FILE: &str = "train_config.json";

pub struct CheckpointManager {
    dir: PathBuf,
}

impl CheckpointManager {
    /// Creates the directory if it doesn't already exist.
    pub fn new(dir: impl Into<String>) -> Self {
        let dir = PathBuf::from(dir.into());
        if let Err(e) = fs::create_dir_all(&dir) {
            tracing::warn!("Cannot create checkpoint dir '{}': {}", dir.display(), e);
        }
        Self { dir }
    }

    /// Write `{dir}/model_epoch_{epoch}.mpk.gz` and point
    /// latest_epoch.json at it.
    pub fn save_model<B: Backend>(&self, model: &SpanQaModel<B>, epoch: usize) -> Result<()> {
        let path = self.epoch_path(epoch);

        CompactRecorder::new()
            .record(model.clone().into_record(), path.clone())
            .with_context(|| format!("Failed to save checkpoint to '{}'", path.display()))?;

        self.write_epoch(LATEST_FILE, epoch)?;
        tracing::debug!("Saved checkpoint: epoch {}", epoch);
        Ok(())
    }

    pub fn mark_best(&self, epoch: usize) -> Result<()> {
        self.write_epoch(BEST_FILE, epoch)
    }

    /// Load the best epoch's weights (else the latest) into `model`.
    pub fn load_model<B: Backend>(
        &self,
        model:  SpanQaModel<B>,
        device: &B::Device,
    ) -> Result<SpanQaModel<B>> {
        let epoch = match self.best_epoch()? {
            Some(epoch) => epoch,
            None        => self.latest_epoch()?,
        };
        self.load_epoch(model, epoch, device)
    }

    pub fn load_epoch<B: Backend>(
        &self,
        model:  SpanQaModel<B>,
        epoch:  usize,
        device: &B::Device,
    ) -> Result<SpanQaModel<B>> {
        let path = self.epoch_path(epoch);
        tracing::info!("Loading checkpoint from epoch {}", epoch);

        let record = CompactRecorder::new()
            .load(path.clone(), device)
            .with_context(|| {
                format!("Cannot load checkpoint '{}'. Have you trained the model first?",
                    path.display())
            })?;

        Ok(model.load_record(record))
    }

    /// Rebuild the trained model from train_config.json plus the
    /// preferred checkpoint. Dropout is off.
    pub fn restore<B: Backend>(&self, device: &B::Device) -> Result<(TrainConfig, SpanQaModel<B>)> {
        let cfg   = self.load_config()?;
        let model = cfg.model_config().with_dropout(0.0).init::<B>(device);
        let model = self.load_model(model, device)?;
        Ok((cfg, model))
    }

    /// Must be called before training starts.
    pub fn save_config(&self, cfg: &TrainConfig) -> Result<()> {
        let path = self.dir.join(CONFIG_FILE);
        let json = serde_json::to_string_pretty(cfg)?;

        fs::write(&path, json)
            .with_context(|| format!("Cannot write config to '{}'", path.display()))?;

        tracing::debug!("Saved training config to '{}'", path.display());
        Ok(())
    }

    pub fn load_config(&self) -> Result<TrainConfig> {
        let path = self.dir.join(CONFIG_FILE);

        let json = fs::read_to_string(&path)
            .with_context(|| {
                format!(
                    "Cannot read config from '{}'. \
                     Make sure you have run 'train' first.",
                    path.display()
                )
            })?;

        serde_json::from_str(&json)
            .with_context(|| format!("Malformed config '{}'", path.display()))
    }

    pub fn best_epoch(&self) -> Result<Option<usize>> {
        let path = self.dir.join(BEST_FILE);
        if !path.exists() {
            return Ok(None);
        }
        self.read_epoch(BEST_FILE).map(Some)
    }

    fn latest_epoch(&self) -> Result<usize> {
        self.read_epoch(LATEST_FILE)
            .context("No checkpoint found. Have you run 'train' first?")
    }

    fn epoch_path(&self, epoch: usize) -> PathBuf {
        // The recorder appends its own extension
        self.dir.join(format!("model_epoch_{epoch}"))
    }

    fn write_epoch(&self, file: &str, epoch: usize) -> Result<()> {
        let path = self.dir.join(file);
        fs::write(&path, serde_json::to_string(&epoch)?)
            .with_context(|| format!("Failed to write '{}'", path.display()))
    }

    fn read_epoch(&self, file: &str) -> Result<usize> {
        let path = self.dir.join(file);
        let s = fs::read_to_string(&path)
            .with_context(|| format!("Cannot read '{}'", path.display()))?;
        serde_json::from_str::<usize>(s.trim())
            .with_context(|| format!("Malformed epoch pointer '{}'", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type B = NdArray;

    fn config(dir: &std::path::Path) -> TrainConfig {
        TrainConfig {
            checkpoint_dir:  dir.display().to_string(),
            vocab_size:      8,
            embedding_size:  3,
            state_size:      2,
            question_maxlen: 2,
            context_maxlen:  4,
            ..Default::default()
        }
    }

    fn embedding_weights(model: &SpanQaModel<B>) -> Vec<f32> {
        model.embedding.weight.val().into_data().convert::<f32>().to_vec().unwrap()
    }

    // CompactRecorder stores half precision
    fn max_diff(a: &SpanQaModel<B>, b: &SpanQaModel<B>) -> f32 {
        embedding_weights(a)
            .iter()
            .zip(embedding_weights(b))
            .map(|(x, y)| (x - y).abs())
            .fold(0.0, f32::max)
    }

    #[test]
    fn test_config_roundtrip() {
        let dir  = tempfile::tempdir().unwrap();
        let ckpt = CheckpointManager::new(dir.path().display().to_string());
        ckpt.save_config(&config(dir.path())).unwrap();

        let back = ckpt.load_config().unwrap();
        assert_eq!(back.vocab_size, 8);
        assert_eq!(back.context_maxlen, 4);
    }

    #[test]
    fn test_missing_checkpoint_is_an_error() {
        let dir  = tempfile::tempdir().unwrap();
        let ckpt = CheckpointManager::new(dir.path().display().to_string());
        let model = config(dir.path()).model_config().init::<B>(&Default::default());
        assert!(ckpt.load_model(model, &Default::default()).is_err());
        assert!(ckpt.load_config().is_err());
    }

    #[test]
    fn test_restore_prefers_best_epoch() {
        let dir    = tempfile::tempdir().unwrap();
        let device = Default::default();
        let cfg    = config(dir.path());
        let ckpt   = CheckpointManager::new(&cfg.checkpoint_dir);
        ckpt.save_config(&cfg).unwrap();

        let first  = cfg.model_config().init::<B>(&device);
        let second = cfg.model_config().init::<B>(&device);
        ckpt.save_model(&first, 1).unwrap();
        ckpt.mark_best(1).unwrap();
        ckpt.save_model(&second, 2).unwrap();

        assert_eq!(ckpt.best_epoch().unwrap(), Some(1));
        let (_, restored) = ckpt.restore::<B>(&device).unwrap();
        assert!(max_diff(&restored, &first) < 1e-2);
        assert!(max_diff(&restored, &second) > 0.1);
    }

    #[test]
    fn test_load_falls_back_to_latest() {
        let dir    = tempfile::tempdir().unwrap();
        let device = Default::default();
        let cfg    = config(dir.path());
        let ckpt   = CheckpointManager::new(&cfg.checkpoint_dir);

        let saved = cfg.model_config().init::<B>(&device);
        ckpt.save_model(&saved, 3).unwrap();
        assert_eq!(ckpt.best_epoch().unwrap(), None);

        let fresh  = cfg.model_config().init::<B>(&device);
        assert!(max_diff(&fresh, &saved) > 0.1);
        let loaded = ckpt.load_model(fresh, &device).unwrap();
        assert!(max_diff(&loaded, &saved) < 1e-2);
    }
}
