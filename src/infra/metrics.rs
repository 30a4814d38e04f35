// ============================================================
// Layer 6 — Metrics Logger
// ============================================================
// Records training metrics to a CSV file after each epoch.
//
// Metrics recorded per epoch:
//   - train_loss / val_loss: mean cross-entropy per batch
//   - start_acc / end_acc:   fraction of exact position hits
//   - train_f1 / train_em:   sampled SQuAD scores on train (0..100)
//   - val_f1 / val_em:       sampled SQuAD scores on val (0..100)
//
// Output file: checkpoints/metrics.csv
//
//   epoch,train_loss,val_loss,start_acc,end_acc,train_f1,train_em,val_f1,val_em
//   1,5.124500,5.089200,0.123000,0.118000,21.50,12.00,19.75,11.00
//
// A train F1 far above val F1 means the model is overfitting.

use anyhow::{Context, Result};
use std::{
    fs::{self, OpenOptions},
    io::Write,
    path::PathBuf,
};
use serde::{Deserialize, Serialize};

const HEADER: &str = "epoch,train_loss,val_loss,start_acc,end_acc,train_f1,train_em,val_f1,val_em";

/// One row of metrics data for a single training epoch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EpochMetrics {
    pub epoch:      usize,
    pub train_loss: f64,
    pub val_loss:   f64,
    pub start_acc:  f64,
    pub end_acc:    f64,
    pub train_f1:   f64,
    pub train_em:   f64,
    pub val_f1:     f64,
    pub val_em:     f64,
}

impl EpochMetrics {
    /// True if this epoch beats the best validation F1 so far
    pub fn is_improvement(&self, best_val_f1: f64) -> bool {
        self.val_f1 > best_val_f1
    }
}

/// Appends epoch metrics to `metrics.csv`.
pub struct MetricsLogger {
    csv_path: PathBuf,
}

impl MetricsLogger {
    /// Writes the CSV header if the file doesn't exist yet.
    pub fn new(dir: impl Into<String>) -> Result<Self> {
        let dir = PathBuf::from(dir.into());
        fs::create_dir_all(&dir)
            .with_context(|| format!("Cannot create '{}'", dir.display()))?;

        let csv_path = dir.join("metrics.csv");
        if !csv_path.exists() {
            let mut f = fs::File::create(&csv_path)
                .with_context(|| format!("Cannot create '{}'", csv_path.display()))?;
            writeln!(f, "{HEADER}")?;
            tracing::debug!("Created metrics CSV: '{}'", csv_path.display());
        }

        Ok(Self { csv_path })
    }

    pub fn log(&self, m: &EpochMetrics) -> Result<()> {
        let mut f = OpenOptions::new()
            .append(true)
            .open(&self.csv_path)
            .with_context(|| format!("Cannot open '{}'", self.csv_path.display()))?;

        writeln!(
            f,
            "{},{:.6},{:.6},{:.6},{:.6},{:.2},{:.2},{:.2},{:.2}",
            m.epoch,
            m.train_loss,
            m.val_loss,
            m.start_acc,
            m.end_acc,
            m.train_f1,
            m.train_em,
            m.val_f1,
            m.val_em,
        )?;

        tracing::debug!(
            "Logged epoch {} metrics: train_loss={:.4}, val_loss={:.4}, val_f1={:.2}",
            m.epoch,
            m.train_loss,
            m.val_loss,
            m.val_f1,
        );

        Ok(())
    }

    pub fn csv_path(&self) -> &PathBuf {
        &self.csv_path
    }
}
