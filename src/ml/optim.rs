// ============================================================
// Layer 5 — Optimiser Selection and Learning-Rate Decay
// ============================================================
// Two optimisers are supported, chosen by name:
//   "adam" → burn::optim::Adam
//   "sgd"  → burn::optim::Sgd
//
// The learning rate decays exponentially with the global step:
//   lr(step) = lr0 · rate^(step / steps)
// With `staircase` the exponent is floored, so the rate drops in
// discrete jumps every `steps` batches. rate = 1.0 keeps lr0.

use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptimizerKind {
    Adam,
    Sgd,
}

impl FromStr for OptimizerKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "adam" => Ok(Self::Adam),
            "sgd"  => Ok(Self::Sgd),
            other  => anyhow::bail!("unknown optimizer '{other}' (expected 'adam' or 'sgd')"),
        }
    }
}

impl fmt::Display for OptimizerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Adam => f.write_str("adam"),
            Self::Sgd  => f.write_str("sgd"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExponentialDecay {
    pub initial:   f64,
    pub rate:      f64,
    pub steps:     usize,
    pub staircase: bool,
}

impl ExponentialDecay {
    /// Learning rate for the batch at global `step` (0-based)
    pub fn at(&self, step: usize) -> f64 {
        if self.steps == 0 || self.rate == 1.0 {
            return self.initial;
        }
        let exponent = step as f64 / self.steps as f64;
        let exponent = if self.staircase { exponent.floor() } else { exponent };
        self.initial * self.rate.powf(exponent)
    }
}
