// ============================================================
// Layer 4 — Pretrained Word Embeddings
// ============================================================
// Builds an embedding matrix [vocab_size, dim] aligned with the
// vocabulary from a GloVe-format text file:
//
//   the 0.418 0.24968 -0.41242 ...
//   river -0.2194 0.0119 ...
//
// Rows for vocabulary words absent from the file are drawn from
// U(-0.1, 0.1); the <pad> row is all zeros.
//
// Reference: Pennington et al. (2014) GloVe

use anyhow::{Context, Result};
use rand::{rngs::StdRng, Rng, SeedableRng};
use std::{
    fs::File,
    io::{BufRead, BufReader},
    path::Path,
};

use crate::data::vocab::{Vocabulary, PAD_ID};

const INIT_RANGE: f32 = 0.1;

/// Row-major [vocab_size, dim] matrix ready for `TensorData::new`
#[derive(Debug, Clone)]
pub struct EmbeddingMatrix {
    pub values:     Vec<f32>,
    pub vocab_size: usize,
    pub dim:        usize,
    /// How many vocabulary words had a pretrained vector
    pub found:      usize,
}

/// Aligns the GloVe vectors in `path` with `vocab`. Rows with no
/// vector are seeded random; a line of the wrong width is an error.
pub fn load_glove(path: &Path, vocab: &Vocabulary, dim: usize, seed: u64) -> Result<EmbeddingMatrix> {
    let file = File::open(path)
        .with_context(|| format!("Cannot open embeddings '{}'", path.display()))?;

    let vocab_size = vocab.len();
    let mut rng    = StdRng::seed_from_u64(seed);
    let mut values: Vec<f32> = (0..vocab_size * dim)
        .map(|_| rng.gen_range(-INIT_RANGE..INIT_RANGE))
        .collect();
    let mut seen = vec![false; vocab_size];
    let mut found = 0usize;

    for (i, line) in BufReader::new(file).lines().enumerate() {
        let line = line.with_context(|| format!("Cannot read '{}'", path.display()))?;
        let mut parts = line.split(' ');
        let Some(word) = parts.next() else { continue };
        let Some(id) = vocab.id(word) else { continue };
        let id = id as usize;
        if seen[id] {
            continue;
        }

        let row: Vec<f32> = parts
            .filter(|p| !p.is_empty())
            .map(|p| {
                p.parse::<f32>().with_context(|| {
                    format!("{}:{}: bad value '{}'", path.display(), i + 1, p)
                })
            })
            .collect::<Result<_>>()?;
        if row.len() != dim {
            anyhow::bail!(
                "{}:{}: expected {} values for '{}', found {}",
                path.display(), i + 1, dim, word, row.len()
            );
        }

        values[id * dim..(id + 1) * dim].copy_from_slice(&row);
        seen[id] = true;
        found   += 1;
    }

    let pad = PAD_ID as usize;
    if pad < vocab_size {
        values[pad * dim..(pad + 1) * dim].fill(0.0);
    }

    tracing::info!(
        "Pretrained vectors for {}/{} vocabulary words ({}-d)",
        found, vocab_size, dim
    );
    Ok(EmbeddingMatrix { values, vocab_size, dim, found })
}
