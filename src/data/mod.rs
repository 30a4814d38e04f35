// ============================================================
// Layer 4 — Data Pipeline
// ============================================================
// Training data flows:
//
//   {split}.ids.* / .span files
//       │
//       ▼
//   squad::load_split   → QaPairs, oversized examples dropped
//       │
//       ▼
//   QaDataset           → padded QaSamples (Burn Dataset)
//       │
//       ▼
//   QaBatcher           → [N, JQ] / [N, JX] tensors (Burn Batcher)
//
// Alongside: vocab.dat (Vocabulary), GloVe vectors (embeddings),
// and, for `ask`, free-text documents (loader → preprocessor →
// chunker).
//
// Reference: Burn Book §4 (Datasets and Dataloaders)

/// Reads vocab.dat
pub mod vocab;

/// Reads one split of a preprocessed SQuAD directory
pub mod squad;

/// Builds an embedding matrix from GloVe vectors
pub mod embeddings;

/// Loads .txt / .docx passages for `ask`
pub mod loader;

/// Cleans free text and splits it into words
pub mod preprocessor;

/// Splits long token sequences into overlapping windows
pub mod chunker;

/// Implements Burn's Dataset trait for padded samples
pub mod dataset;

/// Implements Burn's Batcher trait to create tensor batches
pub mod batcher;

/// Seeded train/validation split
pub mod splitter;
