// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// Cross-cutting persistence used by training, evaluation and
// inference:
//
//   checkpoint.rs      — model weights via Burn's CompactRecorder,
//                        epoch pointers (latest / best) and the
//                        TrainConfig JSON used to rebuild the model
//
//   tokenizer_store.rs — WordLevel tokenizer generated from
//                        vocab.dat so `ask` maps text to the
//                        training ids
//
//   metrics.rs         — per-epoch loss / accuracy / F1 / EM rows
//                        in metrics.csv
//
// Reference: Burn Book §5 (Checkpointing)

/// Model checkpoint saving and loading
pub mod checkpoint;

/// Tokenizer generation, saving, and loading
pub mod tokenizer_store;

/// Training metrics CSV logger
pub mod metrics;
