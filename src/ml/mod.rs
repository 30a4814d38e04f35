// ============================================================
// Layer 5 — ML / Model Layer (Burn)
// ============================================================
// All Burn network code lives here. The data layer only builds
// tensors for it; nothing outside this layer runs a model.
//
//   encoder.rs    — BiLSTM encoder with masking and a summary
//                   of the final states
//   attention.rs  — context↔question attention and the blend G
//   decoder.rs    — modelling BiLSTM + start / end heads
//   model.rs      — the assembled span QA network and its loss
//   optim.rs      — optimiser choice and learning-rate decay
//   evaluator.rs  — validation cost and sampled F1 / EM
//   trainer.rs    — the training loop with checkpointing
//   inferencer.rs — single-example span prediction
//
// Reference: Burn Book §3 (Building Blocks)
//            Burn Book §5 (Training)
//            Seo et al. (2017) BiDAF

pub mod encoder;
pub mod attention;
pub mod decoder;

/// Span QA network: embeddings, encoders, attention, decoder
pub mod model;

pub mod optim;
pub mod evaluator;

/// Full training loop with validation and checkpointing
pub mod trainer;

/// Inference engine — loads checkpoint and predicts spans
pub mod inferencer;
