// ============================================================
// Layer 3 — Domain Layer
// ============================================================
// Plain Rust types and functions describing reading
// comprehension: a question, a context passage, and an
// answer span inside that passage.
//
// Rules for this layer:
//   - NO Burn framework types allowed here
//   - NO file I/O
//   - Only plain structs, enums, traits and pure functions
//
// Span decoding and EM/F1 scoring live here because they work
// on probability vectors and strings, not on tensors. That
// keeps them testable without a device.
//
// Reference: Rajpurkar et al. (2016) SQuAD
//            Rust Book §5 (Structs), §10 (Traits)

// A passage of text loaded from disk
pub mod document;

// A question / context pair with its gold answer span
pub mod qa_pair;

// Answer span decoding from start/end probabilities
pub mod span;

// SQuAD exact-match and F1 scoring
pub mod scoring;

// Core abstractions (traits) that other layers implement
pub mod traits;
