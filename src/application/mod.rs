// ============================================================
// Layer 2 — Application Components
// ============================================================
// The two components a caller drives, in order:
//
//   Cleaner        raw file → clean train / val / test
//   DataTokenizer  clean train / val → padded tensor batches
//
// Both take their config section and a tracing span at
// construction. Neither prints; the CLI layer does that.

/// Load, split, clean and persist
pub mod cleaner;

/// Vocabulary, padding, batching and tokenizer persistence
pub mod tokenizer;
