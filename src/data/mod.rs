// ============================================================
// Layer 4 — Data Pipeline
// ============================================================
// Everything between a raw labelled file and tensor batches.
//
//   raw CSV / JSONL
//       │
//       ▼
//   loader            → Vec<Record>
//       │
//       ▼
//   splitter          → seeded train / val / test partitions
//       │
//       ▼
//   preprocessor      → CleaningChain of text_steps + lemmatizer
//       │
//       ▼
//   labels            → label encoding, one-hot, resampling
//       │
//       ▼
//   vocabulary        → token ↔ id table fitted on train
//       │
//       ▼
//   dataset           → padded TokenizedExample rows (burn Dataset)
//       │
//       ▼
//   batcher           → shuffle buffer + TextBatch tensors
//
// Each module owns one step and is tested on its own.

/// Reads CSV or JSON Lines files into records
pub mod loader;

/// Seeded train/validation/test split
pub mod splitter;

/// Individual cleaning steps and their markers
pub mod text_steps;

/// Rule-based lemmatizer and part-of-speech filter
pub mod lemmatizer;

/// Ordered chain of cleaning steps
pub mod preprocessor;

/// Label encoder, one-hot vectors and class resampling
pub mod labels;

/// Word vocabulary with reserved ids
pub mod vocabulary;

/// Fixed-length encoded examples
pub mod dataset;

/// Burn batcher and shuffle buffer
pub mod batcher;
