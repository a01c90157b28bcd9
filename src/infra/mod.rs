// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// On-disk artifacts shared by the application components:
//
//   clean_store.rs     — the cleaner's partitions, label encoder
//                        and frequent-word list, staged and
//                        renamed into place with rollback. Other
//                        files in the directory are left alone.
//
//   tokenizer_store.rs — vocab.txt and tokenizer.json. Builds a
//                        word-level HuggingFace tokenizer from a
//                        fitted Vocabulary and checks on load
//                        that both files agree on every id.

/// Clean partition persistence
pub mod clean_store;

/// Vocabulary and tokenizer persistence
pub mod tokenizer_store;
