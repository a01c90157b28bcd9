// ============================================================
// Domain — Core Traits
// ============================================================
// The seams the rest of the pipeline is written against:
//
//   RecordSource — anything that yields raw labelled records
//                  (CSV and JSON Lines files ship built in)
//   TextStep     — one named, pure text transform in the
//                  cleaning chain

use crate::domain::record::Record;
use crate::error::Result;

// ─── RecordSource ─────────────────────────────────────────────────────────────
/// Supplies the raw dataset the cleaner starts from.
pub trait RecordSource: Send + Sync {
    /// Load every record. Ids must be unique; the built-in
    /// sources use the row index.
    fn load_records(&self) -> Result<Vec<Record>>;

    /// Human-readable location, used in log lines.
    fn describe(&self) -> String;
}

// ─── TextStep ─────────────────────────────────────────────────────────────────
/// One step of the cleaning chain.
///
/// `apply` must be idempotent: applying a step to its own
/// output returns that output unchanged.
pub trait TextStep: Send + Sync {
    /// Stable name used in logs.
    fn name(&self) -> &'static str;

    /// Learn from training text that has already passed through
    /// every earlier step. Most steps are stateless.
    fn fit(&mut self, _corpus: &[String]) -> Result<()> {
        Ok(())
    }

    fn apply(&self, text: &str) -> String;

    /// Word list learned by `fit`, for steps that persist one.
    fn learned_words(&self) -> Option<&[String]> {
        None
    }
}
