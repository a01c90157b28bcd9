// ============================================================
// Domain Layer
// ============================================================
// Plain data types and the traits the other layers implement.
// No file I/O and no tensor code lives here.

/// Labelled records and the train/val/test split
pub mod record;

/// RecordSource and TextStep abstractions
pub mod traits;
