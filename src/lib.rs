// ============================================================
// corpus-prep — library root
// ============================================================
// Layers, outermost first:
//
//   cli          (1) clap commands, binary only concerns
//   application  (2) Cleaner and DataTokenizer
//   domain       (3) Record, split names, source/step traits
//   data         (4) loading, cleaning, vocabulary, batching
//   infra        (6) on-disk artifact stores
//
// plus `config` (YAML), `error` (PrepError) and `telemetry`
// (subscriber setup used by the binary).

#![recursion_limit = "256"]

pub mod application;
pub mod cli;
pub mod config;
pub mod data;
pub mod domain;
pub mod error;
pub mod infra;
pub mod telemetry;

pub use application::{
    cleaner::{CleanData, Cleaner},
    tokenizer::DataTokenizer,
};
pub use config::{load_config, PipelineConfig};
pub use domain::record::Record;
pub use error::{PrepError, Result};
