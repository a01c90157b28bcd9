// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// Three subcommands, all driven by one YAML config file:
//
//   clean     → Cleaner::get_clean_data
//   tokenize  → clean (or reuse) data, then fit or load the
//               tokenizer and report batch shapes
//   encode    → load a saved tokenizer and show the padded ids
//               for one piece of text
//
// Every path and hyper-parameter lives in the config; flags
// only choose whether to reuse existing artifacts.

use clap::{Args, Subcommand};
use std::path::PathBuf;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Load, split and clean the raw data, then persist the partitions
    Clean(CleanArgs),

    /// Build the vocabulary and turn train/val into tensor batches
    Tokenize(TokenizeArgs),

    /// Encode a single text with a previously saved tokenizer
    Encode(EncodeArgs),
}

#[derive(Args, Debug)]
pub struct CleanArgs {
    /// Pipeline configuration file (YAML)
    #[arg(long, default_value = "config.yaml")]
    pub config: PathBuf,

    /// Re-run cleaning even when clean partitions already exist
    #[arg(long)]
    pub force: bool,
}

#[derive(Args, Debug)]
pub struct TokenizeArgs {
    /// Pipeline configuration file (YAML)
    #[arg(long, default_value = "config.yaml")]
    pub config: PathBuf,

    /// Re-run cleaning even when clean partitions already exist
    #[arg(long)]
    pub force_reclean: bool,

    /// Fit a new vocabulary even when saved tokenizer artifacts exist
    #[arg(long)]
    pub refit: bool,
}

#[derive(Args, Debug)]
pub struct EncodeArgs {
    /// Pipeline configuration file (YAML)
    #[arg(long, default_value = "config.yaml")]
    pub config: PathBuf,

    /// Text to encode
    #[arg(long)]
    pub text: String,
}

impl Commands {
    pub fn config_path(&self) -> &PathBuf {
        match self {
            Commands::Clean(a)    => &a.config,
            Commands::Tokenize(a) => &a.config,
            Commands::Encode(a)   => &a.config,
        }
    }
}
