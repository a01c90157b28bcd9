// ============================================================
// Pipeline Configuration
// ============================================================
// One YAML document with three sections:
//
//   cleaner:    raw data location, split ratios, cleaning steps
//   tokenizer:  artifact directories, vocabulary and batch sizes
//   logging:    level and optional log directory
//
// Every struct rejects unknown keys. Paths without a sensible
// default (raw data, clean dir, vocab dir, vectorizer dir) are
// required; everything else falls back to the defaults below.
// Values are validated once at load time so a bad config fails
// at startup instead of halfway through a run.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::data::labels::ImbalanceStrategy;
use crate::data::lemmatizer::PosTag;
use crate::data::loader::RawFormat;
use crate::data::text_steps::{NumberMode, RareWordMode, SpecialToken};
use crate::data::vocabulary::{PAD_TOKEN, UNK_TOKEN};
use crate::error::{PrepError, Result};
use crate::infra::clean_store::OWNED_FILES;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PipelineConfig {
    pub cleaner: CleanerConfig,
    pub tokenizer: TokenizerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

// ─── Cleaner ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CleanerConfig {
    /// CSV or JSON Lines file with one labelled record per row
    pub raw_data_path: PathBuf,

    /// Overrides format detection from the file extension
    #[serde(default)]
    pub raw_format: Option<RawFormat>,

    #[serde(default = "default_text_column")]
    pub text_column: String,

    #[serde(default = "default_label_column")]
    pub label_column: String,

    /// Where train/val/test artifacts are published; other files in
    /// it are left alone
    pub clean_data_dir: PathBuf,

    /// Fraction of all records held out as the untouched test set
    #[serde(default = "default_test_ratio")]
    pub test_ratio: f64,

    /// Fraction of all records used for validation
    #[serde(default = "default_val_ratio")]
    pub val_ratio: f64,

    #[serde(default = "default_seed")]
    pub seed: u64,

    /// Clean records on the rayon thread pool
    #[serde(default)]
    pub parallel: bool,

    #[serde(default)]
    pub steps: CleaningConfig,
}

impl CleanerConfig {
    /// Config with default ratios and steps for the given paths.
    pub fn new(raw_data_path: impl Into<PathBuf>, clean_data_dir: impl Into<PathBuf>) -> Self {
        Self {
            raw_data_path:  raw_data_path.into(),
            raw_format:     None,
            text_column:    default_text_column(),
            label_column:   default_label_column(),
            clean_data_dir: clean_data_dir.into(),
            test_ratio:     default_test_ratio(),
            val_ratio:      default_val_ratio(),
            seed:           default_seed(),
            parallel:       false,
            steps:          CleaningConfig::default(),
        }
    }
}

/// Toggles and resources for each cleaning step.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CleaningConfig {
    #[serde(default = "enabled")]
    pub html: bool,

    #[serde(default = "default_special_tokens")]
    pub special_tokens: Vec<SpecialToken>,

    #[serde(default = "enabled")]
    pub punctuation: bool,

    #[serde(default)]
    pub numbers: NumberMode,

    #[serde(default)]
    pub lemmatize: bool,

    #[serde(default = "enabled")]
    pub stopwords: bool,

    /// One stopword per line; the built-in English list is used when unset
    #[serde(default)]
    pub stopwords_path: Option<PathBuf>,

    /// Coarse tags to keep; unset disables the filter
    #[serde(default)]
    pub pos_filter: Option<Vec<PosTag>>,

    #[serde(default)]
    pub rare_words: Option<RareWordsConfig>,

    #[serde(default = "enabled")]
    pub whitespace: bool,

    #[serde(default = "enabled")]
    pub label_encoding: bool,

    /// Pre-built label mapping; fitted from train + val labels when unset
    #[serde(default)]
    pub label_encoder_path: Option<PathBuf>,

    #[serde(default)]
    pub one_hot: bool,

    #[serde(default)]
    pub imbalance: ImbalanceStrategy,
}

impl Default for CleaningConfig {
    fn default() -> Self {
        Self {
            html:               true,
            special_tokens:     default_special_tokens(),
            punctuation:        true,
            numbers:            NumberMode::default(),
            lemmatize:          false,
            stopwords:          true,
            stopwords_path:     None,
            pos_filter:         None,
            rare_words:         None,
            whitespace:         true,
            label_encoding:     true,
            label_encoder_path: None,
            one_hot:            false,
            imbalance:          ImbalanceStrategy::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RareWordsConfig {
    #[serde(default)]
    pub mode: RareWordMode,

    /// Size of the frequent-word list fitted on train text
    #[serde(default = "default_top_k")]
    pub top_k: usize,

    #[serde(default = "default_min_count")]
    pub min_count: usize,

    /// Load the frequent-word list from this file instead of fitting it
    #[serde(default)]
    pub path: Option<PathBuf>,
}

// ─── Tokenizer ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TaskKind {
    /// Target is the encoded label id
    #[default]
    Classification,
    /// Target is the tokenised label text
    Seq2seq,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PaddingSide {
    Left,
    #[default]
    Right,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TokenizerConfig {
    /// Directory holding vocab.txt, one token per line in id order
    pub vocab_dir: PathBuf,

    /// Directory holding tokenizer.json, the fitted HuggingFace
    /// word-level tokenizer
    pub vectorizer_dir: PathBuf,

    /// Examples per tensor batch; the last batch may be smaller
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Streaming shuffle buffer for train batches; <= 1 disables shuffling
    #[serde(default = "default_buffer_size")]
    pub buffer_size: usize,

    /// Every input sequence is padded or truncated to this length
    #[serde(default = "default_input_seq_length")]
    pub input_seq_length: usize,

    /// Length of seq2seq targets; classification targets are always 1
    #[serde(default = "default_target_seq_length")]
    pub target_seq_length: usize,

    /// Upper bound on vocabulary size, reserved tokens included
    #[serde(default = "default_max_vocab_size")]
    pub max_vocab_size: usize,

    /// Training tokens seen fewer times than this map to [UNK]
    #[serde(default = "default_min_count")]
    pub min_frequency: usize,

    /// Fold case before counting and before lookup
    #[serde(default = "enabled")]
    pub lowercase: bool,

    /// Side padding goes on; truncation always keeps the head
    #[serde(default)]
    pub padding_side: PaddingSide,

    /// Decides what target_ids hold
    #[serde(default)]
    pub task: TaskKind,

    /// Extra reserved tokens placed right after [PAD] and [UNK]
    #[serde(default)]
    pub special_tokens: Vec<String>,

    /// Seed for the train shuffle buffer
    #[serde(default = "default_seed")]
    pub seed: u64,
}

impl TokenizerConfig {
    /// Config with default sizes for the given artifact directories.
    pub fn new(vocab_dir: impl Into<PathBuf>, vectorizer_dir: impl Into<PathBuf>) -> Self {
        Self {
            vocab_dir:         vocab_dir.into(),
            vectorizer_dir:    vectorizer_dir.into(),
            batch_size:        default_batch_size(),
            buffer_size:       default_buffer_size(),
            input_seq_length:  default_input_seq_length(),
            target_seq_length: default_target_seq_length(),
            max_vocab_size:    default_max_vocab_size(),
            min_frequency:     default_min_count(),
            lowercase:         true,
            padding_side:      PaddingSide::default(),
            task:              TaskKind::default(),
            special_tokens:    Vec::new(),
            seed:              default_seed(),
        }
    }
}

// ─── Logging ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Default filter directive; RUST_LOG still takes precedence
    #[serde(default = "default_log_level")]
    pub level: String,

    /// When set, log lines are also appended to <log_dir>/corpus-prep.log
    #[serde(default)]
    pub log_dir: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level:   default_log_level(),
            log_dir: None,
        }
    }
}

// ─── Defaults ─────────────────────────────────────────────────────────────────

fn enabled() -> bool {
    true
}

fn default_text_column() -> String {
    "text".to_string()
}

fn default_label_column() -> String {
    "label".to_string()
}

fn default_test_ratio() -> f64 {
    0.2
}

fn default_val_ratio() -> f64 {
    0.1
}

fn default_seed() -> u64 {
    42
}

fn default_special_tokens() -> Vec<SpecialToken> {
    vec![
        SpecialToken::Url,
        SpecialToken::Email,
        SpecialToken::Mention,
        SpecialToken::Hashtag,
    ]
}

fn default_top_k() -> usize {
    20_000
}

fn default_min_count() -> usize {
    1
}

fn default_batch_size() -> usize {
    32
}

fn default_buffer_size() -> usize {
    64
}

fn default_input_seq_length() -> usize {
    150
}

fn default_target_seq_length() -> usize {
    50
}

fn default_max_vocab_size() -> usize {
    20_000
}

fn default_log_level() -> String {
    "info".to_string()
}

// ─── Loading and validation ───────────────────────────────────────────────────

/// Read, parse and validate a YAML pipeline configuration.
pub fn load_config(path: impl AsRef<Path>) -> Result<PipelineConfig> {
    let path = path.as_ref();
    let raw = std::fs::read_to_string(path).map_err(|e| {
        PrepError::Config(format!("cannot read '{}': {e}", path.display()))
    })?;
    let config = parse_config(&raw).map_err(|e| match e {
        PrepError::Config(msg) => PrepError::Config(format!("'{}': {msg}", path.display())),
        other => other,
    })?;
    tracing::debug!("Loaded configuration from '{}'", path.display());
    Ok(config)
}

/// Parse and validate a YAML document.
pub fn parse_config(raw: &str) -> Result<PipelineConfig> {
    let config: PipelineConfig =
        serde_yaml::from_str(raw).map_err(|e| PrepError::Config(e.to_string()))?;
    config.validate()?;
    Ok(config)
}

impl PipelineConfig {
    pub fn validate(&self) -> Result<()> {
        self.cleaner.validate()?;
        self.tokenizer.validate()?;

        for (key, dir) in [
            ("tokenizer.vocab_dir", &self.tokenizer.vocab_dir),
            ("tokenizer.vectorizer_dir", &self.tokenizer.vectorizer_dir),
        ] {
            if let Some(name) = self.cleaner.owned_file_at(dir) {
                return Err(PrepError::Config(format!(
                    "{key} '{}' collides with the clean artifact '{name}'",
                    dir.display()
                )));
            }
        }

        if self.tokenizer.task == TaskKind::Classification && !self.cleaner.steps.label_encoding {
            return Err(PrepError::Config(
                "tokenizer.task 'classification' requires cleaner.steps.label_encoding".into(),
            ));
        }
        Ok(())
    }
}

impl CleanerConfig {
    /// The clean artifact name `path` would be replaced by, if any.
    fn owned_file_at(&self, path: &Path) -> Option<&'static str> {
        OWNED_FILES
            .into_iter()
            .find(|name| self.clean_data_dir.join(name) == path)
    }

    pub fn validate(&self) -> Result<()> {
        let ratio_ok = |r: f64| (0.0..1.0).contains(&r);
        if !ratio_ok(self.test_ratio) {
            return Err(PrepError::Config(format!(
                "cleaner.test_ratio must be in [0, 1), got {}",
                self.test_ratio
            )));
        }
        if !ratio_ok(self.val_ratio) {
            return Err(PrepError::Config(format!(
                "cleaner.val_ratio must be in [0, 1), got {}",
                self.val_ratio
            )));
        }
        if self.test_ratio + self.val_ratio >= 1.0 {
            return Err(PrepError::Config(
                "cleaner.test_ratio + cleaner.val_ratio must leave room for training data".into(),
            ));
        }
        if let Some(name) = self.owned_file_at(&self.raw_data_path) {
            return Err(PrepError::Config(format!(
                "cleaner.raw_data_path would be overwritten by the clean artifact '{name}'"
            )));
        }
        if self.text_column.is_empty() || self.label_column.is_empty() {
            return Err(PrepError::Config("column names must not be empty".into()));
        }
        if let Some(rare) = &self.steps.rare_words {
            if rare.top_k == 0 || rare.min_count == 0 {
                return Err(PrepError::Config(
                    "cleaner.steps.rare_words.top_k and min_count must be at least 1".into(),
                ));
            }
        }
        if matches!(&self.steps.pos_filter, Some(tags) if tags.is_empty()) {
            return Err(PrepError::Config(
                "cleaner.steps.pos_filter would drop every token".into(),
            ));
        }
        if self.steps.one_hot && !self.steps.label_encoding {
            return Err(PrepError::Config(
                "cleaner.steps.one_hot requires label_encoding".into(),
            ));
        }
        Ok(())
    }
}

impl TokenizerConfig {
    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            return Err(PrepError::Config("tokenizer.batch_size must be at least 1".into()));
        }
        if self.input_seq_length == 0 {
            return Err(PrepError::Config(
                "tokenizer.input_seq_length must be at least 1".into(),
            ));
        }
        if self.task == TaskKind::Seq2seq && self.target_seq_length == 0 {
            return Err(PrepError::Config(
                "tokenizer.target_seq_length must be at least 1 for seq2seq".into(),
            ));
        }
        if self.min_frequency == 0 {
            return Err(PrepError::Config("tokenizer.min_frequency must be at least 1".into()));
        }

        let mut seen = std::collections::HashSet::new();
        for token in &self.special_tokens {
            if token.is_empty() || token.chars().any(char::is_whitespace) {
                return Err(PrepError::Config(format!(
                    "special token '{token}' must be non-empty and contain no whitespace"
                )));
            }
            if token == PAD_TOKEN || token == UNK_TOKEN || !seen.insert(token.as_str()) {
                return Err(PrepError::Config(format!(
                    "special token '{token}' is duplicated or reserved"
                )));
            }
        }

        let reserved = 2 + self.special_tokens.len();
        if self.max_vocab_size <= reserved {
            return Err(PrepError::Config(format!(
                "tokenizer.max_vocab_size must exceed the {reserved} reserved tokens"
            )));
        }
        Ok(())
    }
}
