// ============================================================
// Error Taxonomy
// ============================================================
// Every fallible library operation returns PrepError.
// The CLI layer wraps these in anyhow for reporting.
//
//   Config           — malformed or missing configuration (startup)
//   DataLoad         — raw source unreadable (fatal)
//   CorruptArtifact  — persisted output present but unreadable/incomplete
//   MissingArtifact  — asked to load an artifact that was never written
//   Persist          — writing an artifact failed
//   UnknownLabel     — label absent from a loaded label mapping
//   Tokenizer        — the word-level tokenizer rejected its input
//   NotFitted        — tokenizer used before fit() or load()
//
// Unknown tokens during transform are NOT errors: they map to
// the [UNK] id and are only counted in the logs.

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, PrepError>;

#[derive(Debug, Error)]
pub enum PrepError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("cannot load raw data from '{path}': {reason}")]
    DataLoad { path: PathBuf, reason: String },

    #[error("corrupt artifact '{artifact}' at '{path}': {reason}")]
    CorruptArtifact {
        artifact: String,
        path:     PathBuf,
        reason:   String,
    },

    #[error("artifact '{artifact}' not found at '{path}'")]
    MissingArtifact { artifact: String, path: PathBuf },

    #[error("failed to persist '{artifact}' to '{path}'")]
    Persist {
        artifact: String,
        path:     PathBuf,
        #[source]
        source:   std::io::Error,
    },

    #[error("label '{label}' is not present in the label encoder")]
    UnknownLabel { label: String },

    #[error("tokenizer error: {0}")]
    Tokenizer(String),

    #[error("tokenizer has not been fitted or loaded")]
    NotFitted,
}

impl PrepError {
    pub(crate) fn corrupt(
        artifact: impl Into<String>,
        path:     impl Into<PathBuf>,
        reason:   impl ToString,
    ) -> Self {
        Self::CorruptArtifact {
            artifact: artifact.into(),
            path:     path.into(),
            reason:   reason.to_string(),
        }
    }

    pub(crate) fn persist(
        artifact: impl Into<String>,
        path:     impl Into<PathBuf>,
        source:   std::io::Error,
    ) -> Self {
        Self::Persist {
            artifact: artifact.into(),
            path:     path.into(),
            source,
        }
    }

    pub(crate) fn data_load(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self::DataLoad {
            path:   path.into(),
            reason: reason.to_string(),
        }
    }
}
