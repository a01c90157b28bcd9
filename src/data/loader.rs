// ============================================================
// Data — Raw Record Loader
// ============================================================
// Reads the raw labelled dataset from disk.
//
// Two formats are supported:
//   csv    — header row, text and label columns found by name
//   jsonl  — one JSON object per line, text and label fields
//
// The format comes from `raw_format` in the config or, when
// unset, from the file extension. Unlike the cleaning steps,
// loading has no recovery path: a missing file, an unknown
// column or a malformed row fails the whole run.

use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufRead, BufReader},
    path::{Path, PathBuf},
};

use crate::config::CleanerConfig;
use crate::domain::record::Record;
use crate::domain::traits::RecordSource;
use crate::error::{PrepError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RawFormat {
    Csv,
    Jsonl,
}

impl RawFormat {
    /// Guess the format from a file extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension().and_then(|e| e.to_str()).map(str::to_ascii_lowercase) {
            Some(ext) if ext == "csv" => Some(RawFormat::Csv),
            Some(ext) if ext == "jsonl" || ext == "ndjson" => Some(RawFormat::Jsonl),
            _ => None,
        }
    }
}

/// Build the configured raw data source.
pub fn source_for(config: &CleanerConfig) -> Result<Box<dyn RecordSource>> {
    let path = config.raw_data_path.clone();
    let format = config
        .raw_format
        .or_else(|| RawFormat::from_path(&path))
        .ok_or_else(|| {
            PrepError::Config(format!(
                "cannot infer raw_format from '{}'; set cleaner.raw_format",
                path.display()
            ))
        })?;

    let source: Box<dyn RecordSource> = match format {
        RawFormat::Csv => Box::new(CsvSource::new(
            path,
            &config.text_column,
            &config.label_column,
        )),
        RawFormat::Jsonl => Box::new(JsonlSource::new(
            path,
            &config.text_column,
            &config.label_column,
        )),
    };
    Ok(source)
}

// ─── CSV ──────────────────────────────────────────────────────────────────────

pub struct CsvSource {
    path:         PathBuf,
    text_column:  String,
    label_column: String,
}

impl CsvSource {
    pub fn new(path: impl Into<PathBuf>, text_column: &str, label_column: &str) -> Self {
        Self {
            path:         path.into(),
            text_column:  text_column.to_string(),
            label_column: label_column.to_string(),
        }
    }
}

impl RecordSource for CsvSource {
    fn load_records(&self) -> Result<Vec<Record>> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_path(&self.path)
            .map_err(|e| PrepError::data_load(&self.path, e))?;

        let headers = reader
            .headers()
            .map_err(|e| PrepError::data_load(&self.path, e))?
            .clone();
        let column = |name: &str| {
            headers.iter().position(|h| h.trim() == name).ok_or_else(|| {
                PrepError::data_load(&self.path, format!("missing column '{name}'"))
            })
        };
        let text_idx  = column(&self.text_column)?;
        let label_idx = column(&self.label_column)?;

        let mut records = Vec::new();
        for (row, result) in reader.records().enumerate() {
            let row_data = result
                .map_err(|e| PrepError::data_load(&self.path, format!("row {}: {e}", row + 1)))?;
            let field = |idx: usize| {
                row_data.get(idx).ok_or_else(|| {
                    PrepError::data_load(&self.path, format!("row {} is too short", row + 1))
                })
            };
            records.push(Record::new(row, field(text_idx)?, field(label_idx)?));
        }

        ensure_not_empty(&self.path, records)
    }

    fn describe(&self) -> String {
        format!("csv:{}", self.path.display())
    }
}

// ─── JSON Lines ───────────────────────────────────────────────────────────────

pub struct JsonlSource {
    path:        PathBuf,
    text_field:  String,
    label_field: String,
}

impl JsonlSource {
    pub fn new(path: impl Into<PathBuf>, text_field: &str, label_field: &str) -> Self {
        Self {
            path:        path.into(),
            text_field:  text_field.to_string(),
            label_field: label_field.to_string(),
        }
    }
}

impl RecordSource for JsonlSource {
    fn load_records(&self) -> Result<Vec<Record>> {
        let file = File::open(&self.path).map_err(|e| PrepError::data_load(&self.path, e))?;

        let mut records = Vec::new();
        for (line_no, line) in BufReader::new(file).lines().enumerate() {
            let line = line.map_err(|e| PrepError::data_load(&self.path, e))?;
            if line.trim().is_empty() {
                continue;
            }
            let value: serde_json::Value = serde_json::from_str(&line).map_err(|e| {
                PrepError::data_load(&self.path, format!("line {}: {e}", line_no + 1))
            })?;

            let text = match value.get(&self.text_field) {
                Some(serde_json::Value::String(s)) => s.clone(),
                _ => {
                    return Err(PrepError::data_load(
                        &self.path,
                        format!("line {}: '{}' must be a string", line_no + 1, self.text_field),
                    ))
                }
            };
            let label = match value.get(&self.label_field) {
                Some(serde_json::Value::String(s)) => s.clone(),
                Some(v @ (serde_json::Value::Number(_) | serde_json::Value::Bool(_))) => v.to_string(),
                _ => {
                    return Err(PrepError::data_load(
                        &self.path,
                        format!("line {}: '{}' must be a string or number", line_no + 1, self.label_field),
                    ))
                }
            };

            records.push(Record::new(records.len(), text, label));
        }

        ensure_not_empty(&self.path, records)
    }

    fn describe(&self) -> String {
        format!("jsonl:{}", self.path.display())
    }
}

fn ensure_not_empty(path: &Path, records: Vec<Record>) -> Result<Vec<Record>> {
    if records.is_empty() {
        return Err(PrepError::data_load(path, "source contains no records"));
    }
    tracing::debug!("Read {} raw records from '{}'", records.len(), path.display());
    Ok(records)
}
