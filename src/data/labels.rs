// ============================================================
// Data — Label Encoding and Class Balancing
// ============================================================
// Record-level steps that run after text cleaning:
//
//   LabelEncoder  — sorted unique labels → dense integer ids,
//                   fitted on train + val or loaded from JSON
//   one-hot       — optional Vec<u8> per record from the ids
//   resample      — oversample minority classes or undersample
//                   majority ones on the training partition
//
// Oversampling draws extra copies with replacement; the copies
// keep their record id, so text and label never drift apart.

use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;

use crate::domain::record::Record;
use crate::error::{PrepError, Result};

pub const LABEL_ENCODER_ARTIFACT: &str = "label_encoder";

// ─── LabelEncoder ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelEncoder {
    /// Class names; a class's id is its index
    classes: Vec<String>,

    #[serde(skip)]
    index: HashMap<String, u32>,
}

impl LabelEncoder {
    /// Fit on every label seen; ids follow sorted label order.
    pub fn fit<'a>(labels: impl IntoIterator<Item = &'a str>) -> Self {
        let mut classes: Vec<String> = labels
            .into_iter()
            .collect::<HashSet<_>>()
            .into_iter()
            .map(str::to_string)
            .collect();
        classes.sort();
        Self::build(classes)
    }

    pub fn from_classes(classes: Vec<String>) -> std::result::Result<Self, String> {
        if classes.is_empty() {
            return Err("label encoder has no classes".into());
        }
        let mut seen = HashSet::new();
        if let Some(dup) = classes.iter().find(|c| !seen.insert(c.as_str())) {
            return Err(format!("class '{dup}' appears twice"));
        }
        Ok(Self::build(classes))
    }

    fn build(classes: Vec<String>) -> Self {
        let index = classes
            .iter()
            .enumerate()
            .map(|(i, c)| (c.clone(), i as u32))
            .collect();
        Self { classes, index }
    }

    /// Read a mapping written by `to_json`.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(PrepError::MissingArtifact {
                artifact: LABEL_ENCODER_ARTIFACT.into(),
                path:     path.to_path_buf(),
            });
        }
        let raw = std::fs::read_to_string(path)
            .map_err(|e| PrepError::corrupt(LABEL_ENCODER_ARTIFACT, path, e))?;
        Self::from_json(&raw).map_err(|e| PrepError::corrupt(LABEL_ENCODER_ARTIFACT, path, e))
    }

    pub fn from_json(raw: &str) -> std::result::Result<Self, String> {
        let parsed: LabelEncoder = serde_json::from_str(raw).map_err(|e| e.to_string())?;
        Self::from_classes(parsed.classes)
    }

    pub fn to_json(&self) -> String {
        // A struct of one Vec<String> always serialises
        serde_json::to_string_pretty(self).unwrap_or_default()
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn num_classes(&self) -> usize {
        self.classes.len()
    }

    pub fn encode(&self, label: &str) -> Result<u32> {
        self.index
            .get(label)
            .copied()
            .ok_or_else(|| PrepError::UnknownLabel { label: label.to_string() })
    }

    pub fn one_hot(&self, id: u32) -> Vec<u8> {
        let mut v = vec![0u8; self.classes.len()];
        if let Some(slot) = v.get_mut(id as usize) {
            *slot = 1;
        }
        v
    }
}

/// Fill `label_id` (and `one_hot` when asked) on every record.
pub fn encode_labels(records: &mut [Record], encoder: &LabelEncoder, one_hot: bool) -> Result<()> {
    for record in records.iter_mut() {
        let id = encoder.encode(&record.label)?;
        record.label_id = Some(id);
        record.one_hot  = one_hot.then(|| encoder.one_hot(id));
    }
    Ok(())
}

// ─── Class balancing ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ImbalanceStrategy {
    #[default]
    None,
    /// Draw extra copies of minority-class records until every
    /// class matches the largest one
    Oversample,
    /// Keep a random subset of each class the size of the smallest
    Undersample,
}

/// Rebalance classes by label. Output is ordered by record id.
pub fn resample(records: Vec<Record>, strategy: ImbalanceStrategy, seed: u64) -> Vec<Record> {
    let target = {
        let mut sizes: HashMap<&str, usize> = HashMap::new();
        for r in &records {
            *sizes.entry(r.label.as_str()).or_default() += 1;
        }
        let sizes = sizes.into_values();
        match strategy {
            ImbalanceStrategy::None        => None,
            ImbalanceStrategy::Oversample  => sizes.max(),
            ImbalanceStrategy::Undersample => sizes.min(),
        }
    };
    let Some(target) = target else {
        return records;
    };

    let mut by_label: BTreeMap<String, Vec<Record>> = BTreeMap::new();
    for r in records {
        by_label.entry(r.label.clone()).or_default().push(r);
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let mut out = Vec::with_capacity(target * by_label.len());
    for (_, mut group) in by_label {
        if group.len() < target {
            let extra: Vec<Record> = (0..target - group.len())
                .filter_map(|_| group.choose(&mut rng).cloned())
                .collect();
            group.extend(extra);
        } else {
            group.shuffle(&mut rng);
            group.truncate(target);
        }
        out.extend(group);
    }

    out.sort_by_key(|r| r.id);
    tracing::debug!("Resampled training set to {} records ({:?})", out.len(), strategy);
    out
}
