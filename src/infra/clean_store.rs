// ============================================================
// Infra — Clean Data Store
// ============================================================
// Persists the cleaner's output in one directory:
//
//   clean_data_dir/
//     train.json           ← Vec<Record>, pretty JSON
//     val.json
//     test.json
//     label_encoder.json   ← only when label encoding ran
//     frequent_words.txt   ← only when the rare-word step ran
//
// The three partitions form one unit. `status` reports:
//   all three present  → Complete
//   none present       → Absent
//   anything else      → CorruptArtifact (never silently recleaned)
//
// What does publishing touch?
//   Only the five file names above. The directory may also hold
//   the raw data, tokenizer artifacts or anything else the user
//   keeps there; those entries are never moved or deleted, and
//   `clean_data_dir: .` works like any other directory.
//
// How publishing works here:
//   1. write every file into `.clean-staging-*` inside the dir
//   2. move the previous set's files into `.clean-backup-*`
//   3. rename each staged file into place
//   4. drop the backup (an old optional file the new set lacks
//      goes with it)
// A failure in step 2 or 3 removes what was placed and moves
// the backed-up files back, so the previous complete set is what
// remains. If even that fails, the backup dir is kept on disk
// and its path logged.
//
// Why stage inside the directory?
//   rename(2) is only atomic within one filesystem. A sibling of
//   the staged files is guaranteed to share theirs.

use std::{
    fs::{self, File},
    io::{self, BufWriter, Write},
    path::{Path, PathBuf},
};

use crate::application::cleaner::CleanData;
use crate::data::labels::{LabelEncoder, LABEL_ENCODER_ARTIFACT};
use crate::domain::record::{Record, SplitName};
use crate::error::{PrepError, Result};

pub const LABEL_ENCODER_FILE:  &str = "label_encoder.json";
pub const FREQUENT_WORDS_FILE: &str = "frequent_words.txt";
const CLEAN_DATA_ARTIFACT:     &str = "clean_data";

/// Every file name `save` may create or replace.
pub const OWNED_FILES: [&str; 5] = [
    "train.json",
    "val.json",
    "test.json",
    LABEL_ENCODER_FILE,
    FREQUENT_WORDS_FILE,
];

/// Result of inspecting the partition files. A partial set is
/// an error, not a status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactStatus {
    /// train.json, val.json and test.json all exist
    Complete,
    /// None of the three exist; the cleaner should run
    Absent,
}

/// The clean artifact files inside `clean_data_dir`.
pub struct CleanStore {
    /// clean_data_dir; may be shared with unrelated files
    dir: PathBuf,
}

impl CleanStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn partition_path(&self, name: SplitName) -> PathBuf {
        self.dir.join(name.file_name())
    }

    /// Whether a complete partition set is on disk.
    pub fn status(&self) -> Result<ArtifactStatus> {
        let present: Vec<SplitName> = SplitName::ALL
            .into_iter()
            .filter(|n| self.partition_path(*n).is_file())
            .collect();

        match present.len() {
            3 => Ok(ArtifactStatus::Complete),
            0 => Ok(ArtifactStatus::Absent),
            _ => {
                let missing: Vec<&str> = SplitName::ALL
                    .iter()
                    .filter(|n| !present.contains(n))
                    .map(|n| n.file_name())
                    .collect();
                Err(PrepError::corrupt(
                    CLEAN_DATA_ARTIFACT,
                    &self.dir,
                    format!("partial artifact set, missing {}", missing.join(", ")),
                ))
            }
        }
    }

    // ─── Loading ──────────────────────────────────────────────────────────────

    pub fn load(&self) -> Result<CleanData> {
        let train = self.load_partition(SplitName::Train)?;
        let val   = self.load_partition(SplitName::Val)?;
        let test  = self.load_partition(SplitName::Test)?;

        let encoder_path  = self.dir.join(LABEL_ENCODER_FILE);
        let label_encoder = if encoder_path.is_file() {
            Some(LabelEncoder::load(&encoder_path)?)
        } else {
            None
        };

        let words_path     = self.dir.join(FREQUENT_WORDS_FILE);
        let frequent_words = if words_path.is_file() {
            let body = fs::read_to_string(&words_path)
                .map_err(|e| PrepError::corrupt("frequent_words", &words_path, e))?;
            Some(body.lines().filter(|l| !l.trim().is_empty()).map(str::to_string).collect())
        } else {
            None
        };

        tracing::debug!(
            "Loaded clean data from '{}': {} train, {} val, {} test",
            self.dir.display(),
            train.len(),
            val.len(),
            test.len(),
        );

        Ok(CleanData {
            train,
            val,
            test,
            label_encoder,
            frequent_words,
        })
    }

    fn load_partition(&self, name: SplitName) -> Result<Vec<Record>> {
        let path = self.partition_path(name);
        if !path.exists() {
            return Err(PrepError::MissingArtifact {
                artifact: name.file_name().into(),
                path,
            });
        }
        let raw = fs::read_to_string(&path)
            .map_err(|e| PrepError::corrupt(name.file_name(), &path, e))?;
        serde_json::from_str(&raw).map_err(|e| PrepError::corrupt(name.file_name(), &path, e))
    }

    // ─── Saving ───────────────────────────────────────────────────────────────

    /// Publish `data`, replacing the previous set's files.
    pub fn save(&self, data: &CleanData) -> Result<()> {
        fs::create_dir_all(&self.dir)
            .map_err(|e| PrepError::persist(CLEAN_DATA_ARTIFACT, &self.dir, e))?;

        // ── Step 1: Stage ─────────────────────────────────────────────────────
        // Dropping a TempDir on an early return removes it
        let staging = self.scratch_dir(".clean-staging-")?;

        for name in SplitName::ALL {
            write_json(&staging.path().join(name.file_name()), name.file_name(), data.get(name))?;
        }
        if let Some(encoder) = &data.label_encoder {
            let path = staging.path().join(LABEL_ENCODER_FILE);
            fs::write(&path, encoder.to_json())
                .map_err(|e| PrepError::persist(LABEL_ENCODER_ARTIFACT, &path, e))?;
        }
        if let Some(words) = &data.frequent_words {
            let path = staging.path().join(FREQUENT_WORDS_FILE);
            let mut body = words.join("\n");
            body.push('\n');
            fs::write(&path, body).map_err(|e| PrepError::persist("frequent_words", &path, e))?;
        }

        // ── Steps 2 and 3: Swap ───────────────────────────────────────────────
        let backup     = self.scratch_dir(".clean-backup-")?;
        let mut moved  = Vec::new();
        let mut placed = Vec::new();

        if let Err(e) = self.swap(staging.path(), backup.path(), &mut moved, &mut placed) {
            if !self.roll_back(backup.path(), &moved, &placed) {
                let kept = backup.keep();
                tracing::error!("Previous clean data left in '{}'", kept.display());
            }
            return Err(e);
        }

        // ── Step 4: Drop the previous set ─────────────────────────────────────
        if let Err(e) = backup.close() {
            tracing::warn!("Could not remove old clean data: {}", e);
        }

        tracing::info!("Saved clean data to '{}'", self.dir.display());
        Ok(())
    }

    fn scratch_dir(&self, prefix: &str) -> Result<tempfile::TempDir> {
        tempfile::Builder::new()
            .prefix(prefix)
            .tempdir_in(&self.dir)
            .map_err(|e| PrepError::persist(CLEAN_DATA_ARTIFACT, &self.dir, e))
    }

    /// Move the current owned files into `backup`, then the staged
    /// ones into place. `moved` and `placed` record progress for
    /// `roll_back`.
    fn swap(
        &self,
        staging: &Path,
        backup:  &Path,
        moved:   &mut Vec<&'static str>,
        placed:  &mut Vec<&'static str>,
    ) -> Result<()> {
        for name in OWNED_FILES {
            let target = self.dir.join(name);
            if target.is_file() {
                fs::rename(&target, backup.join(name))
                    .map_err(|e| PrepError::persist(CLEAN_DATA_ARTIFACT, &target, e))?;
                moved.push(name);
            }
        }
        for name in OWNED_FILES {
            let staged = staging.join(name);
            if staged.is_file() {
                let target = self.dir.join(name);
                fs::rename(&staged, &target)
                    .map_err(|e| PrepError::persist(CLEAN_DATA_ARTIFACT, &target, e))?;
                placed.push(name);
            }
        }
        Ok(())
    }

    /// Undo a partial swap. Returns false if any file could not be
    /// put back.
    fn roll_back(&self, backup: &Path, moved: &[&str], placed: &[&str]) -> bool {
        let mut restored = true;
        for name in placed {
            let path = self.dir.join(name);
            if let Err(e) = fs::remove_file(&path) {
                tracing::error!("Could not remove '{}': {}", path.display(), e);
                restored = false;
            }
        }
        for name in moved {
            let path = self.dir.join(name);
            if let Err(e) = fs::rename(backup.join(name), &path) {
                tracing::error!("Could not restore '{}': {}", path.display(), e);
                restored = false;
            }
        }
        if restored {
            tracing::warn!("Publishing failed; previous clean data restored in '{}'", self.dir.display());
        }
        restored
    }
}

fn write_json(path: &Path, artifact: &str, records: &[Record]) -> Result<()> {
    let file = File::create(path).map_err(|e| PrepError::persist(artifact, path, e))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, records)
        .map_err(|e| PrepError::persist(artifact, path, io::Error::from(e)))?;
    writer.flush().map_err(|e| PrepError::persist(artifact, path, e))
}
