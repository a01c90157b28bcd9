// ============================================================
// Application — Cleaner
// ============================================================
// Produces the clean train/val/test partitions, reusing the
// persisted ones when a complete set is already on disk.
//
//   Step 1: Load raw records          (data::loader)
//   Step 2: Split train/val/test      (data::splitter)
//   Step 3: Fit + apply text chain    (data::preprocessor)
//   Step 4: Encode labels / one-hot   (data::labels)
//   Step 5: Rebalance train           (data::labels)
//   Step 6: Publish with rollback     (infra::clean_store)
//
// The test partition is held out untouched: no cleaning, no
// label encoding, no resampling. Record ids are carried through
// every step, so a text is always paired with its own label.

use tracing::Span;

use crate::config::CleanerConfig;
use crate::data::{
    labels::{encode_labels, resample, LabelEncoder},
    loader::source_for,
    preprocessor::CleaningChain,
    splitter::train_val_test_split,
};
use crate::domain::record::{Record, Split, SplitName};
use crate::domain::traits::RecordSource;
use crate::error::Result;
use crate::infra::clean_store::{ArtifactStatus, CleanStore};

// ─── CleanData ────────────────────────────────────────────────────────────────
/// Everything the cleaner publishes.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CleanData {
    pub train: Vec<Record>,
    pub val:   Vec<Record>,
    pub test:  Vec<Record>,

    /// Present when label encoding ran
    pub label_encoder: Option<LabelEncoder>,

    /// Present when the rare-word step ran
    pub frequent_words: Option<Vec<String>>,
}

impl CleanData {
    pub fn get(&self, name: SplitName) -> &[Record] {
        match name {
            SplitName::Train => &self.train,
            SplitName::Val   => &self.val,
            SplitName::Test  => &self.test,
        }
    }
}

// ─── Cleaner ──────────────────────────────────────────────────────────────────
pub struct Cleaner {
    config: CleanerConfig,
    source: Box<dyn RecordSource>,
    store:  CleanStore,
    span:   Span,
}

impl Cleaner {
    /// Cleaner reading the raw file named in `config`.
    pub fn new(config: CleanerConfig, span: Span) -> Result<Self> {
        let source = source_for(&config)?;
        Ok(Self::with_source(config, source, span))
    }

    /// Cleaner over any record source.
    pub fn with_source(config: CleanerConfig, source: Box<dyn RecordSource>, span: Span) -> Self {
        let store = CleanStore::new(config.clean_data_dir.clone());
        Self {
            config,
            source,
            store,
            span,
        }
    }

    /// Return the clean partitions, cleaning from raw data only when
    /// no complete set is on disk or `force_reclean` is set.
    pub fn get_clean_data(&self, force_reclean: bool) -> Result<CleanData> {
        let _guard = self.span.enter();

        if force_reclean {
            tracing::info!("Re-cleaning requested; ignoring any existing clean data");
        } else if self.store.status()? == ArtifactStatus::Complete {
            tracing::info!("Found clean data in '{}'", self.store.dir().display());
            return self.load_clean_data();
        }

        let raw   = self.load_raw_data()?;
        let split = self.train_test_split(raw);
        let data  = self.clean_raw_data(split)?;
        self.save_clean_data(&data)?;
        Ok(data)
    }

    pub fn load_raw_data(&self) -> Result<Vec<Record>> {
        let _guard  = self.span.enter();
        let records = self.source.load_records()?;
        tracing::info!("Loaded {} raw records from {}", records.len(), self.source.describe());
        Ok(records)
    }

    pub fn train_test_split(&self, records: Vec<Record>) -> Split {
        let _guard = self.span.enter();
        let split  = train_val_test_split(
            records,
            self.config.test_ratio,
            self.config.val_ratio,
            self.config.seed,
        );
        tracing::info!(
            "Split into {} train, {} val, {} test",
            split.train.len(),
            split.val.len(),
            split.test.len(),
        );
        split
    }

    /// Run the cleaning chain and record-level steps on a split.
    pub fn clean_raw_data(&self, split: Split) -> Result<CleanData> {
        let _guard = self.span.enter();
        let steps  = &self.config.steps;

        // ── Step 1: Text chain, fitted on train only ──────────────────────────
        let mut chain = CleaningChain::from_config(steps)?.with_parallel(self.config.parallel);
        let corpus: Vec<String> = split.train.iter().map(|r| r.text.clone()).collect();
        chain.fit(&corpus)?;
        tracing::debug!("Cleaning steps: {}", chain.step_names().join(" → "));

        let mut train = chain.clean_records(&split.train);
        let mut val   = chain.clean_records(&split.val);

        let emptied = train.iter().chain(val.iter()).filter(|r| r.text.is_empty()).count();
        if emptied > 0 {
            tracing::warn!("{} records have no tokens left after cleaning", emptied);
        }

        // ── Step 2: Labels ────────────────────────────────────────────────────
        let label_encoder = if steps.label_encoding {
            let encoder = match &steps.label_encoder_path {
                Some(path) => LabelEncoder::load(path)?,
                None => LabelEncoder::fit(
                    train.iter().chain(val.iter()).map(|r| r.label.as_str()),
                ),
            };
            encode_labels(&mut train, &encoder, steps.one_hot)?;
            encode_labels(&mut val, &encoder, steps.one_hot)?;
            tracing::info!("Encoded {} label classes", encoder.num_classes());
            (encoder.num_classes() > 0).then_some(encoder)
        } else {
            None
        };

        // ── Step 3: Class balance ─────────────────────────────────────────────
        let train = resample(train, steps.imbalance, self.config.seed);

        Ok(CleanData {
            train,
            val,
            test: split.test,
            label_encoder,
            frequent_words: chain.frequent_words(),
        })
    }

    pub fn load_clean_data(&self) -> Result<CleanData> {
        let _guard = self.span.enter();
        self.store.load()
    }

    pub fn save_clean_data(&self, data: &CleanData) -> Result<()> {
        let _guard = self.span.enter();
        self.store.save(data)
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::labels::ImbalanceStrategy;
    use crate::data::loader::CsvSource;
    use crate::error::PrepError;
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    };

    /// In-memory source that counts how often it is read.
    struct VecSource {
        records: Vec<Record>,
        reads:   Arc<AtomicUsize>,
    }

    impl RecordSource for VecSource {
        fn load_records(&self) -> Result<Vec<Record>> {
            self.reads.fetch_add(1, Ordering::SeqCst);
            Ok(self.records.clone())
        }

        fn describe(&self) -> String {
            "memory".to_string()
        }
    }

    fn raw(n: usize) -> Vec<Record> {
        (0..n)
            .map(|i| {
                let label = if i % 3 == 0 { "neg" } else { "pos" };
                Record::new(i, format!("<b>Review item{i}</b>: the movie was GREAT!! https://x.io/{i}"), label)
            })
            .collect()
    }

    fn cleaner(dir: &tempfile::TempDir, n: usize) -> (Cleaner, Arc<AtomicUsize>) {
        let config = CleanerConfig::new("unused.csv", dir.path().join("clean"));
        cleaner_with(config, n)
    }

    fn cleaner_with(config: CleanerConfig, n: usize) -> (Cleaner, Arc<AtomicUsize>) {
        let reads  = Arc::new(AtomicUsize::new(0));
        let source = VecSource { records: raw(n), reads: reads.clone() };
        (Cleaner::with_source(config, Box::new(source), Span::none()), reads)
    }

    #[test]
    fn test_first_run_cleans_and_persists() {
        let dir        = tempfile::tempdir().unwrap();
        let (c, reads) = cleaner(&dir, 100);
        let data       = c.get_clean_data(false).unwrap();

        assert_eq!(reads.load(Ordering::SeqCst), 1);
        assert_eq!(data.test.len(), 20);
        assert_eq!(data.train.len() + data.val.len(), 80);
        assert!(dir.path().join("clean/train.json").exists());
        assert_eq!(data.train[0].text, format!("Review item{} movie GREAT xxurl", data.train[0].id));
    }

    #[test]
    fn test_second_run_loads_without_reading_source() {
        let dir        = tempfile::tempdir().unwrap();
        let (c, reads) = cleaner(&dir, 30);
        let first      = c.get_clean_data(false).unwrap();
        let second     = c.get_clean_data(false).unwrap();

        assert_eq!(reads.load(Ordering::SeqCst), 1);
        assert_eq!(first, second);
    }

    #[test]
    fn test_force_reclean_reads_source_again() {
        let dir        = tempfile::tempdir().unwrap();
        let (c, reads) = cleaner(&dir, 30);
        c.get_clean_data(false).unwrap();
        c.get_clean_data(true).unwrap();
        assert_eq!(reads.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_partial_artifacts_fail() {
        let dir    = tempfile::tempdir().unwrap();
        let (c, _) = cleaner(&dir, 30);
        c.get_clean_data(false).unwrap();
        std::fs::remove_file(dir.path().join("clean/test.json")).unwrap();

        let err = c.get_clean_data(false).unwrap_err();
        assert!(matches!(err, PrepError::CorruptArtifact { .. }));
    }

    #[test]
    fn test_test_partition_is_untouched() {
        let dir    = tempfile::tempdir().unwrap();
        let (c, _) = cleaner(&dir, 50);
        let data   = c.get_clean_data(false).unwrap();
        let source = raw(50);

        for r in &data.test {
            assert_eq!(r, &source[r.id]);
        }
    }

    #[test]
    fn test_labels_stay_aligned_and_encoded() {
        let dir    = tempfile::tempdir().unwrap();
        let (c, _) = cleaner(&dir, 60);
        let data   = c.get_clean_data(false).unwrap();
        let source = raw(60);
        let enc    = data.label_encoder.as_ref().unwrap();

        assert_eq!(enc.classes(), &["neg", "pos"]);
        for r in data.train.iter().chain(data.val.iter()) {
            assert_eq!(r.label, source[r.id].label);
            assert_eq!(r.label_id, Some(enc.encode(&r.label).unwrap()));
            assert!(r.text.starts_with(&format!("Review item{} ", r.id)));
        }
    }

    #[test]
    fn test_cleaning_is_idempotent() {
        let dir    = tempfile::tempdir().unwrap();
        let (c, _) = cleaner(&dir, 40);
        let once   = c.clean_raw_data(c.train_test_split(raw(40))).unwrap();
        let again  = c
            .clean_raw_data(Split {
                train: once.train.clone(),
                val:   once.val.clone(),
                test:  once.test.clone(),
            })
            .unwrap();
        assert_eq!(again.train, once.train);
        assert_eq!(again.val, once.val);
    }

    #[test]
    fn test_one_hot_and_oversample() {
        let dir        = tempfile::tempdir().unwrap();
        let mut config = CleanerConfig::new("unused.csv", dir.path().join("clean"));
        config.steps.one_hot   = true;
        config.steps.imbalance = ImbalanceStrategy::Oversample;
        let (c, _) = cleaner_with(config, 60);
        let data   = c.get_clean_data(false).unwrap();

        let neg = data.train.iter().filter(|r| r.label == "neg").count();
        let pos = data.train.iter().filter(|r| r.label == "pos").count();
        assert_eq!(neg, pos);
        assert!(data.train.iter().all(|r| r.one_hot.as_ref().map(Vec::len) == Some(2)));
        assert!(data.val.iter().all(|r| r.one_hot.is_some()));
    }

    #[test]
    fn test_loaded_label_encoder_rejects_unknown_label() {
        let dir          = tempfile::tempdir().unwrap();
        let encoder_path = dir.path().join("labels.json");
        std::fs::write(&encoder_path, LabelEncoder::fit(["pos"]).to_json()).unwrap();

        let mut config = CleanerConfig::new("unused.csv", dir.path().join("clean"));
        config.steps.label_encoder_path = Some(encoder_path);
        let (c, _) = cleaner_with(config, 30);

        let err = c.get_clean_data(false).unwrap_err();
        assert!(matches!(err, PrepError::UnknownLabel { ref label } if label == "neg"));
        assert!(!dir.path().join("clean").exists());
    }

    #[test]
    fn test_raw_load_failure_is_fatal() {
        let dir    = tempfile::tempdir().unwrap();
        let config = CleanerConfig::new(dir.path().join("missing.csv"), dir.path().join("clean"));
        let source = Box::new(CsvSource::new(dir.path().join("missing.csv"), "text", "label"));
        let c      = Cleaner::with_source(config, source, Span::none());

        assert!(matches!(c.get_clean_data(false), Err(PrepError::DataLoad { .. })));
    }

    #[test]
    fn test_new_infers_source_from_extension() {
        let dir    = tempfile::tempdir().unwrap();
        let path   = dir.path().join("raw.csv");
        std::fs::write(&path, "text,label\nHello there,a\nGood bye,b\nSee you,a\n").unwrap();
        let config = CleanerConfig::new(&path, dir.path().join("clean"));

        let data = Cleaner::new(config, Span::none()).unwrap().get_clean_data(false).unwrap();
        assert_eq!(data.train.len() + data.val.len() + data.test.len(), 3);
    }

    #[test]
    fn test_raw_file_inside_clean_dir_survives_publishing() {
        let dir  = tempfile::tempdir().unwrap();
        let body = "text,label\nHello there,a\nGood bye,b\nSee you,a\nSo long,b\n";
        let path = dir.path().join("raw.csv");
        std::fs::write(&path, body).unwrap();
        std::fs::write(dir.path().join("notes.txt"), "keep").unwrap();
        let config = CleanerConfig::new(&path, dir.path());

        let c = Cleaner::new(config, Span::none()).unwrap();
        c.get_clean_data(false).unwrap();
        c.get_clean_data(true).unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), body);
        assert_eq!(std::fs::read_to_string(dir.path().join("notes.txt")).unwrap(), "keep");
        assert!(dir.path().join("train.json").is_file());
    }
}
