// ============================================================
// Application — Data Tokenizer
// ============================================================
// Turns clean records into padded id sequences and tensor
// batches, and owns the fitted vocabulary/tokenizer pair.
//
//   fit        → Vocabulary from train text (+ train targets in
//                seq2seq mode) and a word-level tokenizer over it
//   transform  → EncodedDataset of fixed-length examples
//   batch      → TextBatch tensors through burn's Batcher
//   save/load  → vocab.txt + tokenizer.json (infra::tokenizer_store)
//
// Unknown words map to [UNK]; they are counted and logged, never
// reported as errors.

use burn::{data::dataloader::batcher::Batcher, prelude::Backend};
use tokenizers::Tokenizer;
use tracing::Span;

use crate::config::{PaddingSide, TaskKind, TokenizerConfig};
use crate::data::{
    batcher::{group, shuffle_buffer, TextBatch, TextBatcher},
    dataset::{pad_or_truncate, EncodedDataset, TokenizedExample},
    vocabulary::{Vocabulary, PAD_ID, UNK_ID},
};
use crate::domain::record::Record;
use crate::error::{PrepError, Result};
use crate::infra::tokenizer_store::{build_tokenizer, TokenizerStore};

struct Fitted {
    vocab:     Vocabulary,
    tokenizer: Tokenizer,
}

pub struct DataTokenizer {
    config: TokenizerConfig,
    store:  TokenizerStore,
    fitted: Option<Fitted>,
    span:   Span,
}

impl DataTokenizer {
    /// Unfitted tokenizer; call `fit` or use `load` instead.
    pub fn new(config: TokenizerConfig, span: Span) -> Self {
        let store = TokenizerStore::new(config.vocab_dir.clone(), config.vectorizer_dir.clone());
        Self {
            config,
            store,
            fitted: None,
            span,
        }
    }

    /// Rebuild a ready tokenizer from saved artifacts, without refitting.
    pub fn load(config: TokenizerConfig, span: Span) -> Result<Self> {
        let mut this = Self::new(config, span);
        let fitted   = this.read_artifacts()?;
        this.fitted  = Some(fitted);
        Ok(this)
    }

    fn read_artifacts(&self) -> Result<Fitted> {
        let _guard = self.span.enter();

        let (vocab, tokenizer) = self.store.load()?;
        for (offset, token) in self.config.special_tokens.iter().enumerate() {
            if vocab.token_to_id(token) != Some(2 + offset as u32) {
                return Err(PrepError::corrupt(
                    "vocabulary",
                    self.store.vocab_path(),
                    format!("special token '{token}' is not at id {}", 2 + offset),
                ));
            }
        }
        tracing::info!("Loaded tokenizer with {} tokens", vocab.len());
        Ok(Fitted { vocab, tokenizer })
    }

    fn state(&self) -> Result<&Fitted> {
        self.fitted.as_ref().ok_or(PrepError::NotFitted)
    }

    pub fn vocabulary(&self) -> Result<&Vocabulary> {
        Ok(&self.state()?.vocab)
    }

    // ─── Fitting ──────────────────────────────────────────────────────────────

    /// Build the vocabulary and tokenizer from training records.
    pub fn fit(&mut self, train: &[Record]) -> Result<()> {
        let _guard = self.span.enter();
        let cfg    = &self.config;

        let mut texts: Vec<&str> = train.iter().map(|r| r.text.as_str()).collect();
        if cfg.task == TaskKind::Seq2seq {
            texts.extend(train.iter().map(|r| r.label.as_str()));
        }

        let vocab = Vocabulary::build(
            texts,
            &cfg.special_tokens,
            cfg.max_vocab_size,
            cfg.min_frequency,
            cfg.lowercase,
        );
        let tokenizer = build_tokenizer(&vocab, &cfg.special_tokens, cfg.lowercase)?;
        tracing::info!("Fitted vocabulary of {} tokens on {} records", vocab.len(), train.len());

        self.fitted = Some(Fitted { vocab, tokenizer });
        Ok(())
    }

    // ─── Text ↔ ids ───────────────────────────────────────────────────────────

    pub fn tokenize(&self, text: &str) -> Result<Vec<u32>> {
        let encoding = self
            .state()?
            .tokenizer
            .encode(text, false)
            .map_err(|e| PrepError::Tokenizer(e.to_string()))?;
        Ok(encoding.get_ids().to_vec())
    }

    /// Join the tokens for `ids`, skipping padding.
    pub fn detokenize(&self, ids: &[u32]) -> Result<String> {
        let ids: Vec<u32> = ids.iter().copied().filter(|&id| id != PAD_ID).collect();
        self.state()?
            .tokenizer
            .decode(&ids, false)
            .map_err(|e| PrepError::Tokenizer(e.to_string()))
    }

    /// Pad or truncate input ids to `input_seq_length`.
    pub fn pad(&self, ids: &[u32]) -> (Vec<u32>, Vec<u32>) {
        pad_or_truncate(ids, self.config.input_seq_length, PAD_ID, self.config.padding_side)
    }

    // ─── Dataset ──────────────────────────────────────────────────────────────

    /// Tokenise and pad every record.
    pub fn transform(&self, records: &[Record]) -> Result<EncodedDataset> {
        let _guard = self.span.enter();
        let cfg    = &self.config;

        let mut examples = Vec::with_capacity(records.len());
        let mut unknown  = 0usize;
        let mut total    = 0usize;

        for record in records {
            let ids = self.tokenize(&record.text)?;
            total   += ids.len();
            unknown += ids.iter().filter(|&&id| id == UNK_ID).count();
            let (input_ids, attention_mask) = self.pad(&ids);

            let target_ids = match cfg.task {
                TaskKind::Classification => {
                    let id = record.label_id.ok_or_else(|| {
                        PrepError::Tokenizer(format!(
                            "record {} has no label id; enable label encoding for classification",
                            record.id
                        ))
                    })?;
                    vec![id]
                }
                TaskKind::Seq2seq => {
                    let label_ids = self.tokenize(&record.label)?;
                    pad_or_truncate(&label_ids, cfg.target_seq_length, PAD_ID, PaddingSide::Right).0
                }
            };

            examples.push(TokenizedExample {
                record_id: record.id,
                input_ids,
                attention_mask,
                target_ids,
            });
        }

        if unknown > 0 {
            tracing::warn!(
                "{} of {} tokens were out of vocabulary and mapped to the unknown id",
                unknown,
                total
            );
        }
        tracing::debug!("Transformed {} records", examples.len());
        Ok(EncodedDataset::new(examples))
    }

    /// Group a dataset into tensor batches. Shuffled datasets go
    /// through the seeded shuffle buffer first.
    pub fn batch<B: Backend>(
        &self,
        dataset: EncodedDataset,
        shuffle: bool,
        device:  &B::Device,
    ) -> Vec<TextBatch<B>> {
        let examples = dataset.into_examples();
        let examples = if shuffle {
            shuffle_buffer(examples, self.config.buffer_size, self.config.seed)
        } else {
            examples
        };

        let batcher = TextBatcher::<B>::new(device.clone());
        group(examples, self.config.batch_size)
            .into_iter()
            .map(|items| batcher.batch(items))
            .collect()
    }

    /// Fit on train, then return shuffled train batches and
    /// in-order validation batches.
    pub fn fit_and_transform<B: Backend>(
        &mut self,
        train:  &[Record],
        val:    &[Record],
        device: &B::Device,
    ) -> Result<(Vec<TextBatch<B>>, Vec<TextBatch<B>>)> {
        self.fit(train)?;
        let train_batches = self.batch(self.transform(train)?, true, device);
        let val_batches   = self.batch(self.transform(val)?, false, device);

        let _guard = self.span.enter();
        tracing::info!(
            "Prepared {} train and {} val batches of up to {}",
            train_batches.len(),
            val_batches.len(),
            self.config.batch_size
        );
        Ok((train_batches, val_batches))
    }

    // ─── Persistence ──────────────────────────────────────────────────────────

    pub fn save(&self) -> Result<()> {
        let _guard = self.span.enter();
        self.save_vocabulary()?;
        self.save_tokenizer()?;
        tracing::info!(
            "Saved vocabulary to '{}' and tokenizer to '{}'",
            self.store.vocab_path().display(),
            self.store.tokenizer_path().display()
        );
        Ok(())
    }

    pub fn save_vocabulary(&self) -> Result<()> {
        self.store.save_vocabulary(&self.state()?.vocab)
    }

    pub fn save_tokenizer(&self) -> Result<()> {
        self.store.save_tokenizer(&self.state()?.tokenizer)
    }

    pub fn load_vocabulary(&self) -> Result<Vocabulary> {
        self.store.load_vocabulary()
    }

    pub fn load_tokenizer(&self) -> Result<Tokenizer> {
        self.store.load_tokenizer()
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    fn config(tmp: &tempfile::TempDir) -> TokenizerConfig {
        let mut cfg = TokenizerConfig::new(tmp.path().join("vocab"), tmp.path().join("vectorizer"));
        cfg.input_seq_length = 6;
        cfg.batch_size       = 4;
        cfg.buffer_size      = 8;
        cfg
    }

    fn record(id: usize, text: &str, label: &str, label_id: u32) -> Record {
        let mut r  = Record::new(id, text, label);
        r.label_id = Some(label_id);
        r
    }

    fn animals() -> Vec<Record> {
        vec![
            record(0, "cat", "a", 0),
            record(1, "dog", "b", 1),
            record(2, "cat", "a", 0),
        ]
    }

    #[test]
    fn test_fit_builds_expected_ids() {
        let tmp     = tempfile::tempdir().unwrap();
        let mut tok = DataTokenizer::new(config(&tmp), Span::none());
        tok.fit(&animals()).unwrap();

        let vocab = tok.vocabulary().unwrap();
        assert_eq!(vocab.tokens(), &["[PAD]", "[UNK]", "cat", "dog"]);
        assert_eq!(tok.tokenize("cat dog").unwrap(), vec![2, 3]);
        assert_eq!(tok.tokenize("Cat zebra").unwrap(), vec![2, UNK_ID]);
    }

    #[test]
    fn test_unfitted_use_fails() {
        let tmp = tempfile::tempdir().unwrap();
        let tok = DataTokenizer::new(config(&tmp), Span::none());
        assert!(matches!(tok.tokenize("cat"), Err(PrepError::NotFitted)));
        assert!(matches!(tok.save(), Err(PrepError::NotFitted)));
    }

    #[test]
    fn test_tokenize_detokenize_round_trip() {
        let tmp     = tempfile::tempdir().unwrap();
        let mut tok = DataTokenizer::new(config(&tmp), Span::none());
        tok.fit(&[record(0, "the quick brown fox jumps", "a", 0)]).unwrap();

        let ids = tok.tokenize("quick fox the").unwrap();
        assert_eq!(tok.detokenize(&ids).unwrap(), "quick fox the");

        let (padded, _) = tok.pad(&ids);
        assert_eq!(tok.detokenize(&padded).unwrap(), "quick fox the");
    }

    #[test]
    fn test_greek_training_word_is_not_unknown() {
        let tmp     = tempfile::tempdir().unwrap();
        let mut tok = DataTokenizer::new(config(&tmp), Span::none());
        tok.fit(&[record(0, "ΟΔΟΣ", "a", 0)]).unwrap();

        let ids = tok.tokenize("ΟΔΟΣ").unwrap();
        assert_eq!(ids, vec![2]);
        assert_eq!(tok.detokenize(&ids).unwrap(), "οδοσ");
    }

    #[test]
    fn test_transform_classification() {
        let tmp     = tempfile::tempdir().unwrap();
        let mut tok = DataTokenizer::new(config(&tmp), Span::none());
        tok.fit(&animals()).unwrap();

        let ds = tok.transform(&[record(7, "dog cat owl", "b", 1)]).unwrap();
        let ex = &ds.examples()[0];
        assert_eq!(ex.record_id, 7);
        assert_eq!(ex.input_ids, vec![3, 2, UNK_ID, 0, 0, 0]);
        assert_eq!(ex.attention_mask, vec![1, 1, 1, 0, 0, 0]);
        assert_eq!(ex.target_ids, vec![1]);
    }

    #[test]
    fn test_left_padding_and_truncation() {
        let tmp     = tempfile::tempdir().unwrap();
        let mut cfg = config(&tmp);
        cfg.padding_side     = PaddingSide::Left;
        cfg.input_seq_length = 3;
        let mut tok = DataTokenizer::new(cfg, Span::none());
        tok.fit(&animals()).unwrap();

        assert_eq!(tok.pad(&[2]).0, vec![0, 0, 2]);
        assert_eq!(tok.pad(&[2, 3, 2, 3]).0, vec![2, 3, 2]);
    }

    #[test]
    fn test_classification_requires_label_ids() {
        let tmp     = tempfile::tempdir().unwrap();
        let mut tok = DataTokenizer::new(config(&tmp), Span::none());
        tok.fit(&animals()).unwrap();
        let err = tok.transform(&[Record::new(0, "cat", "a")]).unwrap_err();
        assert!(matches!(err, PrepError::Tokenizer(_)));
    }

    #[test]
    fn test_seq2seq_targets_are_tokenised_labels() {
        let tmp     = tempfile::tempdir().unwrap();
        let mut cfg = config(&tmp);
        cfg.task              = TaskKind::Seq2seq;
        cfg.target_seq_length = 4;
        let mut tok = DataTokenizer::new(cfg, Span::none());

        let train = vec![Record::new(0, "bonjour monde", "hello world")];
        tok.fit(&train).unwrap();

        let vocab = tok.vocabulary().unwrap();
        let hello = vocab.token_to_id("hello").unwrap();
        let world = vocab.token_to_id("world").unwrap();

        let ds = tok.transform(&train).unwrap();
        assert_eq!(ds.examples()[0].target_ids, vec![hello, world, 0, 0]);
    }

    #[test]
    fn test_fit_and_transform_batches() {
        let tmp     = tempfile::tempdir().unwrap();
        let mut tok = DataTokenizer::new(config(&tmp), Span::none());
        let train: Vec<Record> = (0..10).map(|i| record(i, "cat dog", "a", (i % 2) as u32)).collect();
        let val:   Vec<Record> = (0..3).map(|i| record(i, "dog", "b", 1)).collect();

        let (train_batches, val_batches) = tok
            .fit_and_transform::<NdArray>(&train, &val, &Default::default())
            .unwrap();

        let sizes: Vec<usize> = train_batches.iter().map(|b| b.size()).collect();
        assert_eq!(sizes, vec![4, 4, 2]);
        assert_eq!(val_batches.len(), 1);
        assert_eq!(val_batches[0].inputs.dims(), [3, 6]);
        assert_eq!(val_batches[0].targets.dims(), [3, 1]);
    }

    #[test]
    fn test_save_then_load_restores_behaviour() {
        let tmp     = tempfile::tempdir().unwrap();
        let mut tok = DataTokenizer::new(config(&tmp), Span::none());
        tok.fit(&animals()).unwrap();
        tok.save().unwrap();

        let loaded = DataTokenizer::load(config(&tmp), Span::none()).unwrap();
        assert_eq!(loaded.vocabulary().unwrap(), tok.vocabulary().unwrap());
        assert_eq!(loaded.tokenize("dog owl cat").unwrap(), tok.tokenize("dog owl cat").unwrap());
        assert_eq!(loaded.load_vocabulary().unwrap(), *tok.vocabulary().unwrap());
    }

    #[test]
    fn test_load_without_artifacts_fails() {
        let tmp = tempfile::tempdir().unwrap();
        let err = DataTokenizer::load(config(&tmp), Span::none()).err().unwrap();
        assert!(matches!(err, PrepError::MissingArtifact { .. }));
    }

    #[test]
    fn test_load_checks_special_token_positions() {
        let tmp     = tempfile::tempdir().unwrap();
        let mut cfg = config(&tmp);
        cfg.special_tokens = vec!["[SEP]".to_string()];
        let mut tok = DataTokenizer::new(cfg.clone(), Span::none());
        tok.fit(&animals()).unwrap();
        tok.save().unwrap();
        assert_eq!(tok.vocabulary().unwrap().token_to_id("[SEP]"), Some(2));
        assert!(DataTokenizer::load(cfg.clone(), Span::none()).is_ok());

        cfg.special_tokens = vec!["[CLS]".to_string()];
        let err = DataTokenizer::load(cfg, Span::none()).err().unwrap();
        assert!(matches!(err, PrepError::CorruptArtifact { .. }));
    }
}
