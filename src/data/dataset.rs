// ============================================================
// Data — Tokenised Examples
// ============================================================
// TokenizedExample is one record after tokenisation: fixed-length
// input ids, a matching attention mask and the target ids.
//
//   input_ids       len == input_seq_length
//   attention_mask  1 = real token, 0 = padding
//   target_ids      [label_id] for classification,
//                   padded label tokens for seq2seq
//
// EncodedDataset implements burn's Dataset trait so examples can
// also be fed through burn's DataLoader.

use burn::data::dataset::Dataset;
use serde::{Deserialize, Serialize};

use crate::config::PaddingSide;

/// One record after tokenisation and padding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenizedExample {
    /// Id of the record this example came from
    pub record_id: usize,

    /// Token ids padded or truncated to input_seq_length.
    /// Out-of-vocabulary words are [UNK] (id 1), padding is 0
    pub input_ids: Vec<u32>,

    /// Same length as input_ids. 1 = real token, 0 = padding
    pub attention_mask: Vec<u32>,

    /// `[label_id]` for classification, or the label's token ids
    /// right-padded to target_seq_length for seq2seq
    pub target_ids: Vec<u32>,
}

/// Cut `ids` to `length` keeping the head, then pad with `pad_id`
/// on `side`. Returns the ids and their attention mask.
pub fn pad_or_truncate(
    ids:    &[u32],
    length: usize,
    pad_id: u32,
    side:   PaddingSide,
) -> (Vec<u32>, Vec<u32>) {
    let kept    = &ids[..ids.len().min(length)];
    let padding = length - kept.len();

    let mut out  = Vec::with_capacity(length);
    let mut mask = Vec::with_capacity(length);
    match side {
        PaddingSide::Right => {
            out.extend_from_slice(kept);
            out.extend(std::iter::repeat(pad_id).take(padding));
            mask.extend(std::iter::repeat(1).take(kept.len()));
            mask.extend(std::iter::repeat(0).take(padding));
        }
        PaddingSide::Left => {
            out.extend(std::iter::repeat(pad_id).take(padding));
            out.extend_from_slice(kept);
            mask.extend(std::iter::repeat(0).take(padding));
            mask.extend(std::iter::repeat(1).take(kept.len()));
        }
    }
    (out, mask)
}

#[derive(Debug)]
pub struct EncodedDataset {
    examples: Vec<TokenizedExample>,
}

impl EncodedDataset {
    pub fn new(examples: Vec<TokenizedExample>) -> Self {
        Self { examples }
    }

    pub fn examples(&self) -> &[TokenizedExample] {
        &self.examples
    }

    pub fn into_examples(self) -> Vec<TokenizedExample> {
        self.examples
    }
}

impl Dataset<TokenizedExample> for EncodedDataset {
    fn get(&self, index: usize) -> Option<TokenizedExample> {
        self.examples.get(index).cloned()
    }

    fn len(&self) -> usize {
        self.examples.len()
    }
}
