// ============================================================
// Data — Text Batcher
// ============================================================
// Turns tokenised examples into burn tensor batches.
//
// Grouping:
//   train  → streaming shuffle buffer of `buffer_size`, seeded,
//            then consecutive groups of `batch_size`
//   val    → consecutive groups, input order
//   The last partial group is kept.
//
// Each group becomes a TextBatch through burn's Batcher trait:
//
//   inputs          [N, S]  Int
//   attention_mask  [N, S]  Int
//   targets         [N, T]  Int   (T = 1 for classification)
//
// All examples are pre-padded, so flattening N rows of S ids
// and reshaping to [N, S] is enough.
//
// Why a shuffle buffer instead of a full shuffle?
//   It matches a streaming input pipeline: only `buffer_size`
//   items are ever held, and the output order is a pure function
//   of (input order, buffer_size, seed). Validation batches skip
//   it so evaluation order matches record order.
//
// Reference: Burn Book §4 (Batcher)
//            rand crate documentation (StdRng, gen_range)

use burn::{
    data::dataloader::batcher::Batcher,
    prelude::*,
};
use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::data::dataset::TokenizedExample;

// ─── TextBatch ────────────────────────────────────────────────────────────────
/// A group of tokenised examples as integer tensors.
/// Every tensor has the batch size as its first dimension.
///
/// B is the Burn Backend (e.g. NdArray, Wgpu), so the same
/// batch type works on any device.
#[derive(Debug, Clone)]
pub struct TextBatch<B: Backend> {
    /// Padded input ids — shape: [batch_size, input_seq_length]
    /// Row i is example i's input_ids
    pub inputs: Tensor<B, 2, Int>,

    /// Attention masks — shape: [batch_size, input_seq_length]
    /// 1 = real token, 0 = padding
    pub attention_mask: Tensor<B, 2, Int>,

    /// Targets — shape: [batch_size, 1] holding the label id for
    /// classification, or [batch_size, target_seq_length] holding
    /// right-padded label token ids for seq2seq
    pub targets: Tensor<B, 2, Int>,
}

impl<B: Backend> TextBatch<B> {
    /// Number of examples in the batch.
    pub fn size(&self) -> usize {
        self.inputs.dims()[0]
    }
}

// ─── TextBatcher ──────────────────────────────────────────────────────────────
/// Holds the target device so tensors are created on the
/// right CPU/GPU.
#[derive(Clone, Debug)]
pub struct TextBatcher<B: Backend> {
    /// Device every batch tensor is allocated on
    pub device: B::Device,
}

impl<B: Backend> TextBatcher<B> {
    pub fn new(device: B::Device) -> Self {
        Self { device }
    }

    fn matrix(&self, rows: usize, cols: usize, flat: Vec<i32>) -> Tensor<B, 2, Int> {
        Tensor::<B, 1, Int>::from_ints(flat.as_slice(), &self.device).reshape([rows, cols])
    }
}

impl<B: Backend> Batcher<TokenizedExample, TextBatch<B>> for TextBatcher<B> {
    fn batch(&self, items: Vec<TokenizedExample>) -> TextBatch<B> {
        let batch_size = items.len();
        let seq_len    = items.first().map_or(0, |e| e.input_ids.len());
        let target_len = items.first().map_or(0, |e| e.target_ids.len());

        let input_flat: Vec<i32> = items
            .iter()
            .flat_map(|e| e.input_ids.iter().map(|&x| x as i32))
            .collect();

        let mask_flat: Vec<i32> = items
            .iter()
            .flat_map(|e| e.attention_mask.iter().map(|&x| x as i32))
            .collect();

        let target_flat: Vec<i32> = items
            .iter()
            .flat_map(|e| e.target_ids.iter().map(|&x| x as i32))
            .collect();

        TextBatch {
            inputs:         self.matrix(batch_size, seq_len, input_flat),
            attention_mask: self.matrix(batch_size, seq_len, mask_flat),
            targets:        self.matrix(batch_size, target_len, target_flat),
        }
    }
}

// ─── Grouping ─────────────────────────────────────────────────────────────────

/// Streaming shuffle: keep a buffer of `buffer_size` items and
/// emit a random one each time a new item arrives. Items can
/// only move about `buffer_size` positions from where they
/// started. `buffer_size <= 1` keeps the input order.
pub fn shuffle_buffer<T>(items: Vec<T>, buffer_size: usize, seed: u64) -> Vec<T> {
    if buffer_size <= 1 {
        return items;
    }

    let mut rng    = StdRng::seed_from_u64(seed);
    let mut buffer = Vec::with_capacity(buffer_size);
    let mut out    = Vec::with_capacity(items.len());

    for item in items {
        if buffer.len() < buffer_size {
            buffer.push(item);
            continue;
        }
        let pick = rng.gen_range(0..buffer.len());
        out.push(std::mem::replace(&mut buffer[pick], item));
    }
    while !buffer.is_empty() {
        let pick = rng.gen_range(0..buffer.len());
        out.push(buffer.swap_remove(pick));
    }
    out
}

/// Consecutive groups of `batch_size`; the last one may be short.
pub fn group<T>(items: Vec<T>, batch_size: usize) -> Vec<Vec<T>> {
    let batch_size = batch_size.max(1);
    let mut groups = Vec::with_capacity(items.len().div_ceil(batch_size));
    let mut iter   = items.into_iter().peekable();
    while iter.peek().is_some() {
        groups.push(iter.by_ref().take(batch_size).collect());
    }
    groups
}
