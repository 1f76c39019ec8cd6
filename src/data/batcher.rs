// ============================================================
// Layer 4 — Batchers
// ============================================================
// Implements Burn's Batcher trait for both data families.
//
// How batching works here:
//   Input:  Vec of N samples, each row of the same length L
//   Output: tensors with N as their first dimension
//
//   Rows are flattened into one long Vec, then reshaped:
//   [s1_x1, ..., s1_xL, s2_x1, ..., sN_xL] → [N, L]
//
// Classification features stay flat ([N, F]) here; the trainer
// views them as [N, ...feature_shape] before the forward pass.

use burn::{
    data::dataloader::batcher::Batcher,
    prelude::*,
};

use crate::data::vocabulary::WindowedSample;
use crate::domain::table::ClassSample;

// ─── ClassBatch ───────────────────────────────────────────────────────────────
/// A batch of labelled rows ready for the forward pass.
#[derive(Debug, Clone)]
pub struct ClassBatch<B: Backend> {
    /// Flat feature rows — shape: [batch_size, feature_len]
    pub features: Tensor<B, 2>,

    /// Class index per row — shape: [batch_size]
    pub labels: Tensor<B, 1, Int>,
}

#[derive(Clone, Debug)]
pub struct ClassBatcher<B: Backend> {
    pub device: B::Device,
}

impl<B: Backend> ClassBatcher<B> {
    pub fn new(device: B::Device) -> Self {
        Self { device }
    }
}

impl<B: Backend> Batcher<ClassSample, ClassBatch<B>> for ClassBatcher<B> {
    fn batch(&self, items: Vec<ClassSample>) -> ClassBatch<B> {
        let batch_size  = items.len();
        let feature_len = items.first().map_or(0, |s| s.features.len());

        let flat: Vec<f32> = items
            .iter()
            .flat_map(|s| s.features.iter().copied())
            .collect();

        let labels: Vec<i64> = items.iter().map(|s| s.label).collect();

        let features = Tensor::<B, 1>::from_floats(flat.as_slice(), &self.device)
            .reshape([batch_size, feature_len]);

        let labels = Tensor::<B, 1, Int>::from_ints(labels.as_slice(), &self.device);

        ClassBatch { features, labels }
    }
}

// ─── SequenceBatch ────────────────────────────────────────────────────────────
/// A batch of corpus windows.
#[derive(Debug, Clone)]
pub struct SequenceBatch<B: Backend> {
    /// Token ids — shape: [batch_size, seq_len]
    pub inputs: Tensor<B, 2, Int>,

    /// Same windows shifted left by one — shape: [batch_size, seq_len]
    pub targets: Tensor<B, 2, Int>,
}

#[derive(Clone, Debug)]
pub struct SequenceBatcher<B: Backend> {
    pub device: B::Device,
}

impl<B: Backend> SequenceBatcher<B> {
    pub fn new(device: B::Device) -> Self {
        Self { device }
    }
}

impl<B: Backend> Batcher<WindowedSample, SequenceBatch<B>> for SequenceBatcher<B> {
    fn batch(&self, items: Vec<WindowedSample>) -> SequenceBatch<B> {
        let batch_size = items.len();
        let seq_len    = items.first().map_or(0, |s| s.input.len());

        let inputs: Vec<i64> = items
            .iter()
            .flat_map(|s| s.input.iter().map(|&t| t as i64))
            .collect();

        let targets: Vec<i64> = items
            .iter()
            .flat_map(|s| s.target.iter().map(|&t| t as i64))
            .collect();

        let inputs = Tensor::<B, 1, Int>::from_ints(inputs.as_slice(), &self.device)
            .reshape([batch_size, seq_len]);

        let targets = Tensor::<B, 1, Int>::from_ints(targets.as_slice(), &self.device)
            .reshape([batch_size, seq_len]);

        SequenceBatch { inputs, targets }
    }
}
