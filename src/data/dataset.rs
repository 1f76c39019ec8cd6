// ============================================================
// Layer 4 — Burn Datasets
// ============================================================
// Thin adapters that expose the engine's data to burn's
// DataLoader through the Dataset trait:
//   - ClassDataset  → labelled feature rows (classification)
//   - WindowDataset → sliding windows over a corpus (sequence)

use std::sync::Arc;

use burn::data::dataset::Dataset;

use crate::data::vocabulary::{TextCorpus, WindowedSample};
use crate::domain::table::{ClassSample, TabularData};

pub struct ClassDataset {
    samples: Vec<ClassSample>,
}

impl ClassDataset {
    pub fn new(data: TabularData) -> Self {
        Self { samples: data.samples }
    }
}

impl Dataset<ClassSample> for ClassDataset {
    fn get(&self, index: usize) -> Option<ClassSample> {
        self.samples.get(index).cloned()
    }

    fn len(&self) -> usize {
        self.samples.len()
    }
}

/// Windows are cut from the shared corpus on every `get`.
pub struct WindowDataset {
    corpus: Arc<TextCorpus>,
}

impl WindowDataset {
    pub fn new(corpus: Arc<TextCorpus>) -> Self {
        Self { corpus }
    }
}

impl Dataset<WindowedSample> for WindowDataset {
    fn get(&self, index: usize) -> Option<WindowedSample> {
        self.corpus.sample(index)
    }

    fn len(&self) -> usize {
        self.corpus.sample_count()
    }
}
