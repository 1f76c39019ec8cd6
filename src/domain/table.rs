// ============================================================
// Layer 3 — Tabular Data
// ============================================================
// Plain rows of features with an integer label per row.
// Feature rows are stored flat; `feature_shape` says how one row
// should be viewed by the model (e.g. [8] for a table,
// [1, 28, 28] for a single-channel image).

use serde::{Deserialize, Serialize};

use crate::domain::task::TaskKind;

/// One labelled example.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassSample {
    pub features: Vec<f32>,
    pub label:    i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TabularData {
    pub samples:       Vec<ClassSample>,
    pub feature_shape: Vec<usize>,
    pub task:          TaskKind,
}

impl TabularData {
    pub fn new(samples: Vec<ClassSample>, feature_shape: Vec<usize>, task: TaskKind) -> Self {
        Self { samples, feature_shape, task }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// Training and held-out partitions of the same dataset.
#[derive(Debug, Clone)]
pub struct TabularSplit {
    pub train: TabularData,
    pub test:  TabularData,
}
