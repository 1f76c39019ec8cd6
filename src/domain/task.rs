use serde::{Deserialize, Serialize};

/// The three task shapes the orchestrators know how to score.
/// Chosen once when a trainer is constructed, never re-derived
/// from the dataset name afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskKind {
    /// One sigmoid output per sample, thresholded at 0.5.
    Binary,
    /// One logit per class, scored by arg-max.
    MultiClass { classes: usize },
    /// Next-token prediction over a vocabulary. Loss only.
    Sequence,
}

impl TaskKind {
    /// Probability above which a binary prediction counts as class 1.
    pub const BINARY_THRESHOLD: f64 = 0.5;

    pub fn name(&self) -> &'static str {
        match self {
            TaskKind::Binary => "binary",
            TaskKind::MultiClass { .. } => "multi-class",
            TaskKind::Sequence => "sequence",
        }
    }
}
