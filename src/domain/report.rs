// ============================================================
// Layer 3 — Training Reports
// ============================================================
// The metrics records handed back to the caller once a run
// finishes. Accuracies are percentages in [0, 100].

use serde::{Deserialize, Serialize};

/// Loss and accuracy for one pass over a split.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EpochStats {
    pub loss:     f64,
    pub accuracy: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationReport {
    pub train_losses:   Vec<f64>,
    pub test_losses:    Vec<f64>,
    pub train_accs:     Vec<f64>,
    pub test_accs:      Vec<f64>,
    pub avg_train_loss: f64,
    pub avg_test_loss:  f64,
    pub avg_train_acc:  f64,
    pub avg_test_acc:   f64,
}

impl ClassificationReport {
    /// Summarise per-epoch (train, test) stats into the averaged record.
    pub fn from_epochs(epochs: &[(EpochStats, EpochStats)]) -> Self {
        let train_losses: Vec<f64> = epochs.iter().map(|(t, _)| t.loss).collect();
        let test_losses:  Vec<f64> = epochs.iter().map(|(_, v)| v.loss).collect();
        let train_accs:   Vec<f64> = epochs.iter().map(|(t, _)| t.accuracy).collect();
        let test_accs:    Vec<f64> = epochs.iter().map(|(_, v)| v.accuracy).collect();

        Self {
            avg_train_loss: mean(&train_losses),
            avg_test_loss:  mean(&test_losses),
            avg_train_acc:  mean(&train_accs),
            avg_test_acc:   mean(&test_accs),
            train_losses,
            test_losses,
            train_accs,
            test_accs,
        }
    }
}

/// Per-epoch training loss of an autoregressive run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SequenceReport {
    pub train_loss: Vec<f64>,
}

/// Whatever a training request produced, serialised untagged so the
/// JSON matches the record for the model family that ran.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TrainReport {
    Classification(ClassificationReport),
    Sequence(SequenceReport),
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().sum::<f64>() / values.len() as f64
}
