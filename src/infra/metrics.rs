// ============================================================
// Layer 6 — Metrics Logger
// ============================================================
// Records training metrics to a CSV file, one row per epoch.
//
// Metrics recorded per epoch:
//   - epoch:      the epoch number (1, 2, 3, ...)
//   - train_loss: mean loss over training batches
//   - test_loss:  mean loss over test batches
//   - train_acc:  % of training rows predicted correctly
//   - test_acc:   % of test rows predicted correctly
//
// Sequence runs have no test split and no accuracy; those
// columns stay empty.
//
// Example CSV output:
//   epoch,train_loss,test_loss,train_acc,test_acc
//   1,0.684100,0.671200,61.250000,65.000000
//   2,0.590300,0.602800,70.625000,72.500000
//
// Output file: checkpoints/metrics.csv (rewritten per run)

use anyhow::Result;
use std::{
    fs::{self, File},
    io::Write,
    path::{Path, PathBuf},
};
use serde::{Deserialize, Serialize};

use crate::domain::report::{ClassificationReport, SequenceReport};

const HEADER: &str = "epoch,train_loss,test_loss,train_acc,test_acc";

/// One row of metrics data for a single training epoch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpochMetrics {
    pub epoch:      usize,
    pub train_loss: f64,
    pub test_loss:  Option<f64>,
    pub train_acc:  Option<f64>,
    pub test_acc:   Option<f64>,
}

impl EpochMetrics {
    /// Rows of a classification run, epochs numbered from 1.
    pub fn from_classification(report: &ClassificationReport) -> Vec<Self> {
        (0..report.train_losses.len())
            .map(|i| Self {
                epoch:      i + 1,
                train_loss: report.train_losses[i],
                test_loss:  report.test_losses.get(i).copied(),
                train_acc:  report.train_accs.get(i).copied(),
                test_acc:   report.test_accs.get(i).copied(),
            })
            .collect()
    }

    pub fn from_sequence(report: &SequenceReport) -> Vec<Self> {
        report
            .train_loss
            .iter()
            .enumerate()
            .map(|(i, &loss)| Self {
                epoch:      i + 1,
                train_loss: loss,
                test_loss:  None,
                train_acc:  None,
                test_acc:   None,
            })
            .collect()
    }

    fn to_csv_row(&self) -> String {
        let cell = |v: Option<f64>| v.map(|v| format!("{:.6}", v)).unwrap_or_default();
        format!(
            "{},{:.6},{},{},{}",
            self.epoch,
            self.train_loss,
            cell(self.test_loss),
            cell(self.train_acc),
            cell(self.test_acc),
        )
    }
}

/// Writes epoch metrics to `metrics.csv` for later analysis.
pub struct MetricsLogger {
    csv_path: PathBuf,
}

impl MetricsLogger {
    /// Start a fresh CSV with only the header row.
    pub fn new(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;

        let csv_path = dir.join("metrics.csv");
        let mut f = File::create(&csv_path)?;
        writeln!(f, "{}", HEADER)?;
        tracing::debug!("Created metrics CSV: '{}'", csv_path.display());

        Ok(Self { csv_path })
    }

    /// Append every row in order.
    pub fn log_all(&self, rows: &[EpochMetrics]) -> Result<()> {
        let mut f = fs::OpenOptions::new().append(true).open(&self.csv_path)?;
        for row in rows {
            writeln!(f, "{}", row.to_csv_row())?;
        }
        tracing::debug!("Logged {} epochs to '{}'", rows.len(), self.csv_path.display());
        Ok(())
    }

    pub fn csv_path(&self) -> &Path {
        &self.csv_path
    }
}
