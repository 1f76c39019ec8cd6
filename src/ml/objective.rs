// ============================================================
// Layer 5 — Loss & Optimizer Registries
// ============================================================
// Maps the request's `loss` and `optimizer.kind` names to what
// the trainers run, and checks the loss fits the task:
//
//   task          allowed losses      accuracy
//   binary        BCE, MSE            output > 0.5 vs 0/1 label
//   multi-class   CrossEntropy        arg-max vs class index
//   sequence      CrossEntropy        (loss only)
//
// Outputs are always viewed as rows: [N, 1] for binary,
// [N, classes] for multi-class, [N, vocab] for sequence.

use burn::{
    nn::loss::{BinaryCrossEntropyLossConfig, CrossEntropyLossConfig, MseLoss, Reduction},
    prelude::*,
};

use crate::domain::error::{EngineError, Result};
use crate::domain::task::TaskKind;
use crate::ml::tensor::DynTensor;

/// Probabilities fed to BCE are kept inside (EPS, 1 - EPS).
const BCE_EPS: f64 = 1e-7;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LossKind {
    CrossEntropy,
    BinaryCrossEntropy,
    MeanSquared,
}

impl LossKind {
    pub fn parse(name: &str) -> Result<Self> {
        match name {
            "CrossEntropy" | "CrossEntropyLoss" => Ok(LossKind::CrossEntropy),
            "BCE" | "BCELoss"                   => Ok(LossKind::BinaryCrossEntropy),
            "MSE" | "MSELoss"                   => Ok(LossKind::MeanSquared),
            other => Err(EngineError::UnknownLoss(other.to_string())),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            LossKind::CrossEntropy       => "CrossEntropy",
            LossKind::BinaryCrossEntropy => "BCE",
            LossKind::MeanSquared        => "MSE",
        }
    }

    fn fits(&self, task: TaskKind) -> bool {
        match task {
            TaskKind::Binary => matches!(self, LossKind::BinaryCrossEntropy | LossKind::MeanSquared),
            TaskKind::MultiClass { .. } | TaskKind::Sequence => *self == LossKind::CrossEntropy,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptimizerKind {
    Adam,
    AdamW,
    Sgd,
}

impl OptimizerKind {
    pub fn parse(name: &str) -> Result<Self> {
        match name {
            "Adam"  => Ok(OptimizerKind::Adam),
            "AdamW" => Ok(OptimizerKind::AdamW),
            "SGD"   => Ok(OptimizerKind::Sgd),
            other   => Err(EngineError::UnknownOptimizer(other.to_string())),
        }
    }
}

/// A loss paired with the task it scores. Chosen once per run.
#[derive(Debug, Clone, Copy)]
pub struct Objective {
    loss: LossKind,
    task: TaskKind,
}

impl Objective {
    pub fn new(loss_name: &str, task: TaskKind) -> Result<Self> {
        let loss = LossKind::parse(loss_name)?;
        if !loss.fits(task) {
            return Err(EngineError::IncompatibleLoss {
                loss: loss.name().to_string(),
                task: task.name(),
            });
        }
        Ok(Self { loss, task })
    }

    /// View a model output as [batch, width] rows and check the width
    /// fits the task. `layer` is the index reported on mismatch.
    pub fn rows<B: Backend>(&self, output: DynTensor<B>, batch: usize, layer: usize) -> Result<Tensor<B, 2>> {
        let dims = output.dims();
        let rows = match output {
            DynTensor::R1(t) if dims == [batch] => t.reshape([batch, 1]),
            DynTensor::R2(t) => t,
            _ => {
                return Err(EngineError::shape(
                    layer,
                    "output",
                    format!("expected [{}, _] rows, got {:?}", batch, dims),
                ))
            }
        };

        let [n, width] = rows.dims();
        let ok = n == batch
            && match self.task {
                TaskKind::Binary                 => width == 1,
                TaskKind::MultiClass { classes } => width >= classes,
                TaskKind::Sequence               => width >= 1,
            };
        if !ok {
            return Err(EngineError::shape(
                layer,
                "output",
                format!("output {:?} does not fit a {} task", [n, width], self.task.name()),
            ));
        }
        Ok(rows)
    }

    /// Mean loss over the batch. `output: [N, width]`, `labels: [N]`.
    pub fn loss<B: Backend>(&self, output: Tensor<B, 2>, labels: Tensor<B, 1, Int>) -> Tensor<B, 1> {
        let device = output.device();
        let [n, _] = output.dims();

        match self.loss {
            LossKind::CrossEntropy => CrossEntropyLossConfig::new()
                .init(&device)
                .forward(output, labels),
            LossKind::BinaryCrossEntropy => BinaryCrossEntropyLossConfig::new()
                .init(&device)
                .forward(output.clamp(BCE_EPS, 1.0 - BCE_EPS), labels.reshape([n, 1])),
            LossKind::MeanSquared => MseLoss::new().forward(
                output,
                labels.reshape([n, 1]).float(),
                Reduction::Mean,
            ),
        }
    }

    /// Number of rows predicted correctly. Always 0 for sequence tasks.
    pub fn correct<B: Backend>(&self, output: Tensor<B, 2>, labels: Tensor<B, 1, Int>) -> usize {
        let [n, _] = output.dims();
        let hits = match self.task {
            TaskKind::Binary => output
                .greater_elem(TaskKind::BINARY_THRESHOLD)
                .int()
                .equal(labels.reshape([n, 1])),
            TaskKind::MultiClass { .. } => output
                .argmax(1)
                .reshape([n, 1])
                .equal(labels.reshape([n, 1])),
            TaskKind::Sequence => return 0,
        };
        hits.int().sum().into_scalar().elem::<i64>() as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type TestBackend = NdArray;

    #[test]
    fn test_loss_aliases() {
        assert_eq!(LossKind::parse("BCELoss").unwrap(), LossKind::BinaryCrossEntropy);
        assert_eq!(LossKind::parse("CrossEntropy").unwrap(), LossKind::CrossEntropy);
        assert!(matches!(LossKind::parse("Hinge"), Err(EngineError::UnknownLoss(_))));
    }

    #[test]
    fn test_incompatible_losses() {
        assert!(matches!(
            Objective::new("MSE", TaskKind::MultiClass { classes: 3 }),
            Err(EngineError::IncompatibleLoss { .. })
        ));
        assert!(matches!(
            Objective::new("BCE", TaskKind::Sequence),
            Err(EngineError::IncompatibleLoss { .. })
        ));
        assert!(Objective::new("MSE", TaskKind::Binary).is_ok());
    }

    #[test]
    fn test_optimizer_names() {
        assert_eq!(OptimizerKind::parse("SGD").unwrap(), OptimizerKind::Sgd);
        assert!(matches!(OptimizerKind::parse("Lion"), Err(EngineError::UnknownOptimizer(_))));
    }

    #[test]
    fn test_binary_accuracy_thresholds() {
        let device = Default::default();
        let objective = Objective::new("BCE", TaskKind::Binary).unwrap();
        let output = Tensor::<TestBackend, 2>::from_floats([[0.9], [0.2], [0.6], [0.4]], &device);
        let labels = Tensor::<TestBackend, 1, Int>::from_ints([1, 0, 0, 0], &device);
        assert_eq!(objective.correct(output, labels), 3);
    }

    #[test]
    fn test_multiclass_accuracy_argmax() {
        let device = Default::default();
        let objective = Objective::new("CrossEntropy", TaskKind::MultiClass { classes: 3 }).unwrap();
        let output = Tensor::<TestBackend, 2>::from_floats([[0.1, 2.0, 0.3], [3.0, 0.0, 0.0]], &device);
        let labels = Tensor::<TestBackend, 1, Int>::from_ints([1, 2], &device);
        assert_eq!(objective.correct(output, labels), 1);
    }

    #[test]
    fn test_bce_loss_is_finite_on_saturated_output() {
        let device = Default::default();
        let objective = Objective::new("BCE", TaskKind::Binary).unwrap();
        let output = Tensor::<TestBackend, 2>::from_floats([[1.0], [0.0]], &device);
        let labels = Tensor::<TestBackend, 1, Int>::from_ints([0, 1], &device);
        let loss = objective.loss(output, labels).into_scalar().elem::<f64>();
        assert!(loss.is_finite());
    }

    #[test]
    fn test_rows_rejects_wrong_width() {
        let device = Default::default();
        let objective = Objective::new("BCE", TaskKind::Binary).unwrap();
        let output = DynTensor::from(Tensor::<TestBackend, 2>::zeros([4, 2], &device));
        assert!(matches!(objective.rows(output, 4, 5), Err(EngineError::ShapeMismatch { index: 5, .. })));

        let flat = DynTensor::R1(Tensor::<TestBackend, 1>::zeros([4], &device));
        assert_eq!(objective.rows(flat, 4, 5).unwrap().dims(), [4, 1]);
    }
}
