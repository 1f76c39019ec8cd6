// ============================================================
// Layer 5 — Classification Training Loop
// ============================================================
// Train + test loop for a DynamicModel on a tabular split.
//
// Key Burn insights:
//   - Training runs on the autodiff backend B for gradients
//   - model.valid() gives the same model on B::InnerBackend,
//     with dropout disabled
//   - the test batcher must therefore build InnerBackend tensors
//   - gradients are consumed by optim.step, so there is no
//     separate zero_grad between batches
//
// Per epoch:
//   train() → (avg loss over batches, accuracy %)
//   test()  → (avg loss over batches, accuracy %), no updates

use std::sync::Arc;

use burn::{
    data::dataloader::{DataLoader, DataLoaderBuilder},
    module::AutodiffModule,
    optim::{GradientsParams, Optimizer},
    prelude::*,
    tensor::backend::AutodiffBackend,
};

use crate::data::{
    batcher::{ClassBatch, ClassBatcher},
    dataset::ClassDataset,
};
use crate::domain::error::{EngineError, Result};
use crate::domain::report::{ClassificationReport, EpochStats};
use crate::domain::table::TabularSplit;
use crate::ml::dynamic::DynamicModel;
use crate::ml::objective::Objective;
use crate::ml::tensor::DynTensor;

/// Seed for shuffling training batches. Test batches keep file order.
pub const SHUFFLE_SEED: u64 = 42;

pub struct ClassificationTrainer<B: AutodiffBackend, O> {
    model:         DynamicModel<B>,
    optim:         O,
    lr:            f64,
    objective:     Objective,
    feature_shape: Vec<usize>,
    train_loader:  Arc<dyn DataLoader<ClassBatch<B>>>,
    test_loader:   Arc<dyn DataLoader<ClassBatch<B::InnerBackend>>>,
}

impl<B, O> ClassificationTrainer<B, O>
where
    B: AutodiffBackend,
    O: Optimizer<DynamicModel<B>, B>,
{
    pub fn new(
        model:      DynamicModel<B>,
        optim:      O,
        lr:         f64,
        objective:  Objective,
        split:      TabularSplit,
        batch_size: usize,
        device:     &B::Device,
    ) -> Result<Self> {
        if split.train.is_empty() {
            return Err(EngineError::EmptyDataset("training split".into()));
        }
        let feature_shape = split.train.feature_shape.clone();

        let train_loader = DataLoaderBuilder::new(ClassBatcher::<B>::new(device.clone()))
            .batch_size(batch_size)
            .shuffle(SHUFFLE_SEED)
            .num_workers(1)
            .build(ClassDataset::new(split.train));

        let test_loader = DataLoaderBuilder::new(ClassBatcher::<B::InnerBackend>::new(device.clone()))
            .batch_size(batch_size)
            .num_workers(1)
            .build(ClassDataset::new(split.test));

        Ok(Self { model, optim, lr, objective, feature_shape, train_loader, test_loader })
    }

    /// One epoch of gradient updates over the training split.
    pub fn train(&mut self) -> Result<EpochStats> {
        let mut loss_sum = 0.0f64;
        let mut batches  = 0usize;
        let mut correct  = 0usize;
        let mut total    = 0usize;

        for batch in self.train_loader.iter() {
            let n = batch.labels.dims()[0];
            let output = self
                .model
                .forward(shape_features(batch.features, &self.feature_shape)?)?;
            let output = self.objective.rows(output, n, self.model.depth())?;

            let loss = self.objective.loss(output.clone(), batch.labels.clone());
            loss_sum += loss.clone().into_scalar().elem::<f64>();
            batches  += 1;

            correct += self.objective.correct(output.detach(), batch.labels);
            total   += n;

            let grads = GradientsParams::from_grads(loss.backward(), &self.model);
            self.model = self.optim.step(self.lr, self.model.clone(), grads);
        }

        Ok(EpochStats {
            loss:     average(loss_sum, batches),
            accuracy: percent(correct, total),
        })
    }

    /// Score the test split with dropout off and no updates.
    pub fn test(&self) -> Result<EpochStats> {
        let model = self.model.valid();

        let mut loss_sum = 0.0f64;
        let mut batches  = 0usize;
        let mut correct  = 0usize;
        let mut total    = 0usize;

        for batch in self.test_loader.iter() {
            let n = batch.labels.dims()[0];
            let output = model.forward(shape_features(batch.features, &self.feature_shape)?)?;
            let output = self.objective.rows(output, n, model.depth())?;

            loss_sum += self
                .objective
                .loss(output.clone(), batch.labels.clone())
                .into_scalar()
                .elem::<f64>();
            batches += 1;

            correct += self.objective.correct(output, batch.labels);
            total   += n;
        }

        Ok(EpochStats {
            loss:     average(loss_sum, batches),
            accuracy: percent(correct, total),
        })
    }

    /// Run `n_epochs` of train + test and summarise them.
    pub fn train_test_log(&mut self, n_epochs: usize) -> Result<ClassificationReport> {
        let mut epochs = Vec::with_capacity(n_epochs);

        for epoch in 1..=n_epochs {
            let train = self.train()?;
            let test  = self.test()?;

            tracing::info!(
                "Epoch {:>3}/{} | train_loss={:.4} | train_acc={:.2}% | test_loss={:.4} | test_acc={:.2}%",
                epoch, n_epochs, train.loss, train.accuracy, test.loss, test.accuracy,
            );
            epochs.push((train, test));
        }

        Ok(ClassificationReport::from_epochs(&epochs))
    }

    pub fn into_model(self) -> DynamicModel<B> {
        self.model
    }
}

/// View flat feature rows [N, F] as [N, ...feature_shape].
fn shape_features<B: Backend>(features: Tensor<B, 2>, feature_shape: &[usize]) -> Result<DynTensor<B>> {
    let [n, _] = features.dims();
    let mut dims = Vec::with_capacity(feature_shape.len() + 1);
    dims.push(n);
    dims.extend_from_slice(feature_shape);
    DynTensor::from(features)
        .reshape(&dims)
        .map_err(|reason| EngineError::shape(0, "input", reason))
}

fn average(sum: f64, count: usize) -> f64 {
    if count == 0 { f64::NAN } else { sum / count as f64 }
}

fn percent(correct: usize, total: usize) -> f64 {
    if total == 0 { 0.0 } else { 100.0 * correct as f64 / total as f64 }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::{Autodiff, NdArray};
    use burn::optim::AdamConfig;
    use rand::{rngs::StdRng, Rng, SeedableRng};

    use crate::domain::descriptor::LayerDescriptor;
    use crate::domain::table::{ClassSample, TabularData};
    use crate::domain::task::TaskKind;
    use crate::ml::dynamic::DynamicModelConfig;

    type TestBackend = Autodiff<NdArray>;

    /// Two well separated clusters in 8 dimensions.
    fn separable(n: usize, seed: u64) -> Vec<ClassSample> {
        let mut rng = StdRng::seed_from_u64(seed);
        (0..n)
            .map(|i| {
                let label  = (i % 2) as i64;
                let centre = if label == 1 { 1.0 } else { -1.0 };
                let features = (0..8).map(|_| centre + rng.gen_range(-0.3..0.3)).collect();
                ClassSample { features, label }
            })
            .collect()
    }

    fn split(task: TaskKind) -> TabularSplit {
        TabularSplit {
            train: TabularData::new(separable(160, 1), vec![8], task),
            test:  TabularData::new(separable(40, 2),  vec![8], task),
        }
    }

    fn mlp() -> Vec<LayerDescriptor> {
        vec![
            LayerDescriptor::tuple("Linear", &[8.0, 12.0]),
            LayerDescriptor::bare("ReLU"),
            LayerDescriptor::tuple("Linear", &[12.0, 8.0]),
            LayerDescriptor::bare("ReLU"),
            LayerDescriptor::tuple("Linear", &[8.0, 1.0]),
            LayerDescriptor::bare("Sigmoid"),
        ]
    }

    #[test]
    fn test_binary_training_reduces_loss() {
        TestBackend::seed(7);
        let device = Default::default();
        let model  = DynamicModelConfig::from_descriptors(&mlp()).unwrap().init::<TestBackend>(&device);
        let objective = Objective::new("BCE", TaskKind::Binary).unwrap();

        let mut trainer = ClassificationTrainer::new(
            model,
            AdamConfig::new().init(),
            0.01,
            objective,
            split(TaskKind::Binary),
            10,
            &device,
        )
        .unwrap();

        let report = trainer.train_test_log(3).unwrap();

        assert_eq!(report.train_losses.len(), 3);
        assert!(report.train_losses.iter().all(|l| l.is_finite()));
        assert!(report.test_losses.iter().all(|l| l.is_finite()));
        assert!(report.train_losses[2] < report.train_losses[0]);
        assert!(report.avg_train_acc >= 0.0 && report.avg_train_acc <= 100.0);
        assert!(report.avg_test_acc >= 0.0 && report.avg_test_acc <= 100.0);
    }

    #[test]
    fn test_multiclass_image_rows() {
        let device = Default::default();
        let task   = TaskKind::MultiClass { classes: 2 };
        let model  = DynamicModelConfig::from_descriptors(&[
            LayerDescriptor::tuple("Conv1D", &[2.0, 3.0, 2.0]),
            LayerDescriptor::bare("ReLU"),
            LayerDescriptor::tuple("Flatten", &[1.0, -1.0]),
            LayerDescriptor::tuple("Linear", &[9.0, 2.0]),
        ])
        .unwrap()
        .init::<TestBackend>(&device);

        let mut data = split(task);
        data.train.feature_shape = vec![2, 4];
        data.test.feature_shape  = vec![2, 4];

        let mut trainer = ClassificationTrainer::new(
            model,
            AdamConfig::new().init(),
            0.01,
            Objective::new("CrossEntropy", task).unwrap(),
            data,
            16,
            &device,
        )
        .unwrap();

        let stats = trainer.train().unwrap();
        assert!(stats.loss.is_finite());
        let test = trainer.test().unwrap();
        assert!(test.accuracy >= 0.0 && test.accuracy <= 100.0);
    }

    #[test]
    fn test_output_width_mismatch() {
        let device = Default::default();
        let model  = DynamicModelConfig::from_descriptors(&[LayerDescriptor::tuple("Linear", &[8.0, 3.0])])
            .unwrap()
            .init::<TestBackend>(&device);

        let mut trainer = ClassificationTrainer::new(
            model,
            AdamConfig::new().init(),
            0.01,
            Objective::new("BCE", TaskKind::Binary).unwrap(),
            split(TaskKind::Binary),
            10,
            &device,
        )
        .unwrap();

        assert!(matches!(trainer.train(), Err(EngineError::ShapeMismatch { .. })));
    }

    #[test]
    fn test_empty_training_split() {
        let device = Default::default();
        let model  = DynamicModelConfig::from_descriptors(&mlp()).unwrap().init::<TestBackend>(&device);
        let mut data = split(TaskKind::Binary);
        data.train.samples.clear();

        let result = ClassificationTrainer::new(
            model,
            AdamConfig::new().init(),
            0.01,
            Objective::new("BCE", TaskKind::Binary).unwrap(),
            data,
            10,
            &device,
        );
        assert!(matches!(result, Err(EngineError::EmptyDataset(_))));
    }
}
