// ============================================================
// Layer 6 — Checkpoint Manager
// ============================================================
// Saves and restores a trained model using Burn's CompactRecorder.
//
// What gets saved per run:
//   1. request.json  — the request the model was built from
//   2. model.mpk.gz  — all learned parameters
//
// Why save the request separately?
//   A record only holds parameters. To load it we first need a
//   model of exactly the same architecture, and the request's
//   descriptor list is what rebuilds it.
//
// File layout:
//   checkpoints/
//     request.json
//     model.mpk.gz
//     metrics.csv     ← written by MetricsLogger
//
// Reference: Burn Book §5 (Records and Checkpointing)

use anyhow::{Context, Result};
use std::{fs, path::{Path, PathBuf}};
use burn::{
    prelude::*,
    record::{CompactRecorder, Recorder},
};

use crate::domain::descriptor::ModelRequest;

const REQUEST_FILE: &str = "request.json";
const MODEL_FILE:   &str = "model";

/// Manages the files of one checkpoint directory.
pub struct CheckpointManager {
    dir: PathBuf,
}

impl CheckpointManager {
    /// Create the manager, creating the directory if needed.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .with_context(|| format!("Cannot create checkpoint directory '{}'", dir.display()))?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Save model weights. The recorder adds the `.mpk.gz` extension.
    pub fn save_model<B: Backend, M: Module<B>>(&self, model: &M) -> Result<()> {
        let path = self.dir.join(MODEL_FILE);

        CompactRecorder::new()
            .record(model.clone().into_record(), path.clone())
            .with_context(|| format!("Failed to save checkpoint to '{}'", path.display()))?;

        tracing::debug!("Saved weights to '{}'", path.display());
        Ok(())
    }

    /// Load saved weights into `model`, which must have the
    /// architecture the weights were saved from.
    pub fn load_model<B: Backend, M: Module<B>>(&self, model: M, device: &B::Device) -> Result<M> {
        let path = self.dir.join(MODEL_FILE);

        let record = CompactRecorder::new()
            .load(path.clone(), device)
            .with_context(|| {
                format!(
                    "Cannot load checkpoint '{}'. Have you trained the model first?",
                    path.display()
                )
            })?;

        Ok(model.load_record(record))
    }

    pub fn save_request(&self, request: &ModelRequest) -> Result<()> {
        let path = self.dir.join(REQUEST_FILE);
        let json = serde_json::to_string_pretty(request)?;

        fs::write(&path, json)
            .with_context(|| format!("Cannot write request to '{}'", path.display()))?;

        tracing::debug!("Saved request to '{}'", path.display());
        Ok(())
    }

    pub fn load_request(&self) -> Result<ModelRequest> {
        let path = self.dir.join(REQUEST_FILE);

        let json = fs::read_to_string(&path).with_context(|| {
            format!(
                "Cannot read request from '{}'. \
                 Make sure you have run 'train' before 'generate'.",
                path.display()
            )
        })?;

        serde_json::from_str(&json)
            .with_context(|| format!("'{}' is not a valid request", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    use crate::domain::descriptor::{LayerDescriptor, ModelType, OptimizerSpec};
    use crate::ml::dynamic::{DynamicModel, DynamicModelConfig};
    use crate::ml::tensor::DynTensor;

    type TestBackend = NdArray;

    fn scratch_dir(tag: &str) -> PathBuf {
        std::env::temp_dir().join(format!("dme-ckpt-{}-{}", tag, std::process::id()))
    }

    #[test]
    fn test_request_round_trip() {
        let manager = CheckpointManager::new(scratch_dir("request")).unwrap();
        let request = ModelRequest {
            model_type: ModelType::Dynamic,
            input:      "iris".into(),
            layers:     vec![LayerDescriptor::tuple("Linear", &[4.0, 3.0])],
            loss:       "CrossEntropy".into(),
            optimizer:  OptimizerSpec { kind: "SGD".into(), lr: 0.1 },
            epoch:      2,
            batch_size: 8,
        };

        manager.save_request(&request).unwrap();
        assert_eq!(manager.load_request().unwrap(), request);
    }

    #[test]
    fn test_weights_round_trip() {
        let device  = Default::default();
        let manager = CheckpointManager::new(scratch_dir("weights")).unwrap();
        let config  = DynamicModelConfig::from_descriptors(&[LayerDescriptor::tuple("Linear", &[3.0, 2.0])]).unwrap();

        let trained: DynamicModel<TestBackend> = config.init(&device);
        manager.save_model::<TestBackend, _>(&trained).unwrap();

        let fresh: DynamicModel<TestBackend> = config.init(&device);
        let loaded = manager.load_model::<TestBackend, _>(fresh, &device).unwrap();

        let x = Tensor::<TestBackend, 2>::ones([1, 3], &device);
        let a = trained.forward(DynTensor::from(x.clone())).unwrap().into_rank2().unwrap();
        let b = loaded.forward(DynTensor::from(x)).unwrap().into_rank2().unwrap();
        assert_eq!(
            a.into_data().to_vec::<f32>().unwrap(),
            b.into_data().to_vec::<f32>().unwrap()
        );
    }

    #[test]
    fn test_missing_request() {
        let manager = CheckpointManager::new(scratch_dir("missing")).unwrap();
        assert!(manager.load_request().is_err());
    }
}
