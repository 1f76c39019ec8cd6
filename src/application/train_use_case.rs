// ============================================================
// Layer 2 — TrainUseCase
// ============================================================
// Orchestrates one training request end to end:
//
//   Step 1: Read + validate the request JSON   (Layer 3 - domain)
//   Step 2: Pick the backend for the device    (Layer 5 - ml)
//   Step 3: Load the dataset or corpus         (Layer 4 - data)
//   Step 4: Build the model from descriptors   (Layer 5 - ml)
//   Step 5: Resolve loss + optimizer           (Layer 5 - ml)
//   Step 6: Run the training loop              (Layer 5 - ml)
//   Step 7: Save weights, request, metrics     (Layer 6 - infra)
//   Step 8: (transformer) optionally sample    (Layer 5 - ml)
//
// Every construction error surfaces before the first epoch.
// A failing run leaves no checkpoint behind.

use anyhow::{Context, Result};
use burn::{
    module::AutodiffModule,
    optim::{AdamConfig, AdamWConfig, Optimizer, SgdConfig},
    prelude::*,
    tensor::backend::AutodiffBackend,
};
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf, sync::Arc};

use crate::data::{corpus::CorpusLoader, tabular::TabularLoader, vocabulary::TextCorpus};
use crate::domain::{
    descriptor::{ModelRequest, ModelType},
    report::{ClassificationReport, SequenceReport, TrainReport},
    table::TabularSplit,
    traits::DatasetSource,
};
use crate::infra::{
    checkpoint::CheckpointManager,
    metrics::{EpochMetrics, MetricsLogger},
};
use crate::ml::{
    autoregressive::{AutoregressiveConfig, AutoregressiveModel},
    backend::{CpuBackend, DeviceKind, GpuBackend},
    dynamic::{DynamicModel, DynamicModelConfig},
    generator::{Generator, SamplingOptions},
    objective::{Objective, OptimizerKind},
    sequence_trainer::SequenceTrainer,
    trainer::ClassificationTrainer,
};

// ─── Training Configuration ──────────────────────────────────────────────────
// Where to read from and write to. Model hyperparameters live in
// the request file, not here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainConfig {
    pub request_path:   PathBuf,
    pub data_dir:       PathBuf,
    pub checkpoint_dir: PathBuf,
    pub device:         DeviceKind,
    pub seed:           u64,
    /// Sample from the trained model afterwards (transformer only).
    pub prompt:         Option<String>,
    pub sampling:       SamplingOptions,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            request_path:   PathBuf::from("request.json"),
            data_dir:       PathBuf::from("datasets"),
            checkpoint_dir: PathBuf::from("checkpoints"),
            device:         DeviceKind::Cpu,
            seed:           42,
            prompt:         None,
            sampling:       SamplingOptions { length: 100, temperature: 0.5, top_k: None },
        }
    }
}

/// What a finished run hands back to the CLI.
#[derive(Debug, Clone)]
pub struct TrainOutcome {
    pub report: TrainReport,
    pub sample: Option<String>,
}

// ─── TrainUseCase ─────────────────────────────────────────────────────────────
pub struct TrainUseCase {
    config: TrainConfig,
}

impl TrainUseCase {
    pub fn new(config: TrainConfig) -> Self {
        Self { config }
    }

    /// Execute the full training pipeline end to end
    pub fn execute(&self) -> Result<TrainOutcome> {
        let cfg = &self.config;

        // ── Step 1: Read the request ──────────────────────────────────────────
        let json = fs::read_to_string(&cfg.request_path)
            .with_context(|| format!("Cannot read request '{}'", cfg.request_path.display()))?;
        let request: ModelRequest = serde_json::from_str(&json)
            .with_context(|| format!("'{}' is not a valid request", cfg.request_path.display()))?;
        request.validate()?;

        tracing::info!(
            "Request: {:?} model on '{}', {} layers, {} epochs, batch {}",
            request.model_type,
            request.input,
            request.layers.len(),
            request.epoch,
            request.batch_size,
        );

        // ── Step 2: Backend dispatch ──────────────────────────────────────────
        match cfg.device {
            DeviceKind::Cpu => {
                tracing::info!("Using CPU (ndarray) backend");
                self.run::<CpuBackend>(&request, DeviceKind::cpu_device())
            }
            DeviceKind::Wgpu => {
                let device = DeviceKind::wgpu_device();
                tracing::info!("Using WGPU device: {:?}", device);
                self.run::<GpuBackend>(&request, device)
            }
        }
    }

    fn run<B: AutodiffBackend>(&self, request: &ModelRequest, device: B::Device) -> Result<TrainOutcome> {
        B::seed(self.config.seed);
        match request.model_type {
            ModelType::Dynamic     => self.run_dynamic::<B>(request, device),
            ModelType::Transformer => self.run_transformer::<B>(request, device),
        }
    }

    // ── Dynamic classification model ──────────────────────────────────────────
    fn run_dynamic<B: AutodiffBackend>(&self, request: &ModelRequest, device: B::Device) -> Result<TrainOutcome> {
        let model_cfg = DynamicModelConfig::from_descriptors(&request.layers)?;
        let optimizer = OptimizerKind::parse(&request.optimizer.kind)?;

        let split = TabularLoader::new(&self.config.data_dir)
            .load_split(&request.input)
            .with_context(|| format!("Cannot load dataset '{}'", request.input))?;
        let objective = Objective::new(&request.loss, split.train.task)?;

        let model: DynamicModel<B> = model_cfg.init(&device);
        tracing::info!("Dynamic model ready: {} layers", model.depth());

        let (report, model) = match optimizer {
            OptimizerKind::Adam  => fit_classifier(model, AdamConfig::new().init(), request, objective, split, &device)?,
            OptimizerKind::AdamW => fit_classifier(model, AdamWConfig::new().init(), request, objective, split, &device)?,
            OptimizerKind::Sgd   => fit_classifier(model, SgdConfig::new().init(), request, objective, split, &device)?,
        };

        let ckpt = CheckpointManager::new(&self.config.checkpoint_dir)?;
        ckpt.save_request(request)?;
        ckpt.save_model::<B, _>(&model)?;
        MetricsLogger::new(ckpt.dir())?.log_all(&EpochMetrics::from_classification(&report))?;
        tracing::info!("Checkpoint saved to '{}'", ckpt.dir().display());

        Ok(TrainOutcome { report: TrainReport::Classification(report), sample: None })
    }

    // ── Autoregressive sequence model ─────────────────────────────────────────
    fn run_transformer<B: AutodiffBackend>(&self, request: &ModelRequest, device: B::Device) -> Result<TrainOutcome> {
        let optimizer = OptimizerKind::parse(&request.optimizer.kind)?;
        if self.config.prompt.is_some() {
            self.config.sampling.validate()?;
        }

        let corpus = CorpusLoader::new(&self.config.data_dir)
            .load_corpus(&request.input)
            .with_context(|| format!("Cannot load corpus '{}'", request.input))?;
        let corpus = Arc::new(corpus);

        let model_cfg = AutoregressiveConfig::from_descriptors(
            &request.layers,
            corpus.vocab_size(),
            corpus.sequence_length(),
        )?;
        let model: AutoregressiveModel<B> = model_cfg.init(&device);
        tracing::info!(
            "Autoregressive model ready: {} decoders, embed_dim={}, vocab={}",
            model.depth(),
            model_cfg.embed_dim,
            model_cfg.vocab_size,
        );

        let (report, model) = match optimizer {
            OptimizerKind::Adam  => fit_sequence(model, AdamConfig::new().init(), request, Arc::clone(&corpus), &device)?,
            OptimizerKind::AdamW => fit_sequence(model, AdamWConfig::new().init(), request, Arc::clone(&corpus), &device)?,
            OptimizerKind::Sgd   => fit_sequence(model, SgdConfig::new().init(), request, Arc::clone(&corpus), &device)?,
        };

        let ckpt = CheckpointManager::new(&self.config.checkpoint_dir)?;
        ckpt.save_request(request)?;
        ckpt.save_model::<B, _>(&model)?;
        MetricsLogger::new(ckpt.dir())?.log_all(&EpochMetrics::from_sequence(&report))?;
        tracing::info!("Checkpoint saved to '{}'", ckpt.dir().display());

        let sample = match &self.config.prompt {
            Some(prompt) => {
                let mut generator = Generator::new(model.valid(), corpus.vocabulary(), device, Some(self.config.seed));
                Some(generator.generate(prompt, self.config.sampling)?)
            }
            None => None,
        };

        Ok(TrainOutcome { report: TrainReport::Sequence(report), sample })
    }
}

fn fit_classifier<B, O>(
    model:     DynamicModel<B>,
    optim:     O,
    request:   &ModelRequest,
    objective: Objective,
    split:     TabularSplit,
    device:    &B::Device,
) -> Result<(ClassificationReport, DynamicModel<B>)>
where
    B: AutodiffBackend,
    O: Optimizer<DynamicModel<B>, B>,
{
    let mut trainer = ClassificationTrainer::new(
        model,
        optim,
        request.optimizer.lr,
        objective,
        split,
        request.batch_size,
        device,
    )?;
    let report = trainer.train_test_log(request.epoch)?;
    Ok((report, trainer.into_model()))
}

fn fit_sequence<B, O>(
    model:   AutoregressiveModel<B>,
    optim:   O,
    request: &ModelRequest,
    corpus:  Arc<TextCorpus>,
    device:  &B::Device,
) -> Result<(SequenceReport, AutoregressiveModel<B>)>
where
    B: AutodiffBackend,
    O: Optimizer<AutoregressiveModel<B>, B>,
{
    let mut trainer = SequenceTrainer::new(
        model,
        optim,
        request.optimizer.lr,
        &request.loss,
        corpus,
        request.batch_size,
        device,
    )?;
    let report = trainer.train(request.epoch)?;
    Ok((report, trainer.into_model()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::descriptor::{LayerDescriptor, OptimizerSpec};

    fn scratch_dir(tag: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("dme-train-{}-{}", tag, std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn write_request(dir: &PathBuf, request: &ModelRequest) -> PathBuf {
        let path = dir.join("request.json");
        fs::write(&path, serde_json::to_string(request).unwrap()).unwrap();
        path
    }

    fn config(dir: &PathBuf, request_path: PathBuf) -> TrainConfig {
        TrainConfig {
            request_path,
            data_dir:       dir.clone(),
            checkpoint_dir: dir.join("checkpoints"),
            ..TrainConfig::default()
        }
    }

    fn write_pima(dir: &PathBuf) {
        let mut csv = String::from("a,b,c,d,e,f,g,h,outcome\n");
        for i in 0..50 {
            let label = i % 2;
            let v = if label == 1 { 1.0 } else { -1.0 };
            csv.push_str(&format!("{v},{v},{v},{v},{v},{v},{v},{v},{label}\n"));
        }
        fs::write(dir.join("pima.csv"), csv).unwrap();
    }

    fn pima_request(optimizer: &str, epoch: usize) -> ModelRequest {
        ModelRequest {
            model_type: ModelType::Dynamic,
            input:      "pima".into(),
            layers:     vec![
                LayerDescriptor::tuple("Linear", &[8.0, 4.0]),
                LayerDescriptor::bare("ReLU"),
                LayerDescriptor::tuple("Linear", &[4.0, 1.0]),
                LayerDescriptor::bare("Sigmoid"),
            ],
            loss:       "BCE".into(),
            optimizer:  OptimizerSpec { kind: optimizer.into(), lr: 0.01 },
            epoch,
            batch_size: 8,
        }
    }

    #[test]
    fn test_pima_end_to_end() {
        let dir = scratch_dir("pima");
        write_pima(&dir);

        let request = pima_request("Adam", 2);
        let cfg = config(&dir, write_request(&dir, &request));

        let outcome = TrainUseCase::new(cfg.clone()).execute().unwrap();
        match outcome.report {
            TrainReport::Classification(r) => assert_eq!(r.train_losses.len(), 2),
            other => panic!("expected classification report, got {other:?}"),
        }
        assert!(outcome.sample.is_none());

        let ckpt = CheckpointManager::new(&cfg.checkpoint_dir).unwrap();
        assert_eq!(ckpt.load_request().unwrap(), request);
        assert!(cfg.checkpoint_dir.join("metrics.csv").exists());
    }

    #[test]
    fn test_every_optimizer_trains() {
        for kind in ["Adam", "AdamW", "SGD"] {
            let dir = scratch_dir(&format!("optim-{}", kind.to_lowercase()));
            write_pima(&dir);
            let cfg = config(&dir, write_request(&dir, &pima_request(kind, 1)));

            let outcome = TrainUseCase::new(cfg).execute().unwrap();
            let TrainReport::Classification(report) = outcome.report else {
                panic!("{kind}: expected a classification report");
            };
            assert_eq!(report.train_losses.len(), 1, "{kind}");
            assert!(report.train_losses[0].is_finite(), "{kind}");
            assert!(report.test_losses[0].is_finite(), "{kind}");
        }
    }

    #[test]
    fn test_unknown_optimizer_fails_before_training() {
        let dir = scratch_dir("optim");
        let request = ModelRequest {
            model_type: ModelType::Dynamic,
            input:      "pima".into(),
            layers:     vec![LayerDescriptor::tuple("Linear", &[8.0, 1.0])],
            loss:       "BCE".into(),
            optimizer:  OptimizerSpec { kind: "Lion".into(), lr: 0.01 },
            epoch:      1,
            batch_size: 8,
        };
        let cfg = config(&dir, write_request(&dir, &request));

        let err = TrainUseCase::new(cfg.clone()).execute().unwrap_err();
        assert!(err.to_string().contains("Lion"));
        assert!(!cfg.checkpoint_dir.join("request.json").exists());
    }
}
