// ============================================================
// Layer 2 — GenerateUseCase
// ============================================================
// Extends a prompt with a previously trained transformer:
//
//   Step 1: Load the saved request             (Layer 6 - infra)
//   Step 2: Rebuild the corpus vocabulary      (Layer 4 - data)
//   Step 3: Rebuild the architecture           (Layer 5 - ml)
//   Step 4: Load the trained weights           (Layer 6 - infra)
//   Step 5: Sample word by word                (Layer 5 - ml)
//
// The vocabulary is not stored in the checkpoint. It is rebuilt
// from the same corpus file, which yields the same word → id map.

use anyhow::{bail, Result};
use burn::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::data::corpus::CorpusLoader;
use crate::domain::descriptor::{ModelRequest, ModelType};
use crate::infra::checkpoint::CheckpointManager;
use crate::ml::{
    autoregressive::{AutoregressiveConfig, AutoregressiveModel},
    backend::{CpuInferBackend, DeviceKind, GpuInferBackend},
    generator::{Generator, SamplingOptions},
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateConfig {
    pub checkpoint_dir: PathBuf,
    pub data_dir:       PathBuf,
    pub device:         DeviceKind,
    pub prompt:         String,
    pub sampling:       SamplingOptions,
    /// `None` samples from entropy.
    pub seed:           Option<u64>,
}

pub struct GenerateUseCase {
    config: GenerateConfig,
}

impl GenerateUseCase {
    pub fn new(config: GenerateConfig) -> Self {
        Self { config }
    }

    /// Returns the prompt followed by the generated words.
    pub fn execute(&self) -> Result<String> {
        let cfg = &self.config;
        cfg.sampling.validate()?;

        // ── Step 1: Saved request ─────────────────────────────────────────────
        let ckpt    = CheckpointManager::new(&cfg.checkpoint_dir)?;
        let request = ckpt.load_request()?;
        if request.model_type != ModelType::Transformer {
            bail!(
                "Checkpoint '{}' holds a {:?} model; only transformer models generate text",
                ckpt.dir().display(),
                request.model_type,
            );
        }

        match cfg.device {
            DeviceKind::Cpu  => self.run::<CpuInferBackend>(&ckpt, &request, DeviceKind::cpu_device()),
            DeviceKind::Wgpu => self.run::<GpuInferBackend>(&ckpt, &request, DeviceKind::wgpu_device()),
        }
    }

    fn run<B: Backend>(&self, ckpt: &CheckpointManager, request: &ModelRequest, device: B::Device) -> Result<String> {
        // ── Step 2: Vocabulary ────────────────────────────────────────────────
        let corpus = CorpusLoader::new(&self.config.data_dir).load_corpus(&request.input)?;

        // ── Step 3 + 4: Architecture, then weights ────────────────────────────
        let model_cfg = AutoregressiveConfig::from_descriptors(
            &request.layers,
            corpus.vocab_size(),
            corpus.sequence_length(),
        )?;
        let model: AutoregressiveModel<B> = model_cfg.init(&device);
        let model = ckpt.load_model::<B, _>(model, &device)?;
        tracing::info!("Loaded {} decoder model from '{}'", model.depth(), ckpt.dir().display());

        // ── Step 5: Sample ────────────────────────────────────────────────────
        let mut generator = Generator::new(model, corpus.vocabulary(), device, self.config.seed);
        let text = generator.generate(&self.config.prompt, self.config.sampling)?;
        Ok(text)
    }
}
