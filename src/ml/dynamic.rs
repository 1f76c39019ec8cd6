// ============================================================
// Layer 5 — Dynamic Model Builder
// ============================================================
// descriptor list → validated LayerSpecs → DynamicModel
//
// Construction happens in two passes:
//   1. every descriptor is resolved against the registry
//   2. only then are burn modules allocated
// so a request with one bad descriptor never yields a model.
//
// Forward is a strict left-to-right chain over a DynTensor.

use burn::prelude::*;

use crate::domain::descriptor::LayerDescriptor;
use crate::domain::error::{EngineError, Result};
use crate::ml::layers::DynamicLayer;
use crate::ml::registry::{self, LayerSpec};
use crate::ml::tensor::DynTensor;

#[derive(Config, Debug)]
pub struct DynamicModelConfig {
    pub layers: Vec<LayerSpec>,
}

impl DynamicModelConfig {
    /// Validate the whole descriptor list up front.
    pub fn from_descriptors(descriptors: &[LayerDescriptor]) -> Result<Self> {
        if descriptors.is_empty() {
            return Err(EngineError::InvalidModelSpec("a model needs at least one layer".into()));
        }

        let layers = registry::resolve_all(descriptors)?;

        if let Some(spec) = layers
            .iter()
            .find(|s| matches!(s, LayerSpec::Decoder { .. } | LayerSpec::Output { .. }))
        {
            return Err(EngineError::UnsupportedLayer {
                kind:  spec.kind().to_string(),
                model: "dynamic",
            });
        }

        Ok(Self::new(layers))
    }

    pub fn init<B: Backend>(&self, device: &B::Device) -> DynamicModel<B> {
        let layers = self
            .layers
            .iter()
            .map(|spec| DynamicLayer::init(spec, device))
            .collect();

        tracing::debug!(
            "Dynamic model: {}",
            self.layers.iter().map(LayerSpec::kind).collect::<Vec<_>>().join(" → ")
        );

        DynamicModel { layers }
    }
}

#[derive(Module, Debug)]
pub struct DynamicModel<B: Backend> {
    pub layers: Vec<DynamicLayer<B>>,
}

impl<B: Backend> DynamicModel<B> {
    pub fn forward(&self, input: DynTensor<B>) -> Result<DynTensor<B>> {
        self.layers
            .iter()
            .enumerate()
            .try_fold(input, |x, (index, layer)| layer.forward(index, x))
    }

    pub fn depth(&self) -> usize {
        self.layers.len()
    }
}
