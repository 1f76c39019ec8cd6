// ============================================================
// Layer 3 — Descriptors and Model Requests
// ============================================================
// The declarative payload a caller submits:
//
//   {
//     "type":      "dynamic" | "transformer",
//     "input":     "pima",
//     "layers":    [ {"kind": "Linear", "args": [8, 12]}, {"kind": "ReLU"}, ... ],
//     "loss":      "BCE",
//     "optimizer": {"kind": "Adam", "lr": 0.001},
//     "epoch":     3,
//     "batch_size": 10
//   }
//
// Nothing in here knows about tensors. The ml layer turns these
// plain records into burn modules.

use serde::{Deserialize, Serialize};

use crate::domain::error::{EngineError, Result};

/// Positional arguments of a descriptor, exactly as the caller wrote them.
/// `[8, 12]` becomes `Tuple`, `0.3` becomes `Scalar`. Anything else
/// (strings, nested lists, booleans) is kept as `Other` so the layer
/// registry can reject it with the kind it belongs to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LayerArgs {
    Scalar(f64),
    Tuple(Vec<f64>),
    Other(serde_json::Value),
}

/// One `{kind, args}` entry. Order in the request defines graph order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerDescriptor {
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub args: Option<LayerArgs>,
}

impl LayerDescriptor {
    pub fn new(kind: impl Into<String>, args: Option<LayerArgs>) -> Self {
        Self { kind: kind.into(), args }
    }

    /// Descriptor with a positional tuple, e.g. `Linear (8, 12)`.
    pub fn tuple(kind: impl Into<String>, args: &[f64]) -> Self {
        Self::new(kind, Some(LayerArgs::Tuple(args.to_vec())))
    }

    /// Descriptor with a single scalar, e.g. `Dropout 0.3`.
    pub fn scalar(kind: impl Into<String>, value: f64) -> Self {
        Self::new(kind, Some(LayerArgs::Scalar(value)))
    }

    /// Descriptor without arguments, e.g. `ReLU`.
    pub fn bare(kind: impl Into<String>) -> Self {
        Self::new(kind, None)
    }
}

/// Which model family a request builds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelType {
    #[default]
    Dynamic,
    Transformer,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizerSpec {
    pub kind: String,
    pub lr:   f64,
}

/// A complete training request. Immutable once handed to a builder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelRequest {
    #[serde(rename = "type", default)]
    pub model_type: ModelType,
    pub input:      String,
    pub layers:     Vec<LayerDescriptor>,
    pub loss:       String,
    pub optimizer:  OptimizerSpec,
    pub epoch:      usize,
    pub batch_size: usize,
}

impl ModelRequest {
    /// Reject requests that could never produce a training run.
    /// Descriptor contents are checked later by the model builders.
    pub fn validate(&self) -> Result<()> {
        if self.layers.is_empty() {
            return Err(EngineError::InvalidModelSpec("no layers given".into()));
        }
        if self.epoch == 0 {
            return Err(EngineError::InvalidModelSpec("epoch must be at least 1".into()));
        }
        if self.batch_size == 0 {
            return Err(EngineError::InvalidModelSpec("batch_size must be at least 1".into()));
        }
        if !(self.optimizer.lr > 0.0 && self.optimizer.lr.is_finite()) {
            return Err(EngineError::InvalidModelSpec(format!(
                "learning rate must be positive, got {}",
                self.optimizer.lr
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_classification_request() {
        let json = r#"{
            "input": "pima",
            "layers": [
                {"kind": "Linear", "args": [8, 12]},
                {"kind": "ReLU"},
                {"kind": "Dropout", "args": 0.3},
                {"kind": "Flatten", "args": [1, -1]}
            ],
            "loss": "BCE",
            "optimizer": {"kind": "Adam", "lr": 0.001},
            "epoch": 3,
            "batch_size": 10
        }"#;
        let request: ModelRequest = serde_json::from_str(json).unwrap();

        // "type" is optional and defaults to the dynamic family
        assert_eq!(request.model_type, ModelType::Dynamic);
        assert_eq!(request.layers[0], LayerDescriptor::tuple("Linear", &[8.0, 12.0]));
        assert_eq!(request.layers[1], LayerDescriptor::bare("ReLU"));
        assert_eq!(request.layers[2], LayerDescriptor::scalar("Dropout", 0.3));
        assert_eq!(request.layers[3].args, Some(LayerArgs::Tuple(vec![1.0, -1.0])));
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_parses_transformer_type() {
        let json = r#"{
            "type": "transformer",
            "input": "alice",
            "layers": [{"kind": "Decoder", "args": [100, 4, 2048]}, {"kind": "Output", "args": 0.3}],
            "loss": "CrossEntropy",
            "optimizer": {"kind": "Adam", "lr": 0.001},
            "epoch": 10,
            "batch_size": 32
        }"#;
        let request: ModelRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.model_type, ModelType::Transformer);
    }

    #[test]
    fn test_rejects_zero_epochs() {
        let request = ModelRequest {
            model_type: ModelType::Dynamic,
            input:      "pima".into(),
            layers:     vec![LayerDescriptor::bare("ReLU")],
            loss:       "BCE".into(),
            optimizer:  OptimizerSpec { kind: "Adam".into(), lr: 0.001 },
            epoch:      0,
            batch_size: 10,
        };
        assert!(matches!(request.validate(), Err(EngineError::InvalidModelSpec(_))));
    }
}
