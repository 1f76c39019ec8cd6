// ============================================================
// Layer 3 — Engine Errors
// ============================================================
// Every failure the engine can report to its caller.
// Construction errors abort before training starts; runtime
// errors abort the whole run. Nothing here is recoverable locally.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("unknown layer kind '{0}'")]
    UnknownLayerKind(String),

    #[error("malformed arguments for '{kind}': {reason}")]
    MalformedArguments { kind: String, reason: String },

    #[error("layer '{kind}' cannot be used in a {model} model")]
    UnsupportedLayer { kind: String, model: &'static str },

    #[error("decoder descriptors disagree on embed_dim: expected {expected}, found {found}")]
    InconsistentEmbedDim { expected: usize, found: usize },

    #[error("invalid model spec: {0}")]
    InvalidModelSpec(String),

    #[error("unknown corpus '{0}'")]
    CorpusNotFound(String),

    #[error("unknown dataset '{0}'")]
    DatasetNotFound(String),

    #[error("malformed dataset '{name}' at line {line}: {reason}")]
    MalformedDataset { name: String, line: usize, reason: String },

    #[error("dataset '{0}' has no samples")]
    EmptyDataset(String),

    #[error("shape mismatch at layer {index} ({kind}): {reason}")]
    ShapeMismatch { index: usize, kind: String, reason: String },

    #[error("word '{0}' is not in the vocabulary")]
    VocabularyMiss(String),

    #[error("unknown loss '{0}'")]
    UnknownLoss(String),

    #[error("loss '{loss}' cannot be used for a {task} task")]
    IncompatibleLoss { loss: String, task: &'static str },

    #[error("unknown optimizer '{0}'")]
    UnknownOptimizer(String),

    #[error("invalid sampling settings: {0}")]
    InvalidSampling(String),

    #[error("tensor data conversion failed: {0}")]
    TensorData(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl EngineError {
    pub fn malformed(kind: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedArguments { kind: kind.into(), reason: reason.into() }
    }

    pub fn shape(index: usize, kind: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ShapeMismatch { index, kind: kind.into(), reason: reason.into() }
    }
}

pub type Result<T, E = EngineError> = std::result::Result<T, E>;
