// ============================================================
// Layer 5 — Layer Registry
// ============================================================
// Static tables that resolve a descriptor's `kind` to a typed
// layer specification:
//
//   kind        args                          → LayerSpec
//   Linear      (in, out)                       Linear
//   Conv1D..3D  (in_ch, out_ch, kernel)         Conv1d/2d/3d
//   LSTM/GRU/RNN (in, hidden)                   recurrent, batch-first
//   Dropout     p, 0 <= p < 1                   Dropout
//   Flatten     (start, end), negatives count   Flatten
//               from the end
//   MaxPool1D.. (kernel, stride)                MaxPool1d/2d/3d
//   Decoder     (embed, heads, hidden)          autoregressive only
//   Output      p                               autoregressive only
//
// Activations (ReLU, Sigmoid, ...) take no arguments.
//
// Arity and argument types are checked here, before any burn
// module is allocated, so a bad descriptor never produces a
// half-built model.

use serde::{Deserialize, Serialize};

use crate::domain::descriptor::{LayerArgs, LayerDescriptor};
use crate::domain::error::{EngineError, Result};

/// Stateless element-wise or normalising activations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Activation {
    Relu,
    Sigmoid,
    Tanh,
    Gelu,
    Silu,
    LeakyRelu,
    /// Normalises over the last dimension.
    Softmax,
    /// Normalises over the last dimension.
    LogSoftmax,
}

const ACTIVATIONS: &[(&str, Activation)] = &[
    ("ReLU",       Activation::Relu),
    ("Sigmoid",    Activation::Sigmoid),
    ("Tanh",       Activation::Tanh),
    ("GELU",       Activation::Gelu),
    ("SiLU",       Activation::Silu),
    ("LeakyReLU",  Activation::LeakyRelu),
    ("Softmax",    Activation::Softmax),
    ("LogSoftmax", Activation::LogSoftmax),
];

/// A descriptor after validation. Every dimension is known to be
/// a whole positive number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum LayerSpec {
    Linear    { input: usize, output: usize },
    Conv1d    { channels_in: usize, channels_out: usize, kernel: usize },
    Conv2d    { channels_in: usize, channels_out: usize, kernel: usize },
    Conv3d    { channels_in: usize, channels_out: usize, kernel: usize },
    Lstm      { input: usize, hidden: usize },
    Gru       { input: usize, hidden: usize },
    Rnn       { input: usize, hidden: usize },
    Dropout   { prob: f64 },
    Flatten   { start: i64, end: i64 },
    MaxPool1d { kernel: usize, stride: usize },
    MaxPool2d { kernel: usize, stride: usize },
    MaxPool3d { kernel: usize, stride: usize },
    Activation(Activation),
    Decoder   { embed_dim: usize, heads: usize, hidden: usize },
    Output    { prob: f64 },
}

impl LayerSpec {
    /// Descriptor name this spec was resolved from.
    pub fn kind(&self) -> &'static str {
        match self {
            LayerSpec::Linear { .. }    => "Linear",
            LayerSpec::Conv1d { .. }    => "Conv1D",
            LayerSpec::Conv2d { .. }    => "Conv2D",
            LayerSpec::Conv3d { .. }    => "Conv3D",
            LayerSpec::Lstm { .. }      => "LSTM",
            LayerSpec::Gru { .. }       => "GRU",
            LayerSpec::Rnn { .. }       => "RNN",
            LayerSpec::Dropout { .. }   => "Dropout",
            LayerSpec::Flatten { .. }   => "Flatten",
            LayerSpec::MaxPool1d { .. } => "MaxPool1D",
            LayerSpec::MaxPool2d { .. } => "MaxPool2D",
            LayerSpec::MaxPool3d { .. } => "MaxPool3D",
            LayerSpec::Activation(a)    => ACTIVATIONS
                .iter()
                .find(|(_, act)| act == a)
                .map_or("Activation", |(name, _)| *name),
            LayerSpec::Decoder { .. }   => "Decoder",
            LayerSpec::Output { .. }    => "Output",
        }
    }
}

// ─── Layer Table ──────────────────────────────────────────────────────────────
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Arity {
    /// A single number, written either bare or as a one-element list.
    Scalar,
    /// Exactly this many positional values.
    Tuple(usize),
}

struct Entry {
    name:  &'static str,
    arity: Arity,
    build: fn(&str, &[f64]) -> Result<LayerSpec>,
}

const LAYERS: &[Entry] = &[
    Entry { name: "Linear",    arity: Arity::Tuple(2), build: |k, a| Ok(LayerSpec::Linear { input: dim(k, a[0])?, output: dim(k, a[1])? }) },
    Entry { name: "Conv1D",    arity: Arity::Tuple(3), build: |k, a| Ok(LayerSpec::Conv1d { channels_in: dim(k, a[0])?, channels_out: dim(k, a[1])?, kernel: dim(k, a[2])? }) },
    Entry { name: "Conv2D",    arity: Arity::Tuple(3), build: |k, a| Ok(LayerSpec::Conv2d { channels_in: dim(k, a[0])?, channels_out: dim(k, a[1])?, kernel: dim(k, a[2])? }) },
    Entry { name: "Conv3D",    arity: Arity::Tuple(3), build: |k, a| Ok(LayerSpec::Conv3d { channels_in: dim(k, a[0])?, channels_out: dim(k, a[1])?, kernel: dim(k, a[2])? }) },
    Entry { name: "LSTM",      arity: Arity::Tuple(2), build: |k, a| Ok(LayerSpec::Lstm { input: dim(k, a[0])?, hidden: dim(k, a[1])? }) },
    Entry { name: "GRU",       arity: Arity::Tuple(2), build: |k, a| Ok(LayerSpec::Gru { input: dim(k, a[0])?, hidden: dim(k, a[1])? }) },
    Entry { name: "RNN",       arity: Arity::Tuple(2), build: |k, a| Ok(LayerSpec::Rnn { input: dim(k, a[0])?, hidden: dim(k, a[1])? }) },
    Entry { name: "Dropout",   arity: Arity::Scalar,   build: |k, a| Ok(LayerSpec::Dropout { prob: probability(k, a[0])? }) },
    Entry { name: "Flatten",   arity: Arity::Tuple(2), build: |k, a| Ok(LayerSpec::Flatten { start: index(k, a[0])?, end: index(k, a[1])? }) },
    Entry { name: "MaxPool1D", arity: Arity::Tuple(2), build: |k, a| Ok(LayerSpec::MaxPool1d { kernel: dim(k, a[0])?, stride: dim(k, a[1])? }) },
    Entry { name: "MaxPool2D", arity: Arity::Tuple(2), build: |k, a| Ok(LayerSpec::MaxPool2d { kernel: dim(k, a[0])?, stride: dim(k, a[1])? }) },
    Entry { name: "MaxPool3D", arity: Arity::Tuple(2), build: |k, a| Ok(LayerSpec::MaxPool3d { kernel: dim(k, a[0])?, stride: dim(k, a[1])? }) },
    Entry { name: "Decoder",   arity: Arity::Tuple(3), build: |k, a| Ok(LayerSpec::Decoder { embed_dim: dim(k, a[0])?, heads: dim(k, a[1])?, hidden: dim(k, a[2])? }) },
    Entry { name: "Output",    arity: Arity::Scalar,   build: |k, a| Ok(LayerSpec::Output { prob: probability(k, a[0])? }) },
];

/// Resolve one descriptor against the layer and activation tables.
pub fn resolve(descriptor: &LayerDescriptor) -> Result<LayerSpec> {
    let kind = descriptor.kind.as_str();

    if let Some((_, activation)) = ACTIVATIONS.iter().find(|(name, _)| *name == kind) {
        return match &descriptor.args {
            None => Ok(LayerSpec::Activation(*activation)),
            Some(_) => Err(EngineError::malformed(kind, "activations take no arguments")),
        };
    }

    let entry = LAYERS
        .iter()
        .find(|e| e.name == kind)
        .ok_or_else(|| {
            tracing::warn!("Unknown layer kind '{}'", kind);
            EngineError::UnknownLayerKind(kind.to_string())
        })?;

    let values = positional(kind, entry.arity, descriptor.args.as_ref())?;
    (entry.build)(kind, &values)
}

/// Resolve every descriptor, stopping at the first invalid one.
pub fn resolve_all(descriptors: &[LayerDescriptor]) -> Result<Vec<LayerSpec>> {
    descriptors.iter().map(resolve).collect()
}

/// Unpack `args` according to the arity the kind expects.
fn positional(kind: &str, arity: Arity, args: Option<&LayerArgs>) -> Result<Vec<f64>> {
    match (arity, args) {
        (_, Some(LayerArgs::Other(v))) => Err(EngineError::malformed(
            kind,
            format!("arguments must be numbers, got {}", v),
        )),
        (Arity::Scalar, Some(LayerArgs::Scalar(v))) => Ok(vec![*v]),
        (Arity::Scalar, Some(LayerArgs::Tuple(v))) if v.len() == 1 => Ok(v.clone()),
        (Arity::Scalar, _) => Err(EngineError::malformed(kind, "expected a single number")),
        (Arity::Tuple(n), Some(LayerArgs::Tuple(v))) if v.len() == n => Ok(v.clone()),
        (Arity::Tuple(n), Some(LayerArgs::Tuple(v))) => Err(EngineError::malformed(
            kind,
            format!("expected {} arguments, got {}", n, v.len()),
        )),
        (Arity::Tuple(n), _) => Err(EngineError::malformed(
            kind,
            format!("expected a list of {} arguments", n),
        )),
    }
}

// ─── Typed Argument Parsers ───────────────────────────────────────────────────
/// Largest size accepted for any single dimension.
pub const MAX_DIM: usize = 1 << 24;

fn dim(kind: &str, v: f64) -> Result<usize> {
    if v.fract() != 0.0 || v < 1.0 || !v.is_finite() {
        return Err(EngineError::malformed(kind, format!("{} is not a positive whole number", v)));
    }
    if v > MAX_DIM as f64 {
        return Err(EngineError::malformed(kind, format!("{} exceeds the largest dimension {}", v, MAX_DIM)));
    }
    Ok(v as usize)
}

fn index(kind: &str, v: f64) -> Result<i64> {
    if v.fract() != 0.0 || !v.is_finite() {
        return Err(EngineError::malformed(kind, format!("{} is not a whole number", v)));
    }
    Ok(v as i64)
}

fn probability(kind: &str, v: f64) -> Result<f64> {
    if !(0.0..1.0).contains(&v) {
        return Err(EngineError::malformed(kind, format!("probability {} is outside [0, 1)", v)));
    }
    Ok(v)
}
