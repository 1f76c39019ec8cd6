// ============================================================
// Layer 5 — Dynamic Layers
// ============================================================
// One DynamicLayer per descriptor. The burn module it owns (if
// any) sits in an Option field; stateless layers (activations,
// Flatten, pooling) own nothing and act on the tensor directly.
//
// Every forward step checks the rank and feature size it needs
// and reports a ShapeMismatch naming the layer index and kind,
// instead of letting the backend panic on a bad shape.

use burn::{
    module::Ignored,
    nn::{
        conv::{Conv1d, Conv1dConfig, Conv2d, Conv2dConfig, Conv3d, Conv3dConfig},
        gru::{Gru, GruConfig},
        Dropout, DropoutConfig, Linear, LinearConfig, Lstm, LstmConfig,
    },
    prelude::*,
    tensor::{
        activation,
        module::{max_pool1d, max_pool2d},
    },
};

use crate::domain::error::{EngineError, Result};
use crate::ml::registry::{Activation, LayerSpec};
use crate::ml::tensor::{map_rank, DynTensor};

/// Negative slope used by LeakyReLU.
const LEAKY_SLOPE: f64 = 0.01;

// ─── Elman RNN ────────────────────────────────────────────────────────────────
/// h_t = tanh(W_x x_t + W_h h_{t-1}), h_0 = 0
#[derive(Config, Debug)]
pub struct RnnConfig {
    pub d_input:  usize,
    pub d_hidden: usize,
}

impl RnnConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> Rnn<B> {
        Rnn {
            input:    LinearConfig::new(self.d_input, self.d_hidden).init(device),
            hidden:   LinearConfig::new(self.d_hidden, self.d_hidden).init(device),
            d_hidden: self.d_hidden,
        }
    }
}

#[derive(Module, Debug)]
pub struct Rnn<B: Backend> {
    pub input:    Linear<B>,
    pub hidden:   Linear<B>,
    pub d_hidden: usize,
}

impl<B: Backend> Rnn<B> {
    /// [batch, seq, d_input] → [batch, seq, d_hidden]
    pub fn forward(&self, x: Tensor<B, 3>) -> Tensor<B, 3> {
        let [batch, seq, _] = x.dims();
        let projected = self.input.forward(x);
        if seq == 0 {
            return projected;
        }

        let mut h = Tensor::<B, 2>::zeros([batch, self.d_hidden], &projected.device());
        let mut outputs = Vec::with_capacity(seq);
        for t in 0..seq {
            let x_t = projected
                .clone()
                .slice([0..batch, t..t + 1, 0..self.d_hidden])
                .reshape([batch, self.d_hidden]);
            h = activation::tanh(x_t + self.hidden.forward(h));
            outputs.push(h.clone().unsqueeze_dim::<3>(1));
        }
        Tensor::cat(outputs, 1)
    }
}

// ─── DynamicLayer ─────────────────────────────────────────────────────────────
#[derive(Module, Debug)]
pub struct DynamicLayer<B: Backend> {
    pub linear:  Option<Linear<B>>,
    pub conv1d:  Option<Conv1d<B>>,
    pub conv2d:  Option<Conv2d<B>>,
    pub conv3d:  Option<Conv3d<B>>,
    pub lstm:    Option<Lstm<B>>,
    pub gru:     Option<Gru<B>>,
    pub rnn:     Option<Rnn<B>>,
    pub dropout: Option<Dropout>,
    pub spec:    Ignored<LayerSpec>,
}

impl<B: Backend> DynamicLayer<B> {
    /// Allocate the burn module `spec` calls for.
    pub fn init(spec: &LayerSpec, device: &B::Device) -> Self {
        let mut layer = Self {
            linear:  None,
            conv1d:  None,
            conv2d:  None,
            conv3d:  None,
            lstm:    None,
            gru:     None,
            rnn:     None,
            dropout: None,
            spec:    Ignored(spec.clone()),
        };

        match *spec {
            LayerSpec::Linear { input, output } => {
                layer.linear = Some(LinearConfig::new(input, output).init(device));
            }
            LayerSpec::Conv1d { channels_in, channels_out, kernel } => {
                layer.conv1d = Some(Conv1dConfig::new(channels_in, channels_out, kernel).init(device));
            }
            LayerSpec::Conv2d { channels_in, channels_out, kernel } => {
                layer.conv2d = Some(
                    Conv2dConfig::new([channels_in, channels_out], [kernel, kernel]).init(device),
                );
            }
            LayerSpec::Conv3d { channels_in, channels_out, kernel } => {
                layer.conv3d = Some(
                    Conv3dConfig::new([channels_in, channels_out], [kernel, kernel, kernel]).init(device),
                );
            }
            LayerSpec::Lstm { input, hidden } => {
                layer.lstm = Some(LstmConfig::new(input, hidden, true).init(device));
            }
            LayerSpec::Gru { input, hidden } => {
                layer.gru = Some(GruConfig::new(input, hidden, true).init(device));
            }
            LayerSpec::Rnn { input, hidden } => {
                layer.rnn = Some(RnnConfig::new(input, hidden).init(device));
            }
            LayerSpec::Dropout { prob } => {
                layer.dropout = Some(DropoutConfig::new(prob).init());
            }
            _ => {}
        }

        layer
    }

    pub fn kind(&self) -> &'static str {
        self.spec.kind()
    }

    /// Apply this layer to `x`. `index` is only used for error reports.
    pub fn forward(&self, index: usize, x: DynTensor<B>) -> Result<DynTensor<B>> {
        let kind = self.kind();
        let shape_err = |reason: String| EngineError::shape(index, kind, reason);

        match *self.spec {
            LayerSpec::Linear { input, .. } => {
                let linear = owned(&self.linear, index, kind)?;
                if x.last_dim() != input {
                    return Err(shape_err(format!(
                        "expected {} input features, got {:?}",
                        input,
                        x.dims()
                    )));
                }
                Ok(map_rank!(x, t => linear.forward(t)))
            }

            LayerSpec::Conv1d { channels_in, kernel, .. } => {
                let conv = owned(&self.conv1d, index, kind)?;
                let x = x.into_rank3().map_err(shape_err)?;
                let [_, c, l] = x.dims();
                check_channels(channels_in, c).map_err(shape_err)?;
                check_extent(kernel, &[l]).map_err(shape_err)?;
                Ok(conv.forward(x).into())
            }

            LayerSpec::Conv2d { channels_in, kernel, .. } => {
                let conv = owned(&self.conv2d, index, kind)?;
                let x = x.into_rank4().map_err(shape_err)?;
                let [_, c, h, w] = x.dims();
                check_channels(channels_in, c).map_err(shape_err)?;
                check_extent(kernel, &[h, w]).map_err(shape_err)?;
                Ok(conv.forward(x).into())
            }

            LayerSpec::Conv3d { channels_in, kernel, .. } => {
                let conv = owned(&self.conv3d, index, kind)?;
                let x = x.into_rank5().map_err(shape_err)?;
                let [_, c, d, h, w] = x.dims();
                check_channels(channels_in, c).map_err(shape_err)?;
                check_extent(kernel, &[d, h, w]).map_err(shape_err)?;
                Ok(conv.forward(x).into())
            }

            LayerSpec::Lstm { input, .. } => {
                let lstm = owned(&self.lstm, index, kind)?;
                let x = sequence_input(x, input).map_err(shape_err)?;
                let (output, _state) = lstm.forward(x, None);
                Ok(output.into())
            }

            LayerSpec::Gru { input, .. } => {
                let gru = owned(&self.gru, index, kind)?;
                let x = sequence_input(x, input).map_err(shape_err)?;
                Ok(gru.forward(x, None).into())
            }

            LayerSpec::Rnn { input, .. } => {
                let rnn = owned(&self.rnn, index, kind)?;
                let x = sequence_input(x, input).map_err(shape_err)?;
                Ok(rnn.forward(x).into())
            }

            LayerSpec::Dropout { .. } => {
                let dropout = owned(&self.dropout, index, kind)?;
                Ok(map_rank!(x, t => dropout.forward(t)))
            }

            LayerSpec::Flatten { start, end } => {
                let dims = flatten_dims(&x.dims(), start, end).map_err(shape_err)?;
                x.reshape(&dims).map_err(shape_err)
            }

            LayerSpec::MaxPool1d { kernel, stride } => {
                let x = x.into_rank3().map_err(shape_err)?;
                let [_, _, l] = x.dims();
                check_extent(kernel, &[l]).map_err(shape_err)?;
                Ok(max_pool1d(x, kernel, stride, 0, 1).into())
            }

            LayerSpec::MaxPool2d { kernel, stride } => {
                let x = x.into_rank4().map_err(shape_err)?;
                let [_, _, h, w] = x.dims();
                check_extent(kernel, &[h, w]).map_err(shape_err)?;
                Ok(max_pool2d(x, [kernel, kernel], [stride, stride], [0, 0], [1, 1]).into())
            }

            LayerSpec::MaxPool3d { kernel, stride } => {
                let x = x.into_rank5().map_err(shape_err)?;
                let [_, _, d, h, w] = x.dims();
                check_extent(kernel, &[d, h, w]).map_err(shape_err)?;
                Ok(max_pool3d(x, kernel, stride).into())
            }

            LayerSpec::Activation(act) => Ok(apply_activation(act, x)),

            LayerSpec::Decoder { .. } | LayerSpec::Output { .. } => {
                Err(EngineError::UnsupportedLayer { kind: kind.to_string(), model: "dynamic" })
            }
        }
    }
}

fn owned<'a, M>(module: &'a Option<M>, index: usize, kind: &str) -> Result<&'a M> {
    module.as_ref().ok_or_else(|| {
        EngineError::InvalidModelSpec(format!("layer {} ({}) has no module attached", index, kind))
    })
}

fn check_channels(expected: usize, found: usize) -> std::result::Result<(), String> {
    if expected != found {
        return Err(format!("expected {} channels, got {}", expected, found));
    }
    Ok(())
}

fn check_extent(kernel: usize, extents: &[usize]) -> std::result::Result<(), String> {
    if extents.iter().any(|&e| e < kernel) {
        return Err(format!("kernel {} is larger than spatial extent {:?}", kernel, extents));
    }
    Ok(())
}

/// Recurrent layers take [batch, seq, features], batch first.
fn sequence_input<B: Backend>(x: DynTensor<B>, features: usize) -> std::result::Result<Tensor<B, 3>, String> {
    let x = x.into_rank3()?;
    let [_, _, f] = x.dims();
    if f != features {
        return Err(format!("expected {} input features, got {}", features, f));
    }
    Ok(x)
}

/// Collapse dims `start..=end` into one. Negative indices count from the end.
pub fn flatten_dims(dims: &[usize], start: i64, end: i64) -> std::result::Result<Vec<usize>, String> {
    let rank = dims.len() as i64;
    let resolve = |i: i64| if i < 0 { rank + i } else { i };
    let (s, e) = (resolve(start), resolve(end));
    if s < 0 || e >= rank || s > e {
        return Err(format!("cannot flatten dims {}..={} of a rank-{} tensor", start, end, rank));
    }

    let (s, e) = (s as usize, e as usize);
    let mut out = dims[..s].to_vec();
    out.push(dims[s..=e].iter().product());
    out.extend_from_slice(&dims[e + 1..]);
    Ok(out)
}

/// Max pooling over D×H×W as a 2-D pool over H×W followed by a
/// 1-D pool over D. Exact for max pooling without padding.
pub fn max_pool3d<B: Backend>(x: Tensor<B, 5>, kernel: usize, stride: usize) -> Tensor<B, 5> {
    let [n, c, d, h, w] = x.dims();

    let planes = max_pool2d(
        x.reshape([n, c * d, h, w]),
        [kernel, kernel],
        [stride, stride],
        [0, 0],
        [1, 1],
    );
    let [_, _, h2, w2] = planes.dims();

    // [n, c, d, h2*w2] → depth last so pool1d runs along it
    let columns = planes
        .reshape([n, c, d, h2 * w2])
        .swap_dims(2, 3)
        .reshape([n, c * h2 * w2, d]);
    let pooled = max_pool1d(columns, kernel, stride, 0, 1);
    let [_, _, d2] = pooled.dims();

    pooled
        .reshape([n, c, h2 * w2, d2])
        .swap_dims(2, 3)
        .reshape([n, c, d2, h2, w2])
}

fn apply_activation<B: Backend>(act: Activation, x: DynTensor<B>) -> DynTensor<B> {
    match act {
        Activation::Relu      => map_rank!(x, t => activation::relu(t)),
        Activation::Sigmoid   => map_rank!(x, t => activation::sigmoid(t)),
        Activation::Tanh      => map_rank!(x, t => activation::tanh(t)),
        Activation::Gelu      => map_rank!(x, t => activation::gelu(t)),
        Activation::Silu      => map_rank!(x, t => activation::silu(t)),
        Activation::LeakyRelu => map_rank!(x, t => activation::leaky_relu(t, LEAKY_SLOPE)),
        Activation::Softmax   => map_rank!(x, t => {
            let last = t.dims().len() - 1;
            activation::softmax(t, last)
        }),
        Activation::LogSoftmax => map_rank!(x, t => {
            let last = t.dims().len() - 1;
            activation::log_softmax(t, last)
        }),
    }
}
