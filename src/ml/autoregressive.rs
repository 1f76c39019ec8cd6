// ============================================================
// Layer 5 — Autoregressive Decoder-Only Model
// ============================================================
// Architecture:
//
//   token ids [batch, seq]
//       │
//       ▼
//   Embedding            → [batch, seq, embed_dim]
//   + positional table   (fixed sinusoids, truncated to seq)
//   Dropout (0.1)
//       │
//       ▼
//   Decoder block × N    each block sees the running state as both
//                        target and memory; both attentions get the
//                        causal mask
//       │
//       ▼
//   Dropout (Output p)
//   Linear               → [batch, seq, vocab_size] logits
//
// The descriptor list only names `Decoder (embed, heads, hidden)`
// entries and one trailing `Output (p)`. Vocabulary size and the
// window length come from the corpus.

use burn::{
    module::Ignored,
    nn::{
        transformer::{TransformerDecoder, TransformerDecoderConfig, TransformerDecoderInput},
        Dropout, DropoutConfig, Embedding, EmbeddingConfig, Linear, LinearConfig,
    },
    prelude::*,
    tensor::Bool,
};

use crate::domain::descriptor::LayerDescriptor;
use crate::domain::error::{EngineError, Result};
use crate::ml::positional::PositionalEncoding;
use crate::ml::registry::{self, LayerSpec};

#[derive(Config, Debug)]
pub struct DecoderSpec {
    pub embed_dim: usize,
    pub heads:     usize,
    pub hidden:    usize,
}

#[derive(Config, Debug)]
pub struct AutoregressiveConfig {
    pub vocab_size:      usize,
    pub sequence_length: usize,
    pub embed_dim:       usize,
    pub decoders:        Vec<DecoderSpec>,
    pub output_dropout:  f64,
    #[config(default = 0.1)]
    pub positional_dropout: f64,
    #[config(default = 0.1)]
    pub decoder_dropout: f64,
}

impl AutoregressiveConfig {
    /// Pre-pass over the descriptors: collect every Decoder, check they
    /// agree on `embed_dim`, and require exactly one trailing Output.
    pub fn from_descriptors(
        descriptors:     &[LayerDescriptor],
        vocab_size:      usize,
        sequence_length: usize,
    ) -> Result<Self> {
        if descriptors.is_empty() {
            return Err(EngineError::InvalidModelSpec("a model needs at least one layer".into()));
        }
        if vocab_size == 0 {
            return Err(EngineError::InvalidModelSpec("vocabulary is empty".into()));
        }

        let mut decoders: Vec<DecoderSpec> = Vec::new();
        let mut output: Option<f64> = None;

        for spec in registry::resolve_all(descriptors)? {
            match spec {
                LayerSpec::Decoder { embed_dim, heads, hidden } => {
                    if output.is_some() {
                        return Err(EngineError::InvalidModelSpec(
                            "Output must come after every Decoder".into(),
                        ));
                    }
                    if let Some(first) = decoders.first() {
                        if first.embed_dim != embed_dim {
                            return Err(EngineError::InconsistentEmbedDim {
                                expected: first.embed_dim,
                                found:    embed_dim,
                            });
                        }
                    }
                    if embed_dim % heads != 0 {
                        return Err(EngineError::malformed(
                            "Decoder",
                            format!("embed_dim {} is not divisible by {} heads", embed_dim, heads),
                        ));
                    }
                    decoders.push(DecoderSpec::new(embed_dim, heads, hidden));
                }
                LayerSpec::Output { prob } => {
                    if output.replace(prob).is_some() {
                        return Err(EngineError::InvalidModelSpec("more than one Output".into()));
                    }
                }
                other => {
                    return Err(EngineError::UnsupportedLayer {
                        kind:  other.kind().to_string(),
                        model: "autoregressive",
                    });
                }
            }
        }

        let embed_dim = decoders
            .first()
            .map(|d| d.embed_dim)
            .ok_or_else(|| EngineError::InvalidModelSpec("at least one Decoder is required".into()))?;
        let output_dropout = output
            .ok_or_else(|| EngineError::InvalidModelSpec("a trailing Output is required".into()))?;

        Ok(Self::new(vocab_size, sequence_length, embed_dim, decoders, output_dropout))
    }

    pub fn init<B: Backend>(&self, device: &B::Device) -> AutoregressiveModel<B> {
        let decoders = self
            .decoders
            .iter()
            .map(|d| {
                TransformerDecoderConfig::new(d.embed_dim, d.hidden, d.heads, 1)
                    .with_dropout(self.decoder_dropout)
                    .init(device)
            })
            .collect();

        AutoregressiveModel {
            embedding:          EmbeddingConfig::new(self.vocab_size, self.embed_dim).init(device),
            positional:         Ignored(PositionalEncoding::new(self.sequence_length, self.embed_dim)),
            positional_dropout: DropoutConfig::new(self.positional_dropout).init(),
            decoders,
            dropout:            DropoutConfig::new(self.output_dropout).init(),
            projection:         LinearConfig::new(self.embed_dim, self.vocab_size).init(device),
        }
    }
}

#[derive(Module, Debug)]
pub struct AutoregressiveModel<B: Backend> {
    pub embedding:          Embedding<B>,
    pub positional:         Ignored<PositionalEncoding>,
    pub positional_dropout: Dropout,
    pub decoders:           Vec<TransformerDecoder<B>>,
    pub dropout:            Dropout,
    pub projection:         Linear<B>,
}

impl<B: Backend> AutoregressiveModel<B> {
    /// ids: [batch, seq] → logits: [batch, seq, vocab_size]
    pub fn forward(&self, ids: Tensor<B, 2, Int>) -> Result<Tensor<B, 3>> {
        let [batch, seq] = ids.dims();
        if seq > self.positional.max_len() {
            return Err(EngineError::shape(
                0,
                "Embedding",
                format!("sequence of {} exceeds max_len {}", seq, self.positional.max_len()),
            ));
        }
        let device = ids.device();

        let x = self.embedding.forward(ids);
        let x = self.positional_dropout.forward(self.positional.forward(x));

        let mask = attention_mask::<B>(batch, seq, &device);
        let mut x = x;
        for decoder in &self.decoders {
            let input = TransformerDecoderInput::new(x.clone(), x)
                .target_mask_attn(mask.clone())
                .memory_mask_attn(mask.clone());
            x = decoder.forward(input);
        }

        Ok(self.projection.forward(self.dropout.forward(x)))
    }

    pub fn vocab_size(&self) -> usize {
        let [_, vocab] = self.projection.weight.dims();
        vocab
    }

    pub fn sequence_length(&self) -> usize {
        self.positional.max_len()
    }

    pub fn depth(&self) -> usize {
        self.decoders.len()
    }
}

// ─── Causal Mask ──────────────────────────────────────────────────────────────
/// n×n additive mask: 0.0 where `j <= i`, −∞ where `j > i`.
pub fn causal_mask(n: usize) -> Vec<f32> {
    let mut mask = Vec::with_capacity(n * n);
    for i in 0..n {
        for j in 0..n {
            mask.push(if j <= i { 0.0 } else { f32::NEG_INFINITY });
        }
    }
    mask
}

/// Boolean form of [`causal_mask`] for burn's attention, `true` where
/// attention is blocked, repeated over the batch: [batch, n, n].
pub fn attention_mask<B: Backend>(batch: usize, n: usize, device: &B::Device) -> Tensor<B, 3, Bool> {
    Tensor::<B, 1>::from_floats(causal_mask(n).as_slice(), device)
        .reshape([n, n])
        .lower_elem(0.0)
        .unsqueeze::<3>()
        .repeat_dim(0, batch)
}
