// ============================================================
// Layer 5 — ML / Model Layer (Burn)
// ============================================================
// Everything that builds, trains or runs a burn module.
//
//   registry.rs          — kind name → validated LayerSpec
//   tensor.rs            — rank-dynamic tensor for runtime-built chains
//   layers.rs            — one DynamicLayer per descriptor (+ Elman RNN,
//                          separable 3-D max pooling)
//   dynamic.rs           — descriptor list → DynamicModel
//   positional.rs        — fixed sinusoidal position table
//   autoregressive.rs    — decoder-only model + causal mask
//   objective.rs         — loss / optimizer registries, accuracy
//   trainer.rs           — classification train + test loop
//   sequence_trainer.rs  — next-token training loop
//   generator.rs         — temperature / top-k text sampling
//   backend.rs           — cpu / wgpu backend aliases
//
// Reference: Burn Book §3 (Building Blocks), §5 (Training)
//            Vaswani et al. (2017) Attention Is All You Need

pub mod registry;

pub mod tensor;

pub mod layers;

/// Sequential model assembled from descriptors
pub mod dynamic;

pub mod positional;

/// Decoder-only next-word model
pub mod autoregressive;

pub mod objective;

/// Classification training loop with per-epoch test pass
pub mod trainer;

pub mod sequence_trainer;

/// Temperature / top-k sampling from a trained model
pub mod generator;

pub mod backend;
