// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// Cross-cutting file concerns that don't belong in any one
// business layer:
//
//   checkpoint.rs — Saving and loading model weights with Burn's
//                   CompactRecorder, plus the request JSON that
//                   rebuilds the architecture before loading.
//
//   metrics.rs    — Per-epoch loss/accuracy rows written to a
//                   CSV file for later plotting.
//
// Reference: Burn Book §5 (Checkpointing)

/// Model checkpoint saving and loading
pub mod checkpoint;

/// Training metrics CSV logger
pub mod metrics;
