// ============================================================
// Layer 4 — Data Pipeline
// ============================================================
// This layer handles everything from raw files on disk all the
// way to tensor batches.
//
// Two pipelines share it:
//
//   text corpus (.txt)                  tabular dataset (.csv)
//       │                                   │
//       ▼                                   ▼
//   CorpusLoader                        TabularLoader
//       │                                   │
//       ▼                                   ▼
//   Vocabulary + TextCorpus             splitter (seeded 80/20)
//       │                                   │
//       ▼                                   ▼
//   WindowDataset                       ClassDataset
//       │                                   │
//       ▼                                   ▼
//   SequenceBatcher                     ClassBatcher
//       │                                   │
//       └───────────► DataLoader ◄──────────┘
//
// Each module is responsible for exactly one step.

/// Reads registered text corpora
pub mod corpus;

/// Reads registered CSV datasets
pub mod tabular;

/// Word ↔ index mapping and sliding windows
pub mod vocabulary;

/// Shuffles and splits rows into train/test sets
pub mod splitter;

/// Implements Burn's Dataset trait
pub mod dataset;

/// Implements Burn's Batcher trait
pub mod batcher;
