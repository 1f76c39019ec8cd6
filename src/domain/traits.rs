// ============================================================
// Layer 3 — Core Traits (Abstractions)
// ============================================================
// The data sources the engine reads from. Acquisition of the
// actual files is someone else's job; these traits only say
// "give me the data registered under this name".
//
// Implementations:
//   - CorpusLoader  → text corpora for the autoregressive model
//   - TabularLoader → CSV tables for the classification model

use crate::domain::error::Result;
use crate::domain::table::TabularSplit;

// ─── CorpusSource ─────────────────────────────────────────────────────────────
/// Anything that can resolve a corpus name to its raw text.
pub trait CorpusSource {
    /// Fails with `CorpusNotFound` for names it does not know.
    fn load_text(&self, name: &str) -> Result<String>;
}

// ─── DatasetSource ────────────────────────────────────────────────────────────
/// Anything that can resolve a dataset name to a train/test split.
pub trait DatasetSource {
    /// Fails with `DatasetNotFound` for names it does not know.
    fn load_split(&self, name: &str) -> Result<TabularSplit>;
}
