// ============================================================
// Layer 4 — Corpus Loader
// ============================================================
// Resolves a corpus name from the request ("alice", "shakespeare",
// "mehek") to a text file under the data directory and reads it.
//
// The registry is a fixed table. Fetching the files is outside
// this crate; a registered name whose file is missing surfaces
// as an I/O error, an unregistered name as CorpusNotFound.

use std::{fs, path::PathBuf};

use crate::data::vocabulary::{TextCorpus, SEQUENCE_LENGTH};
use crate::domain::error::{EngineError, Result};
use crate::domain::traits::CorpusSource;

/// (request name, file name) for every known corpus.
const CORPORA: &[(&str, &str)] = &[
    ("alice",       "alice_1.txt"),
    ("shakespeare", "shakespeare.txt"),
    ("mehek",       "mehek.txt"),
];

/// Reads registered text corpora from one directory.
#[derive(Debug, Clone)]
pub struct CorpusLoader {
    dir: PathBuf,
}

impl CorpusLoader {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Load, tokenize and window a corpus in one step.
    pub fn load_corpus(&self, name: &str) -> Result<TextCorpus> {
        let text   = self.load_text(name)?;
        let corpus = TextCorpus::from_text(&text, SEQUENCE_LENGTH);
        tracing::info!(
            "Corpus '{}': {} tokens, vocabulary {}, {} windows",
            name,
            corpus.token_count(),
            corpus.vocab_size(),
            corpus.sample_count(),
        );
        Ok(corpus)
    }
}

impl CorpusSource for CorpusLoader {
    fn load_text(&self, name: &str) -> Result<String> {
        let file = CORPORA
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, f)| *f)
            .ok_or_else(|| EngineError::CorpusNotFound(name.to_string()))?;

        let path = self.dir.join(file);
        tracing::debug!("Reading corpus '{}' from {}", name, path.display());
        Ok(fs::read_to_string(path)?)
    }
}
