// ============================================================
// Layer 4 — Vocabulary & Windowing
// ============================================================
// Turns one raw text corpus into:
//   - a vocabulary: word ↔ dense integer index
//   - a token id stream for the whole corpus
//   - overlapping fixed-length training windows
//
// Tokenization is a plain whitespace split. No lowercasing, no
// punctuation stripping: "Alice" and "Alice," are different words.
//
// Windowing, with sequence_length = 3:
//   tokens:   a b c d e
//   sample 0: input [a b c]  target [b c d]
//   sample 1: input [b c d]  target [c d e]
//   → len(tokens) - sequence_length = 2 samples, stride 1

use std::collections::HashMap;
use std::sync::Arc;

use crate::domain::error::{EngineError, Result};

/// Window length used for every registered corpus.
pub const SEQUENCE_LENGTH: usize = 64;

/// Bidirectional word ↔ index mapping, indices `0..len` assigned in
/// first-occurrence order. Built once per corpus and never mutated.
#[derive(Debug, Clone, PartialEq)]
pub struct Vocabulary {
    words:  Vec<String>,
    counts: Vec<usize>,
    index:  HashMap<String, usize>,
}

impl Vocabulary {
    /// Count tokens and assign indices in the order words first appear.
    pub fn from_tokens<'a>(tokens: impl IntoIterator<Item = &'a str>) -> Self {
        let mut words  = Vec::new();
        let mut counts = Vec::new();
        let mut index  = HashMap::new();

        for token in tokens {
            match index.get(token) {
                Some(&id) => counts[id] += 1,
                None => {
                    index.insert(token.to_string(), words.len());
                    words.push(token.to_string());
                    counts.push(1);
                }
            }
        }

        Self { words, counts, index }
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// word_to_int
    pub fn id(&self, word: &str) -> Option<usize> {
        self.index.get(word).copied()
    }

    /// int_to_word
    pub fn word(&self, id: usize) -> Option<&str> {
        self.words.get(id).map(String::as_str)
    }

    /// How often `word` occurred in the corpus the vocabulary was built from.
    pub fn frequency(&self, word: &str) -> usize {
        self.id(word).map_or(0, |id| self.counts[id])
    }

    /// Map words to ids. There is no unknown-token fallback.
    pub fn encode<'a>(&self, words: impl IntoIterator<Item = &'a str>) -> Result<Vec<usize>> {
        words
            .into_iter()
            .map(|w| self.id(w).ok_or_else(|| EngineError::VocabularyMiss(w.to_string())))
            .collect()
    }
}

/// One training example: `input` is the window, `target` the same
/// window shifted left by one token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowedSample {
    pub input:  Vec<usize>,
    pub target: Vec<usize>,
}

/// A tokenized corpus plus its vocabulary. Windows are sliced out of
/// the id stream on demand rather than stored.
#[derive(Debug, Clone)]
pub struct TextCorpus {
    vocabulary:      Arc<Vocabulary>,
    tokens:          Vec<usize>,
    sequence_length: usize,
}

impl TextCorpus {
    pub fn from_text(text: &str, sequence_length: usize) -> Self {
        let words: Vec<&str> = text.split_whitespace().collect();
        let vocabulary = Vocabulary::from_tokens(words.iter().copied());
        // Every word is in the vocabulary by construction
        let tokens = words
            .iter()
            .filter_map(|w| vocabulary.id(w))
            .collect();

        tracing::debug!(
            "Corpus tokenized: {} tokens, {} unique words",
            words.len(),
            vocabulary.len()
        );

        Self { vocabulary: Arc::new(vocabulary), tokens, sequence_length }
    }

    pub fn vocabulary(&self) -> Arc<Vocabulary> {
        Arc::clone(&self.vocabulary)
    }

    pub fn vocab_size(&self) -> usize {
        self.vocabulary.len()
    }

    pub fn sequence_length(&self) -> usize {
        self.sequence_length
    }

    pub fn token_count(&self) -> usize {
        self.tokens.len()
    }

    pub fn sample_count(&self) -> usize {
        self.tokens.len().saturating_sub(self.sequence_length)
    }

    pub fn sample(&self, index: usize) -> Option<WindowedSample> {
        if index >= self.sample_count() {
            return None;
        }
        let span = &self.tokens[index..index + self.sequence_length + 1];
        Some(WindowedSample {
            input:  span[..self.sequence_length].to_vec(),
            target: span[1..].to_vec(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEXT: &str = "the cat sat on the mat and the cat ran";

    #[test]
    fn test_first_occurrence_order() {
        let corpus = TextCorpus::from_text(TEXT, 3);
        let vocab  = corpus.vocabulary();

        assert_eq!(vocab.len(), 7);
        assert_eq!(vocab.id("the"), Some(0));
        assert_eq!(vocab.id("cat"), Some(1));
        assert_eq!(vocab.id("ran"), Some(6));
        assert_eq!(vocab.frequency("the"), 3);
    }

    #[test]
    fn test_vocabulary_round_trip() {
        let corpus = TextCorpus::from_text(TEXT, 3);
        let vocab  = corpus.vocabulary();
        for i in 0..vocab.len() {
            let word = vocab.word(i).unwrap();
            assert_eq!(vocab.id(word), Some(i));
        }
    }

    #[test]
    fn test_window_count_and_shift() {
        let corpus = TextCorpus::from_text(TEXT, 3);
        assert_eq!(corpus.token_count(), 10);
        assert_eq!(corpus.sample_count(), 10 - 3);

        for i in 0..corpus.sample_count() {
            let s = corpus.sample(i).unwrap();
            assert_eq!(s.input.len(), 3);
            assert_eq!(s.target.len(), 3);
            // target is the input shifted left by one token
            assert_eq!(&s.input[1..], &s.target[..2]);
        }
        assert!(corpus.sample(corpus.sample_count()).is_none());
    }

    #[test]
    fn test_short_corpus_has_no_windows() {
        let corpus = TextCorpus::from_text("only three words", 3);
        assert_eq!(corpus.sample_count(), 0);
    }

    #[test]
    fn test_no_punctuation_normalisation() {
        let vocab = Vocabulary::from_tokens("Alice Alice, alice".split_whitespace());
        assert_eq!(vocab.len(), 3);
    }

    #[test]
    fn test_encode_reports_missing_word() {
        let vocab = Vocabulary::from_tokens("a b c".split_whitespace());
        assert_eq!(vocab.encode(["a", "c"]).unwrap(), vec![0, 2]);
        match vocab.encode(["a", "zebra"]) {
            Err(EngineError::VocabularyMiss(w)) => assert_eq!(w, "zebra"),
            other => panic!("expected VocabularyMiss, got {other:?}"),
        }
    }
}
