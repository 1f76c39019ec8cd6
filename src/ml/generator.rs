// ============================================================
// Layer 5 — Text Generator
// ============================================================
// Word-level autoregressive sampling from a trained model.
//
// Each step:
//   1. encode the running text with the corpus vocabulary
//   2. keep the last `sequence_length` ids as context
//   3. stop once the context reaches sequence_length - 1
//   4. forward once, take the logits at the final position
//   5. logits / temperature → softmax
//   6. optionally keep the top-k probabilities, renormalise
//   7. draw an index, append its word, repeat
//
// Sampling itself happens on the host so it can be tested
// without a model (`sample_next`).

use std::sync::Arc;

use burn::prelude::*;
use serde::{Deserialize, Serialize};
use rand::{distributions::Distribution, distributions::WeightedIndex, rngs::StdRng, Rng, SeedableRng};

use crate::data::vocabulary::Vocabulary;
use crate::domain::error::{EngineError, Result};
use crate::ml::autoregressive::AutoregressiveModel;

/// Sampling controls for one `generate` call.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SamplingOptions {
    pub length:      usize,
    pub temperature: f64,
    pub top_k:       Option<usize>,
}

impl SamplingOptions {
    pub fn validate(&self) -> Result<()> {
        if !(self.temperature > 0.0 && self.temperature.is_finite()) {
            return Err(EngineError::InvalidSampling(format!(
                "temperature must be positive, got {}",
                self.temperature
            )));
        }
        if self.top_k == Some(0) {
            return Err(EngineError::InvalidSampling("top_k must be at least 1".into()));
        }
        Ok(())
    }
}

pub struct Generator<B: Backend> {
    model:           AutoregressiveModel<B>,
    vocabulary:      Arc<Vocabulary>,
    sequence_length: usize,
    device:          B::Device,
    rng:             StdRng,
}

impl<B: Backend> Generator<B> {
    /// `seed = None` draws the sampling seed from entropy.
    pub fn new(
        model:      AutoregressiveModel<B>,
        vocabulary: Arc<Vocabulary>,
        device:     B::Device,
        seed:       Option<u64>,
    ) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None       => StdRng::from_entropy(),
        };
        let sequence_length = model.sequence_length();
        Self { model, vocabulary, sequence_length, device, rng }
    }

    pub fn generate(&mut self, prompt: &str, options: SamplingOptions) -> Result<String> {
        options.validate()?;

        let mut words: Vec<String> = prompt.split_whitespace().map(str::to_string).collect();
        if words.is_empty() {
            return Err(EngineError::InvalidSampling("prompt is empty".into()));
        }
        // Fail on unknown prompt words even when no step runs
        self.vocabulary.encode(words.iter().map(String::as_str))?;

        let limit = self.sequence_length.saturating_sub(1);

        for _ in 0..options.length {
            let ids = self.vocabulary.encode(words.iter().map(String::as_str))?;
            let context = &ids[ids.len().saturating_sub(self.sequence_length)..];
            if context.len() >= limit {
                tracing::debug!("Context reached {} tokens, stopping", context.len());
                break;
            }

            let logits = self.next_logits(context)?;
            let next   = sample_next(&logits, options.temperature, options.top_k, &mut self.rng)?;
            let word   = self
                .vocabulary
                .word(next)
                .ok_or_else(|| EngineError::VocabularyMiss(format!("#{}", next)))?;
            words.push(word.to_string());
        }

        Ok(words.join(" "))
    }

    /// Logits at the final position for one context window.
    fn next_logits(&self, context: &[usize]) -> Result<Vec<f32>> {
        let len = context.len();
        let ids: Vec<i64> = context.iter().map(|&id| id as i64).collect();
        let input = Tensor::<B, 1, Int>::from_ints(ids.as_slice(), &self.device).reshape([1, len]);

        let logits = self.model.forward(input)?;
        let [_, _, vocab] = logits.dims();
        logits
            .slice([0..1, len - 1..len, 0..vocab])
            .into_data()
            .to_vec::<f32>()
            .map_err(|e| EngineError::TensorData(format!("{:?}", e)))
    }
}

/// Draw one index from `softmax(logits / temperature)`, optionally
/// restricted to the `top_k` most probable entries. Ties keep the
/// lower index. `top_k` larger than the vocabulary is clamped.
pub fn sample_next<R: Rng>(
    logits:      &[f32],
    temperature: f64,
    top_k:       Option<usize>,
    rng:         &mut R,
) -> Result<usize> {
    if logits.is_empty() {
        return Err(EngineError::InvalidSampling("no logits to sample from".into()));
    }

    let probs = softmax(logits, temperature);

    let candidates: Vec<usize> = match top_k {
        Some(k) => {
            let mut order: Vec<usize> = (0..probs.len()).collect();
            order.sort_by(|&a, &b| {
                probs[b]
                    .partial_cmp(&probs[a])
                    .unwrap_or(std::cmp::Ordering::Equal)
                    .then(a.cmp(&b))
            });
            order.truncate(k.min(probs.len()));
            order
        }
        None => (0..probs.len()).collect(),
    };

    let dist = WeightedIndex::new(candidates.iter().map(|&i| probs[i]))
        .map_err(|e| EngineError::InvalidSampling(e.to_string()))?;
    Ok(candidates[dist.sample(rng)])
}

fn softmax(logits: &[f32], temperature: f64) -> Vec<f64> {
    let scaled: Vec<f64> = logits.iter().map(|&l| l as f64 / temperature).collect();
    let max = scaled.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let exps: Vec<f64> = scaled.iter().map(|&s| (s - max).exp()).collect();
    let sum: f64 = exps.iter().sum();
    exps.into_iter().map(|e| e / sum).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    use crate::data::vocabulary::TextCorpus;
    use crate::domain::descriptor::LayerDescriptor;
    use crate::ml::autoregressive::AutoregressiveConfig;

    type TestBackend = NdArray;

    #[test]
    fn test_top_one_is_argmax() {
        let logits = [0.1f32, 2.5, -1.0, 2.4];
        for seed in 0..20 {
            let mut rng = StdRng::seed_from_u64(seed);
            for temperature in [0.1, 1.0, 5.0] {
                assert_eq!(sample_next(&logits, temperature, Some(1), &mut rng).unwrap(), 1);
            }
        }
    }

    #[test]
    fn test_top_k_ties_keep_lower_index() {
        let logits = [1.0f32, 3.0, 3.0, 0.0];
        let mut rng = StdRng::seed_from_u64(0);
        assert_eq!(sample_next(&logits, 1.0, Some(1), &mut rng).unwrap(), 1);
    }

    #[test]
    fn test_top_k_restricts_support() {
        let logits = [5.0f32, 4.0, -3.0, -3.0, -3.0];
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..200 {
            let i = sample_next(&logits, 2.0, Some(2), &mut rng).unwrap();
            assert!(i < 2);
        }
        // k larger than the vocabulary is clamped
        assert!(sample_next(&logits, 1.0, Some(50), &mut rng).unwrap() < 5);
    }

    #[test]
    fn test_invalid_options() {
        let bad_temp = SamplingOptions { length: 5, temperature: 0.0, top_k: None };
        assert!(matches!(bad_temp.validate(), Err(EngineError::InvalidSampling(_))));
        let bad_k = SamplingOptions { length: 5, temperature: 1.0, top_k: Some(0) };
        assert!(matches!(bad_k.validate(), Err(EngineError::InvalidSampling(_))));
    }

    fn generator(seq_len: usize) -> Generator<TestBackend> {
        let corpus = TextCorpus::from_text(
            "one two three four five six seven eight nine ten eleven twelve",
            seq_len,
        );
        let device = Default::default();
        let model = AutoregressiveConfig::from_descriptors(
            &[
                LayerDescriptor::tuple("Decoder", &[8.0, 2.0, 16.0]),
                LayerDescriptor::tuple("Decoder", &[8.0, 2.0, 16.0]),
                LayerDescriptor::scalar("Output", 0.1),
            ],
            corpus.vocab_size(),
            seq_len,
        )
        .unwrap()
        .init::<TestBackend>(&device);
        Generator::new(model, corpus.vocabulary(), device, Some(5))
    }

    #[test]
    fn test_generation_extends_prompt() {
        let mut generator = generator(8);
        let options = SamplingOptions { length: 3, temperature: 1.0, top_k: None };
        let text = generator.generate("one two", options).unwrap();
        assert_eq!(text.split_whitespace().count(), 5);
        assert!(text.starts_with("one two "));
    }

    #[test]
    fn test_generation_halts_before_full_window() {
        let mut generator = generator(8);
        let options = SamplingOptions { length: 100, temperature: 1.0, top_k: None };
        let text = generator.generate("one two", options).unwrap();
        // stops as soon as the context holds sequence_length - 1 words
        assert_eq!(text.split_whitespace().count(), 7);
    }

    #[test]
    fn test_unknown_prompt_word() {
        let mut generator = generator(8);
        let options = SamplingOptions { length: 3, temperature: 1.0, top_k: Some(2) };
        assert!(matches!(
            generator.generate("one zebra", options),
            Err(EngineError::VocabularyMiss(w)) if w == "zebra"
        ));
    }

    #[test]
    fn test_empty_prompt() {
        let mut generator = generator(8);
        let options = SamplingOptions { length: 3, temperature: 1.0, top_k: None };
        assert!(matches!(generator.generate("   ", options), Err(EngineError::InvalidSampling(_))));
    }
}
