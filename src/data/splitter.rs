// ============================================================
// Layer 4 — Train/Test Splitter
// ============================================================
// Shuffles samples and splits them into two sets:
//   - Training set: used to update model weights
//   - Test set:     measured after every epoch, never trained on
//
// The shuffle is driven by a seeded StdRng so the same file and
// the same seed always give the same partition. Tabular files are
// often sorted by label; shuffling first keeps both sets mixed.
//
// Split ratio: 80% training, 20% test, seed 42 for the
// single-file datasets.

use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};

/// Seed used for every registered single-file dataset.
pub const SPLIT_SEED: u64 = 42;

/// Fraction of rows that go to the training set.
pub const TRAIN_FRACTION: f64 = 0.8;

/// Shuffle `samples` with `seed` and split into (train, test).
///
/// # Example
/// ```
/// use dynamic_model_engine::data::splitter::split_train_test;
/// let (train, test) = split_train_test((0..10).collect::<Vec<_>>(), 0.8, 42);
/// assert_eq!((train.len(), test.len()), (8, 2));
/// ```
pub fn split_train_test<T>(mut samples: Vec<T>, train_fraction: f64, seed: u64) -> (Vec<T>, Vec<T>) {
    let mut rng = StdRng::seed_from_u64(seed);
    samples.shuffle(&mut rng);

    let total    = samples.len();
    let split_at = ((total as f64) * train_fraction).round() as usize;
    let split_at = split_at.min(total);

    // samples = [0..split_at], test = [split_at..total]
    let test = samples.split_off(split_at);

    tracing::debug!(
        "Dataset split: {} training, {} test (seed {})",
        samples.len(),
        test.len(),
        seed,
    );

    (samples, test)
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_correct_split_sizes() {
        let items: Vec<usize> = (0..100).collect();
        let (train, test)     = split_train_test(items, 0.8, SPLIT_SEED);
        assert_eq!(train.len(), 80);
        assert_eq!(test.len(),  20);
    }

    #[test]
    fn test_all_items_preserved() {
        let items: Vec<usize> = (0..50).collect();
        let (train, test)     = split_train_test(items, 0.7, 7);
        let mut all: Vec<usize> = train.into_iter().chain(test).collect();
        all.sort_unstable();
        assert_eq!(all, (0..50).collect::<Vec<_>>());
    }

    #[test]
    fn test_same_seed_same_partition() {
        let a = split_train_test((0..40).collect::<Vec<usize>>(), 0.8, SPLIT_SEED);
        let b = split_train_test((0..40).collect::<Vec<usize>>(), 0.8, SPLIT_SEED);
        assert_eq!(a, b);
    }

    #[test]
    fn test_empty_dataset() {
        let items: Vec<usize> = Vec::new();
        let (train, test)     = split_train_test(items, 0.8, SPLIT_SEED);
        assert!(train.is_empty());
        assert!(test.is_empty());
    }
}
