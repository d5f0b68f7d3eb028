// ============================================================
// Data — Train/Validation Splitter
// ============================================================
// Used when the caller has a single labelled file and asks for a
// fraction of it to be held out for validation. Shuffling first
// keeps files sorted by label from producing a one-label
// validation set.

use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};

/// Shuffle `samples` and hold out `valid_fraction` of them.
///
/// Returns `(train, validation)`. A fixed `seed` gives the same
/// split on every run.
pub fn split_train_val<T>(
    mut samples:    Vec<T>,
    valid_fraction: f64,
    seed:           Option<u64>,
) -> (Vec<T>, Vec<T>) {
    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    samples.shuffle(&mut rng);

    let total    = samples.len();
    let held_out = ((total as f64) * valid_fraction.clamp(0.0, 1.0)).round() as usize;
    let val      = samples.split_off(total - held_out.min(total));

    tracing::debug!("Dataset split: {} training, {} validation", samples.len(), val.len());
    (samples, val)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_correct_split_sizes() {
        let items: Vec<usize> = (0..100).collect();
        let (train, val) = split_train_val(items, 0.2, Some(1));
        assert_eq!(train.len(), 80);
        assert_eq!(val.len(), 20);
    }

    #[test]
    fn test_all_items_preserved() {
        let items: Vec<usize> = (0..50).collect();
        let (mut train, val) = split_train_val(items, 0.3, None);
        train.extend(val);
        train.sort_unstable();
        assert_eq!(train, (0..50).collect::<Vec<_>>());
    }

    #[test]
    fn test_seed_is_reproducible() {
        let a = split_train_val((0..20).collect::<Vec<_>>(), 0.5, Some(9));
        let b = split_train_val((0..20).collect::<Vec<_>>(), 0.5, Some(9));
        assert_eq!(a, b);
    }

    #[test]
    fn test_empty_and_zero_fraction() {
        let (train, val) = split_train_val(Vec::<u8>::new(), 0.2, None);
        assert!(train.is_empty() && val.is_empty());

        let (train, val) = split_train_val((0..10).collect::<Vec<_>>(), 0.0, None);
        assert_eq!(train.len(), 10);
        assert!(val.is_empty());
    }
}
