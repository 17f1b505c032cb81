// External imports
use log::debug;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

// Internal imports
use crate::error::{SpamError, SpamResult};

/// Number of rows held out for a dataset of `n_samples` rows
///
/// Rounds up, so a non-empty dataset always holds out at least one row.
pub fn held_out_size(n_samples: usize, test_fraction: f64) -> usize {
    (n_samples as f64 * test_fraction).ceil() as usize
}

/// Shuffle `rows` with a seeded RNG and split them into (train, test)
///
/// # Arguments
///
/// * `rows` - All rows; consumed by the split
/// * `test_fraction` - Fraction of rows to hold out, strictly between 0 and 1
/// * `seed` - Seed for the shuffle
///
/// # Returns
///
/// Returns two disjoint sets whose union is the input
pub fn train_test_split<T>(mut rows: Vec<T>, test_fraction: f64, seed: u64) -> SpamResult<(Vec<T>, Vec<T>)> {
    if !(test_fraction > 0.0 && test_fraction < 1.0) {
        return Err(SpamError::InvalidSplitFraction(test_fraction));
    }

    let n_samples = rows.len();
    let test_size = held_out_size(n_samples, test_fraction);
    if test_size == 0 || test_size >= n_samples {
        return Err(SpamError::DatasetTooSmall {
            rows: n_samples,
            fraction: test_fraction,
        });
    }

    let mut rng = StdRng::seed_from_u64(seed);
    rows.shuffle(&mut rng);

    let test = rows.split_off(n_samples - test_size);
    debug!("Data split: train samples: {}, test samples: {}", rows.len(), test.len());
    Ok((rows, test))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_split_sizes_and_disjointness() {
        let rows: Vec<usize> = (0..100).collect();
        let (train, test) = train_test_split(rows, 0.33, 7).unwrap();

        assert!((32..=34).contains(&test.len()), "held-out size {}", test.len());
        assert_eq!(train.len() + test.len(), 100);

        let train_set: HashSet<_> = train.iter().copied().collect();
        let test_set: HashSet<_> = test.iter().copied().collect();
        assert!(train_set.is_disjoint(&test_set));
        let union: HashSet<_> = train_set.union(&test_set).copied().collect();
        assert_eq!(union, (0..100).collect::<HashSet<_>>());
    }

    #[test]
    fn test_split_is_reproducible_for_a_seed() {
        let rows: Vec<usize> = (0..50).collect();
        let a = train_test_split(rows.clone(), 0.33, 11).unwrap();
        let b = train_test_split(rows.clone(), 0.33, 11).unwrap();
        assert_eq!(a, b);

        let c = train_test_split(rows, 0.33, 12).unwrap();
        assert_ne!(a.1, c.1);
    }

    #[test]
    fn test_invalid_fraction() {
        let rows: Vec<usize> = (0..10).collect();
        assert!(matches!(
            train_test_split(rows.clone(), 0.0, 1),
            Err(SpamError::InvalidSplitFraction(_))
        ));
        assert!(matches!(
            train_test_split(rows.clone(), 1.0, 1),
            Err(SpamError::InvalidSplitFraction(_))
        ));
        assert!(matches!(
            train_test_split(rows, f64::NAN, 1),
            Err(SpamError::InvalidSplitFraction(_))
        ));
    }

    #[test]
    fn test_too_small_dataset() {
        assert!(matches!(
            train_test_split(vec![1], 0.33, 1),
            Err(SpamError::DatasetTooSmall { rows: 1, .. })
        ));
        assert!(matches!(
            train_test_split(Vec::<u8>::new(), 0.33, 1),
            Err(SpamError::DatasetTooSmall { rows: 0, .. })
        ));
    }
}
