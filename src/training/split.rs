//! Stratified train/test split

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use super::TrainingError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Split {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

/// Split row indices so each class keeps its proportion in both parts.
///
/// Every class with at least two rows contributes at least one row to each
/// side. Deterministic for a given seed.
pub fn stratified_split(labels: &[u8], test_size: f64, seed: u64) -> Result<Split, TrainingError> {
    if !(test_size > 0.0 && test_size < 1.0) {
        return Err(TrainingError::InvalidTestSize(test_size));
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let mut train = Vec::new();
    let mut test = Vec::new();

    let mut classes: Vec<u8> = labels.to_vec();
    classes.sort_unstable();
    classes.dedup();

    for class in classes {
        let mut members: Vec<usize> = labels
            .iter()
            .enumerate()
            .filter(|(_, &l)| l == class)
            .map(|(i, _)| i)
            .collect();
        members.shuffle(&mut rng);

        let n = members.len();
        let n_test = if n < 2 {
            0
        } else {
            ((n as f64 * test_size).round() as usize).clamp(1, n - 1)
        };

        test.extend_from_slice(&members[..n_test]);
        train.extend_from_slice(&members[n_test..]);
    }

    train.shuffle(&mut rng);
    test.shuffle(&mut rng);

    Ok(Split { train, test })
}
