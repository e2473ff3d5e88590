//! Seeded train/test partitioning stratified by the murder label.

use nypd_shootings_classifier_models::{FeatureRow, PartitionSummary, SplitSummary};
use rand::SeedableRng;
use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;

use crate::ModelError;

/// A disjoint, exhaustive partition of feature rows. Both sides keep the
/// input order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Split {
    pub train: Vec<FeatureRow>,
    pub test: Vec<FeatureRow>,
}

impl Split {
    /// Sizes and positive counts of both partitions.
    #[must_use]
    pub fn summary(&self) -> SplitSummary {
        SplitSummary {
            train: partition_summary(&self.train),
            test: partition_summary(&self.test),
        }
    }
}

fn partition_summary(rows: &[FeatureRow]) -> PartitionSummary {
    PartitionSummary {
        rows: rows.len(),
        positives: rows.iter().filter(|r| r.is_murder).count(),
    }
}

/// Splits `rows` so each label keeps its share in both partitions.
///
/// For each label, `ceil(train_fraction * n)` of its `n` rows are drawn
/// for training by a `ChaCha8Rng` seeded with `seed`; the rest go to the
/// test set. The same rows and seed always yield the same split.
///
/// # Errors
///
/// Returns [`ModelError::InvalidTrainFraction`] unless `train_fraction`
/// lies strictly between 0 and 1.
pub fn stratified_split(
    rows: &[FeatureRow],
    train_fraction: f64,
    seed: u64,
) -> Result<Split, ModelError> {
    if !(train_fraction > 0.0 && train_fraction < 1.0) {
        return Err(ModelError::InvalidTrainFraction {
            fraction: train_fraction,
        });
    }

    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut in_train = vec![false; rows.len()];

    for label in [false, true] {
        let mut indices: Vec<usize> = rows
            .iter()
            .enumerate()
            .filter(|(_, row)| row.is_murder == label)
            .map(|(i, _)| i)
            .collect();
        let take = train_count(indices.len(), train_fraction);
        indices.shuffle(&mut rng);
        for &i in indices.iter().take(take) {
            in_train[i] = true;
        }
    }

    let (train, test): (Vec<_>, Vec<_>) = rows
        .iter()
        .zip(&in_train)
        .partition(|(_, train)| **train);
    let split = Split {
        train: train.into_iter().map(|(row, _)| row.clone()).collect(),
        test: test.into_iter().map(|(row, _)| row.clone()).collect(),
    };

    let summary = split.summary();
    log::info!(
        "Split {} rows (seed {seed}): train {} ({} murders), test {} ({} murders)",
        rows.len(),
        summary.train.rows,
        summary.train.positives,
        summary.test.rows,
        summary.test.positives
    );

    Ok(split)
}

/// `ceil(fraction * n)`, treating products within float noise of an
/// integer as that integer.
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
fn train_count(n: usize, fraction: f64) -> usize {
    let exact = fraction * n as f64;
    let rounded = exact.round();
    let count = if (exact - rounded).abs() < 1e-9 {
        rounded
    } else {
        exact.ceil()
    };
    (count as usize).min(n)
}
