//! Feature/target splitting and holdout partitioning
//!
//! [`split`] projects a [`Dataset`] into the sensor feature matrix and the fault
//! label vector. The holdout helpers then partition those into train and test
//! sets, either positionally or by a seeded (optionally stratified) shuffle.

use crate::error::{MaintenanceError, Result};
use crate::types::{Dataset, FeatureMatrix, LabelVector};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// Separate a dataset into its five sensor columns and its fault column.
///
/// Row order and row count are preserved.
pub fn split(dataset: &Dataset) -> (FeatureMatrix, LabelVector) {
    let readings: Vec<_> = dataset.iter().map(|r| r.readings()).collect();
    let features = FeatureMatrix::from_readings(&readings);

    // Dataset construction already guarantees binary labels
    let labels = LabelVector::from_validated(dataset.iter().map(|r| r.fault).collect());

    (features, labels)
}

/// Proportion of rows assigned to the training partition.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SplitRatio {
    train: f64,
}

impl SplitRatio {
    /// Common 70/30 split.
    pub const SEVENTY_THIRTY: Self = Self { train: 0.7 };

    /// Common 80/20 split.
    pub const EIGHTY_TWENTY: Self = Self { train: 0.8 };

    /// Creates a split ratio, rejecting values outside `(0, 1)`.
    pub fn new(train: f64) -> Result<Self> {
        if train > 0.0 && train < 1.0 {
            Ok(Self { train })
        } else {
            Err(MaintenanceError::invalid_argument(format!(
                "split ratio must be in (0, 1), got {train}"
            )))
        }
    }

    /// Builds the ratio from the share of rows held out for testing.
    pub fn from_test_ratio(test: f64) -> Result<Self> {
        Self::new(1.0 - test).and_then(|ratio| {
            if test > 0.0 && test < 1.0 {
                Ok(ratio)
            } else {
                Err(MaintenanceError::invalid_argument(format!(
                    "test ratio must be in (0, 1), got {test}"
                )))
            }
        })
    }

    pub fn train_ratio(&self) -> f64 {
        self.train
    }

    pub fn test_ratio(&self) -> f64 {
        1.0 - self.train
    }

    /// Number of training rows for a dataset of `total` rows.
    pub fn split_point(&self, total: usize) -> usize {
        (total as f64 * self.train).floor() as usize
    }
}

impl Default for SplitRatio {
    fn default() -> Self {
        Self::SEVENTY_THIRTY
    }
}

/// Train/test partition of a feature matrix and its labels.
#[derive(Debug, Clone, PartialEq)]
pub struct Holdout {
    pub train_features: FeatureMatrix,
    pub train_labels: LabelVector,
    pub test_features: FeatureMatrix,
    pub test_labels: LabelVector,
}

fn check_aligned(features: &FeatureMatrix, labels: &LabelVector) -> Result<()> {
    if features.n_rows() != labels.len() {
        return Err(MaintenanceError::shape_mismatch(format!(
            "{} feature rows but {} labels",
            features.n_rows(),
            labels.len()
        )));
    }
    Ok(())
}

/// Positional split: the first `floor(ratio * n)` rows train, the rest test.
pub fn holdout(features: &FeatureMatrix, labels: &LabelVector, ratio: SplitRatio) -> Result<Holdout> {
    check_aligned(features, labels)?;

    let n = features.n_rows();
    let point = ratio.split_point(n);

    Ok(Holdout {
        train_features: features.slice(0..point),
        train_labels: labels.slice(0..point),
        test_features: features.slice(point..n),
        test_labels: labels.slice(point..n),
    })
}

/// Shuffled train/test split driven by a seeded source.
///
/// With `stratify`, every class is shuffled and split on its own so both
/// partitions keep the class proportions of the input. Each class contributes
/// `ceil(test_ratio * count)` rows to the test partition, and every class
/// needs at least two members.
pub fn train_test_split(
    features: &FeatureMatrix,
    labels: &LabelVector,
    test_ratio: f64,
    seed: u64,
    stratify: bool,
) -> Result<Holdout> {
    check_aligned(features, labels)?;
    if !(test_ratio > 0.0 && test_ratio < 1.0) {
        return Err(MaintenanceError::invalid_argument(format!(
            "test ratio must be in (0, 1), got {test_ratio}"
        )));
    }

    let n = features.n_rows();
    if n < 2 {
        return Err(MaintenanceError::empty_input(format!(
            "need at least 2 rows to split, got {n}"
        )));
    }

    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut train_idx = Vec::with_capacity(n);
    let mut test_idx = Vec::with_capacity(n);

    let groups: Vec<Vec<usize>> = if stratify {
        let groups: Vec<Vec<usize>> = labels
            .classes()
            .into_iter()
            .map(|class| (0..n).filter(|&i| labels.as_slice()[i] == class).collect())
            .collect();
        if let Some(group) = groups.iter().find(|g| g.len() < 2) {
            let class = labels.as_slice()[group[0]];
            return Err(MaintenanceError::invalid_argument(format!(
                "class {class} has a single member; stratifying needs at least 2 per class"
            )));
        }
        groups
    } else {
        vec![(0..n).collect()]
    };

    for mut group in groups {
        group.shuffle(&mut rng);
        let n_test = test_count(group.len(), test_ratio);
        test_idx.extend_from_slice(&group[..n_test]);
        train_idx.extend_from_slice(&group[n_test..]);
    }

    if train_idx.is_empty() || test_idx.is_empty() {
        return Err(MaintenanceError::invalid_argument(format!(
            "test ratio {test_ratio} leaves an empty partition for {n} rows"
        )));
    }

    // Interleave classes again so neither partition is ordered by label
    train_idx.shuffle(&mut rng);
    test_idx.shuffle(&mut rng);

    Ok(Holdout {
        train_features: features.select(&train_idx),
        train_labels: labels.select(&train_idx),
        test_features: features.select(&test_idx),
        test_labels: labels.select(&test_idx),
    })
}

fn test_count(group_len: usize, test_ratio: f64) -> usize {
    ((group_len as f64 * test_ratio).ceil() as usize).min(group_len)
}
