//! Classifier capability
//!
//! This module defines the narrow prediction interface used by the evaluation
//! stage, plus the in-crate random forest that backs the training stage.

mod forest;
mod tree;

pub use forest::RandomForestClassifier;
pub use tree::DecisionTree;

use crate::error::Result;
use crate::types::{FeatureMatrix, LabelVector};
use serde::{Deserialize, Serialize};

/// Number of label classes (normal, fault)
pub const NUM_CLASSES: usize = 2;

/// Trait for fitted models that label feature rows
pub trait Classifier {
    /// Predict one label per feature row
    fn predict(&self, features: &FeatureMatrix) -> Result<LabelVector>;
}

/// How each class contributes to the training objective
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassWeight {
    /// Every sample counts once
    Uniform,
    /// Samples weighted by `n_samples / (n_classes * class_count)`
    Balanced,
}

/// Number of features considered at each split
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaxFeatures {
    /// `max(1, floor(sqrt(n_features)))`
    Sqrt,
    /// Every feature
    All,
    /// A fixed count, capped at the feature count
    Count(usize),
}

impl MaxFeatures {
    /// Resolve to a concrete count for `n_features` columns
    pub fn resolve(&self, n_features: usize) -> usize {
        let count = match self {
            MaxFeatures::Sqrt => (n_features as f64).sqrt().floor() as usize,
            MaxFeatures::All => n_features,
            MaxFeatures::Count(n) => *n,
        };
        count.clamp(1, n_features.max(1))
    }
}

/// Random forest settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForestConfig {
    /// Number of trees in the ensemble
    pub n_estimators: usize,
    /// Seed for bootstrap sampling and feature selection
    pub random_state: u64,
    /// Class weighting mode
    pub class_weight: ClassWeight,
    /// Maximum tree depth (`None` grows until leaves are pure)
    pub max_depth: Option<usize>,
    /// Minimum number of distinct samples required to split a node
    pub min_samples_split: usize,
    /// Features considered per split
    pub max_features: MaxFeatures,
    /// Draw a bootstrap sample per tree
    pub bootstrap: bool,
}

impl Default for ForestConfig {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            random_state: 42,
            class_weight: ClassWeight::Uniform,
            max_depth: None,
            min_samples_split: 2,
            max_features: MaxFeatures::Sqrt,
            bootstrap: true,
        }
    }
}

/// Per-class weights for a label sequence
///
/// Labels outside `0..NUM_CLASSES` are not counted.
pub fn class_weights(labels: &[u8], mode: ClassWeight) -> [f64; NUM_CLASSES] {
    match mode {
        ClassWeight::Uniform => [1.0; NUM_CLASSES],
        ClassWeight::Balanced => {
            let mut counts = [0usize; NUM_CLASSES];
            for &label in labels {
                if let Some(count) = counts.get_mut(usize::from(label)) {
                    *count += 1;
                }
            }
            let present = counts.iter().filter(|&&c| c > 0).count().max(1);
            let n = counts.iter().sum::<usize>() as f64;

            let mut weights = [0.0; NUM_CLASSES];
            for (weight, &count) in weights.iter_mut().zip(counts.iter()) {
                if count > 0 {
                    *weight = n / (present as f64 * count as f64);
                }
            }
            weights
        }
    }
}
