//! Model training
//!
//! Fits the random forest with the fixed configuration used throughout the
//! pipeline: 100 trees, seed 42, class balancing against the ~85/15 split the
//! generator produces. Callers cannot override it.

use crate::classifier::{ClassWeight, ForestConfig, MaxFeatures, RandomForestClassifier};
use crate::error::Result;
use crate::types::{FeatureMatrix, LabelVector, FAULT_LABEL, NORMAL_LABEL};
use tracing::info;

/// Ensemble size used by [`train`]
pub const N_ESTIMATORS: usize = 100;

/// Forest seed used by [`train`]
pub const RANDOM_STATE: u64 = 42;

/// The configuration every trained model carries
pub const TRAINING_CONFIG: ForestConfig = ForestConfig {
    n_estimators: N_ESTIMATORS,
    random_state: RANDOM_STATE,
    class_weight: ClassWeight::Balanced,
    max_depth: None,
    min_samples_split: 2,
    max_features: MaxFeatures::Sqrt,
    bootstrap: true,
};

/// Train a class-balanced random forest on the given features and labels.
///
/// Errors from the underlying fit propagate unchanged.
pub fn train(features: &FeatureMatrix, labels: &LabelVector) -> Result<RandomForestClassifier> {
    info!(
        n_samples = labels.len(),
        normal = labels.count(NORMAL_LABEL),
        fault = labels.count(FAULT_LABEL),
        n_estimators = N_ESTIMATORS,
        "training random forest"
    );

    let mut model = RandomForestClassifier::new(TRAINING_CONFIG);
    model.fit(features, labels)?;
    Ok(model)
}
