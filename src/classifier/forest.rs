//! Random forest ensemble
//!
//! Bagged decision trees with optional class balancing. Each tree gets its own
//! seeded source derived from `random_state`, so a fitted forest is fully
//! determined by its configuration and training data.

use super::{class_weights, Classifier, DecisionTree, ForestConfig, NUM_CLASSES};
use crate::error::{MaintenanceError, Result};
use crate::types::{FeatureMatrix, LabelVector, FAULT_LABEL, NORMAL_LABEL};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::debug;

/// Random forest classifier over binary fault labels
#[derive(Debug, Clone)]
pub struct RandomForestClassifier {
    config: ForestConfig,
    trees: Vec<DecisionTree>,
    classes: Vec<u8>,
    n_features: Option<usize>,
}

impl RandomForestClassifier {
    /// Create an unfitted forest
    pub fn new(config: ForestConfig) -> Self {
        Self {
            config,
            trees: Vec::new(),
            classes: Vec::new(),
            n_features: None,
        }
    }

    pub fn config(&self) -> &ForestConfig {
        &self.config
    }

    /// Fit the forest
    pub fn fit(&mut self, features: &FeatureMatrix, labels: &LabelVector) -> Result<()> {
        if features.n_rows() != labels.len() {
            return Err(MaintenanceError::shape_mismatch(format!(
                "{} feature rows but {} labels",
                features.n_rows(),
                labels.len()
            )));
        }
        if labels.is_empty() {
            return Err(MaintenanceError::empty_input(
                "cannot fit a forest on zero samples",
            ));
        }
        if self.config.n_estimators == 0 {
            return Err(MaintenanceError::config("n_estimators must be positive"));
        }

        let y = labels.as_slice();
        let class_weight = class_weights(y, self.config.class_weight);
        let n = y.len();

        let mut seeds = ChaCha8Rng::seed_from_u64(self.config.random_state);
        let mut trees = Vec::with_capacity(self.config.n_estimators);

        for _ in 0..self.config.n_estimators {
            let mut rng = ChaCha8Rng::seed_from_u64(seeds.gen());

            // Bootstrap draws become integer multiplicities on the sample weight
            let mut weights: Vec<f64> = if self.config.bootstrap {
                let mut counts = vec![0.0; n];
                for _ in 0..n {
                    counts[rng.gen_range(0..n)] += 1.0;
                }
                counts
            } else {
                vec![1.0; n]
            };
            for (weight, &label) in weights.iter_mut().zip(y) {
                *weight *= class_weight.get(usize::from(label)).copied().unwrap_or(0.0);
            }

            let mut tree = DecisionTree::new(
                self.config.max_depth,
                self.config.min_samples_split,
                self.config.max_features,
            );
            tree.fit_weighted(features, y, &weights, &mut rng)?;
            trees.push(tree);
        }

        self.trees = trees;
        self.classes = labels.classes();
        self.n_features = Some(features.n_features());

        debug!(
            n_trees = self.trees.len(),
            n_samples = n,
            "random forest fitted"
        );
        Ok(())
    }

    fn check_input(&self, features: &FeatureMatrix) -> Result<()> {
        let expected = self.n_features.ok_or_else(|| {
            MaintenanceError::NotFitted("call fit before predicting".to_string())
        })?;
        if features.n_features() != expected {
            return Err(MaintenanceError::shape_mismatch(format!(
                "model was fitted on {expected} features, got {}",
                features.n_features()
            )));
        }
        Ok(())
    }

    /// Mean class probabilities across all trees, one `[normal, fault]` pair per row
    pub fn predict_proba(&self, features: &FeatureMatrix) -> Result<Vec<[f64; NUM_CLASSES]>> {
        self.check_input(features)?;

        let n_trees = self.trees.len() as f64;
        let mut probabilities = Vec::with_capacity(features.n_rows());

        for row in features.rows() {
            let mut sum = [0.0; NUM_CLASSES];
            for tree in &self.trees {
                let proba = tree.predict_proba_row(row).ok_or_else(|| {
                    MaintenanceError::NotFitted("tree has no nodes".to_string())
                })?;
                for (total, p) in sum.iter_mut().zip(proba) {
                    *total += p;
                }
            }
            probabilities.push(sum.map(|total| total / n_trees));
        }

        Ok(probabilities)
    }

    /// Mean impurity decrease per feature, summing to 1 when any split was made
    pub fn feature_importances(&self) -> Vec<f64> {
        let Some(n_features) = self.n_features else {
            return Vec::new();
        };

        let mut importances = vec![0.0; n_features];
        for tree in &self.trees {
            for (total, &imp) in importances.iter_mut().zip(tree.feature_importances()) {
                *total += imp;
            }
        }

        let sum: f64 = importances.iter().sum();
        if sum > 0.0 {
            for imp in &mut importances {
                *imp /= sum;
            }
        }
        importances
    }

    /// Number of fitted trees
    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    /// Labels seen during fit, ascending
    pub fn classes(&self) -> &[u8] {
        &self.classes
    }

    pub fn trees(&self) -> &[DecisionTree] {
        &self.trees
    }
}

impl Classifier for RandomForestClassifier {
    fn predict(&self, features: &FeatureMatrix) -> Result<LabelVector> {
        let labels = self
            .predict_proba(features)?
            .into_iter()
            .map(|[normal, fault]| {
                // Ties go to the lower label
                if fault > normal {
                    FAULT_LABEL
                } else {
                    NORMAL_LABEL
                }
            })
            .collect();
        LabelVector::new(labels)
    }
}
