//! CART decision tree with weighted Gini impurity

use super::{MaxFeatures, NUM_CLASSES};
use crate::error::{MaintenanceError, Result};
use crate::types::FeatureMatrix;
use rand::seq::SliceRandom;
use rand::Rng;

/// Tree node, stored in an arena indexed by position
#[derive(Debug, Clone, PartialEq)]
enum Node {
    Leaf {
        proba: [f64; NUM_CLASSES],
    },
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

/// Best split found for a node
struct SplitCandidate {
    feature: usize,
    threshold: f64,
    /// Weighted impurity of both children combined
    child_impurity: f64,
    left: Vec<usize>,
    right: Vec<usize>,
}

/// Binary classification tree
#[derive(Debug, Clone)]
pub struct DecisionTree {
    nodes: Vec<Node>,
    max_depth: Option<usize>,
    min_samples_split: usize,
    max_features: MaxFeatures,
    n_features: usize,
    importances: Vec<f64>,
}

impl DecisionTree {
    /// Create an unfitted tree
    pub fn new(max_depth: Option<usize>, min_samples_split: usize, max_features: MaxFeatures) -> Self {
        Self {
            nodes: Vec::new(),
            max_depth,
            min_samples_split: min_samples_split.max(2),
            max_features,
            n_features: 0,
            importances: Vec::new(),
        }
    }

    /// Fit on the rows with positive weight.
    ///
    /// `weights[i]` is the contribution of row `i` to every impurity sum; rows
    /// with zero weight are ignored.
    pub fn fit_weighted<R: Rng + ?Sized>(
        &mut self,
        features: &FeatureMatrix,
        labels: &[u8],
        weights: &[f64],
        rng: &mut R,
    ) -> Result<()> {
        if features.n_rows() != labels.len() || labels.len() != weights.len() {
            return Err(MaintenanceError::shape_mismatch(format!(
                "{} rows, {} labels, {} weights",
                features.n_rows(),
                labels.len(),
                weights.len()
            )));
        }

        let samples: Vec<usize> = (0..labels.len()).filter(|&i| weights[i] > 0.0).collect();
        if samples.is_empty() {
            return Err(MaintenanceError::empty_input(
                "decision tree needs at least one weighted sample",
            ));
        }

        self.nodes.clear();
        self.n_features = features.n_features();
        self.importances = vec![0.0; self.n_features];

        let fit = TreeFit {
            features,
            labels,
            weights,
        };
        self.build(&fit, samples, 0, rng);

        let total: f64 = self.importances.iter().sum();
        if total > 0.0 {
            for importance in &mut self.importances {
                *importance /= total;
            }
        }

        Ok(())
    }

    fn build<R: Rng + ?Sized>(
        &mut self,
        fit: &TreeFit<'_>,
        samples: Vec<usize>,
        depth: usize,
        rng: &mut R,
    ) -> usize {
        let totals = fit.class_totals(&samples);
        let node_weight: f64 = totals.iter().sum();
        let impurity = gini(&totals);

        let depth_reached = self.max_depth.is_some_and(|max| depth >= max);
        let can_split =
            !depth_reached && samples.len() >= self.min_samples_split && impurity > 0.0;

        let candidate = if can_split {
            self.best_split(fit, &samples, rng)
        } else {
            None
        };

        let Some(split) = candidate else {
            let index = self.nodes.len();
            self.nodes.push(Node::Leaf {
                proba: normalize(totals),
            });
            return index;
        };

        self.importances[split.feature] += node_weight * impurity - split.child_impurity;

        // Reserve the slot so children land after their parent
        let index = self.nodes.len();
        self.nodes.push(Node::Leaf {
            proba: normalize(totals),
        });

        let left = self.build(fit, split.left, depth + 1, rng);
        let right = self.build(fit, split.right, depth + 1, rng);
        self.nodes[index] = Node::Split {
            feature: split.feature,
            threshold: split.threshold,
            left,
            right,
        };
        index
    }

    /// Search a random subset of features for the lowest-impurity split.
    ///
    /// Features that are constant within the node do not count towards the
    /// `max_features` budget.
    fn best_split<R: Rng + ?Sized>(
        &self,
        fit: &TreeFit<'_>,
        samples: &[usize],
        rng: &mut R,
    ) -> Option<SplitCandidate> {
        let budget = self.max_features.resolve(self.n_features);
        let mut order: Vec<usize> = (0..self.n_features).collect();
        order.shuffle(rng);

        let mut best: Option<SplitCandidate> = None;
        let mut visited = 0;

        for feature in order {
            if visited >= budget {
                break;
            }

            let mut sorted = samples.to_vec();
            sorted.sort_by(|&a, &b| fit.value(a, feature).total_cmp(&fit.value(b, feature)));

            let first = fit.value(sorted[0], feature);
            let last = fit.value(sorted[sorted.len() - 1], feature);
            if first >= last {
                continue;
            }
            visited += 1;

            let totals = fit.class_totals(&sorted);
            let mut left = [0.0; NUM_CLASSES];
            let mut best_here: Option<(usize, f64)> = None;

            for pos in 0..sorted.len() - 1 {
                let i = sorted[pos];
                left[usize::from(fit.labels[i])] += fit.weights[i];

                let current = fit.value(i, feature);
                let next = fit.value(sorted[pos + 1], feature);
                if current >= next {
                    continue;
                }

                let right: [f64; NUM_CLASSES] = std::array::from_fn(|c| totals[c] - left[c]);
                let child_impurity = weighted_gini(&left) + weighted_gini(&right);

                if best_here.map_or(true, |(_, score)| child_impurity < score) {
                    best_here = Some((pos, child_impurity));
                }
            }

            let Some((pos, child_impurity)) = best_here else {
                continue;
            };
            if best
                .as_ref()
                .is_some_and(|b| b.child_impurity <= child_impurity)
            {
                continue;
            }

            let lower = fit.value(sorted[pos], feature);
            let upper = fit.value(sorted[pos + 1], feature);
            let mut threshold = lower + (upper - lower) / 2.0;
            if threshold >= upper {
                threshold = lower;
            }

            let right = sorted.split_off(pos + 1);
            best = Some(SplitCandidate {
                feature,
                threshold,
                child_impurity,
                left: sorted,
                right,
            });
        }

        best
    }

    /// Class probabilities for a single row
    pub fn predict_proba_row(&self, row: &[f64]) -> Option<[f64; NUM_CLASSES]> {
        let mut index = 0;
        loop {
            match self.nodes.get(index)? {
                Node::Leaf { proba } => return Some(*proba),
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    index = if row[*feature] <= *threshold {
                        *left
                    } else {
                        *right
                    };
                }
            }
        }
    }

    pub fn is_fitted(&self) -> bool {
        !self.nodes.is_empty()
    }

    /// Normalised impurity decrease per feature
    pub fn feature_importances(&self) -> &[f64] {
        &self.importances
    }

    pub fn n_leaves(&self) -> usize {
        self.nodes
            .iter()
            .filter(|n| matches!(n, Node::Leaf { .. }))
            .count()
    }

    /// Longest root-to-leaf path, 0 for a single leaf
    pub fn depth(&self) -> usize {
        fn walk(nodes: &[Node], index: usize) -> usize {
            match &nodes[index] {
                Node::Leaf { .. } => 0,
                Node::Split { left, right, .. } => 1 + walk(nodes, *left).max(walk(nodes, *right)),
            }
        }
        if self.nodes.is_empty() {
            0
        } else {
            walk(&self.nodes, 0)
        }
    }
}

/// Borrowed training inputs shared by every recursive call
struct TreeFit<'a> {
    features: &'a FeatureMatrix,
    labels: &'a [u8],
    weights: &'a [f64],
}

impl TreeFit<'_> {
    fn value(&self, row: usize, feature: usize) -> f64 {
        self.features.row(row)[feature]
    }

    fn class_totals(&self, samples: &[usize]) -> [f64; NUM_CLASSES] {
        let mut totals = [0.0; NUM_CLASSES];
        for &i in samples {
            totals[usize::from(self.labels[i])] += self.weights[i];
        }
        totals
    }
}

fn gini(totals: &[f64; NUM_CLASSES]) -> f64 {
    let sum: f64 = totals.iter().sum();
    if sum <= 0.0 {
        return 0.0;
    }
    1.0 - totals.iter().map(|w| (w / sum).powi(2)).sum::<f64>()
}

/// Gini impurity scaled by the node weight
fn weighted_gini(totals: &[f64; NUM_CLASSES]) -> f64 {
    totals.iter().sum::<f64>() * gini(totals)
}

fn normalize(totals: [f64; NUM_CLASSES]) -> [f64; NUM_CLASSES] {
    let sum: f64 = totals.iter().sum();
    if sum <= 0.0 {
        return [1.0 / NUM_CLASSES as f64; NUM_CLASSES];
    }
    totals.map(|w| w / sum)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn separable() -> (FeatureMatrix, Vec<u8>) {
        let features = FeatureMatrix::from_readings(&[
            [1.0, 0.0, 0.0, 0.0, 0.0],
            [2.0, 0.0, 0.0, 0.0, 0.0],
            [3.0, 0.0, 0.0, 0.0, 0.0],
            [10.0, 0.0, 0.0, 0.0, 0.0],
            [11.0, 0.0, 0.0, 0.0, 0.0],
        ]);
        (features, vec![0, 0, 0, 1, 1])
    }

    #[test]
    fn test_gini() {
        assert_eq!(gini(&[4.0, 0.0]), 0.0);
        assert!((gini(&[2.0, 2.0]) - 0.5).abs() < 1e-12);
        assert_eq!(gini(&[0.0, 0.0]), 0.0);
    }

    #[test]
    fn test_tree_separates_on_informative_feature() {
        let (features, labels) = separable();
        let mut tree = DecisionTree::new(None, 2, MaxFeatures::All);
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        tree.fit_weighted(&features, &labels, &[1.0; 5], &mut rng)
            .unwrap();

        assert_eq!(tree.depth(), 1);
        assert_eq!(tree.n_leaves(), 2);
        assert_eq!(tree.predict_proba_row(&[2.5, 0.0, 0.0, 0.0, 0.0]), Some([1.0, 0.0]));
        assert_eq!(tree.predict_proba_row(&[9.0, 0.0, 0.0, 0.0, 0.0]), Some([0.0, 1.0]));

        // Only feature 0 ever splits
        assert_eq!(tree.feature_importances()[0], 1.0);
    }

    #[test]
    fn test_constant_features_make_a_leaf() {
        let features = FeatureMatrix::from_readings(&[[1.0; 5], [1.0; 5], [1.0; 5]]);
        let mut tree = DecisionTree::new(None, 2, MaxFeatures::Sqrt);
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        tree.fit_weighted(&features, &[0, 1, 1], &[1.0; 3], &mut rng)
            .unwrap();

        assert_eq!(tree.n_leaves(), 1);
        let proba = tree.predict_proba_row(&[1.0; 5]).unwrap();
        assert!((proba[1] - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_zero_weight_rows_are_ignored() {
        let (features, mut labels) = separable();
        // Mislabel a row but give it no weight
        labels[0] = 1;
        let mut tree = DecisionTree::new(None, 2, MaxFeatures::All);
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        tree.fit_weighted(&features, &labels, &[0.0, 1.0, 1.0, 1.0, 1.0], &mut rng)
            .unwrap();
        assert_eq!(tree.predict_proba_row(&[1.0, 0.0, 0.0, 0.0, 0.0]), Some([1.0, 0.0]));
    }

    #[test]
    fn test_max_depth_limits_growth() {
        let (features, labels) = separable();
        let mut tree = DecisionTree::new(Some(0), 2, MaxFeatures::All);
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        tree.fit_weighted(&features, &labels, &[1.0; 5], &mut rng)
            .unwrap();
        assert_eq!(tree.depth(), 0);
        assert_eq!(tree.predict_proba_row(&[0.0; 5]), Some([0.6, 0.4]));
    }

    #[test]
    fn test_fit_rejects_empty_weights() {
        let (features, labels) = separable();
        let mut tree = DecisionTree::new(None, 2, MaxFeatures::All);
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        assert!(tree
            .fit_weighted(&features, &labels, &[0.0; 5], &mut rng)
            .is_err());
        assert!(!tree.is_fitted());
    }
}
