//! Incrementally grown decision tree with a Hoeffding-bound split test.
//!
//! The tree consumes one sample at a time and never stores samples. Each
//! leaf accumulates class-conditional statistics per dimension; once enough
//! samples have arrived, the leaf compares the information gain of its two
//! best candidate splits against the Hoeffding bound and commits to a split
//! when the winner is statistically clear (or the race is a tie).
//!
//! Leaves predict with naive Bayes over their accumulated observers, which
//! makes the tree a usable classifier well before its first split.

use serde::{Deserialize, Serialize};

use crate::data::{FeatureType, SchemaView};
use crate::learner::StreamingLearner;

use super::node::{LeafStats, Node, SplitTest};

// ============================================================================
// Parameters
// ============================================================================

/// Configuration for [`HoeffdingTree`] growth and prediction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HoeffdingTreeParams {
    /// Samples a leaf must accumulate between split attempts.
    pub grace_period: u32,
    /// Acceptable probability of choosing the wrong split dimension
    /// (the δ of the Hoeffding bound).
    pub split_confidence: f64,
    /// Bound below which two candidate splits are declared tied and the
    /// better one is taken anyway.
    pub tie_threshold: f64,
    /// Minimum leaf sample count before naive-Bayes prediction replaces the
    /// empirical class distribution. Zero means naive Bayes from the start.
    pub nb_threshold: u32,
    /// Candidate thresholds evaluated per numeric dimension at each split
    /// attempt.
    pub numeric_split_points: u32,
}

impl Default for HoeffdingTreeParams {
    fn default() -> Self {
        Self {
            grace_period: 200,
            split_confidence: 1e-7,
            tie_threshold: 0.05,
            nb_threshold: 0,
            numeric_split_points: 10,
        }
    }
}

/// Hoeffding bound: with probability `1 - confidence`, the empirical mean of
/// `n` observations with range `r` is within `ε` of the true mean.
fn hoeffding_bound(range: f64, confidence: f64, n: f64) -> f64 {
    (range * range * (1.0 / confidence).ln() / (2.0 * n)).sqrt()
}

// ============================================================================
// HoeffdingTree
// ============================================================================

/// A streaming decision tree classifier.
///
/// Implements [`StreamingLearner`], so it can serve as an ensemble member or
/// stand alone. The tree is deterministic: its growth depends only on its
/// parameters and the order of training samples.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HoeffdingTree {
    params: HoeffdingTreeParams,
    num_classes: usize,
    dim_types: Vec<FeatureType>,
    nodes: Vec<Node>,
}

impl HoeffdingTree {
    /// Number of nodes in the tree (1 while the root is still a leaf).
    pub fn n_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// Number of projected dimensions this tree consumes.
    pub fn n_dims(&self) -> usize {
        self.dim_types.len()
    }

    /// Id of the leaf `point` routes to.
    fn leaf_for(&self, point: &[f32]) -> usize {
        let mut idx = 0usize;
        loop {
            match &self.nodes[idx] {
                Node::Leaf(_) => return idx,
                Node::Split { test, children } => {
                    idx = children[test.route(point, children.len())] as usize;
                }
            }
        }
    }

    /// Evaluate candidate splits at a leaf and split if one is clearly best.
    fn try_split(&mut self, leaf_id: usize) {
        let leaf = match &self.nodes[leaf_id] {
            Node::Leaf(stats) => stats,
            Node::Split { .. } => return,
        };
        if leaf.is_pure() {
            return;
        }

        let mut best: Option<(f64, SplitTest)> = None;
        let mut second_gain: f64 = 0.0;
        for (dim, observer) in leaf.observers().iter().enumerate() {
            let candidate = match self.dim_types[dim] {
                FeatureType::Numeric => observer
                    .best_numeric_split(self.params.numeric_split_points)
                    .map(|(gain, threshold)| {
                        (
                            gain,
                            SplitTest::Numeric {
                                dim: dim as u32,
                                threshold,
                            },
                        )
                    }),
                FeatureType::Categorical { .. } => observer
                    .categorical_split_gain()
                    .map(|gain| (gain, SplitTest::Categorical { dim: dim as u32 })),
            };
            if let Some((gain, test)) = candidate {
                match best {
                    Some((best_gain, _)) if gain <= best_gain => {
                        second_gain = second_gain.max(gain);
                    }
                    _ => {
                        if let Some((best_gain, _)) = best {
                            second_gain = second_gain.max(best_gain);
                        }
                        best = Some((gain, test));
                    }
                }
            }
        }

        let (best_gain, test) = match best {
            Some(found) => found,
            None => return,
        };
        if best_gain <= 0.0 {
            return;
        }

        let range = (self.num_classes as f64).log2();
        let epsilon = hoeffding_bound(
            range,
            self.params.split_confidence,
            leaf.total() as f64,
        );
        if best_gain - second_gain <= epsilon && epsilon >= self.params.tie_threshold {
            return;
        }

        let n_children = match test {
            SplitTest::Numeric { .. } => 2usize,
            SplitTest::Categorical { dim } => match self.dim_types[dim as usize] {
                FeatureType::Categorical { cardinality } => cardinality as usize,
                FeatureType::Numeric => unreachable!("categorical split on numeric dimension"),
            },
        };

        let first = self.nodes.len() as u32;
        for _ in 0..n_children {
            self.nodes
                .push(Node::Leaf(LeafStats::new(self.num_classes, &self.dim_types)));
        }
        self.nodes[leaf_id] = Node::Split {
            test,
            children: (first..first + n_children as u32).collect(),
        };
    }

    /// Class distribution at the leaf `point` routes to.
    fn leaf_distribution(&self, point: &[f32], out: &mut [f64]) {
        let leaf = match &self.nodes[self.leaf_for(point)] {
            Node::Leaf(stats) => stats,
            Node::Split { .. } => unreachable!("leaf_for returned a split node"),
        };
        if leaf.total() >= u64::from(self.params.nb_threshold) {
            leaf.posterior(point, out);
        } else {
            leaf.empirical(out);
        }
    }
}

impl StreamingLearner for HoeffdingTree {
    type Config = HoeffdingTreeParams;

    fn with_config(config: Self::Config, num_classes: usize, view: &SchemaView<'_>) -> Self {
        let dim_types: Vec<FeatureType> =
            (0..view.n_dims()).map(|j| view.feature_type(j)).collect();
        let root = Node::Leaf(LeafStats::new(num_classes, &dim_types));
        Self {
            params: config,
            num_classes,
            dim_types,
            nodes: vec![root],
        }
    }

    fn config(&self) -> &Self::Config {
        &self.params
    }

    fn num_classes(&self) -> usize {
        self.num_classes
    }

    fn train(&mut self, point: &[f32], label: usize) {
        let leaf_id = self.leaf_for(point);
        let grace = u64::from(self.params.grace_period);
        let due = {
            let leaf = match &mut self.nodes[leaf_id] {
                Node::Leaf(stats) => stats,
                Node::Split { .. } => unreachable!("leaf_for returned a split node"),
            };
            leaf.observe(point, label);
            let due = leaf.total() - leaf.weight_at_last_check() >= grace;
            if due {
                leaf.mark_split_check();
            }
            due
        };
        if due {
            self.try_split(leaf_id);
        }
    }

    fn classify_with_probability(&self, point: &[f32]) -> (usize, f64) {
        let mut probs = vec![0.0; self.num_classes];
        self.leaf_distribution(point, &mut probs);
        let mut best = 0;
        for (c, &p) in probs.iter().enumerate() {
            if p > probs[best] {
                best = c;
            }
        }
        (best, probs[best])
    }

    fn class_probabilities(&self, point: &[f32], out: &mut [f64]) {
        self.leaf_distribution(point, out);
    }
}
