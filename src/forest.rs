use rand::SeedableRng;
use rand::prelude::*;
use rand::rngs::StdRng;
use rayon::prelude::*;

const MIN_SAMPLES_SPLIT: usize = 2;

#[derive(Debug, Clone, Copy)]
pub struct ForestConfig {
    pub n_trees: usize,
    pub max_depth: usize,
    pub seed: u64,
}

impl Default for ForestConfig {
    fn default() -> Self {
        Self {
            n_trees: 100,
            max_depth: 10,
            seed: 42,
        }
    }
}

/// Bagged ensemble of gini-split decision trees over dense f64 rows with
/// integer class labels. Trees are grown independently with per-tree
/// deterministic seeds, so a fixed config always yields the same forest.
#[derive(Debug, Clone)]
pub struct RandomForest {
    trees: Vec<TreeNode>,
    n_classes: usize,
}

impl RandomForest {
    pub fn fit(
        rows: &[Vec<f64>],
        labels: &[usize],
        n_classes: usize,
        cfg: ForestConfig,
    ) -> Self {
        let n_samples = rows.len().min(labels.len());
        if n_samples == 0 || n_classes == 0 {
            return Self {
                trees: Vec::new(),
                n_classes: n_classes.max(1),
            };
        }

        let n_features = rows[0].len();
        let features_per_split = ((n_features as f64).sqrt().ceil() as usize).max(1);

        let trees: Vec<TreeNode> = (0..cfg.n_trees)
            .into_par_iter()
            .map(|tree_idx| {
                let mut rng = StdRng::seed_from_u64(cfg.seed.wrapping_add(tree_idx as u64));
                let indices: Vec<usize> =
                    (0..n_samples).map(|_| rng.gen_range(0..n_samples)).collect();
                let boot_rows: Vec<&Vec<f64>> = indices.iter().map(|&i| &rows[i]).collect();
                let boot_labels: Vec<usize> = indices.iter().map(|&i| labels[i]).collect();
                build_tree(
                    &boot_rows,
                    &boot_labels,
                    n_classes,
                    cfg.max_depth,
                    features_per_split,
                    &mut rng,
                )
            })
            .collect();

        Self { trees, n_classes }
    }

    pub fn n_classes(&self) -> usize {
        self.n_classes
    }

    /// Mean of the per-tree leaf distributions; always sums to ~1.
    pub fn predict_proba(&self, row: &[f64]) -> Vec<f64> {
        if self.trees.is_empty() {
            return vec![1.0 / self.n_classes as f64; self.n_classes];
        }
        let mut probs = vec![0.0; self.n_classes];
        for tree in &self.trees {
            let leaf = descend(tree, row);
            for (acc, p) in probs.iter_mut().zip(leaf) {
                *acc += p;
            }
        }
        let n = self.trees.len() as f64;
        for p in &mut probs {
            *p /= n;
        }
        probs
    }

    pub fn predict(&self, row: &[f64]) -> usize {
        argmax(&self.predict_proba(row))
    }
}

pub fn argmax(probs: &[f64]) -> usize {
    let mut best = 0;
    for (i, p) in probs.iter().enumerate() {
        if *p > probs[best] {
            best = i;
        }
    }
    best
}

#[derive(Debug, Clone)]
enum TreeNode {
    Leaf {
        probs: Vec<f64>,
    },
    Split {
        feature_idx: usize,
        threshold: f64,
        left: Box<TreeNode>,
        right: Box<TreeNode>,
    },
}

fn class_distribution(labels: &[usize], n_classes: usize) -> Vec<f64> {
    let mut probs = vec![0.0; n_classes];
    if labels.is_empty() {
        return vec![1.0 / n_classes as f64; n_classes];
    }
    for &label in labels {
        if label < n_classes {
            probs[label] += 1.0;
        }
    }
    let n = labels.len() as f64;
    for p in &mut probs {
        *p /= n;
    }
    probs
}

fn build_tree(
    rows: &[&Vec<f64>],
    labels: &[usize],
    n_classes: usize,
    max_depth: usize,
    features_per_split: usize,
    rng: &mut StdRng,
) -> TreeNode {
    if max_depth == 0 || labels.len() < MIN_SAMPLES_SPLIT {
        return TreeNode::Leaf {
            probs: class_distribution(labels, n_classes),
        };
    }

    let first = labels[0];
    if labels.iter().all(|&l| l == first) {
        return TreeNode::Leaf {
            probs: class_distribution(labels, n_classes),
        };
    }

    let n_features = rows[0].len();
    let mut feature_indices: Vec<usize> = (0..n_features).collect();
    feature_indices.shuffle(rng);
    feature_indices.truncate(features_per_split);

    let mut best_gini = f64::MAX;
    let mut best_feature = 0;
    let mut best_threshold = 0.0;

    for &feat_idx in &feature_indices {
        let mut values: Vec<f64> = rows.iter().map(|r| r[feat_idx]).collect();
        values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
        values.dedup();
        if values.len() < 2 {
            continue;
        }

        // Thresholds between consecutive values, sampled to bound the scan.
        let step = (values.len() / 10).max(1);
        for i in (0..values.len() - 1).step_by(step) {
            let threshold = (values[i] + values[i + 1]) / 2.0;
            let gini = split_gini(rows, labels, n_classes, feat_idx, threshold);
            if gini < best_gini {
                best_gini = gini;
                best_feature = feat_idx;
                best_threshold = threshold;
            }
        }
    }

    if best_gini >= gini_impurity(labels, n_classes) {
        return TreeNode::Leaf {
            probs: class_distribution(labels, n_classes),
        };
    }

    let mut left_rows = Vec::new();
    let mut left_labels = Vec::new();
    let mut right_rows = Vec::new();
    let mut right_labels = Vec::new();
    for (i, row) in rows.iter().enumerate() {
        if row[best_feature] <= best_threshold {
            left_rows.push(*row);
            left_labels.push(labels[i]);
        } else {
            right_rows.push(*row);
            right_labels.push(labels[i]);
        }
    }

    if left_rows.is_empty() || right_rows.is_empty() {
        return TreeNode::Leaf {
            probs: class_distribution(labels, n_classes),
        };
    }

    TreeNode::Split {
        feature_idx: best_feature,
        threshold: best_threshold,
        left: Box::new(build_tree(
            &left_rows,
            &left_labels,
            n_classes,
            max_depth - 1,
            features_per_split,
            rng,
        )),
        right: Box::new(build_tree(
            &right_rows,
            &right_labels,
            n_classes,
            max_depth - 1,
            features_per_split,
            rng,
        )),
    }
}

fn gini_impurity(labels: &[usize], n_classes: usize) -> f64 {
    if labels.is_empty() {
        return 0.0;
    }
    let probs = class_distribution(labels, n_classes);
    1.0 - probs.iter().map(|p| p * p).sum::<f64>()
}

fn split_gini(
    rows: &[&Vec<f64>],
    labels: &[usize],
    n_classes: usize,
    feature_idx: usize,
    threshold: f64,
) -> f64 {
    let mut left = Vec::new();
    let mut right = Vec::new();
    for (i, row) in rows.iter().enumerate() {
        if row[feature_idx] <= threshold {
            left.push(labels[i]);
        } else {
            right.push(labels[i]);
        }
    }

    let n = labels.len() as f64;
    let n_left = left.len() as f64;
    let n_right = right.len() as f64;
    if n_left == 0.0 || n_right == 0.0 {
        return f64::MAX;
    }

    (n_left / n) * gini_impurity(&left, n_classes)
        + (n_right / n) * gini_impurity(&right, n_classes)
}

fn descend<'a>(node: &'a TreeNode, row: &[f64]) -> &'a [f64] {
    match node {
        TreeNode::Leaf { probs } => probs,
        TreeNode::Split {
            feature_idx,
            threshold,
            left,
            right,
        } => {
            if row.get(*feature_idx).copied().unwrap_or(0.0) <= *threshold {
                descend(left, row)
            } else {
                descend(right, row)
            }
        }
    }
}
