use rand::rngs::StdRng;
use rand::seq::index::sample;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::Serialize;

use crate::error::PipelineError;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ForestParams {
    pub max_depth: usize,
    pub n_estimators: usize,
    /// Fraction of the training rows a node needs before it may split.
    pub min_samples_split: f64,
    /// Fraction of the training rows each child must keep.
    pub min_samples_leaf: f64,
    /// Features tried per split; `None` tries all of them.
    pub max_features: Option<usize>,
    pub seed: u64,
}

impl Default for ForestParams {
    fn default() -> Self {
        Self {
            max_depth: 4,
            n_estimators: 200,
            min_samples_split: 0.10,
            min_samples_leaf: 0.05,
            max_features: None,
            seed: 42,
        }
    }
}

impl ForestParams {
    pub const MAX_DEPTH_RANGE: (usize, usize) = (1, 10);
    pub const N_ESTIMATORS_RANGE: (usize, usize) = (10, 200);
    pub const MIN_SAMPLES_SPLIT_RANGE: (f64, f64) = (0.01, 0.25);
    pub const MIN_SAMPLES_LEAF_RANGE: (f64, f64) = (0.0, 0.2);
    pub const MAX_FEATURES_RANGE: (usize, usize) = (1, 15);

    pub fn validate(&self) -> Result<(), PipelineError> {
        let invalid = |name: &'static str, value: String| {
            Err(PipelineError::InvalidHyperparameter { name, value })
        };
        let (lo, hi) = Self::MAX_DEPTH_RANGE;
        if !(lo..=hi).contains(&self.max_depth) {
            return invalid("max_depth", self.max_depth.to_string());
        }
        let (lo, hi) = Self::N_ESTIMATORS_RANGE;
        if !(lo..=hi).contains(&self.n_estimators) {
            return invalid("n_estimators", self.n_estimators.to_string());
        }
        let (lo, hi) = Self::MIN_SAMPLES_SPLIT_RANGE;
        if !(lo..=hi).contains(&self.min_samples_split) {
            return invalid("min_samples_split", self.min_samples_split.to_string());
        }
        let (lo, hi) = Self::MIN_SAMPLES_LEAF_RANGE;
        if !(lo..=hi).contains(&self.min_samples_leaf) {
            return invalid("min_samples_leaf", self.min_samples_leaf.to_string());
        }
        if let Some(k) = self.max_features {
            let (lo, hi) = Self::MAX_FEATURES_RANGE;
            if !(lo..=hi).contains(&k) {
                return invalid("max_features", k.to_string());
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Node {
    Leaf {
        p_win: f64,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

#[derive(Debug, Clone, PartialEq)]
struct Tree {
    nodes: Vec<Node>,
    importances: Vec<f64>,
}

impl Tree {
    fn predict(&self, row: &[f64]) -> f64 {
        let mut idx = 0;
        loop {
            match &self.nodes[idx] {
                Node::Leaf { p_win } => return *p_win,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    idx = if row[*feature] <= *threshold {
                        *left
                    } else {
                        *right
                    };
                }
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RandomForest {
    trees: Vec<Tree>,
    n_features: usize,
}

struct GrowCtx<'a> {
    x: &'a [Vec<f64>],
    y: &'a [bool],
    class_weight: [f64; 2],
    max_depth: usize,
    min_split: usize,
    min_leaf: usize,
    max_features: usize,
}

#[derive(Debug, Clone, Copy)]
struct SplitCandidate {
    feature: usize,
    threshold: f64,
    /// Rows going left in the sorted order.
    left_len: usize,
    decrease: f64,
}

impl RandomForest {
    /// Balanced-class bagged CART ensemble; deterministic for a given seed.
    pub fn fit(
        x: &[Vec<f64>],
        y: &[bool],
        params: &ForestParams,
    ) -> Result<Self, PipelineError> {
        params.validate()?;
        if x.is_empty() || x.len() != y.len() {
            return Err(PipelineError::EmptyTrainingSet);
        }
        let n = y.len();
        let positives = y.iter().filter(|v| **v).count();
        if positives == 0 || positives == n {
            return Err(PipelineError::DegenerateLabels);
        }
        let n_features = x[0].len();
        let class_weight = [
            n as f64 / (2.0 * (n - positives) as f64),
            n as f64 / (2.0 * positives as f64),
        ];
        let ctx = GrowCtx {
            x,
            y,
            class_weight,
            max_depth: params.max_depth,
            min_split: ((params.min_samples_split * n as f64).ceil() as usize).max(2),
            min_leaf: ((params.min_samples_leaf * n as f64).ceil() as usize).max(1),
            max_features: params.max_features.unwrap_or(n_features).clamp(1, n_features),
        };

        let trees: Vec<Tree> = (0..params.n_estimators)
            .into_par_iter()
            .map(|i| {
                let mut rng = StdRng::seed_from_u64(
                    params.seed.wrapping_add((i as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15)),
                );
                let rows: Vec<usize> = (0..n).map(|_| rng.gen_range(0..n)).collect();
                grow_tree(&ctx, rows, &mut rng, n_features)
            })
            .collect();

        tracing::debug!(
            trees = trees.len(),
            rows = n,
            positives,
            "random forest trained"
        );
        Ok(Self { trees, n_features })
    }

    pub fn predict_proba(&self, row: &[f64]) -> f64 {
        if self.trees.is_empty() {
            return 0.5;
        }
        self.trees.iter().map(|t| t.predict(row)).sum::<f64>() / self.trees.len() as f64
    }

    pub fn predict(&self, row: &[f64]) -> bool {
        self.predict_proba(row) > 0.5
    }

    /// Mean impurity decrease per feature, summing to 1.
    pub fn feature_importances(&self) -> Vec<f64> {
        let mut out = vec![0.0; self.n_features];
        let mut contributing = 0usize;
        for tree in &self.trees {
            let total: f64 = tree.importances.iter().sum();
            if total <= 0.0 {
                continue;
            }
            contributing += 1;
            for (acc, v) in out.iter_mut().zip(&tree.importances) {
                *acc += v / total;
            }
        }
        if contributing > 0 {
            for v in &mut out {
                *v /= contributing as f64;
            }
        }
        out
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }
}

fn grow_tree(ctx: &GrowCtx<'_>, rows: Vec<usize>, rng: &mut StdRng, n_features: usize) -> Tree {
    let mut tree = Tree {
        nodes: Vec::new(),
        importances: vec![0.0; n_features],
    };
    grow_node(ctx, &mut tree, rows, 0, rng);
    tree
}

fn class_totals(ctx: &GrowCtx<'_>, rows: &[usize]) -> [f64; 2] {
    let mut w = [0.0; 2];
    for &r in rows {
        let c = usize::from(ctx.y[r]);
        w[c] += ctx.class_weight[c];
    }
    w
}

fn gini(w: [f64; 2]) -> f64 {
    let total = w[0] + w[1];
    if total <= 0.0 {
        return 0.0;
    }
    let p = w[1] / total;
    2.0 * p * (1.0 - p)
}

fn grow_node(
    ctx: &GrowCtx<'_>,
    tree: &mut Tree,
    rows: Vec<usize>,
    depth: usize,
    rng: &mut StdRng,
) -> usize {
    let idx = tree.nodes.len();
    let totals = class_totals(ctx, &rows);
    let weight = totals[0] + totals[1];
    let p_win = if weight > 0.0 { totals[1] / weight } else { 0.5 };
    tree.nodes.push(Node::Leaf { p_win });

    let pure = totals[0] <= 0.0 || totals[1] <= 0.0;
    if depth >= ctx.max_depth || rows.len() < ctx.min_split || pure {
        return idx;
    }

    let Some((split, mut sorted)) = best_split(ctx, &rows, totals, rng) else {
        return idx;
    };
    tree.importances[split.feature] += split.decrease;

    let right_rows = sorted.split_off(split.left_len);
    let left = grow_node(ctx, tree, sorted, depth + 1, rng);
    let right = grow_node(ctx, tree, right_rows, depth + 1, rng);
    tree.nodes[idx] = Node::Split {
        feature: split.feature,
        threshold: split.threshold,
        left,
        right,
    };
    idx
}

/// Returns the best split and the rows sorted on its feature.
fn best_split(
    ctx: &GrowCtx<'_>,
    rows: &[usize],
    totals: [f64; 2],
    rng: &mut StdRng,
) -> Option<(SplitCandidate, Vec<usize>)> {
    let n_features = ctx.x[rows[0]].len();
    let parent_weight = totals[0] + totals[1];
    let parent_impurity = gini(totals);
    let candidates = sample(rng, n_features, ctx.max_features).into_vec();

    let mut best: Option<(SplitCandidate, Vec<usize>)> = None;
    for feature in candidates {
        let mut sorted = rows.to_vec();
        sorted.sort_by(|a, b| ctx.x[*a][feature].total_cmp(&ctx.x[*b][feature]));

        let mut left = [0.0; 2];
        for pos in 0..sorted.len() - 1 {
            let r = sorted[pos];
            let c = usize::from(ctx.y[r]);
            left[c] += ctx.class_weight[c];

            let left_len = pos + 1;
            if left_len < ctx.min_leaf || sorted.len() - left_len < ctx.min_leaf {
                continue;
            }
            let here = ctx.x[r][feature];
            let next = ctx.x[sorted[pos + 1]][feature];
            if here >= next {
                continue;
            }
            let right = [totals[0] - left[0], totals[1] - left[1]];
            let lw = left[0] + left[1];
            let rw = right[0] + right[1];
            let child = (lw * gini(left) + rw * gini(right)) / parent_weight;
            let decrease = parent_weight * (parent_impurity - child);
            if decrease <= 1e-12 {
                continue;
            }
            let better = best
                .as_ref()
                .is_none_or(|(b, _)| decrease > b.decrease + 1e-15);
            if better {
                best = Some((
                    SplitCandidate {
                        feature,
                        threshold: (here + next) / 2.0,
                        left_len,
                        decrease,
                    },
                    Vec::new(),
                ));
            }
        }
        if let Some((b, kept)) = best.as_mut()
            && b.feature == feature
            && kept.is_empty()
        {
            *kept = sorted;
        }
    }
    best
}
