use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde::Serialize;

use crate::features::MODEL_FEATURES;

pub const TEST_FRACTION: f64 = 0.2;
pub const SPLIT_SEED: u64 = 42;
pub const CALIBRATION_BINS: usize = 25;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Split {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

/// Shuffled split keeping the win/loss ratio in both halves. Indices come back sorted.
pub fn stratified_split(labels: &[bool], test_fraction: f64, seed: u64) -> Split {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut train = Vec::new();
    let mut test = Vec::new();
    for class in [false, true] {
        let mut idx: Vec<usize> = labels
            .iter()
            .enumerate()
            .filter(|(_, l)| **l == class)
            .map(|(i, _)| i)
            .collect();
        idx.shuffle(&mut rng);
        let n_test = ((idx.len() as f64) * test_fraction.clamp(0.0, 1.0)).round() as usize;
        test.extend_from_slice(&idx[..n_test]);
        train.extend_from_slice(&idx[n_test..]);
    }
    train.sort_unstable();
    test.sort_unstable();
    Split { train, test }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct ConfusionMatrix {
    pub true_positive: usize,
    pub false_positive: usize,
    pub true_negative: usize,
    pub false_negative: usize,
}

impl ConfusionMatrix {
    pub fn from_predictions(predicted: &[bool], actual: &[bool]) -> Self {
        let mut m = Self::default();
        for (p, a) in predicted.iter().zip(actual) {
            match (p, a) {
                (true, true) => m.true_positive += 1,
                (true, false) => m.false_positive += 1,
                (false, false) => m.true_negative += 1,
                (false, true) => m.false_negative += 1,
            }
        }
        m
    }

    pub fn total(&self) -> usize {
        self.true_positive + self.false_positive + self.true_negative + self.false_negative
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CalibrationBin {
    pub bucket_start: f64,
    pub bucket_end: f64,
    pub count: usize,
    pub avg_pred: f64,
    pub actual_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Metrics {
    pub samples: usize,
    /// `None` when the evaluated labels hold a single class.
    pub auc: Option<f64>,
    pub accuracy: f64,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub brier: f64,
    pub confusion: ConfusionMatrix,
    pub calibration: Vec<CalibrationBin>,
}

fn safe_div(num: f64, den: f64) -> f64 {
    if den > 0.0 { num / den } else { 0.0 }
}

pub fn evaluate(probs: &[f64], actual: &[bool]) -> Metrics {
    let predicted: Vec<bool> = probs.iter().map(|p| *p > 0.5).collect();
    let confusion = ConfusionMatrix::from_predictions(&predicted, actual);
    let tp = confusion.true_positive as f64;
    let precision = safe_div(tp, tp + confusion.false_positive as f64);
    let recall = safe_div(tp, tp + confusion.false_negative as f64);
    let brier = safe_div(
        probs
            .iter()
            .zip(actual)
            .map(|(p, a)| {
                let y = if *a { 1.0 } else { 0.0 };
                (p - y) * (p - y)
            })
            .sum(),
        probs.len() as f64,
    );
    Metrics {
        samples: probs.len(),
        auc: roc_auc(probs, actual),
        accuracy: safe_div(
            (confusion.true_positive + confusion.true_negative) as f64,
            confusion.total() as f64,
        ),
        precision,
        recall,
        f1: safe_div(2.0 * precision * recall, precision + recall),
        brier,
        confusion,
        calibration: calibration_bins(probs, actual, CALIBRATION_BINS),
    }
}

/// Mann-Whitney AUC; tied scores share their average rank.
pub fn roc_auc(probs: &[f64], actual: &[bool]) -> Option<f64> {
    let positives = actual.iter().filter(|a| **a).count();
    let negatives = actual.len() - positives;
    if positives == 0 || negatives == 0 {
        return None;
    }
    let mut order: Vec<usize> = (0..probs.len()).collect();
    order.sort_by(|a, b| probs[*a].total_cmp(&probs[*b]));

    let mut rank_sum_pos = 0.0;
    let mut i = 0;
    while i < order.len() {
        let mut j = i;
        while j + 1 < order.len() && probs[order[j + 1]] == probs[order[i]] {
            j += 1;
        }
        let avg_rank = (i + j) as f64 / 2.0 + 1.0;
        for &k in &order[i..=j] {
            if actual[k] {
                rank_sum_pos += avg_rank;
            }
        }
        i = j + 1;
    }
    let p = positives as f64;
    Some((rank_sum_pos - p * (p + 1.0) / 2.0) / (p * negatives as f64))
}

pub fn calibration_bins(probs: &[f64], actual: &[bool], bins: usize) -> Vec<CalibrationBin> {
    let bins = bins.max(2);
    let mut counts = vec![0usize; bins];
    let mut pred_sum = vec![0.0_f64; bins];
    let mut actual_sum = vec![0.0_f64; bins];

    for (p, won) in probs.iter().zip(actual) {
        let p = p.clamp(0.0, 1.0);
        let idx = ((p * bins as f64).floor() as usize).min(bins - 1);
        counts[idx] += 1;
        pred_sum[idx] += p;
        if *won {
            actual_sum[idx] += 1.0;
        }
    }

    (0..bins)
        .filter(|i| counts[*i] > 0)
        .map(|i| CalibrationBin {
            bucket_start: i as f64 / bins as f64,
            bucket_end: (i + 1) as f64 / bins as f64,
            count: counts[i],
            avg_pred: pred_sum[i] / counts[i] as f64,
            actual_rate: actual_sum[i] / counts[i] as f64,
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureImportance {
    pub feature: &'static str,
    pub importance: f64,
}

/// Pairs importances with `MODEL_FEATURES`, largest first.
pub fn ranked_importances(importances: &[f64]) -> Vec<FeatureImportance> {
    let mut out: Vec<FeatureImportance> = MODEL_FEATURES
        .iter()
        .zip(importances)
        .map(|(feature, importance)| FeatureImportance {
            feature: *feature,
            importance: *importance,
        })
        .collect();
    out.sort_by(|a, b| {
        b.importance
            .total_cmp(&a.importance)
            .then(a.feature.cmp(b.feature))
    });
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auc_averages_tied_ranks() {
        let probs = [0.5, 0.5];
        let actual = [true, false];
        assert_eq!(roc_auc(&probs, &actual), Some(0.5));
        assert_eq!(roc_auc(&[0.1, 0.9], &[false, true]), Some(1.0));
        assert_eq!(roc_auc(&[0.1, 0.9], &[true, true]), None);
    }
}
