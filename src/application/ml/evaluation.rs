//! Hold-out metrics and the persisted evaluation report.

use crate::application::ml::estimator::ModelFamily;
use serde::{Deserialize, Serialize};
use smartcore::metrics;
use statrs::statistics::Statistics;
use std::collections::BTreeMap;

/// Mean absolute error. `0.0` for empty input.
pub fn mae(predictions: &[f64], actuals: &[f64]) -> f64 {
    let n = predictions.len().min(actuals.len());
    if n == 0 {
        return 0.0;
    }
    let (y_true, y_pred) = (&actuals[..n], &predictions[..n]);
    metrics::mean_absolute_error(&y_true, &y_pred)
}

/// Coefficient of determination. `0.0` when the actuals have no variance.
pub fn r2(predictions: &[f64], actuals: &[f64]) -> f64 {
    let n = predictions.len().min(actuals.len());
    if n == 0 {
        return 0.0;
    }
    let (y_true, y_pred) = (&actuals[..n], &predictions[..n]);
    let variance = y_true.iter().population_variance();
    if !variance.is_finite() || variance == 0.0 {
        return 0.0;
    }
    metrics::r2(&y_true, &y_pred)
}

fn class_counts(labels: &[u8]) -> (usize, usize) {
    let positives = labels.iter().filter(|l| **l == 1).count();
    (positives, labels.len() - positives)
}

/// ROC AUC via the rank-sum statistic with tied scores sharing their average rank.
///
/// `None` when only one class is present.
pub fn roc_auc(scores: &[f64], labels: &[u8]) -> Option<f64> {
    let n = scores.len().min(labels.len());
    let (positives, negatives) = class_counts(&labels[..n]);
    if positives == 0 || negatives == 0 {
        return None;
    }

    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|a, b| scores[*a].total_cmp(&scores[*b]));

    let mut positive_rank_sum = 0.0;
    let mut i = 0;
    while i < n {
        let mut j = i;
        while j + 1 < n && scores[order[j + 1]] == scores[order[i]] {
            j += 1;
        }
        // 1-based ranks i+1..=j+1 averaged over the tie group
        let average_rank = (i + j) as f64 / 2.0 + 1.0;
        for &idx in &order[i..=j] {
            if labels[idx] == 1 {
                positive_rank_sum += average_rank;
            }
        }
        i = j + 1;
    }

    let p = positives as f64;
    let u = positive_rank_sum - p * (p + 1.0) / 2.0;
    Some(u / (p * negatives as f64))
}

/// Average precision: sum over distinct thresholds (descending) of
/// `(recall_k - recall_{k-1}) * precision_k`.
///
/// `None` when only one class is present.
pub fn average_precision(scores: &[f64], labels: &[u8]) -> Option<f64> {
    let n = scores.len().min(labels.len());
    let (positives, negatives) = class_counts(&labels[..n]);
    if positives == 0 || negatives == 0 {
        return None;
    }

    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|a, b| scores[*b].total_cmp(&scores[*a]));

    let mut ap = 0.0;
    let mut true_positives = 0usize;
    let mut seen = 0usize;
    let mut previous_recall = 0.0;
    let mut i = 0;
    while i < n {
        let threshold = scores[order[i]];
        while i < n && scores[order[i]] == threshold {
            if labels[order[i]] == 1 {
                true_positives += 1;
            }
            seen += 1;
            i += 1;
        }
        let recall = true_positives as f64 / positives as f64;
        let precision = true_positives as f64 / seen as f64;
        ap += (recall - previous_recall) * precision;
        previous_recall = recall;
    }
    Some(ap)
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RegressionScores {
    #[serde(rename = "MAE")]
    pub mae: f64,
    #[serde(rename = "R2")]
    pub r2: f64,
}

impl RegressionScores {
    pub fn compute(predictions: &[f64], actuals: &[f64]) -> Self {
        Self {
            mae: mae(predictions, actuals),
            r2: r2(predictions, actuals),
        }
    }
}

/// Ranking scores; `None` serializes as `null` for a single-class test split.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassificationScores {
    #[serde(rename = "ROC_AUC")]
    pub roc_auc: Option<f64>,
    #[serde(rename = "PR_AUC")]
    pub pr_auc: Option<f64>,
}

impl ClassificationScores {
    pub fn compute(probabilities: &[f64], labels: &[u8]) -> Self {
        Self {
            roc_auc: roc_auc(probabilities, labels),
            pr_auc: average_precision(probabilities, labels),
        }
    }
}

/// Contents of `eval_metrics.json`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EvalReport {
    pub regression: BTreeMap<String, RegressionScores>,
    pub classification: BTreeMap<String, ClassificationScores>,
    pub feature_cols: Vec<String>,
    pub train_rows: usize,
    pub test_rows: usize,
}

impl EvalReport {
    pub fn regression_for(&self, family: ModelFamily) -> Option<&RegressionScores> {
        self.regression.get(&family.to_string())
    }

    pub fn classification_for(&self, family: ModelFamily) -> Option<&ClassificationScores> {
        self.classification.get(&family.to_string())
    }
}
