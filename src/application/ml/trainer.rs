//! Fits every model family on an ordered train/test split and scores it.

use crate::application::ml::estimator::{EstimatorParams, FittedModel, ModelFamily, Task};
use crate::application::ml::evaluation::{ClassificationScores, EvalReport, RegressionScores};
use crate::domain::errors::TrainingError;
use crate::domain::ml::feature_registry::{FEATURE_NAMES, FeatureVector};
use crate::domain::telematics::types::SupervisedDataset;
use tracing::{info, warn};

pub const DEFAULT_TRAIN_FRACTION: f64 = 0.7;

#[derive(Debug, Clone, PartialEq)]
pub struct TrainerConfig {
    /// Leading share of rows used for fitting; the rest is the hold-out
    pub train_fraction: f64,
    pub params: EstimatorParams,
}

impl TrainerConfig {
    pub fn new(train_fraction: f64, params: EstimatorParams) -> Result<Self, TrainingError> {
        if !(train_fraction > 0.0 && train_fraction < 1.0) {
            return Err(TrainingError::InvalidTrainFraction {
                value: train_fraction,
            });
        }
        Ok(Self {
            train_fraction,
            params,
        })
    }
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self {
            train_fraction: DEFAULT_TRAIN_FRACTION,
            params: EstimatorParams::default(),
        }
    }
}

/// Output of one training run
pub struct TrainedModels {
    pub regressors: Vec<FittedModel>,
    pub classifiers: Vec<FittedModel>,
    pub report: EvalReport,
}

impl TrainedModels {
    pub fn regressor(&self, family: ModelFamily) -> Option<&FittedModel> {
        self.regressors.iter().find(|m| m.family == family)
    }

    pub fn classifier(&self, family: ModelFamily) -> Option<&FittedModel> {
        self.classifiers.iter().find(|m| m.family == family)
    }
}

/// Index of the first hold-out row for an ordered split.
pub fn split_index(rows: usize, train_fraction: f64) -> Result<usize, TrainingError> {
    if !(train_fraction > 0.0 && train_fraction < 1.0) {
        return Err(TrainingError::InvalidTrainFraction {
            value: train_fraction,
        });
    }
    let split = (rows as f64 * train_fraction).floor() as usize;
    if split == 0 {
        return Err(TrainingError::InsufficientRows {
            split: "train".to_string(),
            rows: 0,
        });
    }
    if split >= rows {
        return Err(TrainingError::InsufficientRows {
            split: "test".to_string(),
            rows: rows.saturating_sub(split),
        });
    }
    Ok(split)
}

/// Train regressors and classifiers for every family and score them on the hold-out.
///
/// The split keeps dataset order (no shuffling), so the hold-out is the tail
/// of the table.
pub fn train_models(
    dataset: &SupervisedDataset,
    config: &TrainerConfig,
) -> Result<TrainedModels, TrainingError> {
    let split = split_index(dataset.len(), config.train_fraction)?;
    let (x_train, x_test): (&[FeatureVector], &[FeatureVector]) = dataset.features.split_at(split);
    let (drop_train, drop_test) = dataset.soc_drop.split_at(split);
    let indicator = dataset.label_indicator();
    let (label_train, _) = indicator.split_at(split);
    let label_test = &dataset.will_drop_10pct[split..];

    info!(
        "Training on {} rows, evaluating on {} rows",
        x_train.len(),
        x_test.len()
    );

    let positives = label_train.iter().filter(|l| **l > 0.5).count();
    if positives == 0 || positives == label_train.len() {
        warn!(
            "Training split has a single class ({} of {} positive); classifiers will predict a constant",
            positives,
            label_train.len()
        );
    }

    let mut report = EvalReport {
        feature_cols: FEATURE_NAMES.iter().map(|s| s.to_string()).collect(),
        train_rows: x_train.len(),
        test_rows: x_test.len(),
        ..Default::default()
    };
    let mut regressors = Vec::with_capacity(ModelFamily::ALL.len());
    let mut classifiers = Vec::with_capacity(ModelFamily::ALL.len());

    for family in ModelFamily::ALL {
        let regressor =
            FittedModel::fit(family, Task::Regression, x_train, drop_train, &config.params)?;
        let predictions = regressor.predict_batch(x_test)?;
        let scores = RegressionScores::compute(&predictions, drop_test);
        info!(
            "[{}] regression MAE={:.3} R2={:.3}",
            family, scores.mae, scores.r2
        );
        report.regression.insert(family.to_string(), scores);
        regressors.push(regressor);

        let classifier = FittedModel::fit(
            family,
            Task::Classification,
            x_train,
            label_train,
            &config.params,
        )?;
        let probabilities = classifier.predict_batch(x_test)?;
        let scores = ClassificationScores::compute(&probabilities, label_test);
        match (scores.roc_auc, scores.pr_auc) {
            (Some(roc), Some(pr)) => info!(
                "[{}] classification ROC_AUC={:.3} PR_AUC={:.3}",
                family, roc, pr
            ),
            _ => warn!(
                "[{}] hold-out has a single class; ROC_AUC and PR_AUC are undefined",
                family
            ),
        }
        report.classification.insert(family.to_string(), scores);
        classifiers.push(classifier);
    }

    Ok(TrainedModels {
        regressors,
        classifiers,
        report,
    })
}
