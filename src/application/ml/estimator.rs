use crate::domain::errors::TrainingError;
use crate::domain::ml::feature_registry::{FEATURE_NAMES, FeatureVector};
use serde::{Deserialize, Serialize};
use smartcore::ensemble::random_forest_regressor::{
    RandomForestRegressor, RandomForestRegressorParameters,
};
use smartcore::linalg::basic::matrix::DenseMatrix;
use smartcore::tree::decision_tree_regressor::{
    DecisionTreeRegressor, DecisionTreeRegressorParameters,
};
use std::fmt;

/// Algorithm family used for a fitted model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ModelFamily {
    RandomForest,
    DecisionTree,
}

impl ModelFamily {
    pub const ALL: [ModelFamily; 2] = [ModelFamily::RandomForest, ModelFamily::DecisionTree];

    /// File-name friendly identifier.
    pub fn slug(&self) -> &'static str {
        match self {
            ModelFamily::RandomForest => "random_forest",
            ModelFamily::DecisionTree => "decision_tree",
        }
    }
}

impl fmt::Display for ModelFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// What a model predicts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Task {
    /// SOC drop in percentage points over the horizon
    Regression,
    /// Probability that the drop is at least 10 points
    Classification,
}

impl Task {
    pub fn slug(&self) -> &'static str {
        match self {
            Task::Regression => "regressor",
            Task::Classification => "classifier",
        }
    }
}

/// Tree hyperparameters shared by both families
#[derive(Debug, Clone, PartialEq)]
pub struct EstimatorParams {
    pub n_trees: usize,
    pub forest_max_depth: u16,
    pub tree_max_depth: u16,
    pub min_samples_split: usize,
}

impl Default for EstimatorParams {
    fn default() -> Self {
        Self {
            n_trees: 100,
            forest_max_depth: 10,
            tree_max_depth: 6,
            min_samples_split: 5,
        }
    }
}

#[derive(Serialize, Deserialize)]
enum Estimator {
    RandomForest(RandomForestRegressor<f64, f64, DenseMatrix<f64>, Vec<f64>>),
    DecisionTree(DecisionTreeRegressor<f64, f64, DenseMatrix<f64>, Vec<f64>>),
}

/// A fitted smartcore model plus the metadata needed to serve it.
///
/// Classifiers are regression trees fitted on the 0/1 label: with squared-error
/// splits on a binary target each leaf mean is the positive-class fraction,
/// so predictions are read directly as probabilities.
#[derive(Serialize, Deserialize)]
pub struct FittedModel {
    pub family: ModelFamily,
    pub task: Task,
    pub feature_names: Vec<String>,
    estimator: Estimator,
}

pub fn to_matrix(rows: &[FeatureVector]) -> Result<DenseMatrix<f64>, TrainingError> {
    let values: Vec<Vec<f64>> = rows.iter().map(FeatureVector::to_vec).collect();
    DenseMatrix::from_2d_vec(&values).map_err(|e| TrainingError::Matrix {
        reason: e.to_string(),
    })
}

impl FittedModel {
    /// Fit one family on one target. For `Task::Classification` the target must be 0/1.
    pub fn fit(
        family: ModelFamily,
        task: Task,
        x: &[FeatureVector],
        y: &[f64],
        params: &EstimatorParams,
    ) -> Result<Self, TrainingError> {
        if x.is_empty() || x.len() != y.len() {
            return Err(TrainingError::InsufficientRows {
                split: "fit".to_string(),
                rows: x.len().min(y.len()),
            });
        }

        let matrix = to_matrix(x)?;
        let target = y.to_vec();
        let fit_error = |e: smartcore::error::Failed| TrainingError::Fit {
            model: format!("{} {}", family, task.slug()),
            reason: e.to_string(),
        };

        let estimator = match family {
            ModelFamily::RandomForest => {
                let parameters = RandomForestRegressorParameters::default()
                    .with_n_trees(params.n_trees)
                    .with_max_depth(params.forest_max_depth)
                    .with_min_samples_split(params.min_samples_split);
                Estimator::RandomForest(
                    RandomForestRegressor::fit(&matrix, &target, parameters).map_err(fit_error)?,
                )
            }
            ModelFamily::DecisionTree => {
                let parameters = DecisionTreeRegressorParameters::default()
                    .with_max_depth(params.tree_max_depth)
                    .with_min_samples_split(params.min_samples_split);
                Estimator::DecisionTree(
                    DecisionTreeRegressor::fit(&matrix, &target, parameters).map_err(fit_error)?,
                )
            }
        };

        Ok(Self {
            family,
            task,
            feature_names: FEATURE_NAMES.iter().map(|s| s.to_string()).collect(),
            estimator,
        })
    }

    pub fn name(&self) -> String {
        format!("{} {}", self.family, self.task.slug())
    }

    /// Predict a batch. Classifier outputs are clamped to [0, 1].
    pub fn predict_batch(&self, rows: &[FeatureVector]) -> Result<Vec<f64>, TrainingError> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }
        let matrix = to_matrix(rows)?;
        let raw = match &self.estimator {
            Estimator::RandomForest(model) => model.predict(&matrix),
            Estimator::DecisionTree(model) => model.predict(&matrix),
        }
        .map_err(|e| TrainingError::Predict {
            model: self.name(),
            reason: e.to_string(),
        })?;

        Ok(match self.task {
            Task::Regression => raw,
            Task::Classification => raw.into_iter().map(|p| p.clamp(0.0, 1.0)).collect(),
        })
    }

    /// True when the persisted feature order matches the current registry.
    pub fn matches_registry(&self) -> bool {
        self.feature_names.iter().map(String::as_str).eq(FEATURE_NAMES.iter().copied())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fv(speed: f64, soc: f64) -> FeatureVector {
        FeatureVector {
            speed_mean: speed,
            speed_max: speed + 5.0,
            km_travelled: speed / 60.0,
            km_15m: speed / 4.0,
            speed_mean_15m: speed,
            soc_mean: soc,
            soc_delta_15m: -speed / 10.0,
        }
    }

    fn toy_data() -> (Vec<FeatureVector>, Vec<f64>, Vec<f64>) {
        let mut x = Vec::new();
        let mut drop = Vec::new();
        let mut label = Vec::new();
        for i in 0..60 {
            let speed = if i % 2 == 0 { 5.0 } else { 60.0 };
            x.push(fv(speed + (i % 5) as f64, 50.0 + (i % 7) as f64));
            let d = if speed > 30.0 { 15.0 } else { 1.0 };
            drop.push(d);
            label.push(if d >= 10.0 { 1.0 } else { 0.0 });
        }
        (x, drop, label)
    }

    fn small_params() -> EstimatorParams {
        EstimatorParams {
            n_trees: 10,
            forest_max_depth: 4,
            tree_max_depth: 4,
            min_samples_split: 2,
        }
    }

    #[test]
    fn test_family_slugs() {
        assert_eq!(ModelFamily::RandomForest.slug(), "random_forest");
        assert_eq!(ModelFamily::DecisionTree.to_string(), "DecisionTree");
        assert_eq!(Task::Classification.slug(), "classifier");
    }

    #[test]
    fn test_decision_tree_learns_separable_target() {
        let (x, drop, _) = toy_data();
        let model = FittedModel::fit(
            ModelFamily::DecisionTree,
            Task::Regression,
            &x,
            &drop,
            &small_params(),
        )
        .unwrap();

        let preds = model.predict_batch(&[fv(5.0, 52.0), fv(61.0, 52.0)]).unwrap();
        assert!((preds[0] - 1.0).abs() < 1e-9);
        assert!((preds[1] - 15.0).abs() < 1e-9);
        assert!(model.matches_registry());
    }

    #[test]
    fn test_classifier_outputs_probabilities() {
        let (x, _, label) = toy_data();
        for family in ModelFamily::ALL {
            let model =
                FittedModel::fit(family, Task::Classification, &x, &label, &small_params()).unwrap();
            let probs = model.predict_batch(&x).unwrap();
            assert_eq!(probs.len(), x.len());
            assert!(probs.iter().all(|p| (0.0..=1.0).contains(p)));
        }
    }

    #[test]
    fn test_fit_rejects_empty_input() {
        let result = FittedModel::fit(
            ModelFamily::RandomForest,
            Task::Regression,
            &[],
            &[],
            &small_params(),
        );
        assert!(matches!(
            result,
            Err(TrainingError::InsufficientRows { rows: 0, .. })
        ));
    }

    #[test]
    fn test_model_serde_roundtrip_predicts_identically() {
        let (x, drop, _) = toy_data();
        let model = FittedModel::fit(
            ModelFamily::RandomForest,
            Task::Regression,
            &x,
            &drop,
            &small_params(),
        )
        .unwrap();

        let json = serde_json::to_string(&model).unwrap();
        let restored: FittedModel = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.family, ModelFamily::RandomForest);
        let before = model.predict_batch(&x).unwrap();
        let after = restored.predict_batch(&x).unwrap();
        for (a, b) in before.iter().zip(&after) {
            assert!((a - b).abs() < 1e-9);
        }
    }
}
