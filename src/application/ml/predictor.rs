use crate::application::ml::estimator::FittedModel;
use crate::domain::errors::ModelError;
use crate::domain::ml::feature_registry::FeatureVector;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Interface for a model scoring one feature vector
pub trait SocDropModel: Send + Sync {
    /// Predicted value (SOC drop in points, or a probability for classifiers)
    fn predict(&self, features: &FeatureVector) -> Result<f64, ModelError>;

    /// Get model name/type
    fn name(&self) -> String;
}

impl SocDropModel for FittedModel {
    fn predict(&self, features: &FeatureVector) -> Result<f64, ModelError> {
        let predictions = self
            .predict_batch(std::slice::from_ref(features))
            .map_err(|e| ModelError::Predict {
                reason: e.to_string(),
            })?;
        predictions
            .first()
            .copied()
            .ok_or_else(|| ModelError::Predict {
                reason: "No prediction returned".to_string(),
            })
    }

    fn name(&self) -> String {
        FittedModel::name(self)
    }
}

/// Response body of a single prediction; absent models yield `null`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub pred_soc_drop_next_60min_pct: Option<f64>,
    pub prob_drop_ge_10pct_60min: Option<f64>,
}

/// Regressor and classifier pair used by the serving layer.
///
/// Either side may be missing (no model file at startup); predictions for the
/// missing side are `None` rather than an error.
#[derive(Clone, Default)]
pub struct SocDropPredictor {
    regressor: Option<Arc<dyn SocDropModel>>,
    classifier: Option<Arc<dyn SocDropModel>>,
}

impl SocDropPredictor {
    pub fn new(
        regressor: Option<Arc<dyn SocDropModel>>,
        classifier: Option<Arc<dyn SocDropModel>>,
    ) -> Self {
        Self {
            regressor,
            classifier,
        }
    }

    pub fn regressor_name(&self) -> Option<String> {
        self.regressor.as_ref().map(|m| m.name())
    }

    pub fn classifier_name(&self) -> Option<String> {
        self.classifier.as_ref().map(|m| m.name())
    }

    pub fn predict(&self, features: &FeatureVector) -> Result<Prediction, ModelError> {
        if !features.is_finite() {
            return Err(ModelError::InvalidFeatures {
                reason: "all seven features must be finite numbers".to_string(),
            });
        }

        let pred_soc_drop_next_60min_pct = self
            .regressor
            .as_ref()
            .map(|model| model.predict(features))
            .transpose()?;
        let prob_drop_ge_10pct_60min = self
            .classifier
            .as_ref()
            .map(|model| model.predict(features).map(|p| p.clamp(0.0, 1.0)))
            .transpose()?;

        Ok(Prediction {
            pred_soc_drop_next_60min_pct,
            prob_drop_ge_10pct_60min,
        })
    }
}
