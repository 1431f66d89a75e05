use serde::{Deserialize, Serialize};

/// Ordered list of feature names.
/// This order MUST match between training matrices and serving inputs.
/// Any change here is a breaking change for persisted models.
pub const FEATURE_NAMES: &[&str] = &[
    "speed_mean",
    "speed_max",
    "km_travelled",
    "km_15m",
    "speed_mean_15m",
    "soc_mean",
    "soc_delta_15m",
];

/// The seven per-bucket features a model consumes.
///
/// Serving callers send exactly these fields; unknown fields are rejected.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FeatureVector {
    pub speed_mean: f64,
    pub speed_max: f64,
    pub km_travelled: f64,
    pub km_15m: f64,
    pub speed_mean_15m: f64,
    pub soc_mean: f64,
    pub soc_delta_15m: f64,
}

impl FeatureVector {
    /// Values in `FEATURE_NAMES` order.
    pub fn to_array(&self) -> [f64; 7] {
        [
            self.speed_mean,
            self.speed_max,
            self.km_travelled,
            self.km_15m,
            self.speed_mean_15m,
            self.soc_mean,
            self.soc_delta_15m,
        ]
    }

    pub fn to_vec(&self) -> Vec<f64> {
        self.to_array().to_vec()
    }

    /// Rejects NaN/inf so a bad request never reaches a model.
    pub fn is_finite(&self) -> bool {
        self.to_array().iter().all(|v| v.is_finite())
    }
}
