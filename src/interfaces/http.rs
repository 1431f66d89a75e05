//! HTTP surface for serving SOC-drop predictions.

use crate::application::ml::predictor::{Prediction, SocDropPredictor};
use crate::domain::errors::ModelError;
use crate::domain::ml::feature_registry::FeatureVector;
use crate::infrastructure::observability::PipelineMetrics;
use crate::infrastructure::observability::reporter::{OUTCOME_ERROR, OUTCOME_INVALID, OUTCOME_OK};
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, warn};

#[derive(Clone)]
pub struct AppState {
    pub predictor: Arc<SocDropPredictor>,
    pub metrics: PipelineMetrics,
}

impl AppState {
    pub fn new(predictor: SocDropPredictor, metrics: PipelineMetrics) -> Self {
        metrics.set_model_loaded("regressor", predictor.regressor_name().is_some());
        metrics.set_model_loaded("classifier", predictor.classifier_name().is_some());
        Self {
            predictor: Arc::new(predictor),
            metrics,
        }
    }
}

#[derive(Debug, Serialize, PartialEq)]
pub struct Health {
    pub status: &'static str,
    pub regressor: Option<String>,
    pub classifier: Option<String>,
}

type ApiError = (StatusCode, Json<serde_json::Value>);

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/predict", post(predict))
        .route("/health", get(health))
        .with_state(state)
}

pub async fn predict(
    State(state): State<AppState>,
    Json(features): Json<FeatureVector>,
) -> Result<Json<Prediction>, ApiError> {
    let started = Instant::now();
    let result = state.predictor.predict(&features);
    state
        .metrics
        .observe_prediction_latency("pair", started.elapsed().as_secs_f64());

    match result {
        Ok(prediction) => {
            state.metrics.inc_predictions(OUTCOME_OK);
            debug!("predict {:?} -> {:?}", features, prediction);
            Ok(Json(prediction))
        }
        Err(e @ ModelError::InvalidFeatures { .. }) => {
            state.metrics.inc_predictions(OUTCOME_INVALID);
            warn!("Rejected prediction request: {}", e);
            Err((StatusCode::BAD_REQUEST, Json(json!({ "error": e.to_string() }))))
        }
        Err(e) => {
            state.metrics.inc_predictions(OUTCOME_ERROR);
            error!("Prediction failed: {}", e);
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": e.to_string() })),
            ))
        }
    }
}

pub async fn health(State(state): State<AppState>) -> Json<Health> {
    Json(Health {
        status: "ok",
        regressor: state.predictor.regressor_name(),
        classifier: state.predictor.classifier_name(),
    })
}
