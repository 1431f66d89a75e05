//! Serving configuration parsing from environment variables.

use super::parse_env;
use crate::application::ml::estimator::ModelFamily;
use anyhow::{Result, bail};
use std::env;

/// Serving environment configuration
#[derive(Debug, Clone, PartialEq)]
pub struct ServingEnvConfig {
    pub bind_address: String,
    pub port: u16,
    /// Family whose regressor/classifier pair is served
    pub model_family: ModelFamily,
    /// Seconds between JSON metric snapshots
    pub metrics_interval_seconds: u64,
}

impl Default for ServingEnvConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0".to_string(),
            port: 8000,
            model_family: ModelFamily::RandomForest,
            metrics_interval_seconds: 60,
        }
    }
}

pub fn parse_model_family(value: &str) -> Result<ModelFamily> {
    match value.trim().to_lowercase().replace(['_', '-'], "").as_str() {
        "randomforest" | "rf" => Ok(ModelFamily::RandomForest),
        "decisiontree" | "tree" | "dt" => Ok(ModelFamily::DecisionTree),
        other => bail!(
            "Invalid SERVE_MODEL_FAMILY: {}. Must be 'random_forest' or 'decision_tree'",
            other
        ),
    }
}

impl ServingEnvConfig {
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();
        let model_family = match env::var("SERVE_MODEL_FAMILY") {
            Ok(value) => parse_model_family(&value)?,
            Err(_) => defaults.model_family,
        };
        Ok(Self {
            bind_address: env::var("SERVE_BIND_ADDRESS").unwrap_or(defaults.bind_address),
            port: parse_env("SERVE_PORT", defaults.port)?,
            model_family,
            metrics_interval_seconds: parse_env(
                "SERVE_METRICS_INTERVAL_SECONDS",
                defaults.metrics_interval_seconds,
            )?,
        })
    }
}
