//! Configuration module for the SOC-drop pipeline.
//!
//! Structured configuration loading from environment variables, organized by
//! concern: Pipeline, Training and Serving.

mod pipeline_env_config;
mod serving_env_config;
mod training_env_config;

pub use pipeline_env_config::PipelineEnvConfig;
pub use serving_env_config::{ServingEnvConfig, parse_model_family};
pub use training_env_config::TrainingEnvConfig;

use crate::application::ml::trainer::TrainerConfig;
use crate::domain::config::pipeline_config::{PipelineConfig, parse_interval};
use anyhow::{Context, Result};
use std::env;
use std::str::FromStr;

/// Parse `key` from the environment, falling back to `default` when unset.
/// A set but unparseable value is an error.
pub(crate) fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(value) => value
            .trim()
            .parse::<T>()
            .context(format!("Failed to parse {}", key)),
        Err(_) => Ok(default),
    }
}

/// Main application configuration.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Config {
    pub pipeline: PipelineEnvConfig,
    pub training: TrainingEnvConfig,
    pub serving: ServingEnvConfig,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            pipeline: PipelineEnvConfig::from_env().context("Failed to load pipeline config")?,
            training: TrainingEnvConfig::from_env().context("Failed to load training config")?,
            serving: ServingEnvConfig::from_env().context("Failed to load serving config")?,
        })
    }

    /// Validated pipeline value object handed to every stage.
    pub fn to_pipeline_config(&self) -> Result<PipelineConfig> {
        let interval = parse_interval(&self.pipeline.resample_interval)
            .context("Failed to parse RESAMPLE_MIN")?;
        PipelineConfig::new(
            self.pipeline.idle_speed_threshold_kmh,
            interval,
            self.pipeline.horizon_buckets,
        )
        .context("Invalid pipeline configuration")
    }

    pub fn to_trainer_config(&self) -> Result<TrainerConfig> {
        TrainerConfig::new(
            self.training.train_fraction,
            self.training.estimator_params(),
        )
        .context("Invalid training configuration")
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.serving.bind_address, self.serving.port)
    }
}
