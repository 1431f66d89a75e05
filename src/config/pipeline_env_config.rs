//! Pipeline configuration parsing from environment variables.
//!
//! Covers the enrichment idle threshold, the resample bucket width and the
//! label horizon.

use super::parse_env;
use crate::domain::config::pipeline_config::{
    DEFAULT_HORIZON_BUCKETS, DEFAULT_IDLE_SPEED_THRESHOLD_KMH,
};
use anyhow::Result;
use std::env;

/// Pipeline environment configuration
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineEnvConfig {
    pub idle_speed_threshold_kmh: f64,
    /// Raw interval string, validated later by `parse_interval`
    pub resample_interval: String,
    pub horizon_buckets: usize,
}

impl Default for PipelineEnvConfig {
    fn default() -> Self {
        Self {
            idle_speed_threshold_kmh: DEFAULT_IDLE_SPEED_THRESHOLD_KMH,
            resample_interval: "1min".to_string(),
            horizon_buckets: DEFAULT_HORIZON_BUCKETS,
        }
    }
}

impl PipelineEnvConfig {
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();
        Ok(Self {
            idle_speed_threshold_kmh: parse_env(
                "SPEED_IDLE_THRESHOLD",
                defaults.idle_speed_threshold_kmh,
            )?,
            resample_interval: env::var("RESAMPLE_MIN").unwrap_or(defaults.resample_interval),
            horizon_buckets: parse_env("HORIZON_MIN", defaults.horizon_buckets)?,
        })
    }
}
