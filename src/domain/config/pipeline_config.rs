//! Pipeline Configuration Domain Value Object
//!
//! `PipelineConfig` carries the knobs shared by every pipeline stage
//! (idle threshold, bucket width, label horizon). It is built once from the
//! environment layer and passed explicitly into each stage.

use chrono::Duration;
use thiserror::Error;

/// Default enrichment idle threshold in km/h.
pub const DEFAULT_IDLE_SPEED_THRESHOLD_KMH: f64 = 2.0;

/// Default label horizon, in buckets.
pub const DEFAULT_HORIZON_BUCKETS: usize = 60;

/// Error type for PipelineConfig validation
#[derive(Debug, Error, PartialEq)]
pub enum PipelineConfigError {
    #[error("Invalid idle speed threshold: {value}. Must be finite and >= 0")]
    InvalidIdleThreshold { value: f64 },

    #[error("Invalid resample interval: {seconds}s. Must be positive")]
    InvalidResampleInterval { seconds: i64 },

    #[error("Invalid resample interval '{value}'. Expected e.g. '1min', '30s', '1h'")]
    UnparseableInterval { value: String },
}

/// Pipeline configuration value object
///
/// # Invariants
///
/// - `idle_speed_threshold_kmh` is finite and non-negative
/// - `resample_interval` is strictly positive
/// - `horizon_buckets` may be zero (label against the same bucket)
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    /// Speeds strictly above this (km/h) mark an enriched reading as moving
    pub idle_speed_threshold_kmh: f64,

    /// Width of one resampling bucket
    pub resample_interval: Duration,

    /// How many buckets ahead the label looks
    pub horizon_buckets: usize,
}

impl PipelineConfig {
    /// Create a new PipelineConfig with validation
    pub fn new(
        idle_speed_threshold_kmh: f64,
        resample_interval: Duration,
        horizon_buckets: usize,
    ) -> Result<Self, PipelineConfigError> {
        let config = Self {
            idle_speed_threshold_kmh,
            resample_interval,
            horizon_buckets,
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), PipelineConfigError> {
        if !self.idle_speed_threshold_kmh.is_finite() || self.idle_speed_threshold_kmh < 0.0 {
            return Err(PipelineConfigError::InvalidIdleThreshold {
                value: self.idle_speed_threshold_kmh,
            });
        }

        if self.resample_interval <= Duration::zero() {
            return Err(PipelineConfigError::InvalidResampleInterval {
                seconds: self.resample_interval.num_seconds(),
            });
        }

        Ok(())
    }

    /// Returns a copy with a different horizon (CLI override).
    pub fn with_horizon(mut self, horizon_buckets: usize) -> Self {
        self.horizon_buckets = horizon_buckets;
        self
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            idle_speed_threshold_kmh: DEFAULT_IDLE_SPEED_THRESHOLD_KMH,
            resample_interval: Duration::minutes(1),
            horizon_buckets: DEFAULT_HORIZON_BUCKETS,
        }
    }
}

/// Parse a bucket width such as `1min`, `30s`, `2h` or a bare number of minutes.
pub fn parse_interval(value: &str) -> Result<Duration, PipelineConfigError> {
    let trimmed = value.trim().to_lowercase();
    let split_at = trimmed
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(trimmed.len());
    let (digits, unit) = trimmed.split_at(split_at);

    let unparseable = || PipelineConfigError::UnparseableInterval {
        value: value.to_string(),
    };

    let amount: i64 = digits.parse().map_err(|_| unparseable())?;
    let interval = match unit.trim() {
        "" | "min" | "mins" | "m" | "t" => Duration::try_minutes(amount),
        "s" | "sec" | "secs" => Duration::try_seconds(amount),
        "h" | "hr" | "hour" | "hours" => Duration::try_hours(amount),
        _ => return Err(unparseable()),
    }
    .ok_or_else(unparseable)?;

    if interval <= Duration::zero() {
        return Err(PipelineConfigError::InvalidResampleInterval {
            seconds: interval.num_seconds(),
        });
    }
    Ok(interval)
}
