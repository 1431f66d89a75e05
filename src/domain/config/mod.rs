//! Configuration domain module
//!
//! Validated value objects built from the environment layer in `crate::config`.

pub mod pipeline_config;

pub use pipeline_config::{
    DEFAULT_HORIZON_BUCKETS, DEFAULT_IDLE_SPEED_THRESHOLD_KMH, PipelineConfig, PipelineConfigError,
    parse_interval,
};
