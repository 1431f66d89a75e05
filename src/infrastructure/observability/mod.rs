//! Push-based observability for the SOC-drop pipeline
//!
//! Metrics are only ever written out, never served:
//!
//! 1. **Structured JSON Logs**: periodic snapshots from the serving binary
//! 2. **Prometheus text**: one snapshot logged at the end of batch runs

pub mod metrics;
pub mod reporter;

pub use metrics::PipelineMetrics;
pub use reporter::{MetricsReporter, log_final_snapshot};
