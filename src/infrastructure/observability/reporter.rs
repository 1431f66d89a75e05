//! Push-based metrics reporter for the serving binary
//!
//! Periodically outputs a structured JSON snapshot to stdout.
//! Batch binaries log one Prometheus text snapshot at exit instead.

use crate::application::ml::predictor::SocDropPredictor;
use crate::infrastructure::observability::metrics::PipelineMetrics;
use serde::Serialize;
use std::time::{Duration, Instant};
use tracing::{info, warn};

pub const OUTCOME_OK: &str = "ok";
pub const OUTCOME_INVALID: &str = "invalid";
pub const OUTCOME_ERROR: &str = "error";

/// Metrics snapshot for JSON output
#[derive(Debug, Serialize)]
pub struct MetricsSnapshot {
    pub timestamp: String,
    pub uptime_seconds: u64,
    pub version: String,
    pub predictions: PredictionSnapshot,
    pub models: ModelSnapshot,
}

#[derive(Debug, Serialize)]
pub struct PredictionSnapshot {
    pub ok: u64,
    pub invalid: u64,
    pub error: u64,
}

#[derive(Debug, Serialize)]
pub struct ModelSnapshot {
    pub regressor: Option<String>,
    pub classifier: Option<String>,
}

/// Push-based metrics reporter
pub struct MetricsReporter {
    metrics: PipelineMetrics,
    models: ModelSnapshot,
    start_time: Instant,
    interval: Duration,
}

impl MetricsReporter {
    pub fn new(metrics: PipelineMetrics, predictor: &SocDropPredictor, interval_seconds: u64) -> Self {
        Self {
            metrics,
            models: ModelSnapshot {
                regressor: predictor.regressor_name(),
                classifier: predictor.classifier_name(),
            },
            start_time: Instant::now(),
            interval: Duration::from_secs(interval_seconds.max(1)),
        }
    }

    /// Run the reporter in a loop, outputting metrics periodically
    pub async fn run(self) {
        info!(
            "MetricsReporter: Starting push-based metrics (interval: {:?})",
            self.interval
        );

        loop {
            tokio::time::sleep(self.interval).await;

            let snapshot = self.collect_snapshot();
            match serde_json::to_string(&snapshot) {
                Ok(json) => {
                    println!("METRICS_JSON:{}", json);
                    info!(
                        "Predictions: {} ok | {} invalid | {} failed | Uptime: {}s",
                        snapshot.predictions.ok,
                        snapshot.predictions.invalid,
                        snapshot.predictions.error,
                        snapshot.uptime_seconds
                    );
                }
                Err(e) => warn!("Failed to serialize metrics: {}", e),
            }
        }
    }

    fn collect_snapshot(&self) -> MetricsSnapshot {
        let uptime = self.start_time.elapsed().as_secs();
        self.metrics.uptime_seconds.set(uptime as f64);

        let count = |outcome: &str| {
            PipelineMetrics::counter_value(&self.metrics.predictions_total, outcome) as u64
        };

        MetricsSnapshot {
            timestamp: chrono::Utc::now().to_rfc3339(),
            uptime_seconds: uptime,
            version: env!("CARGO_PKG_VERSION").to_string(),
            predictions: PredictionSnapshot {
                ok: count(OUTCOME_OK),
                invalid: count(OUTCOME_INVALID),
                error: count(OUTCOME_ERROR),
            },
            models: ModelSnapshot {
                regressor: self.models.regressor.clone(),
                classifier: self.models.classifier.clone(),
            },
        }
    }
}

/// Log the full Prometheus text exposition once, for batch runs.
pub fn log_final_snapshot(metrics: &PipelineMetrics) {
    for line in metrics.render().lines().filter(|l| !l.starts_with('#')) {
        info!("METRIC {}", line);
    }
}
