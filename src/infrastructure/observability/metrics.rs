//! Prometheus metrics definitions for the SOC-drop pipeline
//!
//! All metrics use the `socdrop_` prefix. Nothing is served over HTTP;
//! snapshots are rendered to the log by the binaries.

use crate::application::pipeline::{EnrichmentReport, LabelReport, PipelineReport, ResampleReport};
use prometheus::{
    CounterVec, Gauge, GaugeVec, HistogramOpts, HistogramVec, Opts, Registry, TextEncoder,
    core::{AtomicF64, GenericGauge, GenericGaugeVec},
};
use std::sync::Arc;

/// Prometheus metrics for pipeline runs and prediction serving
#[derive(Clone)]
pub struct PipelineMetrics {
    registry: Arc<Registry>,
    /// Raw readings by outcome (kept / dropped reason)
    pub readings_total: CounterVec,
    /// Resampled buckets by kind (total / empty)
    pub resampled_buckets: GenericGaugeVec<AtomicF64>,
    /// Candidate supervised rows by outcome
    pub supervised_rows_total: CounterVec,
    /// Served predictions by outcome
    pub predictions_total: CounterVec,
    /// Prediction latency in seconds
    pub prediction_latency_seconds: HistogramVec,
    /// Loaded models (1 = loaded) by role
    pub model_loaded: GenericGaugeVec<AtomicF64>,
    /// Uptime in seconds
    pub uptime_seconds: GenericGauge<AtomicF64>,
}

impl PipelineMetrics {
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        let readings_total = CounterVec::new(
            Opts::new("socdrop_readings_total", "Raw readings by enrichment outcome"),
            &["outcome"],
        )?;
        registry.register(Box::new(readings_total.clone()))?;

        let resampled_buckets = GaugeVec::new(
            Opts::new("socdrop_resampled_buckets", "Buckets emitted by the last resample"),
            &["kind"],
        )?;
        registry.register(Box::new(resampled_buckets.clone()))?;

        let supervised_rows_total = CounterVec::new(
            Opts::new(
                "socdrop_supervised_rows_total",
                "Resampled rows by label-builder outcome",
            ),
            &["outcome"],
        )?;
        registry.register(Box::new(supervised_rows_total.clone()))?;

        let predictions_total = CounterVec::new(
            Opts::new("socdrop_predictions_total", "Prediction requests by outcome"),
            &["outcome"],
        )?;
        registry.register(Box::new(predictions_total.clone()))?;

        let prediction_latency_seconds = HistogramVec::new(
            HistogramOpts::new(
                "socdrop_prediction_latency_seconds",
                "Model inference latency in seconds",
            )
            .buckets(vec![0.0001, 0.0005, 0.001, 0.005, 0.01, 0.05, 0.1, 0.5]),
            &["model"],
        )?;
        registry.register(Box::new(prediction_latency_seconds.clone()))?;

        let model_loaded = GaugeVec::new(
            Opts::new("socdrop_model_loaded", "Whether a model is loaded (1) or not (0)"),
            &["role"],
        )?;
        registry.register(Box::new(model_loaded.clone()))?;

        let uptime_seconds = Gauge::with_opts(Opts::new(
            "socdrop_uptime_seconds",
            "Process uptime in seconds",
        ))?;
        registry.register(Box::new(uptime_seconds.clone()))?;

        Ok(Self {
            registry: Arc::new(registry),
            readings_total,
            resampled_buckets,
            supervised_rows_total,
            predictions_total,
            prediction_latency_seconds,
            model_loaded,
            uptime_seconds,
        })
    }

    /// Render all metrics in Prometheus text format
    pub fn render(&self) -> String {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        encoder
            .encode_to_string(&metric_families)
            .unwrap_or_default()
    }

    pub fn record_enrichment(&self, report: &EnrichmentReport) {
        let by_outcome = [
            ("kept", report.output_rows),
            ("dropped_missing_timestamp", report.dropped_missing_timestamp),
            ("dropped_missing_vehicle", report.dropped_missing_vehicle),
        ];
        for (outcome, count) in by_outcome {
            self.readings_total
                .with_label_values(&[outcome])
                .inc_by(count as f64);
        }
    }

    pub fn record_resample(&self, report: &ResampleReport) {
        self.resampled_buckets
            .with_label_values(&["total"])
            .set(report.buckets as f64);
        self.resampled_buckets
            .with_label_values(&["empty"])
            .set(report.empty_buckets as f64);
    }

    pub fn record_labels(&self, report: &LabelReport) {
        let by_outcome = [
            ("kept", report.kept),
            ("dropped_tail", report.dropped_tail),
            ("dropped_missing_target", report.dropped_missing_target),
            ("dropped_missing_feature", report.dropped_missing_feature),
        ];
        for (outcome, count) in by_outcome {
            self.supervised_rows_total
                .with_label_values(&[outcome])
                .inc_by(count as f64);
        }
    }

    pub fn record_pipeline(&self, report: &PipelineReport) {
        self.record_enrichment(&report.enrichment);
        self.record_resample(&report.resample);
        self.record_labels(&report.labels);
    }

    pub fn inc_predictions(&self, outcome: &str) {
        self.predictions_total.with_label_values(&[outcome]).inc();
    }

    pub fn observe_prediction_latency(&self, model: &str, latency: f64) {
        self.prediction_latency_seconds
            .with_label_values(&[model])
            .observe(latency);
    }

    pub fn set_model_loaded(&self, role: &str, loaded: bool) {
        self.model_loaded
            .with_label_values(&[role])
            .set(if loaded { 1.0 } else { 0.0 });
    }

    /// Current value of a labelled counter, for snapshots.
    pub fn counter_value(counter: &CounterVec, label: &str) -> f64 {
        counter.with_label_values(&[label]).get()
    }
}
