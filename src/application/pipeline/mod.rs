//! Feature and label pipeline: readings → enriched → resampled → supervised.
//!
//! Every stage partitions by vehicle and processes groups independently.

pub mod enrichment;
pub mod resampling;
pub mod rolling;
pub mod supervised;

pub use enrichment::{EnrichmentReport, enrich, enrich_with_report};
pub use resampling::{ResampleReport, resample, resample_with_report};
pub use supervised::{
    LabelReport, SOC_DROP_LABEL_THRESHOLD_PCT, build_supervised, build_supervised_with_report,
};

use crate::domain::config::PipelineConfig;
use crate::domain::errors::PipelineError;
use crate::domain::telematics::types::{Reading, SupervisedDataset};

/// Row accounting across all three stages
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PipelineReport {
    pub enrichment: EnrichmentReport,
    pub resample: ResampleReport,
    pub labels: LabelReport,
}

/// Run enrichment, resampling and label construction end to end.
pub fn build_training_set(
    readings: &[Reading],
    config: &PipelineConfig,
) -> Result<(SupervisedDataset, PipelineReport), PipelineError> {
    let (enriched, enrichment) = enrich_with_report(readings, config);
    let (minutes, resample) = resample_with_report(&enriched, config);
    let (dataset, labels) = build_supervised_with_report(&minutes, config.horizon_buckets)?;

    Ok((
        dataset,
        PipelineReport {
            enrichment,
            resample,
            labels,
        },
    ))
}
