//! CSV export of the supervised training table.

use crate::domain::telematics::types::SupervisedDataset;
use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;
use tracing::info;

/// One flattened row: metadata, the seven features, then the targets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SupervisedRecord {
    pub telematics_id: String,
    pub timestamp: NaiveDateTime,
    pub speed_mean: f64,
    pub speed_max: f64,
    pub km_travelled: f64,
    pub km_15m: f64,
    pub speed_mean_15m: f64,
    pub soc_mean: f64,
    pub soc_delta_15m: f64,
    pub soc_future: f64,
    pub soc_drop: f64,
    pub will_drop_10pct: u8,
}

pub fn records(dataset: &SupervisedDataset) -> impl Iterator<Item = SupervisedRecord> + '_ {
    dataset.rows().map(|row| SupervisedRecord {
        telematics_id: row.meta.telematics_id,
        timestamp: row.meta.timestamp,
        speed_mean: row.features.speed_mean,
        speed_max: row.features.speed_max,
        km_travelled: row.features.km_travelled,
        km_15m: row.features.km_15m,
        speed_mean_15m: row.features.speed_mean_15m,
        soc_mean: row.features.soc_mean,
        soc_delta_15m: row.features.soc_delta_15m,
        soc_future: row.soc_future,
        soc_drop: row.soc_drop,
        will_drop_10pct: u8::from(row.will_drop_10pct),
    })
}

pub fn write_supervised<W: Write>(dataset: &SupervisedDataset, writer: W) -> Result<()> {
    let mut wtr = csv::WriterBuilder::new().has_headers(true).from_writer(writer);
    for record in records(dataset) {
        wtr.serialize(&record)
            .context("Failed to serialize supervised row")?;
    }
    wtr.flush().context("Failed to flush supervised CSV")?;
    Ok(())
}

pub fn write_supervised_file(dataset: &SupervisedDataset, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).context("Failed to create output directory")?;
    }
    let file = File::create(path).context(format!("Failed to create {:?}", path))?;
    write_supervised(dataset, file)?;
    info!("Wrote {} supervised rows to {:?}", dataset.len(), path);
    Ok(())
}
