//! CSV reader for raw telematics readings.
//!
//! Cells are parsed leniently: an empty, non-numeric or non-finite numeric
//! cell and an unrecognised timestamp all become `None`. Only structural
//! problems (missing columns, ragged records, I/O) are errors.

use crate::domain::errors::InputError;
use crate::domain::telematics::types::Reading;
use chrono::{DateTime, NaiveDateTime};
use csv::{ReaderBuilder, StringRecord, Trim};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use tracing::info;

pub const REQUIRED_COLUMNS: [&str; 7] = [
    "telematics_id",
    "timestamp",
    "latitude",
    "longitude",
    "speed_km_h",
    "state_of_charge",
    "odometer_reading_kms",
];

const NAIVE_TIMESTAMP_FORMATS: [&str; 3] =
    ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M"];

/// Parse a timestamp cell. RFC 3339 values are converted to UTC and made naive.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.naive_utc());
    }
    NAIVE_TIMESTAMP_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
}

fn parse_number(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

fn parse_id(raw: &str) -> Option<String> {
    let id = raw.trim();
    (!id.is_empty()).then(|| id.to_string())
}

struct ColumnIndex([usize; 7]);

impl ColumnIndex {
    fn from_headers(headers: &StringRecord) -> Result<Self, InputError> {
        let mut index = [0usize; 7];
        for (slot, column) in index.iter_mut().zip(REQUIRED_COLUMNS) {
            *slot = headers
                .iter()
                .position(|h| h.trim() == column)
                .ok_or_else(|| InputError::MissingColumn {
                    column: column.to_string(),
                })?;
        }
        Ok(Self(index))
    }

    fn reading(&self, record: &StringRecord) -> Reading {
        let cell = |i: usize| record.get(self.0[i]).unwrap_or("");
        Reading {
            telematics_id: parse_id(cell(0)),
            timestamp: parse_timestamp(cell(1)),
            latitude: parse_number(cell(2)),
            longitude: parse_number(cell(3)),
            speed_km_h: parse_number(cell(4)),
            state_of_charge: parse_number(cell(5)),
            odometer_reading_kms: parse_number(cell(6)),
        }
    }
}

/// Read readings from any CSV source with a header row.
pub fn load_readings_from_reader<R: Read>(source: R) -> Result<Vec<Reading>, InputError> {
    let mut reader = ReaderBuilder::new().trim(Trim::All).from_reader(source);
    let headers = reader.headers().map_err(|e| InputError::Csv {
        record: 0,
        reason: e.to_string(),
    })?;
    let columns = ColumnIndex::from_headers(headers)?;

    let mut readings = Vec::new();
    for (i, result) in reader.records().enumerate() {
        let record = result.map_err(|e| InputError::Csv {
            record: e
                .position()
                .map(|p| p.record())
                .unwrap_or(i as u64 + 1),
            reason: e.to_string(),
        })?;
        readings.push(columns.reading(&record));
    }
    Ok(readings)
}

pub fn load_readings(path: &Path) -> Result<Vec<Reading>, InputError> {
    let file = File::open(path).map_err(|e| InputError::Io {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;
    let readings = load_readings_from_reader(BufReader::new(file))?;
    info!("Loaded {} readings from {:?}", readings.len(), path);
    Ok(readings)
}
