//! Enrichment stage: clean raw readings and derive per-step quantities.
//!
//! Missing speed is filled with 0.0, i.e. an absent speed is treated as the
//! vehicle standing still. Such records therefore count as idle downstream
//! (idle hours, moving flag) rather than being excluded.

use crate::domain::config::PipelineConfig;
use crate::domain::telematics::geo::haversine_km;
use crate::domain::telematics::types::{EnrichedReading, Reading};
use chrono::NaiveDateTime;
use rayon::prelude::*;
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

/// Row accounting for one enrichment pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnrichmentReport {
    pub input_rows: usize,
    pub dropped_missing_timestamp: usize,
    pub dropped_missing_vehicle: usize,
    pub vehicles: usize,
    pub output_rows: usize,
}

impl EnrichmentReport {
    pub fn dropped_rows(&self) -> usize {
        self.dropped_missing_timestamp + self.dropped_missing_vehicle
    }
}

/// Valid readings partitioned by vehicle id, each group in input order.
pub type VehicleGroups<'a> = BTreeMap<String, Vec<(NaiveDateTime, &'a Reading)>>;

/// Drop rows without a timestamp or vehicle id and group the rest per vehicle.
pub fn partition_by_vehicle(readings: &[Reading]) -> (VehicleGroups<'_>, EnrichmentReport) {
    let mut report = EnrichmentReport {
        input_rows: readings.len(),
        ..Default::default()
    };
    let mut groups: VehicleGroups<'_> = BTreeMap::new();

    for reading in readings {
        let Some(timestamp) = reading.timestamp else {
            report.dropped_missing_timestamp += 1;
            continue;
        };
        let vehicle = match reading.telematics_id.as_deref().map(str::trim) {
            Some(id) if !id.is_empty() => id,
            _ => {
                report.dropped_missing_vehicle += 1;
                continue;
            }
        };
        groups
            .entry(vehicle.to_string())
            .or_default()
            .push((timestamp, reading));
    }

    report.vehicles = groups.len();
    (groups, report)
}

/// Enrich one vehicle's readings. Sorting is stable so duplicate timestamps
/// keep their input order.
fn enrich_vehicle(
    vehicle: &str,
    mut rows: Vec<(NaiveDateTime, &Reading)>,
    idle_speed_threshold_kmh: f64,
) -> Vec<EnrichedReading> {
    rows.sort_by_key(|(timestamp, _)| *timestamp);

    let mut out = Vec::with_capacity(rows.len());
    let mut prev: Option<(Option<f64>, Option<f64>)> = None;

    for (timestamp, reading) in rows {
        let speed_km_h = reading.speed_km_h.unwrap_or(0.0);
        let (lat_prev, lon_prev) = prev.unwrap_or((None, None));

        let step_km = match (lat_prev, lon_prev, reading.latitude, reading.longitude) {
            (Some(lat1), Some(lon1), Some(lat2), Some(lon2)) => haversine_km(lat1, lon1, lat2, lon2),
            _ => 0.0,
        };

        out.push(EnrichedReading {
            telematics_id: vehicle.to_string(),
            timestamp,
            latitude: reading.latitude,
            longitude: reading.longitude,
            speed_km_h,
            state_of_charge: reading.state_of_charge,
            odometer_reading_kms: reading.odometer_reading_kms,
            lat_prev,
            lon_prev,
            step_km,
            is_moving: speed_km_h > idle_speed_threshold_kmh,
        });

        prev = Some((reading.latitude, reading.longitude));
    }

    out
}

/// Enrich a batch of readings, returning rows sorted by (vehicle id, timestamp)
/// together with drop accounting.
pub fn enrich_with_report(
    readings: &[Reading],
    config: &PipelineConfig,
) -> (Vec<EnrichedReading>, EnrichmentReport) {
    let (groups, mut report) = partition_by_vehicle(readings);
    let threshold = config.idle_speed_threshold_kmh;

    let groups: Vec<_> = groups.into_iter().collect();
    let enriched: Vec<Vec<EnrichedReading>> = groups
        .into_par_iter()
        .map(|(vehicle, rows)| {
            let out = enrich_vehicle(&vehicle, rows, threshold);
            debug!("Enrichment: {} -> {} readings", vehicle, out.len());
            out
        })
        .collect();

    let rows: Vec<EnrichedReading> = enriched.into_iter().flatten().collect();
    report.output_rows = rows.len();

    if report.dropped_rows() > 0 {
        warn!(
            "Enrichment: dropped {} of {} readings ({} without timestamp, {} without vehicle id)",
            report.dropped_rows(),
            report.input_rows,
            report.dropped_missing_timestamp,
            report.dropped_missing_vehicle
        );
    }
    info!(
        "Enrichment: {} readings across {} vehicles",
        report.output_rows, report.vehicles
    );

    (rows, report)
}

/// Enrich a batch of readings. See [`enrich_with_report`].
pub fn enrich(readings: &[Reading], config: &PipelineConfig) -> Vec<EnrichedReading> {
    enrich_with_report(readings, config).0
}
