//! Per-vehicle trip KPIs computed from enriched readings.

use crate::domain::telematics::kpi::VehicleKpi;
use crate::domain::telematics::types::EnrichedReading;
use statrs::statistics::Statistics;
use std::collections::BTreeMap;
use tracing::info;

/// Moving threshold for KPI reporting, in km/h.
///
/// Intentionally separate from the configurable enrichment idle threshold:
/// both default to 2.0 but tuning the pipeline must not change exported KPIs.
pub const KPI_MOVING_SPEED_KMH: f64 = 2.0;

/// Records per hour under the assumed one-second native sampling rate.
/// Moving/idle hours are record counts divided by this, not measured time,
/// so they are wrong for feeds sampled at any other rate.
pub const ASSUMED_RECORDS_PER_HOUR: f64 = 3600.0;

/// Round to `decimals` places, ties to even (`round(0.125, 2) == 0.12`).
fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round_ties_even() / factor
}

fn summarize_vehicle(vehicle: &str, readings: &[&EnrichedReading]) -> VehicleKpi {
    let total_km: f64 = readings.iter().map(|r| r.step_km).sum();

    let moving_speeds: Vec<f64> = readings
        .iter()
        .map(|r| r.speed_km_h)
        .filter(|speed| *speed > KPI_MOVING_SPEED_KMH)
        .collect();
    let moving_hours = moving_speeds.len() as f64 / ASSUMED_RECORDS_PER_HOUR;
    let idle_hours = readings.len() as f64 / ASSUMED_RECORDS_PER_HOUR - moving_hours;
    let avg_speed_when_moving = if moving_speeds.is_empty() {
        0.0
    } else {
        moving_speeds.iter().mean()
    };

    let mut socs = readings.iter().filter_map(|r| r.state_of_charge);
    let soc_start = socs.next();
    let soc_end = socs.last().or(soc_start);

    VehicleKpi {
        telematics_id: vehicle.to_string(),
        total_km_haversine: round_to(total_km, 2),
        moving_hours: round_to(moving_hours, 2),
        idle_hours: round_to(idle_hours, 2),
        avg_speed_when_moving_km_h: round_to(avg_speed_when_moving, 2),
        soc_start_pct: soc_start.map(|s| round_to(s, 1)),
        soc_end_pct: soc_end.map(|s| round_to(s, 1)),
        charging_sessions_est: 0,
    }
}

/// One KPI record per vehicle, ordered by vehicle id.
pub fn summarize_vehicles(enriched: &[EnrichedReading]) -> Vec<VehicleKpi> {
    let mut groups: BTreeMap<&str, Vec<&EnrichedReading>> = BTreeMap::new();
    for reading in enriched {
        groups
            .entry(reading.telematics_id.as_str())
            .or_default()
            .push(reading);
    }

    let summaries: Vec<VehicleKpi> = groups
        .into_iter()
        .map(|(vehicle, mut readings)| {
            readings.sort_by_key(|r| r.timestamp);
            summarize_vehicle(vehicle, &readings)
        })
        .collect();

    info!("KPI: summarized {} vehicles", summaries.len());
    summaries
}
