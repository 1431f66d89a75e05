//! Resampling stage: per-vehicle fixed-width buckets plus rolling features.
//!
//! Buckets are left-closed `[start, start + width)` and anchored at midnight
//! of the vehicle's first reading, so one-minute buckets line up with wall-clock
//! minutes. The grid is contiguous from the first to the last occupied bucket;
//! empty buckets keep `None` means and a zero distance sum.

use super::rolling::{LagDiff, ROLLING_WINDOW_BUCKETS, RollingMean, RollingSum};
use crate::domain::config::PipelineConfig;
use crate::domain::telematics::types::{EnrichedReading, MinuteFeatureRow};
use chrono::{Duration, NaiveDateTime, NaiveTime};
use rayon::prelude::*;
use std::collections::BTreeMap;
use tracing::{debug, info};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResampleReport {
    pub vehicles: usize,
    pub buckets: usize,
    pub empty_buckets: usize,
}

#[derive(Debug, Clone, Default)]
struct BucketAccumulator {
    rows: usize,
    speed_sum: f64,
    speed_max: Option<f64>,
    km_sum: f64,
    soc_sum: f64,
    soc_count: usize,
    odometer_max: Option<f64>,
}

impl BucketAccumulator {
    fn add(&mut self, reading: &EnrichedReading) {
        self.rows += 1;
        self.speed_sum += reading.speed_km_h;
        self.speed_max = Some(
            self.speed_max
                .map_or(reading.speed_km_h, |m| m.max(reading.speed_km_h)),
        );
        self.km_sum += reading.step_km;
        if let Some(soc) = reading.state_of_charge {
            self.soc_sum += soc;
            self.soc_count += 1;
        }
        if let Some(odo) = reading.odometer_reading_kms {
            self.odometer_max = Some(self.odometer_max.map_or(odo, |m| m.max(odo)));
        }
    }

    fn speed_mean(&self) -> Option<f64> {
        (self.rows > 0).then(|| self.speed_sum / self.rows as f64)
    }

    fn soc_mean(&self) -> Option<f64> {
        (self.soc_count > 0).then(|| self.soc_sum / self.soc_count as f64)
    }
}

/// Bucket index of `timestamp` relative to `origin`.
fn bucket_index(timestamp: NaiveDateTime, origin: NaiveDateTime, width_ms: i64) -> i64 {
    (timestamp - origin).num_milliseconds().div_euclid(width_ms)
}

/// Resample one vehicle. `readings` may be in any order.
fn resample_vehicle(
    vehicle: &str,
    readings: &[&EnrichedReading],
    interval: Duration,
) -> Vec<MinuteFeatureRow> {
    let Some(first) = readings.iter().map(|r| r.timestamp).min() else {
        return Vec::new();
    };
    let origin = first.date().and_time(NaiveTime::MIN);
    let width_ms = interval.num_milliseconds().max(1);

    let indices: Vec<i64> = readings
        .iter()
        .map(|r| bucket_index(r.timestamp, origin, width_ms))
        .collect();
    let first_idx = indices.iter().copied().min().unwrap_or(0);
    let last_idx = indices.iter().copied().max().unwrap_or(0);
    let n_buckets = (last_idx - first_idx + 1) as usize;

    let mut buckets = vec![BucketAccumulator::default(); n_buckets];
    for (reading, idx) in readings.iter().zip(indices) {
        buckets[(idx - first_idx) as usize].add(reading);
    }

    let mut km_15m = RollingSum::new(ROLLING_WINDOW_BUCKETS);
    let mut speed_mean_15m = RollingMean::new(ROLLING_WINDOW_BUCKETS);
    let mut soc_delta_15m = LagDiff::new(ROLLING_WINDOW_BUCKETS);

    buckets
        .iter()
        .enumerate()
        .map(|(offset, bucket)| {
            let speed_mean = bucket.speed_mean();
            let soc_mean = bucket.soc_mean();
            MinuteFeatureRow {
                telematics_id: vehicle.to_string(),
                timestamp: origin
                    + Duration::milliseconds(width_ms * (first_idx + offset as i64)),
                speed_mean,
                speed_max: bucket.speed_max,
                km_travelled: bucket.km_sum,
                soc_mean,
                odometer_max: bucket.odometer_max,
                km_15m: km_15m.push(bucket.km_sum),
                speed_mean_15m: speed_mean_15m.push(speed_mean),
                soc_delta_15m: soc_delta_15m.push(soc_mean),
            }
        })
        .collect()
}

/// Resample enriched readings into per-vehicle bucket rows, sorted by
/// (vehicle id, bucket start).
pub fn resample_with_report(
    enriched: &[EnrichedReading],
    config: &PipelineConfig,
) -> (Vec<MinuteFeatureRow>, ResampleReport) {
    let mut groups: BTreeMap<&str, Vec<&EnrichedReading>> = BTreeMap::new();
    for reading in enriched {
        groups
            .entry(reading.telematics_id.as_str())
            .or_default()
            .push(reading);
    }

    let interval = config.resample_interval;
    let groups: Vec<_> = groups.into_iter().collect();
    let per_vehicle: Vec<Vec<MinuteFeatureRow>> = groups
        .into_par_iter()
        .map(|(vehicle, readings)| {
            let rows = resample_vehicle(vehicle, &readings, interval);
            debug!(
                "Resample: {} -> {} buckets from {} readings",
                vehicle,
                rows.len(),
                readings.len()
            );
            rows
        })
        .collect();

    let report = ResampleReport {
        vehicles: per_vehicle.len(),
        buckets: per_vehicle.iter().map(Vec::len).sum(),
        empty_buckets: per_vehicle
            .iter()
            .flatten()
            .filter(|r| r.speed_mean.is_none())
            .count(),
    };
    info!(
        "Resample: {} buckets ({} empty) across {} vehicles at {}s width",
        report.buckets,
        report.empty_buckets,
        report.vehicles,
        interval.num_seconds()
    );

    (per_vehicle.into_iter().flatten().collect(), report)
}

/// Resample enriched readings. See [`resample_with_report`].
pub fn resample(enriched: &[EnrichedReading], config: &PipelineConfig) -> Vec<MinuteFeatureRow> {
    resample_with_report(enriched, config).0
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(minute: i64, second: i64) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(8, 0, 0)
            .unwrap()
            + Duration::minutes(minute)
            + Duration::seconds(second)
    }

    fn enriched(id: &str, t: NaiveDateTime, speed: f64, km: f64, soc: Option<f64>) -> EnrichedReading {
        EnrichedReading {
            telematics_id: id.to_string(),
            timestamp: t,
            latitude: None,
            longitude: None,
            speed_km_h: speed,
            state_of_charge: soc,
            odometer_reading_kms: Some(100.0 + km),
            lat_prev: None,
            lon_prev: None,
            step_km: km,
            is_moving: speed > 2.0,
        }
    }

    #[test]
    fn test_bucket_aggregates() {
        let readings = vec![
            enriched("A", at(0, 5), 10.0, 0.1, Some(80.0)),
            enriched("A", at(0, 35), 20.0, 0.2, Some(79.0)),
            enriched("A", at(1, 0), 30.0, 0.3, None),
        ];

        let rows = resample(&readings, &PipelineConfig::default());
        assert_eq!(rows.len(), 2);

        assert_eq!(rows[0].timestamp, at(0, 0));
        assert_eq!(rows[0].speed_mean, Some(15.0));
        assert_eq!(rows[0].speed_max, Some(20.0));
        assert!((rows[0].km_travelled - 0.3).abs() < 1e-12);
        assert_eq!(rows[0].soc_mean, Some(79.5));
        assert!((rows[0].odometer_max.unwrap() - 100.2).abs() < 1e-9);

        // Bucket with readings but no SOC
        assert_eq!(rows[1].timestamp, at(1, 0));
        assert_eq!(rows[1].soc_mean, None);
        assert_eq!(rows[1].speed_mean, Some(30.0));
    }

    #[test]
    fn test_gap_buckets_are_null_with_zero_distance() {
        let readings = vec![
            enriched("A", at(0, 0), 10.0, 0.5, Some(80.0)),
            enriched("A", at(3, 0), 10.0, 0.5, Some(79.0)),
        ];

        let rows = resample(&readings, &PipelineConfig::default());
        assert_eq!(rows.len(), 4);
        for gap in &rows[1..3] {
            assert_eq!(gap.speed_mean, None);
            assert_eq!(gap.speed_max, None);
            assert_eq!(gap.soc_mean, None);
            assert_eq!(gap.odometer_max, None);
            assert_eq!(gap.km_travelled, 0.0);
        }
        // Rolling features carry through the gap
        assert_eq!(rows[2].km_15m, 0.5);
        assert_eq!(rows[2].speed_mean_15m, Some(10.0));
        assert_eq!(rows[3].km_15m, 1.0);
    }

    #[test]
    fn test_rolling_features_per_vehicle() {
        let readings: Vec<EnrichedReading> = (0..20)
            .map(|m| enriched("A", at(m, 0), m as f64, 0.1 * m as f64, Some(100.0 - m as f64)))
            .collect();

        let rows = resample(&readings, &PipelineConfig::default());
        assert_eq!(rows.len(), 20);

        for (i, row) in rows.iter().enumerate() {
            let lo = i.saturating_sub(14);
            let expected_km: f64 = (lo..=i).map(|m| 0.1 * m as f64).sum();
            assert!((row.km_15m - expected_km).abs() < 1e-9, "km_15m at {}", i);

            let expected_speed = (lo..=i).map(|m| m as f64).sum::<f64>() / (i - lo + 1) as f64;
            assert!((row.speed_mean_15m.unwrap() - expected_speed).abs() < 1e-9);

            if i < 15 {
                assert_eq!(row.soc_delta_15m, None, "warm-up at {}", i);
            } else {
                assert_eq!(row.soc_delta_15m, Some(-15.0));
            }
        }
    }

    #[test]
    fn test_vehicles_do_not_share_windows() {
        let mut readings = vec![enriched("B", at(0, 0), 50.0, 5.0, Some(50.0))];
        readings.push(enriched("A", at(0, 0), 10.0, 1.0, Some(90.0)));
        readings.push(enriched("A", at(1, 0), 10.0, 1.0, Some(90.0)));

        let rows = resample(&readings, &PipelineConfig::default());
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].telematics_id, "A");
        assert_eq!(rows[1].km_15m, 2.0);
        assert_eq!(rows[2].telematics_id, "B");
        assert_eq!(rows[2].km_15m, 5.0);
        assert_eq!(rows[2].speed_mean_15m, Some(50.0));
    }

    #[test]
    fn test_output_invariant_under_input_order() {
        let mut readings: Vec<EnrichedReading> = (0..30)
            .flat_map(|m| {
                vec![
                    enriched("A", at(m, 10), 5.0 + m as f64, 0.01, Some(90.0)),
                    enriched("B", at(m * 2, 20), 7.0, 0.02, Some(60.0 - m as f64)),
                ]
            })
            .collect();

        let forward = resample(&readings, &PipelineConfig::default());
        readings.reverse();
        let backward = resample(&readings, &PipelineConfig::default());

        assert_eq!(forward, backward);
        let keys: Vec<_> = forward
            .iter()
            .map(|r| (r.telematics_id.clone(), r.timestamp))
            .collect();
        let mut sorted = keys.clone();
        sorted.sort();
        assert_eq!(keys, sorted);
    }

    #[test]
    fn test_wider_interval() {
        let config = PipelineConfig::new(2.0, Duration::minutes(5), 60).unwrap();
        let readings = vec![
            enriched("A", at(1, 0), 10.0, 0.1, Some(80.0)),
            enriched("A", at(4, 59), 20.0, 0.1, Some(80.0)),
            enriched("A", at(5, 0), 30.0, 0.1, Some(80.0)),
        ];
        let rows = resample(&readings, &config);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].timestamp, at(0, 0));
        assert_eq!(rows[0].speed_mean, Some(15.0));
        assert_eq!(rows[1].timestamp, at(5, 0));
    }
}
