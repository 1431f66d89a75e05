//! Supervised-label builder: aligns each bucket with the SOC `horizon` buckets ahead.

use crate::domain::errors::PipelineError;
use crate::domain::telematics::types::{
    MinuteFeatureRow, RowMeta, SupervisedDataset, SupervisedRow,
};
use rayon::prelude::*;
use std::collections::BTreeMap;
use tracing::{info, warn};

/// A drop of at least this many SOC percentage points is labelled positive.
pub const SOC_DROP_LABEL_THRESHOLD_PCT: f64 = 10.0;

/// Why candidate rows did or did not make it into the training table
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelReport {
    pub candidate_rows: usize,
    /// Within `horizon` buckets of the vehicle's last bucket
    pub dropped_tail: usize,
    /// Current or future SOC mean absent
    pub dropped_missing_target: usize,
    /// One of the seven features absent (warm-up or empty bucket)
    pub dropped_missing_feature: usize,
    pub kept: usize,
}

impl LabelReport {
    fn merge(mut self, other: LabelReport) -> LabelReport {
        self.candidate_rows += other.candidate_rows;
        self.dropped_tail += other.dropped_tail;
        self.dropped_missing_target += other.dropped_missing_target;
        self.dropped_missing_feature += other.dropped_missing_feature;
        self.kept += other.kept;
        self
    }
}

pub fn is_large_drop(soc_drop: f64) -> bool {
    soc_drop >= SOC_DROP_LABEL_THRESHOLD_PCT
}

/// Label one vehicle's bucket series (already in bucket order).
fn label_vehicle(rows: &[&MinuteFeatureRow], horizon: usize) -> (Vec<SupervisedRow>, LabelReport) {
    let mut report = LabelReport {
        candidate_rows: rows.len(),
        ..Default::default()
    };
    let mut out = Vec::new();

    for (i, row) in rows.iter().enumerate() {
        let Some(future) = i.checked_add(horizon).and_then(|j| rows.get(j)) else {
            report.dropped_tail += 1;
            continue;
        };
        let (Some(soc_now), Some(soc_future)) = (row.soc_mean, future.soc_mean) else {
            report.dropped_missing_target += 1;
            continue;
        };
        let Some(features) = row.feature_vector() else {
            report.dropped_missing_feature += 1;
            continue;
        };

        let soc_drop = soc_now - soc_future;
        out.push(SupervisedRow {
            meta: RowMeta {
                telematics_id: row.telematics_id.clone(),
                timestamp: row.timestamp,
            },
            features,
            soc_future,
            soc_drop,
            will_drop_10pct: is_large_drop(soc_drop),
        });
    }

    report.kept = out.len();
    (out, report)
}

/// Build the training table from resampled rows, with per-reason row accounting.
///
/// Fails with [`PipelineError::NoTrainableRows`] when nothing survives the
/// horizon and warm-up filters.
pub fn build_supervised_with_report(
    rows: &[MinuteFeatureRow],
    horizon: usize,
) -> Result<(SupervisedDataset, LabelReport), PipelineError> {
    let mut groups: BTreeMap<&str, Vec<&MinuteFeatureRow>> = BTreeMap::new();
    for row in rows {
        groups.entry(row.telematics_id.as_str()).or_default().push(row);
    }

    let groups: Vec<_> = groups.into_iter().collect();
    let labelled: Vec<(Vec<SupervisedRow>, LabelReport)> = groups
        .into_par_iter()
        .map(|(_, mut series)| {
            series.sort_by_key(|r| r.timestamp);
            label_vehicle(&series, horizon)
        })
        .collect();

    let mut report = LabelReport::default();
    let mut supervised = Vec::new();
    for (vehicle_rows, vehicle_report) in labelled {
        supervised.extend(vehicle_rows);
        report = report.merge(vehicle_report);
    }

    info!(
        "Labels: kept {} of {} rows (horizon {}: {} tail, {} missing SOC, {} missing features)",
        report.kept,
        report.candidate_rows,
        horizon,
        report.dropped_tail,
        report.dropped_missing_target,
        report.dropped_missing_feature
    );

    if supervised.is_empty() {
        return Err(PipelineError::NoTrainableRows {
            horizon,
            candidate_rows: report.candidate_rows,
        });
    }
    if report.kept * 2 < report.candidate_rows {
        warn!(
            "Labels: more than half of the resampled rows were discarded ({} of {})",
            report.candidate_rows - report.kept,
            report.candidate_rows
        );
    }

    Ok((SupervisedDataset::from_rows(supervised), report))
}

/// Build the training table. See [`build_supervised_with_report`].
pub fn build_supervised(
    rows: &[MinuteFeatureRow],
    horizon: usize,
) -> Result<SupervisedDataset, PipelineError> {
    build_supervised_with_report(rows, horizon).map(|(dataset, _)| dataset)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate, NaiveDateTime};

    fn at(minute: i64) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(6, 0, 0)
            .unwrap()
            + Duration::minutes(minute)
    }

    /// A synthetic, fully populated grid with the given SOC series.
    fn series(id: &str, socs: &[f64]) -> Vec<MinuteFeatureRow> {
        socs.iter()
            .enumerate()
            .map(|(i, soc)| MinuteFeatureRow {
                telematics_id: id.to_string(),
                timestamp: at(i as i64),
                speed_mean: Some(20.0),
                speed_max: Some(25.0),
                km_travelled: 0.3,
                soc_mean: Some(*soc),
                odometer_max: Some(500.0 + i as f64),
                km_15m: 0.3 * (i.min(14) + 1) as f64,
                speed_mean_15m: Some(20.0),
                soc_delta_15m: (i >= 15).then(|| soc - socs[i - 15]),
            })
            .collect()
    }

    #[test]
    fn test_row_count_accounts_for_horizon_and_warm_up() {
        for (n, h) in [(100usize, 60usize), (80, 10), (200, 0), (90, 74)] {
            let rows = series("A", &vec![50.0; n]);
            let (dataset, report) = build_supervised_with_report(&rows, h).unwrap();
            assert_eq!(dataset.len(), n.saturating_sub(h + 15), "n={} h={}", n, h);
            assert_eq!(report.kept, dataset.len());
            assert_eq!(report.dropped_tail, h.min(n));
        }
    }

    #[test]
    fn test_future_soc_aligned_with_horizon() {
        let socs: Vec<f64> = (0..120).map(|i| 100.0 - 0.25 * i as f64).collect();
        let rows = series("A", &socs);
        let horizon = 30;

        let dataset = build_supervised(&rows, horizon).unwrap();
        for (k, meta) in dataset.meta.iter().enumerate() {
            let i = (meta.timestamp - at(0)).num_minutes() as usize;
            assert_eq!(dataset.soc_future[k], socs[i + horizon]);
            assert_eq!(dataset.soc_drop[k], socs[i] - socs[i + horizon]);
        }
        assert_eq!(dataset.meta[0].timestamp, at(15));
    }

    #[test]
    fn test_label_threshold_boundary() {
        assert!(is_large_drop(10.0));
        assert!(!is_large_drop(9.999999));
        assert!(!is_large_drop(-25.0));

        // 17 rows, horizon 1: only row 15 has a full lag window and a future
        let mut socs = vec![70.0; 17];
        socs[16] = 60.0;
        let dataset = build_supervised(&series("A", &socs), 1).unwrap();
        assert_eq!(dataset.len(), 1);
        assert_eq!(dataset.soc_drop[0], 10.0);
        assert_eq!(dataset.will_drop_10pct[0], 1);

        socs[16] = 60.000001;
        let dataset = build_supervised(&series("A", &socs), 1).unwrap();
        assert_eq!(dataset.will_drop_10pct[0], 0);
    }

    #[test]
    fn test_missing_soc_rows_excluded() {
        let mut rows = series("A", &vec![80.0; 40]);
        rows[30].soc_mean = None;
        rows[20].speed_mean = None;

        let (dataset, report) = build_supervised_with_report(&rows, 5).unwrap();
        // rows 15..=34 are candidates; row 25 loses its future, row 30 its current SOC
        assert_eq!(report.dropped_missing_target, 2);
        // warm-up rows 0..15 plus the empty-speed row 20
        assert_eq!(report.dropped_missing_feature, 16);
        assert_eq!(dataset.len(), 20 - 3);
        assert!(dataset.meta.iter().all(|m| m.timestamp != at(20)));
    }

    #[test]
    fn test_horizon_longer_than_series_fails_fast() {
        let rows = series("A", &vec![80.0; 30]);
        let err = build_supervised(&rows, 600).unwrap_err();
        assert_eq!(
            err,
            PipelineError::NoTrainableRows {
                horizon: 600,
                candidate_rows: 30
            }
        );
    }

    #[test]
    fn test_maximal_horizon_drops_every_row() {
        let rows = series("A", &vec![80.0; 40]);
        let (err, report) = (
            build_supervised(&rows, usize::MAX).unwrap_err(),
            label_vehicle(&rows.iter().collect::<Vec<_>>(), usize::MAX).1,
        );
        assert_eq!(
            err,
            PipelineError::NoTrainableRows {
                horizon: usize::MAX,
                candidate_rows: 40
            }
        );
        assert_eq!(report.dropped_tail, 40);
        assert_eq!(report.kept, 0);
    }

    #[test]
    fn test_horizon_never_crosses_vehicles() {
        let mut rows = series("A", &vec![90.0; 20]);
        rows.extend(series("B", &vec![10.0; 20]));

        // A has 20 rows: 15 warm-up + horizon 5 leaves none; B likewise
        let err = build_supervised(&rows, 5).unwrap_err();
        assert!(matches!(err, PipelineError::NoTrainableRows { .. }));

        let dataset = build_supervised(&rows, 4).unwrap();
        assert_eq!(dataset.len(), 2);
        assert!(dataset.soc_drop.iter().all(|d| *d == 0.0));
    }
}
