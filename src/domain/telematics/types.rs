use crate::domain::ml::feature_registry::FeatureVector;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// One raw telematics row as it arrives from the fleet logs.
///
/// Every field may be absent: an unparseable timestamp is carried as `None`
/// and the row is discarded by enrichment.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    pub telematics_id: Option<String>,
    pub timestamp: Option<NaiveDateTime>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub speed_km_h: Option<f64>,
    pub state_of_charge: Option<f64>,
    pub odometer_reading_kms: Option<f64>,
}

/// A cleaned reading with per-step derived fields.
///
/// `speed_km_h` is already filled (absent speed counts as stationary).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnrichedReading {
    pub telematics_id: String,
    pub timestamp: NaiveDateTime,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub speed_km_h: f64,
    pub state_of_charge: Option<f64>,
    pub odometer_reading_kms: Option<f64>,
    /// Previous fix of the same vehicle, `None` on its first record
    pub lat_prev: Option<f64>,
    pub lon_prev: Option<f64>,
    /// Great-circle distance from the previous fix, 0 when either fix is incomplete
    pub step_km: f64,
    pub is_moving: bool,
}

/// Aggregates for one (vehicle, bucket) cell of the resampled grid.
///
/// Null rules: means and maxima are `None` for buckets with no source values;
/// sums (`km_travelled`, `km_15m`) are 0 over empty input.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MinuteFeatureRow {
    pub telematics_id: String,
    /// Left edge of the bucket
    pub timestamp: NaiveDateTime,
    pub speed_mean: Option<f64>,
    pub speed_max: Option<f64>,
    pub km_travelled: f64,
    pub soc_mean: Option<f64>,
    pub odometer_max: Option<f64>,
    pub km_15m: f64,
    pub speed_mean_15m: Option<f64>,
    pub soc_delta_15m: Option<f64>,
}

impl MinuteFeatureRow {
    /// The serving feature vector, or `None` if any of the seven features is missing.
    pub fn feature_vector(&self) -> Option<FeatureVector> {
        Some(FeatureVector {
            speed_mean: self.speed_mean?,
            speed_max: self.speed_max?,
            km_travelled: self.km_travelled,
            km_15m: self.km_15m,
            speed_mean_15m: self.speed_mean_15m?,
            soc_mean: self.soc_mean?,
            soc_delta_15m: self.soc_delta_15m?,
        })
    }
}

/// Identifies which vehicle bucket a supervised row came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RowMeta {
    pub telematics_id: String,
    pub timestamp: NaiveDateTime,
}

/// A fully labelled training row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SupervisedRow {
    pub meta: RowMeta,
    pub features: FeatureVector,
    pub soc_future: f64,
    pub soc_drop: f64,
    pub will_drop_10pct: bool,
}

/// Row-aligned training table: every vector has the same length.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SupervisedDataset {
    pub features: Vec<FeatureVector>,
    pub soc_future: Vec<f64>,
    /// Regression target
    pub soc_drop: Vec<f64>,
    /// Classification target (0/1)
    pub will_drop_10pct: Vec<u8>,
    pub meta: Vec<RowMeta>,
}

impl SupervisedDataset {
    pub fn from_rows(rows: Vec<SupervisedRow>) -> Self {
        let mut dataset = Self {
            features: Vec::with_capacity(rows.len()),
            soc_future: Vec::with_capacity(rows.len()),
            soc_drop: Vec::with_capacity(rows.len()),
            will_drop_10pct: Vec::with_capacity(rows.len()),
            meta: Vec::with_capacity(rows.len()),
        };
        for row in rows {
            dataset.features.push(row.features);
            dataset.soc_future.push(row.soc_future);
            dataset.soc_drop.push(row.soc_drop);
            dataset.will_drop_10pct.push(u8::from(row.will_drop_10pct));
            dataset.meta.push(row.meta);
        }
        dataset
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Feature matrix in canonical column order.
    pub fn feature_matrix(&self) -> Vec<Vec<f64>> {
        self.features.iter().map(|f| f.to_vec()).collect()
    }

    /// Label as f64 indicator, for estimators fitted on 0/1 targets.
    pub fn label_indicator(&self) -> Vec<f64> {
        self.will_drop_10pct.iter().map(|&l| f64::from(l)).collect()
    }

    /// Iterate rows back out (used by CSV export).
    pub fn rows(&self) -> impl Iterator<Item = SupervisedRow> + '_ {
        (0..self.len()).map(move |i| SupervisedRow {
            meta: self.meta[i].clone(),
            features: self.features[i],
            soc_future: self.soc_future[i],
            soc_drop: self.soc_drop[i],
            will_drop_10pct: self.will_drop_10pct[i] == 1,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn ts(minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(8, minute, 0)
            .unwrap()
    }

    fn full_row() -> MinuteFeatureRow {
        MinuteFeatureRow {
            telematics_id: "BUS-1".to_string(),
            timestamp: ts(0),
            speed_mean: Some(20.0),
            speed_max: Some(30.0),
            km_travelled: 0.3,
            soc_mean: Some(80.0),
            odometer_max: Some(1200.0),
            km_15m: 4.0,
            speed_mean_15m: Some(18.0),
            soc_delta_15m: Some(-1.5),
        }
    }

    #[test]
    fn test_feature_vector_complete_row() {
        let fv = full_row().feature_vector().expect("all features present");
        assert_eq!(fv.speed_mean, 20.0);
        assert_eq!(fv.soc_delta_15m, -1.5);
    }

    #[test]
    fn test_feature_vector_missing_feature() {
        let row = MinuteFeatureRow {
            soc_delta_15m: None,
            ..full_row()
        };
        assert!(row.feature_vector().is_none());
    }

    #[test]
    fn test_feature_vector_ignores_odometer() {
        let row = MinuteFeatureRow {
            odometer_max: None,
            ..full_row()
        };
        assert!(row.feature_vector().is_some());
    }

    #[test]
    fn test_dataset_is_row_aligned() {
        let fv = full_row().feature_vector().unwrap();
        let rows = vec![
            SupervisedRow {
                meta: RowMeta {
                    telematics_id: "BUS-1".to_string(),
                    timestamp: ts(0),
                },
                features: fv,
                soc_future: 60.0,
                soc_drop: 20.0,
                will_drop_10pct: true,
            },
            SupervisedRow {
                meta: RowMeta {
                    telematics_id: "BUS-1".to_string(),
                    timestamp: ts(1),
                },
                features: fv,
                soc_future: 79.0,
                soc_drop: 1.0,
                will_drop_10pct: false,
            },
        ];

        let dataset = SupervisedDataset::from_rows(rows.clone());
        assert_eq!(dataset.len(), 2);
        assert_eq!(dataset.soc_drop.len(), 2);
        assert_eq!(dataset.will_drop_10pct, vec![1, 0]);
        assert_eq!(dataset.label_indicator(), vec![1.0, 0.0]);
        assert_eq!(dataset.feature_matrix()[0].len(), 7);

        let back: Vec<SupervisedRow> = dataset.rows().collect();
        assert_eq!(back, rows);
    }
}
