use chrono::{Duration, NaiveDate, NaiveDateTime};
use socdrop::application::pipeline::{
    build_training_set, enrich, enrich_with_report, resample, resample_with_report,
};
use socdrop::domain::config::PipelineConfig;
use socdrop::domain::errors::PipelineError;
use socdrop::domain::telematics::geo::haversine_km;
use socdrop::domain::telematics::types::Reading;
use socdrop::infrastructure::readings_csv::load_readings_from_reader;

fn t0() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 5, 6)
        .unwrap()
        .and_hms_opt(7, 0, 0)
        .unwrap()
}

fn reading(id: &str, seconds: i64, speed: f64, soc: f64, lat: f64, lon: f64) -> Reading {
    Reading {
        telematics_id: Some(id.to_string()),
        timestamp: Some(t0() + Duration::seconds(seconds)),
        latitude: Some(lat),
        longitude: Some(lon),
        speed_km_h: Some(speed),
        state_of_charge: Some(soc),
        odometer_reading_kms: Some(1000.0 + seconds as f64 / 100.0),
    }
}

/// Vehicle A: one reading per minute for `minutes` buckets, SOC 80 then 60 in the last.
/// Vehicle B: same cadence, SOC constant at 50.
fn fleet_over(minutes: i64) -> Vec<Reading> {
    let mut readings = Vec::new();
    for minute in 0..minutes {
        let soc_a = if minute == minutes - 1 { 60.0 } else { 80.0 };
        readings.push(reading(
            "A",
            minute * 60,
            30.0,
            soc_a,
            -1.28 + minute as f64 * 0.004,
            36.82,
        ));
        readings.push(reading("B", minute * 60, 0.0, 50.0, -4.04, 39.66));
    }
    readings
}

/// 76 buckets: the smallest span that leaves one labelled row at horizon 60.
fn two_vehicle_fleet() -> Vec<Reading> {
    fleet_over(76)
}

#[test]
fn test_sixty_minute_horizon_labels() {
    let config = PipelineConfig::default();
    let (dataset, report) = build_training_set(&two_vehicle_fleet(), &config).unwrap();

    assert_eq!(report.resample.buckets, 2 * 76);
    assert_eq!(dataset.len(), 2);

    let a = dataset
        .meta
        .iter()
        .position(|m| m.telematics_id == "A")
        .unwrap();
    assert_eq!(dataset.meta[a].timestamp, t0() + Duration::minutes(15));
    assert_eq!(dataset.soc_future[a], 60.0);
    assert_eq!(dataset.soc_drop[a], 20.0);
    assert_eq!(dataset.will_drop_10pct[a], 1);

    let b = 1 - a;
    assert_eq!(dataset.meta[b].telematics_id, "B");
    assert_eq!(dataset.soc_drop[b], 0.0);
    assert_eq!(dataset.will_drop_10pct[b], 0);
}

#[test]
fn test_seventy_five_buckets_leave_nothing_to_label() {
    // 75 - 60 - 15 = 0 rows per vehicle
    let err = build_training_set(&fleet_over(75), &PipelineConfig::default()).unwrap_err();
    assert!(matches!(
        err,
        PipelineError::NoTrainableRows {
            horizon: 60,
            candidate_rows: 150
        }
    ));
}

#[test]
fn test_horizon_beyond_data_is_an_error() {
    let config = PipelineConfig::default().with_horizon(500);
    let err = build_training_set(&two_vehicle_fleet(), &config).unwrap_err();
    assert!(matches!(err, PipelineError::NoTrainableRows { horizon: 500, .. }));
}

#[test]
fn test_enrichment_keeps_every_identified_timestamped_row() {
    let mut readings = two_vehicle_fleet();
    readings.push(Reading {
        telematics_id: None,
        ..reading("X", 10, 1.0, 1.0, 0.0, 0.0)
    });
    readings.push(Reading {
        timestamp: None,
        ..reading("A", 10, 1.0, 1.0, 0.0, 0.0)
    });
    readings.push(Reading {
        speed_km_h: None,
        latitude: None,
        ..reading("A", 30, 0.0, 79.0, 0.0, 0.0)
    });

    let (enriched, report) = enrich_with_report(&readings, &PipelineConfig::default());
    assert_eq!(enriched.len(), readings.len() - 2);
    assert_eq!(report.dropped_rows(), 2);
    // missing speed is filled with 0 and treated as idle
    let filled = enriched
        .iter()
        .find(|r| r.telematics_id == "A" && r.timestamp == t0() + Duration::seconds(30))
        .unwrap();
    assert_eq!(filled.speed_km_h, 0.0);
    assert!(!filled.is_moving);
    assert_eq!(filled.step_km, 0.0);
}

#[test]
fn test_step_distance_matches_haversine() {
    let enriched = enrich(&two_vehicle_fleet(), &PipelineConfig::default());
    for row in &enriched {
        match (row.lat_prev, row.lon_prev, row.latitude, row.longitude) {
            (Some(lat0), Some(lon0), Some(lat1), Some(lon1)) => {
                assert!((row.step_km - haversine_km(lat0, lon0, lat1, lon1)).abs() < 1e-6);
            }
            _ => assert_eq!(row.step_km, 0.0),
        }
        assert!(row.step_km >= 0.0);
    }
    // every vehicle's first reading has no predecessor
    let firsts = enriched.iter().filter(|r| r.lat_prev.is_none()).count();
    assert_eq!(firsts, 2);
}

#[test]
fn test_input_order_does_not_change_output() {
    let config = PipelineConfig::default();
    let readings = two_vehicle_fleet();
    let mut shuffled = readings.clone();
    shuffled.reverse();
    shuffled.rotate_left(37);

    let forward = resample(&enrich(&readings, &config), &config);
    let scrambled = resample(&enrich(&shuffled, &config), &config);
    assert_eq!(forward, scrambled);
}

#[test]
fn test_gap_produces_empty_buckets_not_missing_rows() {
    let readings = vec![
        reading("A", 0, 20.0, 90.0, 0.0, 0.0),
        reading("A", 10 * 60 + 5, 20.0, 89.0, 0.0, 0.01),
    ];
    let config = PipelineConfig::default();
    let (rows, report) = resample_with_report(&enrich(&readings, &config), &config);
    assert_eq!(rows.len(), 11);
    assert_eq!(report.empty_buckets, 9);
    assert!(rows[1..10].iter().all(|r| r.soc_mean.is_none() && r.km_travelled == 0.0));
}

#[test]
fn test_csv_to_training_rows() {
    let mut csv = String::from(
        "telematics_id,timestamp,latitude,longitude,speed_km_h,state_of_charge,odometer_reading_kms\n",
    );
    for minute in 0..=20 {
        let soc = if minute == 20 { 65.0 } else { 80.0 };
        let ts = t0() + Duration::minutes(minute);
        csv.push_str(&format!(
            "V7,{},-1.3,36.8,25,{},{}\n",
            ts.format("%Y-%m-%d %H:%M:%S"),
            soc,
            500 + minute
        ));
    }
    csv.push_str("V7,garbage,-1.3,36.8,25,80,500\n");

    let readings = load_readings_from_reader(csv.as_bytes()).unwrap();
    let config = PipelineConfig::default().with_horizon(5);
    let (dataset, report) = build_training_set(&readings, &config).unwrap();

    assert_eq!(report.enrichment.dropped_missing_timestamp, 1);
    // 21 buckets, 15 warm-up, 5 tail => row 15 only
    assert_eq!(dataset.len(), 1);
    assert_eq!(dataset.soc_drop[0], 15.0);
    assert_eq!(dataset.will_drop_10pct[0], 1);
}
