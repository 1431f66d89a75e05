use serde::{Deserialize, Serialize};

/// Trip summary exported once per vehicle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VehicleKpi {
    pub telematics_id: String,
    pub total_km_haversine: f64,
    pub moving_hours: f64,
    pub idle_hours: f64,
    pub avg_speed_when_moving_km_h: f64,
    #[serde(rename = "soc_start_%")]
    pub soc_start_pct: Option<f64>,
    #[serde(rename = "soc_end_%")]
    pub soc_end_pct: Option<f64>,
    /// Charging sessions are not detected yet, so this is always 0.
    #[serde(default)]
    pub charging_sessions_est: u32,
}
