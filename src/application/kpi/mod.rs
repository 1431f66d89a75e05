// Trip KPI reducer
pub mod summary;

pub use summary::{KPI_MOVING_SPEED_KMH, summarize_vehicles};
