// Great-circle distance
pub mod geo;

// Per-vehicle trip summary
pub mod kpi;

// Readings and derived pipeline rows
pub mod types;

pub use kpi::VehicleKpi;
pub use types::{
    EnrichedReading, MinuteFeatureRow, Reading, RowMeta, SupervisedDataset, SupervisedRow,
};
