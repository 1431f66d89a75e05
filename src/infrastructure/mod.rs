pub mod model_store;
pub mod observability;
pub mod readings_csv;
pub mod supervised_csv;

pub use model_store::ModelStore;
pub use readings_csv::{load_readings, load_readings_from_reader};
