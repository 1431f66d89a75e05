use thiserror::Error;

/// Errors raised by the feature/label pipeline
#[derive(Debug, Error, PartialEq)]
pub enum PipelineError {
    #[error(
        "No trainable rows: horizon of {horizon} buckets left none of {candidate_rows} resampled rows usable"
    )]
    NoTrainableRows { horizon: usize, candidate_rows: usize },
}

/// Errors raised while fitting or evaluating models
#[derive(Debug, Error, PartialEq)]
pub enum TrainingError {
    #[error("Not enough rows for the {split} split: {rows}")]
    InsufficientRows { split: String, rows: usize },

    #[error("Invalid train fraction {value}. Must be strictly between 0.0 and 1.0")]
    InvalidTrainFraction { value: f64 },

    #[error("Matrix construction failed: {reason}")]
    Matrix { reason: String },

    #[error("Fitting {model} failed: {reason}")]
    Fit { model: String, reason: String },

    #[error("Prediction with {model} failed: {reason}")]
    Predict { model: String, reason: String },
}

/// Errors related to persisted models
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("Model I/O failed for {path}: {reason}")]
    Io { path: String, reason: String },

    #[error("Model (de)serialization failed for {path}: {reason}")]
    Serde { path: String, reason: String },

    #[error("Prediction failed: {reason}")]
    Predict { reason: String },

    #[error("Invalid features: {reason}")]
    InvalidFeatures { reason: String },
}

/// Errors related to reading raw telematics input
#[derive(Debug, Error)]
pub enum InputError {
    #[error("Cannot open readings at {path}: {reason}")]
    Io { path: String, reason: String },

    #[error("Malformed CSV record {record}: {reason}")]
    Csv { record: u64, reason: String },

    #[error("Missing required column '{column}'")]
    MissingColumn { column: String },
}
