// Validated configuration value objects
pub mod config;

// Domain-specific error types
pub mod errors;

// Model feature contract
pub mod ml;

// Readings, derived rows and trip KPIs
pub mod telematics;
