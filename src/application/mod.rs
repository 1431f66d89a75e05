// Per-vehicle trip KPIs
pub mod kpi;

// Model fitting, evaluation and inference
pub mod ml;

// Enrichment, resampling and supervised labels
pub mod pipeline;
