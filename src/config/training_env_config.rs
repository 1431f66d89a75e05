//! Training configuration parsing from environment variables.

use super::parse_env;
use crate::application::ml::estimator::EstimatorParams;
use crate::application::ml::trainer::DEFAULT_TRAIN_FRACTION;
use anyhow::Result;
use std::env;
use std::path::PathBuf;

/// Training environment configuration
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingEnvConfig {
    pub model_dir: PathBuf,
    pub train_fraction: f64,

    // Estimators
    pub rf_n_trees: usize,
    pub rf_max_depth: u16,
    pub tree_max_depth: u16,
    pub min_samples_split: usize,
}

impl Default for TrainingEnvConfig {
    fn default() -> Self {
        let params = EstimatorParams::default();
        Self {
            model_dir: PathBuf::from("models"),
            train_fraction: DEFAULT_TRAIN_FRACTION,
            rf_n_trees: params.n_trees,
            rf_max_depth: params.forest_max_depth,
            tree_max_depth: params.tree_max_depth,
            min_samples_split: params.min_samples_split,
        }
    }
}

impl TrainingEnvConfig {
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();
        Ok(Self {
            model_dir: env::var("MODEL_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.model_dir),
            train_fraction: parse_env("TRAIN_FRACTION", defaults.train_fraction)?,
            rf_n_trees: parse_env("RF_N_TREES", defaults.rf_n_trees)?,
            rf_max_depth: parse_env("RF_MAX_DEPTH", defaults.rf_max_depth)?,
            tree_max_depth: parse_env("TREE_MAX_DEPTH", defaults.tree_max_depth)?,
            min_samples_split: parse_env("MIN_SAMPLES_SPLIT", defaults.min_samples_split)?,
        })
    }

    pub fn estimator_params(&self) -> EstimatorParams {
        EstimatorParams {
            n_trees: self.rf_n_trees,
            forest_max_depth: self.rf_max_depth,
            tree_max_depth: self.tree_max_depth,
            min_samples_split: self.min_samples_split,
        }
    }
}
