//! Filesystem persistence for fitted models and the evaluation report.
//!
//! Layout under the model directory:
//! `soc_drop_regressor_{family}.json`, `soc_drop_classifier_{family}.json`
//! and `eval_metrics.json`.

use crate::application::ml::estimator::{FittedModel, ModelFamily, Task};
use crate::application::ml::evaluation::EvalReport;
use crate::application::ml::predictor::{SocDropModel, SocDropPredictor};
use crate::application::ml::trainer::TrainedModels;
use crate::domain::errors::ModelError;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info, warn};

pub const EVAL_REPORT_FILE: &str = "eval_metrics.json";

pub struct ModelStore {
    dir: PathBuf,
}

impl ModelStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn model_path(&self, task: Task, family: ModelFamily) -> PathBuf {
        self.dir
            .join(format!("soc_drop_{}_{}.json", task.slug(), family.slug()))
    }

    pub fn report_path(&self) -> PathBuf {
        self.dir.join(EVAL_REPORT_FILE)
    }

    fn io_error(path: &Path, e: impl std::fmt::Display) -> ModelError {
        ModelError::Io {
            path: path.display().to_string(),
            reason: e.to_string(),
        }
    }

    fn serde_error(path: &Path, e: impl std::fmt::Display) -> ModelError {
        ModelError::Serde {
            path: path.display().to_string(),
            reason: e.to_string(),
        }
    }

    /// Atomic write: serialize to a temp file then rename over the target.
    fn write_json<T: Serialize>(&self, path: &Path, value: &T, pretty: bool) -> Result<(), ModelError> {
        fs::create_dir_all(&self.dir).map_err(|e| Self::io_error(&self.dir, e))?;

        let temp_path = path.with_extension("json.tmp");
        let file = File::create(&temp_path).map_err(|e| Self::io_error(&temp_path, e))?;
        let mut writer = BufWriter::new(file);
        let written = if pretty {
            serde_json::to_writer_pretty(&mut writer, value)
        } else {
            serde_json::to_writer(&mut writer, value)
        };
        written.map_err(|e| Self::serde_error(&temp_path, e))?;
        writer.flush().map_err(|e| Self::io_error(&temp_path, e))?;
        drop(writer);

        fs::rename(&temp_path, path).map_err(|e| Self::io_error(path, e))?;
        Ok(())
    }

    fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, ModelError> {
        let file = File::open(path).map_err(|e| Self::io_error(path, e))?;
        serde_json::from_reader(BufReader::new(file)).map_err(|e| Self::serde_error(path, e))
    }

    pub fn save_model(&self, model: &FittedModel) -> Result<PathBuf, ModelError> {
        let path = self.model_path(model.task, model.family);
        self.write_json(&path, model, false)?;
        info!("Saved {} to {:?}", model.name(), path);
        Ok(path)
    }

    pub fn load_model(&self, task: Task, family: ModelFamily) -> Result<FittedModel, ModelError> {
        let path = self.model_path(task, family);
        let model: FittedModel = Self::read_json(&path)?;
        if model.task != task || model.family != family {
            return Err(Self::serde_error(
                &path,
                format!("file holds {} instead of {} {}", model.name(), family, task.slug()),
            ));
        }
        if !model.matches_registry() {
            return Err(Self::serde_error(
                &path,
                format!("feature order {:?} does not match this build", model.feature_names),
            ));
        }
        Ok(model)
    }

    pub fn save_report(&self, report: &EvalReport) -> Result<PathBuf, ModelError> {
        let path = self.report_path();
        self.write_json(&path, report, true)?;
        info!("Saved evaluation report to {:?}", path);
        Ok(path)
    }

    pub fn load_report(&self) -> Result<EvalReport, ModelError> {
        Self::read_json(&self.report_path())
    }

    /// Persist every fitted model plus the evaluation report.
    pub fn save_all(&self, trained: &TrainedModels) -> Result<(), ModelError> {
        for model in trained.regressors.iter().chain(&trained.classifiers) {
            self.save_model(model)?;
        }
        self.save_report(&trained.report)?;
        Ok(())
    }

    fn load_optional(&self, task: Task, family: ModelFamily) -> Option<Arc<dyn SocDropModel>> {
        let path = self.model_path(task, family);
        if !path.exists() {
            warn!(
                "Model file not found at {:?}. {} predictions will be null.",
                path,
                task.slug()
            );
            return None;
        }
        match self.load_model(task, family) {
            Ok(model) => {
                info!("Successfully loaded {} from {:?}", model.name(), path);
                Some(Arc::new(model))
            }
            Err(e) => {
                error!("Failed to load model: {}", e);
                None
            }
        }
    }

    /// Serving pair for one family. Missing or unreadable files leave that side empty.
    pub fn load_predictor(&self, family: ModelFamily) -> SocDropPredictor {
        SocDropPredictor::new(
            self.load_optional(Task::Regression, family),
            self.load_optional(Task::Classification, family),
        )
    }
}
