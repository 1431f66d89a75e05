//! Train SOC-drop regressors and classifiers from a readings CSV.
//!
//! # Usage
//! ```sh
//! HORIZON_MIN=60 cargo run --bin train -- --input data/telematics.csv
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use socdrop::application::ml::trainer::train_models;
use socdrop::application::pipeline::build_training_set;
use socdrop::config::Config;
use socdrop::infrastructure::model_store::ModelStore;
use socdrop::infrastructure::observability::{PipelineMetrics, log_final_snapshot};
use socdrop::infrastructure::readings_csv::load_readings;
use std::path::PathBuf;
use tracing::info;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the raw readings CSV
    #[arg(long, default_value = "data/telematics.csv")]
    input: PathBuf,

    /// Output directory for models and eval_metrics.json (overrides MODEL_DIR)
    #[arg(long)]
    model_dir: Option<PathBuf>,

    /// Label horizon in buckets (overrides HORIZON_MIN)
    #[arg(long)]
    horizon: Option<usize>,
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let subscriber = tracing_subscriber::FmtSubscriber::builder()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .finish();
    tracing::subscriber::set_global_default(subscriber).ok();

    let args = Args::parse();
    let config = Config::from_env()?;

    let mut pipeline = config.to_pipeline_config()?;
    if let Some(horizon) = args.horizon {
        pipeline = pipeline.with_horizon(horizon);
    }
    let trainer = config.to_trainer_config()?;
    let store = ModelStore::new(
        args.model_dir
            .unwrap_or_else(|| config.training.model_dir.clone()),
    );

    info!(
        "Pipeline: idle threshold {} km/h, bucket {}s, horizon {} buckets",
        pipeline.idle_speed_threshold_kmh,
        pipeline.resample_interval.num_seconds(),
        pipeline.horizon_buckets
    );

    let readings = load_readings(&args.input)
        .with_context(|| format!("Failed to load readings from {:?}", args.input))?;

    let metrics = PipelineMetrics::new()?;
    let (dataset, report) =
        build_training_set(&readings, &pipeline).context("Failed to build training set")?;
    metrics.record_pipeline(&report);

    let trained = train_models(&dataset, &trainer).context("Training failed")?;
    store
        .save_all(&trained)
        .context("Failed to persist models")?;

    let summary = serde_json::to_string_pretty(&trained.report)?;
    info!("Evaluation report:\n{}", summary);
    info!("Models written to {:?}", store.dir());

    log_final_snapshot(&metrics);
    Ok(())
}
