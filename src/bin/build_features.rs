//! Build the supervised training table and write it as CSV.

use anyhow::{Context, Result};
use clap::Parser;
use socdrop::application::pipeline::build_training_set;
use socdrop::config::Config;
use socdrop::infrastructure::observability::{PipelineMetrics, log_final_snapshot};
use socdrop::infrastructure::readings_csv::load_readings;
use socdrop::infrastructure::supervised_csv::write_supervised_file;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the raw readings CSV
    #[arg(long, default_value = "data/telematics.csv")]
    input: PathBuf,

    /// Path to the output CSV
    #[arg(long, default_value = "data/supervised.csv")]
    output: PathBuf,

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
    let mut pipeline = Config::from_env()?.to_pipeline_config()?;
    if let Some(horizon) = args.horizon {
        pipeline = pipeline.with_horizon(horizon);
    }

    let readings = load_readings(&args.input)
        .with_context(|| format!("Failed to load readings from {:?}", args.input))?;

    let metrics = PipelineMetrics::new()?;
    let (dataset, report) =
        build_training_set(&readings, &pipeline).context("Failed to build training set")?;
    metrics.record_pipeline(&report);

    write_supervised_file(&dataset, &args.output)?;

    log_final_snapshot(&metrics);
    Ok(())
}
