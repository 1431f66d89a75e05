//! Export per-vehicle trip KPIs as a pretty-printed JSON array.

use anyhow::{Context, Result};
use clap::Parser;
use socdrop::application::kpi::summarize_vehicles;
use socdrop::application::pipeline::enrich_with_report;
use socdrop::config::Config;
use socdrop::infrastructure::observability::{PipelineMetrics, log_final_snapshot};
use socdrop::infrastructure::readings_csv::load_readings;
use std::fs;
use std::path::PathBuf;
use tracing::info;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the raw readings CSV
    #[arg(long, default_value = "data/telematics.csv")]
    input: PathBuf,

    /// Write the JSON here instead of stdout
    #[arg(long)]
    out: Option<PathBuf>,
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let subscriber = tracing_subscriber::FmtSubscriber::builder()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber).ok();

    let args = Args::parse();
    let pipeline = Config::from_env()?.to_pipeline_config()?;

    let readings = load_readings(&args.input)
        .with_context(|| format!("Failed to load readings from {:?}", args.input))?;

    let metrics = PipelineMetrics::new()?;
    let (enriched, report) = enrich_with_report(&readings, &pipeline);
    metrics.record_enrichment(&report);

    let kpis = summarize_vehicles(&enriched);
    let json = serde_json::to_string_pretty(&kpis).context("Failed to serialize KPIs")?;

    match &args.out {
        Some(path) => {
            fs::write(path, &json).with_context(|| format!("Failed to write {:?}", path))?;
            info!("Wrote KPIs for {} vehicles to {:?}", kpis.len(), path);
        }
        None => println!("{}", json),
    }

    log_final_snapshot(&metrics);
    Ok(())
}
