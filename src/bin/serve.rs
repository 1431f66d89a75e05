//! SOC-drop prediction server.
//!
//! Loads the configured family's regressor and classifier from `MODEL_DIR`
//! and serves `POST /predict` and `GET /health`. Missing models are served as
//! `null` predictions. Metrics are pushed as JSON logs to stdout.
//!
//! # Usage
//! ```sh
//! MODEL_DIR=models SERVE_PORT=8000 cargo run --bin serve
//! ```

use anyhow::{Context, Result};
use socdrop::config::Config;
use socdrop::infrastructure::model_store::ModelStore;
use socdrop::infrastructure::observability::{MetricsReporter, PipelineMetrics};
use socdrop::interfaces::http::{AppState, router};
use tracing::{Level, info};
use tracing_subscriber::prelude::*;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let stdout_layer = tracing_subscriber::fmt::layer().with_target(false);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .with(stdout_layer)
        .init();

    info!("socdrop server {} starting...", env!("CARGO_PKG_VERSION"));

    let config = Config::from_env()?;
    let store = ModelStore::new(config.training.model_dir.clone());
    let predictor = store.load_predictor(config.serving.model_family);
    info!(
        "Serving {} models: regressor={:?} classifier={:?}",
        config.serving.model_family,
        predictor.regressor_name(),
        predictor.classifier_name()
    );

    let metrics = PipelineMetrics::new()?;
    let reporter = MetricsReporter::new(
        metrics.clone(),
        &predictor,
        config.serving.metrics_interval_seconds,
    );
    tokio::spawn(async move {
        reporter.run().await;
    });

    let app = router(AppState::new(predictor, metrics));

    let addr = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("Listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
            info!("Shutdown signal received. Exiting...");
        })
        .await?;

    Ok(())
}
