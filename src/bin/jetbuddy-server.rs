use anyhow::Result;
use jetbuddy_api::{start_server, AppState};
use jetbuddy_control::{AnalysisPipeline, SessionScheduler, Store};
use jetbuddy_metrics::{MetricsService, TracingService};
use jetbuddy_models::Config;
use std::sync::Arc;
use tokio::signal;
use tracing::{info, warn};

const DEFAULT_CONFIG_PATH: &str = "configs/default.toml";

async fn shutdown_signal() {
    match signal::ctrl_c().await {
        Ok(()) => info!("Received shutdown signal"),
        Err(err) => warn!("Unable to listen for shutdown signal: {}", err),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // a missing .env file is fine
    let _ = dotenvy::dotenv();

    let config_path = std::env::var("JETBUDDY_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
    let config = Config::load(&config_path)?;

    TracingService::init(&config.logging).map_err(|e| anyhow::anyhow!(e))?;
    info!("Starting Jet Buddy Trading Engine");
    info!(path = %config_path, "Configuration loaded");

    let store = Store::connect(&config.data.db_url).await?;
    info!("Database connected");

    let metrics = Arc::new(MetricsService::new()?);
    let pipeline = Arc::new(AnalysisPipeline::from_config(&config, store, metrics.clone())?);

    let scheduler_handle = if config.schedule.enabled {
        let scheduler = SessionScheduler::new(pipeline.clone(), config.schedule.jobs.clone());
        Some(tokio::spawn(async move { scheduler.start().await }))
    } else {
        info!("Session scheduler disabled");
        None
    };

    let state = AppState::new(config.clone(), pipeline, metrics);
    if let Err(e) = start_server(state, shutdown_signal()).await {
        warn!("API server error: {}", e);
    }

    info!("Shutting down Jet Buddy...");
    if let Some(handle) = scheduler_handle {
        handle.abort();
    }

    Ok(())
}
