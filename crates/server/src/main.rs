//! Price estimator server
//!
//! Loads a trained model bundle and serves price predictions over HTTP,
//! alongside health, readiness and Prometheus endpoints.

use anyhow::Result;
use estimator_lib::{
    health::{components, HealthRegistry},
    PredictionService, StructuredLogger,
};
use price_server::{api, config};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing with JSON output and env filter
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().json())
        .init();

    info!("Starting price-server");

    let config = config::ServerConfig::load()?;
    info!(
        instance = %config.instance_name,
        model_path = %config.model_path.display(),
        "Server configured"
    );

    let health_registry = HealthRegistry::new();
    health_registry.register(components::MODEL).await;
    health_registry.register(components::MODEL_STORE).await;

    let logger = StructuredLogger::new(&config.instance_name);
    let service = Arc::new(PredictionService::new(&config.instance_name));

    // A missing bundle is not fatal; POST /reload can publish one later
    let model_path = config.model_path.display().to_string();
    match service.reload(&config.model_path) {
        Ok(()) => {
            let kind = service
                .current()
                .map_or("unknown", |estimator| estimator.model().regressor.kind());
            health_registry.record_publish(kind).await;
            logger.log_model_reload(&model_path, true, kind);
        }
        Err(e) => {
            warn!(error = %e, "Starting without a model");
            health_registry.record_reload_failure(&e.to_string()).await;
        }
    }
    logger.log_startup(SERVER_VERSION, &model_path);

    let app_state = Arc::new(api::AppState::new(
        health_registry.clone(),
        service,
        config.model_path.clone(),
        logger.clone(),
    ));

    let api_handle = tokio::spawn(api::serve(config.api_port, app_state));

    tokio::select! {
        result = api_handle => {
            match result {
                Ok(Ok(())) => warn!("API server exited"),
                Ok(Err(e)) => return Err(e),
                Err(e) => return Err(e.into()),
            }
        }
        signal = tokio::signal::ctrl_c() => {
            signal?;
            logger.log_shutdown("SIGINT received");
        }
    }
    info!("Shutting down");

    Ok(())
}
