//! NeurOps dashboard daemon
//!
//! Keeps alerts and system metrics in sync with the decision service,
//! optionally drives autonomous predictions, and serves the result over HTTP.

use anyhow::{Context, Result};
use dashboard_lib::{
    DashboardState, HealthRegistry, HttpOpsApi, OpsApi, StructuredLogger, SyncScheduler,
    HISTORY_CAPACITY,
};
use neurops_dashboard::{api, config::DashboardConfig};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const DASHBOARD_VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().json())
        .init();

    let config = DashboardConfig::load().context("Failed to load configuration")?;
    let scheduler_config = config.scheduler_config();

    let logger = StructuredLogger::new(format!("dashboard:{}", config.port));
    logger.log_startup(DASHBOARD_VERSION, &config.api_endpoint);

    let api: Arc<dyn OpsApi> = Arc::new(HttpOpsApi::with_timeout(
        &config.api_endpoint,
        scheduler_config.request_timeout,
    )?);

    match api.status().await {
        Ok(status) => info!(status = %status.status, "Decision service reachable"),
        Err(e) => error!(error = %e, "Decision service not reachable yet, polling anyway"),
    }

    let health_registry = HealthRegistry::new();
    health_registry.register_all().await;

    let state = Arc::new(DashboardState::new(
        api.clone(),
        scheduler_config.request_timeout,
        HISTORY_CAPACITY,
    ));

    let mut scheduler = SyncScheduler::builder(api, state)
        .config(scheduler_config)
        .health(health_registry.clone())
        .logger(logger.clone())
        .build();

    scheduler.activate();
    if config.autonomous_on_start {
        scheduler.set_autonomous(true);
    }
    health_registry.set_ready(true).await;

    let app_state = Arc::new(api::AppState::new(health_registry.clone(), scheduler));
    let server = tokio::spawn(api::serve(config.port, app_state.clone()));

    tokio::select! {
        result = tokio::signal::ctrl_c() => {
            result.context("Failed to listen for shutdown signal")?;
            logger.log_shutdown("SIGINT received");
        }
        result = server => {
            match result {
                Ok(Ok(())) => logger.log_shutdown("server exited"),
                Ok(Err(e)) => {
                    error!(error = %e, "Dashboard server failed");
                    logger.log_shutdown("server error");
                }
                Err(e) => {
                    error!(error = %e, "Dashboard server task panicked");
                    logger.log_shutdown("server panic");
                }
            }
        }
    }

    health_registry.set_ready(false).await;
    app_state.scheduler.lock().await.teardown();
    info!("Shutdown complete");

    Ok(())
}
