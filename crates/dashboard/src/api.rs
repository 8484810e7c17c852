//! HTTP API: health, Prometheus metrics and dashboard control

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use dashboard_lib::{
    health::{ComponentStatus, HealthRegistry},
    AlertId, DashboardError, SampleForm, SyncHandle, SyncScheduler,
};
use prometheus::{Encoder, TextEncoder};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{error, info};

/// Shared application state.
///
/// Handlers that wait on the ops service go through `engine`. The scheduler
/// mutex is only taken for timer changes, which never await.
#[derive(Clone)]
pub struct AppState {
    pub health_registry: HealthRegistry,
    pub engine: SyncHandle,
    pub scheduler: Arc<Mutex<SyncScheduler>>,
}

impl AppState {
    pub fn new(health_registry: HealthRegistry, scheduler: SyncScheduler) -> Self {
        Self {
            health_registry,
            engine: scheduler.handle(),
            scheduler: Arc::new(Mutex::new(scheduler)),
        }
    }
}

/// Engine errors mapped onto HTTP status codes
pub struct ApiError(DashboardError);

impl From<DashboardError> for ApiError {
    fn from(err: DashboardError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            DashboardError::Validation(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::BAD_GATEWAY,
        };

        let mut body = json!({
            "kind": self.0.kind(),
            "error": self.0.to_string(),
        });
        if let DashboardError::Validation(v) = &self.0 {
            body["field"] = json!(v.field());
        }

        (status, Json(body)).into_response()
    }
}

/// 200 while healthy or degraded, 503 once a component is unhealthy
async fn healthz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let health = state.health_registry.health().await;

    let status_code = match health.status {
        ComponentStatus::Healthy | ComponentStatus::Degraded => StatusCode::OK,
        ComponentStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    };

    (status_code, Json(health))
}

async fn readyz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let readiness = state.health_registry.readiness().await;

    let status_code = if readiness.ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status_code, Json(readiness))
}

/// Prometheus metrics endpoint
async fn metrics() -> Response {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();

    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        error!(error = %e, "Failed to encode metrics");
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    }

    (
        StatusCode::OK,
        [("content-type", "text/plain; charset=utf-8")],
        buffer,
    )
        .into_response()
}

/// Full dashboard view
async fn get_state(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.engine.view().await)
}

/// Manual prediction from raw form fields
async fn predict(
    State(state): State<Arc<AppState>>,
    Json(form): Json<SampleForm>,
) -> Result<impl IntoResponse, ApiError> {
    let result = state.engine.submit_form(&form).await?;
    Ok(Json(result))
}

#[derive(Debug, Deserialize)]
pub struct AutonomousRequest {
    pub enabled: bool,
}

async fn set_autonomous(
    State(state): State<Arc<AppState>>,
    Json(request): Json<AutonomousRequest>,
) -> impl IntoResponse {
    let phase = state.scheduler.lock().await.set_autonomous(request.enabled);
    Json(json!({ "phase": phase }))
}

async fn resolve_alert(
    State(state): State<Arc<AppState>>,
    Path(id): Path<AlertId>,
) -> Result<StatusCode, ApiError> {
    state.engine.resolve_alert(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn rollback(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, ApiError> {
    state.engine.execute_rollback().await?;
    Ok((
        StatusCode::ACCEPTED,
        Json(json!({ "status": "rollback_triggered" })),
    ))
}

/// Create the API router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .route("/metrics", get(metrics))
        .route("/api/state", get(get_state))
        .route("/api/predict", post(predict))
        .route("/api/autonomous", post(set_autonomous))
        .route("/api/alerts/:id/resolve", post(resolve_alert))
        .route("/api/rollback", post(rollback))
        .with_state(state)
}

/// Start the API server
pub async fn serve(port: u16, state: Arc<AppState>) -> anyhow::Result<()> {
    let app = create_router(state);

    let addr = format!("0.0.0.0:{}", port);
    info!(addr = %addr, "Starting dashboard server");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
