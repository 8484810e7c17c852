//! Client-side synchronization engine for the deployment-risk dashboard
//!
//! This crate provides the core functionality for:
//! - Talking to the remote decision service (predictions, alerts, system metrics, rollback)
//! - Holding polled snapshots of alerts and system metrics
//! - Bounded prediction history
//! - Synthetic metric generation for autonomous mode
//! - Scheduling of poll and autonomous cycles
//! - Health checks and observability

pub mod api;
pub mod error;
pub mod form;
pub mod health;
pub mod history;
pub mod models;
pub mod observability;
pub mod prediction;
pub mod scheduler;
pub mod state;
pub mod store;
pub mod synthetic;

pub use api::{HttpOpsApi, OpsApi};
pub use error::{DashboardError, ValidationError};
pub use form::SampleForm;
pub use health::{
    ComponentHealth, ComponentStatus, HealthRegistry, HealthResponse, ReadinessResponse,
};
pub use history::{HistoryEntry, HistoryLog, HISTORY_CAPACITY};
pub use models::*;
pub use observability::{DashboardMetrics, StructuredLogger};
pub use prediction::PredictionClient;
pub use scheduler::{
    FirstTick, RepeatingTask, SchedulerConfig, SyncHandle, SyncPhase, SyncScheduler,
    SyncSchedulerBuilder,
};
pub use state::{CurrentResult, DashboardState, DashboardView, Generation, Outcome, ResultSource};
pub use store::{AlertStore, SystemMetricsStore};
pub use synthetic::SyntheticDriver;
