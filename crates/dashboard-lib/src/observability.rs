//! Observability for the dashboard engine
//!
//! Provides:
//! - Prometheus metrics (prediction latency and outcomes, poll failures, panel sizes)
//! - Structured logging of engine events with tracing

use crate::error::DashboardError;
use crate::models::{AlertId, Decision, PredictionResult};
use crate::scheduler::SyncPhase;
use crate::state::ResultSource;
use prometheus::{
    register_histogram, register_int_counter, register_int_counter_vec, register_int_gauge,
    Histogram, IntCounter, IntCounterVec, IntGauge,
};
use std::sync::OnceLock;
use tracing::{info, warn};

/// Buckets for remote call latency (in seconds)
const LATENCY_BUCKETS: &[f64] = &[0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0];

static GLOBAL_METRICS: OnceLock<DashboardMetricsInner> = OnceLock::new();

struct DashboardMetricsInner {
    prediction_latency_seconds: Histogram,
    predictions: IntCounterVec,
    prediction_errors: IntCounter,
    poll_failures: IntCounterVec,
    active_alerts: IntGauge,
    history_entries: IntGauge,
    autonomous_mode: IntGauge,
}

impl DashboardMetricsInner {
    fn new() -> Self {
        Self {
            prediction_latency_seconds: register_histogram!(
                "neurops_dashboard_prediction_latency_seconds",
                "Round trip time of prediction requests",
                LATENCY_BUCKETS.to_vec()
            )
            .expect("Failed to register prediction_latency_seconds"),

            predictions: register_int_counter_vec!(
                "neurops_dashboard_predictions_total",
                "Predictions received, by decision",
                &["decision"]
            )
            .expect("Failed to register predictions_total"),

            prediction_errors: register_int_counter!(
                "neurops_dashboard_prediction_errors_total",
                "Prediction requests that produced no usable result"
            )
            .expect("Failed to register prediction_errors_total"),

            poll_failures: register_int_counter_vec!(
                "neurops_dashboard_poll_failures_total",
                "Failed snapshot fetches, by resource",
                &["resource"]
            )
            .expect("Failed to register poll_failures_total"),

            active_alerts: register_int_gauge!(
                "neurops_dashboard_active_alerts",
                "Unresolved alerts in the current snapshot"
            )
            .expect("Failed to register active_alerts"),

            history_entries: register_int_gauge!(
                "neurops_dashboard_history_entries",
                "Entries in the prediction history"
            )
            .expect("Failed to register history_entries"),

            autonomous_mode: register_int_gauge!(
                "neurops_dashboard_autonomous_mode",
                "1 while autonomous predictions are running"
            )
            .expect("Failed to register autonomous_mode"),
        }
    }
}

/// Handle to the process-wide dashboard metrics.
///
/// Clones share the same underlying collectors.
#[derive(Clone)]
pub struct DashboardMetrics {
    _private: (),
}

impl Default for DashboardMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl DashboardMetrics {
    pub fn new() -> Self {
        GLOBAL_METRICS.get_or_init(DashboardMetricsInner::new);
        Self { _private: () }
    }

    fn inner(&self) -> &DashboardMetricsInner {
        GLOBAL_METRICS.get_or_init(DashboardMetricsInner::new)
    }

    pub fn observe_prediction_latency(&self, duration_secs: f64) {
        self.inner().prediction_latency_seconds.observe(duration_secs);
    }

    pub fn inc_predictions(&self, decision: Decision) {
        self.inner()
            .predictions
            .with_label_values(&[decision.as_str()])
            .inc();
    }

    pub fn inc_prediction_errors(&self) {
        self.inner().prediction_errors.inc();
    }

    pub fn inc_poll_failures(&self, resource: &str) {
        self.inner()
            .poll_failures
            .with_label_values(&[resource])
            .inc();
    }

    pub fn set_active_alerts(&self, count: i64) {
        self.inner().active_alerts.set(count);
    }

    pub fn set_history_len(&self, len: i64) {
        self.inner().history_entries.set(len);
    }

    pub fn set_autonomous_mode(&self, enabled: bool) {
        self.inner().autonomous_mode.set(i64::from(enabled));
    }
}

/// Structured logger for dashboard events
#[derive(Clone)]
pub struct StructuredLogger {
    instance: String,
}

impl StructuredLogger {
    pub fn new(instance: impl Into<String>) -> Self {
        Self {
            instance: instance.into(),
        }
    }

    pub fn instance(&self) -> &str {
        &self.instance
    }

    pub fn log_startup(&self, version: &str, api_endpoint: &str) {
        info!(
            event = "dashboard_started",
            instance = %self.instance,
            version = %version,
            api_endpoint = %api_endpoint,
            "Dashboard started"
        );
    }

    pub fn log_shutdown(&self, reason: &str) {
        info!(
            event = "dashboard_shutdown",
            instance = %self.instance,
            reason = %reason,
            "Dashboard shutting down"
        );
    }

    /// A ROLLBACK decision is logged at warn level
    pub fn log_prediction(&self, source: ResultSource, result: &PredictionResult) {
        match result.decision {
            Decision::Rollback => warn!(
                event = "prediction_received",
                instance = %self.instance,
                source = ?source,
                decision = %result.decision,
                failure_probability = result.failure_probability,
                "Rollback recommended"
            ),
            Decision::Proceed => info!(
                event = "prediction_received",
                instance = %self.instance,
                source = ?source,
                decision = %result.decision,
                failure_probability = result.failure_probability,
                "Deployment may proceed"
            ),
        }
    }

    pub fn log_prediction_failed(&self, source: ResultSource, error: &DashboardError) {
        warn!(
            event = "prediction_failed",
            instance = %self.instance,
            source = ?source,
            kind = error.kind(),
            error = %error,
            "Prediction failed"
        );
    }

    pub fn log_poll_failed(&self, error: &DashboardError) {
        warn!(
            event = "poll_failed",
            instance = %self.instance,
            kind = error.kind(),
            error = %error,
            "Poll failed, keeping previous snapshot"
        );
    }

    pub fn log_alert_resolved(&self, id: AlertId) {
        info!(
            event = "alert_resolved",
            instance = %self.instance,
            alert_id = id,
            "Alert resolved"
        );
    }

    pub fn log_rollback(&self, error: Option<&DashboardError>) {
        match error {
            None => warn!(
                event = "rollback_triggered",
                instance = %self.instance,
                "Rollback triggered"
            ),
            Some(e) => warn!(
                event = "rollback_failed",
                instance = %self.instance,
                error = %e,
                "Rollback request failed"
            ),
        }
    }

    pub fn log_phase_change(&self, from: SyncPhase, to: SyncPhase) {
        info!(
            event = "phase_changed",
            instance = %self.instance,
            from = %from,
            to = %to,
            "Sync phase changed"
        );
    }
}
