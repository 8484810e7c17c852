//! Polled snapshots of alerts and system metrics
//!
//! Each store owns exactly one collection, replaced wholesale by every
//! successful fetch. A failed fetch leaves the previous snapshot in place.

use crate::api::OpsApi;
use crate::error::DashboardError;
use crate::models::{Alert, AlertId, SystemMetricSnapshot};
use crate::observability::DashboardMetrics;
use crate::state::Generation;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

pub const ALERTS: &str = "alerts";
pub const SYSTEM_METRICS: &str = "system_metrics";

/// Run a network call under a deadline, folding timeouts into the error path
async fn bounded<T, F>(timeout: Duration, call: F) -> anyhow::Result<T>
where
    F: std::future::Future<Output = anyhow::Result<T>>,
{
    match tokio::time::timeout(timeout, call).await {
        Ok(result) => result,
        Err(_) => Err(anyhow::anyhow!(
            "no response within {}s",
            timeout.as_secs_f64()
        )),
    }
}

/// Active alerts as last reported by the ops service
pub struct AlertStore {
    api: Arc<dyn OpsApi>,
    timeout: Duration,
    alerts: RwLock<Arc<Vec<Alert>>>,
    generation: Generation,
    metrics: DashboardMetrics,
}

impl AlertStore {
    pub fn new(api: Arc<dyn OpsApi>, timeout: Duration) -> Self {
        Self::with_generation(api, timeout, Generation::default())
    }

    /// Share a teardown counter with the owning state
    pub fn with_generation(api: Arc<dyn OpsApi>, timeout: Duration, generation: Generation) -> Self {
        Self {
            api,
            timeout,
            alerts: RwLock::new(Arc::new(Vec::new())),
            generation,
            metrics: DashboardMetrics::new(),
        }
    }

    /// Fetch the remote list without touching the stored snapshot.
    ///
    /// Alerts the server already marks resolved are dropped here so a poll
    /// can never bring them back into the active view.
    pub async fn fetch(&self) -> Result<Vec<Alert>, DashboardError> {
        match bounded(self.timeout, self.api.list_alerts()).await {
            Ok(alerts) => Ok(alerts.into_iter().filter(|a| !a.resolved).collect()),
            Err(e) => {
                self.metrics.inc_poll_failures(ALERTS);
                Err(DashboardError::fetch_failed(ALERTS, &e))
            }
        }
    }

    /// Swap in a collection fetched under generation `seen`.
    ///
    /// Returns false, leaving the snapshot alone, once teardown has moved on.
    pub async fn replace(&self, seen: u64, alerts: Vec<Alert>) -> bool {
        let mut guard = self.alerts.write().await;
        if !self.generation.is_current(seen) {
            return false;
        }

        let count = alerts.len();
        *guard = Arc::new(alerts);
        self.metrics.set_active_alerts(count as i64);
        debug!(count, "Alert snapshot replaced");
        true
    }

    /// Fetch and replace in one step. Returns the number of alerts stored.
    pub async fn refresh(&self) -> Result<usize, DashboardError> {
        let seen = self.generation.current();
        let alerts = self.fetch().await?;
        let count = alerts.len();
        Ok(if self.replace(seen, alerts).await { count } else { 0 })
    }

    /// Resolve an alert remotely, then drop it from the local view.
    ///
    /// On failure the alert stays where it is.
    pub async fn resolve(&self, id: AlertId) -> Result<(), DashboardError> {
        if let Err(e) = bounded(self.timeout, self.api.resolve_alert(id)).await {
            warn!(alert_id = id, error = %e, "Alert resolve failed");
            return Err(DashboardError::resolve_failed(id, &e));
        }

        let mut guard = self.alerts.write().await;
        let remaining: Vec<Alert> = guard.iter().filter(|a| a.id != id).cloned().collect();
        let removed = guard.len() - remaining.len();
        self.metrics.set_active_alerts(remaining.len() as i64);
        *guard = Arc::new(remaining);

        info!(alert_id = id, removed, "Alert resolved");
        Ok(())
    }

    pub async fn snapshot(&self) -> Arc<Vec<Alert>> {
        self.alerts.read().await.clone()
    }

    pub async fn len(&self) -> usize {
        self.alerts.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.alerts.read().await.is_empty()
    }
}

/// System health snapshots as last reported by the ops service
pub struct SystemMetricsStore {
    api: Arc<dyn OpsApi>,
    timeout: Duration,
    snapshots: RwLock<Arc<Vec<SystemMetricSnapshot>>>,
    generation: Generation,
    metrics: DashboardMetrics,
}

impl SystemMetricsStore {
    pub fn new(api: Arc<dyn OpsApi>, timeout: Duration) -> Self {
        Self::with_generation(api, timeout, Generation::default())
    }

    pub fn with_generation(api: Arc<dyn OpsApi>, timeout: Duration, generation: Generation) -> Self {
        Self {
            api,
            timeout,
            snapshots: RwLock::new(Arc::new(Vec::new())),
            generation,
            metrics: DashboardMetrics::new(),
        }
    }

    pub async fn fetch(&self) -> Result<Vec<SystemMetricSnapshot>, DashboardError> {
        bounded(self.timeout, self.api.list_system_metrics())
            .await
            .map_err(|e| {
                self.metrics.inc_poll_failures(SYSTEM_METRICS);
                DashboardError::fetch_failed(SYSTEM_METRICS, &e)
            })
    }

    pub async fn replace(&self, seen: u64, snapshots: Vec<SystemMetricSnapshot>) -> bool {
        let mut guard = self.snapshots.write().await;
        if !self.generation.is_current(seen) {
            return false;
        }

        let count = snapshots.len();
        *guard = Arc::new(snapshots);
        debug!(count, "System metrics snapshot replaced");
        true
    }

    pub async fn refresh(&self) -> Result<usize, DashboardError> {
        let seen = self.generation.current();
        let snapshots = self.fetch().await?;
        let count = snapshots.len();
        Ok(if self.replace(seen, snapshots).await { count } else { 0 })
    }

    pub async fn snapshot(&self) -> Arc<Vec<SystemMetricSnapshot>> {
        self.snapshots.read().await.clone()
    }

    /// Most recent reading, if the service reported any
    pub async fn latest(&self) -> Option<SystemMetricSnapshot> {
        self.snapshots
            .read()
            .await
            .iter()
            .max_by_key(|s| s.timestamp)
            .cloned()
    }
}
