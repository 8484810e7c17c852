//! Health tracking for the dashboard's background activity
//!
//! Each poll source and the predictor report the outcome of every cycle. One
//! failure marks the component degraded (stale data is still served); a run of
//! failures marks it unhealthy.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Consecutive failures before a component is considered unhealthy
pub const UNHEALTHY_AFTER_FAILURES: u32 = 3;

/// Ordered from best to worst, so the overall status is the maximum
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComponentStatus {
    /// Last cycle succeeded
    Healthy,
    /// Recent failures, last good snapshot still shown
    Degraded,
    /// Repeated failures
    Unhealthy,
}

/// Last known state of one component
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentHealth {
    pub status: ComponentStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub consecutive_failures: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_success_timestamp: Option<i64>,
    pub last_check_timestamp: i64,
}

impl ComponentHealth {
    fn registered() -> Self {
        Self {
            status: ComponentStatus::Healthy,
            message: None,
            consecutive_failures: 0,
            last_success_timestamp: None,
            last_check_timestamp: chrono::Utc::now().timestamp(),
        }
    }

    fn succeeded(&mut self) {
        let now = chrono::Utc::now().timestamp();
        self.status = ComponentStatus::Healthy;
        self.message = None;
        self.consecutive_failures = 0;
        self.last_success_timestamp = Some(now);
        self.last_check_timestamp = now;
    }

    fn failed(&mut self, message: String) {
        self.consecutive_failures += 1;
        self.status = if self.consecutive_failures >= UNHEALTHY_AFTER_FAILURES {
            ComponentStatus::Unhealthy
        } else {
            ComponentStatus::Degraded
        };
        self.message = Some(message);
        self.last_check_timestamp = chrono::Utc::now().timestamp();
    }
}

/// Snapshot of every component plus the worst of their statuses
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: ComponentStatus,
    pub components: HashMap<String, ComponentHealth>,
}

impl HealthResponse {
    fn from_components(components: HashMap<String, ComponentHealth>) -> Self {
        let status = components
            .values()
            .map(|c| c.status)
            .max()
            .unwrap_or(ComponentStatus::Healthy);
        Self { status, components }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadinessResponse {
    pub ready: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Names under which the engine reports
pub mod components {
    pub const ALERTS_POLL: &str = "alerts_poll";
    pub const METRICS_POLL: &str = "metrics_poll";
    pub const PREDICTOR: &str = "predictor";

    pub const ALL: &[&str] = &[ALERTS_POLL, METRICS_POLL, PREDICTOR];
}

/// Shared, cloneable registry of component health
#[derive(Debug, Clone, Default)]
pub struct HealthRegistry {
    components: Arc<RwLock<HashMap<String, ComponentHealth>>>,
    ready: Arc<RwLock<bool>>,
}

impl HealthRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register every dashboard component as healthy
    pub async fn register_all(&self) {
        let mut map = self.components.write().await;
        for name in components::ALL {
            map.insert(name.to_string(), ComponentHealth::registered());
        }
    }

    /// Record a successful cycle
    pub async fn record_success(&self, name: &str) {
        let mut components = self.components.write().await;
        components
            .entry(name.to_string())
            .or_insert_with(ComponentHealth::registered)
            .succeeded();
    }

    /// Record a failed cycle
    pub async fn record_failure(&self, name: &str, message: impl Into<String>) {
        let mut components = self.components.write().await;
        components
            .entry(name.to_string())
            .or_insert_with(ComponentHealth::registered)
            .failed(message.into());
    }

    pub async fn status_of(&self, name: &str) -> Option<ComponentStatus> {
        self.components.read().await.get(name).map(|h| h.status)
    }

    pub async fn set_ready(&self, ready: bool) {
        *self.ready.write().await = ready;
    }

    pub async fn health(&self) -> HealthResponse {
        HealthResponse::from_components(self.components.read().await.clone())
    }

    /// Ready once activated, as long as nothing is unhealthy
    pub async fn readiness(&self) -> ReadinessResponse {
        let activated = *self.ready.read().await;
        let reason = match (activated, self.health().await.status) {
            (false, _) => Some("Dashboard not yet activated"),
            (true, ComponentStatus::Unhealthy) => Some("Ops service unreachable"),
            (true, _) => None,
        };

        ReadinessResponse {
            ready: reason.is_none(),
            reason: reason.map(str::to_string),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_initial_state() {
        let registry = HealthRegistry::new();
        let health = registry.health().await;

        assert_eq!(health.status, ComponentStatus::Healthy);
        assert!(health.components.is_empty());
    }

    #[tokio::test]
    async fn test_register_all_components() {
        let registry = HealthRegistry::new();
        registry.register_all().await;

        let health = registry.health().await;
        assert_eq!(health.components.len(), components::ALL.len());
        assert_eq!(
            registry.status_of(components::ALERTS_POLL).await,
            Some(ComponentStatus::Healthy)
        );
        assert_eq!(registry.status_of("unknown").await, None);
    }

    #[tokio::test]
    async fn test_single_failure_degrades_and_recovers() {
        let registry = HealthRegistry::new();
        registry.register_all().await;
        registry.set_ready(true).await;

        registry
            .record_failure(components::METRICS_POLL, "failed to fetch system_metrics")
            .await;
        assert_eq!(registry.health().await.status, ComponentStatus::Degraded);

        // Stale data is still served, so degraded stays ready
        assert!(registry.readiness().await.ready);

        registry.record_success(components::METRICS_POLL).await;
        let health = registry.health().await;
        assert_eq!(health.status, ComponentStatus::Healthy);
        let metrics_poll = &health.components[components::METRICS_POLL];
        assert_eq!(metrics_poll.consecutive_failures, 0);
        assert!(metrics_poll.last_success_timestamp.is_some());
    }

    #[tokio::test]
    async fn test_repeated_failures_become_unhealthy() {
        let registry = HealthRegistry::new();
        registry.register_all().await;
        registry.set_ready(true).await;

        for _ in 0..UNHEALTHY_AFTER_FAILURES {
            registry
                .record_failure(components::PREDICTOR, "connection refused")
                .await;
        }

        let health = registry.health().await;
        assert_eq!(health.status, ComponentStatus::Unhealthy);
        assert_eq!(
            health.components[components::PREDICTOR].consecutive_failures,
            UNHEALTHY_AFTER_FAILURES
        );
        assert!(!registry.readiness().await.ready);
    }

    #[tokio::test]
    async fn test_unregistered_component_is_tracked_on_first_report() {
        let registry = HealthRegistry::new();
        registry.record_failure("adhoc", "boom").await;
        assert_eq!(
            registry.status_of("adhoc").await,
            Some(ComponentStatus::Degraded)
        );
    }

    #[tokio::test]
    async fn test_not_ready_until_activated() {
        let registry = HealthRegistry::new();
        let readiness = registry.readiness().await;

        assert!(!readiness.ready);
        assert!(readiness.reason.is_some());

        registry.set_ready(true).await;
        assert!(registry.readiness().await.ready);
    }
}
