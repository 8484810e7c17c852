//! Owned dashboard state shared by the scheduler and the user surfaces
//!
//! The "current result" is a last-write-wins cell fed by two independent
//! producers (manual submissions and autonomous ticks). Every write takes the
//! next value of a monotonic sequence so the winner is observable.
//!
//! Writers capture the `Generation` before going to the network and hand it
//! back with their result. The check happens after the target lock is held,
//! so nothing can be appended once teardown has advanced the generation.

use crate::api::OpsApi;
use crate::error::DashboardError;
use crate::history::{HistoryEntry, HistoryLog};
use crate::models::{Alert, PredictionResult, SystemMetricSnapshot};
use crate::observability::DashboardMetrics;
use crate::scheduler::SyncPhase;
use crate::store::{AlertStore, SystemMetricsStore};
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

/// Teardown counter shared by the state and its stores
#[derive(Debug, Clone, Default)]
pub struct Generation(Arc<AtomicU64>);

impl Generation {
    pub fn current(&self) -> u64 {
        self.0.load(Ordering::SeqCst)
    }

    /// Invalidate every result captured under the current generation
    pub fn advance(&self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }

    pub fn is_current(&self, seen: u64) -> bool {
        self.current() == seen
    }
}

/// Who produced a result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultSource {
    Manual,
    Autonomous,
}

/// What the current-result panel shows
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Outcome {
    Prediction(PredictionResult),
    Error { message: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CurrentResult {
    pub seq: u64,
    pub source: ResultSource,
    pub outcome: Outcome,
}

/// Everything a renderer needs, captured at one point in time
#[derive(Debug, Clone, Serialize)]
pub struct DashboardView {
    pub phase: SyncPhase,
    pub current: Option<CurrentResult>,
    pub history: Vec<HistoryEntry>,
    pub alerts: Vec<Alert>,
    pub system_metrics: Vec<SystemMetricSnapshot>,
}

#[derive(Debug, Default)]
struct ResultCell {
    last_seq: u64,
    value: Option<CurrentResult>,
}

impl ResultCell {
    fn publish(&mut self, source: ResultSource, outcome: Outcome) -> u64 {
        self.last_seq += 1;
        self.value = Some(CurrentResult {
            seq: self.last_seq,
            source,
            outcome,
        });
        self.last_seq
    }
}

pub struct DashboardState {
    pub alerts: AlertStore,
    pub system_metrics: SystemMetricsStore,
    history: RwLock<HistoryLog>,
    current: RwLock<ResultCell>,
    generation: Generation,
    metrics: DashboardMetrics,
}

impl DashboardState {
    pub fn new(api: Arc<dyn OpsApi>, request_timeout: Duration, history_capacity: usize) -> Self {
        let generation = Generation::default();
        Self {
            alerts: AlertStore::with_generation(api.clone(), request_timeout, generation.clone()),
            system_metrics: SystemMetricsStore::with_generation(
                api,
                request_timeout,
                generation.clone(),
            ),
            history: RwLock::new(HistoryLog::with_capacity(history_capacity)),
            current: RwLock::new(ResultCell::default()),
            generation,
            metrics: DashboardMetrics::new(),
        }
    }

    pub fn generation(&self) -> &Generation {
        &self.generation
    }

    /// Append a successful prediction to history and make it current.
    ///
    /// Returns the new sequence number, or `None` when `seen` is no longer
    /// the current generation.
    pub async fn record_prediction(
        &self,
        seen: u64,
        source: ResultSource,
        result: PredictionResult,
    ) -> Option<u64> {
        let mut history = self.history.write().await;
        let mut cell = self.current.write().await;
        if !self.generation.is_current(seen) {
            return None;
        }

        history.append(result.clone());
        self.metrics.set_history_len(history.len() as i64);
        Some(cell.publish(source, Outcome::Prediction(result)))
    }

    /// Show a failed prediction inline; history is untouched
    pub async fn record_failure(
        &self,
        seen: u64,
        source: ResultSource,
        error: &DashboardError,
    ) -> Option<u64> {
        let mut cell = self.current.write().await;
        if !self.generation.is_current(seen) {
            return None;
        }

        Some(cell.publish(
            source,
            Outcome::Error {
                message: error.to_string(),
            },
        ))
    }

    pub async fn current(&self) -> Option<CurrentResult> {
        self.current.read().await.value.clone()
    }

    pub async fn history(&self) -> Vec<HistoryEntry> {
        self.history.read().await.to_vec()
    }

    pub async fn history_len(&self) -> usize {
        self.history.read().await.len()
    }

    pub async fn view(&self, phase: SyncPhase) -> DashboardView {
        DashboardView {
            phase,
            current: self.current().await,
            history: self.history().await,
            alerts: self.alerts.snapshot().await.as_ref().clone(),
            system_metrics: self.system_metrics.snapshot().await.as_ref().clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AlertId, Decision, PredictRequest, PredictResponse, ServiceStatus};
    use anyhow::Result;
    use async_trait::async_trait;

    struct NullApi;

    #[async_trait]
    impl OpsApi for NullApi {
        async fn predict(&self, _request: &PredictRequest) -> Result<PredictResponse> {
            anyhow::bail!("offline")
        }
        async fn list_alerts(&self) -> Result<Vec<Alert>> {
            Ok(vec![])
        }
        async fn resolve_alert(&self, _id: AlertId) -> Result<()> {
            Ok(())
        }
        async fn list_system_metrics(&self) -> Result<Vec<SystemMetricSnapshot>> {
            Ok(vec![])
        }
        async fn trigger_rollback(&self) -> Result<()> {
            Ok(())
        }
        async fn status(&self) -> Result<ServiceStatus> {
            Ok(ServiceStatus {
                status: "ok".to_string(),
            })
        }
    }

    fn state() -> DashboardState {
        DashboardState::new(Arc::new(NullApi), Duration::from_secs(1), 10)
    }

    fn result(p: f64) -> PredictionResult {
        PredictionResult {
            decision: Decision::Proceed,
            failure_probability: p,
            observed_at: chrono::Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_last_write_wins_with_increasing_seq() {
        let state = state();
        let seen = state.generation().current();

        let first = result(0.1);
        let second = result(0.2);
        let a = state
            .record_prediction(seen, ResultSource::Autonomous, first)
            .await
            .unwrap();
        let b = state
            .record_prediction(seen, ResultSource::Manual, second.clone())
            .await
            .unwrap();
        assert!(b > a);

        let current = state.current().await.unwrap();
        assert_eq!(current.seq, b);
        assert_eq!(current.source, ResultSource::Manual);
        assert_eq!(current.outcome, Outcome::Prediction(second));
    }

    #[tokio::test]
    async fn test_failure_replaces_current_but_not_history() {
        let state = state();
        let seen = state.generation().current();
        state
            .record_prediction(seen, ResultSource::Autonomous, result(0.3))
            .await;

        let err = DashboardError::PredictionUnavailable {
            reason: "timeout".to_string(),
        };
        let seq = state
            .record_failure(seen, ResultSource::Autonomous, &err)
            .await
            .unwrap();

        let current = state.current().await.unwrap();
        assert_eq!(current.seq, seq);
        assert!(matches!(current.outcome, Outcome::Error { .. }));
        assert_eq!(state.history_len().await, 1);
    }

    #[tokio::test]
    async fn test_view_serializes() {
        let state = state();
        let seen = state.generation().current();
        state
            .record_prediction(seen, ResultSource::Manual, result(0.5))
            .await;

        let view = state.view(SyncPhase::PollingOnly).await;
        let json = serde_json::to_value(&view).unwrap();

        assert_eq!(json["phase"], "polling_only");
        assert_eq!(json["current"]["outcome"]["kind"], "prediction");
        assert_eq!(json["history"].as_array().unwrap().len(), 1);
        assert_eq!(json["history"][0]["decision"], "PROCEED");
    }

    #[tokio::test]
    async fn test_stale_generation_writes_nothing() {
        let state = state();
        let seen = state.generation().current();
        state.generation().advance();

        let err = DashboardError::PredictionUnavailable {
            reason: "timeout".to_string(),
        };
        assert!(state
            .record_prediction(seen, ResultSource::Autonomous, result(0.4))
            .await
            .is_none());
        assert!(state
            .record_failure(seen, ResultSource::Manual, &err)
            .await
            .is_none());
        assert!(state.current().await.is_none());
        assert_eq!(state.history_len().await, 0);
    }

    #[tokio::test]
    async fn test_teardown_while_waiting_for_history_lock() {
        let state = Arc::new(state());
        let seen = state.generation().current();

        // Keep the writer parked on the lock, then advance underneath it
        let guard = state.history.write().await;
        let writer = {
            let state = state.clone();
            tokio::spawn(async move {
                state
                    .record_prediction(seen, ResultSource::Autonomous, result(0.6))
                    .await
            })
        };
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
        state.generation().advance();
        drop(guard);

        assert!(writer.await.unwrap().is_none());
        assert_eq!(state.history_len().await, 0);
        assert!(state.current().await.is_none());
    }
}
