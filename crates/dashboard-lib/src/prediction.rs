//! One request/response cycle against the decision service

use crate::api::OpsApi;
use crate::error::DashboardError;
use crate::models::{MetricSample, PredictionResult};
use crate::observability::DashboardMetrics;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;

/// Submits samples for prediction.
///
/// No queuing and no retries: every call is a single round-trip bounded by
/// `timeout`, and the caller decides what to do with the outcome.
#[derive(Clone)]
pub struct PredictionClient {
    api: Arc<dyn OpsApi>,
    timeout: Duration,
    metrics: DashboardMetrics,
}

impl PredictionClient {
    pub fn new(api: Arc<dyn OpsApi>, timeout: Duration) -> Self {
        Self {
            api,
            timeout,
            metrics: DashboardMetrics::new(),
        }
    }

    pub async fn predict(&self, sample: MetricSample) -> Result<PredictionResult, DashboardError> {
        let start = Instant::now();
        let request = sample.to_request();

        let response = match tokio::time::timeout(self.timeout, self.api.predict(&request)).await {
            Ok(Ok(response)) => response,
            Ok(Err(e)) => {
                self.metrics.inc_prediction_errors();
                return Err(DashboardError::prediction_unavailable(&e));
            }
            Err(_) => {
                self.metrics.inc_prediction_errors();
                return Err(DashboardError::PredictionUnavailable {
                    reason: format!("no response within {}s", self.timeout.as_secs_f64()),
                });
            }
        };

        if !(0.0..=1.0).contains(&response.failure_probability) {
            self.metrics.inc_prediction_errors();
            return Err(DashboardError::PredictionUnavailable {
                reason: format!(
                    "failure probability {} outside [0, 1]",
                    response.failure_probability
                ),
            });
        }

        let elapsed = start.elapsed();
        self.metrics.observe_prediction_latency(elapsed.as_secs_f64());
        self.metrics.inc_predictions(response.decision);

        debug!(
            decision = %response.decision,
            failure_probability = response.failure_probability,
            elapsed_ms = elapsed.as_millis() as u64,
            "Prediction received"
        );

        Ok(PredictionResult {
            decision: response.decision,
            failure_probability: response.failure_probability,
            observed_at: chrono::Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        Alert, AlertId, Decision, PredictRequest, PredictResponse, ServiceStatus,
        SystemMetricSnapshot,
    };
    use anyhow::Result;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Answers every prediction with a fixed response and records requests
    struct FixedApi {
        response: Option<PredictResponse>,
        delay: Duration,
        requests: Mutex<Vec<PredictRequest>>,
    }

    #[async_trait]
    impl OpsApi for FixedApi {
        async fn predict(&self, request: &PredictRequest) -> Result<PredictResponse> {
            self.requests.lock().unwrap().push(request.clone());
            tokio::time::sleep(self.delay).await;
            self.response
                .clone()
                .ok_or_else(|| anyhow::anyhow!("connection refused"))
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

    fn api(response: Option<PredictResponse>, delay: Duration) -> Arc<FixedApi> {
        Arc::new(FixedApi {
            response,
            delay,
            requests: Mutex::new(Vec::new()),
        })
    }

    #[tokio::test]
    async fn test_predict_passes_sample_through() {
        let stub = api(
            Some(PredictResponse {
                decision: Decision::Rollback,
                failure_probability: 0.87,
            }),
            Duration::ZERO,
        );
        let client = PredictionClient::new(stub.clone(), Duration::from_secs(1));

        let result = client
            .predict(MetricSample::new(0.9, 0.9, 0.08, 350.0))
            .await
            .unwrap();

        assert_eq!(result.decision, Decision::Rollback);
        assert_eq!(result.failure_probability, 0.87);

        let requests = stub.requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].latency, 350.0);
    }

    #[tokio::test]
    async fn test_transport_failure_is_unavailable() {
        let client = PredictionClient::new(api(None, Duration::ZERO), Duration::from_secs(1));

        let err = client
            .predict(MetricSample::new(0.1, 0.1, 0.0, 100.0))
            .await
            .unwrap_err();

        assert!(matches!(err, DashboardError::PredictionUnavailable { .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_service_times_out() {
        let stub = api(
            Some(PredictResponse {
                decision: Decision::Proceed,
                failure_probability: 0.1,
            }),
            Duration::from_secs(30),
        );
        let client = PredictionClient::new(stub, Duration::from_secs(5));

        let err = client
            .predict(MetricSample::new(0.1, 0.1, 0.0, 100.0))
            .await
            .unwrap_err();

        match err {
            DashboardError::PredictionUnavailable { reason } => {
                assert!(reason.contains("no response"))
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_out_of_range_probability_rejected() {
        let stub = api(
            Some(PredictResponse {
                decision: Decision::Proceed,
                failure_probability: 1.4,
            }),
            Duration::ZERO,
        );
        let client = PredictionClient::new(stub, Duration::from_secs(1));

        assert!(client
            .predict(MetricSample::new(0.1, 0.1, 0.0, 100.0))
            .await
            .is_err());
    }
}
