//! Transport to the remote decision/ops service
//!
//! `OpsApi` is the seam between the synchronization engine and the network.
//! `HttpOpsApi` speaks JSON over HTTP; tests substitute their own
//! implementations.

use crate::models::{
    Alert, AlertId, PredictRequest, PredictResponse, ServiceStatus, SystemMetricSnapshot,
};
use crate::scheduler::DEFAULT_REQUEST_TIMEOUT;
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::{de::DeserializeOwned, Serialize};
use std::time::Duration;
use url::Url;

/// Logical operations offered by the remote service
#[async_trait]
pub trait OpsApi: Send + Sync {
    /// `POST /predict`
    async fn predict(&self, request: &PredictRequest) -> Result<PredictResponse>;

    /// `GET /alerts`
    async fn list_alerts(&self) -> Result<Vec<Alert>>;

    /// `POST /alerts/{id}/resolve`
    async fn resolve_alert(&self, id: AlertId) -> Result<()>;

    /// `GET /system-metrics`
    async fn list_system_metrics(&self) -> Result<Vec<SystemMetricSnapshot>>;

    /// `POST /rollback`
    async fn trigger_rollback(&self) -> Result<()>;

    /// `GET /`
    async fn status(&self) -> Result<ServiceStatus>;
}

/// JSON-over-HTTP client for the ops service
#[derive(Debug, Clone)]
pub struct HttpOpsApi {
    client: Client,
    base_url: Url,
}

impl HttpOpsApi {
    /// Create a new client with the default timeout
    pub fn new(base_url: &str) -> Result<Self> {
        Self::with_timeout(base_url, DEFAULT_REQUEST_TIMEOUT)
    }

    /// Create a new client with an explicit per-request timeout
    pub fn with_timeout(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client")?;

        // Relative joins drop the last path segment unless it ends in '/'
        let normalized = if base_url.ends_with('/') {
            base_url.to_string()
        } else {
            format!("{}/", base_url)
        };
        let base_url = Url::parse(&normalized).context("Invalid API URL")?;

        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = self.base_url.join(path).context("Invalid path")?;

        let response = self
            .client
            .get(url)
            .send()
            .await
            .context("Failed to send request")?;

        check_status(response)
            .await?
            .json()
            .await
            .context("Failed to parse response")
    }

    async fn post<T: DeserializeOwned, B: Serialize>(&self, path: &str, body: &B) -> Result<T> {
        let url = self.base_url.join(path).context("Invalid path")?;

        let response = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .context("Failed to send request")?;

        check_status(response)
            .await?
            .json()
            .await
            .context("Failed to parse response")
    }

    /// POST without a body contract; only the status code matters
    async fn post_ack(&self, path: &str) -> Result<()> {
        let url = self.base_url.join(path).context("Invalid path")?;

        let response = self
            .client
            .post(url)
            .send()
            .await
            .context("Failed to send request")?;

        check_status(response).await?;
        Ok(())
    }
}

async fn check_status(response: Response) -> Result<Response> {
    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        anyhow::bail!("API error ({}): {}", status, body);
    }
    Ok(response)
}

#[async_trait]
impl OpsApi for HttpOpsApi {
    async fn predict(&self, request: &PredictRequest) -> Result<PredictResponse> {
        self.post("predict", request).await
    }

    async fn list_alerts(&self) -> Result<Vec<Alert>> {
        self.get("alerts").await
    }

    async fn resolve_alert(&self, id: AlertId) -> Result<()> {
        self.post_ack(&format!("alerts/{}/resolve", id)).await
    }

    async fn list_system_metrics(&self) -> Result<Vec<SystemMetricSnapshot>> {
        self.get("system-metrics").await
    }

    async fn trigger_rollback(&self) -> Result<()> {
        self.post_ack("rollback").await
    }

    async fn status(&self) -> Result<ServiceStatus> {
        self.get("").await
    }
}
