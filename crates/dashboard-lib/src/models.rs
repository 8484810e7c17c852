//! Core data models for the dashboard

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single measurement submitted for prediction
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricSample {
    pub cpu_load: f64,
    pub memory_usage: f64,
    pub error_rate: f64,
    pub latency_ms: f64,
}

impl MetricSample {
    pub fn new(cpu_load: f64, memory_usage: f64, error_rate: f64, latency_ms: f64) -> Self {
        Self {
            cpu_load,
            memory_usage,
            error_rate,
            latency_ms,
        }
    }

    /// Body for `POST /predict`
    pub fn to_request(&self) -> PredictRequest {
        PredictRequest {
            cpu_load: self.cpu_load,
            memory_usage: self.memory_usage,
            error_rate: self.error_rate,
            latency: self.latency_ms,
        }
    }
}

/// Binary output of the decision service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Decision {
    Proceed,
    Rollback,
}

impl Decision {
    pub fn as_str(&self) -> &'static str {
        match self {
            Decision::Proceed => "PROCEED",
            Decision::Rollback => "ROLLBACK",
        }
    }
}

impl std::fmt::Display for Decision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of one prediction round-trip
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    pub decision: Decision,
    pub failure_probability: f64,
    pub observed_at: DateTime<Utc>,
}

/// Wire body for `POST /predict`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictRequest {
    pub cpu_load: f64,
    pub memory_usage: f64,
    pub error_rate: f64,
    pub latency: f64,
}

/// Wire response of `POST /predict`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictResponse {
    pub decision: Decision,
    pub failure_probability: f64,
}

pub type AlertId = i64;

/// Alert severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    #[serde(alias = "low")]
    Low,
    #[serde(alias = "medium")]
    Medium,
    #[serde(alias = "high")]
    High,
    #[serde(alias = "critical")]
    Critical,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Low => write!(f, "LOW"),
            Severity::Medium => write!(f, "MEDIUM"),
            Severity::High => write!(f, "HIGH"),
            Severity::Critical => write!(f, "CRITICAL"),
        }
    }
}

/// Alert raised by the ops service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub id: AlertId,
    pub alert_type: String,
    pub severity: Severity,
    pub message: String,
    #[serde(with = "timestamp")]
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub resolved: bool,
}

/// Point-in-time host health figures reported by the ops service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemMetricSnapshot {
    #[serde(with = "timestamp")]
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "cpu_usage", alias = "cpu_usage_pct")]
    pub cpu_usage_pct: f64,
    #[serde(rename = "memory_usage", alias = "memory_usage_pct")]
    pub memory_usage_pct: f64,
    #[serde(rename = "disk_usage", alias = "disk_usage_pct")]
    pub disk_usage_pct: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network_io: Option<f64>,
}

/// Response of the service root probe
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceStatus {
    pub status: String,
}

/// Timestamps come back either as RFC 3339 or as naive ISO-8601 in UTC.
pub mod timestamp {
    use chrono::{DateTime, NaiveDateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    const NAIVE_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

    pub fn parse(raw: &str) -> Option<DateTime<Utc>> {
        if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
            return Some(dt.with_timezone(&Utc));
        }
        NAIVE_FORMATS
            .iter()
            .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
            .map(|naive| naive.and_utc())
    }

    pub fn serialize<S: Serializer>(ts: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&ts.to_rfc3339())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp: {}", raw)))
    }
}
