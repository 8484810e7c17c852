//! Operator input for manual predictions
//!
//! The four fields arrive as raw text and are validated before any request
//! goes out.

use crate::error::ValidationError;
use crate::models::MetricSample;
use serde::{Deserialize, Serialize};

/// Raw form fields as typed by the operator
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SampleForm {
    #[serde(default)]
    pub cpu_load: String,
    #[serde(default)]
    pub memory_usage: String,
    #[serde(default)]
    pub error_rate: String,
    #[serde(default)]
    pub latency: String,
}

impl SampleForm {
    pub fn new(
        cpu_load: impl Into<String>,
        memory_usage: impl Into<String>,
        error_rate: impl Into<String>,
        latency: impl Into<String>,
    ) -> Self {
        Self {
            cpu_load: cpu_load.into(),
            memory_usage: memory_usage.into(),
            error_rate: error_rate.into(),
            latency: latency.into(),
        }
    }

    /// Validate every field, reporting the first failure in form order
    pub fn parse(&self) -> Result<MetricSample, ValidationError> {
        let cpu_load = parse_ratio("cpu_load", &self.cpu_load)?;
        let memory_usage = parse_ratio("memory_usage", &self.memory_usage)?;
        let error_rate = parse_ratio("error_rate", &self.error_rate)?;
        let latency_ms = parse_number("latency", &self.latency)?;
        if latency_ms < 0.0 {
            return Err(ValidationError::OutOfRange {
                field: "latency",
                value: latency_ms,
                min: 0.0,
                max: f64::INFINITY,
            });
        }

        Ok(MetricSample::new(cpu_load, memory_usage, error_rate, latency_ms))
    }
}

fn parse_number(field: &'static str, raw: &str) -> Result<f64, ValidationError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::Missing { field });
    }

    let value: f64 = trimmed.parse().map_err(|_| ValidationError::NotANumber {
        field,
        value: trimmed.to_string(),
    })?;

    if !value.is_finite() {
        return Err(ValidationError::NotFinite { field });
    }

    Ok(value)
}

fn parse_ratio(field: &'static str, raw: &str) -> Result<f64, ValidationError> {
    let value = parse_number(field, raw)?;
    if !(0.0..=1.0).contains(&value) {
        return Err(ValidationError::OutOfRange {
            field,
            value,
            min: 0.0,
            max: 1.0,
        });
    }
    Ok(value)
}
