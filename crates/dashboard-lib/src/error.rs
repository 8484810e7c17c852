//! Error taxonomy for the dashboard
//!
//! Transport code works with `anyhow`; every failure is converted into one
//! of these kinds at the point where the network call is issued.

use crate::models::AlertId;
use thiserror::Error;

/// Malformed or missing numeric input. The request is never sent.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("{field} is required")]
    Missing { field: &'static str },

    #[error("{field} must be a number, got {value:?}")]
    NotANumber { field: &'static str, value: String },

    #[error("{field} must be a finite number")]
    NotFinite { field: &'static str },

    #[error("{field} must be between {min} and {max}, got {value}")]
    OutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },
}

impl ValidationError {
    /// Name of the offending form field
    pub fn field(&self) -> &'static str {
        match self {
            ValidationError::Missing { field }
            | ValidationError::NotANumber { field, .. }
            | ValidationError::NotFinite { field }
            | ValidationError::OutOfRange { field, .. } => field,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum DashboardError {
    #[error("invalid input: {0}")]
    Validation(#[from] ValidationError),

    #[error("prediction service unavailable: {reason}")]
    PredictionUnavailable { reason: String },

    #[error("failed to fetch {resource}: {reason}")]
    FetchFailed {
        resource: &'static str,
        reason: String,
    },

    #[error("failed to resolve alert {id}: {reason}")]
    ResolveFailed { id: AlertId, reason: String },

    #[error("rollback failed: {reason}")]
    RollbackFailed { reason: String },
}

impl DashboardError {
    pub fn prediction_unavailable(err: &anyhow::Error) -> Self {
        DashboardError::PredictionUnavailable {
            reason: format!("{:#}", err),
        }
    }

    pub fn fetch_failed(resource: &'static str, err: &anyhow::Error) -> Self {
        DashboardError::FetchFailed {
            resource,
            reason: format!("{:#}", err),
        }
    }

    pub fn resolve_failed(id: AlertId, err: &anyhow::Error) -> Self {
        DashboardError::ResolveFailed {
            id,
            reason: format!("{:#}", err),
        }
    }

    pub fn rollback_failed(err: &anyhow::Error) -> Self {
        DashboardError::RollbackFailed {
            reason: format!("{:#}", err),
        }
    }

    /// Short label used in logs and metrics
    pub fn kind(&self) -> &'static str {
        match self {
            DashboardError::Validation(_) => "validation",
            DashboardError::PredictionUnavailable { .. } => "prediction_unavailable",
            DashboardError::FetchFailed { .. } => "fetch_failed",
            DashboardError::ResolveFailed { .. } => "resolve_failed",
            DashboardError::RollbackFailed { .. } => "rollback_failed",
        }
    }
}
