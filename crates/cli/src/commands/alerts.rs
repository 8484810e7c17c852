//! Alert commands

use anyhow::Result;
use dashboard_lib::{Alert, AlertId, SyncScheduler};
use serde_json::json;
use tabled::Tabled;

use crate::output::{
    color_severity, format_timestamp, print_json, print_success, print_table, OutputFormat,
};

/// Row for the alerts table
#[derive(Tabled)]
pub struct AlertRow {
    #[tabled(rename = "ID")]
    id: AlertId,
    #[tabled(rename = "Severity")]
    severity: String,
    #[tabled(rename = "Type")]
    alert_type: String,
    #[tabled(rename = "Message")]
    message: String,
    #[tabled(rename = "Raised")]
    raised: String,
}

impl From<&Alert> for AlertRow {
    fn from(alert: &Alert) -> Self {
        Self {
            id: alert.id,
            severity: color_severity(alert.severity),
            alert_type: alert.alert_type.clone(),
            message: alert.message.clone(),
            raised: format_timestamp(&alert.timestamp),
        }
    }
}

/// Fetch and print the active alerts
pub async fn list(scheduler: &SyncScheduler, format: OutputFormat) -> Result<()> {
    let alerts = &scheduler.state().alerts;
    alerts.refresh().await?;
    let snapshot = alerts.snapshot().await;

    match format {
        OutputFormat::Json => print_json(snapshot.as_slice())?,
        OutputFormat::Table => render(&snapshot),
    }
    Ok(())
}

pub fn render(alerts: &[Alert]) {
    let rows: Vec<AlertRow> = alerts.iter().map(AlertRow::from).collect();
    print_table(rows, "No active alerts");
}

pub async fn resolve(scheduler: &SyncScheduler, id: AlertId, format: OutputFormat) -> Result<()> {
    scheduler.resolve_alert(id).await?;

    match format {
        OutputFormat::Json => print_json(&json!({ "id": id, "resolved": true }))?,
        OutputFormat::Table => print_success(&format!("Alert {} resolved", id)),
    }
    Ok(())
}
