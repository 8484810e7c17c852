//! System metrics and service status commands

use anyhow::{Context, Result};
use colored::Colorize;
use dashboard_lib::{OpsApi, SyncScheduler, SystemMetricSnapshot};
use tabled::Tabled;

use crate::output::{color_percent, format_timestamp, print_json, print_table, OutputFormat};

/// Row for the system metrics table
#[derive(Tabled)]
pub struct MetricRow {
    #[tabled(rename = "Time")]
    time: String,
    #[tabled(rename = "CPU")]
    cpu: String,
    #[tabled(rename = "Memory")]
    memory: String,
    #[tabled(rename = "Disk")]
    disk: String,
    #[tabled(rename = "Network I/O")]
    network_io: String,
}

impl From<&SystemMetricSnapshot> for MetricRow {
    fn from(snapshot: &SystemMetricSnapshot) -> Self {
        Self {
            time: format_timestamp(&snapshot.timestamp),
            cpu: color_percent(snapshot.cpu_usage_pct),
            memory: color_percent(snapshot.memory_usage_pct),
            disk: color_percent(snapshot.disk_usage_pct),
            network_io: snapshot
                .network_io
                .map(|v| format!("{:.2}", v))
                .unwrap_or_else(|| "-".to_string()),
        }
    }
}

/// Fetch and print the system metric snapshots
pub async fn show(scheduler: &SyncScheduler, format: OutputFormat) -> Result<()> {
    let store = &scheduler.state().system_metrics;
    store.refresh().await?;
    let snapshots = store.snapshot().await;

    match format {
        OutputFormat::Json => print_json(snapshots.as_slice())?,
        OutputFormat::Table => render(&snapshots),
    }
    Ok(())
}

pub fn render(snapshots: &[SystemMetricSnapshot]) {
    let rows: Vec<MetricRow> = snapshots.iter().map(MetricRow::from).collect();
    print_table(rows, "No system metrics reported");
}

/// Probe the service root
pub async fn status(api: &dyn OpsApi, api_url: &str, format: OutputFormat) -> Result<()> {
    let status = api
        .status()
        .await
        .with_context(|| format!("Decision service at {} is not reachable", api_url))?;

    match format {
        OutputFormat::Json => print_json(&status)?,
        OutputFormat::Table => {
            println!("{}", "Decision Service".bold());
            println!("{}", "=".repeat(40));
            println!("URL:     {}", api_url.cyan());
            println!("Status:  {}", status.status.green());
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_metric_row_formats_missing_network_io() {
        colored::control::set_override(false);

        let snapshot = SystemMetricSnapshot {
            timestamp: chrono::Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap(),
            cpu_usage_pct: 45.3,
            memory_usage_pct: 91.0,
            disk_usage_pct: 10.0,
            network_io: None,
        };

        let row = MetricRow::from(&snapshot);
        assert_eq!(row.cpu, "45.3%");
        assert_eq!(row.memory, "91.0%");
        assert_eq!(row.network_io, "-");
    }
}
