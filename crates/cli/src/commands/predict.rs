//! Prediction and rollback commands

use anyhow::Result;
use colored::Colorize;
use dashboard_lib::{HistoryEntry, PredictionResult, SampleForm, SyncScheduler};
use serde_json::json;
use tabled::Tabled;

use crate::output::{
    color_decision, format_probability, format_timestamp, print_json, print_success, print_table,
    print_warning, OutputFormat,
};

/// Row for the prediction history table
#[derive(Tabled)]
pub struct HistoryRow {
    #[tabled(rename = "Time")]
    time: String,
    #[tabled(rename = "Decision")]
    decision: String,
    #[tabled(rename = "Failure probability")]
    probability: String,
}

impl From<&HistoryEntry> for HistoryRow {
    fn from(entry: &HistoryEntry) -> Self {
        Self {
            time: entry.display_time.clone(),
            decision: color_decision(entry.result.decision),
            probability: format_probability(entry.result.failure_probability),
        }
    }
}

/// Submit one sample built from the form fields
pub async fn predict(
    scheduler: &SyncScheduler,
    form: SampleForm,
    format: OutputFormat,
) -> Result<()> {
    let result = scheduler.submit_form(&form).await?;
    render_result(&result, format)
}

pub fn render_result(result: &PredictionResult, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => print_json(result)?,
        OutputFormat::Table => {
            println!("{}", "Prediction".bold());
            println!("{}", "=".repeat(40));
            println!("Decision:             {}", color_decision(result.decision));
            println!(
                "Failure probability:  {}",
                format_probability(result.failure_probability)
            );
            println!(
                "Observed at:          {}",
                format_timestamp(&result.observed_at).dimmed()
            );
        }
    }
    Ok(())
}

/// Most recent first
pub fn render_history(entries: &[HistoryEntry]) {
    let rows: Vec<HistoryRow> = entries.iter().map(HistoryRow::from).collect();
    print_table(rows, "No predictions yet");
}

/// Ask the service to roll the current deployment back
pub async fn rollback(scheduler: &SyncScheduler, yes: bool, format: OutputFormat) -> Result<()> {
    if !yes {
        print_warning("Rolling back the current deployment. Pass --yes to confirm.");
        return Ok(());
    }

    scheduler.execute_rollback().await?;

    match format {
        OutputFormat::Json => print_json(&json!({ "status": "rollback_triggered" }))?,
        OutputFormat::Table => print_success("Rollback triggered"),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use dashboard_lib::{Decision, HistoryLog};

    #[test]
    fn test_history_rows_follow_log_order() {
        colored::control::set_override(false);

        let mut log = HistoryLog::new();
        for (decision, p) in [(Decision::Proceed, 0.1), (Decision::Rollback, 0.87)] {
            log.append(PredictionResult {
                decision,
                failure_probability: p,
                observed_at: chrono::Utc::now(),
            });
        }

        let rows: Vec<HistoryRow> = log.iter().map(HistoryRow::from).collect();
        assert_eq!(rows[0].decision, "ROLLBACK");
        assert_eq!(rows[0].probability, "87.0%");
        assert_eq!(rows[1].decision, "PROCEED");
    }
}
