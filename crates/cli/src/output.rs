//! Output formatting utilities

use anyhow::Result;
use chrono::{DateTime, Local, Utc};
use clap::ValueEnum;
use colored::Colorize;
use dashboard_lib::{Decision, Severity};
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

/// Output format for CLI commands
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
    /// Table format (default)
    #[default]
    Table,
    /// JSON format
    Json,
}

/// Print rows as a rounded table, or a placeholder when there are none
pub fn print_table<T: Tabled>(rows: Vec<T>, empty_message: &str) {
    if rows.is_empty() {
        println!("{}", empty_message.yellow());
        return;
    }
    let table = Table::new(rows).with(Style::rounded()).to_string();
    println!("{}", table);
}

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub fn print_success(message: &str) {
    println!("{} {}", "✓".green().bold(), message);
}

pub fn print_error(message: &str) {
    eprintln!("{} {}", "✗".red().bold(), message);
}

pub fn print_warning(message: &str) {
    println!("{} {}", "⚠".yellow().bold(), message);
}

pub fn print_info(message: &str) {
    println!("{} {}", "ℹ".blue().bold(), message);
}

/// Failure probability as a percentage with one decimal
pub fn format_probability(probability: f64) -> String {
    format!("{:.1}%", probability * 100.0)
}

pub fn color_decision(decision: Decision) -> String {
    match decision {
        Decision::Proceed => decision.as_str().green().bold().to_string(),
        Decision::Rollback => decision.as_str().red().bold().to_string(),
    }
}

pub fn color_severity(severity: Severity) -> String {
    let label = severity.to_string();
    match severity {
        Severity::Low => label.dimmed().to_string(),
        Severity::Medium => label.yellow().to_string(),
        Severity::High => label.red().to_string(),
        Severity::Critical => label.red().bold().to_string(),
    }
}

/// Color a percentage reading by how close it is to saturation
pub fn color_percent(value: f64) -> String {
    let formatted = format!("{:.1}%", value);
    if value >= 90.0 {
        formatted.red().to_string()
    } else if value >= 75.0 {
        formatted.yellow().to_string()
    } else {
        formatted.green().to_string()
    }
}

/// Local wall-clock time for display
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.with_timezone(&Local)
        .format("%Y-%m-%d %H:%M:%S")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_probability() {
        assert_eq!(format_probability(0.87), "87.0%");
        assert_eq!(format_probability(0.0), "0.0%");
        assert_eq!(format_probability(0.1234), "12.3%");
    }

    #[test]
    fn test_color_decision_keeps_label() {
        colored::control::set_override(false);
        assert_eq!(color_decision(Decision::Rollback), "ROLLBACK");
        assert_eq!(color_decision(Decision::Proceed), "PROCEED");
    }

    #[test]
    fn test_color_percent_keeps_value() {
        colored::control::set_override(false);
        assert_eq!(color_percent(95.04), "95.0%");
        assert_eq!(color_percent(12.0), "12.0%");
    }
}
