//! Interactive terminal dashboard
//!
//! Runs the sync scheduler in the foreground and reads one command per line
//! from stdin. New results from either producer are announced as they land.

use anyhow::Result;
use colored::Colorize;
use dashboard_lib::{
    AlertId, CurrentResult, DashboardError, Outcome, ResultSource, SampleForm, SyncScheduler,
};
use std::time::Duration;
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::debug;

use super::{alerts, metrics, predict};
use crate::output::{
    color_decision, format_probability, print_error, print_info, print_success, OutputFormat,
};

/// How often the loop checks for a new current result
const REFRESH_INTERVAL: Duration = Duration::from_millis(500);

const HELP: &str = "\
Commands:
  a                          toggle autonomous mode
  p <cpu> <mem> <err> <lat>  submit a manual prediction
  r <id>                     resolve an alert
  x                          execute rollback
  f                          refresh alerts and metrics now
  1 / 2 / 3                  show predictions / alerts / metrics
  h                          show this help
  q                          quit";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    Predictions,
    Alerts,
    Metrics,
}

#[derive(Debug, Clone)]
pub enum WatchCommand {
    ToggleAutonomous,
    Predict(SampleForm),
    Resolve(AlertId),
    Rollback,
    Refresh,
    Show(Tab),
    Help,
    Quit,
}

#[derive(Debug, Error, PartialEq)]
pub enum CommandError {
    #[error("unknown command {0:?}, type h for help")]
    Unknown(String),

    #[error("usage: {0}")]
    Usage(&'static str),

    #[error("alert id must be an integer, got {0:?}")]
    InvalidId(String),
}

/// Parse one input line. Blank lines yield `None`.
pub fn parse_command(line: &str) -> Result<Option<WatchCommand>, CommandError> {
    let mut words = line.split_whitespace();
    let Some(head) = words.next() else {
        return Ok(None);
    };
    let args: Vec<&str> = words.collect();

    let command = match (head, args.as_slice()) {
        ("a", []) => WatchCommand::ToggleAutonomous,
        ("p", [cpu, mem, err, lat]) => {
            WatchCommand::Predict(SampleForm::new(*cpu, *mem, *err, *lat))
        }
        ("p", _) => return Err(CommandError::Usage("p <cpu> <mem> <err> <lat>")),
        ("r", [id]) => WatchCommand::Resolve(
            id.parse()
                .map_err(|_| CommandError::InvalidId(id.to_string()))?,
        ),
        ("r", _) => return Err(CommandError::Usage("r <id>")),
        ("x", []) => WatchCommand::Rollback,
        ("f", []) => WatchCommand::Refresh,
        ("1", []) => WatchCommand::Show(Tab::Predictions),
        ("2", []) => WatchCommand::Show(Tab::Alerts),
        ("3", []) => WatchCommand::Show(Tab::Metrics),
        ("h" | "?", []) => WatchCommand::Help,
        ("q", []) => WatchCommand::Quit,
        _ => return Err(CommandError::Unknown(line.trim().to_string())),
    };

    Ok(Some(command))
}

/// Run until `q` or end of input, then tear the scheduler down
pub async fn run(mut scheduler: SyncScheduler, autonomous: bool) -> Result<()> {
    scheduler.activate();
    if autonomous {
        scheduler.set_autonomous(true);
    }

    println!("{}", "NeurOps Dashboard".bold());
    println!("{}", HELP.dimmed());

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut ticker = tokio::time::interval(REFRESH_INTERVAL);
    let mut tab = Tab::Predictions;
    let mut last_seq = 0;

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    debug!("stdin closed");
                    break;
                };
                match parse_command(&line) {
                    Ok(None) => {}
                    Ok(Some(WatchCommand::Quit)) => break,
                    Ok(Some(command)) => {
                        let (next, manual_shown) = execute(&mut scheduler, command, tab).await;
                        tab = next;
                        last_seq = catch_up(&scheduler, last_seq, manual_shown).await;
                    }
                    Err(e) => print_error(&e.to_string()),
                }
            }
            _ = ticker.tick() => {
                last_seq = catch_up(&scheduler, last_seq, false).await;
            }
        }
    }

    scheduler.teardown();
    print_info("Dashboard stopped");
    Ok(())
}

/// What a catch-up pass should print
#[derive(Debug, PartialEq, Eq)]
struct CatchUp {
    announce_current: bool,
    skipped: u64,
}

/// Decide what to print for the results that landed after `last_seq`.
///
/// `manual_shown` means a manual result was printed and recorded since then;
/// it counts as seen. Results overwritten before the check are reported as
/// a count, since only the newest stays in the current-result cell.
fn plan_catch_up(current: &CurrentResult, last_seq: u64, manual_shown: bool) -> CatchUp {
    let mut unseen = current.seq.saturating_sub(last_seq);
    if unseen == 0 {
        return CatchUp {
            announce_current: false,
            skipped: 0,
        };
    }
    if manual_shown {
        unseen -= 1;
    }

    let announce_current = !(manual_shown && current.source == ResultSource::Manual);
    if announce_current {
        unseen = unseen.saturating_sub(1);
    }

    CatchUp {
        announce_current,
        skipped: unseen,
    }
}

/// Print whatever landed since `last_seq` and return the new high-water mark
async fn catch_up(scheduler: &SyncScheduler, last_seq: u64, manual_shown: bool) -> u64 {
    let Some(current) = scheduler.state().current().await else {
        return last_seq;
    };

    let plan = plan_catch_up(&current, last_seq, manual_shown);
    if plan.skipped > 0 {
        print_info(&format!(
            "{} more result(s) landed meanwhile, press 1 for history",
            plan.skipped
        ));
    }
    if plan.announce_current {
        announce(&current);
    }
    current.seq.max(last_seq)
}

/// Apply a command. Returns the tab to keep showing and whether a manual
/// result was printed and recorded.
async fn execute(scheduler: &mut SyncScheduler, command: WatchCommand, tab: Tab) -> (Tab, bool) {
    match command {
        WatchCommand::ToggleAutonomous => {
            let phase = scheduler.toggle_autonomous();
            print_info(&format!("Phase: {}", phase));
            (tab, false)
        }
        WatchCommand::Predict(form) => {
            let outcome = scheduler.submit_form(&form).await;
            let recorded = !matches!(outcome, Err(DashboardError::Validation(_)));
            match outcome {
                Ok(result) => {
                    if let Err(e) = predict::render_result(&result, OutputFormat::Table) {
                        print_error(&e.to_string());
                    }
                }
                Err(e) => print_error(&e.to_string()),
            }
            (Tab::Predictions, recorded)
        }
        WatchCommand::Resolve(id) => {
            match scheduler.resolve_alert(id).await {
                Ok(()) => print_success(&format!("Alert {} resolved", id)),
                Err(e) => print_error(&e.to_string()),
            }
            render(scheduler, Tab::Alerts).await;
            (Tab::Alerts, false)
        }
        WatchCommand::Rollback => {
            match scheduler.execute_rollback().await {
                Ok(()) => print_success("Rollback triggered"),
                Err(e) => print_error(&e.to_string()),
            }
            (tab, false)
        }
        WatchCommand::Refresh => {
            scheduler.refresh_now().await;
            render(scheduler, tab).await;
            (tab, false)
        }
        WatchCommand::Show(next) => {
            render(scheduler, next).await;
            (next, false)
        }
        WatchCommand::Help => {
            println!("{}", HELP);
            (tab, false)
        }
        WatchCommand::Quit => (tab, false),
    }
}

async fn render(scheduler: &SyncScheduler, tab: Tab) {
    let view = scheduler.view().await;

    println!(
        "{} {}  {} {}  {} {}",
        "phase:".dimmed(),
        view.phase.to_string().cyan(),
        "alerts:".dimmed(),
        view.alerts.len(),
        "history:".dimmed(),
        view.history.len()
    );

    match tab {
        Tab::Predictions => predict::render_history(&view.history),
        Tab::Alerts => alerts::render(&view.alerts),
        Tab::Metrics => metrics::render(&view.system_metrics),
    }
}

fn announce(current: &CurrentResult) {
    let source = format!("[{:?}]", current.source).to_lowercase().dimmed();
    match &current.outcome {
        Outcome::Prediction(result) => println!(
            "{} {} {}",
            source,
            color_decision(result.decision),
            format_probability(result.failure_probability)
        ),
        Outcome::Error { message } => {
            println!("{} {}", source, message.red());
        }
    }
}
