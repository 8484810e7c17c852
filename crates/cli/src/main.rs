//! NeurOps CLI
//!
//! Submits deployment samples for a PROCEED/ROLLBACK decision, manages
//! alerts and runs the interactive terminal dashboard.

mod commands;
mod config;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{alerts, metrics, predict, watch};
use dashboard_lib::{AlertId, HttpOpsApi, OpsApi, SampleForm};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// NeurOps deployment-risk dashboard
#[derive(Parser)]
#[command(name = "neurops")]
#[command(author, version, about = "Deployment-risk dashboard for the NeurOps decision service", long_about = None)]
pub struct Cli {
    /// Decision service URL (default http://127.0.0.1:8000)
    #[arg(long, env = "NEUROPS_API_URL")]
    pub api_url: Option<String>,

    /// Output format (falls back to the config file, then table)
    #[arg(long, short)]
    pub format: Option<output::OutputFormat>,

    /// Per-request timeout in seconds
    #[arg(long, default_value_t = 10)]
    pub timeout: u64,

    /// Log engine activity to stderr
    #[arg(long, short)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Submit one sample and print the decision
    Predict {
        /// CPU load, 0 to 1
        #[arg(long)]
        cpu_load: String,

        /// Memory usage, 0 to 1
        #[arg(long)]
        memory_usage: String,

        /// Error rate, 0 to 1
        #[arg(long)]
        error_rate: String,

        /// Latency in milliseconds
        #[arg(long)]
        latency: String,
    },

    /// Roll the current deployment back
    Rollback {
        /// Confirm the rollback
        #[arg(long)]
        yes: bool,
    },

    /// List or resolve alerts
    #[command(subcommand)]
    Alerts(AlertsCommands),

    /// Show system metric snapshots
    Metrics,

    /// Check that the decision service is reachable
    Status,

    /// Interactive dashboard with live polling
    Watch {
        /// Start with autonomous predictions enabled
        #[arg(long)]
        autonomous: bool,
    },
}

#[derive(Subcommand)]
pub enum AlertsCommands {
    /// List active alerts
    List,

    /// Resolve an alert
    Resolve {
        /// Alert ID
        id: AlertId,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.verbose {
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")),
            )
            .with_writer(std::io::stderr)
            .init();
    }

    let file_config = config::Config::load()?;
    let api_url = file_config.resolve_api_url(cli.api_url);
    let format = file_config.resolve_format(cli.format)?;
    let timeout = Duration::from_secs(cli.timeout.max(1));

    let api: Arc<dyn OpsApi> = Arc::new(HttpOpsApi::with_timeout(&api_url, timeout)?);
    let scheduler = commands::engine(api.clone(), timeout);

    match cli.command {
        Commands::Predict {
            cpu_load,
            memory_usage,
            error_rate,
            latency,
        } => {
            let form = SampleForm::new(cpu_load, memory_usage, error_rate, latency);
            predict::predict(&scheduler, form, format).await?;
        }
        Commands::Rollback { yes } => {
            predict::rollback(&scheduler, yes, format).await?;
        }
        Commands::Alerts(alerts_cmd) => match alerts_cmd {
            AlertsCommands::List => {
                alerts::list(&scheduler, format).await?;
            }
            AlertsCommands::Resolve { id } => {
                alerts::resolve(&scheduler, id, format).await?;
            }
        },
        Commands::Metrics => {
            metrics::show(&scheduler, format).await?;
        }
        Commands::Status => {
            metrics::status(api.as_ref(), &api_url, format).await?;
        }
        Commands::Watch { autonomous } => {
            watch::run(scheduler, autonomous).await?;
        }
    }

    Ok(())
}
