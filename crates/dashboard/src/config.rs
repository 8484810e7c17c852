//! Daemon configuration

use anyhow::Result;
use dashboard_lib::SchedulerConfig;
use serde::Deserialize;
use std::time::Duration;

/// Daemon configuration, read from `DASHBOARD_*` environment variables
#[derive(Debug, Clone, Deserialize)]
pub struct DashboardConfig {
    /// Base URL of the decision service
    #[serde(default = "default_api_endpoint")]
    pub api_endpoint: String,

    /// Port for the dashboard HTTP server
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,

    #[serde(default = "default_autonomous_interval")]
    pub autonomous_interval_secs: u64,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Enter autonomous mode right after activation
    #[serde(default)]
    pub autonomous_on_start: bool,
}

fn default_api_endpoint() -> String {
    "http://127.0.0.1:8000".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_poll_interval() -> u64 {
    10
}

fn default_autonomous_interval() -> u64 {
    3
}

fn default_request_timeout() -> u64 {
    10
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            api_endpoint: default_api_endpoint(),
            port: default_port(),
            poll_interval_secs: default_poll_interval(),
            autonomous_interval_secs: default_autonomous_interval(),
            request_timeout_secs: default_request_timeout(),
            autonomous_on_start: false,
        }
    }
}

impl DashboardConfig {
    /// Load configuration from the process environment
    pub fn load() -> Result<Self> {
        Self::from_env(config::Environment::with_prefix("DASHBOARD"))
    }

    fn from_env(env: config::Environment) -> Result<Self> {
        let config = config::Config::builder()
            .add_source(env.try_parsing(true))
            .build()?;

        let loaded: Self = config.try_deserialize()?;
        loaded.validate()?;
        Ok(loaded)
    }

    fn validate(&self) -> Result<()> {
        if self.poll_interval_secs == 0 || self.autonomous_interval_secs == 0 {
            anyhow::bail!("poll and autonomous intervals must be at least one second");
        }
        if self.request_timeout_secs == 0 {
            anyhow::bail!("request timeout must be at least one second");
        }
        Ok(())
    }

    pub fn scheduler_config(&self) -> SchedulerConfig {
        SchedulerConfig {
            poll_interval: Duration::from_secs(self.poll_interval_secs),
            autonomous_interval: Duration::from_secs(self.autonomous_interval_secs),
            request_timeout: Duration::from_secs(self.request_timeout_secs),
        }
    }
}
