//! CLI subcommands

pub mod alerts;
pub mod metrics;
pub mod predict;
pub mod watch;

use dashboard_lib::{DashboardState, OpsApi, SyncScheduler, HISTORY_CAPACITY};
use std::sync::Arc;
use std::time::Duration;

/// Scheduler wired to the given transport, left idle until activated
pub fn engine(api: Arc<dyn OpsApi>, request_timeout: Duration) -> SyncScheduler {
    let state = Arc::new(DashboardState::new(
        api.clone(),
        request_timeout,
        HISTORY_CAPACITY,
    ));
    SyncScheduler::builder(api, state)
        .request_timeout(request_timeout)
        .build()
}
