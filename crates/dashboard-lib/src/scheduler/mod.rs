//! Poll and autonomous-prediction scheduling
//!
//! The scheduler owns every recurring timer of the dashboard:
//! - a slow poll that refreshes alerts and system metrics
//! - a fast autonomous cadence that generates a synthetic sample, submits it
//!   and records the outcome
//!
//! Teardown advances the state's generation. Cycles capture the generation
//! when they start and their results are dropped if it moved while they were
//! waiting on the network.

mod task;


pub use task::{FirstTick, RepeatingTask};

use crate::api::OpsApi;
use crate::error::DashboardError;
use crate::form::SampleForm;
use crate::health::{components, HealthRegistry};
use crate::models::{AlertId, MetricSample, PredictionResult};
use crate::observability::{DashboardMetrics, StructuredLogger};
use crate::prediction::PredictionClient;
use crate::state::{DashboardState, DashboardView, Generation, ResultSource};
use crate::synthetic::SyntheticDriver;
use serde::Serialize;
use std::sync::atomic::{AtomicU8, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Default alert/metrics poll period
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(10);

/// Default autonomous prediction period
pub const DEFAULT_AUTONOMOUS_INTERVAL: Duration = Duration::from_secs(3);

/// Default bound on every network call
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

const POLL_TIMER: &str = "poll";
const AUTONOMOUS_TIMER: &str = "autonomous";

/// Configuration for the sync scheduler
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Interval between alert/metrics polls
    pub poll_interval: Duration,
    /// Interval between autonomous predictions
    pub autonomous_interval: Duration,
    /// Upper bound on a single network call
    pub request_timeout: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            autonomous_interval: DEFAULT_AUTONOMOUS_INTERVAL,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum SyncPhase {
    Idle = 0,
    PollingOnly = 1,
    PollingAndAutonomous = 2,
}

impl SyncPhase {
    fn from_u8(raw: u8) -> Self {
        match raw {
            1 => SyncPhase::PollingOnly,
            2 => SyncPhase::PollingAndAutonomous,
            _ => SyncPhase::Idle,
        }
    }
}

impl std::fmt::Display for SyncPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SyncPhase::Idle => write!(f, "idle"),
            SyncPhase::PollingOnly => write!(f, "polling"),
            SyncPhase::PollingAndAutonomous => write!(f, "polling+autonomous"),
        }
    }
}

/// Everything a cycle needs, shared between the scheduler and its timers
struct SyncContext {
    api: Arc<dyn OpsApi>,
    prediction: PredictionClient,
    state: Arc<DashboardState>,
    driver: Mutex<SyntheticDriver>,
    phase: AtomicU8,
    request_timeout: Duration,
    health: HealthRegistry,
    logger: StructuredLogger,
    metrics: DashboardMetrics,
}

impl SyncContext {
    fn generation(&self) -> &Generation {
        self.state.generation()
    }

    fn phase(&self) -> SyncPhase {
        SyncPhase::from_u8(self.phase.load(Ordering::SeqCst))
    }

    async fn poll_cycle(self: Arc<Self>) {
        let seen = self.generation().current();
        let (alerts, snapshots) = tokio::join!(
            self.state.alerts.fetch(),
            self.state.system_metrics.fetch()
        );

        match alerts {
            Ok(alerts) => {
                if !self.state.alerts.replace(seen, alerts).await {
                    debug!("Discarding alert poll after teardown");
                    return;
                }
                self.health.record_success(components::ALERTS_POLL).await;
            }
            Err(e) => self.poll_failed(seen, components::ALERTS_POLL, &e).await,
        }

        match snapshots {
            Ok(snapshots) => {
                if !self.state.system_metrics.replace(seen, snapshots).await {
                    debug!("Discarding metrics poll after teardown");
                    return;
                }
                self.health.record_success(components::METRICS_POLL).await;
            }
            Err(e) => self.poll_failed(seen, components::METRICS_POLL, &e).await,
        }
    }

    async fn poll_failed(&self, seen: u64, component: &str, error: &DashboardError) {
        if !self.generation().is_current(seen) {
            return;
        }
        self.logger.log_poll_failed(error);
        self.health
            .record_failure(component, error.to_string())
            .await;
    }

    async fn autonomous_cycle(self: Arc<Self>) {
        let seen = self.generation().current();
        let sample = self.driver.lock().await.generate();
        let outcome = self.prediction.predict(sample).await;
        // The outcome is already recorded; the caller is a detached tick
        let _ = self.apply(seen, ResultSource::Autonomous, outcome).await;
    }

    /// Record a prediction outcome in history and the current-result cell.
    ///
    /// State is written first, under the generation check; health and logs
    /// only follow for outcomes that were actually applied.
    async fn apply(
        &self,
        seen: u64,
        source: ResultSource,
        outcome: Result<PredictionResult, DashboardError>,
    ) -> Result<PredictionResult, DashboardError> {
        match outcome {
            Ok(result) => {
                let applied = self
                    .state
                    .record_prediction(seen, source, result.clone())
                    .await;
                if applied.is_none() {
                    debug!(?source, "Prediction completed after teardown, state left untouched");
                    return Ok(result);
                }
                self.logger.log_prediction(source, &result);
                self.health.record_success(components::PREDICTOR).await;
                Ok(result)
            }
            Err(e) => {
                if self.state.record_failure(seen, source, &e).await.is_none() {
                    debug!(?source, "Prediction failed after teardown, state left untouched");
                    return Err(e);
                }
                self.logger.log_prediction_failed(source, &e);
                self.health
                    .record_failure(components::PREDICTOR, e.to_string())
                    .await;
                Err(e)
            }
        }
    }
}

/// Cloneable access to the scheduler's shared state and on-demand operations.
///
/// Nothing here touches the timers, so callers can hold a handle across
/// network calls without blocking activation, toggling or teardown.
#[derive(Clone)]
pub struct SyncHandle {
    ctx: Arc<SyncContext>,
}

impl SyncHandle {
    pub fn phase(&self) -> SyncPhase {
        self.ctx.phase()
    }

    pub fn is_autonomous(&self) -> bool {
        self.phase() == SyncPhase::PollingAndAutonomous
    }

    pub fn state(&self) -> &Arc<DashboardState> {
        &self.ctx.state
    }

    pub fn health(&self) -> &HealthRegistry {
        &self.ctx.health
    }

    /// Submit a sample right away, independent of timer state
    pub async fn predict_now(
        &self,
        sample: MetricSample,
    ) -> Result<PredictionResult, DashboardError> {
        let seen = self.ctx.generation().current();
        let outcome = self.ctx.prediction.predict(sample).await;
        self.ctx.apply(seen, ResultSource::Manual, outcome).await
    }

    /// Validate operator input, then submit it
    pub async fn submit_form(
        &self,
        form: &SampleForm,
    ) -> Result<PredictionResult, DashboardError> {
        let sample = form.parse()?;
        self.predict_now(sample).await
    }

    /// Run one poll cycle outside the timer
    pub async fn refresh_now(&self) {
        self.ctx.clone().poll_cycle().await;
    }

    pub async fn resolve_alert(&self, id: AlertId) -> Result<(), DashboardError> {
        self.ctx.state.alerts.resolve(id).await?;
        self.ctx.logger.log_alert_resolved(id);
        Ok(())
    }

    /// Ask the service to roll the current deployment back
    pub async fn execute_rollback(&self) -> Result<(), DashboardError> {
        let outcome =
            tokio::time::timeout(self.ctx.request_timeout, self.ctx.api.trigger_rollback()).await;

        let result = match outcome {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(DashboardError::rollback_failed(&e)),
            Err(_) => Err(DashboardError::RollbackFailed {
                reason: format!(
                    "no response within {}s",
                    self.ctx.request_timeout.as_secs_f64()
                ),
            }),
        };

        self.ctx.logger.log_rollback(result.as_ref().err());
        result
    }

    pub async fn view(&self) -> DashboardView {
        self.ctx.state.view(self.phase()).await
    }
}

/// Owner of the poll and autonomous timers.
///
/// Dropping the scheduler tears it down.
pub struct SyncScheduler {
    handle: SyncHandle,
    config: SchedulerConfig,
    poll_task: Option<RepeatingTask>,
    autonomous_task: Option<RepeatingTask>,
    timers_alive: Arc<AtomicUsize>,
}

impl SyncScheduler {
    pub fn new(api: Arc<dyn OpsApi>, state: Arc<DashboardState>, config: SchedulerConfig) -> Self {
        SyncSchedulerBuilder::new(api, state).config(config).build()
    }

    pub fn builder(api: Arc<dyn OpsApi>, state: Arc<DashboardState>) -> SyncSchedulerBuilder {
        SyncSchedulerBuilder::new(api, state)
    }

    /// A handle for the on-demand operations
    pub fn handle(&self) -> SyncHandle {
        self.handle.clone()
    }

    pub fn phase(&self) -> SyncPhase {
        self.handle.phase()
    }

    pub fn state(&self) -> &Arc<DashboardState> {
        self.handle.state()
    }

    pub fn health(&self) -> &HealthRegistry {
        self.handle.health()
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    pub fn is_autonomous(&self) -> bool {
        self.handle.is_autonomous()
    }

    /// Timers currently armed by this scheduler
    pub fn active_timers(&self) -> usize {
        [&self.poll_task, &self.autonomous_task]
            .iter()
            .filter(|t| t.as_ref().map(|t| t.is_active()).unwrap_or(false))
            .count()
    }

    /// Timer loops that are still alive on the runtime, cancelled or not
    pub fn live_timer_loops(&self) -> usize {
        self.timers_alive.load(Ordering::SeqCst)
    }

    /// `Idle -> PollingOnly`. No-op when already active.
    pub fn activate(&mut self) {
        if self.phase() != SyncPhase::Idle {
            debug!(phase = %self.phase(), "Scheduler already active");
            return;
        }

        self.arm_poll();
        self.transition(SyncPhase::PollingOnly);
    }

    /// Enter or leave autonomous mode. Ignored while idle.
    pub fn set_autonomous(&mut self, enabled: bool) -> SyncPhase {
        match (self.phase(), enabled) {
            (SyncPhase::Idle, _) => {
                warn!("Autonomous mode requested while scheduler is idle, ignoring");
            }
            (SyncPhase::PollingOnly, true) => {
                self.arm_autonomous();
                self.transition(SyncPhase::PollingAndAutonomous);
            }
            (SyncPhase::PollingAndAutonomous, false) => {
                if let Some(task) = self.autonomous_task.take() {
                    task.cancel();
                }
                self.transition(SyncPhase::PollingOnly);
            }
            _ => {}
        }
        self.phase()
    }

    pub fn toggle_autonomous(&mut self) -> SyncPhase {
        let enable = !self.is_autonomous();
        self.set_autonomous(enable)
    }

    /// `* -> Idle`. Cancels both timers and invalidates in-flight cycles.
    /// Safe to call repeatedly.
    pub fn teardown(&mut self) {
        self.handle.ctx.generation().advance();
        self.cancel_timers();
        if self.phase() != SyncPhase::Idle {
            self.transition(SyncPhase::Idle);
        }
    }

    pub async fn predict_now(
        &self,
        sample: MetricSample,
    ) -> Result<PredictionResult, DashboardError> {
        self.handle.predict_now(sample).await
    }

    pub async fn submit_form(
        &self,
        form: &SampleForm,
    ) -> Result<PredictionResult, DashboardError> {
        self.handle.submit_form(form).await
    }

    pub async fn refresh_now(&self) {
        self.handle.refresh_now().await
    }

    pub async fn resolve_alert(&self, id: AlertId) -> Result<(), DashboardError> {
        self.handle.resolve_alert(id).await
    }

    pub async fn execute_rollback(&self) -> Result<(), DashboardError> {
        self.handle.execute_rollback().await
    }

    pub async fn view(&self) -> DashboardView {
        self.handle.view().await
    }

    fn cancel_timers(&mut self) {
        for task in [self.poll_task.take(), self.autonomous_task.take()]
            .into_iter()
            .flatten()
        {
            task.cancel();
        }
    }

    fn arm_poll(&mut self) {
        if let Some(previous) = self.poll_task.take() {
            previous.cancel();
        }
        let ctx = self.handle.ctx.clone();
        self.poll_task = Some(RepeatingTask::spawn(
            POLL_TIMER,
            self.config.poll_interval,
            FirstTick::Immediate,
            self.timers_alive.clone(),
            move || ctx.clone().poll_cycle(),
        ));
    }

    fn arm_autonomous(&mut self) {
        if let Some(previous) = self.autonomous_task.take() {
            previous.cancel();
        }
        let ctx = self.handle.ctx.clone();
        self.autonomous_task = Some(RepeatingTask::spawn(
            AUTONOMOUS_TIMER,
            self.config.autonomous_interval,
            FirstTick::AfterPeriod,
            self.timers_alive.clone(),
            move || ctx.clone().autonomous_cycle(),
        ));
    }

    fn transition(&mut self, to: SyncPhase) {
        let ctx = &self.handle.ctx;
        let from = ctx.phase();
        ctx.phase.store(to as u8, Ordering::SeqCst);
        ctx.metrics
            .set_autonomous_mode(to == SyncPhase::PollingAndAutonomous);
        ctx.logger.log_phase_change(from, to);
    }
}

impl Drop for SyncScheduler {
    fn drop(&mut self) {
        self.handle.ctx.generation().advance();
        self.cancel_timers();
        if self.phase() != SyncPhase::Idle {
            info!(phase = %self.phase(), "Scheduler dropped while active, timers cancelled");
        }
    }
}

/// Builder for the sync scheduler
pub struct SyncSchedulerBuilder {
    api: Arc<dyn OpsApi>,
    state: Arc<DashboardState>,
    config: SchedulerConfig,
    driver: Option<SyntheticDriver>,
    health: Option<HealthRegistry>,
    logger: Option<StructuredLogger>,
}

impl SyncSchedulerBuilder {
    pub fn new(api: Arc<dyn OpsApi>, state: Arc<DashboardState>) -> Self {
        Self {
            api,
            state,
            config: SchedulerConfig::default(),
            driver: None,
            health: None,
            logger: None,
        }
    }

    pub fn config(mut self, config: SchedulerConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the poll interval
    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.config.poll_interval = interval;
        self
    }

    /// Set the autonomous prediction interval
    pub fn autonomous_interval(mut self, interval: Duration) -> Self {
        self.config.autonomous_interval = interval;
        self
    }

    /// Set the per-call network timeout
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.config.request_timeout = timeout;
        self
    }

    /// Use a specific generator, e.g. a seeded one
    pub fn driver(mut self, driver: SyntheticDriver) -> Self {
        self.driver = Some(driver);
        self
    }

    /// Report component health into an existing registry
    pub fn health(mut self, health: HealthRegistry) -> Self {
        self.health = Some(health);
        self
    }

    pub fn logger(mut self, logger: StructuredLogger) -> Self {
        self.logger = Some(logger);
        self
    }

    pub fn build(self) -> SyncScheduler {
        let prediction = PredictionClient::new(self.api.clone(), self.config.request_timeout);
        let ctx = SyncContext {
            api: self.api,
            prediction,
            state: self.state,
            driver: Mutex::new(self.driver.unwrap_or_default()),
            phase: AtomicU8::new(SyncPhase::Idle as u8),
            request_timeout: self.config.request_timeout,
            health: self.health.unwrap_or_default(),
            logger: self
                .logger
                .unwrap_or_else(|| StructuredLogger::new("dashboard")),
            metrics: DashboardMetrics::new(),
        };

        SyncScheduler {
            handle: SyncHandle { ctx: Arc::new(ctx) },
            config: self.config,
            poll_task: None,
            autonomous_task: None,
            timers_alive: Arc::new(AtomicUsize::new(0)),
        }
    }
}
