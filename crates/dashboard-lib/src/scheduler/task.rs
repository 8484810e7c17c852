//! Cancellable repeating timer
//!
//! Each tick spawns its own future, so a slow cycle never delays the next
//! tick and overlapping cycles run side by side.

use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::debug;

/// When the first tick fires relative to arming
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FirstTick {
    Immediate,
    AfterPeriod,
}

/// Decrements the live-timer count when the timer future is dropped
struct AliveGuard(Arc<AtomicUsize>);

impl Drop for AliveGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Handle to a running repeating timer.
///
/// `cancel` is idempotent and dropping the handle cancels the timer. Tick
/// futures already spawned are left to finish on their own.
pub struct RepeatingTask {
    name: &'static str,
    handle: JoinHandle<()>,
    cancelled: AtomicBool,
}

impl RepeatingTask {
    /// Arm a timer that calls `on_tick` every `period`.
    ///
    /// `alive` counts timer loops that have not been torn down yet.
    pub fn spawn<F, Fut>(
        name: &'static str,
        period: Duration,
        first_tick: FirstTick,
        alive: Arc<AtomicUsize>,
        mut on_tick: F,
    ) -> Self
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let start = match first_tick {
            FirstTick::Immediate => Instant::now(),
            FirstTick::AfterPeriod => Instant::now() + period,
        };

        alive.fetch_add(1, Ordering::SeqCst);
        let guard = AliveGuard(alive);

        let handle = tokio::spawn(async move {
            let _guard = guard;
            let mut ticker = interval_at(start, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;
                debug!(timer = name, "Timer tick");
                tokio::spawn(on_tick());
            }
        });

        debug!(
            timer = name,
            period_ms = period.as_millis() as u64,
            "Timer armed"
        );

        Self {
            name,
            handle,
            cancelled: AtomicBool::new(false),
        }
    }

    pub fn cancel(&self) {
        if !self.cancelled.swap(true, Ordering::SeqCst) {
            self.handle.abort();
            debug!(timer = self.name, "Timer cancelled");
        }
    }

    pub fn is_active(&self) -> bool {
        !self.cancelled.load(Ordering::SeqCst) && !self.handle.is_finished()
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl Drop for RepeatingTask {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn settle() {
        for _ in 0..20 {
            tokio::task::yield_now().await;
        }
    }

    fn counting_task(
        first_tick: FirstTick,
        alive: Arc<AtomicUsize>,
    ) -> (RepeatingTask, Arc<AtomicUsize>) {
        let ticks = Arc::new(AtomicUsize::new(0));
        let counter = ticks.clone();
        let task = RepeatingTask::spawn("test", Duration::from_secs(3), first_tick, alive, move || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
            }
        });
        (task, ticks)
    }

    #[tokio::test(start_paused = true)]
    async fn test_immediate_first_tick() {
        let alive = Arc::new(AtomicUsize::new(0));
        let (_task, ticks) = counting_task(FirstTick::Immediate, alive);

        settle().await;
        assert_eq!(ticks.load(Ordering::SeqCst), 1);

        tokio::time::advance(Duration::from_secs(3)).await;
        settle().await;
        assert_eq!(ticks.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_delayed_first_tick() {
        let alive = Arc::new(AtomicUsize::new(0));
        let (_task, ticks) = counting_task(FirstTick::AfterPeriod, alive);

        settle().await;
        assert_eq!(ticks.load(Ordering::SeqCst), 0);

        for expected in 1..=3 {
            tokio::time::advance(Duration::from_secs(3)).await;
            settle().await;
            assert_eq!(ticks.load(Ordering::SeqCst), expected);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_is_idempotent_and_stops_ticks() {
        let alive = Arc::new(AtomicUsize::new(0));
        let (task, ticks) = counting_task(FirstTick::Immediate, alive.clone());
        settle().await;
        assert_eq!(alive.load(Ordering::SeqCst), 1);

        task.cancel();
        task.cancel();
        settle().await;
        assert!(!task.is_active());
        assert_eq!(alive.load(Ordering::SeqCst), 0);

        let before = ticks.load(Ordering::SeqCst);
        tokio::time::advance(Duration::from_secs(30)).await;
        settle().await;
        assert_eq!(ticks.load(Ordering::SeqCst), before);
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_cancels() {
        let alive = Arc::new(AtomicUsize::new(0));
        let (task, _ticks) = counting_task(FirstTick::Immediate, alive.clone());
        settle().await;

        drop(task);
        settle().await;
        assert_eq!(alive.load(Ordering::SeqCst), 0);
    }
}
