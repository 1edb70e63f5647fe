//! PollingScheduler processor.
//!
//! The PollingScheduler is responsible for:
//! - Owning one recurring timer per live event, keyed by event id
//! - Dispatching a [`PollTick`] to the [`Poller`] at every period boundary
//! - Bounding concurrent ticks with a fixed-size worker pool
//! - Stopping the timer of an event whose tick reports it is no longer live
//! - Cancelling every timer on shutdown and draining in-flight ticks within
//!   a grace period
//!
//! Scheduling is fixed-rate: a tick is dispatched at every boundary even if
//! the previous tick for the same event is still running, so ticks of one
//! event may overlap when a fetch or publish overruns the period. Stopping a
//! timer never interrupts a tick that is already running.
//!
//! Each timer gets a generation number. A tick that finds its event not live
//! only stops the timer of its own generation, so a late tick from a replaced
//! timer cannot cancel the replacement.
//!
//! When the pool is saturated a tick waits for a worker permit. The
//! generation is checked again once the permit is granted, so a tick that was
//! queued before `stop` or a replacing `start` never polls. A timer has at
//! most one tick waiting at a time; boundaries reached while it is still
//! queued are skipped.

use crate::processors::poller::{PollTick, Poller, TickOutcome};
use crate::registry::EventRegistry;
use compact_str::CompactString;
use kanau::processor::Processor;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::task::TaskTracker;
use tracing::{debug, info, warn};

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// Timing and pool size of the scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerConfig {
    /// Time between two ticks of the same event.
    pub period: Duration,
    /// Delay before the first tick after `start`.
    pub initial_delay: Duration,
    /// Maximum number of ticks running at once, across all events.
    pub pool_size: usize,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            period: Duration::from_millis(10_000),
            initial_delay: Duration::from_millis(1000),
            pool_size: 10,
        }
    }
}

/// Why [`PollingScheduler::start`] refused to schedule an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ScheduleError {
    #[error("event is not live")]
    NotLive,

    #[error("scheduler is shutting down")]
    ShuttingDown,
}

/// What [`PollingScheduler::shutdown`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShutdownReport {
    pub cancelled_timers: usize,
    /// Ticks still running when the grace period ran out.
    pub abandoned_ticks: usize,
}

struct ScheduledTimer {
    generation: u64,
    handle: JoinHandle<()>,
    /// Set while a tick of this timer waits for a worker permit.
    queued: Arc<AtomicBool>,
}

struct SchedulerInner {
    registry: Arc<EventRegistry>,
    poller: Arc<Poller>,
    config: SchedulerConfig,
    timers: Mutex<HashMap<CompactString, ScheduledTimer>>,
    next_generation: AtomicU64,
    workers: Semaphore,
    ticks: TaskTracker,
}

// ---------------------------------------------------------------------------
// PollingScheduler
// ---------------------------------------------------------------------------

/// Per-event polling timers running on a bounded worker pool.
///
/// Cloning is cheap; all clones share the same timer table.
pub struct PollingScheduler {
    inner: Arc<SchedulerInner>,
}

impl PollingScheduler {
    /// Create a scheduler. Must be called inside a tokio runtime before any
    /// timer is started.
    pub fn new(registry: Arc<EventRegistry>, poller: Arc<Poller>, config: SchedulerConfig) -> Self {
        Self {
            inner: Arc::new(SchedulerInner {
                registry,
                poller,
                config,
                timers: Mutex::new(HashMap::new()),
                next_generation: AtomicU64::new(0),
                workers: Semaphore::new(config.pool_size.max(1)),
                ticks: TaskTracker::new(),
            }),
        }
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.inner.config
    }

    /// Start polling `event_id`, replacing any timer it already has.
    ///
    /// Refuses when the event is unknown or not live, or when the scheduler
    /// is shutting down.
    pub fn start(&self, event_id: &str) -> Result<(), ScheduleError> {
        if !self.inner.registry.is_live(event_id) {
            warn!(event_id, "Cannot start polling for non-live event");
            return Err(ScheduleError::NotLive);
        }

        let generation = self.inner.next_generation.fetch_add(1, Ordering::Relaxed);
        let replaced = {
            let mut timers = self.inner.timers.lock();
            if self.inner.ticks.is_closed() {
                drop(timers);
                warn!(event_id, "Scheduler is shutting down, not starting polling");
                return Err(ScheduleError::ShuttingDown);
            }
            let handle = self.inner.spawn_timer(CompactString::from(event_id), generation);
            timers.insert(
                CompactString::from(event_id),
                ScheduledTimer {
                    generation,
                    handle,
                    queued: Arc::new(AtomicBool::new(false)),
                },
            )
        };

        if let Some(previous) = replaced {
            previous.handle.abort();
            info!(event_id, "Cancelled existing polling task");
        }

        info!(
            event_id,
            interval_ms = self.inner.config.period.as_millis() as u64,
            "Started polling"
        );
        Ok(())
    }

    /// Stop polling `event_id`. Returns `false` if it had no timer.
    pub fn stop(&self, event_id: &str) -> bool {
        let removed = self.inner.timers.lock().remove(event_id);
        match removed {
            Some(timer) => {
                timer.handle.abort();
                info!(event_id, "Stopped polling");
                true
            }
            None => {
                debug!(event_id, "No polling task to stop");
                false
            }
        }
    }

    /// Whether `event_id` currently has an active timer.
    pub fn is_scheduled(&self, event_id: &str) -> bool {
        self.inner
            .timers
            .lock()
            .get(event_id)
            .is_some_and(|timer| !timer.handle.is_finished())
    }

    pub fn scheduled_count(&self) -> usize {
        self.inner.timers.lock().len()
    }

    /// Whether `shutdown` has begun. Once true, `start` always refuses.
    pub fn is_shutting_down(&self) -> bool {
        self.inner.ticks.is_closed()
    }

    /// Cancel every timer, then wait up to `grace` for running ticks to
    /// finish. Queued ticks exit without polling once they get a worker.
    /// Ticks still running afterwards are abandoned.
    ///
    /// After shutdown, `start` refuses new timers.
    pub async fn shutdown(&self, grace: Duration) -> ShutdownReport {
        info!("Shutting down polling scheduler, stopping all polling tasks");

        let timers: Vec<(CompactString, ScheduledTimer)> = {
            let mut timers = self.inner.timers.lock();
            self.inner.ticks.close();
            timers.drain().collect()
        };

        for (event_id, timer) in &timers {
            timer.handle.abort();
            debug!(%event_id, "Cancelled polling task");
        }

        let abandoned_ticks = match tokio::time::timeout(grace, self.inner.ticks.wait()).await {
            Ok(()) => 0,
            Err(_) => {
                let stuck = self.inner.ticks.len();
                warn!(
                    stuck,
                    grace_ms = grace.as_millis() as u64,
                    "Grace period exceeded, abandoning in-flight ticks"
                );
                stuck
            }
        };

        info!(
            cancelled = timers.len(),
            abandoned_ticks, "Polling scheduler shutdown complete"
        );

        ShutdownReport {
            cancelled_timers: timers.len(),
            abandoned_ticks,
        }
    }
}

impl Clone for PollingScheduler {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

// ---------------------------------------------------------------------------
// Timer loops and tick dispatch
// ---------------------------------------------------------------------------

impl SchedulerInner {
    /// Spawn the fixed-rate timer loop for one event.
    ///
    /// The loop only holds a weak reference, so it ends by itself once the
    /// scheduler is dropped.
    fn spawn_timer(self: &Arc<Self>, event_id: CompactString, generation: u64) -> JoinHandle<()> {
        let scheduler = Arc::downgrade(self);
        let first_tick = Instant::now() + self.config.initial_delay;
        let period = self.config.period;

        tokio::spawn(async move {
            let mut interval = tokio::time::interval_at(first_tick, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Burst);

            loop {
                interval.tick().await;
                let Some(inner) = Weak::upgrade(&scheduler) else {
                    debug!(%event_id, "Scheduler dropped, ending timer");
                    return;
                };
                inner.dispatch_tick(&event_id, generation);
            }
        })
    }

    /// Hand one tick to the worker pool.
    ///
    /// Checked under the timer lock, so once `stop` has returned no further
    /// tick of the stopped timer is dispatched. Skipped while an earlier tick
    /// of the same timer is still waiting for a permit.
    fn dispatch_tick(self: &Arc<Self>, event_id: &CompactString, generation: u64) {
        let timers = self.timers.lock();
        let Some(timer) = timers
            .get(event_id)
            .filter(|timer| timer.generation == generation)
        else {
            return;
        };

        if timer.queued.swap(true, Ordering::AcqRel) {
            debug!(%event_id, "Previous tick still waiting for a worker, skipping");
            return;
        }

        let queued = Arc::clone(&timer.queued);
        let inner = Arc::clone(self);
        let event_id = event_id.clone();
        self.ticks.spawn(async move {
            let Ok(_permit) = inner.workers.acquire().await else {
                return;
            };
            queued.store(false, Ordering::Release);

            // The timer may have been stopped or replaced while queued.
            if !inner.is_current(&event_id, generation) {
                debug!(%event_id, "Timer gone while tick was queued, skipping");
                return;
            }

            debug!(%event_id, "Polling score");
            let tick = PollTick {
                event_id: event_id.clone(),
            };
            let Ok(outcome) = inner.poller.process(tick).await;

            if outcome == TickOutcome::NotLive {
                inner.stop_generation(&event_id, generation);
            }
        });
        drop(timers);
    }

    fn is_current(&self, event_id: &str, generation: u64) -> bool {
        self.timers
            .lock()
            .get(event_id)
            .is_some_and(|timer| timer.generation == generation)
    }

    /// Stop `event_id`'s timer only if it is still the one of `generation`.
    fn stop_generation(&self, event_id: &str, generation: u64) -> bool {
        let removed = {
            let mut timers = self.timers.lock();
            match timers.get(event_id) {
                Some(timer) if timer.generation == generation => timers.remove(event_id),
                _ => None,
            }
        };

        match removed {
            Some(timer) => {
                timer.handle.abort();
                info!(event_id, "Stopped polling for event that is no longer live");
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::retry::RetryPolicy;
    use crate::stats::StatsReporter;
    use crate::testing::{RecordingPublisher, ScriptedFetcher};

    struct Harness {
        registry: Arc<EventRegistry>,
        fetcher: Arc<ScriptedFetcher>,
        publisher: Arc<RecordingPublisher>,
        scheduler: PollingScheduler,
    }

    fn quick_policy() -> RetryPolicy {
        RetryPolicy {
            max_attempts: 3,
            base_delay: Duration::from_millis(100),
            multiplier: 2.0,
            max_delay: Duration::from_millis(500),
            attempt_timeout: None,
        }
    }

    fn harness_with(publisher: RecordingPublisher, config: SchedulerConfig) -> Harness {
        let registry = Arc::new(EventRegistry::new());
        let fetcher = Arc::new(ScriptedFetcher::new());
        let publisher = Arc::new(publisher);
        let poller = Arc::new(Poller::new(
            Arc::clone(&registry),
            fetcher.clone(),
            publisher.clone(),
            quick_policy(),
            quick_policy(),
        ));
        let scheduler = PollingScheduler::new(Arc::clone(&registry), poller, config);
        Harness {
            registry,
            fetcher,
            publisher,
            scheduler,
        }
    }

    fn harness() -> Harness {
        harness_with(RecordingPublisher::new(), SchedulerConfig::default())
    }

    async fn sleep_ms(ms: u64) {
        tokio::time::sleep(Duration::from_millis(ms)).await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_refuses_non_live_event() {
        let h = harness();
        assert_eq!(h.scheduler.start("unknown"), Err(ScheduleError::NotLive));

        h.registry.mark_live("e1");
        h.registry.mark_not_live("e1");
        assert_eq!(h.scheduler.start("e1"), Err(ScheduleError::NotLive));
        assert_eq!(h.scheduler.scheduled_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fixed_rate_ticks() {
        let h = harness();
        h.registry.mark_live("e1");
        assert!(h.scheduler.start("e1").is_ok());
        assert!(h.scheduler.is_scheduled("e1"));

        sleep_ms(500).await;
        assert_eq!(h.fetcher.calls("e1"), 0);

        // First tick at 1s, then every 10s.
        sleep_ms(1000).await;
        assert_eq!(h.fetcher.calls("e1"), 1);

        sleep_ms(20_000).await;
        assert_eq!(h.fetcher.calls("e1"), 3);
        assert_eq!(h.publisher.published().len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_restart_replaces_timer() {
        let h = harness();
        h.registry.mark_live("e1");
        assert!(h.scheduler.start("e1").is_ok());
        assert!(h.scheduler.start("e1").is_ok());
        assert_eq!(h.scheduler.scheduled_count(), 1);

        sleep_ms(1500).await;
        assert_eq!(h.fetcher.calls("e1"), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_start_yields_single_timer() {
        let h = harness_with(
            RecordingPublisher::new(),
            SchedulerConfig {
                period: Duration::from_secs(60),
                initial_delay: Duration::from_millis(50),
                pool_size: 4,
            },
        );
        h.registry.mark_live("e1");

        let starts: Vec<_> = (0..16)
            .map(|_| {
                let scheduler = h.scheduler.clone();
                tokio::spawn(async move { scheduler.start("e1") })
            })
            .collect();
        for start in starts {
            assert!(start.await.unwrap().is_ok());
        }

        assert_eq!(h.scheduler.scheduled_count(), 1);
        sleep_ms(400).await;
        assert_eq!(h.fetcher.calls("e1"), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_prevents_further_ticks() {
        let h = harness();
        h.registry.mark_live("e1");
        h.scheduler.start("e1").unwrap();

        sleep_ms(1500).await;
        assert_eq!(h.fetcher.calls("e1"), 1);

        assert!(h.scheduler.stop("e1"));
        assert!(!h.scheduler.is_scheduled("e1"));
        assert!(!h.scheduler.stop("e1"));

        sleep_ms(60_000).await;
        assert_eq!(h.fetcher.calls("e1"), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_tick_stops_timer_of_not_live_event() {
        let h = harness();
        h.registry.mark_live("e1");
        h.scheduler.start("e1").unwrap();

        // Liveness flips without a stop call.
        h.registry.mark_not_live("e1");

        sleep_ms(1500).await;
        assert_eq!(h.fetcher.calls("e1"), 0);
        assert_eq!(h.publisher.attempts(), 0);
        assert!(!h.scheduler.is_scheduled("e1"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_generation_does_not_stop_replacement() {
        let h = harness();
        h.registry.mark_live("e1");
        h.scheduler.start("e1").unwrap();
        let stale = h.scheduler.inner.timers.lock().get("e1").unwrap().generation;

        h.scheduler.start("e1").unwrap();
        assert!(!h.scheduler.inner.stop_generation("e1", stale));
        assert!(h.scheduler.is_scheduled("e1"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_failing_event_does_not_affect_others() {
        let h = harness();
        let stats = StatsReporter::new(Arc::clone(&h.registry), h.scheduler.config().period);

        h.registry.mark_live("good");
        h.registry.mark_live("bad");
        h.fetcher.fail_for("bad");
        h.scheduler.start("good").unwrap();
        h.scheduler.start("bad").unwrap();

        sleep_ms(3000).await;

        assert_eq!(h.fetcher.calls("bad"), 3);
        assert!(h.scheduler.is_scheduled("bad"));
        assert!(h.registry.get("bad").unwrap().last_polled.is_none());
        assert!(h.registry.get("good").unwrap().last_polled.is_some());

        let report = stats.report();
        assert_eq!(report.live_events, 2);
        assert_eq!(report.total_events, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_overlapping_ticks_are_allowed() {
        let h = harness_with(
            RecordingPublisher::with_delay(Duration::from_millis(15_000)),
            SchedulerConfig {
                period: Duration::from_millis(10_000),
                initial_delay: Duration::from_millis(1000),
                pool_size: 10,
            },
        );
        h.registry.mark_live("e1");
        h.scheduler.start("e1").unwrap();

        // Ticks at 1s and 11s; the first publish is still running at 11s.
        sleep_ms(11_500).await;
        assert_eq!(h.fetcher.calls("e1"), 2);
        assert_eq!(h.publisher.attempts(), 2);
        assert_eq!(h.publisher.published().len(), 0);
    }

    fn saturated_pool() -> Harness {
        harness_with(
            RecordingPublisher::with_delay(Duration::from_millis(15_000)),
            SchedulerConfig {
                period: Duration::from_millis(10_000),
                initial_delay: Duration::from_millis(1000),
                pool_size: 1,
            },
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_queued_tick_skipped_after_stop() {
        let h = saturated_pool();
        h.registry.mark_live("e1");
        h.scheduler.start("e1").unwrap();

        // Tick at 1s holds the only worker until 16s; the 11s tick is queued.
        sleep_ms(12_000).await;
        assert_eq!(h.fetcher.calls("e1"), 1);
        assert!(h.scheduler.stop("e1"));

        sleep_ms(60_000).await;
        assert_eq!(h.fetcher.calls("e1"), 1);
        assert_eq!(h.publisher.published().len(), 1);
        assert!(h.scheduler.inner.ticks.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_queued_tick_of_replaced_timer_is_skipped() {
        let h = saturated_pool();
        h.registry.mark_live("e1");
        h.scheduler.start("e1").unwrap();

        sleep_ms(12_000).await;
        h.scheduler.start("e1").unwrap();

        // At 16s the stale 11s tick gets the worker first and must yield it
        // to the replacement's 13s tick without fetching.
        sleep_ms(4_500).await;
        assert_eq!(h.fetcher.calls("e1"), 2);
        assert_eq!(h.publisher.attempts(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_queue_stays_bounded_under_saturation() {
        let h = saturated_pool();
        h.registry.mark_live("e1");
        h.scheduler.start("e1").unwrap();

        for _ in 0..20 {
            sleep_ms(10_000).await;
            // At most one running tick and one waiting for the worker.
            assert!(h.scheduler.inner.ticks.len() <= 2);
        }
        assert!(h.scheduler.is_scheduled("e1"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_pool_bounds_concurrent_ticks() {
        let h = harness_with(
            RecordingPublisher::with_delay(Duration::from_millis(5000)),
            SchedulerConfig {
                period: Duration::from_secs(60),
                initial_delay: Duration::from_millis(1000),
                pool_size: 2,
            },
        );
        for id in ["e1", "e2", "e3"] {
            h.registry.mark_live(id);
            h.scheduler.start(id).unwrap();
        }

        sleep_ms(1500).await;
        assert_eq!(h.fetcher.total_calls(), 2);

        sleep_ms(5000).await;
        assert_eq!(h.fetcher.total_calls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_drains_in_flight_ticks() {
        let h = harness_with(
            RecordingPublisher::with_delay(Duration::from_millis(5000)),
            SchedulerConfig::default(),
        );
        h.registry.mark_live("e1");
        h.scheduler.start("e1").unwrap();

        sleep_ms(1500).await;
        let report = h.scheduler.shutdown(Duration::from_secs(30)).await;

        assert_eq!(report.cancelled_timers, 1);
        assert_eq!(report.abandoned_ticks, 0);
        assert_eq!(h.publisher.published().len(), 1);
        assert_eq!(h.scheduler.scheduled_count(), 0);
        assert!(h.scheduler.is_shutting_down());
        assert_eq!(h.scheduler.start("e1"), Err(ScheduleError::ShuttingDown));
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_abandons_after_grace() {
        let h = harness_with(
            RecordingPublisher::with_delay(Duration::from_millis(5000)),
            SchedulerConfig::default(),
        );
        h.registry.mark_live("e1");
        h.scheduler.start("e1").unwrap();

        sleep_ms(1500).await;
        let report = h.scheduler.shutdown(Duration::from_secs(1)).await;

        assert_eq!(report.abandoned_ticks, 1);
        assert!(h.publisher.published().is_empty());
    }
}
