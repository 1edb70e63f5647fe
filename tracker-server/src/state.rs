//! Application state shared across all request handlers.

use crate::config::runtime::PollingConfig;
use std::sync::Arc;
use tracker_core::clients::{MessagePublisher, ScoreFetcher};
use tracker_core::processors::{Poller, PollingScheduler};
use tracker_core::registry::EventRegistry;
use tracker_core::stats::StatsReporter;

/// Application state that is shared across all request handlers.
///
/// This is cloneable and cheap to pass around (everything is behind Arc).
#[derive(Clone)]
pub struct AppState {
    /// Tracking state of every known event.
    pub registry: Arc<EventRegistry>,
    /// Owner of the per-event polling timers.
    pub scheduler: PollingScheduler,
    pub stats: StatsReporter,
}

impl AppState {
    /// Wire the polling pipeline around a fresh registry.
    ///
    /// Must be called from within a tokio runtime.
    pub fn new(
        polling: &PollingConfig,
        fetcher: Arc<dyn ScoreFetcher>,
        publisher: Arc<dyn MessagePublisher>,
    ) -> Self {
        let registry = Arc::new(EventRegistry::new());
        let poller = Arc::new(Poller::new(
            registry.clone(),
            fetcher,
            publisher,
            polling.fetch_retry,
            polling.publish_retry,
        ));
        let scheduler = PollingScheduler::new(registry.clone(), poller, polling.scheduler);
        let stats = StatsReporter::new(registry.clone(), polling.scheduler.period);

        Self {
            registry,
            scheduler,
            stats,
        }
    }
}
