//! Read-only polling statistics.

use crate::registry::EventRegistry;
use std::sync::Arc;
use std::time::Duration;
use time::OffsetDateTime;
use tracker_sdk::objects::PollingStats;

/// Reports registry counts alongside the configured polling interval.
///
/// Every call reads the registry afresh; nothing is cached.
#[derive(Debug, Clone)]
pub struct StatsReporter {
    registry: Arc<EventRegistry>,
    polling_interval: Duration,
}

impl StatsReporter {
    pub fn new(registry: Arc<EventRegistry>, polling_interval: Duration) -> Self {
        Self {
            registry,
            polling_interval,
        }
    }

    pub fn report(&self) -> PollingStats {
        PollingStats {
            total_events: self.registry.count_total(),
            live_events: self.registry.count_live(),
            polling_interval_ms: self.polling_interval.as_millis() as u64,
            timestamp: OffsetDateTime::now_utc(),
        }
    }
}
