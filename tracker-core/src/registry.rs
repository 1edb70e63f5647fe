//! In-memory registry of tracked events.
//!
//! The registry owns liveness and timestamp bookkeeping for every event the
//! control plane has ever marked live. It never holds timer handles: polling
//! timers belong to the [`PollingScheduler`](crate::processors::PollingScheduler),
//! which is the only component allowed to cancel them.
//!
//! A single lock guards the whole map. Every operation is therefore atomic
//! per key and every read is a consistent snapshot of the moment it ran.
//! `count_live()` and `list_live()` are separate snapshots: they agree
//! whenever no mutation lands between the two calls.

use compact_str::CompactString;
use parking_lot::RwLock;
use std::collections::HashMap;
use time::OffsetDateTime;
use tracing::{debug, info, warn};

/// Tracking state of a single event.
///
/// Values handed out by the registry are snapshots; mutating them has no
/// effect on the registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiveEvent {
    pub id: CompactString,
    pub is_live: bool,
    /// Time of the most recent liveness transition.
    pub last_updated: OffsetDateTime,
    /// Time of the last successful score fetch, if any.
    pub last_polled: Option<OffsetDateTime>,
}

/// Concurrency-safe store of [`LiveEvent`] records, keyed by event id.
#[derive(Debug, Default)]
pub struct EventRegistry {
    events: RwLock<HashMap<CompactString, LiveEvent>>,
}

impl EventRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark an event live, creating its record on first use.
    pub fn mark_live(&self, event_id: &str) -> LiveEvent {
        let now = OffsetDateTime::now_utc();
        let snapshot = {
            let mut events = self.events.write();
            let event = events
                .entry(CompactString::from(event_id))
                .or_insert_with(|| LiveEvent {
                    id: CompactString::from(event_id),
                    is_live: false,
                    last_updated: now,
                    last_polled: None,
                });
            event.is_live = true;
            event.last_updated = now;
            event.clone()
        };

        info!(event_id, "Event marked as LIVE");
        snapshot
    }

    /// Mark an event not live.
    ///
    /// Returns `None` without creating a record when the event was never
    /// marked live.
    pub fn mark_not_live(&self, event_id: &str) -> Option<LiveEvent> {
        let snapshot = {
            let mut events = self.events.write();
            events.get_mut(event_id).map(|event| {
                event.is_live = false;
                event.last_updated = OffsetDateTime::now_utc();
                event.clone()
            })
        };

        match &snapshot {
            Some(_) => info!(event_id, "Event marked as NOT LIVE"),
            None => warn!(event_id, "Attempted to mark unknown event as NOT LIVE"),
        }
        snapshot
    }

    pub fn get(&self, event_id: &str) -> Option<LiveEvent> {
        self.events.read().get(event_id).cloned()
    }

    /// `true` only if the event exists and is currently live.
    pub fn is_live(&self, event_id: &str) -> bool {
        self.events
            .read()
            .get(event_id)
            .is_some_and(|event| event.is_live)
    }

    /// All events currently live, in no particular order.
    pub fn list_live(&self) -> Vec<LiveEvent> {
        self.events
            .read()
            .values()
            .filter(|event| event.is_live)
            .cloned()
            .collect()
    }

    /// Record a successful fetch. Unknown ids are ignored.
    pub fn update_last_polled(&self, event_id: &str) {
        if let Some(event) = self.events.write().get_mut(event_id) {
            event.last_polled = Some(OffsetDateTime::now_utc());
        }
    }

    /// Delete an event's record.
    ///
    /// This does not touch any polling timer; callers stop the scheduler
    /// first.
    pub fn remove(&self, event_id: &str) -> Option<LiveEvent> {
        let removed = self.events.write().remove(event_id);
        if removed.is_some() {
            info!(event_id, "Event removed from state");
        }
        removed
    }

    pub fn count_total(&self) -> usize {
        self.events.read().len()
    }

    pub fn count_live(&self) -> usize {
        self.events
            .read()
            .values()
            .filter(|event| event.is_live)
            .count()
    }

    /// Drop every record.
    pub fn clear(&self) {
        let mut events = self.events.write();
        let dropped = events.len();
        events.clear();
        debug!(dropped, "All events cleared from state");
    }
}
