//! Poller processor.
//!
//! The Poller runs one tick of the poll pipeline for one event:
//! - Re-checking liveness against the registry (never trusting the value
//!   seen when the timer was scheduled)
//! - Fetching the score through the fetch [`RetryExecutor`]
//! - Recording the successful fetch in the registry
//! - Wrapping the score into a [`ScoreUpdateMessage`]
//! - Publishing it, keyed by event id, through the publish [`RetryExecutor`]
//!
//! Every failure is logged here and folded into a [`TickOutcome`]; nothing
//! escapes to the scheduler.

use crate::clients::{MessagePublisher, ScoreFetcher};
use crate::registry::EventRegistry;
use crate::retry::{RetryExecutor, RetryPolicy};
use compact_str::CompactString;
use kanau::processor::Processor;
use std::convert::Infallible;
use std::sync::Arc;
use time::OffsetDateTime;
use tracing::{error, info};
use tracker_sdk::objects::ScoreUpdateMessage;

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// Request to poll one event once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollTick {
    pub event_id: CompactString,
}

/// How a tick ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// The event is gone or no longer live; nothing was fetched.
    NotLive,
    /// Every fetch attempt failed; registry untouched.
    FetchFailed,
    /// The score was fetched but could not be published.
    PublishFailed,
    /// The score was fetched and published.
    Published,
}

pub struct Poller {
    registry: Arc<EventRegistry>,
    fetcher: Arc<dyn ScoreFetcher>,
    publisher: Arc<dyn MessagePublisher>,
    fetch_retry: RetryExecutor,
    publish_retry: RetryExecutor,
}

impl Poller {
    pub fn new(
        registry: Arc<EventRegistry>,
        fetcher: Arc<dyn ScoreFetcher>,
        publisher: Arc<dyn MessagePublisher>,
        fetch_policy: RetryPolicy,
        publish_policy: RetryPolicy,
    ) -> Self {
        Self {
            registry,
            fetcher,
            publisher,
            fetch_retry: RetryExecutor::new("fetch", fetch_policy),
            publish_retry: RetryExecutor::new("publish", publish_policy),
        }
    }
}

// ---------------------------------------------------------------------------
// Processor trait implementation
// ---------------------------------------------------------------------------

impl Processor<PollTick> for Poller {
    type Output = TickOutcome;
    type Error = Infallible;

    #[tracing::instrument(skip_all, fields(event_id = %tick.event_id), name = "Poller:tick")]
    async fn process(&self, tick: PollTick) -> Result<TickOutcome, Infallible> {
        let event_id = tick.event_id;

        if !self.registry.is_live(&event_id) {
            info!("Event is no longer live, stopping polling");
            return Ok(TickOutcome::NotLive);
        }

        let snapshot = match self.fetch_retry.run(|| self.fetcher.fetch(&event_id)).await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                error!(error = %e, "Failed to fetch score");
                return Ok(TickOutcome::FetchFailed);
            }
        };

        self.registry.update_last_polled(&event_id);

        let message = ScoreUpdateMessage::from_snapshot(snapshot, OffsetDateTime::now_utc());
        let payload = match serde_json::to_string(&message) {
            Ok(payload) => payload,
            Err(e) => {
                error!(error = %e, "Failed to serialize score update");
                return Ok(TickOutcome::PublishFailed);
            }
        };

        match self
            .publish_retry
            .run(|| self.publisher.publish(&event_id, &payload))
            .await
        {
            Ok(()) => {
                info!(
                    topic = self.publisher.topic(),
                    score = %message.current_score,
                    "Published score update"
                );
                Ok(TickOutcome::Published)
            }
            Err(e) => {
                error!(
                    topic = self.publisher.topic(),
                    error = %e,
                    "Failed to publish score update"
                );
                Ok(TickOutcome::PublishFailed)
            }
        }
    }
}
