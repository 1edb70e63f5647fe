//! In-memory collaborators for unit tests.

use crate::clients::{FetchError, MessagePublisher, PublishError, ScoreFetcher};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::time::Duration;
use tracker_sdk::objects::ScoreSnapshot;

/// Returns `"1:0"` for every event except the ones told to fail.
#[derive(Default)]
pub struct ScriptedFetcher {
    failing: Mutex<HashSet<String>>,
    calls: Mutex<HashMap<String, usize>>,
}

impl ScriptedFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_for(&self, event_id: &str) {
        self.failing.lock().insert(event_id.to_string());
    }

    pub fn calls(&self, event_id: &str) -> usize {
        self.calls.lock().get(event_id).copied().unwrap_or(0)
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().values().sum()
    }
}

#[async_trait]
impl ScoreFetcher for ScriptedFetcher {
    async fn fetch(&self, event_id: &str) -> Result<ScoreSnapshot, FetchError> {
        *self.calls.lock().entry(event_id.to_string()).or_default() += 1;
        if self.failing.lock().contains(event_id) {
            return Err(FetchError::Unavailable(event_id.to_string()));
        }
        Ok(ScoreSnapshot {
            event_id: event_id.into(),
            current_score: "1:0".to_string(),
        })
    }
}

/// Records every published message; can be slowed down or made to fail.
#[derive(Default)]
pub struct RecordingPublisher {
    delay: Option<Duration>,
    failures_left: Mutex<u32>,
    published: Mutex<Vec<(String, String)>>,
    attempts: Mutex<u32>,
}

impl RecordingPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::default()
        }
    }

    pub fn failing(times: u32) -> Self {
        Self {
            failures_left: Mutex::new(times),
            ..Self::default()
        }
    }

    pub fn published(&self) -> Vec<(String, String)> {
        self.published.lock().clone()
    }

    pub fn attempts(&self) -> u32 {
        *self.attempts.lock()
    }
}

#[async_trait]
impl MessagePublisher for RecordingPublisher {
    fn topic(&self) -> &str {
        "test-topic"
    }

    async fn publish(&self, key: &str, payload: &str) -> Result<(), PublishError> {
        *self.attempts.lock() += 1;
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        {
            let mut failures_left = self.failures_left.lock();
            if *failures_left > 0 {
                *failures_left -= 1;
                return Err(PublishError::Delivery("broker unavailable".to_string()));
            }
        }
        self.published
            .lock()
            .push((key.to_string(), payload.to_string()));
        Ok(())
    }
}
