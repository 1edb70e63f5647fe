//! Collaborators driven by the poll pipeline.
//!
//! - [`ScoreFetcher`]: reads an event's current score from a remote source.
//! - [`MessagePublisher`]: delivers a JSON payload to the messaging topic.
//!
//! [`HttpScoreFetcher`] is the production fetcher. Publishers live with the
//! binary, since the messaging backend is a deployment choice.

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;
use tracker_sdk::objects::ScoreSnapshot;
use url::Url;

/// Errors that can occur while fetching a score.
#[derive(Debug, Error)]
pub enum FetchError {
    /// HTTP request error (connect, timeout, body decoding)
    #[error("API request error: {0}")]
    Request(#[from] reqwest::Error),

    /// The score source answered with a non-success status
    #[error("score source returned status {status}: {body}")]
    Status { status: u16, body: String },

    /// The score source has nothing for this event
    #[error("no score available for event {0}")]
    Unavailable(String),
}

/// Errors that can occur while publishing a message.
#[derive(Debug, Error)]
pub enum PublishError {
    /// The broker refused or failed the delivery
    #[error("delivery failed: {0}")]
    Delivery(String),

    /// No acknowledgement arrived in time
    #[error("no acknowledgement within {0:?}")]
    AckTimeout(Duration),
}

/// Source of live scores.
#[async_trait]
pub trait ScoreFetcher: Send + Sync {
    async fn fetch(&self, event_id: &str) -> Result<ScoreSnapshot, FetchError>;
}

/// Sink for score update messages.
///
/// Implementations publish to a single, preconfigured topic.
#[async_trait]
pub trait MessagePublisher: Send + Sync {
    /// Topic this publisher writes to.
    fn topic(&self) -> &str;

    /// Publish `payload` under `key`, returning once the transport has
    /// acknowledged it.
    async fn publish(&self, key: &str, payload: &str) -> Result<(), PublishError>;
}

/// Fetches scores with `GET {endpoint}?eventId={id}`.
///
/// The response body is expected to be `{"eventId": "...", "currentScore": "..."}`.
pub struct HttpScoreFetcher {
    endpoint: Url,
    http_client: reqwest::Client,
}

impl HttpScoreFetcher {
    /// Create a fetcher for `endpoint`; every request is bounded by `timeout`.
    pub fn new(endpoint: Url, timeout: Duration) -> Self {
        Self {
            endpoint,
            http_client: reqwest::Client::builder()
                .timeout(timeout)
                .build()
                .unwrap_or_else(|_| reqwest::Client::new()),
        }
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl ScoreFetcher for HttpScoreFetcher {
    async fn fetch(&self, event_id: &str) -> Result<ScoreSnapshot, FetchError> {
        debug!(event_id, endpoint = %self.endpoint, "Fetching score");

        let response = self
            .http_client
            .get(self.endpoint.clone())
            .query(&[("eventId", event_id)])
            .send()
            .await?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(FetchError::Unavailable(event_id.to_string()));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FetchError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let snapshot: ScoreSnapshot = response.json().await?;
        debug!(event_id, score = %snapshot.current_score, "Fetched score");
        Ok(snapshot)
    }
}
