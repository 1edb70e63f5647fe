//! Control-plane request and response types.
//!
//! These are the bodies exchanged on the `/events` routes: marking an event
//! live or not live, reading a single event's tracking state, and listing
//! everything currently live.

use compact_str::CompactString;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Liveness requested by a control call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestedStatus {
    Live,
    NotLive,
}

impl RequestedStatus {
    pub fn is_live(self) -> bool {
        matches!(self, RequestedStatus::Live)
    }
}

/// Request body for `POST /events/status`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventStatusRequest {
    pub event_id: CompactString,
    pub status: RequestedStatus,
}

/// Status reported back to the caller of a control call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReportedStatus {
    Live,
    NotLive,
    Removed,
    Error,
}

impl std::fmt::Display for ReportedStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReportedStatus::Live => write!(f, "LIVE"),
            ReportedStatus::NotLive => write!(f, "NOT_LIVE"),
            ReportedStatus::Removed => write!(f, "REMOVED"),
            ReportedStatus::Error => write!(f, "ERROR"),
        }
    }
}

/// Response body for control calls that change an event's state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventStatusResponse {
    pub event_id: CompactString,
    pub status: ReportedStatus,
    pub message: String,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
}

impl EventStatusResponse {
    pub const SUCCESS_MESSAGE: &str = "Event status updated successfully";

    /// A successful state change, stamped with the current time.
    pub fn success(event_id: impl Into<CompactString>, status: ReportedStatus) -> Self {
        Self {
            event_id: event_id.into(),
            status,
            message: Self::SUCCESS_MESSAGE.to_string(),
            timestamp: OffsetDateTime::now_utc(),
        }
    }

    /// A failed state change. `message` is shown to the caller verbatim.
    pub fn error(event_id: impl Into<CompactString>, message: impl Into<String>) -> Self {
        Self {
            event_id: event_id.into(),
            status: ReportedStatus::Error,
            message: message.into(),
            timestamp: OffsetDateTime::now_utc(),
        }
    }
}

/// Response body for `GET /events/{event_id}/status`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventStatusDetail {
    pub event_id: CompactString,
    pub is_live: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub last_updated: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339::option")]
    pub last_polled: Option<OffsetDateTime>,
    pub has_scheduled_task: bool,
}

/// Body returned with `404` when an event id is unknown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventNotFound {
    pub event_id: CompactString,
    pub found: bool,
    pub message: String,
}

impl EventNotFound {
    pub fn new(event_id: impl Into<CompactString>) -> Self {
        Self {
            event_id: event_id.into(),
            found: false,
            message: "Event not found".to_string(),
        }
    }
}

/// One entry of the live event listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveEventSummary {
    pub event_id: CompactString,
    #[serde(with = "time::serde::rfc3339")]
    pub last_updated: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339::option")]
    pub last_polled: Option<OffsetDateTime>,
}

/// Response body for `GET /events/live`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiveEventsResponse {
    pub count: usize,
    pub events: Vec<LiveEventSummary>,
}
