//! Observability payloads.

use compact_str::CompactString;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Response body for `GET /events/stats`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PollingStats {
    pub total_events: usize,
    pub live_events: usize,
    pub polling_interval_ms: u64,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
}

/// Response body for `GET /events/health`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: CompactString,
    pub service: CompactString,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
}

impl HealthResponse {
    pub fn up() -> Self {
        Self {
            status: CompactString::const_new("UP"),
            service: CompactString::const_new(crate::SERVICE_NAME),
            timestamp: OffsetDateTime::now_utc(),
        }
    }
}
