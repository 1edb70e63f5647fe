//! Score payloads: what the remote score source returns and what the
//! tracker publishes for every successful poll.

use compact_str::CompactString;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::SERVICE_NAME;

/// Current score of an event as reported by the remote score source.
///
/// `current_score` is opaque to the tracker (e.g. `"2:1"`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreSnapshot {
    pub event_id: CompactString,
    pub current_score: String,
}

/// Envelope published to the messaging topic, keyed by event id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreUpdateMessage {
    pub event_id: CompactString,
    pub current_score: String,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
    pub source: CompactString,
}

impl ScoreUpdateMessage {
    /// Wrap a fetched snapshot, stamping it with `at` and the tracker's
    /// source name.
    pub fn from_snapshot(snapshot: ScoreSnapshot, at: OffsetDateTime) -> Self {
        Self {
            event_id: snapshot.event_id,
            current_score: snapshot.current_score,
            timestamp: at,
            source: CompactString::const_new(SERVICE_NAME),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_fields() {
        let snapshot: ScoreSnapshot =
            serde_json::from_str(r#"{"eventId":"1234","currentScore":"0:0"}"#).unwrap();
        let message = ScoreUpdateMessage::from_snapshot(snapshot, OffsetDateTime::UNIX_EPOCH);

        let value = serde_json::to_value(&message).unwrap();
        assert_eq!(value["eventId"], "1234");
        assert_eq!(value["currentScore"], "0:0");
        assert_eq!(value["timestamp"], "1970-01-01T00:00:00Z");
        assert_eq!(value["source"], "sports-tracker");
    }
}
