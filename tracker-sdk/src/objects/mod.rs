pub mod control;
pub mod score;
pub mod stats;

pub use control::{
    EventNotFound, EventStatusDetail, EventStatusRequest, EventStatusResponse, LiveEventSummary,
    LiveEventsResponse, ReportedStatus, RequestedStatus,
};
pub use score::{ScoreSnapshot, ScoreUpdateMessage};
pub use stats::{HealthResponse, PollingStats};
