use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};
use compact_str::CompactString;
use tracker_sdk::objects::EventStatusDetail;

use super::ControlApiError;
use crate::state::AppState;

/// `GET /events/{event_id}/status`: tracking state of one event.
///
/// `hasScheduledTask` reflects whether the scheduler currently holds a timer
/// for the event, independently of its live flag.
pub(super) async fn get_event_status(
    State(state): State<AppState>,
    Path(event_id): Path<CompactString>,
) -> Result<impl IntoResponse, ControlApiError> {
    let event = state
        .registry
        .get(&event_id)
        .ok_or_else(|| ControlApiError::NotFound(event_id.clone()))?;

    Ok(Json(EventStatusDetail {
        has_scheduled_task: state.scheduler.is_scheduled(&event_id),
        event_id: event.id,
        is_live: event.is_live,
        last_updated: event.last_updated,
        last_polled: event.last_polled,
    }))
}
