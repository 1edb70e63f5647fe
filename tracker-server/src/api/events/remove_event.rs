use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};
use compact_str::CompactString;
use tracker_sdk::objects::{EventStatusResponse, ReportedStatus};

use super::ControlApiError;
use crate::state::AppState;

/// `DELETE /events/{event_id}`: forget an event entirely.
///
/// The timer is cancelled before the record is dropped.
pub(super) async fn remove_event(
    State(state): State<AppState>,
    Path(event_id): Path<CompactString>,
) -> Result<impl IntoResponse, ControlApiError> {
    state.scheduler.stop(&event_id);
    state
        .registry
        .remove(&event_id)
        .ok_or_else(|| ControlApiError::NotFound(event_id.clone()))?;

    tracing::info!(event_id = %event_id, "Event removed");
    Ok(Json(EventStatusResponse::success(
        event_id,
        ReportedStatus::Removed,
    )))
}
