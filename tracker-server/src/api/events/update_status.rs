use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    response::IntoResponse,
};
use tracker_core::processors::ScheduleError;
use tracker_sdk::objects::{EventStatusRequest, EventStatusResponse, ReportedStatus};

use super::ControlApiError;
use crate::state::AppState;

/// `POST /events/status`: mark an event live or not live.
///
/// Going live records the event and (re)starts its polling timer. Going not
/// live cancels the timer first and then clears the flag; an unknown id is
/// accepted and reported as `NOT_LIVE`.
pub(super) async fn update_status(
    State(state): State<AppState>,
    payload: Result<Json<EventStatusRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ControlApiError> {
    let Json(request) = payload?;

    // Ids are stored as sent; surrounding whitespace only matters for the
    // blank check.
    let event_id = request.event_id.as_str();
    if event_id.trim().is_empty() {
        return Err(ControlApiError::Validation(
            "eventId must not be blank".to_string(),
        ));
    }

    tracing::info!(event_id, status = ?request.status, "Received status update");

    let reported = if request.status.is_live() {
        if state.scheduler.is_shutting_down() {
            return Err(shutting_down(event_id));
        }

        state.registry.mark_live(event_id);
        match state.scheduler.start(event_id) {
            Ok(()) => {}
            // A concurrent not-live call won the race; its state stands.
            Err(ScheduleError::NotLive) => {
                tracing::warn!(event_id, "Event went not live before polling started");
            }
            Err(ScheduleError::ShuttingDown) => {
                // Shutdown began after the check above; leave no live event
                // without a timer behind.
                state.registry.mark_not_live(event_id);
                return Err(shutting_down(event_id));
            }
        }
        ReportedStatus::Live
    } else {
        state.scheduler.stop(event_id);
        if state.registry.mark_not_live(event_id).is_none() {
            tracing::debug!(event_id, "Not-live update for unknown event");
        }
        ReportedStatus::NotLive
    };

    Ok(Json(EventStatusResponse::success(event_id, reported)))
}

fn shutting_down(event_id: &str) -> ControlApiError {
    ControlApiError::Internal {
        event_id: event_id.into(),
        message: ScheduleError::ShuttingDown.to_string(),
    }
}
