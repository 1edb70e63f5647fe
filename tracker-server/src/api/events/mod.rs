//! Control plane handlers.
//!
//! # Endpoints
//!
//! - `POST   /status`            – mark an event live or not live
//! - `GET    /{event_id}/status` – tracking state of one event
//! - `DELETE /{event_id}`        – stop polling and forget an event
//! - `GET    /live`              – list live events
//! - `GET    /stats`             – registry counts and polling interval
//! - `GET    /health`            – liveness probe

mod get_status;
mod remove_event;
mod update_status;

use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post},
};
use compact_str::CompactString;
use tracker_sdk::objects::{
    EventNotFound, EventStatusResponse, HealthResponse, LiveEventSummary, LiveEventsResponse,
};

use crate::state::AppState;
use get_status::get_event_status;
use remove_event::remove_event;
use update_status::update_status;

/// Build the control plane router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/status", post(update_status))
        .route("/live", get(list_live_events))
        .route("/stats", get(get_stats))
        .route("/health", get(health))
        .route("/{event_id}/status", get(get_event_status))
        .route("/{event_id}", delete(remove_event))
}

/// Errors returned by control plane handlers.
#[derive(Debug)]
pub(crate) enum ControlApiError {
    /// The request body is missing, malformed or carries a blank id.
    Validation(String),
    /// No event with this id is known.
    NotFound(CompactString),
    /// The request was valid but could not be carried out.
    Internal {
        event_id: CompactString,
        message: String,
    },
}

impl From<JsonRejection> for ControlApiError {
    fn from(rejection: JsonRejection) -> Self {
        ControlApiError::Validation(rejection.body_text())
    }
}

impl IntoResponse for ControlApiError {
    fn into_response(self) -> axum::response::Response {
        match self {
            ControlApiError::Validation(message) => {
                (StatusCode::BAD_REQUEST, message).into_response()
            }
            ControlApiError::NotFound(event_id) => {
                (StatusCode::NOT_FOUND, Json(EventNotFound::new(event_id))).into_response()
            }
            ControlApiError::Internal { event_id, message } => {
                tracing::error!(event_id = %event_id, error = %message, "Control API internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(EventStatusResponse::error(
                        event_id,
                        format!("Internal server error: {message}"),
                    )),
                )
                    .into_response()
            }
        }
    }
}

// ---------------------------------------------------------------------------
// GET /live
// ---------------------------------------------------------------------------

async fn list_live_events(State(state): State<AppState>) -> impl IntoResponse {
    let events: Vec<LiveEventSummary> = state
        .registry
        .list_live()
        .into_iter()
        .map(|event| LiveEventSummary {
            event_id: event.id,
            last_updated: event.last_updated,
            last_polled: event.last_polled,
        })
        .collect();

    Json(LiveEventsResponse {
        count: events.len(),
        events,
    })
}

// ---------------------------------------------------------------------------
// GET /stats
// ---------------------------------------------------------------------------

async fn get_stats(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.stats.report())
}

// ---------------------------------------------------------------------------
// GET /health
// ---------------------------------------------------------------------------

async fn health() -> impl IntoResponse {
    Json(HealthResponse::up())
}
