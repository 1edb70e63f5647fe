//! Axum server setup and router configuration.

use crate::api::{events, mock};
use crate::shutdown::shutdown_signal;
use crate::state::AppState;
use axum::Router;
use std::net::SocketAddr;
use tokio::net::TcpListener;

/// Build the main application router.
///
/// The control plane lives under `/events`; the mock score source is
/// mounted under `/mock/events` only when `mock_api` is set.
pub fn build_router(state: AppState, mock_api: bool) -> Router {
    let mut router = Router::new().nest("/events", events::router());

    if mock_api {
        tracing::info!("Mock score source enabled at /mock/events");
        router = router.nest("/mock/events", mock::router());
    }

    router.with_state(state)
}

/// Run the server with graceful shutdown support.
pub async fn run_server(router: Router, addr: SocketAddr) -> Result<(), std::io::Error> {
    let listener = TcpListener::bind(addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
}
