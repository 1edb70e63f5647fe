//! Mock score source.
//!
//! Stands in for the external score API during local runs: point
//! `external_api.url` at `/mock/events/data` and enable `server.mock_api`.

use axum::{Json, Router, extract::Query, response::IntoResponse, routing::get};
use compact_str::CompactString;
use rand::Rng;
use serde::Deserialize;
use tracker_sdk::objects::ScoreSnapshot;

use crate::state::AppState;

/// Build the mock score source router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/data", get(mock_event_data))
        .route("/health", get(mock_health))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ScoreQuery {
    event_id: CompactString,
}

/// `GET /data?eventId=...`: a random `home:away` score, each side in `0..5`.
async fn mock_event_data(Query(query): Query<ScoreQuery>) -> impl IntoResponse {
    let current_score = random_score();
    tracing::debug!(event_id = %query.event_id, score = %current_score, "Mock score served");

    Json(ScoreSnapshot {
        event_id: query.event_id,
        current_score,
    })
}

fn random_score() -> String {
    let mut rng = rand::rng();
    let home: u8 = rng.random_range(0..5);
    let away: u8 = rng.random_range(0..5);
    format!("{home}:{away}")
}

async fn mock_health() -> &'static str {
    "Mock API is running"
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::build_router;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::net::TcpListener;
    use tracker_core::clients::{HttpScoreFetcher, ScoreFetcher};
    use tracker_core::processors::SchedulerConfig;
    use tracker_core::retry::RetryPolicy;
    use url::Url;

    use crate::config::runtime::PollingConfig;
    use crate::publishers::LogPublisher;

    #[test]
    fn test_random_score_shape() {
        for _ in 0..100 {
            let score = random_score();
            let (home, away) = score.split_once(':').unwrap();
            assert!(home.parse::<u8>().unwrap() < 5);
            assert!(away.parse::<u8>().unwrap() < 5);
        }
    }

    /// The production fetcher, pointed at the mock served on a real socket.
    #[tokio::test]
    async fn test_http_fetcher_reads_mock_source() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let endpoint = Url::parse(&format!("http://{addr}/mock/events/data")).unwrap();

        let polling = PollingConfig {
            scheduler: SchedulerConfig::default(),
            fetch_retry: RetryPolicy::fetch_default(),
            publish_retry: RetryPolicy::publish_default(),
            shutdown_grace: Duration::from_secs(1),
        };
        let fetcher = Arc::new(HttpScoreFetcher::new(endpoint, Duration::from_secs(5)));
        let state = AppState::new(
            &polling,
            fetcher.clone(),
            Arc::new(LogPublisher::new("sports-events")),
        );
        let router = build_router(state, true);
        tokio::spawn(async move { axum::serve(listener, router).await });

        let snapshot = fetcher.fetch("match-42").await.unwrap();
        assert_eq!(snapshot.event_id, "match-42");
        assert!(snapshot.current_score.contains(':'));
    }

    #[tokio::test]
    async fn test_mock_routes_absent_when_disabled() {
        use axum::body::Body;
        use axum::http::{Request, StatusCode};
        use tower::ServiceExt;

        let polling = PollingConfig {
            scheduler: SchedulerConfig::default(),
            fetch_retry: RetryPolicy::fetch_default(),
            publish_retry: RetryPolicy::publish_default(),
            shutdown_grace: Duration::from_secs(1),
        };
        let fetcher = HttpScoreFetcher::new(
            Url::parse("http://127.0.0.1:9/").unwrap(),
            Duration::from_secs(1),
        );
        let state = AppState::new(
            &polling,
            Arc::new(fetcher),
            Arc::new(LogPublisher::new("sports-events")),
        );

        let request = || {
            Request::builder()
                .uri("/mock/events/health")
                .body(Body::empty())
                .unwrap()
        };

        let disabled = build_router(state.clone(), false);
        let response = disabled.oneshot(request()).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let enabled = build_router(state, true);
        let response = enabled.oneshot(request()).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&body[..], b"Mock API is running");
    }
}
