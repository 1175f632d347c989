//! Request handlers: system endpoints and the catch-all mock pipeline.

use crate::server::types::{collect_body, error_response, json_response, parse_limit};
use crate::server::AppState;
use crate::specgen;
use crate::traffic::DEFAULT_LOG_LIMIT;
use crate::types::{LogEntry, RequestDescriptor};
use bytes::Bytes;
use http_body_util::Full;
use hyper::body::Incoming;
use hyper::{Request, Response, StatusCode};
use std::sync::Arc;
use std::time::Instant;
use tracing::warn;

/// GET /health - liveness check
pub fn handle_health() -> Response<Full<Bytes>> {
    json_response(StatusCode::OK, &serde_json::json!({"status": "ok"}))
}

/// GET /api/system/status - active provider snapshot
pub async fn handle_status(state: &AppState) -> Response<Full<Bytes>> {
    let status = state.pipeline.provider_status().await;
    json_response(StatusCode::OK, &status)
}

/// GET /api/system/logs?limit=N - most recent traffic, newest first
pub fn handle_logs(state: &AppState, query: Option<&str>) -> Response<Full<Bytes>> {
    let limit = parse_limit(query, DEFAULT_LOG_LIMIT);
    let logs = state.traffic.recent(limit);
    let count = logs.len();
    json_response(
        StatusCode::OK,
        &serde_json::json!({"logs": logs, "count": count}),
    )
}

/// DELETE /api/system/logs - clear the ring buffer
pub fn handle_clear_logs(state: &AppState) -> Response<Full<Bytes>> {
    state.traffic.clear();
    json_response(
        StatusCode::OK,
        &serde_json::json!({"message": "Request logs cleared"}),
    )
}

/// GET /api/generate-spec?limit=N - infer a specification from logged traffic
pub fn handle_generate_spec(state: &AppState, query: Option<&str>) -> Response<Full<Bytes>> {
    let limit = parse_limit(query, DEFAULT_LOG_LIMIT).max(specgen::MIN_LOGS);
    let logs = state.traffic.recent(limit);

    match specgen::build_spec(&logs, specgen::MIN_LOGS) {
        Ok(spec) => json_response(StatusCode::OK, &spec),
        Err(e) => error_response(
            StatusCode::NOT_FOUND,
            &e.to_string(),
            Some("Make some API requests first to generate traffic data"),
        ),
    }
}

/// Catch-all: any method, any path, through the mock pipeline.
pub async fn handle_mock(
    req: Request<Incoming>,
    state: Arc<AppState>,
) -> Response<Full<Bytes>> {
    let method = req.method().to_string();
    let path = req.uri().path().to_string();
    let session_id = req
        .headers()
        .get("X-Session-ID")
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string());

    let body_bytes = match collect_body(req).await {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!("{e}");
            return error_response(StatusCode::BAD_REQUEST, "Failed to read request body", None);
        }
    };
    let body = if body_bytes.is_empty() {
        None
    } else {
        serde_json::from_slice(&body_bytes).ok()
    };

    let descriptor = RequestDescriptor::new(&method, &path, body, session_id.as_deref());

    let started = Instant::now();
    let response = state.pipeline.handle(&descriptor).await;
    let duration_ms = started.elapsed().as_secs_f64() * 1000.0;

    // Fire-and-forget: logging never blocks or fails the response
    let entry = LogEntry::from_exchange(&descriptor, &response, duration_ms);
    let traffic = Arc::clone(&state.traffic);
    tokio::spawn(async move {
        traffic.record(entry);
    });

    let mut builder = Response::builder().status(
        StatusCode::from_u16(response.status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
    );
    for (key, value) in &response.headers {
        builder = builder.header(key, value);
    }

    let payload = if response.status_code == 204 {
        Bytes::new()
    } else {
        Bytes::from(serde_json::to_string(&response.body).unwrap_or_else(|_| "{}".to_string()))
    };

    builder
        .body(Full::new(payload))
        .unwrap_or_else(|_| Response::new(Full::new(Bytes::from("Internal Server Error"))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::ResponseCache;
    use crate::context::SessionContextStore;
    use crate::gateway::ProviderGateway;
    use crate::pipeline::MockPipeline;
    use crate::store::{InMemoryStore, KeyValueStore};
    use crate::traffic::TrafficLog;
    use crate::types::MockResponse;
    use serde_json::json;

    fn state() -> AppState {
        let store: Arc<dyn KeyValueStore> = Arc::new(InMemoryStore::new());
        AppState {
            pipeline: MockPipeline::new(
                ResponseCache::new(store.clone(), 60),
                SessionContextStore::new(store.clone(), 60),
                ProviderGateway::synthetic_only(),
            ),
            traffic: Arc::new(TrafficLog::new(store)),
        }
    }

    fn logged(state: &AppState, n: usize) {
        for i in 0..n {
            let desc = RequestDescriptor::new("GET", &format!("/users/{i}"), None, None);
            let resp = MockResponse::new(200, json!({"id": i}));
            state.traffic.record(LogEntry::from_exchange(&desc, &resp, 1.0));
        }
    }

    #[test]
    fn test_health() {
        assert_eq!(handle_health().status(), StatusCode::OK);
    }

    #[test]
    fn test_logs_endpoint_limit() {
        let state = state();
        logged(&state, 5);
        let resp = handle_logs(&state, Some("limit=2"));
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[test]
    fn test_clear_logs() {
        let state = state();
        logged(&state, 3);
        assert_eq!(handle_clear_logs(&state).status(), StatusCode::OK);
        assert!(state.traffic.recent(10).is_empty());
    }

    #[test]
    fn test_generate_spec_without_traffic_is_not_found() {
        let state = state();
        let resp = handle_generate_spec(&state, None);
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_generate_spec_with_traffic() {
        let state = state();
        logged(&state, 12);
        let resp = handle_generate_spec(&state, None);
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_status_endpoint() {
        let state = state();
        let resp = handle_status(&state).await;
        assert_eq!(resp.status(), StatusCode::OK);
    }
}
