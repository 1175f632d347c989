//! Route dispatch: a handful of system endpoints, then the catch-all mock
//! pipeline for everything else.

use crate::server::handlers;
use crate::server::AppState;
use bytes::Bytes;
use http_body_util::Full;
use hyper::body::Incoming;
use hyper::{Method, Request, Response};
use std::sync::Arc;
use tracing::debug;

/// Main request router
pub async fn route_request(
    req: Request<Incoming>,
    state: Arc<AppState>,
) -> Result<Response<Full<Bytes>>, hyper::Error> {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let query = req.uri().query().map(|s| s.to_string());

    debug!("{} {}", method, path);

    // System endpoints take precedence over the catch-all
    let response = match (&method, path.as_str()) {
        (&Method::GET, "/health") => handlers::handle_health(),
        (&Method::GET, "/api/system/status") => handlers::handle_status(&state).await,
        (&Method::GET, "/api/system/logs") => handlers::handle_logs(&state, query.as_deref()),
        (&Method::DELETE, "/api/system/logs") => handlers::handle_clear_logs(&state),
        (&Method::GET, "/api/generate-spec") => {
            handlers::handle_generate_spec(&state, query.as_deref())
        }
        _ => handlers::handle_mock(req, state).await,
    };

    Ok(response)
}
