//! Response helpers and small wire types for the HTTP layer.

use bytes::Bytes;
use http_body_util::Full;
use hyper::body::Incoming;
use hyper::{Request, Response, StatusCode};
use serde::Serialize;

/// Structured error payload used by the system endpoints.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Create a JSON response
pub fn json_response<T: Serialize>(status: StatusCode, body: &T) -> Response<Full<Bytes>> {
    let json = serde_json::to_string_pretty(body).unwrap_or_else(|_| "{}".to_string());
    Response::builder()
        .status(status)
        .header("Content-Type", "application/json")
        .body(Full::new(Bytes::from(json)))
        .unwrap_or_else(|_| Response::new(Full::new(Bytes::from("Internal Server Error"))))
}

/// Create a structured error response
pub fn error_response(
    status: StatusCode,
    error: &str,
    message: Option<&str>,
) -> Response<Full<Bytes>> {
    json_response(
        status,
        &ErrorBody {
            error: error.to_string(),
            message: message.map(|m| m.to_string()),
        },
    )
}

/// Collect request body into bytes
pub async fn collect_body(req: Request<Incoming>) -> Result<Bytes, String> {
    use http_body_util::BodyExt;
    req.collect()
        .await
        .map(|c| c.to_bytes())
        .map_err(|e| format!("Failed to read request body: {e}"))
}

/// Parse a `limit=N` query parameter, falling back to `default`.
pub fn parse_limit(query: Option<&str>, default: usize) -> usize {
    let Some(q) = query else { return default };
    q.split('&')
        .filter_map(|pair| pair.split_once('='))
        .find(|(key, _)| *key == "limit")
        .and_then(|(_, value)| value.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_limit() {
        assert_eq!(parse_limit(None, 50), 50);
        assert_eq!(parse_limit(Some("limit=10"), 50), 10);
        assert_eq!(parse_limit(Some("a=b&limit=25"), 50), 25);
        assert_eq!(parse_limit(Some("limit=oops"), 50), 50);
    }

    #[test]
    fn test_json_response_content_type() {
        let resp = json_response(StatusCode::OK, &serde_json::json!({"ok": true}));
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(
            resp.headers().get("Content-Type").unwrap(),
            "application/json"
        );
    }

    #[test]
    fn test_error_response_shape() {
        let resp = error_response(StatusCode::NOT_FOUND, "No logs available", Some("hint"));
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }
}
