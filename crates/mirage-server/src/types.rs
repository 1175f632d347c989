//! Core data types shared across the mock pipeline.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// Session identifier used when the caller supplies none.
pub const DEFAULT_SESSION_ID: &str = "default";

/// Immutable description of one inbound request.
///
/// Built once by the HTTP layer and passed by reference through the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestDescriptor {
    pub method: String,
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,
    pub session_id: String,
}

impl RequestDescriptor {
    pub fn new(method: &str, path: &str, body: Option<Value>, session_id: Option<&str>) -> Self {
        Self {
            method: method.to_uppercase(),
            path: path.to_string(),
            body,
            session_id: session_id.unwrap_or(DEFAULT_SESSION_ID).to_string(),
        }
    }
}

/// A fully populated mock response.
///
/// Every path out of the pipeline produces one of these; `normalize` fills
/// defaults when a backend omits fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MockResponse {
    pub status_code: u16,
    pub headers: HashMap<String, String>,
    pub body: Value,
}

impl MockResponse {
    pub fn new(status_code: u16, body: Value) -> Self {
        Self {
            status_code,
            headers: default_headers(),
            body,
        }
    }

    /// Build from a loosely structured JSON envelope, filling defaults for any
    /// missing field. Accepts the `{status_code, headers, body}` shape that
    /// generation backends are prompted to produce.
    pub fn from_envelope(value: Value) -> Self {
        let obj = match value {
            Value::Object(map) => map,
            other => {
                return Self {
                    status_code: 500,
                    headers: default_headers(),
                    body: serde_json::json!({
                        "error": "Invalid response format",
                        "raw_response": other,
                    }),
                }
            }
        };

        let status_code = obj
            .get("status_code")
            .and_then(Value::as_u64)
            .and_then(|s| u16::try_from(s).ok())
            .unwrap_or(200);

        let headers = obj
            .get("headers")
            .and_then(Value::as_object)
            .map(|h| {
                h.iter()
                    .filter_map(|(k, v)| v.as_str().map(|s| (k.clone(), s.to_string())))
                    .collect()
            })
            .filter(|h: &HashMap<String, String>| !h.is_empty())
            .unwrap_or_else(default_headers);

        let body = obj.get("body").cloned().unwrap_or(Value::Object(Default::default()));

        Self {
            status_code,
            headers,
            body,
        }
    }

    /// Structured 500 response carrying a human-readable message.
    pub fn internal_error(message: &str) -> Self {
        Self::new(500, serde_json::json!({ "error": message }))
    }
}

/// Default `Content-Type: application/json` header set.
pub fn default_headers() -> HashMap<String, String> {
    let mut headers = HashMap::new();
    headers.insert("Content-Type".to_string(), "application/json".to_string());
    headers
}

/// One completed request/response pair in a session's history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextEntry {
    pub method: String,
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,
    pub response: MockResponse,
    pub timestamp: DateTime<Utc>,
}

impl ContextEntry {
    pub fn from_exchange(descriptor: &RequestDescriptor, response: &MockResponse) -> Self {
        Self {
            method: descriptor.method.clone(),
            path: descriptor.path.clone(),
            body: descriptor.body.clone(),
            response: response.clone(),
            timestamp: Utc::now(),
        }
    }
}

/// One logged exchange in the traffic ring buffer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    pub id: String,
    /// Wall-clock time of day, `HH:MM:SS`.
    pub timestamp: String,
    pub method: String,
    pub path: String,
    pub status: u16,
    pub duration_ms: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_body: Option<Value>,
    pub response_body: Value,
}

impl LogEntry {
    pub fn from_exchange(
        descriptor: &RequestDescriptor,
        response: &MockResponse,
        duration_ms: f64,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: now.timestamp_micros().to_string(),
            timestamp: now.format("%H:%M:%S").to_string(),
            method: descriptor.method.clone(),
            path: descriptor.path.clone(),
            status: response.status_code,
            duration_ms: (duration_ms * 100.0).round() / 100.0,
            request_body: descriptor.body.clone(),
            response_body: response.body.clone(),
        }
    }
}

/// Read-only snapshot of the active generation backend, recomputed on demand.
#[derive(Debug, Clone, Serialize)]
pub struct ProviderStatus {
    pub provider: String,
    pub model: String,
    pub fallback_enabled: bool,
    pub available_providers: HashMap<String, bool>,
}

/// Current UTC time as an RFC 3339 string with a trailing `Z`.
pub fn now_rfc3339() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}
