//! Schema inference: reconstruct an API specification from logged traffic.
//!
//! Deterministic and local; no generation backend is involved. Paths are
//! grouped by replacing identifier-like segments with `{id}`, body shapes are
//! inferred recursively from the first observed response, and each
//! `(path, method, status)` triple is recorded at most once
//! (first-observed-wins).

use crate::classifier::looks_like_id;
use crate::error::MirageError;
use crate::types::LogEntry;
use serde_json::{json, Map, Value};

/// Minimum number of logged requests required to build a spec.
pub const MIN_LOGS: usize = 10;

/// Replace identifier-like segments with a placeholder so `/users/1` and
/// `/users/2` group under one path template.
pub fn normalize_path(path: &str) -> String {
    let segments: Vec<&str> = path
        .trim_matches('/')
        .split('/')
        .filter(|s| !s.is_empty())
        .map(|s| if looks_like_id(s) { "{id}" } else { s })
        .collect();
    format!("/{}", segments.join("/"))
}

/// Recursively map a JSON value to a JSON-Schema-like type descriptor.
pub fn infer_schema(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let properties: Map<String, Value> = map
                .iter()
                .map(|(k, v)| (k.clone(), infer_schema(v)))
                .collect();
            json!({"type": "object", "properties": properties})
        }
        Value::Array(items) => match items.first() {
            Some(first) => json!({"type": "array", "items": infer_schema(first)}),
            None => json!({"type": "array", "items": {}}),
        },
        // Booleans before numbers: some representations treat bools as integers
        Value::Bool(_) => json!({"type": "boolean"}),
        Value::Number(n) if n.is_i64() || n.is_u64() => json!({"type": "integer"}),
        Value::Number(_) => json!({"type": "number"}),
        Value::String(_) => json!({"type": "string"}),
        Value::Null => json!({"type": "null"}),
    }
}

/// Build an OpenAPI 3.0 document from a window of logged traffic.
///
/// Fails with [`MirageError::NoTraffic`] when fewer than `min_logs` entries are
/// available.
pub fn build_spec(logs: &[LogEntry], min_logs: usize) -> Result<Value, MirageError> {
    if logs.len() < min_logs {
        return Err(MirageError::NoTraffic(min_logs));
    }

    let mut paths: Map<String, Value> = Map::new();

    for entry in logs {
        let path = normalize_path(&entry.path);
        let method = entry.method.to_lowercase();
        let status = entry.status.to_string();

        let path_item = paths
            .entry(path.clone())
            .or_insert_with(|| Value::Object(Map::new()));
        let operations = path_item
            .as_object_mut()
            .expect("path item is always an object");

        let operation = operations.entry(method.clone()).or_insert_with(|| {
            json!({
                "summary": format!("{} {}", entry.method.to_uppercase(), path),
                "responses": {},
            })
        });
        let responses = operation["responses"]
            .as_object_mut()
            .expect("responses is always an object");

        // First-observed-wins: later samples never overwrite a recorded schema
        if !responses.contains_key(&status) {
            responses.insert(
                status,
                json!({
                    "description": format!("Observed {} response", entry.status),
                    "content": {
                        "application/json": {
                            "schema": infer_schema(&entry.response_body),
                        }
                    }
                }),
            );
        }
    }

    Ok(json!({
        "openapi": "3.0.0",
        "info": {
            "title": "Generated API",
            "version": "1.0.0",
            "description": "Auto-generated from Mirage traffic logs",
        },
        "servers": [{"url": "http://localhost:8080"}],
        "paths": paths,
    }))
}
