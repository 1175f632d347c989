//! Fingerprint-keyed response cache.
//!
//! The fingerprint is a pure function of `(session, method, path, body)`:
//! identical inputs always produce identical keys and distinct bodies always
//! produce distinct keys. Every store failure degrades to a miss or a no-op
//! with a warning; caching is an optimization, never a correctness dependency.

use crate::store::KeyValueStore;
use crate::types::MockResponse;
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::sync::Arc;
use tracing::warn;

/// Default cache TTL: one day.
pub const DEFAULT_CACHE_TTL_SECS: u64 = 86_400;

/// Compute a deterministic cache key for a request.
///
/// The body is canonicalized through `serde_json` (object keys sorted) and an
/// absent body hashes as an empty object, so `None` and `{}` collide on purpose.
pub fn fingerprint(session_id: &str, method: &str, path: &str, body: Option<&Value>) -> String {
    let canonical = match body {
        Some(value) => serde_json::to_string(value).unwrap_or_else(|_| "{}".to_string()),
        None => "{}".to_string(),
    };
    let body_hash = hex_sha256(canonical.as_bytes());
    hex_sha256(format!("{session_id}:{method}:{path}:{body_hash}").as_bytes())
}

fn hex_sha256(input: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input);
    format!("{:x}", hasher.finalize())
}

/// Memoizes full responses under request fingerprints.
pub struct ResponseCache {
    store: Arc<dyn KeyValueStore>,
    ttl_seconds: u64,
}

impl ResponseCache {
    pub fn new(store: Arc<dyn KeyValueStore>, ttl_seconds: u64) -> Self {
        Self { store, ttl_seconds }
    }

    /// Look up a cached response. Store errors degrade to a miss.
    pub fn get(&self, key: &str) -> Option<MockResponse> {
        let value = match self.store.get(&cache_key(key)) {
            Ok(v) => v?,
            Err(e) => {
                warn!("Cache lookup failed, treating as miss: {e:#}");
                return None;
            }
        };
        match serde_json::from_value(value) {
            Ok(response) => Some(response),
            Err(e) => {
                warn!("Cached value was not a valid response, treating as miss: {e}");
                None
            }
        }
    }

    /// Store a response under a fingerprint. Failures are logged and dropped.
    pub fn set(&self, key: &str, response: &MockResponse) {
        let value = match serde_json::to_value(response) {
            Ok(v) => v,
            Err(e) => {
                warn!("Failed to serialize response for cache: {e}");
                return;
            }
        };
        if let Err(e) = self
            .store
            .set_with_expiry(&cache_key(key), value, self.ttl_seconds)
        {
            warn!("Cache store failed, continuing without cache: {e:#}");
        }
    }

    /// Remove a cached response.
    pub fn delete(&self, key: &str) {
        if let Err(e) = self.store.delete(&cache_key(key)) {
            warn!("Cache delete failed: {e:#}");
        }
    }
}

fn cache_key(fingerprint: &str) -> String {
    format!("cache:{fingerprint}")
}
