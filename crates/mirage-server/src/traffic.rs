//! Capped ring buffer of completed exchanges.
//!
//! Recording happens outside the latency-critical path (the handler spawns it
//! after the response is sent) and never blocks or fails the primary response.

use crate::store::KeyValueStore;
use crate::types::LogEntry;
use std::sync::Arc;
use tracing::warn;

/// List key holding the ring buffer, newest first.
const LOG_KEY: &str = "request_logs";

/// Oldest entries are silently discarded past this cap.
pub const MAX_LOGS: usize = 100;

/// Default number of entries returned when no limit is given.
pub const DEFAULT_LOG_LIMIT: usize = 50;

/// Fire-and-forget traffic log backed by the keyed store.
pub struct TrafficLog {
    store: Arc<dyn KeyValueStore>,
}

impl TrafficLog {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Record a completed exchange. Failures are logged and dropped.
    pub fn record(&self, entry: LogEntry) {
        let value = match serde_json::to_value(&entry) {
            Ok(v) => v,
            Err(e) => {
                warn!("Failed to serialize log entry: {e}");
                return;
            }
        };
        if let Err(e) = self.store.push_and_trim(LOG_KEY, value, MAX_LOGS) {
            warn!("Failed to record request log: {e:#}");
        }
    }

    /// Most recent entries, newest first, bounded by `limit`.
    pub fn recent(&self, limit: usize) -> Vec<LogEntry> {
        if limit == 0 {
            return Vec::new();
        }
        let raw = match self.store.range(LOG_KEY, 0, limit - 1) {
            Ok(values) => values,
            Err(e) => {
                warn!("Failed to fetch request logs: {e:#}");
                return Vec::new();
            }
        };
        raw.into_iter()
            .filter_map(|v| match serde_json::from_value(v) {
                Ok(entry) => Some(entry),
                Err(e) => {
                    warn!("Skipping malformed log entry: {e}");
                    None
                }
            })
            .collect()
    }

    /// Clear the ring buffer.
    pub fn clear(&self) {
        if let Err(e) = self.store.delete(LOG_KEY) {
            warn!("Failed to clear request logs: {e:#}");
        }
    }
}
