//! Per-session history of recent request/response pairs.
//!
//! The history gives the generator continuity: a LIST prefers previously
//! created items, a GET_ONE prefers a created item with a matching id, and an
//! UPDATE starts from the last known representation. Two concurrent writers to
//! the same session perform read-modify-write without transactional isolation;
//! last write wins by design.

use crate::store::KeyValueStore;
use crate::types::ContextEntry;
use std::sync::Arc;
use tracing::warn;

/// Default context TTL, independent of the response cache TTL.
pub const DEFAULT_CONTEXT_TTL_SECS: u64 = 3_600;

/// Number of entries handed to the generator.
pub const DEFAULT_READ_WINDOW: usize = 5;

/// Hard cap on stored entries per session; oldest evicted first.
const MAX_ENTRIES: usize = 50;

/// Bounded per-session request history backed by the keyed store.
pub struct SessionContextStore {
    store: Arc<dyn KeyValueStore>,
    ttl_seconds: u64,
}

impl SessionContextStore {
    pub fn new(store: Arc<dyn KeyValueStore>, ttl_seconds: u64) -> Self {
        Self { store, ttl_seconds }
    }

    /// Most recent entries in chronological order (most recent last), bounded
    /// by `limit`. An unreachable store yields an empty context.
    pub fn recent(&self, session_id: &str, limit: usize) -> Vec<ContextEntry> {
        let entries = self.load(session_id);
        let skip = entries.len().saturating_sub(limit);
        entries.into_iter().skip(skip).collect()
    }

    /// Append an entry, evicting the oldest once the cap is reached. Failures
    /// never block the request.
    pub fn append(&self, session_id: &str, entry: ContextEntry) {
        let mut entries = self.load(session_id);
        entries.push(entry);
        if entries.len() > MAX_ENTRIES {
            let excess = entries.len() - MAX_ENTRIES;
            entries.drain(..excess);
        }

        let value = match serde_json::to_value(&entries) {
            Ok(v) => v,
            Err(e) => {
                warn!("Failed to serialize session context: {e}");
                return;
            }
        };
        if let Err(e) =
            self.store
                .set_with_expiry(&context_key(session_id), value, self.ttl_seconds)
        {
            warn!("Context store failed, request proceeds without history: {e:#}");
        }
    }

    fn load(&self, session_id: &str) -> Vec<ContextEntry> {
        let value = match self.store.get(&context_key(session_id)) {
            Ok(Some(v)) => v,
            Ok(None) => return Vec::new(),
            Err(e) => {
                warn!("Context fetch failed, treating as empty: {e:#}");
                return Vec::new();
            }
        };
        match serde_json::from_value::<Vec<ContextEntry>>(value) {
            Ok(entries) => entries,
            Err(e) => {
                warn!("Stored context was malformed, treating as empty: {e}");
                Vec::new()
            }
        }
    }
}

fn context_key(session_id: &str) -> String {
    format!("context:{session_id}")
}
