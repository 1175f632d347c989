//! Backend-agnostic keyed storage for cache, context and traffic state.

mod inmemory;
#[cfg(feature = "redis-backend")]
mod redis;

use anyhow::Result;
use serde_json::Value;
use std::sync::Arc;

pub use inmemory::InMemoryStore;
#[cfg(feature = "redis-backend")]
pub use redis::RedisStore;

/// Backend-agnostic trait for keyed JSON storage.
///
/// This trait is intentionally synchronous: in-memory operations are brief, and
/// the Redis implementation uses a blocking client behind a connection pool.
/// Callers treat every error as fail-open; storage is an optimization, never a
/// correctness dependency.
pub trait KeyValueStore: Send + Sync {
    /// Get a value by key.
    fn get(&self, key: &str) -> Result<Option<Value>>;

    /// Set a value with a TTL in seconds.
    fn set_with_expiry(&self, key: &str, value: Value, ttl_seconds: u64) -> Result<()>;

    /// Delete a key.
    fn delete(&self, key: &str) -> Result<()>;

    /// Push a value onto the front of a list and trim it to `max_len`.
    fn push_and_trim(&self, key: &str, value: Value, max_len: usize) -> Result<()>;

    /// Read list elements from `start` through `stop` inclusive (newest first).
    fn range(&self, key: &str, start: usize, stop: usize) -> Result<Vec<Value>>;
}

/// Which storage backend to run against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum StoreBackend {
    /// Process-local store; state is lost on restart.
    InMemory,
    /// Shared Redis instance; state survives restarts.
    #[cfg(feature = "redis-backend")]
    Redis,
}

/// Create a store from configuration.
pub fn create_store(backend: StoreBackend, redis_url: &str) -> Result<Arc<dyn KeyValueStore>> {
    match backend {
        StoreBackend::InMemory => {
            let _ = redis_url;
            tracing::info!("Using in-memory store");
            Ok(Arc::new(InMemoryStore::new()))
        }
        #[cfg(feature = "redis-backend")]
        StoreBackend::Redis => {
            let store = RedisStore::new(redis_url, 8, "mirage:")?;
            Ok(Arc::new(store))
        }
    }
}
