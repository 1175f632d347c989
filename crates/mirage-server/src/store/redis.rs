use super::KeyValueStore;
use anyhow::{Context, Result};
use redis::{Commands, Connection};
use serde_json::Value;
use std::sync::Mutex;

/// Redis implementation of KeyValueStore using a synchronous blocking client
/// with r2d2 connection pooling.
///
/// # Compatibility
///
/// - Redis 6.x, 7.x: fully supported
/// - Valkey: likely compatible but not officially supported
struct RedisConnectionManager {
    client: redis::Client,
}

impl RedisConnectionManager {
    fn new(client: redis::Client) -> Self {
        Self { client }
    }
}

impl r2d2::ManageConnection for RedisConnectionManager {
    type Connection = Mutex<Connection>;
    type Error = redis::RedisError;

    fn connect(&self) -> Result<Self::Connection, Self::Error> {
        let conn = self.client.get_connection()?;
        Ok(Mutex::new(conn))
    }

    fn is_valid(&self, conn: &mut Self::Connection) -> Result<(), Self::Error> {
        redis::cmd("PING").query(conn.get_mut().unwrap())
    }

    fn has_broken(&self, _conn: &mut Self::Connection) -> bool {
        false
    }
}

pub struct RedisStore {
    pool: r2d2::Pool<RedisConnectionManager>,
    key_prefix: String,
}

impl RedisStore {
    /// Create a new Redis store
    ///
    /// # Arguments
    /// * `url` - Redis connection URL (e.g. "redis://localhost:6379")
    /// * `pool_size` - Connection pool size
    /// * `key_prefix` - Prefix for all keys (e.g. "mirage:")
    pub fn new(url: &str, pool_size: usize, key_prefix: &str) -> Result<Self> {
        let client = redis::Client::open(url).context("Failed to parse Redis URL")?;

        let manager = RedisConnectionManager::new(client);

        let pool = r2d2::Pool::builder()
            .max_size(pool_size as u32)
            .connection_timeout(std::time::Duration::from_secs(5))
            .build(manager)
            .context("Failed to create Redis connection pool")?;

        // Test connection with PING
        {
            let conn = pool.get().context("Failed to get connection from pool")?;
            let _: String = redis::cmd("PING")
                .query(&mut *conn.lock().unwrap())
                .context("Failed to PING Redis")?;
        }

        tracing::info!(
            "Connected to Redis with prefix={}, pool_size={}",
            key_prefix,
            pool_size
        );

        Ok(Self {
            pool,
            key_prefix: key_prefix.to_string(),
        })
    }

    fn make_key(&self, key: &str) -> String {
        format!("{}{}", self.key_prefix, key)
    }
}

impl KeyValueStore for RedisStore {
    fn get(&self, key: &str) -> Result<Option<Value>> {
        let key_str = self.make_key(key);
        let conn = self
            .pool
            .get()
            .context("Failed to get Redis connection from pool")?;

        let value: Option<String> = conn
            .lock()
            .unwrap()
            .get(&key_str)
            .context("Redis GET failed")?;

        match value {
            Some(json_str) => {
                let val =
                    serde_json::from_str(&json_str).context("Failed to parse JSON from Redis")?;
                Ok(Some(val))
            }
            None => Ok(None),
        }
    }

    fn set_with_expiry(&self, key: &str, value: Value, ttl_seconds: u64) -> Result<()> {
        let key_str = self.make_key(key);
        let json_str = serde_json::to_string(&value).context("Failed to serialize value")?;
        let conn = self
            .pool
            .get()
            .context("Failed to get Redis connection from pool")?;

        let _: () = conn
            .lock()
            .unwrap()
            .set_ex(&key_str, json_str, ttl_seconds)
            .context("Redis SETEX failed")?;
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<()> {
        let key_str = self.make_key(key);
        let conn = self
            .pool
            .get()
            .context("Failed to get Redis connection from pool")?;

        let _: () = conn
            .lock()
            .unwrap()
            .del(&key_str)
            .context("Redis DEL failed")?;
        Ok(())
    }

    fn push_and_trim(&self, key: &str, value: Value, max_len: usize) -> Result<()> {
        let key_str = self.make_key(key);
        let json_str = serde_json::to_string(&value).context("Failed to serialize value")?;
        let conn = self
            .pool
            .get()
            .context("Failed to get Redis connection from pool")?;

        let mut guard = conn.lock().unwrap();
        let _: () = guard
            .lpush(&key_str, json_str)
            .context("Redis LPUSH failed")?;
        let _: () = guard
            .ltrim(&key_str, 0, max_len as isize - 1)
            .context("Redis LTRIM failed")?;
        Ok(())
    }

    fn range(&self, key: &str, start: usize, stop: usize) -> Result<Vec<Value>> {
        let key_str = self.make_key(key);
        let conn = self
            .pool
            .get()
            .context("Failed to get Redis connection from pool")?;

        let raw: Vec<String> = conn
            .lock()
            .unwrap()
            .lrange(&key_str, start as isize, stop as isize)
            .context("Redis LRANGE failed")?;

        raw.iter()
            .map(|s| serde_json::from_str(s).context("Failed to parse JSON from Redis"))
            .collect()
    }
}
