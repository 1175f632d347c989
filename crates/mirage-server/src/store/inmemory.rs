use super::KeyValueStore;
use anyhow::Result;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime};

/// In-memory implementation of KeyValueStore
///
/// Stores values in a HashMap with lazy TTL expiration. Useful for testing,
/// development, and single-instance deployments.
pub struct InMemoryStore {
    #[allow(clippy::type_complexity)]
    data: Arc<Mutex<HashMap<String, (Value, Option<SystemTime>)>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            data: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    fn is_expired(expiry: &Option<SystemTime>) -> bool {
        match expiry {
            Some(exp) => SystemTime::now() > *exp,
            None => false,
        }
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyValueStore for InMemoryStore {
    fn get(&self, key: &str) -> Result<Option<Value>> {
        // Single lock acquisition; expired entries are skipped, not removed
        let data = self.data.lock().unwrap();
        match data.get(key) {
            Some((value, expiry)) if !Self::is_expired(expiry) => Ok(Some(value.clone())),
            _ => Ok(None),
        }
    }

    fn set_with_expiry(&self, key: &str, value: Value, ttl_seconds: u64) -> Result<()> {
        let expiry = SystemTime::now() + Duration::from_secs(ttl_seconds);
        let mut data = self.data.lock().unwrap();
        data.insert(key.to_string(), (value, Some(expiry)));
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<()> {
        let mut data = self.data.lock().unwrap();
        data.remove(key);
        Ok(())
    }

    fn push_and_trim(&self, key: &str, value: Value, max_len: usize) -> Result<()> {
        let mut data = self.data.lock().unwrap();

        let usable = matches!(
            data.get(key),
            Some((Value::Array(_), expiry)) if !Self::is_expired(expiry)
        );
        if !usable {
            data.insert(key.to_string(), (Value::Array(Vec::new()), None));
        }

        if let Some((Value::Array(items), _)) = data.get_mut(key) {
            items.insert(0, value);
            items.truncate(max_len);
        }
        Ok(())
    }

    fn range(&self, key: &str, start: usize, stop: usize) -> Result<Vec<Value>> {
        let data = self.data.lock().unwrap();
        match data.get(key) {
            Some((Value::Array(items), expiry)) if !Self::is_expired(expiry) => {
                let end = stop.saturating_add(1).min(items.len());
                if start >= end {
                    return Ok(Vec::new());
                }
                Ok(items[start..end].to_vec())
            }
            _ => Ok(Vec::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_get_set() {
        let store = InMemoryStore::new();

        store.set_with_expiry("key1", json!("value1"), 300).unwrap();
        assert_eq!(store.get("key1").unwrap(), Some(json!("value1")));
        assert_eq!(store.get("missing").unwrap(), None);
    }

    #[test]
    fn test_delete() {
        let store = InMemoryStore::new();

        store.set_with_expiry("key1", json!("value1"), 300).unwrap();
        store.delete("key1").unwrap();
        assert_eq!(store.get("key1").unwrap(), None);
    }

    #[test]
    fn test_ttl_expiry() {
        let store = InMemoryStore::new();

        store.set_with_expiry("key1", json!("value1"), 0).unwrap();
        std::thread::sleep(Duration::from_millis(50));
        assert_eq!(store.get("key1").unwrap(), None);
    }

    #[test]
    fn test_push_and_trim_caps_length() {
        let store = InMemoryStore::new();

        for i in 0..5 {
            store.push_and_trim("list", json!(i), 3).unwrap();
        }

        let items = store.range("list", 0, 9).unwrap();
        // Newest first, capped at 3
        assert_eq!(items, vec![json!(4), json!(3), json!(2)]);
    }

    #[test]
    fn test_range_bounds() {
        let store = InMemoryStore::new();

        for i in 0..4 {
            store.push_and_trim("list", json!(i), 10).unwrap();
        }

        assert_eq!(store.range("list", 0, 1).unwrap(), vec![json!(3), json!(2)]);
        assert_eq!(store.range("list", 2, 100).unwrap(), vec![json!(1), json!(0)]);
        assert!(store.range("list", 10, 20).unwrap().is_empty());
        assert!(store.range("missing", 0, 10).unwrap().is_empty());
    }
}
