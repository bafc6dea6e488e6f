use std::collections::HashMap;

use parking_lot::RwLock;

use super::CacheAdapter;
use crate::error::BoxError;

/// In-process cache backed by a map.
///
/// Useful in tests and for sharing resolved values between containers built in
/// the same process.
///
/// ```rust
/// use keyed_di::{CacheAdapter, MemoryCache};
/// use serde_json::json;
///
/// let cache = MemoryCache::new();
/// assert!(cache.set("k", json!(1)));
/// assert_eq!(cache.get("k", json!(null)).unwrap(), json!(1));
/// assert!(cache.delete("k"));
/// assert!(!cache.has("k"));
/// ```
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: RwLock<HashMap<String, serde_json::Value>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl CacheAdapter for MemoryCache {
    fn get(&self, key: &str, default: serde_json::Value) -> Result<serde_json::Value, BoxError> {
        Ok(self.entries.read().get(key).cloned().unwrap_or(default))
    }

    fn set(&self, key: &str, value: serde_json::Value) -> bool {
        self.entries.write().insert(key.to_string(), value);
        true
    }

    fn has(&self, key: &str) -> bool {
        self.entries.read().contains_key(key)
    }

    fn delete(&self, key: &str) -> bool {
        self.entries.write().remove(key);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn missing_keys_yield_the_default() {
        let cache = MemoryCache::new();
        assert_eq!(cache.get("nope", json!({})).unwrap(), json!({}));
        assert!(cache.is_empty());
    }

    #[test]
    fn deleting_an_absent_key_succeeds() {
        let cache = MemoryCache::new();
        assert!(cache.delete("nope"));
        cache.set("a", json!("x"));
        assert_eq!(cache.len(), 1);
    }
}
