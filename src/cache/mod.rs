//! Key-value cache contract for persisting a container's resolved values.
//!
//! A container configured with a cache stores one snapshot document under its
//! cache key: a JSON object mapping identifiers to the data values it holds.
//! The snapshot is loaded when the container is built and rewritten whenever
//! its resolved values change. Objects, callables and containers are never
//! persisted.

mod file;
mod memory;

pub use file::JsonFileCache;
pub use memory::MemoryCache;

use crate::error::BoxError;

/// Key under which containers store their snapshot unless configured
/// otherwise.
pub const DEFAULT_CACHE_KEY: &str = "container.registry";

/// Storage backend for container snapshots.
///
/// Mirrors the usual simple-cache contract: reads can fail with an error,
/// writes report success as a boolean.
pub trait CacheAdapter: Send + Sync {
    /// Returns the value stored under `key`, or `default` if there is none.
    fn get(&self, key: &str, default: serde_json::Value) -> Result<serde_json::Value, BoxError>;

    /// Stores `value` under `key`. Returns `false` if the write failed.
    fn set(&self, key: &str, value: serde_json::Value) -> bool;

    fn has(&self, key: &str) -> bool;

    /// Removes `key`. Removing an absent key succeeds.
    fn delete(&self, key: &str) -> bool;
}
