use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;

use super::CacheAdapter;
use crate::error::BoxError;

type Document = serde_json::Map<String, serde_json::Value>;

/// Cache persisted as a single JSON document on disk.
///
/// Every key is a member of the top-level object. A missing file is an empty
/// cache. Writes rewrite the whole document; access from one process is
/// serialized, concurrent writers in different processes are not coordinated.
#[derive(Debug)]
pub struct JsonFileCache {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonFileCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<Document, BoxError> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Document::new()),
            Err(err) => return Err(err.into()),
        };
        if text.trim().is_empty() {
            return Ok(Document::new());
        }
        match serde_json::from_str::<serde_json::Value>(&text)? {
            serde_json::Value::Object(document) => Ok(document),
            _ => Err(format!("{} does not contain a JSON object", self.path.display()).into()),
        }
    }

    fn store(&self, document: &Document) -> Result<(), BoxError> {
        let text = serde_json::to_string_pretty(document)?;
        fs::write(&self.path, text)?;
        Ok(())
    }

    fn update(&self, key: &str, f: impl FnOnce(&mut Document)) -> bool {
        let _guard = self.lock.lock();
        let result = self.load().and_then(|mut document| {
            f(&mut document);
            self.store(&document)
        });
        match result {
            Ok(()) => true,
            Err(err) => {
                tracing::warn!(path = %self.path.display(), key, error = %err, "cache file update failed");
                false
            }
        }
    }
}

impl CacheAdapter for JsonFileCache {
    fn get(&self, key: &str, default: serde_json::Value) -> Result<serde_json::Value, BoxError> {
        let _guard = self.lock.lock();
        Ok(self.load()?.remove(key).unwrap_or(default))
    }

    fn set(&self, key: &str, value: serde_json::Value) -> bool {
        self.update(key, |document| {
            document.insert(key.to_string(), value);
        })
    }

    fn has(&self, key: &str) -> bool {
        let _guard = self.lock.lock();
        self.load().map_or(false, |document| document.contains_key(key))
    }

    fn delete(&self, key: &str) -> bool {
        if !self.path.exists() {
            return true;
        }
        self.update(key, |document| {
            document.remove(key);
        })
    }
}
