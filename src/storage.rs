//! Local JSON key-value storage.
//!
//! `LocalStore` is the single accessor every persisted record kind goes
//! through: preferences, usage counters and API credentials each own one
//! store file. Values are JSON-encoded with no version tag, so a
//! forward-incompatible change simply falls back to the caller's default.
//!
//! Reads fail soft: a missing file, unreadable file or corrupt JSON yields an
//! empty record. Writes are synchronous and write-through; a failed write is
//! logged and swallowed, and the in-memory value is kept for the rest of the
//! session. Concurrent processes sharing a store file race with
//! last-write-wins semantics; no locking is used.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

pub struct LocalStore {
    path: PathBuf,
    values: Map<String, Value>,
}

impl LocalStore {
    /// Opens the store at `path`, loading whatever record is readable.
    ///
    /// Never fails: corrupt or unreadable content is replaced by an empty
    /// record (and logged), matching the recover-with-defaults policy for
    /// storage errors.
    pub fn open(path: &Path) -> Self {
        let values = match std::fs::read_to_string(path) {
            Ok(content) => match serde_json::from_str::<Value>(&content) {
                Ok(Value::Object(map)) => map,
                Ok(_) => {
                    tracing::warn!(path = %path.display(), "store is not a JSON object, resetting");
                    Map::new()
                }
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "corrupt store, resetting");
                    Map::new()
                }
            },
            Err(_) => Map::new(),
        };

        Self {
            path: path.to_path_buf(),
            values,
        }
    }

    /// Returns the value for `key` decoded as `T`, or `None` on missing key
    /// or type mismatch.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let value = self.values.get(key)?;
        match serde_json::from_value(value.clone()) {
            Ok(decoded) => Some(decoded),
            Err(_) => {
                tracing::debug!(key, "stored value does not match expected type");
                None
            }
        }
    }

    /// Returns the value for `key`, or `default` on missing key or type
    /// mismatch.
    pub fn get_or<T: DeserializeOwned>(&self, key: &str, default: T) -> T {
        self.get(key).unwrap_or(default)
    }

    /// Stores `value` under `key` and writes the record synchronously.
    ///
    /// Write failures (e.g. disk full) are logged, never propagated: the
    /// in-memory value stays current so callers keep a working session.
    pub fn set<T: Serialize>(&mut self, key: &str, value: &T) {
        match serde_json::to_value(value) {
            Ok(encoded) => {
                self.values.insert(key.to_string(), encoded);
                self.flush();
            }
            Err(e) => {
                tracing::warn!(key, error = %e, "failed to encode value, keeping previous");
            }
        }
    }

    /// Removes `key` from the record and writes synchronously.
    pub fn remove(&mut self, key: &str) {
        if self.values.remove(key).is_some() {
            self.flush();
        }
    }

    fn flush(&mut self) {
        let content = match serde_json::to_string_pretty(&Value::Object(self.values.clone())) {
            Ok(content) => content,
            Err(e) => {
                tracing::warn!(error = %e, "failed to serialize store");
                return;
            }
        };
        if let Err(e) = std::fs::write(&self.path, content) {
            tracing::warn!(path = %self.path.display(), error = %e, "failed to write store");
        }
    }
}
