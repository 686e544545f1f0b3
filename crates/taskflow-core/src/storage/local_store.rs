//! Local durable store: one JSON document per key in a directory.
//!
//! Record collections are JSON arrays under `taskflow_tasks` and
//! `taskflow_events`; `taskflow_settings` holds a free-form JSON object.
//! Missing or unreadable data reads back as empty and is logged, never
//! returned as an error.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::error::{Result, ValidationError};
use crate::record::{EntityKind, Record};

/// Key of the settings object.
pub const SETTINGS_KEY: &str = "taskflow_settings";

/// Every key owned by TaskFlow, in display order.
pub const STORAGE_KEYS: [&str; 3] = ["taskflow_tasks", "taskflow_events", SETTINGS_KEY];

/// Usage of one key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyUsage {
    pub key: String,
    /// Size of the stored document in bytes
    pub size: u64,
    /// Array length, or 0 for non-array documents
    pub item_count: usize,
}

/// Usage across all TaskFlow keys.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageStats {
    pub total: u64,
    pub items: Vec<KeyUsage>,
}

/// Directory-backed key/value store.
#[derive(Debug, Clone)]
pub struct LocalStore {
    dir: PathBuf,
}

impl LocalStore {
    /// Open (creating if needed) a store rooted at `dir`.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    /// Open the store under the application data directory.
    pub fn open_default() -> Result<Self> {
        Self::open(super::data_dir()?.join("local"))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path(&self, key: &str) -> Result<PathBuf> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(ValidationError::invalid("key", format!("'{key}' is not a valid storage key")).into());
        }
        Ok(self.dir.join(format!("{key}.json")))
    }

    /// Raw document text, `None` when the key is absent.
    pub fn read_raw(&self, key: &str) -> Result<Option<String>> {
        match fs::read_to_string(self.path(key)?) {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Parsed document, `None` when absent or unreadable.
    pub fn get(&self, key: &str) -> Option<Value> {
        let text = match self.read_raw(key) {
            Ok(Some(text)) => text,
            Ok(None) => return None,
            Err(e) => {
                warn!(key, error = %e, "failed to read local storage key");
                return None;
            }
        };
        match serde_json::from_str(&text) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(key, error = %e, "ignoring corrupt local storage data");
                None
            }
        }
    }

    /// Write a document, replacing any previous value atomically.
    pub fn set(&self, key: &str, value: &Value) -> Result<()> {
        let path = self.path(key)?;
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_vec(value)?)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }

    /// Remove a key. Returns whether it existed.
    pub fn remove(&self, key: &str) -> Result<bool> {
        match fs::remove_file(self.path(key)?) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// Remove every TaskFlow key.
    pub fn clear_all(&self) -> Result<()> {
        for key in STORAGE_KEYS {
            self.remove(key)?;
        }
        Ok(())
    }

    /// The stored collection for `R`. Records that fail to decode make the
    /// whole collection read as empty.
    pub fn load_collection<R: Record>(&self) -> Vec<R> {
        let key = R::KIND.storage_key();
        let Some(value) = self.get(key) else {
            return Vec::new();
        };
        match serde_json::from_value(value) {
            Ok(items) => items,
            Err(e) => {
                warn!(key, error = %e, "ignoring corrupt {} collection", R::KIND.singular());
                Vec::new()
            }
        }
    }

    pub fn save_collection<R: Record>(&self, items: &[R]) -> Result<()> {
        self.set(R::KIND.storage_key(), &serde_json::to_value(items)?)
    }

    /// Number of stored records of a kind.
    pub fn count(&self, kind: EntityKind) -> usize {
        self.get(kind.storage_key())
            .as_ref()
            .and_then(Value::as_array)
            .map_or(0, Vec::len)
    }

    /// The settings object; empty when absent or not an object.
    pub fn settings(&self) -> Map<String, Value> {
        match self.get(SETTINGS_KEY) {
            Some(Value::Object(map)) => map,
            _ => Map::new(),
        }
    }

    pub fn save_settings(&self, settings: &Map<String, Value>) -> Result<()> {
        self.set(SETTINGS_KEY, &Value::Object(settings.clone()))
    }

    pub fn stats(&self) -> Result<StorageStats> {
        let mut items = Vec::with_capacity(STORAGE_KEYS.len());
        for key in STORAGE_KEYS {
            let raw = self.read_raw(key)?;
            let size = raw.as_ref().map_or(0, |text| text.len() as u64);
            let item_count = raw
                .and_then(|text| serde_json::from_str::<Value>(&text).ok())
                .and_then(|value| value.as_array().map(Vec::len))
                .unwrap_or(0);
            items.push(KeyUsage {
                key: key.to_string(),
                size,
                item_count,
            });
        }
        Ok(StorageStats {
            total: items.iter().map(|u| u.size).sum(),
            items,
        })
    }
}
