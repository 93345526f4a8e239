//! Key-value stores and the JSON envelope

use std::collections::HashMap;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Bumped whenever a stored layout changes incompatibly
pub const ENVELOPE_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage unavailable: {0}")]
    Unavailable(String),
    #[error("storage write failed for {key}")]
    Write { key: String },
    #[error("bad stored json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("stored version {found}, expected {expected}")]
    Version { found: u32, expected: u32 },
}

/// String key-value storage
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove(&mut self, key: &str) -> Result<(), StorageError>;
}

/// Wrapper written around every persisted value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub version: u32,
    pub data: T,
}

impl<T> Envelope<T> {
    pub fn new(data: T) -> Self {
        Self {
            version: ENVELOPE_VERSION,
            data,
        }
    }
}

/// Serialize `value` into an envelope under `key`
pub fn save_json<T: Serialize>(
    store: &mut dyn KeyValueStore,
    key: &str,
    value: &T,
) -> Result<(), StorageError> {
    let json = serde_json::to_string(&Envelope::new(value))?;
    store.set(key, &json)
}

/// Read the value stored under `key`. `Ok(None)` when nothing was saved yet.
pub fn load_json<T: DeserializeOwned>(
    store: &dyn KeyValueStore,
    key: &str,
) -> Result<Option<T>, StorageError> {
    let Some(json) = store.get(key)? else {
        return Ok(None);
    };
    let envelope: Envelope<serde_json::Value> = serde_json::from_str(&json)?;
    if envelope.version != ENVELOPE_VERSION {
        return Err(StorageError::Version {
            found: envelope.version,
            expected: ENVELOPE_VERSION,
        });
    }
    Ok(Some(serde_json::from_value(envelope.data)?))
}

/// Process-lifetime store, used on native and when LocalStorage is blocked
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    items: HashMap<String, String>,
}

impl MemoryStore {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.items.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.items.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        self.items.remove(key);
        Ok(())
    }
}

/// Browser LocalStorage
#[cfg(target_arch = "wasm32")]
pub struct LocalStore {
    storage: web_sys::Storage,
}

#[cfg(target_arch = "wasm32")]
impl LocalStore {
    pub fn open() -> Result<Self, StorageError> {
        let window =
            web_sys::window().ok_or_else(|| StorageError::Unavailable("no window".into()))?;
        let storage = window
            .local_storage()
            .map_err(|e| StorageError::Unavailable(format!("{:?}", e)))?
            .ok_or_else(|| StorageError::Unavailable("localStorage disabled".into()))?;
        Ok(Self { storage })
    }
}

#[cfg(target_arch = "wasm32")]
impl KeyValueStore for LocalStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.storage
            .get_item(key)
            .map_err(|e| StorageError::Unavailable(format!("{:?}", e)))
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.storage
            .set_item(key, value)
            .map_err(|_| StorageError::Write {
                key: key.to_string(),
            })
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        self.storage
            .remove_item(key)
            .map_err(|_| StorageError::Write {
                key: key.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Sample {
        name: String,
        score: u64,
    }

    #[test]
    fn test_missing_key_is_none() {
        let store = MemoryStore::default();
        let loaded: Option<Sample> = load_json(&store, "nothing").unwrap();
        assert!(loaded.is_none());
    }

    #[test]
    fn test_save_then_load() {
        let mut store = MemoryStore::default();
        let value = Sample {
            name: "door".into(),
            score: 12,
        };
        save_json(&mut store, "k", &value).unwrap();
        let raw = store.get("k").unwrap().unwrap();
        assert!(raw.contains("\"version\":1"));
        assert_eq!(load_json::<Sample>(&store, "k").unwrap(), Some(value));
    }

    #[test]
    fn test_version_mismatch_rejected() {
        let mut store = MemoryStore::default();
        store
            .set("k", r#"{"version":99,"data":{"name":"x","score":1}}"#)
            .unwrap();
        match load_json::<Sample>(&store, "k") {
            Err(StorageError::Version { found, expected }) => {
                assert_eq!(found, 99);
                assert_eq!(expected, ENVELOPE_VERSION);
            }
            other => panic!("expected version error, got {:?}", other),
        }
    }

    #[test]
    fn test_garbage_is_json_error() {
        let mut store = MemoryStore::default();
        store.set("k", "not json").unwrap();
        assert!(matches!(
            load_json::<Sample>(&store, "k"),
            Err(StorageError::Json(_))
        ));
        store.remove("k").unwrap();
        assert!(store.is_empty());
    }
}
