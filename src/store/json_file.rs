//! JSON file backed key-value store.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use dashmap::DashMap;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::store::{StoreError, StoreResult};

/// A key-value store kept in memory and mirrored to a single JSON file.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    entries: DashMap<String, Value>,
    /// Serializes mutations; the cache only changes after the file has.
    persist_lock: Mutex<()>,
}

impl JsonFileStore {
    /// Open the store at `path`, creating the file and its directory if absent.
    pub fn open(path: impl Into<PathBuf>) -> StoreResult<Self> {
        let path = path.into();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|source| StoreError::Io {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }

        let store = Self {
            entries: DashMap::new(),
            persist_lock: Mutex::new(()),
            path,
        };

        match fs::read_to_string(&store.path) {
            Ok(content) => {
                if !content.trim().is_empty() {
                    let map: Map<String, Value> = serde_json::from_str(&content).map_err(
                        |source| StoreError::Corrupt {
                            path: store.path.clone(),
                            source,
                        },
                    )?;
                    for (key, value) in map {
                        store.entries.insert(key, value);
                    }
                }
                tracing::debug!(
                    path = %store.path.display(),
                    keys = store.entries.len(),
                    "Opened existing store"
                );
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                store.persist(&BTreeMap::new())?;
                tracing::debug!(path = %store.path.display(), "Created store");
            }
            Err(source) => {
                return Err(StoreError::Io {
                    path: store.path.clone(),
                    source,
                })
            }
        }

        Ok(store)
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read and decode the value stored under `key`.
    pub fn read<T: DeserializeOwned>(&self, key: &str) -> StoreResult<Option<T>> {
        let Some(value) = self.entries.get(key).map(|entry| entry.value().clone()) else {
            return Ok(None);
        };
        serde_json::from_value(value)
            .map(Some)
            .map_err(|source| StoreError::Decode {
                key: key.to_string(),
                source,
            })
    }

    /// Store `value` under `key` and persist the whole map. On failure the
    /// previous contents remain visible.
    pub fn write<T: Serialize>(&self, key: &str, value: &T) -> StoreResult<()> {
        let value = serde_json::to_value(value).map_err(|source| StoreError::Encode {
            key: key.to_string(),
            source,
        })?;

        let _guard = self.lock();
        let mut candidate = self.snapshot();
        candidate.insert(key.to_string(), value.clone());
        self.persist(&candidate)?;
        self.entries.insert(key.to_string(), value);
        Ok(())
    }

    /// Remove `key`. Returns whether it was present.
    pub fn remove(&self, key: &str) -> StoreResult<bool> {
        let _guard = self.lock();
        let mut candidate = self.snapshot();
        if candidate.remove(key).is_none() {
            return Ok(false);
        }
        self.persist(&candidate)?;
        self.entries.remove(key);
        Ok(true)
    }

    /// Keys in sorted order.
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.entries.iter().map(|e| e.key().clone()).collect();
        keys.sort();
        keys
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Copy of the current contents with keys in sorted order.
    pub fn snapshot(&self) -> BTreeMap<String, Value> {
        self.entries
            .iter()
            .map(|e| (e.key().clone(), e.value().clone()))
            .collect()
    }

    fn lock(&self) -> MutexGuard<'_, ()> {
        self.persist_lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Replace the backing file with `contents`.
    fn persist(&self, contents: &BTreeMap<String, Value>) -> StoreResult<()> {
        let encoded = serde_json::to_vec_pretty(contents).map_err(|source| {
            StoreError::Encode {
                key: "<store>".to_string(),
                source,
            }
        })?;

        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, &encoded)
            .and_then(|_| fs::rename(&tmp, &self.path))
            .map_err(|source| StoreError::Io {
                path: self.path.clone(),
                source,
            })
    }
}
