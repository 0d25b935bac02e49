//! Flat key-value fallback storage.
//!
//! Each key is one file in the storage directory holding a UTF-8 string.
//! Collections live under `<namespace><collection>` as one serialized JSON
//! array; every mutation rewrites the whole array.
//!
//! # Invariants
//! - A missing key reads as an empty collection.
//! - Writes land through a temp file + rename, so readers never observe a
//!   half-written array.
//! - Read-modify-write cycles on one collection are serialized through
//!   [`FlatStore::lock`]; callers must hold the guard across the cycle.

use super::StorageError;
use crate::model::collection::Collection;
use serde_json::Value;
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Default key namespace for collection arrays.
pub const DEFAULT_NAMESPACE: &str = "ls_";

const ITEM_EXTENSION: &str = "json";

pub struct FlatStore {
    dir: PathBuf,
    namespace: String,
    locks: [Mutex<()>; Collection::COUNT],
}

impl FlatStore {
    /// Opens (creating if needed) a flat store rooted at `dir`.
    pub fn open(dir: impl Into<PathBuf>, namespace: impl Into<String>) -> Result<Self, StorageError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|source| StorageError::Io {
            key: dir.display().to_string(),
            source,
        })?;
        Ok(Self {
            dir,
            namespace: namespace.into(),
            locks: Default::default(),
        })
    }

    /// Storage key holding the given collection's array.
    pub fn collection_key(&self, collection: Collection) -> String {
        format!("{}{}", self.namespace, collection.as_str())
    }

    /// Reads a raw item; `None` when the key was never written.
    pub fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        match fs::read_to_string(self.item_path(key)) {
            Ok(value) => Ok(Some(value)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StorageError::Io {
                key: key.to_string(),
                source,
            }),
        }
    }

    /// Replaces a raw item.
    pub fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let path = self.item_path(key);
        let staging = path.with_extension(format!("{ITEM_EXTENSION}.tmp"));
        let io_error = |source| StorageError::Io {
            key: key.to_string(),
            source,
        };
        fs::write(&staging, value).map_err(io_error)?;
        fs::rename(&staging, &path).map_err(io_error)
    }

    /// Removes a raw item; absent keys are ignored.
    pub fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        match fs::remove_file(self.item_path(key)) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(source) => Err(StorageError::Io {
                key: key.to_string(),
                source,
            }),
        }
    }

    /// Serializes access to one collection's array.
    pub fn lock(&self, collection: Collection) -> MutexGuard<'_, ()> {
        self.locks[collection.index()]
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Loads a collection's full array.
    pub fn read_collection(&self, collection: Collection) -> Result<Vec<Value>, StorageError> {
        let key = self.collection_key(collection);
        match self.get_item(&key)? {
            None => Ok(Vec::new()),
            Some(raw) if raw.trim().is_empty() => Ok(Vec::new()),
            Some(raw) => {
                serde_json::from_str(&raw).map_err(|source| StorageError::Serialization { key, source })
            }
        }
    }

    /// Rewrites a collection's full array.
    pub fn write_collection(
        &self,
        collection: Collection,
        records: &[Value],
    ) -> Result<(), StorageError> {
        let key = self.collection_key(collection);
        let raw = serde_json::to_string(records).map_err(|source| StorageError::Serialization {
            key: key.clone(),
            source,
        })?;
        self.set_item(&key, &raw)
    }

    fn item_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.{ITEM_EXTENSION}"))
    }
}
