//! Dual-backend record store.
//!
//! # Responsibility
//! - Pick the backend once per handle (SQLite, or flat JSON fallback).
//! - Expose uniform add/get_all/delete/count over named collections.
//!
//! # Invariants
//! - A handle never mixes backends across collections.
//! - Backend selection failures are logged and absorbed, never returned.
//! - `add` rejects an existing `id` on both backends.

use crate::db::DbError;
use crate::model::collection::Collection;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod flat;
pub mod record_store;
mod sqlite;

pub use flat::FlatStore;
pub use record_store::RecordStore;

pub type StoreResult<T> = Result<T, StoreError>;

/// Backend chosen for a store handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    /// SQLite database with one table per collection.
    Transactional,
    /// One serialized JSON array per collection in flat key-value files.
    Fallback,
}

impl BackendKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Transactional => "transactional",
            Self::Fallback => "fallback",
        }
    }
}

/// Physical storage failure from either backend (quota, IO, corrupt data).
#[derive(Debug)]
pub enum StorageError {
    Db(DbError),
    Io {
        key: String,
        source: std::io::Error,
    },
    Serialization {
        key: String,
        source: serde_json::Error,
    },
}

impl Display for StorageError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::Io { key, source } => write!(f, "storage io failure on `{key}`: {source}"),
            Self::Serialization { key, source } => {
                write!(f, "stored data for `{key}` is not valid JSON: {source}")
            }
        }
    }
}

impl Error for StorageError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Io { source, .. } => Some(source),
            Self::Serialization { source, .. } => Some(source),
        }
    }
}

impl From<DbError> for StorageError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for StorageError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Error returned by record store operations.
#[derive(Debug)]
pub enum StoreError {
    /// A record with the same `id` already exists in the collection.
    DuplicateKey { collection: Collection, id: String },
    /// The value is not an object or lacks a non-empty string `id`.
    InvalidRecord {
        collection: Collection,
        reason: &'static str,
    },
    Storage(StorageError),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DuplicateKey { collection, id } => {
                write!(f, "duplicate key `{id}` in collection `{collection}`")
            }
            Self::InvalidRecord { collection, reason } => {
                write!(f, "invalid record for collection `{collection}`: {reason}")
            }
            Self::Storage(err) => write!(f, "{err}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Storage(err) => Some(err),
            Self::DuplicateKey { .. } | Self::InvalidRecord { .. } => None,
        }
    }
}

impl From<StorageError> for StoreError {
    fn from(value: StorageError) -> Self {
        Self::Storage(value)
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Storage(value.into())
    }
}
