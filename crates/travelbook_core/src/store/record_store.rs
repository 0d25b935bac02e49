//! Record store handle and backend dispatch.
//!
//! # Responsibility
//! - Select the backend once, when the handle is opened.
//! - Route every collection operation to that backend.
//!
//! # Invariants
//! - Fallback reads and writes of one collection happen under that
//!   collection's lock, so interleaved callers cannot lose updates.
//! - SQLite access is serialized through one connection mutex.
//! - Record contents are never logged; only ids, collections and outcomes.

use super::flat::FlatStore;
use super::{sqlite, BackendKind, StoreError, StoreResult};
use crate::config::StoreConfig;
use crate::db::{open_db, DbResult};
use crate::model::collection::Collection;
use crate::model::record::record_id;
use log::{debug, error, info, warn};
use rusqlite::Connection;
use serde_json::Value;
use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Physical storage behind a [`RecordStore`].
enum Backend {
    Transactional(Mutex<Connection>),
    Fallback(FlatStore),
}

/// Uniform CRUD over the fixed collections.
pub struct RecordStore {
    backend: Backend,
}

impl RecordStore {
    /// Opens a store, preferring SQLite and falling back to flat storage.
    ///
    /// Any SQLite open or bootstrap failure is logged and pins the fallback
    /// for this handle; it is never returned to the caller.
    ///
    /// # Errors
    /// - Returns `StoreError::Storage` only when the fallback directory cannot
    ///   be created.
    pub fn open(config: &StoreConfig) -> StoreResult<Self> {
        match config.db_path.as_deref() {
            Some(db_path) => match open_transactional(db_path) {
                Ok(conn) => {
                    info!(
                        "event=backend_select module=store status=ok backend={}",
                        BackendKind::Transactional.as_str()
                    );
                    return Ok(Self::from_connection(conn));
                }
                Err(err) => {
                    warn!(
                        "event=backend_select module=store status=fallback reason=db_unavailable error={err}"
                    );
                }
            },
            None => {
                info!("event=backend_select module=store status=fallback reason=disabled");
            }
        }

        let flat = FlatStore::open(&config.fallback_dir, config.namespace.as_str())?;
        Ok(Self::from_flat(flat))
    }

    /// Wraps an already bootstrapped SQLite connection.
    pub fn from_connection(conn: Connection) -> Self {
        Self {
            backend: Backend::Transactional(Mutex::new(conn)),
        }
    }

    pub fn from_flat(flat: FlatStore) -> Self {
        Self {
            backend: Backend::Fallback(flat),
        }
    }

    pub fn backend_kind(&self) -> BackendKind {
        match self.backend {
            Backend::Transactional(_) => BackendKind::Transactional,
            Backend::Fallback(_) => BackendKind::Fallback,
        }
    }

    /// Inserts one record and returns its id.
    ///
    /// # Errors
    /// - `InvalidRecord` when `record` is not an object with a string `id`.
    /// - `DuplicateKey` when the id already exists; the collection is left
    ///   unchanged.
    pub fn add(&self, collection: Collection, record: Value) -> StoreResult<String> {
        let id = validate_record(collection, &record)?;

        let result = match &self.backend {
            Backend::Transactional(conn) => sqlite::insert(&lock_conn(conn), collection, &id, &record),
            Backend::Fallback(flat) => flat_insert(flat, collection, &id, record),
        };

        log_mutation("record_add", collection, &id, self.backend_kind(), &result);
        result.map(|()| id)
    }

    /// Returns every record in the collection, in backend storage order.
    pub fn get_all(&self, collection: Collection) -> StoreResult<Vec<Value>> {
        match &self.backend {
            Backend::Transactional(conn) => sqlite::select_all(&lock_conn(conn), collection),
            Backend::Fallback(flat) => {
                let _guard = flat.lock(collection);
                Ok(flat.read_collection(collection)?)
            }
        }
    }

    /// Removes the record with `id`; absent ids are a no-op.
    ///
    /// Returns whether a record was removed.
    pub fn delete(&self, collection: Collection, id: &str) -> StoreResult<bool> {
        let result = match &self.backend {
            Backend::Transactional(conn) => sqlite::delete(&lock_conn(conn), collection, id),
            Backend::Fallback(flat) => flat_remove(flat, collection, id),
        };

        log_mutation("record_delete", collection, id, self.backend_kind(), &result);
        result
    }

    /// Number of records currently stored in the collection.
    pub fn count(&self, collection: Collection) -> StoreResult<usize> {
        match &self.backend {
            Backend::Transactional(conn) => sqlite::count(&lock_conn(conn), collection),
            Backend::Fallback(flat) => {
                let _guard = flat.lock(collection);
                Ok(flat.read_collection(collection)?.len())
            }
        }
    }

    /// Removes every record in the collection and returns how many were
    /// removed.
    pub fn clear(&self, collection: Collection) -> StoreResult<usize> {
        let result = match &self.backend {
            Backend::Transactional(conn) => sqlite::clear(&lock_conn(conn), collection),
            Backend::Fallback(flat) => flat_clear(flat, collection),
        };

        match &result {
            Ok(removed) => info!(
                "event=collection_clear module=store status=ok collection={collection} removed={removed}"
            ),
            Err(err) => error!(
                "event=collection_clear module=store status=error collection={collection} error={err}"
            ),
        }
        result
    }
}

fn open_transactional(db_path: &Path) -> DbResult<Connection> {
    if let Some(parent) = db_path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
        if let Err(err) = std::fs::create_dir_all(parent) {
            debug!(
                "event=backend_select module=store status=skip reason=db_dir_unavailable error={err}"
            );
        }
    }
    open_db(db_path)
}

fn flat_insert(flat: &FlatStore, collection: Collection, id: &str, record: Value) -> StoreResult<()> {
    let _guard = flat.lock(collection);
    let mut records = flat.read_collection(collection)?;
    if records
        .iter()
        .any(|existing| record_id(existing) == Some(id))
    {
        return Err(StoreError::DuplicateKey {
            collection,
            id: id.to_string(),
        });
    }
    records.push(record);
    flat.write_collection(collection, &records)?;
    Ok(())
}

fn flat_remove(flat: &FlatStore, collection: Collection, id: &str) -> StoreResult<bool> {
    let _guard = flat.lock(collection);
    let mut records = flat.read_collection(collection)?;
    let before = records.len();
    records.retain(|existing| record_id(existing) != Some(id));
    if records.len() == before {
        return Ok(false);
    }
    flat.write_collection(collection, &records)?;
    Ok(true)
}

fn flat_clear(flat: &FlatStore, collection: Collection) -> StoreResult<usize> {
    let _guard = flat.lock(collection);
    let removed = flat.read_collection(collection)?.len();
    flat.remove_item(&flat.collection_key(collection))?;
    Ok(removed)
}

fn lock_conn(conn: &Mutex<Connection>) -> MutexGuard<'_, Connection> {
    conn.lock().unwrap_or_else(PoisonError::into_inner)
}

fn validate_record(collection: Collection, record: &Value) -> StoreResult<String> {
    if !record.is_object() {
        return Err(StoreError::InvalidRecord {
            collection,
            reason: "record must be a JSON object",
        });
    }
    record_id(record)
        .map(str::to_string)
        .ok_or(StoreError::InvalidRecord {
            collection,
            reason: "record must carry a non-empty string `id`",
        })
}

fn log_mutation<T>(
    event: &str,
    collection: Collection,
    id: &str,
    backend: BackendKind,
    result: &StoreResult<T>,
) {
    match result {
        Ok(_) => debug!(
            "event={event} module=store status=ok collection={collection} id={id} backend={}",
            backend.as_str()
        ),
        Err(StoreError::Storage(err)) => error!(
            "event={event} module=store status=error collection={collection} id={id} backend={} error={err}",
            backend.as_str()
        ),
        Err(err) => debug!(
            "event={event} module=store status=rejected collection={collection} id={id} error={err}"
        ),
    }
}
