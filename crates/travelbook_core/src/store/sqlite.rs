//! SQLite statements for the transactional backend.
//!
//! Table names come from the closed [`Collection`] set, so they are safe to
//! interpolate.

use super::{StorageError, StoreError, StoreResult};
use crate::model::collection::Collection;
use rusqlite::{params, Connection};
use serde_json::Value;

pub(super) fn insert(
    conn: &Connection,
    collection: Collection,
    id: &str,
    record: &Value,
) -> StoreResult<()> {
    let body = encode(collection, record)?;
    let inserted = conn.execute(
        &format!("INSERT OR IGNORE INTO {} (id, body) VALUES (?1, ?2);", collection.as_str()),
        params![id, body],
    )?;
    if inserted == 0 {
        return Err(StoreError::DuplicateKey {
            collection,
            id: id.to_string(),
        });
    }
    Ok(())
}

pub(super) fn select_all(conn: &Connection, collection: Collection) -> StoreResult<Vec<Value>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT body FROM {} ORDER BY rowid ASC;",
        collection.as_str()
    ))?;
    let mut rows = stmt.query([])?;
    let mut records = Vec::new();

    while let Some(row) = rows.next()? {
        let body: String = row.get(0)?;
        let record = serde_json::from_str(&body).map_err(|source| StorageError::Serialization {
            key: collection.as_str().to_string(),
            source,
        })?;
        records.push(record);
    }

    Ok(records)
}

pub(super) fn delete(conn: &Connection, collection: Collection, id: &str) -> StoreResult<bool> {
    let changed = conn.execute(
        &format!("DELETE FROM {} WHERE id = ?1;", collection.as_str()),
        [id],
    )?;
    Ok(changed > 0)
}

pub(super) fn count(conn: &Connection, collection: Collection) -> StoreResult<usize> {
    let total: i64 = conn.query_row(
        &format!("SELECT COUNT(*) FROM {};", collection.as_str()),
        [],
        |row| row.get(0),
    )?;
    Ok(usize::try_from(total).unwrap_or_default())
}

pub(super) fn clear(conn: &Connection, collection: Collection) -> StoreResult<usize> {
    let removed = conn.execute(&format!("DELETE FROM {};", collection.as_str()), [])?;
    Ok(removed)
}

fn encode(collection: Collection, record: &Value) -> Result<String, StorageError> {
    serde_json::to_string(record).map_err(|source| StorageError::Serialization {
        key: collection.as_str().to_string(),
        source,
    })
}
