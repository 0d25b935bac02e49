//! Snapshot export and import.
//!
//! Document shape: `{ "exportedAt": RFC3339, "data": { "<collection>": [..] } }`.
//! Import also accepts the bare collection map at the top level.

use super::{TransferError, TransferResult};
use crate::model::collection::Collection;
use crate::model::record::{generate_id, needs_generated_id, record_id};
use crate::store::{RecordStore, StoreError, StoreResult};
use chrono::{SecondsFormat, Utc};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

const GENERATED_ID_ATTEMPTS: usize = 3;

/// Full export of every collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub exported_at: String,
    pub data: BTreeMap<String, Vec<Value>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportOptions {
    /// `true`: add alongside existing rows. `false`: clear each collection
    /// present in the snapshot before inserting its rows.
    pub merge: bool,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self { merge: true }
    }
}

/// One row the store refused during import.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedRow {
    pub collection: Collection,
    pub id: Option<String>,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportReport {
    pub inserted: usize,
    /// Rows refused by `add` (duplicate id, not an object, unusable id).
    pub rejected: Vec<RejectedRow>,
    /// Entries that were not a known collection holding an array.
    pub skipped_collections: Vec<String>,
}

/// Reads every collection into one snapshot.
pub fn export_snapshot(store: &RecordStore) -> StoreResult<Snapshot> {
    let mut data = BTreeMap::new();
    for collection in Collection::ALL {
        data.insert(collection.as_str().to_string(), store.get_all(collection)?);
    }
    Ok(Snapshot {
        exported_at: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        data,
    })
}

/// Exports a pretty-printed JSON snapshot.
pub fn export_json(store: &RecordStore) -> TransferResult<String> {
    let snapshot = export_snapshot(store)?;
    let rows: usize = snapshot.data.values().map(Vec::len).sum();
    let rendered = serde_json::to_string_pretty(&snapshot)
        .map_err(|err| TransferError::MalformedSnapshot(err.to_string()))?;
    info!("event=snapshot_export module=transfer status=ok rows={rows}");
    Ok(rendered)
}

/// Parses `input` and imports it.
pub fn import_json(
    store: &RecordStore,
    input: &str,
    options: ImportOptions,
) -> TransferResult<ImportReport> {
    let document: Value = serde_json::from_str(input)
        .map_err(|err| TransferError::MalformedSnapshot(err.to_string()))?;
    import_snapshot(store, &document, options)
}

/// Imports every collection present in `document`.
///
/// Rows lacking an id get a generated one. Rows the store rejects are
/// reported and skipped; storage failures abort the import.
pub fn import_snapshot(
    store: &RecordStore,
    document: &Value,
    options: ImportOptions,
) -> TransferResult<ImportReport> {
    let collections = collection_map(document)?;
    let mut report = ImportReport::default();

    for (name, rows) in collections {
        let (Some(collection), Some(rows)) = (Collection::parse(name), rows.as_array()) else {
            warn!(
                "event=snapshot_import module=transfer status=skip reason=malformed_collection collection={name}"
            );
            report.skipped_collections.push(name.clone());
            continue;
        };

        if !options.merge {
            store.clear(collection)?;
        }
        for row in rows {
            import_row(store, collection, row, &mut report)?;
        }
    }

    info!(
        "event=snapshot_import module=transfer status=ok merge={} inserted={} rejected={} skipped_collections={}",
        options.merge,
        report.inserted,
        report.rejected.len(),
        report.skipped_collections.len()
    );
    Ok(report)
}

fn collection_map(document: &Value) -> TransferResult<&Map<String, Value>> {
    match document.get("data") {
        Some(Value::Object(data)) => Ok(data),
        Some(_) => Err(TransferError::MalformedSnapshot(
            "`data` must be an object of collections".to_string(),
        )),
        None | Some(Value::Null) => document.as_object().ok_or_else(|| {
            TransferError::MalformedSnapshot("snapshot root must be an object".to_string())
        }),
    }
}

fn import_row(
    store: &RecordStore,
    collection: Collection,
    row: &Value,
    report: &mut ImportReport,
) -> TransferResult<()> {
    let generate = row.is_object() && needs_generated_id(row);
    let attempts = if generate { GENERATED_ID_ATTEMPTS } else { 1 };
    let mut row = row.clone();

    for attempt in 1..=attempts {
        if generate {
            if let Some(fields) = row.as_object_mut() {
                fields.insert("id".to_string(), Value::String(generate_id()));
            }
        }

        match store.add(collection, row.clone()) {
            Ok(_) => {
                report.inserted += 1;
                return Ok(());
            }
            Err(StoreError::DuplicateKey { .. }) if generate && attempt < attempts => continue,
            Err(err @ (StoreError::DuplicateKey { .. } | StoreError::InvalidRecord { .. })) => {
                report.rejected.push(RejectedRow {
                    collection,
                    id: record_id(&row).map(str::to_string),
                    reason: err.to_string(),
                });
                return Ok(());
            }
            Err(err) => return Err(err.into()),
        }
    }

    Ok(())
}
