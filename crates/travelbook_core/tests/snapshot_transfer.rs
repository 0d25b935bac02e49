use serde_json::{json, Value};
use std::collections::HashSet;
use travelbook_core::db::open_db_in_memory;
use travelbook_core::{
    export_json, export_snapshot, import_json, import_snapshot, Collection, ImportOptions,
    RecordStore, TransferError,
};

fn memory_store() -> RecordStore {
    RecordStore::from_connection(open_db_in_memory().unwrap())
}

fn sorted_ids(store: &RecordStore, collection: Collection) -> Vec<String> {
    let mut ids: Vec<String> = store
        .get_all(collection)
        .unwrap()
        .iter()
        .map(|row| row["id"].as_str().unwrap().to_string())
        .collect();
    ids.sort();
    ids
}

#[test]
fn export_contains_timestamp_and_every_collection() {
    let store = memory_store();
    store
        .add(Collection::Clients, json!({"id": "c1", "name": "Ahmed"}))
        .unwrap();

    let snapshot = export_snapshot(&store).unwrap();
    assert!(chrono::DateTime::parse_from_rfc3339(&snapshot.exported_at).is_ok());
    assert_eq!(snapshot.data.len(), Collection::ALL.len());
    assert_eq!(snapshot.data["clients"], vec![json!({"id": "c1", "name": "Ahmed"})]);
    assert!(snapshot.data["workvisas"].is_empty());
}

#[test]
fn export_then_import_into_empty_store_reproduces_collections() {
    let source = memory_store();
    source.add(Collection::Clients, json!({"id": "c1", "name": "Ahmed"})).unwrap();
    source.add(Collection::Clients, json!({"id": "c2", "name": "Sara"})).unwrap();
    source
        .add(Collection::Visas, json!({"id": "v1", "client": "Ahmed", "expiry": "2026-12-01"}))
        .unwrap();
    source
        .add(Collection::Activity, json!({"id": "a1", "when": "x", "text": "created"}))
        .unwrap();

    let exported = export_json(&source).unwrap();

    let dir = tempfile::tempdir().unwrap();
    let target = RecordStore::open(&travelbook_core::StoreConfig::fallback_only(dir.path())).unwrap();
    let report = import_json(&target, &exported, ImportOptions::default()).unwrap();

    assert_eq!(report.inserted, 4);
    assert!(report.rejected.is_empty());
    for collection in Collection::ALL {
        let mut expected = source.get_all(collection).unwrap();
        let mut actual = target.get_all(collection).unwrap();
        expected.sort_by_key(|row| row["id"].as_str().unwrap_or_default().to_string());
        actual.sort_by_key(|row| row["id"].as_str().unwrap_or_default().to_string());
        assert_eq!(actual, expected, "collection {collection}");
    }
}

#[test]
fn import_assigns_distinct_ids_to_rows_without_id() {
    let store = memory_store();
    let document = json!({
        "data": {
            "clients": [{"name": "A"}, {"name": "B"}, {"name": "C", "id": ""}],
            "flights": [{"flightNo": "EK1"}, {"flightNo": "EK2", "id": null}]
        }
    });

    let report = import_snapshot(&store, &document, ImportOptions::default()).unwrap();
    assert_eq!(report.inserted, 5);

    let clients = sorted_ids(&store, Collection::Clients);
    let flights = sorted_ids(&store, Collection::Flights);
    let all: HashSet<&String> = clients.iter().chain(flights.iter()).collect();
    assert_eq!(all.len(), 5);
    assert!(all.iter().all(|id| !id.is_empty()));
}

#[test]
fn import_accepts_bare_collection_map() {
    let store = memory_store();
    let report = import_json(
        &store,
        r#"{"visas": [{"id": "v1", "expiry": "2026-11-01"}]}"#,
        ImportOptions::default(),
    )
    .unwrap();

    assert_eq!(report.inserted, 1);
    assert_eq!(store.count(Collection::Visas).unwrap(), 1);
}

#[test]
fn colliding_ids_are_rejected_per_row_without_aborting() {
    let store = memory_store();
    store.add(Collection::Clients, json!({"id": "c1", "name": "original"})).unwrap();

    let document = json!({"clients": [{"id": "c1", "name": "copy"}, {"id": "c2"}]});
    let report = import_snapshot(&store, &document, ImportOptions::default()).unwrap();

    assert_eq!(report.inserted, 1);
    assert_eq!(report.rejected.len(), 1);
    assert_eq!(report.rejected[0].collection, Collection::Clients);
    assert_eq!(report.rejected[0].id.as_deref(), Some("c1"));
    let stored: Vec<Value> = store.get_all(Collection::Clients).unwrap();
    assert!(stored.contains(&json!({"id": "c1", "name": "original"})));
    assert_eq!(sorted_ids(&store, Collection::Clients), vec!["c1", "c2"]);
}

#[test]
fn malformed_collections_are_skipped() {
    let store = memory_store();
    let document = json!({
        "data": {
            "clients": "not an array",
            "passports": [{"id": "p1"}],
            "visas": [{"id": "v1"}, 42]
        }
    });

    let report = import_snapshot(&store, &document, ImportOptions::default()).unwrap();
    assert_eq!(report.inserted, 1);
    assert_eq!(report.rejected.len(), 1);
    let mut skipped = report.skipped_collections.clone();
    skipped.sort();
    assert_eq!(skipped, vec!["clients", "passports"]);
}

#[test]
fn unparseable_input_is_malformed_snapshot() {
    let store = memory_store();
    let err = import_json(&store, "{ nope", ImportOptions::default()).unwrap_err();
    assert!(matches!(err, TransferError::MalformedSnapshot(_)));

    let err = import_json(&store, "[1, 2, 3]", ImportOptions::default()).unwrap_err();
    assert!(matches!(err, TransferError::MalformedSnapshot(_)));
}

#[test]
fn replace_mode_clears_only_collections_in_snapshot() {
    let store = memory_store();
    store.add(Collection::Clients, json!({"id": "old"})).unwrap();
    store.add(Collection::Flights, json!({"id": "kept"})).unwrap();

    let document = json!({"data": {"clients": [{"id": "new"}]}});
    let report = import_snapshot(&store, &document, ImportOptions { merge: false }).unwrap();

    assert_eq!(report.inserted, 1);
    assert_eq!(sorted_ids(&store, Collection::Clients), vec!["new"]);
    assert_eq!(sorted_ids(&store, Collection::Flights), vec!["kept"]);
}
