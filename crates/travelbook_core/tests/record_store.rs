use serde_json::{json, Value};
use tempfile::TempDir;
use travelbook_core::db::open_db_in_memory;
use travelbook_core::store::FlatStore;
use travelbook_core::{BackendKind, Collection, RecordStore, StorageError, StoreError};

/// One store per backend; the temp dir must outlive the store.
fn both_backends() -> Vec<(Option<TempDir>, RecordStore)> {
    let dir = tempfile::tempdir().unwrap();
    let flat = FlatStore::open(dir.path(), "ls_").unwrap();
    vec![
        (
            None,
            RecordStore::from_connection(open_db_in_memory().unwrap()),
        ),
        (Some(dir), RecordStore::from_flat(flat)),
    ]
}

#[test]
fn add_then_get_all_contains_record_once() {
    for (_dir, store) in both_backends() {
        let record = json!({"id": "c1", "name": "Ahmed", "phone": "+20 100"});
        let id = store.add(Collection::Clients, record.clone()).unwrap();
        assert_eq!(id, "c1");

        let all = store.get_all(Collection::Clients).unwrap();
        let matches: Vec<&Value> = all.iter().filter(|row| **row == record).collect();
        assert_eq!(matches.len(), 1, "backend {:?}", store.backend_kind());
    }
}

#[test]
fn duplicate_add_fails_and_leaves_collection_unchanged() {
    for (_dir, store) in both_backends() {
        store
            .add(Collection::Visas, json!({"id": "v1", "expiry": "2026-12-01"}))
            .unwrap();
        let before = store.get_all(Collection::Visas).unwrap();

        let err = store
            .add(Collection::Visas, json!({"id": "v1", "expiry": "2030-01-01"}))
            .unwrap_err();
        assert!(
            matches!(err, StoreError::DuplicateKey { collection: Collection::Visas, ref id } if id == "v1"),
            "backend {:?}: {err}",
            store.backend_kind()
        );
        assert_eq!(store.get_all(Collection::Visas).unwrap(), before);
    }
}

#[test]
fn same_id_is_allowed_in_different_collections() {
    for (_dir, store) in both_backends() {
        store.add(Collection::Clients, json!({"id": "x"})).unwrap();
        store.add(Collection::Flights, json!({"id": "x"})).unwrap();
        assert_eq!(store.count(Collection::Clients).unwrap(), 1);
        assert_eq!(store.count(Collection::Flights).unwrap(), 1);
    }
}

#[test]
fn delete_absent_is_noop_and_present_decrements_count() {
    for (_dir, store) in both_backends() {
        store.add(Collection::Flights, json!({"id": "f1"})).unwrap();
        store.add(Collection::Flights, json!({"id": "f2"})).unwrap();

        assert!(!store.delete(Collection::Flights, "missing").unwrap());
        assert_eq!(store.count(Collection::Flights).unwrap(), 2);

        assert!(store.delete(Collection::Flights, "f1").unwrap());
        assert_eq!(store.count(Collection::Flights).unwrap(), 1);
        let remaining = store.get_all(Collection::Flights).unwrap();
        assert_eq!(remaining, vec![json!({"id": "f2"})]);
    }
}

#[test]
fn records_without_string_id_are_rejected() {
    for (_dir, store) in both_backends() {
        for bad in [json!({"name": "no id"}), json!({"id": ""}), json!({"id": 5}), json!([1])] {
            let err = store.add(Collection::WorkVisas, bad).unwrap_err();
            assert!(matches!(err, StoreError::InvalidRecord { collection: Collection::WorkVisas, .. }));
        }
        assert_eq!(store.count(Collection::WorkVisas).unwrap(), 0);
    }
}

#[test]
fn clear_removes_every_record() {
    for (_dir, store) in both_backends() {
        store.add(Collection::Activity, json!({"id": "a1"})).unwrap();
        store.add(Collection::Activity, json!({"id": "a2"})).unwrap();

        assert_eq!(store.clear(Collection::Activity).unwrap(), 2);
        assert_eq!(store.count(Collection::Activity).unwrap(), 0);
        assert_eq!(store.clear(Collection::Activity).unwrap(), 0);
    }
}

#[test]
fn get_all_preserves_insertion_order_on_both_backends() {
    for (_dir, store) in both_backends() {
        for id in ["b", "a", "c"] {
            store.add(Collection::Clients, json!({"id": id})).unwrap();
        }
        let ids: Vec<String> = store
            .get_all(Collection::Clients)
            .unwrap()
            .iter()
            .map(|row| row["id"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(ids, vec!["b", "a", "c"]);
    }
}

#[test]
fn fallback_persists_across_handles() {
    let dir = tempfile::tempdir().unwrap();
    {
        let store = RecordStore::from_flat(FlatStore::open(dir.path(), "ls_").unwrap());
        store.add(Collection::Visas, json!({"id": "v1"})).unwrap();
    }
    let reopened = RecordStore::from_flat(FlatStore::open(dir.path(), "ls_").unwrap());
    assert_eq!(reopened.backend_kind(), BackendKind::Fallback);
    assert_eq!(reopened.count(Collection::Visas).unwrap(), 1);
}

#[test]
fn fallback_corruption_surfaces_storage_error() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("ls_clients.json"), "not an array").unwrap();
    let store = RecordStore::from_flat(FlatStore::open(dir.path(), "ls_").unwrap());

    let err = store.get_all(Collection::Clients).unwrap_err();
    assert!(matches!(
        err,
        StoreError::Storage(StorageError::Serialization { .. })
    ));
    let err = store.add(Collection::Clients, json!({"id": "c1"})).unwrap_err();
    assert!(matches!(err, StoreError::Storage(_)));
}

#[test]
fn concurrent_fallback_adds_do_not_lose_updates() {
    let dir = tempfile::tempdir().unwrap();
    let store = std::sync::Arc::new(RecordStore::from_flat(
        FlatStore::open(dir.path(), "ls_").unwrap(),
    ));

    let handles: Vec<_> = (0..4)
        .map(|worker| {
            let store = std::sync::Arc::clone(&store);
            std::thread::spawn(move || {
                for n in 0..10 {
                    store
                        .add(Collection::Notifications, json!({"id": format!("w{worker}-{n}")}))
                        .unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(store.count(Collection::Notifications).unwrap(), 40);
}
