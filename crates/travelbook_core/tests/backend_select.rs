use serde_json::json;
use travelbook_core::{BackendKind, Collection, RecordStore, StoreConfig};

#[test]
fn open_prefers_transactional_backend() {
    let dir = tempfile::tempdir().unwrap();
    let store = RecordStore::open(&StoreConfig::for_data_dir(dir.path())).unwrap();

    assert_eq!(store.backend_kind(), BackendKind::Transactional);
    assert!(dir.path().join("travelbook.sqlite3").is_file());
}

#[test]
fn open_without_db_path_uses_fallback() {
    let dir = tempfile::tempdir().unwrap();
    let store = RecordStore::open(&StoreConfig::fallback_only(dir.path())).unwrap();

    assert_eq!(store.backend_kind(), BackendKind::Fallback);
    store.add(Collection::Clients, json!({"id": "c1"})).unwrap();
    assert!(dir.path().join("flat").join("ls_clients.json").is_file());
}

#[test]
fn unopenable_database_falls_back_for_every_collection() {
    let dir = tempfile::tempdir().unwrap();
    // A directory where the database file should be cannot be opened by SQLite.
    let db_path = dir.path().join("blocked.sqlite3");
    std::fs::create_dir_all(&db_path).unwrap();
    let config = StoreConfig {
        db_path: Some(db_path),
        ..StoreConfig::for_data_dir(dir.path())
    };

    let store = RecordStore::open(&config).unwrap();
    assert_eq!(store.backend_kind(), BackendKind::Fallback);
    for collection in Collection::ALL {
        store
            .add(collection, json!({"id": format!("{collection}-1")}))
            .unwrap();
        assert_eq!(store.count(collection).unwrap(), 1);
    }
}

#[test]
fn newer_schema_version_falls_back_instead_of_failing() {
    let dir = tempfile::tempdir().unwrap();
    let config = StoreConfig::for_data_dir(dir.path());
    let db_path = config.db_path.clone().unwrap();
    let conn = rusqlite::Connection::open(&db_path).unwrap();
    conn.execute_batch("PRAGMA user_version = 999;").unwrap();
    drop(conn);

    let store = RecordStore::open(&config).unwrap();
    assert_eq!(store.backend_kind(), BackendKind::Fallback);
}

#[test]
fn transactional_data_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let config = StoreConfig::for_data_dir(dir.path());
    {
        let store = RecordStore::open(&config).unwrap();
        store
            .add(Collection::Visas, json!({"id": "v1", "client": "Ahmed"}))
            .unwrap();
    }

    let reopened = RecordStore::open(&config).unwrap();
    assert_eq!(reopened.backend_kind(), BackendKind::Transactional);
    assert_eq!(
        reopened.get_all(Collection::Visas).unwrap(),
        vec![json!({"id": "v1", "client": "Ahmed"})]
    );
}

#[test]
fn isolated_handles_do_not_share_backend_choice() {
    let sqlite_dir = tempfile::tempdir().unwrap();
    let flat_dir = tempfile::tempdir().unwrap();

    let sqlite = RecordStore::open(&StoreConfig::for_data_dir(sqlite_dir.path())).unwrap();
    let flat = RecordStore::open(&StoreConfig::fallback_only(flat_dir.path())).unwrap();

    assert_eq!(sqlite.backend_kind(), BackendKind::Transactional);
    assert_eq!(flat.backend_kind(), BackendKind::Fallback);
}
