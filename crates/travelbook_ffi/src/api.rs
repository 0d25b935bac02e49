//! FFI use-case API for Flutter-facing calls.
//!
//! # Responsibility
//! - Expose the record store, snapshot transfer and expiry scan to Dart via
//!   FRB as synchronous calls.
//! - Hold the single process-wide store handle the UI talks to.
//!
//! # Invariants
//! - Exported functions must not panic across the FFI boundary.
//! - Records cross the boundary as JSON strings.
//! - `init_store` binds the handle once; later calls report the existing
//!   backend instead of reopening.

use std::path::PathBuf;
use std::sync::{Arc, Mutex, OnceLock, PoisonError};
use travelbook_core::{
    core_version as core_version_inner, ensure_id, export_json, import_json,
    init_logging as init_logging_inner, ping as ping_inner, Collection, ExpiryScanner,
    ExpiryScheduler, ImportOptions, RecordStore, ScanConfig, StoreConfig,
};

const DATA_DIR_ENV: &str = "TRAVELBOOK_DATA_DIR";
const DEFAULT_DATA_DIR_NAME: &str = "travelbook";

static STORE: OnceLock<Arc<RecordStore>> = OnceLock::new();
static SCHEDULER: Mutex<Option<Arc<ExpiryScheduler>>> = Mutex::new(None);

/// Minimal health-check API for FRB smoke integration.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Expose core crate version through FFI.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// Returns an empty string on success and the error message otherwise.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err,
    }
}

/// Generic response envelope for store calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreResponse {
    pub ok: bool,
    /// Record id, backend name or exported JSON, depending on the call.
    pub value: Option<String>,
    /// Human-readable message for diagnostics/UI.
    pub message: String,
}

impl StoreResponse {
    fn success(message: impl Into<String>, value: Option<String>) -> Self {
        Self {
            ok: true,
            value,
            message: message.into(),
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            value: None,
            message: message.into(),
        }
    }
}

/// Rows returned by `store_get_all`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreRowsResponse {
    /// One JSON document per record.
    pub rows: Vec<String>,
    pub message: String,
}

/// Opens the process-wide store under `data_dir`.
///
/// `data_dir = None` resolves `TRAVELBOOK_DATA_DIR`, then the system temp
/// directory. `value` carries the selected backend name.
#[flutter_rust_bridge::frb(sync)]
pub fn init_store(data_dir: Option<String>) -> StoreResponse {
    if let Some(store) = STORE.get() {
        return StoreResponse::success(
            "Store already initialized.",
            Some(store.backend_kind().as_str().to_string()),
        );
    }

    let config = StoreConfig::for_data_dir(resolve_data_dir(data_dir)).with_env_overrides();
    match RecordStore::open(&config) {
        Ok(store) => {
            let store = STORE.get_or_init(|| Arc::new(store));
            StoreResponse::success(
                "Store initialized.",
                Some(store.backend_kind().as_str().to_string()),
            )
        }
        Err(err) => StoreResponse::failure(format!("init_store failed: {err}")),
    }
}

/// Inserts one JSON record; `value` carries the stored id.
///
/// A missing or empty `id` is generated.
#[flutter_rust_bridge::frb(sync)]
pub fn store_add(collection: String, record_json: String) -> StoreResponse {
    let result = with_store(&collection, |store, collection| {
        let record = serde_json::from_str(&record_json)
            .map_err(|err| format!("record is not valid JSON: {err}"))?;
        store
            .add(collection, ensure_id(record))
            .map_err(|err| err.to_string())
    });
    match result {
        Ok(id) => StoreResponse::success("Record added.", Some(id)),
        Err(err) => StoreResponse::failure(format!("store_add failed: {err}")),
    }
}

/// Lists every record of a collection as JSON strings.
#[flutter_rust_bridge::frb(sync)]
pub fn store_get_all(collection: String) -> StoreRowsResponse {
    let result = with_store(&collection, |store, collection| {
        store.get_all(collection).map_err(|err| err.to_string())
    });
    match result {
        Ok(rows) => StoreRowsResponse {
            message: format!("Found {} record(s).", rows.len()),
            rows: rows.iter().map(|row| row.to_string()).collect(),
        },
        Err(err) => StoreRowsResponse {
            rows: Vec::new(),
            message: format!("store_get_all failed: {err}"),
        },
    }
}

/// Deletes a record by id; absent ids succeed with a distinct message.
#[flutter_rust_bridge::frb(sync)]
pub fn store_delete(collection: String, id: String) -> StoreResponse {
    let id = id.trim();
    let result = with_store(&collection, |store, collection| {
        store.delete(collection, id).map_err(|err| err.to_string())
    });
    match result {
        Ok(true) => StoreResponse::success("Record deleted.", Some(id.to_string())),
        Ok(false) => StoreResponse::success("No record with that id.", None),
        Err(err) => StoreResponse::failure(format!("store_delete failed: {err}")),
    }
}

/// Counts records in a collection; `value` carries the decimal count.
#[flutter_rust_bridge::frb(sync)]
pub fn store_count(collection: String) -> StoreResponse {
    let result = with_store(&collection, |store, collection| {
        store.count(collection).map_err(|err| err.to_string())
    });
    match result {
        Ok(count) => StoreResponse::success("Counted.", Some(count.to_string())),
        Err(err) => StoreResponse::failure(format!("store_count failed: {err}")),
    }
}

/// Exports every collection; `value` carries the pretty-printed snapshot.
#[flutter_rust_bridge::frb(sync)]
pub fn export_snapshot() -> StoreResponse {
    match active_store().and_then(|store| export_json(&store).map_err(|err| err.to_string())) {
        Ok(json) => StoreResponse::success("Snapshot exported.", Some(json)),
        Err(err) => StoreResponse::failure(format!("export_snapshot failed: {err}")),
    }
}

/// Imports a snapshot document (`merge = false` replaces listed collections).
#[flutter_rust_bridge::frb(sync)]
pub fn import_snapshot(snapshot_json: String, merge: bool) -> StoreResponse {
    let result = active_store().and_then(|store| {
        import_json(&store, &snapshot_json, ImportOptions { merge }).map_err(|err| err.to_string())
    });
    match result {
        Ok(report) => StoreResponse::success(
            format!(
                "Imported {} record(s); {} rejected; {} collection(s) skipped.",
                report.inserted,
                report.rejected.len(),
                report.skipped_collections.len()
            ),
            Some(report.inserted.to_string()),
        ),
        Err(err) => StoreResponse::failure(format!("import_snapshot failed: {err}")),
    }
}

/// Runs one expiry scan now; `value` carries the inserted count.
#[flutter_rust_bridge::frb(sync)]
pub fn run_expiry_scan() -> StoreResponse {
    let config = ScanConfig::default();
    let result = active_store().and_then(|store| {
        ExpiryScanner::new(&store, &config)
            .scan()
            .map_err(|err| err.to_string())
    });
    match result {
        Ok(report) => StoreResponse::success(
            format!(
                "Scanned {} record(s); {} notification(s) created.",
                report.scanned, report.inserted
            ),
            Some(report.inserted.to_string()),
        ),
        Err(err) => StoreResponse::failure(format!("run_expiry_scan failed: {err}")),
    }
}

/// Starts the hourly expiry scheduler on a background thread.
///
/// Idempotent: calls are serialized and only the first successful one
/// spawns the loop. Returns an empty string on success and the error
/// message otherwise.
#[flutter_rust_bridge::frb(sync)]
pub fn start_expiry_scheduler() -> String {
    let store = match active_store() {
        Ok(store) => store,
        Err(err) => return err,
    };
    let mut slot = SCHEDULER.lock().unwrap_or_else(PoisonError::into_inner);
    if slot.is_some() {
        return String::new();
    }

    let scheduler = Arc::new(ExpiryScheduler::new(store, ScanConfig::default()));
    match spawn_scheduler(Arc::clone(&scheduler)) {
        Ok(()) => {
            log::info!("event=scheduler_spawn module=ffi status=ok");
            *slot = Some(scheduler);
            String::new()
        }
        Err(err) => {
            log::error!("event=scheduler_spawn module=ffi status=error error={err}");
            format!("start_expiry_scheduler failed: {err}")
        }
    }
}

fn spawn_scheduler(scheduler: Arc<ExpiryScheduler>) -> std::io::Result<()> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()?;
    std::thread::Builder::new()
        .name("travelbook-expiry".to_string())
        .spawn(move || runtime.block_on(scheduler.run()))
        .map(|_| ())
}

fn resolve_data_dir(data_dir: Option<String>) -> PathBuf {
    let explicit = data_dir
        .map(|raw| raw.trim().to_string())
        .filter(|raw| !raw.is_empty());
    if let Some(dir) = explicit {
        return PathBuf::from(dir);
    }
    if let Ok(raw) = std::env::var(DATA_DIR_ENV) {
        let trimmed = raw.trim();
        if !trimmed.is_empty() {
            return PathBuf::from(trimmed);
        }
    }
    std::env::temp_dir().join(DEFAULT_DATA_DIR_NAME)
}

fn active_store() -> Result<Arc<RecordStore>, String> {
    STORE
        .get()
        .cloned()
        .ok_or_else(|| "store is not initialized; call init_store first".to_string())
}

fn with_store<T>(
    collection: &str,
    f: impl FnOnce(&RecordStore, Collection) -> Result<T, String>,
) -> Result<T, String> {
    let collection = Collection::parse(collection.trim())
        .ok_or_else(|| format!("unknown collection `{}`", collection.trim()))?;
    let store = active_store()?;
    f(&store, collection)
}
