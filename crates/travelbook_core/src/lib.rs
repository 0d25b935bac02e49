//! Core record store for travelbook.
//!
//! Dual-backend document storage (SQLite with a flat JSON fallback), snapshot
//! backup/restore, and the expiry scanner that derives notifications from
//! stored visas and flights.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod notify;
pub mod store;
pub mod transfer;

pub use config::{ScanConfig, StoreConfig};
pub use logging::{default_log_level, init_logging, logging_status, LogLevel};
pub use model::collection::Collection;
pub use model::record::ensure_id;
pub use model::notification::{ActivityEntry, Notification, NotificationKind};
pub use notify::dedup::{DedupPolicy, Deduplicator};
pub use notify::scanner::{day_offset, ExpiryScanner, ScanReport};
pub use notify::scheduler::ExpiryScheduler;
pub use store::{BackendKind, RecordStore, StorageError, StoreError, StoreResult};
pub use transfer::{
    export_json, export_snapshot, import_json, import_snapshot, ImportOptions, ImportReport,
    Snapshot, TransferError, TransferResult,
};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
