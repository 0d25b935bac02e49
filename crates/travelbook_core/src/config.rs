//! Runtime configuration for the record store and expiry scanner.
//!
//! # Responsibility
//! - Resolve where each backend keeps its data.
//! - Carry scanner cadence, thresholds and dedup policy.
//!
//! # Invariants
//! - `StoreConfig::db_path = None` always selects the flat fallback.
//! - Thresholds are whole days; only exact matches fire.

use crate::notify::dedup::DedupPolicy;
use crate::store::flat::DEFAULT_NAMESPACE;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// SQLite file name inside a data directory.
pub const DB_FILE_NAME: &str = "travelbook.sqlite3";
/// Flat fallback directory name inside a data directory.
pub const FALLBACK_DIR_NAME: &str = "flat";
/// Set to `1`/`true` to skip the transactional backend entirely.
pub const FORCE_FALLBACK_ENV: &str = "TRAVELBOOK_FORCE_FALLBACK";

pub const DEFAULT_SCAN_INTERVAL: Duration = Duration::from_secs(60 * 60);
pub const DEFAULT_THRESHOLDS: [i64; 3] = [2, 7, 30];

/// Backend locations for one store handle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// SQLite database file; `None` forces the fallback.
    pub db_path: Option<PathBuf>,
    /// Directory for flat key-value items.
    pub fallback_dir: PathBuf,
    /// Key prefix for collection arrays in the fallback.
    pub namespace: String,
}

impl StoreConfig {
    /// Lays both backends out under one data directory.
    pub fn for_data_dir(data_dir: impl AsRef<Path>) -> Self {
        let data_dir = data_dir.as_ref();
        Self {
            db_path: Some(data_dir.join(DB_FILE_NAME)),
            fallback_dir: data_dir.join(FALLBACK_DIR_NAME),
            namespace: DEFAULT_NAMESPACE.to_string(),
        }
    }

    /// Same layout, but never attempts the transactional backend.
    pub fn fallback_only(data_dir: impl AsRef<Path>) -> Self {
        Self {
            db_path: None,
            ..Self::for_data_dir(data_dir)
        }
    }

    /// Applies `TRAVELBOOK_FORCE_FALLBACK` when set to a truthy value.
    pub fn with_env_overrides(mut self) -> Self {
        if std::env::var(FORCE_FALLBACK_ENV)
            .map(|raw| is_truthy(&raw))
            .unwrap_or(false)
        {
            self.db_path = None;
        }
        self
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self::for_data_dir(std::env::temp_dir().join("travelbook"))
    }
}

/// Expiry scanner settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanConfig {
    /// Delay between scheduled runs after the first immediate run.
    pub interval: Duration,
    /// Day offsets that fire a notification.
    pub thresholds: Vec<i64>,
    pub dedup: DedupPolicy,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_SCAN_INTERVAL,
            thresholds: DEFAULT_THRESHOLDS.to_vec(),
            dedup: DedupPolicy::default(),
        }
    }
}

fn is_truthy(raw: &str) -> bool {
    matches!(
        raw.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
