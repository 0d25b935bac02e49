//! Backup and restore of every collection as one snapshot document.
//!
//! # Invariants
//! - Import writes every row through `RecordStore::add`, so duplicate
//!   detection is identical to interactive inserts.
//! - A malformed collection entry is skipped; only unparseable input or a
//!   storage failure aborts the import.

use crate::store::StoreError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod snapshot;

pub use snapshot::{
    export_json, export_snapshot, import_json, import_snapshot, ImportOptions, ImportReport,
    RejectedRow, Snapshot,
};

pub type TransferResult<T> = Result<T, TransferError>;

#[derive(Debug)]
pub enum TransferError {
    /// Input is not JSON, or its root is not a collection map.
    MalformedSnapshot(String),
    Store(StoreError),
}

impl Display for TransferError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MalformedSnapshot(message) => write!(f, "malformed snapshot: {message}"),
            Self::Store(err) => write!(f, "{err}"),
        }
    }
}

impl Error for TransferError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::MalformedSnapshot(_) => None,
            Self::Store(err) => Some(err),
        }
    }
}

impl From<StoreError> for TransferError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}
