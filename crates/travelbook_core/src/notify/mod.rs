//! Expiry notifications derived from stored records.
//!
//! # Responsibility
//! - Compute day offsets for visas and flights against the local calendar.
//! - Raise one notification per exact threshold match, deduplicated.
//! - Re-run the scan on a fixed interval.
//!
//! # Invariants
//! - A failed run never stops later scheduled runs.
//! - Every inserted notification has a mirrored activity entry.

pub mod dedup;
pub mod scanner;
pub mod scheduler;
