//! Domain model for stored collections and derived records.
//!
//! # Responsibility
//! - Name the fixed set of collections the store knows about.
//! - Provide id helpers shared by every free-form record.
//! - Define the typed shapes the scanner writes (notifications, activity).
//!
//! # Invariants
//! - Every stored record is a JSON object with a non-empty string `id`.
//! - Collection names are fixed and case-sensitive.

pub mod collection;
pub mod notification;
pub mod record;
