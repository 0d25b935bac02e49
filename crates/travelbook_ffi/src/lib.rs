//! Flutter-facing bindings for the travelbook record store.

pub mod api;
