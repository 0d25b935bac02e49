//! Helpers for free-form JSON records.
//!
//! # Invariants
//! - Generated ids are `<unix millis><4 base36 chars>`: collision-resistant
//!   within one process, not globally unique.

use chrono::Utc;
use serde_json::Value;
use uuid::Uuid;

const ID_SUFFIX_LEN: usize = 4;

/// Returns the record's `id` when it is a non-empty string.
pub fn record_id(record: &Value) -> Option<&str> {
    record
        .get("id")
        .and_then(Value::as_str)
        .filter(|id| !id.is_empty())
}

/// Returns whether the record carries no usable `id` and should get one
/// assigned before insert.
///
/// Mirrors truthiness checks used by import callers: absent, `null`, `false`,
/// `0` and `""` all count as missing.
pub fn needs_generated_id(record: &Value) -> bool {
    match record.get("id") {
        None | Some(Value::Null) => true,
        Some(Value::String(id)) => id.is_empty(),
        Some(Value::Bool(flag)) => !flag,
        Some(Value::Number(number)) => number.as_f64() == Some(0.0),
        Some(_) => false,
    }
}

/// Fills a missing `id` on an object record; other values pass through.
pub fn ensure_id(mut record: Value) -> Value {
    if needs_generated_id(&record) {
        if let Some(fields) = record.as_object_mut() {
            fields.insert("id".to_string(), Value::String(generate_id()));
        }
    }
    record
}

/// Generates a new record id.
pub fn generate_id() -> String {
    format!("{}{}", Utc::now().timestamp_millis(), random_suffix(ID_SUFFIX_LEN))
}

/// Generates a new record id with a fixed prefix (e.g. `notif_`).
pub fn generate_prefixed_id(prefix: &str) -> String {
    format!("{prefix}{}", generate_id())
}

fn random_suffix(len: usize) -> String {
    let mut entropy = Uuid::new_v4().as_u128();
    (0..len)
        .map(|_| {
            let digit = (entropy % 36) as u32;
            entropy /= 36;
            char::from_digit(digit, 36).unwrap_or('0')
        })
        .collect()
}
