//! Notification and activity-log records written by the expiry scanner.
//!
//! # Invariants
//! - `when` marks generation time (RFC 3339, UTC), not the event date.
//! - Serialized field names match the stored document shape
//!   (`relatedStore`, `relatedId`, `type`).

use crate::model::collection::Collection;
use crate::model::record::generate_prefixed_id;
use serde::{Deserialize, Serialize};
use serde_json::Value;

const NOTIFICATION_ID_PREFIX: &str = "notif_";
const ACTIVITY_ID_PREFIX: &str = "act_";

/// Closed set of notification categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    /// A visa reaches a threshold before its `expiry`.
    VisaExpiry,
    /// A flight reaches a threshold before its `date`.
    FlightUpcoming,
}

impl NotificationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::VisaExpiry => "visa_expiry",
            Self::FlightUpcoming => "flight_upcoming",
        }
    }
}

/// Derived notification row stored in [`Collection::Notifications`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: String,
    /// Human-readable message.
    pub text: String,
    pub when: String,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    pub related_store: Collection,
    pub related_id: String,
    /// Raw event date plus `days` offset.
    pub meta: Value,
}

impl Notification {
    /// Builds a candidate with a freshly generated `notif_` id.
    pub fn new(
        kind: NotificationKind,
        text: impl Into<String>,
        when: impl Into<String>,
        related_store: Collection,
        related_id: impl Into<String>,
        meta: Value,
    ) -> Self {
        Self {
            id: generate_prefixed_id(NOTIFICATION_ID_PREFIX),
            text: text.into(),
            when: when.into(),
            kind,
            related_store,
            related_id: related_id.into(),
            meta,
        }
    }

    /// Day offset recorded in `meta.days`, if any.
    pub fn days(&self) -> Option<i64> {
        self.meta.get("days").and_then(Value::as_i64)
    }

    pub fn to_record(&self) -> Result<Value, serde_json::Error> {
        serde_json::to_value(self)
    }
}

/// Append-only audit entry stored in [`Collection::Activity`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityEntry {
    pub id: String,
    pub when: String,
    pub text: String,
}

impl ActivityEntry {
    /// Mirrors a stored notification into the activity log.
    pub fn for_notification(notification: &Notification, when: impl Into<String>) -> Self {
        Self {
            id: generate_prefixed_id(ACTIVITY_ID_PREFIX),
            when: when.into(),
            text: format!(
                "system: notification {} => {}",
                notification.kind.as_str(),
                notification.text
            ),
        }
    }

    pub fn to_record(&self) -> Result<Value, serde_json::Error> {
        serde_json::to_value(self)
    }
}

#[cfg(test)]
mod tests {
    use super::{ActivityEntry, Notification, NotificationKind};
    use crate::model::collection::Collection;
    use serde_json::json;

    fn sample() -> Notification {
        Notification::new(
            NotificationKind::VisaExpiry,
            "Visa for client Ahmed expires in 7 days",
            "2026-10-19T08:00:00.000Z",
            Collection::Visas,
            "v1",
            json!({"expiry": "2026-10-26", "days": 7}),
        )
    }

    #[test]
    fn notification_serializes_with_document_field_names() {
        let record = sample().to_record().unwrap();
        assert_eq!(record["type"], "visa_expiry");
        assert_eq!(record["relatedStore"], "visas");
        assert_eq!(record["relatedId"], "v1");
        assert_eq!(record["meta"]["days"], 7);
        assert!(record["id"].as_str().unwrap().starts_with("notif_"));
    }

    #[test]
    fn days_reads_meta_offset() {
        assert_eq!(sample().days(), Some(7));
    }

    #[test]
    fn activity_entry_mirrors_notification_text() {
        let entry = ActivityEntry::for_notification(&sample(), "now");
        assert!(entry.id.starts_with("act_"));
        assert_eq!(
            entry.text,
            "system: notification visa_expiry => Visa for client Ahmed expires in 7 days"
        );
    }
}
