//! Duplicate suppression for scanner-generated notifications.
//!
//! # Invariants
//! - A candidate matching an existing notification on the policy key is
//!   never inserted.
//! - The activity entry is written only after the notification insert
//!   succeeds.

use crate::model::collection::Collection;
use crate::model::notification::{ActivityEntry, Notification};
use crate::store::{RecordStore, StorageError, StoreResult};
use log::debug;
use serde_json::Value;

/// Which notification fields identify "the same logical event".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DedupPolicy {
    /// `(relatedId, type, when)`.
    ///
    /// `when` is the generation timestamp, so only candidates created at the
    /// same instant collapse; repeated scans on the same day still insert.
    #[default]
    ExactWhen,
    /// `(relatedId, type, meta.days)`: one notification per record and
    /// threshold, across runs.
    PerThreshold,
}

impl DedupPolicy {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ExactWhen => "exact_when",
            Self::PerThreshold => "per_threshold",
        }
    }

    fn matches(self, candidate: &Notification, existing: &Value) -> bool {
        let same_subject = existing.get("relatedId").and_then(Value::as_str)
            == Some(candidate.related_id.as_str())
            && existing.get("type").and_then(Value::as_str) == Some(candidate.kind.as_str());
        if !same_subject {
            return false;
        }

        match self {
            Self::ExactWhen => {
                existing.get("when").and_then(Value::as_str) == Some(candidate.when.as_str())
            }
            Self::PerThreshold => {
                let existing_days = existing
                    .get("meta")
                    .and_then(|meta| meta.get("days"))
                    .and_then(Value::as_i64);
                existing_days.is_some() && existing_days == candidate.days()
            }
        }
    }
}

/// Write guard in front of the notifications collection.
pub struct Deduplicator<'store> {
    store: &'store RecordStore,
    policy: DedupPolicy,
}

impl<'store> Deduplicator<'store> {
    pub fn new(store: &'store RecordStore, policy: DedupPolicy) -> Self {
        Self { store, policy }
    }

    /// Inserts `candidate` unless an equivalent notification exists.
    ///
    /// Returns `true` when the notification (and its activity entry) was
    /// written, `false` when it was suppressed.
    pub fn submit_once(&self, candidate: &Notification) -> StoreResult<bool> {
        let existing = self.store.get_all(Collection::Notifications)?;
        if existing
            .iter()
            .any(|notification| self.policy.matches(candidate, notification))
        {
            debug!(
                "event=notification_submit module=notify status=skip reason=duplicate related_id={} type={} policy={}",
                candidate.related_id,
                candidate.kind.as_str(),
                self.policy.as_str()
            );
            return Ok(false);
        }

        let record = encode(Collection::Notifications, candidate.to_record())?;
        self.store.add(Collection::Notifications, record)?;

        let activity = ActivityEntry::for_notification(candidate, candidate.when.clone());
        self.store
            .add(Collection::Activity, encode(Collection::Activity, activity.to_record())?)?;

        debug!(
            "event=notification_submit module=notify status=ok related_id={} type={}",
            candidate.related_id,
            candidate.kind.as_str()
        );
        Ok(true)
    }
}

fn encode(
    collection: Collection,
    encoded: Result<Value, serde_json::Error>,
) -> Result<Value, StorageError> {
    encoded.map_err(|source| StorageError::Serialization {
        key: collection.as_str().to_string(),
        source,
    })
}
