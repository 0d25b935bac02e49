//! One expiry scan over visas and flights.
//!
//! # Invariants
//! - Day offsets are whole local-calendar days between today and the event
//!   date; the time of day on either side is ignored.
//! - A threshold fires only when the offset equals it exactly. A day on
//!   which no scan runs is not caught up later.
//! - Records without a parseable date or a string `id` are skipped.

use super::dedup::Deduplicator;
use crate::config::ScanConfig;
use crate::model::collection::Collection;
use crate::model::notification::{Notification, NotificationKind};
use crate::model::record::record_id;
use crate::store::{RecordStore, StoreResult};
use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use log::info;
use serde_json::{json, Value};
use std::time::Instant;

/// Which collection to read, which field holds the event date, and how to
/// phrase the notification.
struct ScanTarget {
    collection: Collection,
    date_field: &'static str,
    kind: NotificationKind,
    message: fn(&Value, i64) -> String,
}

const SCAN_TARGETS: [ScanTarget; 2] = [
    ScanTarget {
        collection: Collection::Visas,
        date_field: "expiry",
        kind: NotificationKind::VisaExpiry,
        message: visa_message,
    },
    ScanTarget {
        collection: Collection::Flights,
        date_field: "date",
        kind: NotificationKind::FlightUpcoming,
        message: flight_message,
    },
];

/// Outcome counters for one scan run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanReport {
    /// Records read across all scanned collections.
    pub scanned: usize,
    /// Records without a usable date or id.
    pub skipped: usize,
    /// Threshold matches submitted to the deduplicator.
    pub candidates: usize,
    /// Candidates that were actually written.
    pub inserted: usize,
}

pub struct ExpiryScanner<'a> {
    store: &'a RecordStore,
    config: &'a ScanConfig,
}

impl<'a> ExpiryScanner<'a> {
    pub fn new(store: &'a RecordStore, config: &'a ScanConfig) -> Self {
        Self { store, config }
    }

    /// Runs one scan against the current local time.
    pub fn scan(&self) -> StoreResult<ScanReport> {
        self.scan_at(Local::now())
    }

    /// Runs one scan as if the local clock read `now`.
    ///
    /// Every candidate of this run carries `now` as its `when`.
    pub fn scan_at(&self, now: DateTime<Local>) -> StoreResult<ScanReport> {
        let started_at = Instant::now();
        let today = now.date_naive();
        let when = now
            .with_timezone(&Utc)
            .to_rfc3339_opts(SecondsFormat::Millis, true);
        let dedup = Deduplicator::new(self.store, self.config.dedup);
        let mut report = ScanReport::default();

        for target in &SCAN_TARGETS {
            for record in self.store.get_all(target.collection)? {
                report.scanned += 1;
                let Some(related_id) = record_id(&record) else {
                    report.skipped += 1;
                    continue;
                };
                let raw_date = record.get(target.date_field).cloned().unwrap_or(Value::Null);
                let Some(days) = day_offset(&raw_date, today) else {
                    report.skipped += 1;
                    continue;
                };

                for &threshold in self.config.thresholds.iter().filter(|&&t| t == days) {
                    let candidate = Notification::new(
                        target.kind,
                        (target.message)(&record, threshold),
                        when.clone(),
                        target.collection,
                        related_id,
                        json!({ target.date_field: raw_date.clone(), "days": days }),
                    );
                    report.candidates += 1;
                    if dedup.submit_once(&candidate)? {
                        report.inserted += 1;
                    }
                }
            }
        }

        info!(
            "event=expiry_scan module=notify status=ok scanned={} skipped={} candidates={} inserted={} duration_ms={}",
            report.scanned,
            report.skipped,
            report.candidates,
            report.inserted,
            started_at.elapsed().as_millis()
        );
        Ok(report)
    }
}

/// Whole days from `today` to the event date in `raw`.
///
/// Accepts `YYYY-MM-DD`, RFC 3339 timestamps (converted to local time),
/// naive `YYYY-MM-DDTHH:MM[:SS]` local timestamps and epoch milliseconds.
/// Returns `None` for anything else.
pub fn day_offset(raw: &Value, today: NaiveDate) -> Option<i64> {
    let event_date = parse_event_date(raw)?;
    Some((event_date - today).num_days())
}

fn parse_event_date(raw: &Value) -> Option<NaiveDate> {
    match raw {
        Value::String(text) => parse_date_text(text.trim()),
        Value::Number(number) => number
            .as_i64()
            .and_then(DateTime::<Utc>::from_timestamp_millis)
            .map(|instant| instant.with_timezone(&Local).date_naive()),
        _ => None,
    }
}

fn parse_date_text(text: &str) -> Option<NaiveDate> {
    if text.is_empty() {
        return None;
    }
    if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        return Some(date);
    }
    if let Ok(instant) = DateTime::parse_from_rfc3339(text) {
        return Some(instant.with_timezone(&Local).date_naive());
    }
    [
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M:%S",
    ]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
        .map(|local| local.date())
}

fn visa_message(record: &Value, days: i64) -> String {
    format!(
        "Visa for client {} expires in {days} {}",
        text_field(record, "client"),
        day_unit(days)
    )
}

fn flight_message(record: &Value, days: i64) -> String {
    format!(
        "Flight {} for client {} departs in {days} {}",
        text_field(record, "flightNo"),
        text_field(record, "client"),
        day_unit(days)
    )
}

fn text_field<'r>(record: &'r Value, field: &str) -> &'r str {
    record.get(field).and_then(Value::as_str).unwrap_or_default()
}

fn day_unit(days: i64) -> &'static str {
    if days == 1 {
        "day"
    } else {
        "days"
    }
}
