//! Merges raw chart series into canonical records.

use crate::error::{Error, Result};
use crate::model::{ConsumptionRecord, ProductionRecord, RawSeries, RawSeriesPoint, RecordSet};
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, Offset, Timelike, Utc};
use std::collections::BTreeMap;

/// Canonical record timestamp format.
pub const RECORD_DATE_FORMAT: &str = "%Y-%m-%d %H:%M";

// Epoch labels at or above this magnitude are milliseconds.
const EPOCH_MILLIS_THRESHOLD: i64 = 100_000_000_000;

const DATE_TIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%d.%m.%Y %H:%M:%S",
    "%d.%m.%Y %H:%M",
    "%d.%m.%Y. %H:%M",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d.%m.%Y", "%d.%m.%Y."];

#[derive(Debug, Clone)]
pub struct RecordNormalizer {
    offset: FixedOffset,
}

impl Default for RecordNormalizer {
    fn default() -> Self {
        Self::utc()
    }
}

impl RecordNormalizer {
    pub fn utc() -> Self {
        Self {
            offset: Utc.fix(),
        }
    }

    /// Normalizer rendering epoch labels at `minutes` east of UTC.
    ///
    /// Returns `None` for offsets of a day or more.
    pub fn with_offset_minutes(minutes: i32) -> Option<Self> {
        let offset = FixedOffset::east_opt(minutes.checked_mul(60)?)?;
        Some(Self { offset })
    }

    /// Parses one portal label into a wall-clock timestamp.
    ///
    /// Accepts epoch seconds or milliseconds, ISO-8601 and RFC 3339 text,
    /// Latvian `DD.MM.YYYY` dates with or without a time, and `MM.YYYY`
    /// month labels.
    pub fn parse_label(&self, label: &str) -> Option<NaiveDateTime> {
        let label = label.trim();
        if label.is_empty() {
            return None;
        }

        if let Ok(epoch) = label.parse::<i64>() {
            let utc = if epoch.abs() >= EPOCH_MILLIS_THRESHOLD {
                DateTime::from_timestamp_millis(epoch)?
            } else {
                DateTime::from_timestamp(epoch, 0)?
            };
            return Some(utc.with_timezone(&self.offset).naive_local());
        }

        if let Ok(timestamp) = DateTime::parse_from_rfc3339(label) {
            return Some(timestamp.with_timezone(&self.offset).naive_local());
        }
        for format in DATE_TIME_FORMATS {
            if let Ok(timestamp) = NaiveDateTime::parse_from_str(label, format) {
                return Some(timestamp);
            }
        }
        for format in DATE_FORMATS {
            if let Ok(date) = NaiveDate::parse_from_str(label, format) {
                return date.and_hms_opt(0, 0, 0);
            }
        }
        // MM.YYYY
        NaiveDate::parse_from_str(&format!("01.{}", label), "%d.%m.%Y")
            .ok()
            .and_then(|date| date.and_hms_opt(0, 0, 0))
    }

    fn accumulate(
        &self,
        merged: &mut BTreeMap<NaiveDateTime, (f64, f64)>,
        series: &'static str,
        points: &[RawSeriesPoint],
        production: bool,
    ) -> Result<()> {
        for point in points {
            let timestamp = self
                .parse_label(&point.label)
                .and_then(|timestamp| timestamp.with_second(0))
                .and_then(|timestamp| timestamp.with_nanosecond(0))
                .ok_or_else(|| Error::malformed_timestamp(series, point.label.as_str()))?;
            let entry = merged.entry(timestamp).or_insert((0.0, 0.0));
            if production {
                entry.1 += point.value;
            } else {
                entry.0 += point.value;
            }
        }
        Ok(())
    }

    /// Merges both series by timestamp into ascending, de-duplicated records.
    ///
    /// A timestamp missing from one series contributes zero for it. Labels that
    /// resolve to the same minute are summed. The production field is emitted
    /// only when the production series has at least one point.
    pub fn normalize(&self, raw: RawSeries) -> Result<RecordSet> {
        let mut merged = BTreeMap::new();
        self.accumulate(&mut merged, "consumption", &raw.consumption, false)?;
        self.accumulate(&mut merged, "production", &raw.production, true)?;

        let records = if raw.production.is_empty() {
            RecordSet::ConsumptionOnly(
                merged
                    .into_iter()
                    .map(|(timestamp, (consumption, _))| ConsumptionRecord {
                        date: timestamp.format(RECORD_DATE_FORMAT).to_string(),
                        consumption,
                    })
                    .collect(),
            )
        } else {
            RecordSet::WithProduction(
                merged
                    .into_iter()
                    .map(|(timestamp, (consumption, production))| ProductionRecord {
                        date: timestamp.format(RECORD_DATE_FORMAT).to_string(),
                        consumption,
                        production,
                    })
                    .collect(),
            )
        };
        tracing::debug!(
            records = records.len(),
            production = records.has_production(),
            "Normalized chart series"
        );
        Ok(records)
    }
}
