//! Raw meter readings as loaded, before any derived fields.

use std::collections::HashSet;

use chrono::{DateTime, NaiveDate, NaiveDateTime};

/// How to treat a timestamp cell that cannot be parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimestampPolicy {
    /// Abort the load with [`crate::error::LoadError::InvalidTimestamp`].
    Strict,
    /// Keep the row with a missing timestamp; it is excluded from grouping.
    Coerce,
}

/// One meter reading.
#[derive(Debug, Clone, PartialEq)]
pub struct RawRecord {
    /// Reading time; `None` when the source cell was unparseable.
    pub timestamp: Option<NaiveDateTime>,
    /// Appliance power draw (W).
    pub appliance_power: f64,
    /// Lighting power draw (W), when the source has a lights column.
    pub lights: Option<f64>,
    /// Auxiliary sensor values, parallel to [`RawDataset::aux_columns`].
    pub aux: Vec<Option<f64>>,
}

/// A loaded record set plus the column metadata needed by relationship views.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawDataset {
    /// Records in source order.
    pub records: Vec<RawRecord>,
    /// Names of the pass-through sensor columns.
    pub aux_columns: Vec<String>,
    /// Auxiliary columns holding at least one non-empty, non-numeric cell.
    pub non_numeric_columns: HashSet<String>,
    /// Whether the source carried a lights column.
    pub has_lights: bool,
}

impl RawDataset {
    /// Number of records whose timestamp is missing.
    pub fn missing_timestamps(&self) -> usize {
        self.records.iter().filter(|r| r.timestamp.is_none()).count()
    }

    /// Index of an auxiliary column by name.
    pub fn aux_index(&self, name: &str) -> Option<usize> {
        self.aux_columns.iter().position(|c| c == name)
    }
}

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%Y/%m/%d %H:%M:%S",
];

/// Parses a timestamp cell.
///
/// Offsets in RFC 3339 input are dropped and the wall-clock time kept. A bare
/// date maps to midnight.
pub fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    if let Some(ts) = DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
    {
        return Some(ts);
    }
    if let Ok(ts) = DateTime::parse_from_rfc3339(value) {
        return Some(ts.naive_local());
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}
