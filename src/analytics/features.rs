//! Per-record derived fields: energy, carbon, and calendar keys.

use chrono::{Datelike, NaiveDate, NaiveDateTime, Timelike, Weekday};

use crate::ingest::{RawDataset, RawRecord};

/// Power samples per hour. Converting a power reading (W) to an energy
/// figure assumes one sample per minute; recalibrate if the source interval
/// differs.
pub const SAMPLES_PER_HOUR: f64 = 60.0;

/// A raw reading plus its derived fields.
#[derive(Debug, Clone, PartialEq)]
pub struct EnrichedRecord {
    pub timestamp: NaiveDateTime,
    /// Appliance power draw (W).
    pub appliance_power: f64,
    /// Lighting power draw (W).
    pub lights: Option<f64>,
    /// `appliance_power / SAMPLES_PER_HOUR`.
    pub energy_kwh: f64,
    /// `energy_kwh * carbon_intensity`.
    pub carbon_emission_kg: f64,
    /// Hour of day, 0-23.
    pub hour: u32,
    pub weekday: Weekday,
    /// Date component of `timestamp`; the daily grouping key.
    pub calendar_day: NaiveDate,
}

/// Enriched records ready for grouping.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EnrichedSet {
    pub records: Vec<EnrichedRecord>,
    /// Raw rows dropped because their timestamp was missing.
    pub excluded_rows: usize,
}

/// Derives fields for one record, or `None` when it has no timestamp.
pub fn enrich(record: &RawRecord, carbon_intensity: f64) -> Option<EnrichedRecord> {
    let timestamp = record.timestamp?;
    let energy_kwh = record.appliance_power / SAMPLES_PER_HOUR;
    Some(EnrichedRecord {
        timestamp,
        appliance_power: record.appliance_power,
        lights: record.lights,
        energy_kwh,
        carbon_emission_kg: energy_kwh * carbon_intensity,
        hour: timestamp.hour(),
        weekday: timestamp.weekday(),
        calendar_day: timestamp.date(),
    })
}

/// Maps every raw record through [`enrich`].
///
/// Pure: calling again with another coefficient needs no reload. Rows without
/// a timestamp are dropped and counted in [`EnrichedSet::excluded_rows`].
pub fn derive(raw: &RawDataset, carbon_intensity: f64) -> EnrichedSet {
    let records: Vec<EnrichedRecord> = raw
        .records
        .iter()
        .filter_map(|r| enrich(r, carbon_intensity))
        .collect();
    let excluded_rows = raw.records.len() - records.len();

    if excluded_rows > 0 {
        tracing::warn!(
            excluded_rows,
            "rows with unparseable timestamps excluded from aggregation"
        );
    }

    EnrichedSet {
        records,
        excluded_rows,
    }
}

/// Full English day name, as shown on the dashboard.
pub fn weekday_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}
