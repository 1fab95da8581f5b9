//! Daily, hourly and weekday aggregate views.
//!
//! Each view is an independent grouping pass over the same enriched record
//! slice.

use std::collections::BTreeMap;

use chrono::{NaiveDate, Weekday};
use serde::Serialize;

use super::anomaly::{self, ZScore};
use super::features::{EnrichedRecord, weekday_name};

/// Trailing window, in daily rows, of the rolling energy average.
pub const ROLLING_WINDOW_DAYS: usize = 7;

/// Hours in a day; the hourly view always has this many rows.
pub const HOURS_PER_DAY: u32 = 24;

/// Canonical weekday order for the weekday view.
pub const WEEKDAY_ORDER: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

/// Energy and carbon totals for one calendar day.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DailyTotal {
    pub day: NaiveDate,
    pub energy_kwh_sum: f64,
    pub carbon_emission_kg_sum: f64,
}

/// One row of the daily view.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyAggregate {
    pub day: NaiveDate,
    pub energy_kwh_sum: f64,
    pub carbon_emission_kg_sum: f64,
    pub z_score: ZScore,
    pub is_anomaly: bool,
    /// Mean of the trailing 7 daily energy sums; `None` for the first 6 rows.
    pub rolling_7day_avg: Option<f64>,
}

/// One row of the hourly view.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HourlyAggregate {
    pub hour: u32,
    /// `None` when no record fell in this hour.
    pub energy_kwh_mean: Option<f64>,
    pub samples: usize,
}

/// One row of the weekday view.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct WeekdayAggregate {
    #[serde(skip)]
    pub weekday: Weekday,
    /// Full day name, e.g. `"Monday"`.
    pub name: &'static str,
    /// `None` when no record fell on this weekday.
    pub energy_kwh_mean: Option<f64>,
    pub samples: usize,
}

/// Sums energy and carbon per calendar day, in ascending date order.
pub fn daily_totals(records: &[EnrichedRecord]) -> Vec<DailyTotal> {
    let mut by_day: BTreeMap<NaiveDate, (f64, f64)> = BTreeMap::new();
    for r in records {
        let entry = by_day.entry(r.calendar_day).or_default();
        entry.0 += r.energy_kwh;
        entry.1 += r.carbon_emission_kg;
    }
    by_day
        .into_iter()
        .map(|(day, (energy, carbon))| DailyTotal {
            day,
            energy_kwh_sum: energy,
            carbon_emission_kg_sum: carbon,
        })
        .collect()
}

/// Builds the daily view: totals, z-score flags and rolling average.
///
/// # Arguments
///
/// * `records` - Enriched records, any order
/// * `z_threshold` - Absolute z-score a day must strictly exceed to be flagged
pub fn daily(records: &[EnrichedRecord], z_threshold: f64) -> Vec<DailyAggregate> {
    let totals = daily_totals(records);
    let energy: Vec<f64> = totals.iter().map(|t| t.energy_kwh_sum).collect();
    let scores = anomaly::score(&energy, z_threshold);
    let rolling = rolling_mean(&energy, ROLLING_WINDOW_DAYS);

    totals
        .into_iter()
        .zip(scores)
        .zip(rolling)
        .map(|((t, s), avg)| DailyAggregate {
            day: t.day,
            energy_kwh_sum: t.energy_kwh_sum,
            carbon_emission_kg_sum: t.carbon_emission_kg_sum,
            z_score: s.z_score,
            is_anomaly: s.is_anomaly,
            rolling_7day_avg: avg,
        })
        .collect()
}

/// Mean energy per hour of day; always 24 rows, hour 0 first.
pub fn hourly(records: &[EnrichedRecord]) -> Vec<HourlyAggregate> {
    let mut sums = [(0.0_f64, 0_usize); HOURS_PER_DAY as usize];
    for r in records {
        let bucket = &mut sums[r.hour as usize];
        bucket.0 += r.energy_kwh;
        bucket.1 += 1;
    }
    (0..HOURS_PER_DAY)
        .zip(sums)
        .map(|(hour, (sum, samples))| HourlyAggregate {
            hour,
            energy_kwh_mean: (samples > 0).then(|| sum / samples as f64),
            samples,
        })
        .collect()
}

/// Mean energy per weekday, Monday first.
pub fn weekday(records: &[EnrichedRecord]) -> Vec<WeekdayAggregate> {
    let mut sums = [(0.0_f64, 0_usize); 7];
    for r in records {
        let bucket = &mut sums[r.weekday.num_days_from_monday() as usize];
        bucket.0 += r.energy_kwh;
        bucket.1 += 1;
    }
    WEEKDAY_ORDER
        .into_iter()
        .zip(sums)
        .map(|(day, (sum, samples))| WeekdayAggregate {
            weekday: day,
            name: weekday_name(day),
            energy_kwh_mean: (samples > 0).then(|| sum / samples as f64),
            samples,
        })
        .collect()
}

/// Trailing mean over `window` consecutive values, including the current one.
///
/// The first `window - 1` positions have no full window and yield `None`.
pub fn rolling_mean(values: &[f64], window: usize) -> Vec<Option<f64>> {
    if window == 0 {
        return vec![None; values.len()];
    }
    (0..values.len())
        .map(|i| {
            (i + 1 >= window)
                .then(|| values[i + 1 - window..=i].iter().sum::<f64>() / window as f64)
        })
        .collect()
}
