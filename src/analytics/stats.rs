//! Descriptive statistics over daily series.
//!
//! Standard deviation is the population form (divide by `n`) everywhere in
//! the crate, matching the z-score convention in [`super::anomaly`].

use std::cmp::Ordering;

use serde::Serialize;

use super::aggregate::DailyAggregate;

/// Arithmetic mean, `None` for an empty slice.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Population standard deviation (ddof = 0), `None` for an empty slice.
pub fn population_std(values: &[f64]) -> Option<f64> {
    let m = mean(values)?;
    let var = values.iter().map(|v| (v - m) * (v - m)).sum::<f64>() / values.len() as f64;
    Some(var.sqrt())
}

/// Summary table row for one series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Describe {
    pub count: usize,
    pub mean: f64,
    pub std: f64,
    pub min: f64,
    pub q25: f64,
    pub median: f64,
    pub q75: f64,
    pub max: f64,
}

/// Count, mean, spread and quartiles of `values`; `None` when empty.
///
/// Quartiles interpolate linearly between order statistics.
pub fn describe(values: &[f64]) -> Option<Describe> {
    let mean = mean(values)?;
    let std = population_std(values)?;
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    Some(Describe {
        count: sorted.len(),
        mean,
        std,
        min: sorted[0],
        q25: quantile(&sorted, 0.25),
        median: quantile(&sorted, 0.5),
        q75: quantile(&sorted, 0.75),
        max: sorted[sorted.len() - 1],
    })
}

fn quantile(sorted: &[f64], q: f64) -> f64 {
    let pos = q * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64)
}

/// The `n` highest-energy days, highest first; ties keep the earlier day first.
pub fn top_days(daily: &[DailyAggregate], n: usize) -> Vec<&DailyAggregate> {
    ranked(daily, n, |a, b| b.energy_kwh_sum.total_cmp(&a.energy_kwh_sum))
}

/// The `n` lowest-energy days, lowest first; ties keep the earlier day first.
pub fn bottom_days(daily: &[DailyAggregate], n: usize) -> Vec<&DailyAggregate> {
    ranked(daily, n, |a, b| a.energy_kwh_sum.total_cmp(&b.energy_kwh_sum))
}

fn ranked<F>(daily: &[DailyAggregate], n: usize, cmp: F) -> Vec<&DailyAggregate>
where
    F: Fn(&DailyAggregate, &DailyAggregate) -> Ordering,
{
    let mut days: Vec<&DailyAggregate> = daily.iter().collect();
    // stable sort: input is chronological
    days.sort_by(|a, b| cmp(a, b));
    days.truncate(n);
    days
}
