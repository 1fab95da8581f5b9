//! Scalar KPIs reduced from the aggregate views.

use std::fmt;

use chrono::NaiveDate;
use serde::Serialize;

use super::aggregate::{DailyAggregate, HourlyAggregate, WeekdayAggregate};

/// Day with the highest total energy.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PeakDay {
    pub day: NaiveDate,
    pub energy_kwh: f64,
}

/// Hour of day with the highest mean energy.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PeakHour {
    pub hour: u32,
    pub energy_kwh_mean: f64,
}

/// Weekday with the highest mean energy.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PeakWeekday {
    pub name: &'static str,
    pub energy_kwh_mean: f64,
}

/// Headline figures for the dashboard.
///
/// Computed from the finished views so the scalars always agree with the
/// tables they summarize. Extremes are `None` when there is no data; ties go
/// to the earliest day, the lowest hour, and the earliest weekday from Monday.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KpiReport {
    /// Sum of daily energy sums (kWh).
    pub total_energy_kwh: f64,
    /// Sum of daily carbon sums (kg CO2).
    pub total_carbon_kg: f64,
    /// Mean of daily energy sums (kWh).
    pub avg_daily_energy_kwh: Option<f64>,
    pub peak_day: Option<PeakDay>,
    pub peak_hour: Option<PeakHour>,
    pub best_weekday: Option<PeakWeekday>,
    /// Days flagged by the anomaly detector.
    pub anomaly_count: usize,
}

impl KpiReport {
    /// Reduces the three views to the KPI scalars.
    ///
    /// # Arguments
    ///
    /// * `daily` - Daily view in chronological order
    /// * `hourly` - Hourly view, hour 0 first
    /// * `weekday` - Weekday view, Monday first
    pub fn from_views(
        daily: &[DailyAggregate],
        hourly: &[HourlyAggregate],
        weekday: &[WeekdayAggregate],
    ) -> Self {
        let total_energy_kwh: f64 = daily.iter().map(|d| d.energy_kwh_sum).sum();
        let total_carbon_kg: f64 = daily.iter().map(|d| d.carbon_emission_kg_sum).sum();
        let avg_daily_energy_kwh =
            (!daily.is_empty()).then(|| total_energy_kwh / daily.len() as f64);

        let peak_day = first_max(daily.iter().map(|d| (d, d.energy_kwh_sum))).map(|(d, e)| {
            PeakDay {
                day: d.day,
                energy_kwh: e,
            }
        });
        let peak_hour = first_max(
            hourly
                .iter()
                .filter_map(|h| h.energy_kwh_mean.map(|m| (h, m))),
        )
        .map(|(h, m)| PeakHour {
            hour: h.hour,
            energy_kwh_mean: m,
        });
        let best_weekday = first_max(
            weekday
                .iter()
                .filter_map(|w| w.energy_kwh_mean.map(|m| (w, m))),
        )
        .map(|(w, m)| PeakWeekday {
            name: w.name,
            energy_kwh_mean: m,
        });

        Self {
            total_energy_kwh,
            total_carbon_kg,
            avg_daily_energy_kwh,
            peak_day,
            peak_hour,
            best_weekday,
            anomaly_count: daily.iter().filter(|d| d.is_anomaly).count(),
        }
    }

    /// Whether any day contributed to the report.
    pub fn has_data(&self) -> bool {
        self.avg_daily_energy_kwh.is_some()
    }
}

/// First item holding the strict maximum; non-finite values are ignored.
fn first_max<T>(items: impl Iterator<Item = (T, f64)>) -> Option<(T, f64)> {
    items
        .filter(|(_, v)| v.is_finite())
        .fold(None, |best, (item, v)| match best {
            Some((_, b)) if v <= b => best,
            _ => Some((item, v)),
        })
}

impl fmt::Display for KpiReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- Energy Summary ---")?;
        if !self.has_data() {
            return write!(f, "No readings with valid timestamps; nothing to summarize.");
        }
        writeln!(f, "Total energy:          {:.2} kWh", self.total_energy_kwh)?;
        writeln!(f, "Total CO2 emissions:   {:.2} kg", self.total_carbon_kg)?;
        if let Some(avg) = self.avg_daily_energy_kwh {
            writeln!(f, "Avg daily usage:       {avg:.2} kWh")?;
        }
        if let Some(p) = self.peak_day {
            writeln!(f, "Peak day:              {} ({:.2} kWh)", p.day, p.energy_kwh)?;
        }
        if let Some(p) = self.peak_hour {
            writeln!(
                f,
                "Peak hour:             {}:00 ({:.3} kWh avg)",
                p.hour, p.energy_kwh_mean
            )?;
        }
        if let Some(p) = self.best_weekday {
            writeln!(
                f,
                "Highest usage weekday: {} ({:.3} kWh avg)",
                p.name, p.energy_kwh_mean
            )?;
        }
        write!(f, "Anomalous days:        {}", self.anomaly_count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::aggregate::WEEKDAY_ORDER;
    use crate::analytics::anomaly::ZScore;
    use crate::analytics::features::weekday_name;

    fn make_day(d: u32, energy: f64, is_anomaly: bool) -> DailyAggregate {
        DailyAggregate {
            day: NaiveDate::from_ymd_opt(2016, 2, d).expect("valid date"),
            energy_kwh_sum: energy,
            carbon_emission_kg_sum: energy * 0.5,
            z_score: ZScore::Undefined,
            is_anomaly,
            rolling_7day_avg: None,
        }
    }

    fn make_hours(means: &[(u32, f64)]) -> Vec<HourlyAggregate> {
        (0..24)
            .map(|hour| {
                let mean = means.iter().find(|(h, _)| *h == hour).map(|(_, m)| *m);
                HourlyAggregate {
                    hour,
                    energy_kwh_mean: mean,
                    samples: usize::from(mean.is_some()),
                }
            })
            .collect()
    }

    fn make_weekdays(means: [Option<f64>; 7]) -> Vec<WeekdayAggregate> {
        WEEKDAY_ORDER
            .into_iter()
            .zip(means)
            .map(|(day, mean)| WeekdayAggregate {
                weekday: day,
                name: weekday_name(day),
                energy_kwh_mean: mean,
                samples: usize::from(mean.is_some()),
            })
            .collect()
    }

    #[test]
    fn totals_and_average() {
        let daily = vec![make_day(1, 4.0, false), make_day(2, 6.0, true), make_day(3, 2.0, false)];
        let kpi = KpiReport::from_views(&daily, &make_hours(&[]), &make_weekdays([None; 7]));
        assert_eq!(kpi.total_energy_kwh, 12.0);
        assert_eq!(kpi.total_carbon_kg, 6.0);
        assert_eq!(kpi.avg_daily_energy_kwh, Some(4.0));
        assert_eq!(kpi.anomaly_count, 1);
        assert_eq!(kpi.peak_day.map(|p| p.day.to_string()), Some("2016-02-02".to_string()));
    }

    #[test]
    fn peak_day_tie_goes_to_earliest() {
        let daily = vec![make_day(1, 3.0, false), make_day(2, 7.0, false), make_day(3, 7.0, false)];
        let kpi = KpiReport::from_views(&daily, &make_hours(&[]), &make_weekdays([None; 7]));
        assert_eq!(kpi.peak_day.map(|p| p.day.to_string()), Some("2016-02-02".to_string()));
    }

    #[test]
    fn peak_hour_tie_goes_to_lowest_and_skips_empty() {
        let hours = make_hours(&[(3, 0.2), (19, 0.9), (21, 0.9)]);
        let kpi = KpiReport::from_views(&[], &hours, &make_weekdays([None; 7]));
        assert_eq!(kpi.peak_hour.map(|p| p.hour), Some(19));
    }

    #[test]
    fn best_weekday_tie_goes_to_earliest_from_monday() {
        let weekdays = make_weekdays([None, Some(1.0), None, None, Some(2.0), None, Some(2.0)]);
        let kpi = KpiReport::from_views(&[], &make_hours(&[]), &weekdays);
        assert_eq!(kpi.best_weekday.map(|p| p.name), Some("Friday"));
    }

    #[test]
    fn empty_views_report_absence() {
        let kpi = KpiReport::from_views(&[], &make_hours(&[]), &make_weekdays([None; 7]));
        assert!(!kpi.has_data());
        assert_eq!(kpi.total_energy_kwh, 0.0);
        assert_eq!(kpi.avg_daily_energy_kwh, None);
        assert!(kpi.peak_day.is_none());
        assert!(kpi.peak_hour.is_none());
        assert!(kpi.best_weekday.is_none());
        assert!(kpi.to_string().contains("nothing to summarize"));
    }

    #[test]
    fn display_lists_headline_figures() {
        let daily = vec![make_day(1, 4.0, false)];
        let kpi = KpiReport::from_views(
            &daily,
            &make_hours(&[(20, 0.5)]),
            &make_weekdays([Some(1.0), None, None, None, None, None, None]),
        );
        let text = kpi.to_string();
        assert!(text.contains("Peak hour:             20:00"));
        assert!(text.contains("Highest usage weekday: Monday"));
        assert!(text.contains("Peak day:              2016-02-01"));
    }
}
