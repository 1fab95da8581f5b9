//! CSV export of the anomaly report and the daily view.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use crate::analytics::aggregate::DailyAggregate;

/// Column header of the downloadable anomaly report.
const ANOMALY_HEADER: &str = "day,energy_kwh_sum,z_score";

/// Column header of the daily view export.
const DAILY_HEADER: &str = "day,energy_kwh_sum,carbon_emission_kg_sum,\
                            z_score,is_anomaly,rolling_7day_avg";

/// Writes the anomaly report for `daily` to a file.
///
/// Only flagged days are written, in chronological order.
///
/// # Errors
///
/// Returns an `io::Error` if file creation or writing fails.
pub fn export_anomalies(daily: &[DailyAggregate], path: &Path) -> io::Result<()> {
    let file = File::create(path)?;
    write_anomalies(daily, io::BufWriter::new(file))
}

/// Writes the anomaly report as CSV to any writer.
///
/// # Errors
///
/// Returns an `io::Error` if writing fails.
pub fn write_anomalies(daily: &[DailyAggregate], writer: impl Write) -> io::Result<()> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);
    wtr.write_record(ANOMALY_HEADER.split(','))?;

    for d in daily.iter().filter(|d| d.is_anomaly) {
        wtr.write_record(&[
            d.day.to_string(),
            format!("{:.4}", d.energy_kwh_sum),
            optional(d.z_score.value()),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}

/// Writes the full daily view to a file.
///
/// # Errors
///
/// Returns an `io::Error` if file creation or writing fails.
pub fn export_daily(daily: &[DailyAggregate], path: &Path) -> io::Result<()> {
    let file = File::create(path)?;
    write_daily(daily, io::BufWriter::new(file))
}

/// Writes the daily view as CSV to any writer. Undefined values are empty cells.
///
/// # Errors
///
/// Returns an `io::Error` if writing fails.
pub fn write_daily(daily: &[DailyAggregate], writer: impl Write) -> io::Result<()> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);
    wtr.write_record(DAILY_HEADER.split(',').map(str::trim))?;

    for d in daily {
        wtr.write_record(&[
            d.day.to_string(),
            format!("{:.4}", d.energy_kwh_sum),
            format!("{:.4}", d.carbon_emission_kg_sum),
            optional(d.z_score.value()),
            d.is_anomaly.to_string(),
            optional(d.rolling_7day_avg),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}

fn optional(value: Option<f64>) -> String {
    value.map(|v| format!("{v:.4}")).unwrap_or_default()
}
