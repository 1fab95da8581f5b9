//! Shared CSV fixtures for integration tests.

use std::fmt::Write as _;
use std::path::PathBuf;
use std::sync::Arc;

use chrono::{Duration, NaiveDate, NaiveDateTime};
use energy_insights::ingest::{self, DataSource, LoadCache, RawDataset, TimestampPolicy};
use tempfile::TempDir;

/// Header of every fixture: UCI column names plus two auxiliary sensors.
pub const HEADER: &str = "date,Appliances,lights,T1,RH_1";

/// Absolute tolerance for floating comparisons.
pub const EPS: f64 = 1e-9;

/// Monday 2016-01-11, the first day of the UCI dataset.
pub fn monday() -> NaiveDate {
    NaiveDate::from_ymd_opt(2016, 1, 11).expect("valid date")
}

/// One reading per day at noon, with power chosen so each day's energy sum
/// equals the matching entry of `daily_kwh`.
pub fn daily_csv(start: NaiveDate, daily_kwh: &[f64]) -> String {
    let mut csv = format!("{HEADER}\n");
    for (i, kwh) in daily_kwh.iter().enumerate() {
        let day = start + Duration::days(i as i64);
        let _ = writeln!(csv, "{day} 12:00:00,{},10,20.5,45.0", kwh * 60.0);
    }
    csv
}

/// Consecutive one-minute readings from `start`.
pub fn minute_csv(start: NaiveDateTime, powers: &[f64]) -> String {
    let mut csv = format!("{HEADER}\n");
    for (i, p) in powers.iter().enumerate() {
        let ts = start + Duration::minutes(i as i64);
        let t1 = 19.0 + (i % 7) as f64 * 0.5;
        let _ = writeln!(
            csv,
            "{},{p},{},{t1},{}",
            ts.format("%Y-%m-%d %H:%M:%S"),
            (i % 3) * 10,
            40.0 - t1
        );
    }
    csv
}

/// Parses fixture text with the strict policy.
pub fn parse(csv: &str) -> RawDataset {
    ingest::load_reader(csv.as_bytes(), TimestampPolicy::Strict).expect("fixture parses")
}

/// Writes `content` to `name` inside a fresh temp directory.
///
/// The directory must outlive the returned path.
pub fn write_upload(name: &str, content: &str) -> (TempDir, PathBuf) {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join(name);
    std::fs::write(&path, content).expect("write fixture");
    (dir, path)
}

/// Loads `path` the way an upload is loaded.
pub fn load_upload(path: PathBuf) -> Arc<RawDataset> {
    ingest::load(&DataSource::Upload(path), &LoadCache::new()).expect("upload loads")
}

pub fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() < EPS
}

/// Routes pipeline logs through the test harness; honours `RUST_LOG`.
pub fn logging_init() {
    energy_insights::logging::init_test();
}
