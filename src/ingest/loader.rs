//! CSV loading from a local file or the fixed remote source.

use std::collections::HashSet;
use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use csv::StringRecord;

use super::cache::LoadCache;
use super::record::{RawDataset, RawRecord, TimestampPolicy, parse_timestamp};
use crate::error::LoadError;

/// Name of the timestamp column.
pub const TIMESTAMP_COLUMN: &str = "date";

/// Accepted headers for the appliance power column. The first is the UCI name.
const APPLIANCE_COLUMNS: &[&str] = &["Appliances", "Appliance_Power", "appliance_power"];

/// Accepted headers for the lights column.
const LIGHTS_COLUMNS: &[&str] = &["lights", "Lights"];

/// Where a raw dataset comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataSource {
    /// Fixed remote CSV, fetched once and cached per URL.
    Remote { url: String, timeout: Duration },
    /// User-supplied CSV file.
    Upload(PathBuf),
}

impl DataSource {
    /// Timestamp policy for this source: strict for the curated remote file,
    /// coercing for uploads.
    pub fn timestamp_policy(&self) -> TimestampPolicy {
        match self {
            Self::Remote { .. } => TimestampPolicy::Strict,
            Self::Upload(_) => TimestampPolicy::Coerce,
        }
    }
}

/// Loads a dataset, going through `cache` for remote sources.
///
/// Uploads are always read fresh.
///
/// # Errors
///
/// Returns a `LoadError` if the source cannot be read or parsed.
pub fn load(source: &DataSource, cache: &LoadCache) -> Result<Arc<RawDataset>, LoadError> {
    match source {
        DataSource::Remote { url, timeout } => {
            cache.get_or_load(url, || fetch_remote(url, *timeout))
        }
        DataSource::Upload(path) => load_path(path, source.timestamp_policy()).map(Arc::new),
    }
}

/// Reads a CSV file from disk.
///
/// # Errors
///
/// Returns `LoadError::Io` if the file cannot be opened, or any parse error
/// from [`load_reader`].
pub fn load_path(path: &Path, policy: TimestampPolicy) -> Result<RawDataset, LoadError> {
    let file = File::open(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let dataset = load_reader(io::BufReader::new(file), policy)?;
    tracing::info!(
        path = %path.display(),
        rows = dataset.records.len(),
        "loaded uploaded CSV"
    );
    Ok(dataset)
}

/// Fetches and parses the remote CSV.
///
/// The call blocks for at most `timeout`.
///
/// # Errors
///
/// Returns `LoadError::Http` on network failure or a non-success status.
#[cfg(feature = "remote")]
pub fn fetch_remote(url: &str, timeout: Duration) -> Result<RawDataset, LoadError> {
    tracing::info!(url, timeout_secs = timeout.as_secs(), "fetching remote dataset");
    let client = reqwest::blocking::Client::builder()
        .timeout(timeout)
        .build()?;
    let body = client.get(url).send()?.error_for_status()?.bytes()?;
    tracing::debug!(bytes = body.len(), "remote body received");

    let dataset = load_reader(body.as_ref(), TimestampPolicy::Strict)?;
    tracing::info!(url, rows = dataset.records.len(), "loaded remote dataset");
    Ok(dataset)
}

/// Remote loading is compiled out without the `remote` feature.
#[cfg(not(feature = "remote"))]
pub fn fetch_remote(_url: &str, _timeout: Duration) -> Result<RawDataset, LoadError> {
    Err(LoadError::RemoteDisabled)
}

/// Parses CSV from any reader.
///
/// Requires a `date` column and an appliance power column; `lights` is
/// optional and every other column passes through as an auxiliary sensor.
///
/// # Errors
///
/// Returns a `LoadError` for malformed CSV (including rows whose column count
/// differs from the header), missing required columns, non-numeric power
/// values, or, under [`TimestampPolicy::Strict`], unparseable timestamps.
pub fn load_reader(reader: impl Read, policy: TimestampPolicy) -> Result<RawDataset, LoadError> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let headers = rdr.headers()?.clone();

    let date_idx = find_column(&headers, &[TIMESTAMP_COLUMN])
        .ok_or(LoadError::MissingColumn(TIMESTAMP_COLUMN))?;
    let power_idx = find_column(&headers, APPLIANCE_COLUMNS)
        .ok_or(LoadError::MissingColumn(APPLIANCE_COLUMNS[0]))?;
    let lights_idx = find_column(&headers, LIGHTS_COLUMNS);

    let aux_idx: Vec<usize> = (0..headers.len())
        .filter(|&i| i != date_idx && i != power_idx && Some(i) != lights_idx)
        .collect();
    let aux_columns: Vec<String> = aux_idx.iter().map(|&i| headers[i].to_string()).collect();
    let mut non_numeric_columns = HashSet::new();

    let mut records = Vec::new();
    for (i, row) in rdr.records().enumerate() {
        let row = row?;
        let line = i + 1;

        let raw_ts = &row[date_idx];
        let timestamp = parse_timestamp(raw_ts);
        if timestamp.is_none() && policy == TimestampPolicy::Strict {
            return Err(LoadError::InvalidTimestamp {
                row: line,
                value: raw_ts.to_string(),
            });
        }

        let appliance_power = parse_required(&row[power_idx], line, "appliance_power")?;
        let lights = match lights_idx {
            Some(idx) if !row[idx].is_empty() => Some(parse_required(&row[idx], line, "lights")?),
            _ => None,
        };

        let aux = aux_idx
            .iter()
            .zip(&aux_columns)
            .map(|(&idx, name)| {
                let cell = &row[idx];
                if cell.is_empty() {
                    return None;
                }
                match cell.parse::<f64>() {
                    // NaN and infinities read as missing readings
                    Ok(v) => v.is_finite().then_some(v),
                    Err(_) => {
                        non_numeric_columns.insert(name.clone());
                        None
                    }
                }
            })
            .collect();

        records.push(RawRecord {
            timestamp,
            appliance_power,
            lights,
            aux,
        });
    }

    Ok(RawDataset {
        records,
        aux_columns,
        non_numeric_columns,
        has_lights: lights_idx.is_some(),
    })
}

fn find_column(headers: &StringRecord, names: &[&str]) -> Option<usize> {
    headers.iter().position(|h| names.contains(&h))
}

/// Parses a required numeric cell; `NaN` and infinities count as non-numbers.
fn parse_required(cell: &str, row: usize, column: &'static str) -> Result<f64, LoadError> {
    cell.parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| LoadError::InvalidNumber {
            row,
            column,
            value: cell.to_string(),
        })
}
