//! End-to-end run: load, derive features, aggregate, score, summarize.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;

use super::aggregate::{self, DailyAggregate, HourlyAggregate, WeekdayAggregate};
use super::features;
use super::kpi::KpiReport;
use super::stats::{self, Describe};
use crate::config::{ConfigError, PipelineConfig, SourceConfig, SourceMode};
use crate::error::{PipelineError, Result};
use crate::ingest::{self, DataSource, LoadCache, RawDataset};

/// Parameters applied after loading. Changing them never forces a reload.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnalysisParams {
    /// kg CO2 per kWh.
    pub carbon_intensity: f64,
    /// Absolute z-score a day must strictly exceed to be flagged.
    pub z_threshold: f64,
}

impl Default for AnalysisParams {
    fn default() -> Self {
        Self {
            carbon_intensity: 0.45,
            z_threshold: 2.5,
        }
    }
}

impl AnalysisParams {
    /// Every constraint violation, empty when the parameters are usable.
    pub fn check(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();
        if !self.carbon_intensity.is_finite() || self.carbon_intensity <= 0.0 {
            errors.push(ConfigError {
                field: "analysis.carbon_intensity".into(),
                message: "must be a finite number > 0".into(),
            });
        }
        if !self.z_threshold.is_finite() || self.z_threshold <= 0.0 {
            errors.push(ConfigError {
                field: "analysis.z_threshold".into(),
                message: "must be a finite number > 0".into(),
            });
        }
        errors
    }

    /// # Errors
    ///
    /// Returns the first `ConfigError` from [`AnalysisParams::check`].
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        self.check().into_iter().next().map_or(Ok(()), Err)
    }
}

/// Everything the presentation layer renders, derived from one input snapshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dashboard {
    /// Records that took part in grouping.
    pub records_used: usize,
    /// Rows dropped for an unparseable timestamp.
    pub excluded_rows: usize,
    pub daily: Vec<DailyAggregate>,
    pub hourly: Vec<HourlyAggregate>,
    pub weekday: Vec<WeekdayAggregate>,
    pub kpi: KpiReport,
    pub daily_energy_stats: Option<Describe>,
    pub daily_carbon_stats: Option<Describe>,
    /// Over defined z-scores only; `None` when every score is undefined.
    pub daily_z_stats: Option<Describe>,
}

impl Dashboard {
    /// Flagged days in chronological order.
    pub fn anomalies(&self) -> Vec<&DailyAggregate> {
        self.daily.iter().filter(|d| d.is_anomaly).collect()
    }

    /// The `n` highest-energy days.
    pub fn top_days(&self, n: usize) -> Vec<&DailyAggregate> {
        stats::top_days(&self.daily, n)
    }

    /// The `n` lowest-energy days.
    pub fn bottom_days(&self, n: usize) -> Vec<&DailyAggregate> {
        stats::bottom_days(&self.daily, n)
    }
}

/// Runs every stage after loading.
///
/// All three views come from the same enriched record set, and the KPIs from
/// those views.
///
/// # Errors
///
/// Returns a `ConfigError` if `params` is invalid.
pub fn analyze(
    raw: &RawDataset,
    params: &AnalysisParams,
) -> std::result::Result<Dashboard, ConfigError> {
    params.validate()?;

    let enriched = features::derive(raw, params.carbon_intensity);
    let records = &enriched.records;

    let daily = aggregate::daily(records, params.z_threshold);
    let hourly = aggregate::hourly(records);
    let weekday = aggregate::weekday(records);
    let kpi = KpiReport::from_views(&daily, &hourly, &weekday);

    let energy: Vec<f64> = daily.iter().map(|d| d.energy_kwh_sum).collect();
    let carbon: Vec<f64> = daily.iter().map(|d| d.carbon_emission_kg_sum).collect();
    let z: Vec<f64> = daily.iter().filter_map(|d| d.z_score.value()).collect();

    tracing::info!(
        records = records.len(),
        excluded = enriched.excluded_rows,
        days = daily.len(),
        anomalies = kpi.anomaly_count,
        "analysis complete"
    );

    Ok(Dashboard {
        records_used: records.len(),
        excluded_rows: enriched.excluded_rows,
        daily_energy_stats: stats::describe(&energy),
        daily_carbon_stats: stats::describe(&carbon),
        daily_z_stats: stats::describe(&z),
        daily,
        hourly,
        weekday,
        kpi,
    })
}

/// Turns the source section of the config into a concrete source.
///
/// # Errors
///
/// Returns `PipelineError::MissingInput` in upload mode without a file.
pub fn resolve_source(cfg: &SourceConfig) -> Result<DataSource> {
    match cfg.mode {
        SourceMode::Remote => Ok(DataSource::Remote {
            url: cfg.url.clone(),
            timeout: Duration::from_secs(cfg.fetch_timeout_secs),
        }),
        SourceMode::Upload => cfg
            .path
            .as_ref()
            .map(|p| DataSource::Upload(p.clone()))
            .ok_or(PipelineError::MissingInput),
    }
}

/// Loads the configured source through `cache` and analyzes it.
///
/// # Errors
///
/// Returns `MissingInput` when no upload is selected, `Load` when the source
/// cannot be read (nothing is aggregated), or `Config` for invalid parameters.
pub fn run(cfg: &PipelineConfig, cache: &LoadCache) -> Result<(Arc<RawDataset>, Dashboard)> {
    let source = resolve_source(&cfg.source)?;
    let raw = ingest::load(&source, cache)?;
    let dashboard = analyze(&raw, &cfg.analysis_params())?;
    Ok((raw, dashboard))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn params_validation() {
        assert!(AnalysisParams::default().validate().is_ok());
        let bad = AnalysisParams {
            carbon_intensity: -0.2,
            ..AnalysisParams::default()
        };
        assert!(bad.validate().is_err());
        let bad = AnalysisParams {
            z_threshold: f64::INFINITY,
            ..AnalysisParams::default()
        };
        assert!(bad.validate().is_err());
    }

    #[test]
    fn upload_without_file_is_missing_input() {
        let cfg = SourceConfig {
            mode: SourceMode::Upload,
            ..SourceConfig::default()
        };
        assert!(matches!(resolve_source(&cfg), Err(PipelineError::MissingInput)));
    }

    #[test]
    fn remote_source_carries_timeout() {
        let cfg = SourceConfig {
            fetch_timeout_secs: 5,
            ..SourceConfig::default()
        };
        let source = resolve_source(&cfg).ok();
        assert!(matches!(
            source,
            Some(DataSource::Remote { timeout, .. }) if timeout == Duration::from_secs(5)
        ));
    }

    #[test]
    fn empty_dataset_yields_empty_views() {
        let dash = analyze(&RawDataset::default(), &AnalysisParams::default());
        let dash = dash.expect("empty input is not an error");
        assert!(dash.daily.is_empty());
        assert_eq!(dash.hourly.len(), 24);
        assert_eq!(dash.weekday.len(), 7);
        assert!(!dash.kpi.has_data());
        assert!(dash.daily_energy_stats.is_none());
        assert!(dash.daily_z_stats.is_none());
        assert!(dash.anomalies().is_empty());
    }

    fn one_reading_per_day(kwh: &[f64]) -> RawDataset {
        let mut csv = String::from("date,Appliances\n");
        for (i, e) in kwh.iter().enumerate() {
            csv.push_str(&format!("2016-01-{:02} 12:00:00,{}\n", 11 + i, e * 60.0));
        }
        ingest::load_reader(csv.as_bytes(), ingest::TimestampPolicy::Strict)
            .expect("fixture parses")
    }

    #[test]
    fn z_stats_describe_defined_scores() {
        let raw = one_reading_per_day(&[10.0, 10.0, 10.0, 10.0, 10.0, 10.0, 100.0]);
        let dash = analyze(&raw, &AnalysisParams::default()).expect("valid params");
        let z = dash.daily_z_stats.expect("scores are defined");
        assert_eq!(z.count, 7);
        // standardized series: mean 0, population std 1
        assert!(z.mean.abs() < 1e-12);
        assert!((z.std - 1.0).abs() < 1e-12);
        assert!((z.max - 6f64.sqrt()).abs() < 1e-9);
    }

    #[test]
    fn z_stats_absent_when_scores_undefined() {
        let raw = one_reading_per_day(&[5.0, 5.0, 5.0]);
        let dash = analyze(&raw, &AnalysisParams::default()).expect("valid params");
        assert_eq!(dash.daily.len(), 3);
        assert!(dash.daily_z_stats.is_none());
        assert!(dash.daily_energy_stats.is_some());
    }
}
