//! TOML-based pipeline configuration.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::analytics::pipeline::AnalysisParams;

/// UCI "Appliances energy prediction" dataset.
pub const DEFAULT_REMOTE_URL: &str =
    "https://archive.ics.uci.edu/ml/machine-learning-databases/00374/energydata_complete.csv";

/// Log levels accepted by `[logging] level`.
const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Top-level pipeline configuration parsed from TOML.
///
/// All sections have defaults, so an empty file is a valid configuration.
/// Load with [`PipelineConfig::from_toml_file`] or start from
/// [`PipelineConfig::default`] and override individual fields.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PipelineConfig {
    /// Where raw readings come from.
    #[serde(default)]
    pub source: SourceConfig,
    /// Analysis parameters forwarded to the pipeline.
    #[serde(default)]
    pub analysis: AnalysisConfig,
    /// Log verbosity.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Data source selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceMode {
    /// Fetch the fixed remote CSV (cached process-wide).
    #[default]
    Remote,
    /// Read a user-supplied CSV file.
    Upload,
}

/// Data source parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SourceConfig {
    /// `"remote"` or `"upload"`.
    pub mode: SourceMode,
    /// Remote CSV location.
    pub url: String,
    /// Uploaded CSV path; required when `mode = "upload"` at run time.
    pub path: Option<PathBuf>,
    /// Timeout for the remote fetch, in seconds.
    pub fetch_timeout_secs: u64,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            mode: SourceMode::Remote,
            url: DEFAULT_REMOTE_URL.to_string(),
            path: None,
            fetch_timeout_secs: 60,
        }
    }
}

/// Analysis parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnalysisConfig {
    /// kg CO2 emitted per kWh consumed.
    pub carbon_intensity: f64,
    /// Absolute z-score above which a day is flagged.
    pub z_threshold: f64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            carbon_intensity: 0.45,
            z_threshold: 2.5,
        }
    }
}

/// Logging parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    /// Default filter level when `RUST_LOG` is unset.
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Configuration error with field path and constraint description.
#[derive(Error, Debug)]
#[error("config error: {field}: {message}")]
pub struct ConfigError {
    /// Dotted field path (e.g., `"analysis.z_threshold"`).
    pub field: String,
    /// Human-readable constraint description.
    pub message: String,
}

impl PipelineConfig {
    /// Parses a configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the file cannot be read or the TOML is invalid.
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError {
            field: "config".to_string(),
            message: format!("cannot read \"{}\": {e}", path.display()),
        })?;
        Self::from_toml_str(&content)
    }

    /// Parses a configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the TOML is invalid or contains unknown fields.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(|e| ConfigError {
            field: "toml".to_string(),
            message: e.to_string(),
        })
    }

    /// Validates all fields and returns a list of errors.
    ///
    /// Values outside the typical dashboard ranges are logged but accepted.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = self.analysis_params().check();
        let a = &self.analysis;

        if errors.is_empty() {
            if !(0.1..=1.0).contains(&a.carbon_intensity) {
                tracing::warn!(
                    carbon_intensity = a.carbon_intensity,
                    "carbon intensity outside the typical 0.1-1.0 kg/kWh range"
                );
            }
            if !(1.5..=4.0).contains(&a.z_threshold) {
                tracing::warn!(
                    z_threshold = a.z_threshold,
                    "z-score threshold outside the typical 1.5-4.0 range"
                );
            }
        }

        let s = &self.source;
        if s.fetch_timeout_secs == 0 {
            errors.push(ConfigError {
                field: "source.fetch_timeout_secs".into(),
                message: "must be > 0".into(),
            });
        }
        if s.mode == SourceMode::Remote && s.url.trim().is_empty() {
            errors.push(ConfigError {
                field: "source.url".into(),
                message: "must not be empty in remote mode".into(),
            });
        }

        if !LOG_LEVELS.contains(&self.logging.level.as_str()) {
            errors.push(ConfigError {
                field: "logging.level".into(),
                message: format!(
                    "must be one of {}, got \"{}\"",
                    LOG_LEVELS.join(", "),
                    self.logging.level
                ),
            });
        }

        errors
    }

    /// Analysis parameters to hand to the pipeline.
    pub fn analysis_params(&self) -> AnalysisParams {
        AnalysisParams {
            carbon_intensity: self.analysis.carbon_intensity,
            z_threshold: self.analysis.z_threshold,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_valid() {
        let cfg = PipelineConfig::default();
        let errors = cfg.validate();
        assert!(errors.is_empty(), "default should be valid: {errors:?}");
        assert_eq!(cfg.source.mode, SourceMode::Remote);
        assert_eq!(cfg.source.url, DEFAULT_REMOTE_URL);
    }

    #[test]
    fn valid_toml_parses() {
        let toml = r#"
[source]
mode = "upload"
path = "readings.csv"
fetch_timeout_secs = 10

[analysis]
carbon_intensity = 0.9
z_threshold = 3.0

[logging]
level = "debug"
"#;
        let cfg = PipelineConfig::from_toml_str(toml);
        assert!(cfg.is_ok(), "valid TOML should parse: {:?}", cfg.err());
        let cfg = cfg.ok();
        assert_eq!(cfg.as_ref().map(|c| c.source.mode), Some(SourceMode::Upload));
        assert_eq!(
            cfg.as_ref().and_then(|c| c.source.path.clone()),
            Some(PathBuf::from("readings.csv"))
        );
        assert_eq!(cfg.as_ref().map(|c| c.analysis.carbon_intensity), Some(0.9));
        assert_eq!(cfg.as_ref().map(|c| &*c.logging.level), Some("debug"));
    }

    #[test]
    fn partial_toml_uses_defaults() {
        let toml = r#"
[analysis]
z_threshold = 3.5
"#;
        let cfg = PipelineConfig::from_toml_str(toml).ok();
        assert_eq!(cfg.as_ref().map(|c| c.analysis.z_threshold), Some(3.5));
        // coefficient kept default
        assert_eq!(cfg.as_ref().map(|c| c.analysis.carbon_intensity), Some(0.45));
        assert_eq!(cfg.as_ref().map(|c| c.source.fetch_timeout_secs), Some(60));
    }

    #[test]
    fn invalid_toml_unknown_field() {
        let toml = r#"
[analysis]
z_threshold = 2.0
bogus_field = true
"#;
        assert!(PipelineConfig::from_toml_str(toml).is_err());
    }

    #[test]
    fn unknown_source_mode_rejected() {
        let toml = r#"
[source]
mode = "ftp"
"#;
        assert!(PipelineConfig::from_toml_str(toml).is_err());
    }

    #[test]
    fn validation_catches_non_positive_coefficient() {
        let mut cfg = PipelineConfig::default();
        cfg.analysis.carbon_intensity = 0.0;
        let errors = cfg.validate();
        assert!(errors.iter().any(|e| e.field == "analysis.carbon_intensity"));

        cfg.analysis.carbon_intensity = f64::NAN;
        let errors = cfg.validate();
        assert!(errors.iter().any(|e| e.field == "analysis.carbon_intensity"));
    }

    #[test]
    fn validation_catches_bad_threshold_and_level() {
        let mut cfg = PipelineConfig::default();
        cfg.analysis.z_threshold = -1.0;
        cfg.logging.level = "loud".to_string();
        let errors = cfg.validate();
        assert_eq!(errors.len(), 2);
        assert!(errors.iter().any(|e| e.field == "analysis.z_threshold"));
        assert!(errors.iter().any(|e| e.field == "logging.level"));
    }

    #[test]
    fn out_of_typical_range_is_accepted() {
        let mut cfg = PipelineConfig::default();
        cfg.analysis.carbon_intensity = 1.8;
        cfg.analysis.z_threshold = 6.0;
        assert!(cfg.validate().is_empty());
    }

    #[test]
    fn analysis_params_forwarded() {
        let mut cfg = PipelineConfig::default();
        cfg.analysis.carbon_intensity = 0.3;
        let params = cfg.analysis_params();
        assert_eq!(params.carbon_intensity, 0.3);
        assert_eq!(params.z_threshold, 2.5);
    }
}
