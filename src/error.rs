//! Error taxonomy for the analytics pipeline.

use std::path::PathBuf;

use thiserror::Error;

use crate::config::ConfigError;

/// Fatal failure while fetching or parsing a raw dataset.
///
/// Any `LoadError` aborts the run before aggregation; no partial views are
/// produced.
#[derive(Error, Debug)]
pub enum LoadError {
    /// The source file could not be opened or read.
    #[error("cannot read \"{}\": {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Structurally malformed CSV (bad quoting, mismatched column count).
    #[error("malformed CSV: {0}")]
    Csv(#[from] csv::Error),

    /// The remote source was unreachable or answered with an error status.
    #[error("remote fetch failed: {0}")]
    Http(String),

    /// Remote loading requested from a build without the `remote` feature.
    #[error("remote sources are not supported by this build (enable the `remote` feature)")]
    RemoteDisabled,

    /// A column the pipeline cannot work without is absent.
    #[error("required column `{0}` is missing")]
    MissingColumn(&'static str),

    /// A cell in a required numeric column is not a number.
    #[error("row {row}: column `{column}` has non-numeric value \"{value}\"")]
    InvalidNumber {
        row: usize,
        column: &'static str,
        value: String,
    },

    /// Unparseable timestamp under the strict policy.
    #[error("row {row}: cannot parse timestamp \"{value}\"")]
    InvalidTimestamp { row: usize, value: String },
}

#[cfg(feature = "remote")]
impl From<reqwest::Error> for LoadError {
    fn from(err: reqwest::Error) -> Self {
        Self::Http(err.to_string())
    }
}

/// Top-level error for a pipeline run.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Load(#[from] LoadError),

    /// Upload mode selected but no file supplied. The caller should prompt
    /// the user rather than treat this as a crash.
    #[error("no input data supplied")]
    MissingInput,

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, PipelineError>;
