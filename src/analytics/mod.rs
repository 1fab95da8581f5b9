pub mod aggregate;
/// Daily z-scores and anomaly flags.
pub mod anomaly;
pub mod features;
/// Scalar summary figures.
pub mod kpi;
pub mod pipeline;
/// Column-selection and correlation views.
pub mod relations;
pub mod stats;

pub use pipeline::{AnalysisParams, Dashboard, analyze, run};
