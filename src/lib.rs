//! Energy-meter analytics: load readings, derive energy and carbon, build
//! daily/hourly/weekday views, flag anomalous days and summarize.

/// Feature derivation, aggregation, anomaly scoring, and KPIs.
pub mod analytics;
pub mod config;
pub mod error;
/// Raw dataset loading and caching.
pub mod ingest;
pub mod io;
pub mod logging;
