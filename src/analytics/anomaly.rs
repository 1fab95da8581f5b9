//! Z-score anomaly detection over the daily energy series.
//!
//! Scores use the full-series mean and population standard deviation. When
//! the series has fewer than two points or no spread, every score is
//! [`ZScore::Undefined`] and no day is flagged.

use std::fmt;

use serde::{Serialize, Serializer};

use super::stats::{mean, population_std};

/// Rounding slack, in machine epsilons per point of the largest magnitude,
/// below which a standard deviation counts as zero.
const ZERO_SPREAD_ULPS: f64 = 8.0;

/// Standardized deviation of one day from the series mean.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ZScore {
    Defined(f64),
    /// Series too short or without variance.
    Undefined,
}

impl ZScore {
    /// The numeric score, if defined.
    pub fn value(self) -> Option<f64> {
        match self {
            Self::Defined(z) => Some(z),
            Self::Undefined => None,
        }
    }

    pub fn is_defined(self) -> bool {
        matches!(self, Self::Defined(_))
    }
}

impl fmt::Display for ZScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Defined(z) => write!(f, "{z:.4}"),
            Self::Undefined => write!(f, "undefined"),
        }
    }
}

/// Serialized as a number, or `null` when undefined.
impl Serialize for ZScore {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.value().serialize(serializer)
    }
}

/// Score and flag for one day.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnomalyScore {
    pub z_score: ZScore,
    /// `|z| > threshold`; always `false` for an undefined score.
    pub is_anomaly: bool,
}

/// Scores each point of `series` against the whole series.
///
/// # Arguments
///
/// * `series` - Daily energy sums in chronological order
/// * `threshold` - Absolute z-score a day must strictly exceed to be flagged
///
/// # Returns
///
/// One `AnomalyScore` per input point, in the same order.
pub fn score(series: &[f64], threshold: f64) -> Vec<AnomalyScore> {
    let undefined = AnomalyScore {
        z_score: ZScore::Undefined,
        is_anomaly: false,
    };

    let (Some(m), Some(std)) = (mean(series), population_std(series)) else {
        return Vec::new();
    };
    if series.len() < 2 || !std.is_finite() || spread_is_zero(series, std) {
        tracing::debug!(
            points = series.len(),
            "z-score undefined: insufficient spread in daily series"
        );
        return vec![undefined; series.len()];
    }

    let scores: Vec<AnomalyScore> = series
        .iter()
        .map(|&x| {
            let z = (x - m) / std;
            AnomalyScore {
                z_score: ZScore::Defined(z),
                is_anomaly: z.abs() > threshold,
            }
        })
        .collect();

    let flagged = scores.iter().filter(|s| s.is_anomaly).count();
    tracing::info!(days = series.len(), flagged, threshold, "anomaly detection complete");
    scores
}

/// True when `std` is within accumulated rounding error of zero.
///
/// The bound scales with the largest magnitude, not the mean, so a real
/// spread of 1 around 1e12 still counts.
fn spread_is_zero(series: &[f64], std: f64) -> bool {
    let scale = series.iter().fold(0.0_f64, |acc, x| acc.max(x.abs()));
    std <= ZERO_SPREAD_ULPS * series.len() as f64 * f64::EPSILON * scale
}
