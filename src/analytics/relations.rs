//! Relationship views over caller-chosen numeric columns.

use serde::Serialize;
use thiserror::Error;

use crate::ingest::RawDataset;

/// Column set of the correlation heatmap; missing columns are skipped.
pub const DEFAULT_HEATMAP_COLUMNS: &[&str] =
    &["appliance_power", "lights", "T1", "RH_1", "T2", "RH_2"];

/// Why a column selection cannot be compared.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum RelationError {
    #[error("select at least two columns to compare (got {0})")]
    TooFewColumns(usize),

    #[error("column `{0}` is not in the dataset")]
    UnknownColumn(String),

    #[error("column `{0}` is not numeric")]
    NonNumericColumn(String),
}

/// Values of the selected columns, row-aligned with the raw dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct RelationView {
    pub columns: Vec<String>,
    /// One vector per selected column; `None` where the cell was empty.
    pub values: Vec<Vec<Option<f64>>>,
}

/// Pairwise Pearson coefficients, `None` where a pair lacks variance.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrelationMatrix {
    pub columns: Vec<String>,
    pub coefficients: Vec<Vec<Option<f64>>>,
}

impl RelationView {
    /// Selects `columns` from `dataset`.
    ///
    /// `appliance_power` and `lights` name the core power columns; any other
    /// name must be an auxiliary sensor column.
    ///
    /// # Errors
    ///
    /// Fails with fewer than two columns, or when a column is absent or
    /// holds non-numeric cells.
    pub fn select(dataset: &RawDataset, columns: &[&str]) -> Result<Self, RelationError> {
        if columns.len() < 2 {
            return Err(RelationError::TooFewColumns(columns.len()));
        }
        let values = columns
            .iter()
            .map(|name| column_values(dataset, name))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            columns: columns.iter().map(ToString::to_string).collect(),
            values,
        })
    }

    /// Correlation of every selected column against every other.
    pub fn correlation(&self) -> CorrelationMatrix {
        let coefficients = self
            .values
            .iter()
            .map(|x| self.values.iter().map(|y| pearson(x, y)).collect())
            .collect();
        CorrelationMatrix {
            columns: self.columns.clone(),
            coefficients,
        }
    }
}

impl CorrelationMatrix {
    /// Coefficient for a named pair.
    pub fn get(&self, a: &str, b: &str) -> Option<f64> {
        let i = self.columns.iter().position(|c| c == a)?;
        let j = self.columns.iter().position(|c| c == b)?;
        self.coefficients[i][j]
    }
}

/// Correlation over the default heatmap columns present in `dataset`.
///
/// # Errors
///
/// Fails when fewer than two of those columns are present and numeric.
pub fn default_heatmap(dataset: &RawDataset) -> Result<CorrelationMatrix, RelationError> {
    let present: Vec<&str> = DEFAULT_HEATMAP_COLUMNS
        .iter()
        .copied()
        .filter(|name| column_values(dataset, name).is_ok())
        .collect();
    Ok(RelationView::select(dataset, &present)?.correlation())
}

fn column_values(dataset: &RawDataset, name: &str) -> Result<Vec<Option<f64>>, RelationError> {
    match name {
        "appliance_power" | "Appliance_Power" | "Appliances" => Ok(dataset
            .records
            .iter()
            .map(|r| Some(r.appliance_power))
            .collect()),
        "lights" | "Lights" if dataset.has_lights => {
            Ok(dataset.records.iter().map(|r| r.lights).collect())
        }
        _ => {
            let idx = dataset
                .aux_index(name)
                .ok_or_else(|| RelationError::UnknownColumn(name.to_string()))?;
            if dataset.non_numeric_columns.contains(name) {
                return Err(RelationError::NonNumericColumn(name.to_string()));
            }
            Ok(dataset.records.iter().map(|r| r.aux[idx]).collect())
        }
    }
}

/// Pearson correlation over rows where both values are present.
pub fn pearson(x: &[Option<f64>], y: &[Option<f64>]) -> Option<f64> {
    let pairs: Vec<(f64, f64)> = x
        .iter()
        .zip(y)
        .filter_map(|(a, b)| Some(((*a)?, (*b)?)))
        .collect();
    if pairs.len() < 2 {
        return None;
    }
    let n = pairs.len() as f64;
    let mx = pairs.iter().map(|p| p.0).sum::<f64>() / n;
    let my = pairs.iter().map(|p| p.1).sum::<f64>() / n;

    let (mut sxy, mut sxx, mut syy) = (0.0, 0.0, 0.0);
    for (a, b) in &pairs {
        sxy += (a - mx) * (b - my);
        sxx += (a - mx) * (a - mx);
        syy += (b - my) * (b - my);
    }
    if sxx <= 0.0 || syy <= 0.0 {
        return None;
    }
    Some((sxy / (sxx * syy).sqrt()).clamp(-1.0, 1.0))
}
