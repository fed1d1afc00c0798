//! K-nearest-neighbours imputation.
//!
//! The features are the target columns plus every other numeric column whose
//! observed values vary; all-missing and constant columns are skipped.
//! Features are standardised by their observed sample standard deviation.
//! Donors are the complete rows, i.e. rows with no missing feature. A
//! missing entry is replaced by the unweighted mean of its k nearest donors,
//! measured by Euclidean distance over the features the recipient row
//! actually has.

use super::check_targets;
use crate::error::{ImputeError, Result};
use crate::utils::{
    is_numeric_dtype, mean, missing_count, numeric_column_names, numeric_values, observed_values,
    sample_std, series_of,
};
use polars::prelude::*;
use tracing::{debug, warn};

type DataMatrix = Vec<Vec<Option<f64>>>;

pub struct KNNImputer {
    n_neighbors: usize,
}

impl KNNImputer {
    /// Create a new KNN imputer with specified number of neighbors
    pub fn new(n_neighbors: usize) -> Self {
        Self {
            n_neighbors: n_neighbors.max(1),
        }
    }

    pub fn n_neighbors(&self) -> usize {
        self.n_neighbors
    }

    /// Return the target columns of `df` with missing entries estimated from
    /// the nearest complete rows.
    ///
    /// Targets without missing entries come back unchanged. Entries whose
    /// row has no observed feature stay missing.
    ///
    /// # Errors
    ///
    /// - [`ImputeError::Value`] when a target is non-numeric, has no observed
    ///   values, or the table has no complete row to borrow from
    pub fn fit_transform(&self, df: &DataFrame, targets: &[String]) -> Result<DataFrame> {
        check_targets(df, targets)?;

        for target in targets {
            let series = series_of(df, target)?;
            if !is_numeric_dtype(series.dtype()) {
                return Err(ImputeError::value(
                    target,
                    format!("'knn' needs a numeric column, found {}", series.dtype()),
                ));
            }
            if missing_count(series) == series.len() {
                return Err(ImputeError::value(
                    target,
                    "no observed values, 'knn' is undefined",
                ));
            }
        }

        let numeric_cols = feature_columns(df, targets)?;
        let data_matrix = self.create_data_matrix(df, &numeric_cols)?;
        let scales = column_scales(&data_matrix, numeric_cols.len());
        let donors: Vec<usize> = data_matrix
            .iter()
            .enumerate()
            .filter(|(_, row)| row.iter().all(Option::is_some))
            .map(|(idx, _)| idx)
            .collect();

        debug!(
            "KNN over {} numeric columns, {} complete rows, k = {}",
            numeric_cols.len(),
            donors.len(),
            self.n_neighbors
        );

        let mut columns = Vec::with_capacity(targets.len());
        for target in targets {
            let series = series_of(df, target)?;
            if missing_count(series) == 0 {
                columns.push(Column::from(series.clone()));
                continue;
            }

            if donors.is_empty() {
                return Err(ImputeError::value(
                    target,
                    "no complete rows to use as neighbours",
                ));
            }

            let target_col = numeric_cols
                .iter()
                .position(|c| c == target)
                .ok_or_else(|| ImputeError::ColumnNotFound(target.clone()))?;

            let mut unfilled = 0;
            let imputed_values: Vec<Option<f64>> = data_matrix
                .iter()
                .enumerate()
                .map(|(row_idx, row)| match row[target_col] {
                    Some(value) => Some(value),
                    None => {
                        let value =
                            self.impute_value(&data_matrix, &donors, &scales, row_idx, target_col);
                        if value.is_none() {
                            unfilled += 1;
                        }
                        value
                    }
                })
                .collect();

            if unfilled > 0 {
                warn!(
                    "{} row(s) of '{}' have no observed features and stay missing",
                    unfilled, target
                );
            }

            columns.push(Column::from(Series::new(
                target.as_str().into(),
                imputed_values,
            )));
        }

        Ok(DataFrame::new(columns)?)
    }

    /// Create a data matrix from the dataframe for distance calculations
    fn create_data_matrix(&self, df: &DataFrame, columns: &[String]) -> Result<DataMatrix> {
        let n_rows = df.height();
        let n_cols = columns.len();
        let mut matrix = vec![vec![None; n_cols]; n_rows];

        for (col_idx, col_name) in columns.iter().enumerate() {
            let values = numeric_values(series_of(df, col_name)?)?;
            for (row, value) in matrix.iter_mut().zip(values) {
                row[col_idx] = value;
            }
        }

        Ok(matrix)
    }

    /// Estimate one missing entry, or `None` when the row has no observed feature.
    fn impute_value(
        &self,
        data_matrix: &[Vec<Option<f64>>],
        donors: &[usize],
        scales: &[f64],
        target_row: usize,
        target_col: usize,
    ) -> Option<f64> {
        let recipient = &data_matrix[target_row];
        let has_features = recipient
            .iter()
            .enumerate()
            .any(|(idx, v)| idx != target_col && v.is_some());
        if !has_features {
            return None;
        }

        let mut distances: Vec<(usize, f64)> = donors
            .iter()
            .map(|&donor| {
                let distance =
                    self.calculate_distance(recipient, &data_matrix[donor], scales, target_col);
                (donor, distance)
            })
            .collect();

        // Stable sort keeps row order among equal distances
        distances.sort_by(|a, b| a.1.total_cmp(&b.1));

        let k = self.n_neighbors.min(distances.len());
        let neighbour_values: Vec<f64> = distances
            .iter()
            .take(k)
            .filter_map(|(row, _)| data_matrix[*row][target_col])
            .collect();

        mean(&neighbour_values)
    }

    /// Standardised Euclidean distance over the features observed in `row1`,
    /// ignoring the target column.
    fn calculate_distance(
        &self,
        row1: &[Option<f64>],
        row2: &[Option<f64>],
        scales: &[f64],
        skip_col: usize,
    ) -> f64 {
        let mut sum_squared_diff = 0.0;

        for (col_idx, scale) in scales.iter().enumerate() {
            if col_idx == skip_col {
                continue;
            }

            if let (Some(val1), Some(val2)) = (row1[col_idx], row2[col_idx]) {
                let diff = (val1 - val2) / scale;
                sum_squared_diff += diff * diff;
            }
        }

        sum_squared_diff.sqrt()
    }
}

/// Targets plus the other numeric columns with a non-zero observed spread.
fn feature_columns(df: &DataFrame, targets: &[String]) -> Result<Vec<String>> {
    let mut features = Vec::new();

    for name in numeric_column_names(df) {
        if targets.contains(&name) {
            features.push(name);
            continue;
        }

        let observed = observed_values(series_of(df, &name)?)?;
        match sample_std(&observed) {
            Some(std) if std.is_finite() && std > f64::EPSILON => features.push(name),
            _ => debug!("Column '{}' has no spread, not used as a KNN feature", name),
        }
    }

    Ok(features)
}

/// Per-column scale: observed sample std, or 1 when it is zero or undefined.
fn column_scales(data_matrix: &[Vec<Option<f64>>], n_cols: usize) -> Vec<f64> {
    (0..n_cols)
        .map(|col_idx| {
            let observed: Vec<f64> = data_matrix.iter().filter_map(|row| row[col_idx]).collect();
            match sample_std(&observed) {
                Some(std) if std.is_finite() && std > f64::EPSILON => std,
                _ => 1.0,
            }
        })
        .collect()
}
