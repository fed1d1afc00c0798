//! Shared utilities for the imputation pipeline.
//!
//! This module contains common helper functions used across multiple modules
//! to reduce code duplication and ensure consistency.

use crate::error::{ImputeError, Result};
use polars::prelude::*;
use std::collections::HashMap;

// =============================================================================
// Data Type Utilities
// =============================================================================

/// Check if a DataType is numeric (integer or float).
#[inline]
pub fn is_numeric_dtype(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
            | DataType::Float32
            | DataType::Float64
    )
}

/// Look up a column by name, mapping the polars error to [`ImputeError::ColumnNotFound`].
pub fn series_of<'a>(df: &'a DataFrame, col_name: &str) -> Result<&'a Series> {
    df.column(col_name)
        .map(|col| col.as_materialized_series())
        .map_err(|_| ImputeError::ColumnNotFound(col_name.to_string()))
}

/// Names of all numeric columns, in table order.
pub fn numeric_column_names(df: &DataFrame) -> Vec<String> {
    df.get_columns()
        .iter()
        .filter(|col| is_numeric_dtype(col.dtype()))
        .map(|col| col.name().to_string())
        .collect()
}

// =============================================================================
// Missing Value Utilities
// =============================================================================

/// Read a numeric Series as `f64`s, with both null and NaN reported as `None`.
pub fn numeric_values(series: &Series) -> Result<Vec<Option<f64>>> {
    if !is_numeric_dtype(series.dtype()) {
        return Err(ImputeError::value(
            series.name().as_str(),
            format!("expected a numeric column, found {}", series.dtype()),
        ));
    }

    let float_series = series.cast(&DataType::Float64)?;
    let values = float_series
        .f64()?
        .into_iter()
        .map(|v| v.filter(|x| !x.is_nan()))
        .collect();

    Ok(values)
}

/// Observed (non-missing) values of a numeric Series, in row order.
pub fn observed_values(series: &Series) -> Result<Vec<f64>> {
    Ok(numeric_values(series)?.into_iter().flatten().collect())
}

/// Count missing entries in a Series, treating floating NaN as missing.
pub fn missing_count(series: &Series) -> usize {
    match series.dtype() {
        DataType::Float32 | DataType::Float64 => numeric_values(series)
            .map(|values| values.iter().filter(|v| v.is_none()).count())
            .unwrap_or_else(|_| series.null_count()),
        _ => series.null_count(),
    }
}

/// Fill missing entries (null or NaN) in a numeric Series with a specific value.
///
/// The result is always `Float64`.
pub fn fill_numeric_nulls(series: &Series, fill_value: f64) -> Result<Series> {
    let filled: Vec<Option<f64>> = numeric_values(series)?
        .into_iter()
        .map(|v| Some(v.unwrap_or(fill_value)))
        .collect();

    Ok(Series::new(series.name().clone(), filled))
}

/// Fill null values in a string Series with a specific value.
pub fn fill_string_nulls(series: &Series, fill_value: &str) -> Result<Series> {
    let str_series = series.cast(&DataType::String)?;
    let filled: Vec<Option<String>> = str_series
        .str()?
        .into_iter()
        .map(|v| Some(v.unwrap_or(fill_value).to_string()))
        .collect();

    Ok(Series::new(series.name().clone(), filled))
}

// =============================================================================
// Order Statistics
// =============================================================================

/// Arithmetic mean. `None` for an empty slice.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Sample standard deviation (n - 1 denominator). `None` below two values.
pub fn sample_std(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let mu = mean(values)?;
    let variance =
        values.iter().map(|v| (v - mu).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    Some(variance.sqrt())
}

/// Sort a copy of the values ascending.
pub fn sorted(values: &[f64]) -> Vec<f64> {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    sorted
}

/// Quantile of already-sorted values using linear interpolation between ranks.
pub fn quantile_sorted(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let q = q.clamp(0.0, 1.0);
    let pos = q * (sorted.len() - 1) as f64;
    let lower = pos.floor() as usize;
    let upper = pos.ceil() as usize;
    let frac = pos - lower as f64;
    Some(sorted[lower] + (sorted[upper] - sorted[lower]) * frac)
}

/// Median of the values. `None` for an empty slice.
pub fn median(values: &[f64]) -> Option<f64> {
    quantile_sorted(&sorted(values), 0.5)
}

/// Most frequent value; ties go to the value encountered first.
pub fn first_mode<T, I>(values: I) -> Option<T>
where
    T: Clone + Eq + std::hash::Hash,
    I: IntoIterator<Item = T>,
{
    // value -> (count, first position)
    let mut counts: HashMap<T, (usize, usize)> = HashMap::new();
    for (position, value) in values.into_iter().enumerate() {
        counts.entry(value).or_insert((0, position)).0 += 1;
    }

    counts
        .into_iter()
        .max_by(|(_, (count_a, pos_a)), (_, (count_b, pos_b))| {
            count_a.cmp(count_b).then(pos_b.cmp(pos_a))
        })
        .map(|(value, _)| value)
}

/// Mode of numeric values, ties broken by first occurrence.
pub fn numeric_mode(values: &[f64]) -> Option<f64> {
    // -0.0 and 0.0 count as the same value
    first_mode(values.iter().map(|v| if *v == 0.0 { 0u64 } else { v.to_bits() }))
        .map(f64::from_bits)
}

/// Mode of a string Series (nulls ignored), ties broken by first occurrence.
pub fn string_mode(series: &Series) -> Option<String> {
    let str_series = series.cast(&DataType::String).ok()?;
    let str_chunked = str_series.str().ok()?;
    first_mode(str_chunked.into_iter().flatten().map(|v| v.to_string()))
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_numeric_dtype() {
        assert!(is_numeric_dtype(&DataType::Int64));
        assert!(is_numeric_dtype(&DataType::Float64));
        assert!(!is_numeric_dtype(&DataType::String));
        assert!(!is_numeric_dtype(&DataType::Boolean));
    }

    #[test]
    fn test_numeric_values_treats_nan_as_missing() {
        let series = Series::new("age".into(), &[Some(25.0), None, Some(f64::NAN), Some(40.0)]);
        let values = numeric_values(&series).unwrap();
        assert_eq!(values, vec![Some(25.0), None, None, Some(40.0)]);
        assert_eq!(missing_count(&series), 2);
    }

    #[test]
    fn test_numeric_values_rejects_strings() {
        let series = Series::new("gender".into(), &["Female", "Male"]);
        let err = numeric_values(&series).unwrap_err();
        assert!(err.is_value());
    }

    #[test]
    fn test_fill_numeric_nulls() {
        let series = Series::new("test".into(), &[Some(1.0), None, Some(3.0)]);
        let filled = fill_numeric_nulls(&series, 0.0).unwrap();

        assert_eq!(filled.get(0).unwrap().try_extract::<f64>().unwrap(), 1.0);
        assert_eq!(filled.get(1).unwrap().try_extract::<f64>().unwrap(), 0.0);
        assert_eq!(filled.get(2).unwrap().try_extract::<f64>().unwrap(), 3.0);
    }

    #[test]
    fn test_fill_string_nulls() {
        let series = Series::new("house".into(), &[Some("Yes"), None]);
        let filled = fill_string_nulls(&series, "No").unwrap();
        assert_eq!(filled.null_count(), 0);
        assert_eq!(filled.str().unwrap().get(1), Some("No"));
    }

    #[test]
    fn test_median_even_and_odd() {
        assert_eq!(median(&[3.0, 1.0, 2.0]), Some(2.0));
        assert_eq!(median(&[4.0, 1.0, 3.0, 2.0]), Some(2.5));
        assert_eq!(median(&[]), None);
    }

    #[test]
    fn test_quantile_sorted_interpolates() {
        let values = [1.0, 2.0, 3.0, 4.0];
        assert_eq!(quantile_sorted(&values, 0.25), Some(1.75));
        assert_eq!(quantile_sorted(&values, 0.0), Some(1.0));
        assert_eq!(quantile_sorted(&values, 1.0), Some(4.0));
    }

    #[test]
    fn test_sample_std() {
        // Values: 1..5, mean 3, variance 10/4
        let std = sample_std(&[1.0, 2.0, 3.0, 4.0, 5.0]).unwrap();
        assert!((std - 2.5f64.sqrt()).abs() < 1e-12);
        assert_eq!(sample_std(&[5.0]), None);
    }

    #[test]
    fn test_numeric_mode_tie_goes_to_first_seen() {
        assert_eq!(numeric_mode(&[2.0, 1.0, 1.0, 2.0]), Some(2.0));
        assert_eq!(numeric_mode(&[3.0, 1.0, 1.0]), Some(1.0));
        assert_eq!(numeric_mode(&[]), None);
    }

    #[test]
    fn test_string_mode() {
        let series = Series::new("test".into(), &["a", "b", "a", "c", "a"]);
        assert_eq!(string_mode(&series), Some("a".to_string()));

        let tied = Series::new("test".into(), &[Some("b"), None, Some("a")]);
        assert_eq!(string_mode(&tied), Some("b".to_string()));
    }
}
