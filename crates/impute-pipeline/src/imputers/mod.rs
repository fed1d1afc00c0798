//! Imputation module for handling missing values.
//!
//! This module provides the interchangeable strategies:
//! - Statistical imputation (mean, median, most frequent)
//! - KNN imputation
//!
//! Every imputer reads the source table and returns a derived table that
//! holds only the target columns. The source is never mutated;
//! [`write_back`] copies a derived table's columns into it on request.

mod knn;
mod statistical;

pub use knn::KNNImputer;
pub use statistical::{FillValue, FittedImputer, StatisticalImputer};

use crate::error::{ImputeError, Result};
use crate::utils::{missing_count, series_of};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use tracing::{debug, info};

/// How missing values are estimated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImputationStrategy {
    /// Arithmetic mean of the observed values.
    Mean,
    /// Median of the observed values.
    Median,
    /// Most frequent observed value, ties broken by first occurrence.
    MostFrequent,
    /// Average of the k nearest complete rows.
    Knn,
}

impl ImputationStrategy {
    /// Every strategy, in reporting order.
    pub const ALL: [ImputationStrategy; 4] = [
        ImputationStrategy::Mean,
        ImputationStrategy::Median,
        ImputationStrategy::MostFrequent,
        ImputationStrategy::Knn,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ImputationStrategy::Mean => "mean",
            ImputationStrategy::Median => "median",
            ImputationStrategy::MostFrequent => "most_frequent",
            ImputationStrategy::Knn => "knn",
        }
    }

    /// Whether the strategy fills each column with a single value.
    pub fn is_statistical(&self) -> bool {
        !matches!(self, ImputationStrategy::Knn)
    }
}

impl fmt::Display for ImputationStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ImputationStrategy {
    type Err = ImputeError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mean" => Ok(ImputationStrategy::Mean),
            "median" => Ok(ImputationStrategy::Median),
            "most_frequent" | "most-frequent" | "mode" => Ok(ImputationStrategy::MostFrequent),
            "knn" => Ok(ImputationStrategy::Knn),
            other => Err(ImputeError::InvalidConfig(format!(
                "unknown imputation strategy '{}' (expected mean, median, most_frequent or knn)",
                other
            ))),
        }
    }
}

/// What happened to one target column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnImputation {
    pub column: String,
    /// The single value used to fill the column; `None` for KNN.
    pub fill_value: Option<FillValue>,
    /// Missing entries that received a value.
    pub filled: usize,
    /// Missing entries left after imputation.
    pub still_missing: usize,
}

/// Result of running one strategy over the target columns.
#[derive(Debug, Clone)]
pub struct ImputationOutcome {
    pub strategy: ImputationStrategy,
    /// Derived table holding exactly the target columns.
    pub imputed: DataFrame,
    pub columns: Vec<ColumnImputation>,
}

impl ImputationOutcome {
    /// Total number of entries filled across all target columns.
    pub fn total_filled(&self) -> usize {
        self.columns.iter().map(|c| c.filled).sum()
    }

    /// Fill value used for a column, when the strategy has one.
    pub fn fill_value(&self, column: &str) -> Option<&FillValue> {
        self.columns
            .iter()
            .find(|c| c.column == column)
            .and_then(|c| c.fill_value.as_ref())
    }
}

/// Dispatches a strategy to the matching imputer.
pub struct Imputer;

impl Imputer {
    /// Impute the target columns of `df` with `strategy`.
    ///
    /// `knn_neighbors` is only used by [`ImputationStrategy::Knn`].
    ///
    /// # Errors
    ///
    /// - [`ImputeError::InvalidConfig`] for an empty or duplicated target list
    /// - [`ImputeError::ColumnNotFound`] when a target column is absent
    /// - [`ImputeError::Value`] when the strategy is undefined for a column
    pub fn impute(
        df: &DataFrame,
        targets: &[String],
        strategy: ImputationStrategy,
        knn_neighbors: usize,
    ) -> Result<ImputationOutcome> {
        check_targets(df, targets)?;
        info!(
            "Imputing {} column(s) with strategy '{}'",
            targets.len(),
            strategy
        );

        let (imputed, fills) = match strategy {
            ImputationStrategy::Knn => {
                let imputed = KNNImputer::new(knn_neighbors).fit_transform(df, targets)?;
                (imputed, None)
            }
            _ => {
                let fitted = StatisticalImputer::new(strategy)?.fit(df, targets)?;
                let imputed = fitted.transform(df)?;
                (imputed, Some(fitted))
            }
        };

        let mut columns = Vec::with_capacity(targets.len());
        for target in targets {
            let missing_before = missing_count(series_of(df, target)?);
            let still_missing = missing_count(series_of(&imputed, target)?);
            let fill_value = fills
                .as_ref()
                .and_then(|f| f.fill_value(target))
                .cloned();

            debug!(
                "Column '{}': filled {} of {} missing entries",
                target,
                missing_before - still_missing,
                missing_before
            );

            columns.push(ColumnImputation {
                column: target.clone(),
                fill_value,
                filled: missing_before - still_missing,
                still_missing,
            });
        }

        let outcome = ImputationOutcome {
            strategy,
            imputed,
            columns,
        };
        info!(
            "Strategy '{}' filled {} entries",
            strategy,
            outcome.total_filled()
        );
        Ok(outcome)
    }
}

/// Replace the columns of `df` with the same-named columns of `derived`.
pub fn write_back(df: &mut DataFrame, derived: &DataFrame) -> Result<()> {
    if derived.height() != df.height() {
        return Err(ImputeError::InvalidConfig(format!(
            "cannot write back {} rows into a table of {} rows",
            derived.height(),
            df.height()
        )));
    }

    for column in derived.get_columns() {
        let name = column.name().to_string();
        series_of(df, &name)?;
        df.replace(&name, column.as_materialized_series().clone())?;
        debug!("Wrote imputed column '{}' back into the table", name);
    }

    Ok(())
}

/// Reject empty or duplicated target lists and unknown columns.
pub(crate) fn check_targets(df: &DataFrame, targets: &[String]) -> Result<()> {
    if targets.is_empty() {
        return Err(ImputeError::InvalidConfig(
            "no target columns given".to_string(),
        ));
    }

    let mut seen = HashSet::new();
    for target in targets {
        if !seen.insert(target.as_str()) {
            return Err(ImputeError::InvalidConfig(format!(
                "target column '{}' given more than once",
                target
            )));
        }
        series_of(df, target)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn targets(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_strategy_from_str() {
        assert_eq!("mean".parse::<ImputationStrategy>().unwrap(), ImputationStrategy::Mean);
        assert_eq!("Median".parse::<ImputationStrategy>().unwrap(), ImputationStrategy::Median);
        assert_eq!(
            "most-frequent".parse::<ImputationStrategy>().unwrap(),
            ImputationStrategy::MostFrequent
        );
        assert_eq!(
            "mode".parse::<ImputationStrategy>().unwrap(),
            ImputationStrategy::MostFrequent
        );
        assert_eq!("knn".parse::<ImputationStrategy>().unwrap(), ImputationStrategy::Knn);
        assert!("average".parse::<ImputationStrategy>().is_err());
    }

    #[test]
    fn test_strategy_display_round_trips() {
        for strategy in ImputationStrategy::ALL {
            assert_eq!(strategy.to_string().parse::<ImputationStrategy>().unwrap(), strategy);
        }
    }

    #[test]
    fn test_strategy_serde_names() {
        let json = serde_json::to_string(&ImputationStrategy::MostFrequent).unwrap();
        assert_eq!(json, "\"most_frequent\"");
    }

    #[test]
    fn test_impute_mean_example() {
        let df = df![
            "age" => [Some(25.0), None, Some(40.0), None],
        ]
        .unwrap();

        let outcome =
            Imputer::impute(&df, &targets(&["age"]), ImputationStrategy::Mean, 5).unwrap();

        assert_eq!(outcome.total_filled(), 2);
        assert_eq!(outcome.fill_value("age"), Some(&FillValue::Numeric(32.5)));
        let age = outcome.imputed.column("age").unwrap();
        assert_eq!(age.null_count(), 0);
        assert_eq!(age.get(1).unwrap().try_extract::<f64>().unwrap(), 32.5);
        assert_eq!(age.get(3).unwrap().try_extract::<f64>().unwrap(), 32.5);
    }

    #[test]
    fn test_impute_returns_only_targets() {
        let df = df![
            "age" => [Some(25.0), None, Some(40.0)],
            "income" => [1.0, 2.0, 3.0],
            "store_exp" => [Some(10.0), Some(20.0), None],
        ]
        .unwrap();

        let outcome = Imputer::impute(
            &df,
            &targets(&["store_exp", "age"]),
            ImputationStrategy::Median,
            5,
        )
        .unwrap();

        assert_eq!(outcome.imputed.get_column_names_str(), vec!["store_exp", "age"]);
        assert_eq!(outcome.imputed.height(), 3);
        // source untouched
        assert_eq!(df.column("age").unwrap().null_count(), 1);
    }

    #[test]
    fn test_impute_knn_has_no_fill_value() {
        let df = df![
            "x" => [1.0, 2.0, 3.0, 4.0],
            "y" => [Some(10.0), Some(20.0), Some(30.0), None],
        ]
        .unwrap();

        let outcome = Imputer::impute(&df, &targets(&["y"]), ImputationStrategy::Knn, 2).unwrap();

        assert!(outcome.fill_value("y").is_none());
        assert_eq!(outcome.columns[0].filled, 1);
        assert_eq!(outcome.columns[0].still_missing, 0);
    }

    #[test]
    fn test_impute_rejects_bad_targets() {
        let df = df!["age" => [1.0, 2.0]].unwrap();

        let err = Imputer::impute(&df, &[], ImputationStrategy::Mean, 5).unwrap_err();
        assert!(matches!(err, ImputeError::InvalidConfig(_)));

        let err = Imputer::impute(&df, &targets(&["age", "age"]), ImputationStrategy::Mean, 5)
            .unwrap_err();
        assert!(matches!(err, ImputeError::InvalidConfig(_)));

        let err = Imputer::impute(&df, &targets(&["store_exp"]), ImputationStrategy::Mean, 5)
            .unwrap_err();
        assert!(matches!(err, ImputeError::ColumnNotFound(_)));
    }

    #[test]
    fn test_write_back_replaces_columns() {
        let mut df = df![
            "age" => [Some(25.0), None],
            "gender" => ["Female", "Male"],
        ]
        .unwrap();
        let derived = df!["age" => [25.0, 30.0]].unwrap();

        write_back(&mut df, &derived).unwrap();

        assert_eq!(df.column("age").unwrap().null_count(), 0);
        assert_eq!(df.width(), 2);
    }

    #[test]
    fn test_write_back_height_mismatch() {
        let mut df = df!["age" => [1.0, 2.0]].unwrap();
        let derived = df!["age" => [1.0]].unwrap();
        assert!(write_back(&mut df, &derived).is_err());
    }
}
