//! Statistical imputation methods.
//!
//! Provides mean, median and most-frequent imputation. Each column's fill
//! value is computed from that column's observed values alone.

use super::{ImputationStrategy, check_targets};
use crate::error::{ImputeError, Result};
use crate::utils::{
    fill_numeric_nulls, fill_string_nulls, is_numeric_dtype, mean, median, missing_count,
    numeric_mode, observed_values, series_of, string_mode,
};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

/// The value a column's missing entries are replaced with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FillValue {
    Numeric(f64),
    Text(String),
}

impl fmt::Display for FillValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FillValue::Numeric(v) => write!(f, "{:.4}", v),
            FillValue::Text(s) => write!(f, "'{}'", s),
        }
    }
}

/// Single-value imputation: mean, median or most frequent.
#[derive(Debug, Clone, Copy)]
pub struct StatisticalImputer {
    strategy: ImputationStrategy,
}

impl StatisticalImputer {
    /// Create an imputer for a statistical strategy.
    ///
    /// Returns [`ImputeError::InvalidConfig`] for [`ImputationStrategy::Knn`],
    /// which has no single fill value.
    pub fn new(strategy: ImputationStrategy) -> Result<Self> {
        if !strategy.is_statistical() {
            return Err(ImputeError::InvalidConfig(format!(
                "'{}' is not a statistical strategy",
                strategy
            )));
        }
        Ok(Self { strategy })
    }

    /// Learn one fill value per target column.
    pub fn fit(&self, df: &DataFrame, targets: &[String]) -> Result<FittedImputer> {
        check_targets(df, targets)?;

        let mut fills = Vec::with_capacity(targets.len());
        for target in targets {
            let series = series_of(df, target)?;
            let fill = self.fill_value_for(series)?;
            debug!("Fitted '{}' fill value for '{}': {}", self.strategy, target, fill);
            fills.push((target.clone(), fill));
        }

        Ok(FittedImputer {
            strategy: self.strategy,
            fills,
        })
    }

    /// Fit on `df` and fill the same table.
    pub fn fit_transform(&self, df: &DataFrame, targets: &[String]) -> Result<DataFrame> {
        self.fit(df, targets)?.transform(df)
    }

    fn fill_value_for(&self, series: &Series) -> Result<FillValue> {
        let column = series.name().as_str();
        let numeric = is_numeric_dtype(series.dtype());

        if !numeric && self.strategy != ImputationStrategy::MostFrequent {
            return Err(ImputeError::value(
                column,
                format!(
                    "'{}' needs a numeric column, found {}",
                    self.strategy,
                    series.dtype()
                ),
            ));
        }

        let fill = if numeric {
            let observed = observed_values(series)?;
            let value = match self.strategy {
                ImputationStrategy::Mean => mean(&observed),
                ImputationStrategy::Median => median(&observed),
                _ => numeric_mode(&observed),
            };
            value.map(FillValue::Numeric)
        } else {
            string_mode(series).map(FillValue::Text)
        };

        fill.ok_or_else(|| {
            ImputeError::value(
                column,
                format!("no observed values, '{}' is undefined", self.strategy),
            )
        })
    }
}

/// Fill values learned by [`StatisticalImputer::fit`].
#[derive(Debug, Clone, PartialEq)]
pub struct FittedImputer {
    strategy: ImputationStrategy,
    fills: Vec<(String, FillValue)>,
}

impl FittedImputer {
    /// Fill value for a column, if it was fitted.
    pub fn fill_value(&self, column: &str) -> Option<&FillValue> {
        self.fills
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, fill)| fill)
    }

    /// Fitted columns with their fill values, in target order.
    pub fn fill_values(&self) -> &[(String, FillValue)] {
        &self.fills
    }

    /// Return the fitted columns of `df` with missing entries filled.
    ///
    /// Columns without missing entries come back unchanged, dtype included.
    pub fn transform(&self, df: &DataFrame) -> Result<DataFrame> {
        let mut columns = Vec::with_capacity(self.fills.len());

        for (name, fill) in &self.fills {
            let series = series_of(df, name)?;

            let missing = missing_count(series);

            let filled = if missing == 0 {
                series.clone()
            } else {
                debug!(
                    "Filling {} entries of '{}' with {} {}",
                    missing, name, self.strategy, fill
                );
                match fill {
                    FillValue::Numeric(v) => fill_numeric_nulls(series, *v)?,
                    FillValue::Text(s) => fill_string_nulls(series, s)?,
                }
            };
            columns.push(Column::from(filled));
        }

        Ok(DataFrame::new(columns)?)
    }
}
