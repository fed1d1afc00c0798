//! Domain validation.
//!
//! Values that fall outside a column's plausible range (an `age` of 300, a
//! negative `store_exp`) are replaced with nulls so the imputers can treat
//! them like any other missing value. Each rule touches only its own column.

mod rules;

pub use rules::{Bound, DomainRule, RuleParseError};

use crate::error::{ImputeError, Result};
use crate::utils::{numeric_values, series_of};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Outcome of applying one rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleOutcome {
    /// Human-readable rule, e.g. `age <= 100`.
    pub rule: String,
    pub column: String,
    /// Observed values that failed the rule and are now missing.
    pub values_invalidated: usize,
    /// Missing values in the column after validation.
    pub missing_after: usize,
}

/// Outcome of a validation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub outcomes: Vec<RuleOutcome>,
}

impl ValidationReport {
    /// Total number of values invalidated across all rules.
    pub fn total_invalidated(&self) -> usize {
        self.outcomes.iter().map(|o| o.values_invalidated).sum()
    }

    /// Outcome for a column, if a rule was declared for it.
    pub fn for_column(&self, column: &str) -> Option<&RuleOutcome> {
        self.outcomes.iter().find(|o| o.column == column)
    }
}

/// Applies a set of [`DomainRule`]s to a table.
#[derive(Debug, Clone, Default)]
pub struct Validator {
    rules: Vec<DomainRule>,
}

impl Validator {
    pub fn new(rules: Vec<DomainRule>) -> Self {
        Self { rules }
    }

    /// Replace every value failing its column's rule with null, in place.
    ///
    /// Floating `NaN` in a validated column is normalised to null as well.
    /// Values that pass their rule are left bit-for-bit intact and every
    /// column keeps its dtype. Running the validator again on its own output
    /// changes nothing.
    ///
    /// # Errors
    ///
    /// - [`ImputeError::ColumnNotFound`] when a rule names an absent column
    /// - [`ImputeError::Value`] when a rule targets a non-numeric column
    pub fn validate(&self, df: &mut DataFrame) -> Result<ValidationReport> {
        let mut report = ValidationReport::default();

        info!("Validating {} domain rules...", self.rules.len());

        for rule in &self.rules {
            let outcome = Self::apply_rule(df, rule)?;
            debug!(
                "Rule '{}': {} values marked missing ({} missing in total)",
                outcome.rule, outcome.values_invalidated, outcome.missing_after
            );
            report.outcomes.push(outcome);
        }

        info!(
            "Validation complete: {} values marked missing",
            report.total_invalidated()
        );
        Ok(report)
    }

    fn apply_rule(df: &mut DataFrame, rule: &DomainRule) -> Result<RuleOutcome> {
        let series = series_of(df, &rule.column)?;
        let original_dtype = series.dtype().clone();

        let values = numeric_values(series).map_err(|_| {
            ImputeError::value(
                &rule.column,
                format!(
                    "domain rule '{}' needs a numeric column, found {}",
                    rule, original_dtype
                ),
            )
        })?;

        // Decided on f64 copies, applied to the original Series
        let mut values_invalidated = 0;
        let keep: Vec<bool> = values
            .iter()
            .map(|v| match v {
                Some(x) if !rule.bound.contains(*x) => {
                    values_invalidated += 1;
                    false
                }
                Some(_) => true,
                None => false,
            })
            .collect();
        let missing_after = keep.iter().filter(|k| !**k).count();

        let mask = BooleanChunked::from_slice("keep".into(), &keep);
        let nulls = Series::full_null(series.name().clone(), series.len(), &original_dtype);
        let validated = series.zip_with(&mask, &nulls)?;
        df.replace(&rule.column, validated)?;

        Ok(RuleOutcome {
            rule: rule.to_string(),
            column: rule.column.clone(),
            values_invalidated,
            missing_after,
        })
    }
}
