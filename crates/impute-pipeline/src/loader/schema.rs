//! The documented column layout of the SegData customer table.

use crate::error::{ImputeError, Result};
use crate::utils::is_numeric_dtype;
use polars::prelude::*;
use tracing::warn;

/// Expected kind of a documented column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Numeric,
    Text,
}

/// A documented column of the table.
#[derive(Debug, Clone, Copy)]
pub struct ColumnSpec {
    pub name: &'static str,
    pub kind: ColumnKind,
    /// Required columns fail the load when absent or mistyped.
    pub required: bool,
}

const fn numeric(name: &'static str, required: bool) -> ColumnSpec {
    ColumnSpec {
        name,
        kind: ColumnKind::Numeric,
        required,
    }
}

const fn text(name: &'static str) -> ColumnSpec {
    ColumnSpec {
        name,
        kind: ColumnKind::Text,
        required: false,
    }
}

/// Column layout of `SegData.csv`.
pub const SEGDATA_SCHEMA: &[ColumnSpec] = &[
    numeric("age", true),
    text("gender"),
    numeric("income", false),
    text("house"),
    numeric("store_exp", true),
    numeric("online_exp", false),
    numeric("store_trans", false),
    numeric("online_trans", false),
    numeric("Q1", false),
    numeric("Q2", false),
    numeric("Q3", false),
    numeric("Q4", false),
    numeric("Q5", false),
    numeric("Q6", false),
    numeric("Q7", false),
    numeric("Q8", false),
    numeric("Q9", false),
    numeric("Q10", false),
    text("segment"),
];

/// Check a loaded table against a schema.
///
/// Required columns must be present and of the right kind. Optional columns
/// that are missing or mistyped only produce a warning.
pub fn check_schema(df: &DataFrame, schema: &[ColumnSpec]) -> Result<()> {
    for spec in schema {
        let Ok(column) = df.column(spec.name) else {
            if spec.required {
                return Err(ImputeError::Format(format!(
                    "required column '{}' is missing",
                    spec.name
                )));
            }
            warn!("Documented column '{}' is not present", spec.name);
            continue;
        };

        // an all-null column has no usable dtype to judge
        if column.null_count() == column.len() {
            continue;
        }

        let kind_matches = match spec.kind {
            ColumnKind::Numeric => is_numeric_dtype(column.dtype()),
            ColumnKind::Text => true,
        };

        if !kind_matches {
            if spec.required {
                return Err(ImputeError::Format(format!(
                    "column '{}' must be numeric, found {}",
                    spec.name,
                    column.dtype()
                )));
            }
            warn!(
                "Column '{}' was expected to be numeric but is {}",
                spec.name,
                column.dtype()
            );
        }
    }

    Ok(())
}
