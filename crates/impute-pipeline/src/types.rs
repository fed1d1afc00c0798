//! Result types shared by the pipeline and the report generator.

use crate::imputers::{ImputationOutcome, ImputationStrategy};
use crate::loader::DataSource;
use crate::summary::TableDescription;
use crate::validator::ValidationReport;
use polars::prelude::*;

/// Everything a pipeline run produced.
#[derive(Debug, Clone)]
pub struct PipelineResult {
    /// Where the table was loaded from, when the pipeline loaded it.
    pub source: Option<DataSource>,
    /// Validated table, with the write-back strategy's columns applied if configured.
    pub data: DataFrame,
    /// First rows of the table as loaded.
    pub preview: DataFrame,
    pub validation: ValidationReport,
    /// One outcome per configured strategy, in configuration order.
    pub imputations: Vec<ImputationOutcome>,
    /// Numeric summary of the table as loaded.
    pub description_before: TableDescription,
    /// Numeric summary after out-of-range values were marked missing.
    pub description_after: TableDescription,
    /// Missing entries per column after validation.
    pub missing_after_validation: Vec<(String, usize)>,
    /// Strategy whose result was written into `data`, if any.
    pub written_back: Option<ImputationStrategy>,
    pub duration_ms: u64,
}

impl PipelineResult {
    /// Outcome of a given strategy, if it ran.
    pub fn imputation(&self, strategy: ImputationStrategy) -> Option<&ImputationOutcome> {
        self.imputations.iter().find(|o| o.strategy == strategy)
    }

    /// Rows and columns of the resulting table.
    pub fn shape(&self) -> (usize, usize) {
        self.data.shape()
    }
}
