use crate::imputers::{ColumnImputation, ImputationStrategy};
use crate::summary::TableDescription;
use crate::types::PipelineResult;
use crate::validator::RuleOutcome;
use chrono::Local;
use serde::{Deserialize, Serialize};

// ============================================================================
// Run Report Types
// ============================================================================

/// Serializable summary of one pipeline run.
///
/// Printed to stdout by the CLI's `--json` flag, and usable programmatically
/// in library mode.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    /// Timestamp when the report was generated
    pub generated_at: String,
    /// URL or path the table came from
    pub source: Option<String>,
    /// Total execution time in milliseconds
    pub duration_ms: u64,
    /// (rows, columns) of the resulting table
    pub shape: (usize, usize),

    /// Per-rule validation outcome
    pub validation: Vec<RuleOutcome>,
    /// Missing entries per column after validation
    pub missing_after_validation: Vec<MissingCount>,

    /// Per-strategy imputation outcome
    pub imputations: Vec<StrategyReport>,
    /// Strategy whose result was written back, if any
    pub written_back: Option<ImputationStrategy>,

    pub description_before: TableDescription,
    pub description_after: TableDescription,
}

/// Missing entries in one column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MissingCount {
    pub column: String,
    pub missing: usize,
}

/// What one strategy did to the target columns.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrategyReport {
    pub strategy: ImputationStrategy,
    pub total_filled: usize,
    pub columns: Vec<ColumnImputation>,
}

pub struct ReportGenerator;

impl ReportGenerator {
    /// Build a run report from pipeline results.
    pub fn build_run_report(result: &PipelineResult) -> RunReport {
        let missing_after_validation = result
            .missing_after_validation
            .iter()
            .map(|(column, missing)| MissingCount {
                column: column.clone(),
                missing: *missing,
            })
            .collect();

        let imputations = result
            .imputations
            .iter()
            .map(|outcome| StrategyReport {
                strategy: outcome.strategy,
                total_filled: outcome.total_filled(),
                columns: outcome.columns.clone(),
            })
            .collect();

        RunReport {
            generated_at: Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            source: result.source.as_ref().map(|s| s.to_string()),
            duration_ms: result.duration_ms,
            shape: result.shape(),
            validation: result.validation.outcomes.clone(),
            missing_after_validation,
            imputations,
            written_back: result.written_back,
            description_before: result.description_before.clone(),
            description_after: result.description_after.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PipelineConfig;
    use crate::pipeline::Pipeline;
    use polars::prelude::*;

    fn run() -> PipelineResult {
        let df = df![
            "age" => [Some(25.0), Some(150.0), Some(40.0), None],
            "store_exp" => [Some(10.0), Some(-1.0), Some(30.0), Some(20.0)],
        ]
        .unwrap();
        let config = PipelineConfig::builder()
            .strategies(vec![ImputationStrategy::Mean, ImputationStrategy::MostFrequent])
            .build()
            .unwrap();
        Pipeline::builder()
            .config(config)
            .build()
            .unwrap()
            .process(df)
            .unwrap()
    }

    #[test]
    fn test_build_run_report() {
        let report = ReportGenerator::build_run_report(&run());

        assert!(report.source.is_none());
        assert_eq!(report.shape, (4, 2));
        assert_eq!(report.validation.len(), 2);
        assert_eq!(
            report.missing_after_validation[0],
            MissingCount {
                column: "age".to_string(),
                missing: 2
            }
        );
        assert_eq!(report.imputations.len(), 2);
        assert_eq!(report.imputations[0].strategy, ImputationStrategy::Mean);
        assert_eq!(report.imputations[0].total_filled, 3);
    }

    #[test]
    fn test_run_report_json() {
        let report = ReportGenerator::build_run_report(&run());
        let json = serde_json::to_value(&report).unwrap();

        assert_eq!(json["imputations"][1]["strategy"], "most_frequent");
        assert_eq!(json["imputations"][0]["columns"][0]["fill_value"], 32.5);
        assert_eq!(json["validation"][0]["rule"], "age <= 100");
        assert!(json["generated_at"].as_str().unwrap().len() >= 19);
    }
}
