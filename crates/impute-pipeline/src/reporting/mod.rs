//! Report generation module.
//!
//! [`RunReport`] is the serializable view of a [`PipelineResult`](crate::PipelineResult):
//! validation counts, per-strategy fill values and the before/after summaries.
//!
//! # Example
//!
//! ```rust,ignore
//! use impute_pipeline::reporting::ReportGenerator;
//!
//! let report = ReportGenerator::build_run_report(&pipeline_result);
//! println!("{}", serde_json::to_string_pretty(&report)?);
//! ```

mod generator;

pub use generator::{MissingCount, ReportGenerator, RunReport, StrategyReport};
