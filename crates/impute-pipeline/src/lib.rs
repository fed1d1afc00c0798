//! Missing-Value Imputation Pipeline Library
//!
//! Loads the SegData customer table, marks implausible values as missing and
//! fills the gaps with interchangeable imputation strategies, built with Rust
//! and Polars.
//!
//! # Overview
//!
//! - **Loading**: CSV from an HTTP(S) URL or a local path, `NA` read as missing
//! - **Validation**: per-column domain rules (`age <= 100`, `store_exp >= 0`)
//!   replace out-of-range values with nulls
//! - **Imputation**: mean, median, most frequent and k-nearest-neighbours
//! - **Summaries**: `head`, `describe` and missing-value counts
//! - **Progress Reporting**: per-stage progress updates
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use impute_pipeline::{ImputationStrategy, Pipeline, PipelineConfig};
//!
//! let config = PipelineConfig::builder()
//!     .source("https://example.com/SegData.csv")
//!     .target_columns(["age", "store_exp"])
//!     .strategies(vec![ImputationStrategy::Median, ImputationStrategy::Knn])
//!     .knn_neighbors(5)
//!     .build()?;
//!
//! let result = Pipeline::builder()
//!     .config(config)
//!     .on_progress(|update| {
//!         println!("[{:.0}%] {}", update.progress * 100.0, update.message);
//!     })
//!     .build()?
//!     .run()?;
//!
//! for outcome in &result.imputations {
//!     println!("{}: filled {} entries", outcome.strategy, outcome.total_filled());
//! }
//! ```
//!
//! # Using the components directly
//!
//! ```rust,ignore
//! use impute_pipeline::{DataSource, DomainRule, ImputationStrategy, Imputer, Loader, Validator};
//!
//! let mut df = Loader::default().load(&DataSource::parse("data/SegData.csv"))?;
//!
//! Validator::new(vec![
//!     DomainRule::at_most("age", 100.0),
//!     DomainRule::at_least("store_exp", 0.0),
//! ])
//! .validate(&mut df)?;
//!
//! let targets = vec!["age".to_string(), "store_exp".to_string()];
//! let outcome = Imputer::impute(&df, &targets, ImputationStrategy::Mean, 5)?;
//! println!("{}", outcome.imputed);
//! ```

pub mod config;
pub mod error;
pub mod imputers;
pub mod loader;
pub mod pipeline;
pub mod reporting;
pub mod summary;
pub mod types;
pub mod utils;
pub mod validator;

// Re-exports for convenient access
pub use config::{ConfigValidationError, PipelineConfig, PipelineConfigBuilder};
pub use error::{ImputeError, Result as ImputeResult, ResultExt};
pub use imputers::{
    ColumnImputation, FillValue, FittedImputer, ImputationOutcome, ImputationStrategy, Imputer,
    KNNImputer, StatisticalImputer, write_back,
};
pub use loader::{DataSource, Loader, SEGDATA_URL};
pub use pipeline::{
    ClosureProgressReporter, Pipeline, PipelineBuilder, PipelineStage, ProgressReporter,
    ProgressUpdate,
};
pub use reporting::{ReportGenerator, RunReport};
pub use summary::{TableDescription, describe, has_missing, head, missing_counts};
pub use types::PipelineResult;
pub use validator::{Bound, DomainRule, ValidationReport, Validator};
