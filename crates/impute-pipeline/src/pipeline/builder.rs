//! Main imputation pipeline module.
//!
//! This module provides the core `Pipeline` struct and builder for
//! orchestrating the load, validate, impute workflow.

use crate::config::{ConfigValidationError, PipelineConfig};
use crate::error::{ImputeError, Result, ResultExt};
use crate::imputers::{ImputationOutcome, ImputationStrategy, Imputer, write_back};
use crate::loader::Loader;
use crate::pipeline::progress::{
    ClosureProgressReporter, PipelineStage, ProgressReporter, ProgressUpdate,
};
use crate::summary::{describe, head, missing_counts};
use crate::types::PipelineResult;
use crate::validator::Validator;
use polars::prelude::*;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info};

/// The imputation pipeline.
///
/// Use [`Pipeline::builder()`] to create a new pipeline with custom configuration.
///
/// # Example
///
/// ```rust,ignore
/// use impute_pipeline::{ImputationStrategy, Pipeline, PipelineConfig};
///
/// let config = PipelineConfig::builder()
///     .source("data/SegData.csv")
///     .strategies(vec![ImputationStrategy::Median, ImputationStrategy::Knn])
///     .build()?;
///
/// let result = Pipeline::builder()
///     .config(config)
///     .on_progress(|update| {
///         println!("[{:.0}%] {}", update.progress * 100.0, update.message);
///     })
///     .build()?
///     .run()?;
/// ```
pub struct Pipeline {
    config: PipelineConfig,
    progress_reporter: Option<Arc<dyn ProgressReporter>>,
}

static_assertions::assert_impl_all!(Pipeline: Send);

impl Pipeline {
    /// Create a new pipeline builder.
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::default()
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Load the configured source and run every stage on it.
    pub fn run(&self) -> Result<PipelineResult> {
        let start_time = Instant::now();
        let outcome = self.load().and_then(|df| {
            let mut result = self.process_internal(df, start_time)?;
            result.source = Some(self.config.source.clone());
            Ok(result)
        });
        self.finish(outcome)
    }

    /// Run the validation, imputation and summary stages on an already loaded table.
    pub fn process(&self, df: DataFrame) -> Result<PipelineResult> {
        let outcome = self.process_internal(df, Instant::now());
        self.finish(outcome)
    }

    /// Report progress if a reporter is configured.
    fn report_progress(&self, update: ProgressUpdate) {
        if let Some(reporter) = &self.progress_reporter {
            reporter.report(update);
        }
    }

    fn finish(&self, outcome: Result<PipelineResult>) -> Result<PipelineResult> {
        match outcome {
            Ok(result) => {
                self.report_progress(ProgressUpdate::complete("Pipeline completed successfully"));
                info!("Pipeline completed in {} ms", result.duration_ms);
                Ok(result)
            }
            Err(e) => {
                self.report_progress(ProgressUpdate::failed(e.to_string()));
                error!("Pipeline error: {}", e);
                Err(e)
            }
        }
    }

    fn load(&self) -> Result<DataFrame> {
        self.report_progress(ProgressUpdate::with_sub_stage(
            PipelineStage::Loading,
            self.config.source.to_string(),
            0.0,
            "Loading dataset...",
        ));

        let df = Loader::new(self.config.timeout_secs)
            .load(&self.config.source)
            .context(format!("Failed to load '{}'", self.config.source))?;

        self.report_progress(ProgressUpdate::new(
            PipelineStage::Loading,
            1.0,
            format!("Loaded {} rows x {} columns", df.height(), df.width()),
        ));
        Ok(df)
    }

    fn process_internal(&self, mut df: DataFrame, start_time: Instant) -> Result<PipelineResult> {
        info!("Starting imputation pipeline on {:?}", df.shape());

        // Step 1: Validation
        self.report_progress(ProgressUpdate::new(
            PipelineStage::Validating,
            0.0,
            "Marking out-of-range values as missing...",
        ));

        let preview = head(&df, self.config.head_rows);
        let description_before = describe(&df)?;
        let validation = Validator::new(self.config.domain_rules.clone())
            .validate(&mut df)
            .context("Validation failed")?;
        let missing_after_validation = missing_counts(&df);

        self.report_progress(ProgressUpdate::new(
            PipelineStage::Validating,
            1.0,
            format!(
                "Marked {} values as missing",
                validation.total_invalidated()
            ),
        ));

        // Step 2: Imputation, each strategy on the same validated table
        let total = self.config.strategies.len();
        let mut imputations = Vec::with_capacity(total);

        for (idx, strategy) in self.config.strategies.iter().enumerate() {
            self.report_progress(ProgressUpdate::with_items(
                PipelineStage::Imputing,
                format!("Strategy: {}", strategy),
                idx,
                total,
                format!("Imputing with {}...", strategy),
            ));

            let outcome = Imputer::impute(
                &df,
                &self.config.target_columns,
                *strategy,
                self.config.knn_neighbors,
            )
            .context(format!("Imputation with '{}' failed", strategy))?;

            debug!(
                "Strategy '{}' filled {} entries",
                strategy,
                outcome.total_filled()
            );
            imputations.push(outcome);
        }

        self.report_progress(ProgressUpdate::with_items(
            PipelineStage::Imputing,
            "Done",
            total,
            total,
            format!("Ran {} imputation strategies", total),
        ));

        // Step 3: Summaries of the validated table
        self.report_progress(ProgressUpdate::new(
            PipelineStage::Summarizing,
            0.0,
            "Summarizing validated table...",
        ));
        let description_after = describe(&df)?;

        let written_back = self.apply_write_back(&mut df, &imputations)?;

        self.report_progress(ProgressUpdate::new(
            PipelineStage::Summarizing,
            1.0,
            "Summaries complete",
        ));

        Ok(PipelineResult {
            source: None,
            data: df,
            preview,
            validation,
            imputations,
            description_before,
            description_after,
            missing_after_validation,
            written_back,
            duration_ms: start_time.elapsed().as_millis() as u64,
        })
    }

    fn apply_write_back(
        &self,
        df: &mut DataFrame,
        imputations: &[ImputationOutcome],
    ) -> Result<Option<ImputationStrategy>> {
        let Some(strategy) = self.config.write_back else {
            return Ok(None);
        };

        let outcome = imputations
            .iter()
            .find(|o| o.strategy == strategy)
            .ok_or_else(|| {
                ImputeError::InvalidConfig(format!(
                    "write-back strategy '{}' did not run",
                    strategy
                ))
            })?;

        write_back(df, &outcome.imputed)?;
        info!("Wrote '{}' imputation back into the table", strategy);
        Ok(Some(strategy))
    }
}

/// Builder for creating a [`Pipeline`] instance.
///
/// Use [`Pipeline::builder()`] to get started.
#[derive(Default)]
pub struct PipelineBuilder {
    config: Option<PipelineConfig>,
    progress_reporter: Option<Arc<dyn ProgressReporter>>,
}

static_assertions::assert_impl_all!(PipelineBuilder: Send);

impl PipelineBuilder {
    /// Set the pipeline configuration.
    pub fn config(mut self, config: PipelineConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set a progress reporter for receiving updates during processing.
    pub fn progress_reporter(mut self, reporter: Arc<dyn ProgressReporter>) -> Self {
        self.progress_reporter = Some(reporter);
        self
    }

    /// Set a progress callback closure.
    ///
    /// For more complex scenarios, use [`progress_reporter`](Self::progress_reporter).
    pub fn on_progress<F>(mut self, callback: F) -> Self
    where
        F: Fn(ProgressUpdate) + Send + Sync + 'static,
    {
        self.progress_reporter = Some(Arc::new(ClosureProgressReporter::new(callback)));
        self
    }

    /// Build the pipeline.
    ///
    /// Returns an error if the configuration is invalid.
    pub fn build(self) -> std::result::Result<Pipeline, ConfigValidationError> {
        let config = self.config.unwrap_or_default();
        config.validate()?;

        Ok(Pipeline {
            config,
            progress_reporter: self.progress_reporter,
        })
    }
}
