//! Progress reporting for the imputation pipeline.
//!
//! # Example
//!
//! ```rust,ignore
//! use impute_pipeline::Pipeline;
//!
//! let result = Pipeline::builder()
//!     .on_progress(|update| {
//!         println!("[{:?}] {}", update.stage, update.message);
//!     })
//!     .build()?
//!     .run()?;
//! ```

use serde::{Deserialize, Serialize};

/// Stages of the imputation pipeline, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    /// Fetching and parsing the source table
    Loading,
    /// Marking out-of-range values as missing
    Validating,
    /// Running the configured imputation strategies
    Imputing,
    /// Computing the table summaries
    Summarizing,
    /// Pipeline completed successfully
    Complete,
    /// Pipeline failed with an error
    Failed,
}

impl PipelineStage {
    /// Returns a human-readable name for the stage.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Loading => "Loading Data",
            Self::Validating => "Validating Domains",
            Self::Imputing => "Imputing Values",
            Self::Summarizing => "Summarizing",
            Self::Complete => "Complete",
            Self::Failed => "Failed",
        }
    }

    /// Returns the typical weight of this stage in the overall pipeline (0.0 - 1.0).
    ///
    /// Weights of the working stages sum to 1.0.
    pub fn weight(&self) -> f32 {
        match self {
            Self::Loading => 0.30,
            Self::Validating => 0.10,
            Self::Imputing => 0.50,
            Self::Summarizing => 0.10,
            Self::Complete | Self::Failed => 0.0,
        }
    }

    /// Returns the cumulative progress at the start of this stage.
    pub fn base_progress(&self) -> f32 {
        match self {
            Self::Loading => 0.0,
            Self::Validating => 0.30,
            Self::Imputing => 0.40,
            Self::Summarizing => 0.90,
            Self::Complete => 1.0,
            Self::Failed => 0.0,
        }
    }
}

/// Progress update with optional sub-stage information.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressUpdate {
    /// Current pipeline stage
    pub stage: PipelineStage,

    /// Optional sub-stage description (e.g., "Strategy: median")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub_stage: Option<String>,

    /// Overall progress (0.0 - 1.0)
    pub progress: f32,

    /// Progress within current stage (0.0 - 1.0)
    pub stage_progress: f32,

    /// Human-readable message describing current activity
    pub message: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub items_processed: Option<usize>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub items_total: Option<usize>,
}

impl ProgressUpdate {
    /// Creates a new progress update for a stage without sub-stage info.
    pub fn new(stage: PipelineStage, stage_progress: f32, message: impl Into<String>) -> Self {
        Self::build(stage, None, stage_progress, message.into(), None)
    }

    /// Creates a new progress update with sub-stage information.
    pub fn with_sub_stage(
        stage: PipelineStage,
        sub_stage: impl Into<String>,
        stage_progress: f32,
        message: impl Into<String>,
    ) -> Self {
        Self::build(
            stage,
            Some(sub_stage.into()),
            stage_progress,
            message.into(),
            None,
        )
    }

    /// Creates a new progress update with item counts.
    pub fn with_items(
        stage: PipelineStage,
        sub_stage: impl Into<String>,
        current: usize,
        total: usize,
        message: impl Into<String>,
    ) -> Self {
        let stage_progress = if total > 0 {
            current as f32 / total as f32
        } else {
            0.0
        };
        Self::build(
            stage,
            Some(sub_stage.into()),
            stage_progress,
            message.into(),
            Some((current, total)),
        )
    }

    /// Creates a completion progress update.
    pub fn complete(message: impl Into<String>) -> Self {
        Self::build(PipelineStage::Complete, None, 1.0, message.into(), None)
    }

    /// Creates a failed progress update.
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            progress: 0.0,
            stage_progress: 0.0,
            ..Self::build(PipelineStage::Failed, None, 0.0, message.into(), None)
        }
    }

    fn build(
        stage: PipelineStage,
        sub_stage: Option<String>,
        stage_progress: f32,
        message: String,
        items: Option<(usize, usize)>,
    ) -> Self {
        let stage_progress = stage_progress.clamp(0.0, 1.0);
        let progress = stage.base_progress() + stage.weight() * stage_progress;
        Self {
            stage,
            sub_stage,
            progress: progress.clamp(0.0, 1.0),
            stage_progress,
            message,
            items_processed: items.map(|(current, _)| current),
            items_total: items.map(|(_, total)| total),
        }
    }
}

/// Trait for receiving progress updates while the pipeline runs.
///
/// # Example
///
/// ```rust,ignore
/// use impute_pipeline::{ProgressReporter, ProgressUpdate};
///
/// struct StderrReporter;
///
/// impl ProgressReporter for StderrReporter {
///     fn report(&self, update: ProgressUpdate) {
///         eprintln!("{:>3.0}% {}", update.progress * 100.0, update.message);
///     }
/// }
/// ```
pub trait ProgressReporter: Send + Sync {
    /// Called once per stage transition and once per strategy while imputing.
    fn report(&self, update: ProgressUpdate);
}

/// Wrapper that implements [`ProgressReporter`] using a closure.
pub struct ClosureProgressReporter<F>
where
    F: Fn(ProgressUpdate) + Send + Sync,
{
    callback: F,
}

impl<F> ClosureProgressReporter<F>
where
    F: Fn(ProgressUpdate) + Send + Sync,
{
    /// Creates a new closure-based progress reporter.
    pub fn new(callback: F) -> Self {
        Self { callback }
    }
}

impl<F> ProgressReporter for ClosureProgressReporter<F>
where
    F: Fn(ProgressUpdate) + Send + Sync,
{
    fn report(&self, update: ProgressUpdate) {
        (self.callback)(update);
    }
}

static_assertions::assert_impl_all!(ProgressUpdate: Send, Sync);
