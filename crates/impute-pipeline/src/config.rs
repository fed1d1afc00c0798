//! Configuration types for the imputation pipeline.
//!
//! This module provides configuration options using the builder pattern
//! for flexible and ergonomic pipeline setup.

use crate::imputers::ImputationStrategy;
use crate::loader::{DataSource, SEGDATA_URL};
use crate::validator::DomainRule;
use serde::{Deserialize, Serialize};

/// Default number of rows shown by the `head` summary.
pub const DEFAULT_HEAD_ROWS: usize = 5;

/// Default number of neighbours for KNN imputation.
pub const DEFAULT_KNN_NEIGHBORS: usize = 5;

/// Default HTTP timeout when fetching a remote source.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Columns imputed when none are specified.
pub fn default_target_columns() -> Vec<String> {
    vec!["age".to_string(), "store_exp".to_string()]
}

/// Domain rules applied when none are specified: `age <= 100`, `store_exp >= 0`.
pub fn default_domain_rules() -> Vec<DomainRule> {
    vec![
        DomainRule::at_most("age", 100.0),
        DomainRule::at_least("store_exp", 0.0),
    ]
}

/// Configuration for the imputation pipeline.
///
/// Use [`PipelineConfig::builder()`] to create a new configuration
/// with fluent API.
///
/// # Example
///
/// ```rust,ignore
/// use impute_pipeline::config::PipelineConfig;
/// use impute_pipeline::ImputationStrategy;
///
/// let config = PipelineConfig::builder()
///     .source("data/SegData.csv")
///     .strategies(vec![ImputationStrategy::Median])
///     .knn_neighbors(5)
///     .build()?;
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Where the table is loaded from.
    /// Default: the public SegData CSV
    pub source: DataSource,

    /// Columns whose missing values are imputed.
    /// Default: `age`, `store_exp`
    pub target_columns: Vec<String>,

    /// Per-column validity rules applied before imputation.
    /// Default: `age <= 100`, `store_exp >= 0`
    pub domain_rules: Vec<DomainRule>,

    /// Imputation strategies to run, each on its own copy of the target columns.
    /// Default: all four strategies
    pub strategies: Vec<ImputationStrategy>,

    /// Number of neighbors for KNN imputation.
    /// Default: 5
    pub knn_neighbors: usize,

    /// Strategy whose result is written back into the table, if any.
    /// Default: None
    pub write_back: Option<ImputationStrategy>,

    /// Number of rows shown by the `head` summary.
    /// Default: 5
    pub head_rows: usize,

    /// Timeout for fetching a remote source, in seconds.
    /// Default: 30
    pub timeout_secs: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            source: DataSource::Url(SEGDATA_URL.to_string()),
            target_columns: default_target_columns(),
            domain_rules: default_domain_rules(),
            strategies: ImputationStrategy::ALL.to_vec(),
            knn_neighbors: DEFAULT_KNN_NEIGHBORS,
            write_back: None,
            head_rows: DEFAULT_HEAD_ROWS,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl PipelineConfig {
    /// Create a new configuration builder.
    pub fn builder() -> PipelineConfigBuilder {
        PipelineConfigBuilder::default()
    }

    /// Validate the configuration and return errors if invalid.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.target_columns.is_empty() {
            return Err(ConfigValidationError::NoTargetColumns);
        }

        if self.strategies.is_empty() {
            return Err(ConfigValidationError::NoStrategies);
        }

        if self.knn_neighbors == 0 {
            return Err(ConfigValidationError::InvalidKnnNeighbors(
                self.knn_neighbors,
            ));
        }

        if self.timeout_secs == 0 {
            return Err(ConfigValidationError::InvalidTimeout(self.timeout_secs));
        }

        if let Some(strategy) = self.write_back
            && !self.strategies.contains(&strategy)
        {
            return Err(ConfigValidationError::WriteBackNotRun(strategy));
        }

        for rule in &self.domain_rules {
            rule.bound
                .check()
                .map_err(|reason| ConfigValidationError::InvalidRule {
                    rule: rule.to_string(),
                    reason,
                })?;
        }

        Ok(())
    }
}

/// Errors that can occur during configuration validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("At least one target column is required")]
    NoTargetColumns,

    #[error("At least one imputation strategy is required")]
    NoStrategies,

    #[error("Invalid KNN neighbors: {0} (must be at least 1)")]
    InvalidKnnNeighbors(usize),

    #[error("Invalid timeout: {0}s (must be at least 1)")]
    InvalidTimeout(u64),

    #[error("Write-back strategy '{0}' is not among the strategies to run")]
    WriteBackNotRun(ImputationStrategy),

    #[error("Invalid domain rule '{rule}': {reason}")]
    InvalidRule { rule: String, reason: String },
}

/// Builder for [`PipelineConfig`] with fluent API.
#[derive(Debug, Default)]
pub struct PipelineConfigBuilder {
    source: Option<DataSource>,
    target_columns: Option<Vec<String>>,
    domain_rules: Option<Vec<DomainRule>>,
    strategies: Option<Vec<ImputationStrategy>>,
    knn_neighbors: Option<usize>,
    write_back: Option<ImputationStrategy>,
    head_rows: Option<usize>,
    timeout_secs: Option<u64>,
}

impl PipelineConfigBuilder {
    /// Set the data source from a URL or a file path.
    pub fn source(mut self, locator: impl AsRef<str>) -> Self {
        self.source = Some(DataSource::parse(locator.as_ref()));
        self
    }

    /// Set the columns to impute.
    pub fn target_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.target_columns = Some(columns.into_iter().map(Into::into).collect());
        self
    }

    /// Replace the domain rules.
    pub fn domain_rules(mut self, rules: Vec<DomainRule>) -> Self {
        self.domain_rules = Some(rules);
        self
    }

    /// Set which imputation strategies run.
    pub fn strategies(mut self, strategies: Vec<ImputationStrategy>) -> Self {
        self.strategies = Some(strategies);
        self
    }

    /// Set the number of neighbors for KNN imputation.
    pub fn knn_neighbors(mut self, k: usize) -> Self {
        self.knn_neighbors = Some(k);
        self
    }

    /// Write the given strategy's result back into the table.
    pub fn write_back(mut self, strategy: ImputationStrategy) -> Self {
        self.write_back = Some(strategy);
        self
    }

    /// Set how many rows the `head` summary shows.
    pub fn head_rows(mut self, rows: usize) -> Self {
        self.head_rows = Some(rows);
        self
    }

    /// Set the HTTP timeout in seconds.
    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = Some(secs);
        self
    }

    /// Build the configuration.
    ///
    /// Returns a validated `PipelineConfig` or an error if validation fails.
    pub fn build(self) -> Result<PipelineConfig, ConfigValidationError> {
        let defaults = PipelineConfig::default();
        let config = PipelineConfig {
            source: self.source.unwrap_or(defaults.source),
            target_columns: self.target_columns.unwrap_or(defaults.target_columns),
            domain_rules: self.domain_rules.unwrap_or(defaults.domain_rules),
            strategies: self.strategies.unwrap_or(defaults.strategies),
            knn_neighbors: self.knn_neighbors.unwrap_or(defaults.knn_neighbors),
            write_back: self.write_back,
            head_rows: self.head_rows.unwrap_or(defaults.head_rows),
            timeout_secs: self.timeout_secs.unwrap_or(defaults.timeout_secs),
        };

        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validator::Bound;

    #[test]
    fn test_default_config() {
        let config = PipelineConfig::default();
        assert_eq!(config.source, DataSource::Url(SEGDATA_URL.to_string()));
        assert_eq!(config.target_columns, vec!["age", "store_exp"]);
        assert_eq!(config.domain_rules.len(), 2);
        assert_eq!(config.strategies.len(), 4);
        assert_eq!(config.knn_neighbors, 5);
        assert!(config.write_back.is_none());
    }

    #[test]
    fn test_builder_custom_values() {
        let config = PipelineConfig::builder()
            .source("fixtures/seg.csv")
            .target_columns(["income"])
            .strategies(vec![ImputationStrategy::Median, ImputationStrategy::Knn])
            .knn_neighbors(3)
            .write_back(ImputationStrategy::Median)
            .head_rows(10)
            .build()
            .unwrap();

        assert_eq!(config.source, DataSource::Path("fixtures/seg.csv".into()));
        assert_eq!(config.target_columns, vec!["income"]);
        assert_eq!(config.knn_neighbors, 3);
        assert_eq!(config.write_back, Some(ImputationStrategy::Median));
        assert_eq!(config.head_rows, 10);
    }

    #[test]
    fn test_validation_invalid_knn_neighbors() {
        let result = PipelineConfig::builder().knn_neighbors(0).build();
        assert!(matches!(
            result.unwrap_err(),
            ConfigValidationError::InvalidKnnNeighbors(0)
        ));
    }

    #[test]
    fn test_validation_empty_targets() {
        let result = PipelineConfig::builder()
            .target_columns(Vec::<String>::new())
            .build();
        assert!(matches!(
            result.unwrap_err(),
            ConfigValidationError::NoTargetColumns
        ));
    }

    #[test]
    fn test_validation_write_back_must_run() {
        let result = PipelineConfig::builder()
            .strategies(vec![ImputationStrategy::Mean])
            .write_back(ImputationStrategy::Knn)
            .build();
        assert!(matches!(
            result.unwrap_err(),
            ConfigValidationError::WriteBackNotRun(ImputationStrategy::Knn)
        ));
    }

    #[test]
    fn test_validation_inverted_range() {
        let rule = DomainRule::new("income", Bound::Between(10.0, 1.0));
        let result = PipelineConfig::builder().domain_rules(vec![rule]).build();
        assert!(matches!(
            result.unwrap_err(),
            ConfigValidationError::InvalidRule { .. }
        ));
    }

    #[test]
    fn test_config_serialization() {
        let config = PipelineConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let deserialized: PipelineConfig = serde_json::from_str(&json).unwrap();

        assert_eq!(config.source, deserialized.source);
        assert_eq!(config.domain_rules, deserialized.domain_rules);
        assert_eq!(config.strategies, deserialized.strategies);
    }

    #[test]
    fn test_pipeline_config_from_json() {
        let json = r#"{
            "source": { "Path": "data/SegData.csv" },
            "target_columns": ["age"],
            "domain_rules": [{ "column": "age", "bound": { "AtMost": 100.0 } }],
            "strategies": ["median", "most_frequent"],
            "knn_neighbors": 7,
            "write_back": "median",
            "head_rows": 3,
            "timeout_secs": 10
        }"#;

        let config: PipelineConfig = serde_json::from_str(json).expect("Should deserialize");

        assert_eq!(config.source, DataSource::Path("data/SegData.csv".into()));
        assert_eq!(config.domain_rules, vec![DomainRule::at_most("age", 100.0)]);
        assert_eq!(
            config.strategies,
            vec![ImputationStrategy::Median, ImputationStrategy::MostFrequent]
        );
        assert_eq!(config.write_back, Some(ImputationStrategy::Median));
        assert_eq!(config.timeout_secs, 10);
    }
}
