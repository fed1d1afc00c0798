//! CLI entry point for the imputation pipeline.

use anyhow::{Result, anyhow};
use clap::{Parser, ValueEnum};
use dotenv::dotenv;
use impute_pipeline::config::{DEFAULT_HEAD_ROWS, DEFAULT_KNN_NEIGHBORS, DEFAULT_TIMEOUT_SECS};
use impute_pipeline::{
    DomainRule, ImputationStrategy, Pipeline, PipelineConfig, PipelineResult, ReportGenerator,
    SEGDATA_URL, head,
};
use tracing::{error, info};

/// CLI-compatible strategy selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum CliStrategy {
    /// Fill with the mean of observed values
    Mean,
    /// Fill with the median of observed values
    Median,
    /// Fill with the most frequent observed value
    MostFrequent,
    /// Average of the k nearest complete rows
    Knn,
    /// Run every strategy
    All,
}

impl CliStrategy {
    fn expand(self) -> Vec<ImputationStrategy> {
        match self {
            CliStrategy::Mean => vec![ImputationStrategy::Mean],
            CliStrategy::Median => vec![ImputationStrategy::Median],
            CliStrategy::MostFrequent => vec![ImputationStrategy::MostFrequent],
            CliStrategy::Knn => vec![ImputationStrategy::Knn],
            CliStrategy::All => ImputationStrategy::ALL.to_vec(),
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    version,
    about = "Missing-value imputation for the SegData customer table",
    long_about = "Loads a customer CSV, marks out-of-range values as missing and \
                  imputes them with mean, median, most-frequent and KNN strategies.\n\n\
                  ENVIRONMENT VARIABLES:\n  \
                  IMPUTE_SOURCE    Default input URL or path\n  \
                  RUST_LOG         Overrides --log-level\n\n\
                  EXAMPLES:\n  \
                  # Every strategy on the public dataset\n  \
                  impute-pipeline\n\n  \
                  # Median only on a local copy, written back\n  \
                  impute-pipeline -i SegData.csv -s median --write-back median\n\n  \
                  # KNN with 7 neighbours, JSON report\n  \
                  impute-pipeline -s knn -k 7 --json"
)]
struct Args {
    /// URL or path of the CSV to load
    #[arg(short, long, env = "IMPUTE_SOURCE", default_value = SEGDATA_URL)]
    input: String,

    /// Columns to impute
    #[arg(short, long, value_delimiter = ',', default_value = "age,store_exp")]
    columns: Vec<String>,

    /// Domain rule, e.g. `age<=100`, `store_exp>=0`, `income=0..500000`
    ///
    /// Repeatable. Defaults to `age<=100` and `store_exp>=0`.
    #[arg(long = "rule")]
    rules: Vec<DomainRule>,

    /// Imputation strategy to run (repeatable)
    #[arg(short, long = "strategy", value_enum, default_value = "all")]
    strategies: Vec<CliStrategy>,

    /// Number of neighbors for KNN imputation
    #[arg(short, long, default_value_t = DEFAULT_KNN_NEIGHBORS)]
    knn_neighbors: usize,

    /// Rows shown in the preview
    #[arg(long = "head", default_value_t = DEFAULT_HEAD_ROWS)]
    head_rows: usize,

    /// Write this strategy's result back into the table
    #[arg(long)]
    write_back: Option<ImputationStrategy>,

    /// Timeout for fetching a remote source, in seconds
    #[arg(long, default_value_t = DEFAULT_TIMEOUT_SECS)]
    timeout_secs: u64,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Suppress progress output (only show errors and final result)
    #[arg(short, long)]
    quiet: bool,

    /// Output JSON to stdout instead of human-readable summary
    ///
    /// Disables all progress logs; only outputs the final JSON report.
    #[arg(long)]
    json: bool,
}

/// Initialize the tracing subscriber for logging.
///
/// When `json_output` is true, logging is completely disabled to ensure
/// only JSON is written to stdout.
fn init_logging(level: &str, quiet: bool, json_output: bool) {
    if json_output {
        return;
    }

    use tracing_subscriber::EnvFilter;

    let effective_level = if quiet { "warn" } else { level };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(effective_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    // .env may provide IMPUTE_SOURCE, so load it before parsing
    dotenv().ok();

    let args = Args::parse();
    init_logging(&args.log_level, args.quiet, args.json);

    let config = build_config(&args)?;

    let mut builder = Pipeline::builder().config(config);
    if !args.quiet && !args.json {
        builder = builder.on_progress(|update| {
            info!(
                "[{:.0}%] {}: {}",
                update.progress * 100.0,
                update.stage.display_name(),
                update.message
            );
        });
    }
    let pipeline = builder.build()?;

    match pipeline.run() {
        Ok(result) => handle_pipeline_output(&result, &args),
        Err(e) => {
            error!("Pipeline failed: {}", e);
            Err(anyhow!("Pipeline failed [{}]: {}", e.error_code(), e))
        }
    }
}

fn build_config(args: &Args) -> Result<PipelineConfig> {
    let mut strategies: Vec<ImputationStrategy> = Vec::new();
    for strategy in args.strategies.iter().flat_map(|s| s.expand()) {
        if !strategies.contains(&strategy) {
            strategies.push(strategy);
        }
    }

    let mut config_builder = PipelineConfig::builder()
        .source(&args.input)
        .target_columns(args.columns.iter().map(|c| c.trim().to_string()))
        .strategies(strategies)
        .knn_neighbors(args.knn_neighbors)
        .head_rows(args.head_rows)
        .timeout_secs(args.timeout_secs);

    if !args.rules.is_empty() {
        config_builder = config_builder.domain_rules(args.rules.clone());
    }

    if let Some(strategy) = args.write_back {
        config_builder = config_builder.write_back(strategy);
    }

    Ok(config_builder.build()?)
}

/// Handle pipeline output based on CLI flags.
///
/// - Default: Print human-readable summary to stdout
/// - `--json`: Print JSON to stdout only (no logs)
fn handle_pipeline_output(result: &PipelineResult, args: &Args) -> Result<()> {
    if args.json {
        let report = ReportGenerator::build_run_report(result);
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    print_human_readable_summary(result, args);
    Ok(())
}

/// Print the loaded preview, summaries, missing checks and per-strategy results.
fn print_human_readable_summary(result: &PipelineResult, args: &Args) {
    println!();
    println!("{}", "=".repeat(80));
    println!("IMPUTATION COMPLETE");
    println!("{}", "=".repeat(80));
    println!();

    println!("Input: {}", args.input);
    println!("Shape: {} rows x {} columns", result.shape().0, result.shape().1);
    println!("Duration: {}ms", result.duration_ms);
    println!();

    println!("FIRST {} ROWS", result.preview.height());
    println!("{}", "-".repeat(40));
    println!("{}", result.preview);
    println!();

    println!("SUMMARY (as loaded)");
    println!("{}", "-".repeat(40));
    print!("{}", result.description_before);
    println!();

    println!("VALIDATION");
    println!("{}", "-".repeat(40));
    for outcome in &result.validation.outcomes {
        println!(
            "  {:<24} {} value(s) marked missing",
            outcome.rule, outcome.values_invalidated
        );
    }
    println!();

    println!("MISSING VALUES");
    println!("{}", "-".repeat(40));
    for (column, missing) in &result.missing_after_validation {
        if args.columns.iter().any(|c| c.trim() == column) {
            println!("  {:<12} has missing: {:<5} ({})", column, *missing > 0, missing);
        }
    }
    println!();

    println!("SUMMARY (after validation)");
    println!("{}", "-".repeat(40));
    print!("{}", result.description_after);
    println!();

    for outcome in &result.imputations {
        println!("STRATEGY: {}", outcome.strategy);
        println!("{}", "-".repeat(40));
        for column in &outcome.columns {
            match &column.fill_value {
                Some(fill) => println!(
                    "  {:<12} filled {} with {}",
                    column.column, column.filled, fill
                ),
                None => println!("  {:<12} filled {}", column.column, column.filled),
            }
            if column.still_missing > 0 {
                println!("  {:<12} ! {} still missing", "", column.still_missing);
            }
        }
        println!("{}", head(&outcome.imputed, args.head_rows));
        println!();
    }

    if let Some(strategy) = result.written_back {
        println!("Wrote '{}' imputation back into the table", strategy);
        println!();
    }

    println!("Use --json for machine-readable output");
    println!("{}", "=".repeat(80));
}

#[cfg(test)]
mod tests {
    use super::*;
    use impute_pipeline::config::default_domain_rules;

    fn args(extra: &[&str]) -> Args {
        let mut argv = vec!["impute-pipeline", "-i", "data/SegData.csv"];
        argv.extend_from_slice(extra);
        Args::parse_from(argv)
    }

    #[test]
    fn test_build_config_defaults() {
        let config = build_config(&args(&[])).unwrap();

        assert_eq!(config.strategies, ImputationStrategy::ALL.to_vec());
        assert_eq!(config.domain_rules, default_domain_rules());
        assert_eq!(config.target_columns, vec!["age", "store_exp"]);
        assert_eq!(config.knn_neighbors, DEFAULT_KNN_NEIGHBORS);
        assert!(config.write_back.is_none());
    }

    #[test]
    fn test_build_config_deduplicates_strategies() {
        let config = build_config(&args(&["-s", "median", "-s", "all", "-s", "median"])).unwrap();

        assert_eq!(
            config.strategies,
            vec![
                ImputationStrategy::Median,
                ImputationStrategy::Mean,
                ImputationStrategy::MostFrequent,
                ImputationStrategy::Knn,
            ]
        );
    }

    #[test]
    fn test_build_config_rules_replace_defaults() {
        let config = build_config(&args(&["--rule", "income=0..500000"])).unwrap();

        assert_eq!(
            config.domain_rules,
            vec![DomainRule::between("income", 0.0, 500000.0)]
        );
    }

    #[test]
    fn test_build_config_columns_and_write_back() {
        let config = build_config(&args(&[
            "-c",
            "age, store_exp",
            "-s",
            "most-frequent",
            "--write-back",
            "mode",
            "-k",
            "7",
        ]))
        .unwrap();

        assert_eq!(config.target_columns, vec!["age", "store_exp"]);
        assert_eq!(config.strategies, vec![ImputationStrategy::MostFrequent]);
        assert_eq!(config.write_back, Some(ImputationStrategy::MostFrequent));
        assert_eq!(config.knn_neighbors, 7);
    }

    #[test]
    fn test_build_config_rejects_write_back_not_run() {
        let err = build_config(&args(&["-s", "mean", "--write-back", "knn"])).unwrap_err();
        assert!(err.to_string().contains("knn"));
    }

    #[test]
    fn test_invalid_rule_is_a_parse_error() {
        let argv = ["impute-pipeline", "--rule", "age<100"];
        assert!(Args::try_parse_from(argv).is_err());
    }
}
