//! Loading the source table.
//!
//! A [`DataSource`] is either an HTTP(S) URL or a local file path. The
//! [`Loader`] fetches the raw bytes, parses them as CSV (header row, `NA` as
//! missing) and checks the result against the documented schema.
//!
//! # Example
//!
//! ```rust,ignore
//! use impute_pipeline::loader::{DataSource, Loader};
//!
//! let source = DataSource::parse("https://example.com/SegData.csv");
//! let df = Loader::default().load(&source)?;
//! println!("{:?}", df.shape());
//! ```

mod schema;

pub use schema::{ColumnKind, ColumnSpec, SEGDATA_SCHEMA, check_schema};

use crate::config::DEFAULT_TIMEOUT_SECS;
use crate::error::{ImputeError, Result};
use polars::io::csv::read::{CsvParseOptions, CsvReadOptions, NullValues};
use polars::prelude::*;
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::Cursor;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info};

/// Public location of the customer segmentation dataset.
pub const SEGDATA_URL: &str =
    "https://raw.githubusercontent.com/happyrabbit/DataScientistR/master/Data/SegData.csv";

/// Token that marks a missing value in the CSV text.
const MISSING_TOKEN: &str = "NA";

/// Number of rows used to infer column types.
const INFER_SCHEMA_ROWS: usize = 100;

/// Where the table comes from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataSource {
    /// Fetched with an HTTP(S) GET.
    Url(String),
    /// Read from the local filesystem.
    Path(PathBuf),
}

impl DataSource {
    /// Classify a locator: `http://` and `https://` are URLs, anything else a path.
    pub fn parse(locator: &str) -> Self {
        let trimmed = locator.trim();
        let lower = trimmed.to_ascii_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") {
            DataSource::Url(trimmed.to_string())
        } else {
            DataSource::Path(PathBuf::from(trimmed))
        }
    }
}

impl fmt::Display for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataSource::Url(url) => write!(f, "{}", url),
            DataSource::Path(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Reads a [`DataSource`] into a `DataFrame`.
#[derive(Debug, Clone)]
pub struct Loader {
    timeout_secs: u64,
}

impl Default for Loader {
    fn default() -> Self {
        Self::new(DEFAULT_TIMEOUT_SECS)
    }
}

impl Loader {
    /// Create a loader that checks tables against the SegData schema.
    pub fn new(timeout_secs: u64) -> Self {
        Self { timeout_secs }
    }

    /// Load and parse the source.
    ///
    /// # Errors
    ///
    /// - I/O errors ([`ImputeError::Io`], [`ImputeError::Http`],
    ///   [`ImputeError::HttpStatus`]) when the source cannot be reached
    /// - [`ImputeError::Format`] when the content is not CSV or lacks a
    ///   required column
    pub fn load(&self, source: &DataSource) -> Result<DataFrame> {
        info!("Loading dataset from: {}", source);

        let bytes = match source {
            DataSource::Url(url) => self.fetch_url(url)?,
            DataSource::Path(path) => std::fs::read(path)?,
        };
        debug!("Read {} bytes", bytes.len());

        let df = read_csv_bytes(bytes)?;
        check_schema(&df, SEGDATA_SCHEMA)?;

        info!("Dataset loaded successfully: {:?}", df.shape());
        Ok(df)
    }

    fn fetch_url(&self, url: &str) -> Result<Vec<u8>> {
        let client = Client::builder()
            .timeout(Duration::from_secs(self.timeout_secs))
            .build()?;

        let response = client.get(url).send()?;

        if !response.status().is_success() {
            return Err(ImputeError::HttpStatus {
                url: url.to_string(),
                status: response.status().as_u16(),
            });
        }

        Ok(response.bytes()?.to_vec())
    }
}

/// Parse CSV bytes into a `DataFrame`.
///
/// Tries quote-aware parsing first and falls back to parsing without quote
/// handling. Fails with [`ImputeError::Format`] if neither succeeds.
pub fn read_csv_bytes(bytes: Vec<u8>) -> Result<DataFrame> {
    if bytes.iter().all(|b| b.is_ascii_whitespace()) {
        return Err(ImputeError::Format("source is empty".to_string()));
    }

    // Strategy 1: Standard loading with quote handling
    let first_error = match parse_csv(bytes.clone(), Some(b'"')) {
        Ok(df) => return validate_shape(df),
        Err(e) => {
            debug!("Standard loading failed: {}", e);
            e
        }
    };

    // Strategy 2: Without quote handling
    match parse_csv(bytes, None) {
        Ok(df) => validate_shape(df),
        Err(e) => {
            debug!("Loading without quotes failed: {}", e);
            Err(ImputeError::Format(first_error.to_string()))
        }
    }
}

fn parse_csv(bytes: Vec<u8>, quote_char: Option<u8>) -> PolarsResult<DataFrame> {
    let parse_options = CsvParseOptions::default()
        .with_quote_char(quote_char)
        .with_null_values(Some(NullValues::AllColumnsSingle(MISSING_TOKEN.into())));

    CsvReadOptions::default()
        .with_infer_schema_length(Some(INFER_SCHEMA_ROWS))
        .with_has_header(true)
        .with_parse_options(parse_options)
        .into_reader_with_file_handle(Cursor::new(bytes))
        .finish()
}

fn validate_shape(df: DataFrame) -> Result<DataFrame> {
    if df.width() == 0 {
        return Err(ImputeError::Format("no columns found".to_string()));
    }
    Ok(df)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "age,gender,income,house,store_exp\n\
                          57,Female,120963.4,Yes,529.13\n\
                          63,Female,122008.1,Yes,478.01\n\
                          300,Male,NA,No,-500\n";

    #[test]
    fn test_data_source_parse() {
        assert_eq!(
            DataSource::parse("https://example.com/a.csv"),
            DataSource::Url("https://example.com/a.csv".to_string())
        );
        assert_eq!(
            DataSource::parse("HTTP://example.com/a.csv"),
            DataSource::Url("HTTP://example.com/a.csv".to_string())
        );
        assert_eq!(
            DataSource::parse("data/SegData.csv"),
            DataSource::Path(PathBuf::from("data/SegData.csv"))
        );
    }

    #[test]
    fn test_data_source_display() {
        assert_eq!(DataSource::parse(SEGDATA_URL).to_string(), SEGDATA_URL);
    }

    #[test]
    fn test_read_csv_bytes_basic() {
        let df = read_csv_bytes(SAMPLE.as_bytes().to_vec()).unwrap();
        assert_eq!(df.shape(), (3, 5));
        assert!(matches!(df.column("age").unwrap().dtype(), DataType::Int64));
    }

    #[test]
    fn test_read_csv_bytes_na_is_missing() {
        let df = read_csv_bytes(SAMPLE.as_bytes().to_vec()).unwrap();
        let income = df.column("income").unwrap();
        assert_eq!(income.null_count(), 1);
        assert!(matches!(income.dtype(), DataType::Float64));
    }

    #[test]
    fn test_read_csv_bytes_empty_is_format_error() {
        let err = read_csv_bytes(b"  \n".to_vec()).unwrap_err();
        assert!(err.is_format());
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        let source = DataSource::Path(PathBuf::from("definitely/not/here.csv"));
        let err = Loader::default().load(&source).unwrap_err();
        assert!(err.is_io());
    }
}
