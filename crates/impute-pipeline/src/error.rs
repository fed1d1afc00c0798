//! Custom error types for the imputation pipeline.
//!
//! Errors fall into three families that callers usually care about:
//!
//! - **I/O**: the data source could not be reached or read
//!   ([`ImputeError::Io`], [`ImputeError::Http`], [`ImputeError::HttpStatus`])
//! - **Format**: the content is not usable tabular data ([`ImputeError::Format`])
//! - **Value**: a strategy or rule is undefined for the data it was given
//!   ([`ImputeError::Value`])
//!
//! Errors serialize as `{ code, message }` so they can be emitted in the JSON
//! run report.

use serde::Serialize;
use serde::ser::SerializeStruct;
use thiserror::Error;

/// The main error type for the imputation pipeline.
#[derive(Error, Debug)]
pub enum ImputeError {
    /// Column was not found in the dataset.
    #[error("Column '{0}' not found in dataset")]
    ColumnNotFound(String),

    /// Invalid configuration provided.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Content could not be parsed as the expected tabular data.
    #[error("Malformed tabular data: {0}")]
    Format(String),

    /// A strategy or rule is undefined for the given column.
    #[error("Invalid value in column '{column}': {reason}")]
    Value { column: String, reason: String },

    /// Remote resource answered with a non-success status.
    #[error("Request to '{url}' failed with status {status}")]
    HttpStatus { url: String, status: u16 },

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP transport error wrapper.
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    /// Polars error wrapper.
    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with context.
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<ImputeError>,
    },
}

impl ImputeError {
    /// Shorthand for a [`ImputeError::Value`] error.
    pub fn value(column: impl Into<String>, reason: impl Into<String>) -> Self {
        ImputeError::Value {
            column: column.into(),
            reason: reason.into(),
        }
    }

    /// Add context to an error.
    pub fn with_context(self, context: impl Into<String>) -> Self {
        ImputeError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Get a stable error code.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::ColumnNotFound(_) => "COLUMN_NOT_FOUND",
            Self::InvalidConfig(_) => "INVALID_CONFIG",
            Self::Format(_) => "FORMAT_ERROR",
            Self::Value { .. } => "VALUE_ERROR",
            Self::HttpStatus { .. } => "HTTP_STATUS",
            Self::Io(_) => "IO_ERROR",
            Self::Http(_) => "HTTP_ERROR",
            Self::Polars(_) => "POLARS_ERROR",
            Self::Json(_) => "JSON_ERROR",
            Self::WithContext { source, .. } => source.error_code(),
        }
    }

    /// True when the data source could not be reached or read.
    pub fn is_io(&self) -> bool {
        match self {
            Self::Io(_) | Self::Http(_) | Self::HttpStatus { .. } => true,
            Self::WithContext { source, .. } => source.is_io(),
            _ => false,
        }
    }

    /// True when the content was not usable tabular data.
    pub fn is_format(&self) -> bool {
        match self {
            Self::Format(_) => true,
            Self::WithContext { source, .. } => source.is_format(),
            _ => false,
        }
    }

    /// True when a strategy or rule was undefined for its column.
    pub fn is_value(&self) -> bool {
        match self {
            Self::Value { .. } => true,
            Self::WithContext { source, .. } => source.is_value(),
            _ => false,
        }
    }
}

impl Serialize for ImputeError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut state = serializer.serialize_struct("ImputeError", 2)?;
        state.serialize_field("code", &self.error_code())?;
        state.serialize_field("message", &self.to_string())?;
        state.end()
    }
}

/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, ImputeError>;

/// Extension trait for adding context to Results.
pub trait ResultExt<T> {
    /// Add context to an error result.
    fn context(self, context: impl Into<String>) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, polars::error::PolarsError> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| ImputeError::Polars(e).with_context(context))
    }
}

static_assertions::assert_impl_all!(ImputeError: Send, Sync);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code() {
        assert_eq!(
            ImputeError::Format("bad".to_string()).error_code(),
            "FORMAT_ERROR"
        );
        assert_eq!(
            ImputeError::ColumnNotFound("age".to_string()).error_code(),
            "COLUMN_NOT_FOUND"
        );
        assert_eq!(ImputeError::value("age", "empty").error_code(), "VALUE_ERROR");
    }

    #[test]
    fn test_taxonomy_helpers() {
        let io = ImputeError::Io(std::io::Error::new(std::io::ErrorKind::NotFound, "gone"));
        assert!(io.is_io());
        assert!(!io.is_format());

        let status = ImputeError::HttpStatus {
            url: "https://example.com/data.csv".to_string(),
            status: 404,
        };
        assert!(status.is_io());

        assert!(ImputeError::Format("x".to_string()).is_format());
        assert!(ImputeError::value("age", "no observed values").is_value());
    }

    #[test]
    fn test_error_serialization() {
        let error = ImputeError::ColumnNotFound("store_exp".to_string());
        let json = serde_json::to_string(&error).unwrap();
        assert!(json.contains("COLUMN_NOT_FOUND"));
        assert!(json.contains("store_exp"));
    }

    #[test]
    fn test_with_context() {
        let error = ImputeError::value("age", "no observed values").with_context("During imputation");
        assert!(error.to_string().contains("During imputation"));
        assert_eq!(error.error_code(), "VALUE_ERROR"); // Preserves original code
        assert!(error.is_value());
    }
}
