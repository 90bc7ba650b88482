//! Error types for the cost impact pipeline.
//!
//! One enum per layer:
//!
//! - [`CsvError`] - CSV reading and decoding errors
//! - [`TableError`] - Missing required columns
//! - [`ParameterError`] - Coverage parameters outside their allowed ranges
//! - [`PipelineError`] - Top-level run errors (wraps the above)
//! - [`ServerError`] - HTTP boundary errors
//!
//! Conversion is automatic via `From` implementations,
//! allowing `?` to work across error boundaries.

use thiserror::Error;

// =============================================================================
// CSV Parsing Errors
// =============================================================================

/// CSV parsing error with line context.
#[derive(Debug, Clone)]
pub struct CsvError {
    pub line: usize,
    pub message: String,
}

impl CsvError {
    pub fn new(line: usize, message: impl Into<String>) -> Self {
        Self {
            line,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for CsvError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Line {}: {}", self.line, self.message)
    }
}

impl std::error::Error for CsvError {}

// =============================================================================
// Table Errors
// =============================================================================

/// Errors while extracting typed records from a parsed table.
#[derive(Debug, Error)]
pub enum TableError {
    /// A required header is absent from an input file.
    #[error("{file} is missing required column '{column}'")]
    MissingColumn { file: String, column: String },
}

// =============================================================================
// Parameter Errors
// =============================================================================

/// Coverage parameters outside the ranges the tool accepts.
#[derive(Debug, Error, PartialEq)]
pub enum ParameterError {
    #[error("total_months must be between 1 and 36, got {0}")]
    TotalMonths(i64),

    #[error("stock_months must be between 0 and 12, got {0}")]
    StockMonths(i64),
}

// =============================================================================
// Pipeline Errors (top-level)
// =============================================================================

/// Top-level run errors.
///
/// This is the error type returned by [`crate::transform::pipeline::compute`].
/// Every variant aborts the current run only; the caller can retry with new
/// uploads.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// CSV parsing error.
    #[error("CSV error in {file}: {source}")]
    Csv {
        file: String,
        #[source]
        source: CsvError,
    },

    /// Column or table error.
    #[error("Table error: {0}")]
    Table(#[from] TableError),

    /// Invalid coverage parameters.
    #[error("Invalid parameters: {0}")]
    Parameter(#[from] ParameterError),

    /// One of the three input files was not supplied.
    #[error("Missing input file: {0}")]
    MissingInput(String),

    /// More unique SKUs than the configured tier allows. No output is produced.
    #[error("You've exceeded the {limit} SKU limit ({count} SKUs found). Please upgrade to the Pro version.")]
    SkuLimitExceeded { count: usize, limit: usize },
}

impl PipelineError {
    /// Attach the file label to a CSV error.
    pub fn csv(file: impl Into<String>, source: CsvError) -> Self {
        PipelineError::Csv {
            file: file.into(),
            source,
        }
    }
}

// =============================================================================
// Server Errors
// =============================================================================

/// HTTP server errors.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Pipeline error.
    #[error("{0}")]
    Pipeline(#[from] PipelineError),

    /// Invalid request.
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Upload larger than the configured body limit.
    #[error("Upload too large: {0}")]
    PayloadTooLarge(String),

    /// Access code did not match.
    #[error("Invalid access code")]
    Unauthorized,

    /// Server internal error.
    #[error("Internal server error: {0}")]
    Internal(String),
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for CSV operations.
pub type CsvResult<T> = Result<T, CsvError>;

/// Result type for table extraction.
pub type TableResult<T> = Result<T, TableError>;

/// Result type for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Result type for server operations.
pub type ServerResult<T> = Result<T, ServerError>;
