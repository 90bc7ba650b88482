//! # Costimpact - cost and price change impact by product family and group
//!
//! Costimpact joins a cost file, a year-to-date sales file and a product
//! classification file on SKU, simulates each product's cost and price
//! change over a coverage window, and summarizes the result by
//! Product_Family and Product_Group.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │  3 CSV files│────▶│   Parser    │────▶│  Normalize  │────▶│ Join + Sim. │────▶│  Summaries  │
//! │  (ISO/UTF8) │     │  (auto-enc) │     │ (SKU, nums) │     │ (fraction)  │     │ (PM / PG)   │
//! └─────────────┘     └─────────────┘     └─────────────┘     └─────────────┘     └─────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use costimpact::{compute_from_files, CoverageParams, InputPaths, RunLimits};
//!
//! let paths = InputPaths {
//!     cost: "cost_file.csv".into(),
//!     sales: "sales_ytd.csv".into(),
//!     classification: "product_classification.csv".into(),
//! };
//! let report = compute_from_files(&paths, CoverageParams::new(6, 0), RunLimits::default()).unwrap();
//! println!("{}", costimpact::summary_to_csv(&report.family_summary).unwrap());
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Hierarchical error types
//! - [`models`] - Domain models (records, coverage, summaries)
//! - [`config`] - Environment configuration and tier limits
//! - [`parser`] - CSV parsing with auto-detection
//! - [`transform`] - Normalization, join, simulation, aggregation
//! - [`report`] - Summary CSV export and chart series
//! - [`api`] - HTTP API server

// Core modules
pub mod config;
pub mod error;
pub mod models;

// Parsing
pub mod parser;

// Computation
pub mod transform;

// Outputs
pub mod report;

// HTTP API
pub mod api;

// =============================================================================
// Re-exports - Error types
// =============================================================================

pub use error::{
    CsvError, CsvResult, ParameterError, PipelineError, PipelineResult, ServerError, TableError,
    TableResult,
};

// =============================================================================
// Re-exports - Models and configuration
// =============================================================================

pub use config::{AccessGate, AppConfig, RunLimits};
pub use models::{
    CoverageParams, EnrichedRecord, GroupBy, ImpactFraction, InputKind, ProductRecord, Summary,
    SummaryRow, Table,
};

// =============================================================================
// Re-exports - CSV Parsing
// =============================================================================

pub use parser::{
    decode_content, detect_delimiter, detect_encoding, parse_bytes_auto, parse_csv,
    parse_csv_file_auto, ParseResult,
};

// =============================================================================
// Re-exports - Pipeline
// =============================================================================

pub use transform::pipeline::{
    compute, compute_from_bytes, compute_from_files, compute_logged, FileInfo, ImpactReport,
    InputBytes, InputPaths,
};
pub use transform::{JoinStats, normalize_sku};

// =============================================================================
// Re-exports - Reports
// =============================================================================

pub use report::{build_charts, summary_to_csv, ChartData};

// =============================================================================
// Re-exports - API
// =============================================================================

pub use api::types::{error_response, AnalyzeResponse, ResponseMetadata, RunStatus};

// Server
pub mod server {
    pub use crate::api::server::{router, start_server};
}
