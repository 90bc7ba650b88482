//! Report outputs built from a finished run.
//!
//! - [`export`] - Downloadable summary CSVs with display formatting
//! - [`charts`] - Series for the revenue, distribution and curve charts

pub mod charts;
pub mod export;

pub use charts::{build_charts, ChartData, HistogramBin, RevenueBar, RevenuePoint};
pub use export::{format_percent, format_thousands, round_half_even, summary_to_csv};
