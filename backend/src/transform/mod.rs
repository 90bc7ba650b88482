//! Transformation module.
//!
//! - [`normalize`] - Header cleanup, SKU normalization, numeric coercion
//! - [`join`] - Left join of sales with cost and classification
//! - [`simulate`] - Per-SKU cost and price change under the impact fraction
//! - [`aggregate`] - Family and group summaries with a TOTAL row
//! - [`pipeline`] - The whole run, from tables or raw uploads

pub mod aggregate;
pub mod join;
pub mod normalize;
pub mod pipeline;
pub mod simulate;

pub use aggregate::{percent, summarize, summarize_by, total_row};
pub use join::{join_datasets, unique_sku_count, JoinOutput, JoinStats};
pub use normalize::{classification_records, coerce_numeric, cost_records, normalize_sku, sales_records};
pub use pipeline::*;
pub use simulate::{simulate, simulate_record};
