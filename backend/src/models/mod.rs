//! Domain models for the cost impact pipeline.
//!
//! This module contains the data structures shared by every stage:
//!
//! - [`Table`] - Raw parsed CSV (headers + string cells)
//! - [`CostRecord`], [`SalesRecord`], [`ClassificationRecord`] - Typed input rows
//! - [`ProductRecord`] - One joined row per sale record
//! - [`ImpactFraction`] - Share of sales affected by the change
//! - [`EnrichedRecord`] - Product record plus impacted/new revenue and cost
//! - [`SummaryRow`], [`Summary`] - Aggregated output per family or group

use serde::{Deserialize, Serialize};

use crate::error::ParameterError;

// =============================================================================
// Column names
// =============================================================================

/// Header names of the input templates.
pub mod columns {
    pub const SKU: &str = "SKU";
    pub const TTL_COST: &str = "TTL_Cost";
    pub const COST_CHANGE_PCT: &str = "Cost_Change_%";
    pub const COST_PER_UNIT: &str = "Cost_per_Unit";
    pub const REVENUE_1: &str = "Revenue_1";
    pub const GM_1: &str = "GM_1";
    pub const PRODUCT_FAMILY: &str = "Product_Family";
    pub const PRODUCT_GROUP: &str = "Product_Group";
}

/// Label of the synthetic grand-total row.
pub const TOTAL_LABEL: &str = "TOTAL";

// =============================================================================
// Raw table
// =============================================================================

/// A parsed CSV file: header row plus string cells.
///
/// `Table::new` pads short rows and truncates long ones to `headers.len()`
/// cells. The fields are public, so readers still treat a missing cell as
/// empty rather than indexing blindly.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(headers: Vec<String>, mut rows: Vec<Vec<String>>) -> Self {
        for row in &mut rows {
            row.resize(headers.len(), String::new());
        }
        Self { headers, rows }
    }

    /// Cell `idx` of `row`, or `""` when the row is too short.
    pub fn cell(row: &[String], idx: usize) -> &str {
        row.get(idx).map_or("", String::as_str)
    }

    /// Position of a column by exact header name.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

// =============================================================================
// Input files
// =============================================================================

/// The three uploads a run needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputKind {
    Cost,
    Sales,
    Classification,
}

impl InputKind {
    pub const ALL: [InputKind; 3] = [InputKind::Cost, InputKind::Sales, InputKind::Classification];

    /// Human-readable name used in messages.
    pub fn label(self) -> &'static str {
        match self {
            InputKind::Cost => "cost file",
            InputKind::Sales => "sales file",
            InputKind::Classification => "classification file",
        }
    }

    /// Multipart field name.
    pub fn field(self) -> &'static str {
        match self {
            InputKind::Cost => "cost",
            InputKind::Sales => "sales",
            InputKind::Classification => "classification",
        }
    }

    pub fn from_field(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.field() == name)
    }
}

// =============================================================================
// Typed input rows
// =============================================================================

/// One row of the cost file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostRecord {
    pub sku: String,
    pub ttl_cost: Option<f64>,
    pub cost_change_pct: Option<f64>,
    pub cost_per_unit: Option<f64>,
}

/// One row of the year-to-date sales file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalesRecord {
    pub sku: String,
    pub revenue_1: Option<f64>,
    pub gm_1: Option<f64>,
}

/// One row of the product classification file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationRecord {
    pub sku: String,
    pub product_family: Option<String>,
    pub product_group: Option<String>,
}

/// A sales row left-joined with its cost and classification data.
///
/// The SKU always comes from the sales file; every other field may be
/// `None` when the join found no match or the value was unparseable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductRecord {
    #[serde(rename = "SKU")]
    pub sku: String,
    #[serde(rename = "Revenue_1")]
    pub revenue_1: Option<f64>,
    #[serde(rename = "GM_1")]
    pub gm_1: Option<f64>,
    #[serde(rename = "TTL_Cost")]
    pub ttl_cost: Option<f64>,
    #[serde(rename = "Cost_Change_%")]
    pub cost_change_pct: Option<f64>,
    #[serde(rename = "Cost_per_Unit")]
    pub cost_per_unit: Option<f64>,
    #[serde(rename = "Product_Family")]
    pub product_family: Option<String>,
    #[serde(rename = "Product_Group")]
    pub product_group: Option<String>,
}

// =============================================================================
// Coverage and impact fraction
// =============================================================================

/// Sales window and stock coverage, in months.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CoverageParams {
    /// Months of sales history in the sales file (1..=36).
    pub total_months: i64,
    /// Months of demand already covered by stock bought at the old cost (0..=12).
    pub stock_months: i64,
}

impl CoverageParams {
    pub const TOTAL_MONTHS_RANGE: std::ops::RangeInclusive<i64> = 1..=36;
    pub const STOCK_MONTHS_RANGE: std::ops::RangeInclusive<i64> = 0..=12;

    pub fn new(total_months: i64, stock_months: i64) -> Self {
        Self {
            total_months,
            stock_months,
        }
    }

    /// Reject values outside the input ranges.
    pub fn validate(&self) -> Result<(), ParameterError> {
        if !Self::TOTAL_MONTHS_RANGE.contains(&self.total_months) {
            return Err(ParameterError::TotalMonths(self.total_months));
        }
        if !Self::STOCK_MONTHS_RANGE.contains(&self.stock_months) {
            return Err(ParameterError::StockMonths(self.stock_months));
        }
        Ok(())
    }
}

impl Default for CoverageParams {
    fn default() -> Self {
        Self {
            total_months: 6,
            stock_months: 0,
        }
    }
}

/// Share of the sales window that is sold at the new cost.
///
/// Floored at 0 but deliberately not capped at 1: a negative
/// `stock_months` yields a fraction above 1.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImpactFraction(f64);

impl ImpactFraction {
    /// `max((total_months - stock_months) / total_months, 0)`.
    ///
    /// `total_months` must be non-zero; [`CoverageParams::validate`] guarantees it.
    pub fn from_coverage(params: &CoverageParams) -> Self {
        let total = params.total_months as f64;
        let fraction = (total - params.stock_months as f64) / total;
        Self(fraction.max(0.0))
    }

    /// Wrap a raw value, applying the same floor at 0.
    pub fn new(value: f64) -> Self {
        Self(value.max(0.0))
    }

    pub fn value(self) -> f64 {
        self.0
    }
}

// =============================================================================
// Enriched rows
// =============================================================================

/// A product record with its impacted and simulated values.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnrichedRecord {
    #[serde(flatten)]
    pub product: ProductRecord,
    #[serde(rename = "Impacted_Revenue")]
    pub impacted_revenue: Option<f64>,
    #[serde(rename = "Non_Impacted_Revenue")]
    pub non_impacted_revenue: Option<f64>,
    #[serde(rename = "Impacted_Cost")]
    pub impacted_cost: Option<f64>,
    #[serde(rename = "Non_Impacted_Cost")]
    pub non_impacted_cost: Option<f64>,
    #[serde(rename = "New_Revenue")]
    pub new_revenue: Option<f64>,
    #[serde(rename = "New_Cost")]
    pub new_cost: Option<f64>,
}

impl EnrichedRecord {
    /// True when any input or output used by the aggregates is missing.
    pub fn has_missing_values(&self) -> bool {
        self.product.revenue_1.is_none()
            || self.product.ttl_cost.is_none()
            || self.new_revenue.is_none()
            || self.new_cost.is_none()
    }
}

// =============================================================================
// Aggregation output
// =============================================================================

/// Classification level used to group rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupBy {
    Family,
    Group,
}

impl GroupBy {
    /// Header of the grouping column in summaries.
    pub fn column(self) -> &'static str {
        match self {
            GroupBy::Family => columns::PRODUCT_FAMILY,
            GroupBy::Group => columns::PRODUCT_GROUP,
        }
    }

    /// Download name of the summary file.
    pub fn file_name(self) -> &'static str {
        match self {
            GroupBy::Family => "PM_Summary.csv",
            GroupBy::Group => "PG_Summary.csv",
        }
    }

    /// Grouping key of a record.
    pub fn key_of(self, record: &ProductRecord) -> Option<&str> {
        match self {
            GroupBy::Family => record.product_family.as_deref(),
            GroupBy::Group => record.product_group.as_deref(),
        }
    }
}

impl std::str::FromStr for GroupBy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "family" | "product_family" => Ok(GroupBy::Family),
            "group" | "product_group" => Ok(GroupBy::Group),
            other => Err(format!("Unknown grouping level: {}", other)),
        }
    }
}

/// Aggregated metrics for one grouping key (or the grand total).
///
/// Percentages are `None` when their denominator sums to zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryRow {
    pub key: String,
    pub total_revenue_old: f64,
    pub total_revenue_new: f64,
    pub ttl_cost: f64,
    pub new_cost: f64,
    pub revenue_increase_pct: Option<f64>,
    pub cost_increase_pct: Option<f64>,
    pub old_gm: f64,
    pub new_gm: f64,
    pub gm_impact: f64,
    pub old_gm_pct: Option<f64>,
    pub new_gm_pct: Option<f64>,
    /// Rows aggregated into this line.
    pub row_count: usize,
    /// Rows whose revenue or cost values were missing and skipped by the sums.
    pub missing_values: usize,
}

impl SummaryRow {
    pub fn is_total(&self) -> bool {
        self.key == TOTAL_LABEL
    }
}

/// Per-key summary rows followed by the grand total.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub group_by: GroupBy,
    /// Sorted by key.
    pub rows: Vec<SummaryRow>,
    pub total: SummaryRow,
}

impl Summary {
    /// Group rows followed by the `TOTAL` row.
    pub fn rows_with_total(&self) -> impl Iterator<Item = &SummaryRow> {
        self.rows.iter().chain(std::iter::once(&self.total))
    }
}
