//! High-level run API: three tables in, two summaries out.
//!
//! # Example
//!
//! ```rust,ignore
//! use costimpact::{compute_from_files, CoverageParams, InputPaths, RunLimits};
//!
//! let paths = InputPaths {
//!     cost: "cost_file.csv".into(),
//!     sales: "sales_ytd.csv".into(),
//!     classification: "product_classification.csv".into(),
//! };
//! let report = compute_from_files(&paths, CoverageParams::new(6, 2), RunLimits::default())?;
//! println!("{} families", report.family_summary.rows.len());
//! ```

use serde::Serialize;
use std::path::PathBuf;
use uuid::Uuid;

use super::aggregate::summarize;
use super::join::{join_datasets, unique_sku_count, JoinStats};
use super::normalize::{classification_records, cost_records, sales_records};
use super::simulate::simulate;
use crate::api::logs::RunLogger;
use crate::config::RunLimits;
use crate::error::{PipelineError, PipelineResult};
use crate::models::{
    CostRecord, CoverageParams, EnrichedRecord, GroupBy, ImpactFraction, InputKind, SalesRecord,
    Summary, Table,
};
use crate::parser::{format_delimiter, parse_bytes_auto, parse_csv_file_auto, ParseResult};

/// How one input file was read.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileInfo {
    pub kind: InputKind,
    pub encoding: String,
    pub delimiter: String,
    pub row_count: usize,
    pub columns: Vec<String>,
}

impl FileInfo {
    fn from_parse(kind: InputKind, parsed: &ParseResult) -> Self {
        Self {
            kind,
            encoding: parsed.encoding.clone(),
            delimiter: format_delimiter(parsed.delimiter),
            row_count: parsed.table.len(),
            columns: parsed.table.headers.clone(),
        }
    }
}

/// Paths of the three input files.
#[derive(Debug, Clone)]
pub struct InputPaths {
    pub cost: PathBuf,
    pub sales: PathBuf,
    pub classification: PathBuf,
}

/// Raw contents of the three uploads.
#[derive(Debug, Clone, Copy)]
pub struct InputBytes<'a> {
    pub cost: &'a [u8],
    pub sales: &'a [u8],
    pub classification: &'a [u8],
}

/// Everything one run produces.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImpactReport {
    pub run_id: String,
    pub coverage: CoverageParams,
    pub impact_fraction: ImpactFraction,
    pub unique_skus: usize,
    pub join_stats: JoinStats,
    /// Empty when the tables were passed in already parsed.
    pub inputs: Vec<FileInfo>,
    pub enriched: Vec<EnrichedRecord>,
    pub family_summary: Summary,
    pub group_summary: Summary,
}

/// Run the whole computation on parsed tables.
///
/// Steps: validate parameters, normalize, join, enforce the SKU limit,
/// derive the impact fraction, simulate, aggregate by family and group.
pub fn compute(
    sales: Table,
    cost: Table,
    classification: Table,
    coverage: CoverageParams,
    limits: RunLimits,
) -> PipelineResult<ImpactReport> {
    let logger = RunLogger::new(Uuid::new_v4().to_string());
    compute_logged(sales, cost, classification, coverage, limits, &logger)
}

/// [`compute`] reporting progress through `logger`.
pub fn compute_logged(
    sales: Table,
    cost: Table,
    classification: Table,
    coverage: CoverageParams,
    limits: RunLimits,
    logger: &RunLogger,
) -> PipelineResult<ImpactReport> {
    coverage.validate()?;

    // Step 1: Normalize
    logger.info("🧼 Normalizing columns, SKUs and numbers...");
    let sales = sales_records(sales)?;
    let cost = cost_records(cost)?;
    let classification = classification_records(classification)?;
    for (rows, kind) in [
        (sales.len(), InputKind::Sales),
        (cost.len(), InputKind::Cost),
        (classification.len(), InputKind::Classification),
    ] {
        if rows == 0 {
            logger.warning(format!("{} has no data rows", kind.label()));
        }
    }
    log_missing_numbers(logger, &sales, &cost);

    // Step 2: Join
    logger.info("🔗 Joining sales with cost and classification...");
    let joined = join_datasets(&sales, &cost, &classification);
    log_join_stats(logger, &joined.stats);

    // Step 3: Tier limit
    let unique_skus = unique_sku_count(&joined.records);
    logger.info(format!("Unique SKUs: {}", unique_skus));
    if !limits.allows(unique_skus) {
        logger.error(format!(
            "SKU limit exceeded: {} > {}",
            unique_skus, limits.sku_limit
        ));
        return Err(PipelineError::SkuLimitExceeded {
            count: unique_skus,
            limit: limits.sku_limit,
        });
    }

    // Step 4: Simulate
    let impact_fraction = ImpactFraction::from_coverage(&coverage);
    logger.info(format!(
        "📈 Impact fraction: {:.4} ({} of {} months at new cost)",
        impact_fraction.value(),
        coverage.total_months - coverage.stock_months,
        coverage.total_months
    ));
    let enriched = simulate(joined.records, impact_fraction);

    // Step 5: Aggregate
    logger.info("📊 Summarizing by product family and group...");
    let family_summary = summarize(&enriched, GroupBy::Family);
    let group_summary = summarize(&enriched, GroupBy::Group);
    logger.success(format!(
        "{} families, {} groups",
        family_summary.rows.len(),
        group_summary.rows.len()
    ));

    let skipped = family_summary.total.missing_values;
    if skipped > 0 {
        logger.warning(format!(
            "{} rows have missing revenue or cost values; totals exclude them",
            skipped
        ));
    }

    Ok(ImpactReport {
        run_id: logger.run_id().to_string(),
        coverage,
        impact_fraction,
        unique_skus,
        join_stats: joined.stats,
        inputs: Vec::new(),
        enriched,
        family_summary,
        group_summary,
    })
}

/// Parse the three uploads, then [`compute_logged`].
pub fn compute_from_bytes(
    inputs: InputBytes<'_>,
    coverage: CoverageParams,
    limits: RunLimits,
    logger: &RunLogger,
) -> PipelineResult<ImpactReport> {
    let cost = read_bytes(InputKind::Cost, inputs.cost, logger)?;
    let sales = read_bytes(InputKind::Sales, inputs.sales, logger)?;
    let classification = read_bytes(InputKind::Classification, inputs.classification, logger)?;

    finish_with_inputs(cost, sales, classification, coverage, limits, logger)
}

/// Read the three files from disk, then [`compute_logged`].
pub fn compute_from_files(
    paths: &InputPaths,
    coverage: CoverageParams,
    limits: RunLimits,
) -> PipelineResult<ImpactReport> {
    let logger = RunLogger::new(Uuid::new_v4().to_string());

    let read = |kind: InputKind, path: &PathBuf| -> PipelineResult<ParseResult> {
        logger.info(format!("📖 Reading {}: {}", kind.label(), path.display()));
        let parsed = parse_csv_file_auto(path).map_err(|e| PipelineError::csv(kind.label(), e))?;
        log_file(&logger, &parsed);
        Ok(parsed)
    };

    let cost = read(InputKind::Cost, &paths.cost)?;
    let sales = read(InputKind::Sales, &paths.sales)?;
    let classification = read(InputKind::Classification, &paths.classification)?;

    finish_with_inputs(cost, sales, classification, coverage, limits, &logger)
}

fn finish_with_inputs(
    cost: ParseResult,
    sales: ParseResult,
    classification: ParseResult,
    coverage: CoverageParams,
    limits: RunLimits,
    logger: &RunLogger,
) -> PipelineResult<ImpactReport> {
    let inputs = vec![
        FileInfo::from_parse(InputKind::Cost, &cost),
        FileInfo::from_parse(InputKind::Sales, &sales),
        FileInfo::from_parse(InputKind::Classification, &classification),
    ];

    let mut report = compute_logged(
        sales.table,
        cost.table,
        classification.table,
        coverage,
        limits,
        logger,
    )?;
    report.inputs = inputs;
    Ok(report)
}

fn read_bytes(kind: InputKind, bytes: &[u8], logger: &RunLogger) -> PipelineResult<ParseResult> {
    logger.info(format!("📖 Reading {} ({} bytes)", kind.label(), bytes.len()));
    let parsed = parse_bytes_auto(bytes).map_err(|e| PipelineError::csv(kind.label(), e))?;
    log_file(logger, &parsed);
    Ok(parsed)
}

fn log_file(logger: &RunLogger, parsed: &ParseResult) {
    logger.info_indent(
        format!(
            "encoding {}, separator '{}', {} rows, {} columns",
            parsed.encoding,
            format_delimiter(parsed.delimiter),
            parsed.table.len(),
            parsed.table.headers.len()
        ),
        1,
    );
}

fn log_missing_numbers(
    logger: &RunLogger,
    sales: &[SalesRecord],
    cost: &[CostRecord],
) {
    let bad_revenue = sales.iter().filter(|r| r.revenue_1.is_none()).count();
    let bad_cost = cost.iter().filter(|r| r.ttl_cost.is_none()).count();
    let bad_change = cost.iter().filter(|r| r.cost_change_pct.is_none()).count();

    for (count, column) in [
        (bad_revenue, "Revenue_1"),
        (bad_cost, "TTL_Cost"),
        (bad_change, "Cost_Change_%"),
    ] {
        if count > 0 {
            logger.warning_indent(format!("{} rows with non-numeric {}", count, column), 1);
        }
    }
}

fn log_join_stats(logger: &RunLogger, stats: &JoinStats) {
    logger.success(format!(
        "{} sales rows → {} joined rows",
        stats.sales_rows, stats.output_rows
    ));
    if stats.unmatched_cost > 0 {
        logger.warning_indent(format!("{} sales rows without cost data", stats.unmatched_cost), 1);
    }
    if stats.unmatched_classification > 0 {
        logger.warning_indent(
            format!(
                "{} sales rows without classification",
                stats.unmatched_classification
            ),
            1,
        );
    }
    for (skus, file) in [
        (&stats.duplicate_cost_skus, InputKind::Cost),
        (&stats.duplicate_classification_skus, InputKind::Classification),
    ] {
        if !skus.is_empty() {
            let sample: Vec<&str> = skus.iter().take(5).map(String::as_str).collect();
            let more = if skus.len() > 5 {
                format!(" ... +{}", skus.len() - 5)
            } else {
                String::new()
            };
            logger.warning(format!(
                "Duplicate SKUs in {} multiply joined rows: {}{}",
                file.label(),
                sample.join(", "),
                more
            ));
        }
    }
}
