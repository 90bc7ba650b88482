//! REST API types for frontend integration.
//!
//! Numbers are sent raw; the client formats them for display. The CSV
//! exports carry the formatted values.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::models::{CoverageParams, Summary};
use crate::report::{build_charts, ChartData};
use crate::transform::join::JoinStats;
use crate::transform::pipeline::{FileInfo, ImpactReport};

/// Response sent to the frontend after an analysis run.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeResponse {
    /// Run identifier, also attached to the run's log entries
    pub job_id: String,

    /// Status: "ready" or "warning"
    pub status: String,

    pub generated_at: DateTime<Utc>,

    /// Summary by Product_Family, TOTAL last
    pub family_summary: Summary,

    /// Summary by Product_Group, TOTAL last
    pub group_summary: Summary,

    pub charts: ChartData,

    pub metadata: ResponseMetadata,
}

/// Metadata about the run
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseMetadata {
    pub coverage: CoverageParams,
    pub impact_fraction: f64,
    pub unique_skus: usize,
    pub join: JoinStats,
    pub inputs: Vec<FileInfo>,
    /// Enriched rows with a missing revenue or cost value
    pub rows_with_missing_values: usize,
}

/// Status of an analysis run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Ready,
    Warning,
}

impl RunStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            RunStatus::Ready => "ready",
            RunStatus::Warning => "warning",
        }
    }

    /// Warning when the join multiplied rows or some rows lack numbers.
    pub fn of(report: &ImpactReport) -> Self {
        let missing = report.enriched.iter().any(|r| r.has_missing_values());
        if missing || report.join_stats.has_duplicates() {
            RunStatus::Warning
        } else {
            RunStatus::Ready
        }
    }
}

impl From<ImpactReport> for AnalyzeResponse {
    fn from(report: ImpactReport) -> Self {
        let status = RunStatus::of(&report).as_str().to_string();
        let charts = build_charts(&report.family_summary, &report.enriched);
        let rows_with_missing_values = report
            .enriched
            .iter()
            .filter(|r| r.has_missing_values())
            .count();

        AnalyzeResponse {
            job_id: report.run_id,
            status,
            generated_at: Utc::now(),
            family_summary: report.family_summary,
            group_summary: report.group_summary,
            charts,
            metadata: ResponseMetadata {
                coverage: report.coverage,
                impact_fraction: report.impact_fraction.value(),
                unique_skus: report.unique_skus,
                join: report.join_stats,
                inputs: report.inputs,
                rows_with_missing_values,
            },
        }
    }
}

/// Create an error response
pub fn error_response(error: &str) -> Value {
    json!({
        "jobId": Uuid::new_v4().to_string(),
        "status": "error",
        "error": error,
        "generatedAt": Utc::now(),
        "familySummary": { "groupBy": "family", "rows": [], "total": null },
        "groupSummary": { "groupBy": "group", "rows": [], "total": null },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RunLimits;
    use crate::parser::parse_csv;
    use crate::transform::pipeline::compute;

    fn report(cost: &str) -> ImpactReport {
        compute(
            parse_csv("SKU,Revenue_1,GM_1\nA,1000,400\nB,500,200\n", ',').unwrap(),
            parse_csv(cost, ',').unwrap(),
            parse_csv("SKU,Product_Family,Product_Group\nA,Tools,Hand\nB,Tools,Power\n", ',').unwrap(),
            CoverageParams::new(6, 0),
            RunLimits::default(),
        )
        .unwrap()
    }

    #[test]
    fn test_response_from_clean_run() {
        let response =
            AnalyzeResponse::from(report("SKU,TTL_Cost,Cost_Change_%\nA,600,10\nB,300,0\n"));

        assert_eq!(response.status, "ready");
        assert_eq!(response.metadata.unique_skus, 2);
        assert_eq!(response.metadata.impact_fraction, 1.0);
        assert_eq!(response.family_summary.rows.len(), 1);
        assert_eq!(response.group_summary.rows.len(), 2);
        assert_eq!(response.charts.revenue_comparison.len(), 1);

        let json = serde_json::to_value(&response).unwrap();
        assert!(json["jobId"].is_string());
        assert!(json["generatedAt"].is_string());
        assert_eq!(json["metadata"]["uniqueSkus"], 2);
    }

    #[test]
    fn test_missing_values_make_warning() {
        let response = AnalyzeResponse::from(report("SKU,TTL_Cost,Cost_Change_%\nA,600,10\n"));

        assert_eq!(response.status, "warning");
        assert_eq!(response.metadata.rows_with_missing_values, 1);
        assert_eq!(response.metadata.join.unmatched_cost, 1);
    }

    #[test]
    fn test_error_response_shape() {
        let body = error_response("bad upload");
        assert_eq!(body["status"], "error");
        assert_eq!(body["error"], "bad upload");
        assert_eq!(body["familySummary"]["rows"].as_array().unwrap().len(), 0);
        assert_eq!(body["groupSummary"]["groupBy"], "group");
    }
}
