//! Summary CSV export.
//!
//! Money columns are rounded to whole units and written with thousands
//! separators (`1,234,568`). Percentages are rounded to two decimals.
//! Both roundings are half-to-even. Undefined percentages are written `N/A`.

use crate::error::CsvError;
use crate::models::{Summary, SummaryRow};

/// Metric headers, in output order, after the grouping column.
pub const METRIC_HEADERS: [&str; 11] = [
    "Total_Revenue_Old",
    "Total_Revenue_New",
    "TTL_Cost",
    "New_Cost",
    "Revenue_Increase_%",
    "Cost_Increase_%",
    "Old_GM",
    "New_GM",
    "GM_Impact",
    "Old_GM%",
    "New_GM%",
];

/// Marker for undefined values.
pub const NOT_AVAILABLE: &str = "N/A";

/// Round to `decimals` places, ties to even.
pub fn round_half_even(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    let rounded = (value * factor).round_ties_even() / factor;
    // No "-0" in reports
    if rounded == 0.0 {
        0.0
    } else {
        rounded
    }
}

/// Whole-unit amount with comma thousands separators.
pub fn format_thousands(value: f64) -> String {
    if !value.is_finite() {
        return NOT_AVAILABLE.to_string();
    }

    let digits = format!("{:.0}", round_half_even(value, 0));
    let (sign, digits) = match digits.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", digits.as_str()),
    };

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    format!("{}{}", sign, grouped)
}

/// Percentage rounded to two decimals, always with a decimal point.
pub fn format_percent(value: Option<f64>) -> String {
    match value {
        Some(v) if v.is_finite() => {
            let text = round_half_even(v, 2).to_string();
            if text.contains('.') {
                text
            } else {
                format!("{}.0", text)
            }
        }
        _ => NOT_AVAILABLE.to_string(),
    }
}

/// Display cells of one summary row, grouping key first.
pub fn format_row(row: &SummaryRow) -> Vec<String> {
    vec![
        row.key.clone(),
        format_thousands(row.total_revenue_old),
        format_thousands(row.total_revenue_new),
        format_thousands(row.ttl_cost),
        format_thousands(row.new_cost),
        format_percent(row.revenue_increase_pct),
        format_percent(row.cost_increase_pct),
        format_thousands(row.old_gm),
        format_thousands(row.new_gm),
        format_thousands(row.gm_impact),
        format_percent(row.old_gm_pct),
        format_percent(row.new_gm_pct),
    ]
}

/// Render a summary, `TOTAL` last, as CSV text.
pub fn summary_to_csv(summary: &Summary) -> Result<String, CsvError> {
    let mut writer = csv::Writer::from_writer(Vec::new());

    let mut header = vec![summary.group_by.column()];
    header.extend(METRIC_HEADERS);
    writer
        .write_record(&header)
        .map_err(|e| CsvError::new(1, format!("Cannot write header: {}", e)))?;

    for (i, row) in summary.rows_with_total().enumerate() {
        writer
            .write_record(format_row(row))
            .map_err(|e| CsvError::new(i + 2, format!("Cannot write row '{}': {}", row.key, e)))?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| CsvError::new(0, format!("Cannot flush CSV: {}", e)))?;

    String::from_utf8(bytes).map_err(|e| CsvError::new(0, format!("Encoding error: {}", e)))
}
