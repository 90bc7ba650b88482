//! Chart series derived from a run.
//!
//! Rendering is left to the client; these are the points it plots.

use serde::Serialize;

use crate::models::{EnrichedRecord, Summary};

/// Number of bins in the price-change histogram.
pub const HISTOGRAM_BINS: usize = 20;

/// Old vs new revenue for one family.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RevenueBar {
    pub key: String,
    pub revenue_old: f64,
    pub revenue_new: f64,
    pub revenue_increase_pct: Option<f64>,
}

/// One equal-width histogram bin, `[start, end)` (last bin closed).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistogramBin {
    pub start: f64,
    pub end: f64,
    pub count: usize,
}

/// One SKU row on the revenue curve.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RevenuePoint {
    pub sku: String,
    pub cost_change_pct: f64,
    pub new_revenue: f64,
    pub base_revenue: f64,
    pub product_family: Option<String>,
}

/// All chart series for one run.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartData {
    /// Sorted ascending by old revenue, `TOTAL` excluded.
    pub revenue_comparison: Vec<RevenueBar>,
    pub change_distribution: Vec<HistogramBin>,
    pub revenue_curve: Vec<RevenuePoint>,
}

/// Bars for every key of a summary, smallest old revenue first.
pub fn revenue_comparison(summary: &Summary) -> Vec<RevenueBar> {
    let mut bars: Vec<RevenueBar> = summary
        .rows
        .iter()
        .map(|row| RevenueBar {
            key: row.key.clone(),
            revenue_old: row.total_revenue_old,
            revenue_new: row.total_revenue_new,
            revenue_increase_pct: row.revenue_increase_pct,
        })
        .collect();

    bars.sort_by(|a, b| a.revenue_old.total_cmp(&b.revenue_old));
    bars
}

/// Equal-width histogram between the min and max of `values`.
pub fn histogram(values: &[f64], bins: usize) -> Vec<HistogramBin> {
    let (min, max) = match values.iter().copied().fold(None, |acc: Option<(f64, f64)>, v| {
        Some(match acc {
            Some((lo, hi)) => (lo.min(v), hi.max(v)),
            None => (v, v),
        })
    }) {
        Some(bounds) => bounds,
        None => return Vec::new(),
    };

    if bins == 0 {
        return Vec::new();
    }

    if min == max {
        return vec![HistogramBin {
            start: min,
            end: max,
            count: values.len(),
        }];
    }

    let width = (max - min) / bins as f64;
    let mut out: Vec<HistogramBin> = (0..bins)
        .map(|i| HistogramBin {
            start: min + width * i as f64,
            end: if i + 1 == bins { max } else { min + width * (i + 1) as f64 },
            count: 0,
        })
        .collect();

    for &v in values {
        let idx = (((v - min) / width) as usize).min(bins - 1);
        out[idx].count += 1;
    }

    out
}

/// Distribution of `Cost_Change_%` over rows that have one.
pub fn change_distribution(records: &[EnrichedRecord]) -> Vec<HistogramBin> {
    let values: Vec<f64> = records
        .iter()
        .filter_map(|r| r.product.cost_change_pct)
        .collect();
    histogram(&values, HISTOGRAM_BINS)
}

/// One point per row with a change, a new revenue and a base revenue.
pub fn revenue_curve(records: &[EnrichedRecord]) -> Vec<RevenuePoint> {
    records
        .iter()
        .filter_map(|r| {
            Some(RevenuePoint {
                sku: r.product.sku.clone(),
                cost_change_pct: r.product.cost_change_pct?,
                new_revenue: r.new_revenue?,
                base_revenue: r.product.revenue_1?,
                product_family: r.product.product_family.clone(),
            })
        })
        .collect()
}

/// Build every series: bars from the family summary, the rest from rows.
pub fn build_charts(family_summary: &Summary, records: &[EnrichedRecord]) -> ChartData {
    ChartData {
        revenue_comparison: revenue_comparison(family_summary),
        change_distribution: change_distribution(records),
        revenue_curve: revenue_curve(records),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{GroupBy, ImpactFraction, ProductRecord};
    use crate::transform::{aggregate::summarize, simulate::simulate};

    fn product(sku: &str, family: &str, revenue: Option<f64>, change: Option<f64>) -> ProductRecord {
        ProductRecord {
            sku: sku.into(),
            revenue_1: revenue,
            gm_1: None,
            ttl_cost: Some(1.0),
            cost_change_pct: change,
            cost_per_unit: None,
            product_family: Some(family.into()),
            product_group: None,
        }
    }

    #[test]
    fn test_histogram_counts_every_value() {
        let values: Vec<f64> = (0..=100).map(|v| v as f64).collect();
        let bins = histogram(&values, 20);

        assert_eq!(bins.len(), 20);
        assert_eq!(bins.iter().map(|b| b.count).sum::<usize>(), 101);
        assert_eq!(bins[0].start, 0.0);
        assert_eq!(bins[19].end, 100.0);
        // Max value lands in the last bin
        assert_eq!(bins[19].count, 6);
    }

    #[test]
    fn test_histogram_edge_cases() {
        assert!(histogram(&[], 20).is_empty());

        let single = histogram(&[5.0, 5.0, 5.0], 20);
        assert_eq!(single.len(), 1);
        assert_eq!(single[0].count, 3);
    }

    #[test]
    fn test_revenue_comparison_sorted_without_total() {
        let records = simulate(
            vec![
                product("A", "Big", Some(900.0), Some(5.0)),
                product("B", "Small", Some(100.0), Some(5.0)),
                product("C", "Mid", Some(500.0), Some(5.0)),
            ],
            ImpactFraction::new(1.0),
        );
        let summary = summarize(&records, GroupBy::Family);
        let bars = revenue_comparison(&summary);

        let keys: Vec<&str> = bars.iter().map(|b| b.key.as_str()).collect();
        assert_eq!(keys, vec!["Small", "Mid", "Big"]);
    }

    #[test]
    fn test_revenue_curve_skips_incomplete_rows() {
        let records = simulate(
            vec![
                product("A", "F", Some(100.0), Some(10.0)),
                product("B", "F", None, Some(10.0)),
                product("C", "F", Some(100.0), None),
            ],
            ImpactFraction::new(1.0),
        );

        let curve = revenue_curve(&records);
        assert_eq!(curve.len(), 1);
        assert_eq!(curve[0].sku, "A");
        assert!((curve[0].new_revenue - 110.0).abs() < 1e-9);

        let dist = change_distribution(&records);
        assert_eq!(dist.iter().map(|b| b.count).sum::<usize>(), 2);
    }
}
