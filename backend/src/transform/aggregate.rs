//! Group-by aggregation of enriched rows into summary rows.
//!
//! Sums skip missing values, so a group whose inputs are all missing sums
//! to zero. Rows without a grouping key are left out of the per-key rows
//! but still counted in `TOTAL`, which is computed from the rows directly
//! rather than from the per-key sums.

use std::collections::BTreeMap;

use crate::models::{EnrichedRecord, GroupBy, Summary, SummaryRow, TOTAL_LABEL};

/// Running sums for one key.
#[derive(Debug, Default, Clone, Copy)]
struct Totals {
    revenue_old: f64,
    revenue_new: f64,
    cost_old: f64,
    cost_new: f64,
    rows: usize,
    missing: usize,
}

impl Totals {
    fn add(&mut self, record: &EnrichedRecord) {
        self.revenue_old += record.product.revenue_1.unwrap_or(0.0);
        self.revenue_new += record.new_revenue.unwrap_or(0.0);
        self.cost_old += record.product.ttl_cost.unwrap_or(0.0);
        self.cost_new += record.new_cost.unwrap_or(0.0);
        self.rows += 1;
        if record.has_missing_values() {
            self.missing += 1;
        }
    }

    fn into_row(self, key: String) -> SummaryRow {
        let old_gm = self.revenue_old - self.cost_old;
        let new_gm = self.revenue_new - self.cost_new;

        SummaryRow {
            key,
            total_revenue_old: self.revenue_old,
            total_revenue_new: self.revenue_new,
            ttl_cost: self.cost_old,
            new_cost: self.cost_new,
            revenue_increase_pct: percent(self.revenue_new - self.revenue_old, self.revenue_old),
            cost_increase_pct: percent(self.cost_new - self.cost_old, self.cost_old),
            old_gm,
            new_gm,
            gm_impact: new_gm - old_gm,
            old_gm_pct: percent(old_gm, self.revenue_old),
            new_gm_pct: percent(new_gm, self.revenue_new),
            row_count: self.rows,
            missing_values: self.missing,
        }
    }
}

/// `numerator / denominator * 100`, or `None` when undefined.
pub fn percent(numerator: f64, denominator: f64) -> Option<f64> {
    if denominator == 0.0 {
        return None;
    }
    let value = numerator / denominator * 100.0;
    value.is_finite().then_some(value)
}

/// One summary row per distinct key, sorted by key.
pub fn summarize_by(records: &[EnrichedRecord], group_by: GroupBy) -> Vec<SummaryRow> {
    let mut groups: BTreeMap<&str, Totals> = BTreeMap::new();

    for record in records {
        if let Some(key) = group_by.key_of(&record.product) {
            groups.entry(key).or_default().add(record);
        }
    }

    groups
        .into_iter()
        .map(|(key, totals)| totals.into_row(key.to_string()))
        .collect()
}

/// The `TOTAL` row over every record, keyed or not.
pub fn total_row(records: &[EnrichedRecord]) -> SummaryRow {
    let mut totals = Totals::default();
    for record in records {
        totals.add(record);
    }
    totals.into_row(TOTAL_LABEL.to_string())
}

/// Per-key rows plus the grand total.
pub fn summarize(records: &[EnrichedRecord], group_by: GroupBy) -> Summary {
    Summary {
        group_by,
        rows: summarize_by(records, group_by),
        total: total_row(records),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ImpactFraction, ProductRecord};
    use crate::transform::simulate::simulate;

    fn product(
        sku: &str,
        family: Option<&str>,
        group: Option<&str>,
        revenue: Option<f64>,
        cost: Option<f64>,
        change: Option<f64>,
    ) -> ProductRecord {
        ProductRecord {
            sku: sku.into(),
            revenue_1: revenue,
            gm_1: None,
            ttl_cost: cost,
            cost_change_pct: change,
            cost_per_unit: None,
            product_family: family.map(String::from),
            product_group: group.map(String::from),
        }
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-6
    }

    fn sample() -> Vec<EnrichedRecord> {
        simulate(
            vec![
                product("A", Some("Tools"), Some("Hand"), Some(1000.0), Some(600.0), Some(10.0)),
                product("B", Some("Tools"), Some("Power"), Some(500.0), Some(400.0), Some(20.0)),
                product("C", Some("Garden"), Some("Hand"), Some(200.0), Some(150.0), Some(0.0)),
            ],
            ImpactFraction::new(1.0),
        )
    }

    #[test]
    fn test_family_summary_metrics() {
        let rows = summarize_by(&sample(), GroupBy::Family);

        assert_eq!(rows.len(), 2);
        // Sorted by key
        assert_eq!(rows[0].key, "Garden");
        assert_eq!(rows[1].key, "Tools");

        let tools = &rows[1];
        assert!(close(tools.total_revenue_old, 1500.0));
        assert!(close(tools.total_revenue_new, 1100.0 + 600.0));
        assert!(close(tools.ttl_cost, 1000.0));
        assert!(close(tools.new_cost, 660.0 + 480.0));
        assert!(close(tools.revenue_increase_pct.unwrap(), 200.0 / 1500.0 * 100.0));
        assert!(close(tools.cost_increase_pct.unwrap(), 14.0));
        assert!(close(tools.old_gm, 500.0));
        assert!(close(tools.new_gm, 1700.0 - 1140.0));
        assert!(close(tools.gm_impact, 60.0));
        assert!(close(tools.old_gm_pct.unwrap(), 500.0 / 1500.0 * 100.0));
        assert!(close(tools.new_gm_pct.unwrap(), 560.0 / 1700.0 * 100.0));
        assert_eq!(tools.row_count, 2);
        assert_eq!(tools.missing_values, 0);
    }

    #[test]
    fn test_group_summary_uses_group_key() {
        let rows = summarize_by(&sample(), GroupBy::Group);
        let keys: Vec<&str> = rows.iter().map(|r| r.key.as_str()).collect();
        assert_eq!(keys, vec!["Hand", "Power"]);
        assert!(close(rows[0].total_revenue_old, 1200.0));
    }

    #[test]
    fn test_total_matches_sum_of_groups() {
        let records = sample();
        let summary = summarize(&records, GroupBy::Family);

        let old: f64 = summary.rows.iter().map(|r| r.total_revenue_old).sum();
        let new: f64 = summary.rows.iter().map(|r| r.total_revenue_new).sum();
        assert!(close(summary.total.total_revenue_old, old));
        assert!(close(summary.total.total_revenue_new, new));
        assert_eq!(summary.total.key, "TOTAL");
        assert!(summary.total.is_total());
        assert_eq!(summary.rows_with_total().count(), 3);
    }

    #[test]
    fn test_zero_revenue_group_reports_na() {
        let records = simulate(
            vec![
                product("A", Some("Empty"), Some("G"), Some(0.0), Some(0.0), Some(10.0)),
                product("B", Some("Empty"), Some("G"), Some(0.0), Some(0.0), Some(5.0)),
            ],
            ImpactFraction::new(1.0),
        );
        let rows = summarize_by(&records, GroupBy::Family);

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].revenue_increase_pct, None);
        assert_eq!(rows[0].cost_increase_pct, None);
        assert_eq!(rows[0].old_gm_pct, None);
        assert_eq!(rows[0].new_gm_pct, None);
        assert_eq!(rows[0].old_gm, 0.0);
    }

    #[test]
    fn test_missing_values_are_skipped_in_sums() {
        let records = simulate(
            vec![
                product("A", Some("Tools"), None, Some(1000.0), Some(600.0), Some(10.0)),
                // No cost match: cost and change are missing
                product("B", Some("Tools"), None, Some(400.0), None, None),
            ],
            ImpactFraction::new(1.0),
        );
        let rows = summarize_by(&records, GroupBy::Family);
        let tools = &rows[0];

        // Revenue_1 of B is counted, its New_Revenue is not: the new total
        // understates the old one.
        assert!(close(tools.total_revenue_old, 1400.0));
        assert!(close(tools.total_revenue_new, 1100.0));
        assert!(close(tools.ttl_cost, 600.0));
        assert_eq!(tools.missing_values, 1);
        assert_eq!(tools.row_count, 2);
    }

    #[test]
    fn test_rows_without_key_only_in_total() {
        let records = simulate(
            vec![
                product("A", Some("Tools"), None, Some(100.0), Some(50.0), Some(0.0)),
                product("B", None, None, Some(300.0), Some(100.0), Some(0.0)),
            ],
            ImpactFraction::new(1.0),
        );
        let summary = summarize(&records, GroupBy::Family);

        assert_eq!(summary.rows.len(), 1);
        assert!(close(summary.rows[0].total_revenue_old, 100.0));
        assert!(close(summary.total.total_revenue_old, 400.0));

        let by_group = summarize(&records, GroupBy::Group);
        assert!(by_group.rows.is_empty());
        assert!(close(by_group.total.total_revenue_old, 400.0));
    }

    #[test]
    fn test_percent_undefined_cases() {
        assert_eq!(percent(1.0, 0.0), None);
        assert_eq!(percent(0.0, 0.0), None);
        assert_eq!(percent(1.0, -0.0), None);
        assert_eq!(percent(5.0, 20.0), Some(25.0));
    }
}
