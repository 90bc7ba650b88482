//! End-to-end runs of the public `compute` entry points on small CSV inputs.

use std::io::Write;

use costimpact::report::format_percent;
use costimpact::{
    compute, compute_from_files, parse_csv, summary_to_csv, CoverageParams, InputPaths,
    PipelineError, RunLimits, Table,
};

const COST: &str = "\
SKU,TTL_Cost,Cost_Change_%,Cost_per_Unit
a1,600,10,6
b2,300,-5,3
c3,100,0,1
d4,50,20,5
";

const SALES: &str = "\
SKU,Revenue_1,GM_1
A1 ,1000,400
b2,500,200
C3,0,0
d4,200,150
e5,80,10
";

const CLASSIFICATION: &str = "\
SKU,Product_Family,Product_Group
A1,Tools,Hand
B2,Tools,Power
C3,Garden,Seeds
D4,Garden,Hoses
";

fn table(content: &str) -> Table {
    parse_csv(content, ',').unwrap()
}

fn run(total_months: i64, stock_months: i64) -> costimpact::ImpactReport {
    compute(
        table(SALES),
        table(COST),
        table(CLASSIFICATION),
        CoverageParams::new(total_months, stock_months),
        RunLimits::default(),
    )
    .unwrap()
}

fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-6
}

#[test]
fn full_impact_applies_whole_change() {
    let report = run(6, 0);
    let a1 = report
        .enriched
        .iter()
        .find(|r| r.product.sku == "A1")
        .unwrap();

    assert!(approx(a1.new_revenue.unwrap(), 1100.0));
    assert!(approx(a1.new_cost.unwrap(), 660.0));
    assert_eq!(a1.non_impacted_revenue, Some(0.0));
}

#[test]
fn stock_covering_window_leaves_values_unchanged() {
    let report = run(6, 6);

    for row in &report.enriched {
        if row.product.cost_change_pct.is_some() {
            assert_eq!(row.new_revenue, row.product.revenue_1);
            assert_eq!(row.new_cost, row.product.ttl_cost);
        }
    }
    for row in &report.family_summary.rows {
        assert!(approx(row.total_revenue_new, row.total_revenue_old));
        assert!(approx(row.new_cost, row.ttl_cost));
    }
}

#[test]
fn sales_order_and_row_count_preserved() {
    let report = run(6, 0);
    let skus: Vec<&str> = report.enriched.iter().map(|r| r.product.sku.as_str()).collect();
    assert_eq!(skus, vec!["A1", "B2", "C3", "D4", "E5"]);
    assert_eq!(report.unique_skus, 5);
    assert_eq!(report.join_stats.unmatched_cost, 1);
    assert_eq!(report.join_stats.unmatched_classification, 1);
}

#[test]
fn total_equals_sum_of_groups_plus_unclassified() {
    let report = run(12, 3);

    for summary in [&report.family_summary, &report.group_summary] {
        let grouped: f64 = summary.rows.iter().map(|r| r.total_revenue_old).sum();
        // E5 has no classification and only shows up in TOTAL
        assert!(approx(summary.total.total_revenue_old, grouped + 80.0));
        assert_eq!(summary.total.row_count, 5);
        assert_eq!(summary.total.missing_values, 1);
    }
}

#[test]
fn zero_revenue_group_is_not_available() {
    let zero_sales = "SKU,Revenue_1,GM_1\nC3,0,0\n";
    let report = compute(
        table(zero_sales),
        table(COST),
        table(CLASSIFICATION),
        CoverageParams::default(),
        RunLimits::default(),
    )
    .unwrap();

    let seeds = &report.group_summary.rows[0];
    assert_eq!(seeds.key, "Seeds");
    assert_eq!(seeds.revenue_increase_pct, None);
    assert_eq!(format_percent(seeds.old_gm_pct), "N/A");

    let csv = summary_to_csv(&report.group_summary).unwrap();
    assert!(csv.contains("N/A"));
    assert!(csv.lines().last().unwrap().starts_with("TOTAL"));
}

#[test]
fn sku_limit_stops_run() {
    let err = compute(
        table(SALES),
        table(COST),
        table(CLASSIFICATION),
        CoverageParams::default(),
        RunLimits {
            sku_limit: 4,
            is_pro: false,
        },
    )
    .unwrap_err();

    match err {
        PipelineError::SkuLimitExceeded { count, limit } => {
            assert_eq!(count, 5);
            assert_eq!(limit, 4);
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn missing_cost_rows_are_skipped_in_sums() {
    let report = run(6, 0);
    let total = &report.family_summary.total;

    // E5 has revenue but no cost match: counted in the old revenue only
    assert!(approx(total.total_revenue_old, 1780.0));
    assert!(approx(total.ttl_cost, 1050.0));
    assert!(approx(total.total_revenue_new, 1100.0 + 475.0 + 0.0 + 240.0));
}

#[test]
fn duplicate_cost_skus_multiply_rows() {
    let cost = "SKU,TTL_Cost,Cost_Change_%\nA1,600,10\na1,600,20\n";
    let report = compute(
        table("SKU,Revenue_1,GM_1\nA1,1000,400\n"),
        table(cost),
        table(CLASSIFICATION),
        CoverageParams::default(),
        RunLimits::default(),
    )
    .unwrap();

    assert_eq!(report.enriched.len(), 2);
    assert_eq!(report.unique_skus, 1);
    assert_eq!(report.join_stats.duplicate_cost_skus, vec!["A1".to_string()]);
}

#[test]
fn files_on_disk_with_other_separators() {
    let dir = tempfile::tempdir().unwrap();
    let write = |name: &str, content: &str| {
        let path = dir.path().join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
        path
    };

    let paths = InputPaths {
        cost: write("cost.csv", &COST.replace(',', ";")),
        sales: write("sales.csv", &SALES.replace(',', "\t")),
        classification: write("classification.csv", CLASSIFICATION),
    };

    let report = compute_from_files(&paths, CoverageParams::new(6, 0), RunLimits::default()).unwrap();

    assert_eq!(report.inputs.len(), 3);
    assert_eq!(report.inputs[0].delimiter, ";");
    assert_eq!(report.inputs[1].delimiter, "\\t");
    assert_eq!(report.family_summary.rows.len(), 2);
}
