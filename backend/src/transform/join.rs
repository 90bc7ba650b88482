//! Left joins of sales rows with cost and classification rows on SKU.
//!
//! # Architecture
//!
//! ```text
//! sales (left) ──┬── cost (by SKU) ──┬── classification (by SKU) ──▶ ProductRecord
//!                │   0..n matches    │   0..n matches
//! ```
//!
//! A sales row with no match is kept with `None` fields. A SKU that appears
//! more than once on the right side yields one output row per match, in
//! right-side file order. Output order follows the sales file.

use serde::Serialize;
use std::collections::{HashMap, HashSet};

use crate::models::{ClassificationRecord, CostRecord, ProductRecord, SalesRecord};

/// Counters describing one join pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinStats {
    pub sales_rows: usize,
    pub output_rows: usize,
    pub unmatched_cost: usize,
    pub unmatched_classification: usize,
    /// SKUs present more than once in the cost file.
    pub duplicate_cost_skus: Vec<String>,
    /// SKUs present more than once in the classification file.
    pub duplicate_classification_skus: Vec<String>,
}

impl JoinStats {
    pub fn has_duplicates(&self) -> bool {
        !self.duplicate_cost_skus.is_empty() || !self.duplicate_classification_skus.is_empty()
    }
}

/// Joined rows plus diagnostics.
#[derive(Debug, Clone)]
pub struct JoinOutput {
    pub records: Vec<ProductRecord>,
    pub stats: JoinStats,
}

/// Index of row positions by SKU.
fn index_by_sku<'a, T>(rows: &'a [T], sku: impl Fn(&'a T) -> &'a str) -> HashMap<&'a str, Vec<usize>> {
    let mut index: HashMap<&str, Vec<usize>> = HashMap::new();
    for (i, row) in rows.iter().enumerate() {
        index.entry(sku(row)).or_default().push(i);
    }
    index
}

/// Keys indexed more than once, sorted.
fn duplicate_keys(index: &HashMap<&str, Vec<usize>>) -> Vec<String> {
    let mut dups: Vec<String> = index
        .iter()
        .filter(|(_, rows)| rows.len() > 1)
        .map(|(sku, _)| sku.to_string())
        .collect();
    dups.sort();
    dups
}

/// `sales ⟕ cost ⟕ classification` on the normalized SKU.
pub fn join_datasets(
    sales: &[SalesRecord],
    cost: &[CostRecord],
    classification: &[ClassificationRecord],
) -> JoinOutput {
    let cost_index = index_by_sku(cost, |r| r.sku.as_str());
    let class_index = index_by_sku(classification, |r| r.sku.as_str());

    let mut stats = JoinStats {
        sales_rows: sales.len(),
        duplicate_cost_skus: duplicate_keys(&cost_index),
        duplicate_classification_skus: duplicate_keys(&class_index),
        ..JoinStats::default()
    };

    let mut records = Vec::with_capacity(sales.len());

    for sale in sales {
        let cost_matches: Vec<Option<&CostRecord>> = match cost_index.get(sale.sku.as_str()) {
            Some(rows) => rows.iter().map(|&i| Some(&cost[i])).collect(),
            None => {
                stats.unmatched_cost += 1;
                vec![None]
            }
        };

        let class_matches: Vec<Option<&ClassificationRecord>> =
            match class_index.get(sale.sku.as_str()) {
                Some(rows) => rows.iter().map(|&i| Some(&classification[i])).collect(),
                None => {
                    stats.unmatched_classification += 1;
                    vec![None]
                }
            };

        for &c in &cost_matches {
            for &k in &class_matches {
                records.push(ProductRecord {
                    sku: sale.sku.clone(),
                    revenue_1: sale.revenue_1,
                    gm_1: sale.gm_1,
                    ttl_cost: c.and_then(|c| c.ttl_cost),
                    cost_change_pct: c.and_then(|c| c.cost_change_pct),
                    cost_per_unit: c.and_then(|c| c.cost_per_unit),
                    product_family: k.and_then(|k| k.product_family.clone()),
                    product_group: k.and_then(|k| k.product_group.clone()),
                });
            }
        }
    }

    stats.output_rows = records.len();

    JoinOutput { records, stats }
}

/// Number of distinct SKUs in joined rows.
pub fn unique_sku_count(records: &[ProductRecord]) -> usize {
    records
        .iter()
        .map(|r| r.sku.as_str())
        .collect::<HashSet<_>>()
        .len()
}
