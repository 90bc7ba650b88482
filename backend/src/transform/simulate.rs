//! Impact simulation: apply each SKU's cost change to the impacted share
//! of its historical revenue and cost.
//!
//! ```text
//! Impacted_X     = X * f
//! Non_Impacted_X = X * (1 - f)
//! New_X          = Non_Impacted_X + Impacted_X * (1 + Cost_Change_% / 100)
//! ```
//!
//! `X` is `Revenue_1` or `TTL_Cost`, `f` the run's [`ImpactFraction`].
//! A missing operand makes the result missing; nothing defaults to zero.

use crate::models::{EnrichedRecord, ImpactFraction, ProductRecord};

/// Split `value` into (impacted, non-impacted) parts.
fn split(value: Option<f64>, fraction: f64) -> (Option<f64>, Option<f64>) {
    (value.map(|v| v * fraction), value.map(|v| v * (1.0 - fraction)))
}

/// Recombine the parts with the change applied to the impacted part only.
fn apply_change(impacted: Option<f64>, non_impacted: Option<f64>, change_pct: Option<f64>) -> Option<f64> {
    Some(non_impacted? + impacted? * (1.0 + change_pct? / 100.0))
}

/// Derive the impacted/new columns for one joined row.
pub fn simulate_record(product: ProductRecord, fraction: ImpactFraction) -> EnrichedRecord {
    let f = fraction.value();

    let (impacted_revenue, non_impacted_revenue) = split(product.revenue_1, f);
    let (impacted_cost, non_impacted_cost) = split(product.ttl_cost, f);

    let new_revenue = apply_change(impacted_revenue, non_impacted_revenue, product.cost_change_pct);
    let new_cost = apply_change(impacted_cost, non_impacted_cost, product.cost_change_pct);

    EnrichedRecord {
        product,
        impacted_revenue,
        non_impacted_revenue,
        impacted_cost,
        non_impacted_cost,
        new_revenue,
        new_cost,
    }
}

/// Derive the impacted/new columns for every joined row, preserving order.
pub fn simulate(records: Vec<ProductRecord>, fraction: ImpactFraction) -> Vec<EnrichedRecord> {
    records
        .into_iter()
        .map(|product| simulate_record(product, fraction))
        .collect()
}
