//! Row normalization: header cleanup, SKU normalization, numeric coercion.
//!
//! Nothing here drops rows or fails on bad cell values. Unparseable numbers
//! become `None`, short rows read as empty cells, and a header-only file
//! yields no records. Only a missing required column is an error.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{TableError, TableResult};
use crate::models::{columns, ClassificationRecord, CostRecord, InputKind, SalesRecord, Table};

/// Plain decimal literal: optional sign, digits with optional fraction, optional exponent.
static NUMERIC_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[+-]?(\d+\.?\d*|\.\d+)([eE][+-]?\d+)?$").expect("valid numeric regex")
});

impl Table {
    /// Strip surrounding whitespace from every header.
    pub fn clean_column_names(mut self) -> Self {
        for header in &mut self.headers {
            *header = header.trim().to_string();
        }
        self
    }

    /// Normalize every cell of the SKU column in place.
    pub fn clean_sku_column(mut self, file: &str) -> TableResult<Self> {
        let idx = self.require(file, columns::SKU)?;
        for row in &mut self.rows {
            if let Some(cell) = row.get_mut(idx) {
                *cell = normalize_sku(cell);
            }
        }
        Ok(self)
    }

    /// Index of a column, or a `MissingColumn` error naming the file.
    pub fn require(&self, file: &str, column: &str) -> TableResult<usize> {
        self.column_index(column).ok_or_else(|| TableError::MissingColumn {
            file: file.to_string(),
            column: column.to_string(),
        })
    }

    /// Numeric view of a column; unparseable cells are `None`.
    pub fn numeric_column(&self, file: &str, column: &str) -> TableResult<Vec<Option<f64>>> {
        let idx = self.require(file, column)?;
        Ok(self
            .rows
            .iter()
            .map(|row| coerce_numeric(Table::cell(row, idx)))
            .collect())
    }
}

/// Cast to string, trim, uppercase.
///
/// Idempotent: `normalize_sku(normalize_sku(s)) == normalize_sku(s)`.
pub fn normalize_sku(raw: &str) -> String {
    raw.trim().to_uppercase()
}

/// Parse a cell as a finite number, or `None` when it is not one.
pub fn coerce_numeric(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if !NUMERIC_RE.is_match(trimmed) {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Empty or whitespace-only text is missing.
fn coerce_text(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Clean headers and SKUs.
fn prepare(table: Table, file: &str) -> TableResult<Table> {
    table.clean_column_names().clean_sku_column(file)
}

/// Typed rows of the cost file. `Cost_per_Unit` is optional.
pub fn cost_records(table: Table) -> TableResult<Vec<CostRecord>> {
    let file = InputKind::Cost.label();
    let table = prepare(table, file)?;

    let sku = table.require(file, columns::SKU)?;
    let ttl_cost = table.numeric_column(file, columns::TTL_COST)?;
    let change = table.numeric_column(file, columns::COST_CHANGE_PCT)?;
    let per_unit = table
        .numeric_column(file, columns::COST_PER_UNIT)
        .unwrap_or_else(|_| vec![None; table.len()]);

    Ok(table
        .rows
        .iter()
        .enumerate()
        .map(|(i, row)| CostRecord {
            sku: Table::cell(row, sku).to_string(),
            ttl_cost: ttl_cost[i],
            cost_change_pct: change[i],
            cost_per_unit: per_unit[i],
        })
        .collect())
}

/// Typed rows of the sales file.
pub fn sales_records(table: Table) -> TableResult<Vec<SalesRecord>> {
    let file = InputKind::Sales.label();
    let table = prepare(table, file)?;

    let sku = table.require(file, columns::SKU)?;
    let revenue = table.numeric_column(file, columns::REVENUE_1)?;
    let gm = table.numeric_column(file, columns::GM_1)?;

    Ok(table
        .rows
        .iter()
        .enumerate()
        .map(|(i, row)| SalesRecord {
            sku: Table::cell(row, sku).to_string(),
            revenue_1: revenue[i],
            gm_1: gm[i],
        })
        .collect())
}

/// Typed rows of the classification file.
pub fn classification_records(table: Table) -> TableResult<Vec<ClassificationRecord>> {
    let file = InputKind::Classification.label();
    let table = prepare(table, file)?;

    let sku = table.require(file, columns::SKU)?;
    let family = table.require(file, columns::PRODUCT_FAMILY)?;
    let group = table.require(file, columns::PRODUCT_GROUP)?;

    Ok(table
        .rows
        .iter()
        .map(|row| ClassificationRecord {
            sku: Table::cell(row, sku).to_string(),
            product_family: coerce_text(Table::cell(row, family)),
            product_group: coerce_text(Table::cell(row, group)),
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(headers: &[&str], rows: &[&[&str]]) -> Table {
        Table::new(
            headers.iter().map(|h| h.to_string()).collect(),
            rows.iter()
                .map(|r| r.iter().map(|c| c.to_string()).collect())
                .collect(),
        )
    }

    #[test]
    fn test_normalize_sku() {
        assert_eq!(normalize_sku("  abc1 "), "ABC1");
        assert_eq!(normalize_sku("x-9\t"), "X-9");
    }

    #[test]
    fn test_normalize_sku_idempotent() {
        for raw in ["abc1", " Ab-c ", "ÉTÉ-1", "", "123"] {
            let once = normalize_sku(raw);
            assert_eq!(normalize_sku(&once), once);
        }
    }

    #[test]
    fn test_coerce_numeric_accepts_decimals() {
        assert_eq!(coerce_numeric("1000"), Some(1000.0));
        assert_eq!(coerce_numeric(" -12.5 "), Some(-12.5));
        assert_eq!(coerce_numeric("+3"), Some(3.0));
        assert_eq!(coerce_numeric(".5"), Some(0.5));
        assert_eq!(coerce_numeric("7."), Some(7.0));
        assert_eq!(coerce_numeric("1e3"), Some(1000.0));
    }

    #[test]
    fn test_coerce_numeric_rejects_garbage() {
        for raw in ["", "abc", "1,000", "12%", "NaN", "inf", "--1", "1e999"] {
            assert_eq!(coerce_numeric(raw), None, "{:?} should be missing", raw);
        }
    }

    #[test]
    fn test_clean_column_names() {
        let t = table(&[" SKU ", "TTL_Cost  "], &[]).clean_column_names();
        assert_eq!(t.headers, vec!["SKU", "TTL_Cost"]);
    }

    #[test]
    fn test_cost_records_keep_bad_values_as_missing() {
        let t = table(
            &[" SKU", "TTL_Cost", "Cost_Change_%", "Cost_per_Unit"],
            &[&[" abc1 ", "600", "10", "6"], &["b2", "n/a", "x", ""]],
        );
        let records = cost_records(t).unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].sku, "ABC1");
        assert_eq!(records[0].ttl_cost, Some(600.0));
        assert_eq!(records[0].cost_change_pct, Some(10.0));
        assert_eq!(records[0].cost_per_unit, Some(6.0));
        assert_eq!(records[1].sku, "B2");
        assert_eq!(records[1].ttl_cost, None);
        assert_eq!(records[1].cost_change_pct, None);
    }

    #[test]
    fn test_cost_per_unit_is_optional() {
        let t = table(&["SKU", "TTL_Cost", "Cost_Change_%"], &[&["a", "1", "2"]]);
        let records = cost_records(t).unwrap();
        assert_eq!(records[0].cost_per_unit, None);
    }

    #[test]
    fn test_missing_required_column() {
        let t = table(&["SKU", "GM_1"], &[&["a", "1"]]);
        let err = sales_records(t).unwrap_err();
        match err {
            TableError::MissingColumn { file, column } => {
                assert_eq!(file, "sales file");
                assert_eq!(column, "Revenue_1");
            }
        }
    }

    #[test]
    fn test_header_only_table_yields_no_records() {
        let t = table(&["SKU", "Product_Family", "Product_Group"], &[]);
        assert!(classification_records(t).unwrap().is_empty());
    }

    #[test]
    fn test_gm_1_is_required() {
        let t = table(&["SKU", "Revenue_1"], &[&["a", "1"]]);
        match sales_records(t).unwrap_err() {
            TableError::MissingColumn { column, .. } => assert_eq!(column, "GM_1"),
        }
    }

    #[test]
    fn test_short_rows_read_as_empty_cells() {
        // Built by hand so the rows stay ragged
        let t = Table {
            headers: vec!["SKU".into(), "Revenue_1".into(), "GM_1".into()],
            rows: vec![vec![" a ".into()], vec![]],
        };
        let records = sales_records(t).unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].sku, "A");
        assert_eq!(records[0].revenue_1, None);
        assert_eq!(records[1].sku, "");
        assert_eq!(records[1].gm_1, None);
    }

    #[test]
    fn test_classification_blank_is_missing() {
        let t = table(
            &["SKU", "Product_Family", "Product_Group"],
            &[&["a", " Tools ", ""]],
        );
        let records = classification_records(t).unwrap();
        assert_eq!(records[0].product_family.as_deref(), Some("Tools"));
        assert_eq!(records[0].product_group, None);
    }
}
