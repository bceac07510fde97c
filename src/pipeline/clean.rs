//! Cleaning stage: normalize raw batches into analysis-ready records.
//!
//! Cleaning is where data-quality defects get fixed or made explicit. Rows
//! are never dropped for being dirty (only exact key duplicates go);
//! unparsable values become `None` and missing identifiers get the
//! [`UNKNOWN`] sentinel so nothing disappears silently.

use chrono::NaiveDate;
use std::collections::HashSet;
use tracing::info;

use crate::batch::{self, RawBatch};
use crate::domain::{CleanProductRecord, CleanSaleRecord, UNKNOWN};

/// Date format raw sales dates are expected to use.
pub const SALES_DATE_FORMAT: &str = "%Y-%m-%d";

/// Clean a raw sales batch:
/// 1. drop duplicate transactions, keeping the first occurrence by row order;
/// 2. parse dates (unparsable becomes None);
/// 3. fill missing identifiers with the `UNKNOWN` sentinel;
/// 4. coerce quantity to integer, price and discount to float
///    (discount defaults to 0.0, the rest become None when unparsable).
///
/// The source batch is untouched; callers may reuse it.
pub fn clean_sales(batch: &RawBatch) -> Vec<CleanSaleRecord> {
    info!("cleaning sales data");

    let mut seen_transactions: HashSet<String> = HashSet::new();
    let mut missing_customers = 0usize;
    let mut records = Vec::with_capacity(batch.len());

    for row in batch.rows() {
        let transaction_id = identifier(batch::as_text(row.get("transaction_id")));
        if !seen_transactions.insert(transaction_id.clone()) {
            continue;
        }

        let customer_id = match batch::as_text(row.get("customer_id")) {
            Some(id) => id,
            None => {
                missing_customers += 1;
                UNKNOWN.to_string()
            }
        };

        records.push(CleanSaleRecord {
            transaction_id,
            date: batch::as_text(row.get("date"))
                .and_then(|text| NaiveDate::parse_from_str(&text, SALES_DATE_FORMAT).ok()),
            product_id: identifier(batch::as_text(row.get("product_id"))),
            quantity: batch::as_i64(row.get("quantity")),
            unit_price: batch::as_f64(row.get("unit_price")),
            customer_id,
            store_id: identifier(batch::as_text(row.get("store_id"))),
            discount_pct: batch::as_f64(row.get("discount_pct")).unwrap_or(0.0),
        });
    }

    let removed = batch.len() - records.len();
    if removed > 0 {
        info!(removed, "removed duplicate transaction(s)");
    }
    if missing_customers > 0 {
        info!(missing_customers, "filled missing customer_id(s) with '{UNKNOWN}'");
    }
    info!(rows = records.len(), "cleaned sales");

    records
}

/// Clean a raw products batch: trim whitespace from the text fields and
/// coerce `cost_price` to a float. Rows are never dropped; catalogue
/// uniqueness is the supplier's contract, not enforced here.
pub fn clean_products(batch: &RawBatch) -> Vec<CleanProductRecord> {
    info!("cleaning products data");

    let records: Vec<CleanProductRecord> = batch
        .rows()
        .iter()
        .map(|row| CleanProductRecord {
            product_id: identifier(trimmed(batch::as_text(row.get("product_id")))),
            name: trimmed(batch::as_text(row.get("name"))),
            category: trimmed(batch::as_text(row.get("category"))),
            brand: trimmed(batch::as_text(row.get("brand"))),
            cost_price: batch::as_f64(row.get("cost_price")),
        })
        .collect();

    info!(rows = records.len(), "cleaned products");
    records
}

fn identifier(value: Option<String>) -> String {
    match value {
        Some(v) => v.trim().to_string(),
        None => UNKNOWN.to_string(),
    }
}

fn trimmed(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};
    use std::collections::HashMap;

    fn sales_batch(rows: Vec<Vec<Value>>) -> RawBatch {
        let columns = [
            "transaction_id",
            "date",
            "product_id",
            "quantity",
            "unit_price",
            "customer_id",
            "store_id",
            "discount_pct",
        ];
        let columns: Vec<String> = columns.iter().map(|c| c.to_string()).collect();
        let rows = rows
            .into_iter()
            .map(|cells| columns.iter().cloned().zip(cells).collect::<HashMap<_, _>>())
            .collect();
        RawBatch::new(columns, rows)
    }

    fn sale(id: &str, date: &str, qty: Value, customer: Value) -> Vec<Value> {
        vec![
            json!(id),
            json!(date),
            json!("P001"),
            qty,
            json!("29.99"),
            customer,
            json!("S01"),
            json!("0.10"),
        ]
    }

    #[test]
    fn duplicates_keep_first_occurrence() {
        let batch = sales_batch(vec![
            sale("T001", "2024-01-15", json!("2"), json!("C1")),
            sale("T002", "2024-01-16", json!("1"), json!("C2")),
            sale("T001", "2024-01-17", json!("9"), json!("C3")),
        ]);
        let cleaned = clean_sales(&batch);

        assert_eq!(cleaned.len(), 2);
        assert_eq!(cleaned[0].transaction_id, "T001");
        // The surviving T001 is the first-seen row
        assert_eq!(cleaned[0].quantity, Some(2));
        assert_eq!(
            cleaned[0].date,
            NaiveDate::from_ymd_opt(2024, 1, 15)
        );
    }

    #[test]
    fn missing_customer_gets_sentinel() {
        let batch = sales_batch(vec![sale("T001", "2024-01-15", json!("2"), Value::Null)]);
        let cleaned = clean_sales(&batch);
        assert_eq!(cleaned[0].customer_id, UNKNOWN);
    }

    #[test]
    fn bad_date_and_quantity_become_none() {
        let batch = sales_batch(vec![sale(
            "T001",
            "not-a-date",
            json!("lots"),
            json!("C1"),
        )]);
        let cleaned = clean_sales(&batch);
        assert_eq!(cleaned[0].date, None);
        assert_eq!(cleaned[0].quantity, None);
    }

    #[test]
    fn missing_discount_defaults_to_zero() {
        let mut row = sale("T001", "2024-01-15", json!("2"), json!("C1"));
        row[7] = Value::Null;
        let batch = sales_batch(vec![row]);
        let cleaned = clean_sales(&batch);
        assert_eq!(cleaned[0].discount_pct, 0.0);
    }

    #[test]
    fn product_strings_are_trimmed() {
        let columns: Vec<String> = ["product_id", "name", "category", "brand", "cost_price"]
            .iter()
            .map(|c| c.to_string())
            .collect();
        let row: HashMap<String, Value> = columns
            .iter()
            .cloned()
            .zip(vec![
                json!(" P001 "),
                json!("  Wireless Mouse"),
                json!("Electronics  "),
                json!("TechGear"),
                json!("12.50"),
            ])
            .collect();
        let batch = RawBatch::new(columns, vec![row]);

        let cleaned = clean_products(&batch);
        assert_eq!(cleaned[0].product_id, "P001");
        assert_eq!(cleaned[0].name.as_deref(), Some("Wireless Mouse"));
        assert_eq!(cleaned[0].category.as_deref(), Some("Electronics"));
        assert_eq!(cleaned[0].cost_price, Some(12.50));
    }

    #[test]
    fn clean_sales_is_idempotent() {
        let batch = sales_batch(vec![
            sale("T001", "2024-01-15", json!("2"), Value::Null),
            sale("T001", "2024-01-15", json!("2"), Value::Null),
            sale("T002", "bad-date", json!("oops"), json!("C2")),
        ]);
        let once = clean_sales(&batch);

        // Rebuild a raw batch from the cleaned output and clean again.
        let columns: Vec<String> = [
            "transaction_id",
            "date",
            "product_id",
            "quantity",
            "unit_price",
            "customer_id",
            "store_id",
            "discount_pct",
        ]
        .iter()
        .map(|c| c.to_string())
        .collect();
        let rows = once
            .iter()
            .map(|r| {
                let mut row = HashMap::new();
                row.insert("transaction_id".to_string(), json!(r.transaction_id));
                row.insert(
                    "date".to_string(),
                    r.date
                        .map(|d| json!(d.format(SALES_DATE_FORMAT).to_string()))
                        .unwrap_or(Value::Null),
                );
                row.insert("product_id".to_string(), json!(r.product_id));
                row.insert(
                    "quantity".to_string(),
                    r.quantity.map(|q| json!(q)).unwrap_or(Value::Null),
                );
                row.insert(
                    "unit_price".to_string(),
                    r.unit_price.map(|p| json!(p)).unwrap_or(Value::Null),
                );
                row.insert("customer_id".to_string(), json!(r.customer_id));
                row.insert("store_id".to_string(), json!(r.store_id));
                row.insert("discount_pct".to_string(), json!(r.discount_pct));
                row
            })
            .collect();

        let twice = clean_sales(&RawBatch::new(columns, rows));
        assert_eq!(once, twice);
    }
}
