//! Enrichment stage: left-join cleaned sales onto the product catalogue.

use std::collections::HashMap;
use tracing::{info, warn};

use crate::domain::{CleanProductRecord, CleanSaleRecord, EnrichedRecord};

/// Result of the sales/product join, carrying the unmatched count as a
/// data-quality signal for the caller. An unmatched sale is not a failure;
/// its product fields are simply None.
#[derive(Debug, Clone)]
pub struct EnrichOutcome {
    pub records: Vec<EnrichedRecord>,
    /// Sales rows with no matching catalogue entry.
    pub unmatched: usize,
}

/// Left outer join on `product_id`: every sale appears exactly once in the
/// output, matched or not.
///
/// The catalogue must have unique product identifiers; this component does
/// not deduplicate it, and with duplicates present the last occurrence of a
/// product id wins.
pub fn merge_sales_products(
    sales: &[CleanSaleRecord],
    products: &[CleanProductRecord],
) -> EnrichOutcome {
    info!("merging sales with product catalogue");

    let catalogue: HashMap<&str, &CleanProductRecord> = products
        .iter()
        .map(|p| (p.product_id.as_str(), p))
        .collect();

    let mut unmatched = 0usize;
    let records: Vec<EnrichedRecord> = sales
        .iter()
        .map(|sale| match catalogue.get(sale.product_id.as_str()) {
            Some(product) => EnrichedRecord {
                sale: sale.clone(),
                product_name: product.name.clone(),
                category: product.category.clone(),
                brand: product.brand.clone(),
                cost_price: product.cost_price,
            },
            None => {
                unmatched += 1;
                EnrichedRecord {
                    sale: sale.clone(),
                    product_name: None,
                    category: None,
                    brand: None,
                    cost_price: None,
                }
            }
        })
        .collect();

    if unmatched > 0 {
        warn!(unmatched, "sale(s) could not be matched to a product");
    }
    info!(rows = records.len(), "merged sales with products");

    EnrichOutcome { records, unmatched }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sale(transaction_id: &str, product_id: &str) -> CleanSaleRecord {
        CleanSaleRecord {
            transaction_id: transaction_id.to_string(),
            date: None,
            product_id: product_id.to_string(),
            quantity: Some(1),
            unit_price: Some(10.0),
            customer_id: "C1".to_string(),
            store_id: "S01".to_string(),
            discount_pct: 0.0,
        }
    }

    fn product(product_id: &str, category: &str, cost: f64) -> CleanProductRecord {
        CleanProductRecord {
            product_id: product_id.to_string(),
            name: Some(format!("Product {product_id}")),
            category: Some(category.to_string()),
            brand: Some("BrandX".to_string()),
            cost_price: Some(cost),
        }
    }

    #[test]
    fn every_sale_appears_exactly_once() {
        let sales = vec![sale("T1", "P1"), sale("T2", "P2"), sale("T3", "P1")];
        let products = vec![product("P1", "Electronics", 5.0)];

        let outcome = merge_sales_products(&sales, &products);
        assert_eq!(outcome.records.len(), 3);
        let ids: Vec<&str> = outcome
            .records
            .iter()
            .map(|r| r.sale.transaction_id.as_str())
            .collect();
        assert_eq!(ids, vec!["T1", "T2", "T3"]);
    }

    #[test]
    fn unmatched_sales_get_null_product_fields() {
        let sales = vec![sale("T1", "P1"), sale("T2", "P404")];
        let products = vec![product("P1", "Electronics", 5.0)];

        let outcome = merge_sales_products(&sales, &products);
        assert_eq!(outcome.unmatched, 1);

        let matched = &outcome.records[0];
        assert_eq!(matched.category.as_deref(), Some("Electronics"));
        assert_eq!(matched.cost_price, Some(5.0));

        let orphan = &outcome.records[1];
        assert_eq!(orphan.product_name, None);
        assert_eq!(orphan.category, None);
        assert_eq!(orphan.brand, None);
        assert_eq!(orphan.cost_price, None);
    }

    #[test]
    fn empty_catalogue_leaves_all_sales_unmatched() {
        let sales = vec![sale("T1", "P1")];
        let outcome = merge_sales_products(&sales, &[]);
        assert_eq!(outcome.records.len(), 1);
        assert_eq!(outcome.unmatched, 1);
    }
}
