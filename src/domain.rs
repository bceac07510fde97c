//! Record shapes produced by the transform stages.
//!
//! Every batch in the pipeline is a plain `Vec` of one of these types. Each
//! stage consumes its predecessor's batch and builds a fresh one; nothing is
//! mutated in place. Unparsable or missing values are `Option::None`, never
//! a magic number, so null propagation through the metric formulas stays
//! visible in the types.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Placeholder substituted for missing identifier fields during cleaning.
pub const UNKNOWN: &str = "UNKNOWN";

/// A sales transaction after cleaning: unique by `transaction_id`, dates
/// parsed, numerics coerced, missing identifiers filled with [`UNKNOWN`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CleanSaleRecord {
    pub transaction_id: String,
    /// None when the raw date did not match the expected format.
    pub date: Option<NaiveDate>,
    pub product_id: String,
    /// None when the raw quantity was missing or not a whole number.
    pub quantity: Option<i64>,
    pub unit_price: Option<f64>,
    pub customer_id: String,
    pub store_id: String,
    /// Defaults to 0.0 when missing or unparsable.
    pub discount_pct: f64,
}

/// A catalogue entry after cleaning: text trimmed, cost coerced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CleanProductRecord {
    pub product_id: String,
    pub name: Option<String>,
    pub category: Option<String>,
    pub brand: Option<String>,
    pub cost_price: Option<f64>,
}

/// A sale left-joined with its catalogue entry. Product fields are None
/// when the catalogue had no matching `product_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichedRecord {
    pub sale: CleanSaleRecord,
    pub product_name: Option<String>,
    pub category: Option<String>,
    pub brand: Option<String>,
    pub cost_price: Option<f64>,
}

/// An enriched sale plus its derived financial metrics. A None metric means
/// some input to its formula was unknown; it is never coerced to zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsRecord {
    pub enriched: EnrichedRecord,
    pub gross_revenue: Option<f64>,
    pub discount_amount: Option<f64>,
    pub net_revenue: Option<f64>,
    pub cost_total: Option<f64>,
    pub profit: Option<f64>,
    /// Profit as a percentage of net revenue, rounded to 2 dp. None when
    /// net revenue is unknown or exactly zero (undefined margin).
    pub profit_margin_pct: Option<f64>,
}

/// Per-category rollup, sorted descending by net revenue. A None category
/// is the bucket for sales with no catalogue match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategorySummary {
    pub category: Option<String>,
    pub total_transactions: u64,
    pub total_units_sold: i64,
    pub total_gross_revenue: f64,
    pub total_net_revenue: f64,
    pub total_profit: f64,
}

/// Per-store rollup, sorted descending by net revenue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreSummary {
    pub store_id: String,
    pub total_transactions: u64,
    pub total_units_sold: i64,
    pub total_net_revenue: f64,
    pub total_profit: f64,
    /// Mean of the non-null per-row margins; None when every row's margin
    /// was undefined.
    pub avg_profit_margin_pct: Option<f64>,
}

/// Per-day rollup, sorted chronologically with the unknown-date bucket
/// first so dropped-looking data stays visible.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DateSummary {
    pub date: Option<NaiveDate>,
    pub total_transactions: u64,
    pub total_units_sold: i64,
    pub total_net_revenue: f64,
    pub total_profit: f64,
}
