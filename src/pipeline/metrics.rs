//! Metrics stage: derive per-row financial fields from enriched sales.
//!
//! Every formula null-propagates: if any input to a metric is unknown, the
//! metric is None rather than a misleading zero. Division by zero is a
//! defined case, not an error: a row with exactly zero net revenue has an
//! undefined margin (None). Negative net revenue yields a defined, possibly
//! negative margin.

use tracing::info;

use crate::domain::{EnrichedRecord, MetricsRecord};

/// Round to 2 decimal places.
pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Compute the derived metric columns for each enriched record:
/// gross revenue, discount amount, net revenue, total cost, profit, and
/// profit margin (percent of net revenue, 2 dp).
pub fn calculate_metrics(enriched: &[EnrichedRecord]) -> Vec<MetricsRecord> {
    info!("calculating business metrics");

    let records: Vec<MetricsRecord> = enriched
        .iter()
        .map(|record| {
            let quantity = record.sale.quantity.map(|q| q as f64);

            let gross_revenue = mul(quantity, record.sale.unit_price);
            let discount_amount = gross_revenue.map(|g| g * record.sale.discount_pct);
            let net_revenue = sub(gross_revenue, discount_amount);
            let cost_total = mul(quantity, record.cost_price);
            let profit = sub(net_revenue, cost_total);

            let profit_margin_pct = match (profit, net_revenue) {
                (Some(p), Some(n)) if n != 0.0 => Some(round2(100.0 * p / n)),
                _ => None,
            };

            MetricsRecord {
                enriched: record.clone(),
                gross_revenue,
                discount_amount,
                net_revenue,
                cost_total,
                profit,
                profit_margin_pct,
            }
        })
        .collect();

    info!(rows = records.len(), "metrics calculated");
    records
}

fn mul(a: Option<f64>, b: Option<f64>) -> Option<f64> {
    Some(a? * b?)
}

fn sub(a: Option<f64>, b: Option<f64>) -> Option<f64> {
    Some(a? - b?)
}
