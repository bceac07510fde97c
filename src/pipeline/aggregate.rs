//! Aggregation stage: grouped summaries of the metrics batch.
//!
//! Grouping is order-insensitive but each summary has a defined output
//! order. Null contributions are skipped from sums and means; null group
//! keys form their own bucket so data loss stays visible in the output.

use std::cmp::Ordering;
use std::collections::HashMap;
use tracing::info;

use super::metrics::round2;
use crate::domain::{CategorySummary, DateSummary, MetricsRecord, StoreSummary};

#[derive(Debug, Default, Clone)]
struct Accumulator {
    transactions: u64,
    units: i64,
    gross: f64,
    net: f64,
    profit: f64,
    margin_sum: f64,
    margin_count: u64,
}

impl Accumulator {
    fn add(&mut self, record: &MetricsRecord) {
        self.transactions += 1;
        self.units += record.enriched.sale.quantity.unwrap_or(0);
        self.gross += record.gross_revenue.unwrap_or(0.0);
        self.net += record.net_revenue.unwrap_or(0.0);
        self.profit += record.profit.unwrap_or(0.0);
        if let Some(margin) = record.profit_margin_pct {
            self.margin_sum += margin;
            self.margin_count += 1;
        }
    }

    fn avg_margin(&self) -> Option<f64> {
        if self.margin_count == 0 {
            None
        } else {
            Some(round2(self.margin_sum / self.margin_count as f64))
        }
    }
}

fn group_by<K, F>(records: &[MetricsRecord], key: F) -> HashMap<K, Accumulator>
where
    K: std::hash::Hash + Eq,
    F: Fn(&MetricsRecord) -> K,
{
    let mut groups: HashMap<K, Accumulator> = HashMap::new();
    for record in records {
        groups.entry(key(record)).or_default().add(record);
    }
    groups
}

fn by_net_revenue_desc(a: f64, b: f64) -> Ordering {
    b.partial_cmp(&a).unwrap_or(Ordering::Equal)
}

/// Summarise metrics per product category, sorted descending by net
/// revenue. Sales without a catalogue match land in the None bucket.
pub fn aggregate_by_category(records: &[MetricsRecord]) -> Vec<CategorySummary> {
    let groups = group_by(records, |r| r.enriched.category.clone());

    let mut summary: Vec<CategorySummary> = groups
        .into_iter()
        .map(|(category, acc)| CategorySummary {
            category,
            total_transactions: acc.transactions,
            total_units_sold: acc.units,
            total_gross_revenue: round2(acc.gross),
            total_net_revenue: round2(acc.net),
            total_profit: round2(acc.profit),
        })
        .collect();

    summary.sort_by(|a, b| {
        by_net_revenue_desc(a.total_net_revenue, b.total_net_revenue)
            .then_with(|| a.category.cmp(&b.category))
    });

    info!(categories = summary.len(), "category summary built");
    summary
}

/// Summarise metrics per store, sorted descending by net revenue. Includes
/// the mean of per-row profit margins, nulls excluded.
pub fn aggregate_by_store(records: &[MetricsRecord]) -> Vec<StoreSummary> {
    let groups = group_by(records, |r| r.enriched.sale.store_id.clone());

    let mut summary: Vec<StoreSummary> = groups
        .into_iter()
        .map(|(store_id, acc)| StoreSummary {
            store_id,
            total_transactions: acc.transactions,
            total_units_sold: acc.units,
            total_net_revenue: round2(acc.net),
            total_profit: round2(acc.profit),
            avg_profit_margin_pct: acc.avg_margin(),
        })
        .collect();

    summary.sort_by(|a, b| {
        by_net_revenue_desc(a.total_net_revenue, b.total_net_revenue)
            .then_with(|| a.store_id.cmp(&b.store_id))
    });

    info!(stores = summary.len(), "store summary built");
    summary
}

/// Summarise daily totals, sorted chronologically. Rows whose date failed
/// to parse form an unknown-date bucket, ordered first.
pub fn aggregate_by_date(records: &[MetricsRecord]) -> Vec<DateSummary> {
    let groups = group_by(records, |r| r.enriched.sale.date);

    let mut summary: Vec<DateSummary> = groups
        .into_iter()
        .map(|(date, acc)| DateSummary {
            date,
            total_transactions: acc.transactions,
            total_units_sold: acc.units,
            total_net_revenue: round2(acc.net),
            total_profit: round2(acc.profit),
        })
        .collect();

    // Option<NaiveDate> orders None before any date
    summary.sort_by_key(|s| s.date);

    info!(days = summary.len(), "daily summary built");
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{CleanSaleRecord, EnrichedRecord};
    use chrono::NaiveDate;
    use crate::pipeline::metrics::calculate_metrics;

    fn record(
        id: &str,
        date: Option<&str>,
        store: &str,
        category: Option<&str>,
        quantity: i64,
        unit_price: f64,
        cost_price: Option<f64>,
    ) -> EnrichedRecord {
        EnrichedRecord {
            sale: CleanSaleRecord {
                transaction_id: id.to_string(),
                date: date.and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok()),
                product_id: "P1".to_string(),
                quantity: Some(quantity),
                unit_price: Some(unit_price),
                customer_id: "C1".to_string(),
                store_id: store.to_string(),
                discount_pct: 0.0,
            },
            product_name: None,
            category: category.map(str::to_string),
            brand: None,
            cost_price,
        }
    }

    fn sample_metrics() -> Vec<MetricsRecord> {
        calculate_metrics(&[
            record("T1", Some("2024-01-15"), "S01", Some("Electronics"), 2, 30.0, Some(10.0)),
            record("T2", Some("2024-01-16"), "S01", Some("Stationery"), 1, 5.0, Some(2.0)),
            record("T3", Some("2024-01-15"), "S02", Some("Electronics"), 3, 30.0, Some(10.0)),
            record("T4", None, "S02", None, 1, 100.0, None),
        ])
    }

    #[test]
    fn category_summary_groups_and_sorts_by_net_revenue() {
        let summary = aggregate_by_category(&sample_metrics());

        assert_eq!(summary.len(), 3);
        // Electronics 150.0 > unmatched 100.0 > Stationery 5.0
        assert_eq!(summary[0].category.as_deref(), Some("Electronics"));
        assert_eq!(summary[0].total_transactions, 2);
        assert_eq!(summary[0].total_units_sold, 5);
        assert_eq!(summary[0].total_net_revenue, 150.0);
        assert_eq!(summary[1].category, None);
        assert_eq!(summary[2].category.as_deref(), Some("Stationery"));
    }

    #[test]
    fn category_nets_conserve_the_batch_total() {
        let metrics = sample_metrics();
        let total: f64 = metrics.iter().filter_map(|m| m.net_revenue).sum();
        let summed: f64 = aggregate_by_category(&metrics)
            .iter()
            .map(|s| s.total_net_revenue)
            .sum();
        // Equal modulo per-group rounding
        assert!((total - summed).abs() < 0.02);
    }

    #[test]
    fn store_summary_excludes_null_margins_from_mean() {
        let summary = aggregate_by_store(&sample_metrics());

        assert_eq!(summary.len(), 2);
        // S02: 90 + 100 net > S01: 65 net
        assert_eq!(summary[0].store_id, "S02");
        // T4 has unknown cost so its margin is null; only T3's margin counts
        let m = summary[0].avg_profit_margin_pct.unwrap();
        assert!((m - 66.67).abs() < 0.01);
    }

    #[test]
    fn store_margin_is_none_when_all_margins_undefined() {
        let metrics = calculate_metrics(&[record("T1", None, "S01", None, 1, 10.0, None)]);
        let summary = aggregate_by_store(&metrics);
        assert_eq!(summary[0].avg_profit_margin_pct, None);
    }

    #[test]
    fn date_summary_is_chronological_with_unknown_bucket_first() {
        let summary = aggregate_by_date(&sample_metrics());

        assert_eq!(summary.len(), 3);
        assert_eq!(summary[0].date, None);
        assert_eq!(summary[0].total_transactions, 1);
        assert_eq!(summary[1].date, NaiveDate::from_ymd_opt(2024, 1, 15));
        assert_eq!(summary[2].date, NaiveDate::from_ymd_opt(2024, 1, 16));
    }

    #[test]
    fn empty_batch_yields_empty_summaries() {
        assert!(aggregate_by_category(&[]).is_empty());
        assert!(aggregate_by_store(&[]).is_empty());
        assert!(aggregate_by_date(&[]).is_empty());
    }
}
