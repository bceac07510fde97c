//! Pipeline orchestration: Extract -> Validate -> Transform -> Load.
//!
//! Validation never blocks the run; its report is logged as an audit trail
//! and the transform stages fix or tolerate the same defects. Only
//! structural failures (missing files, malformed containers, storage
//! errors) abort.

pub mod aggregate;
pub mod clean;
pub mod enrich;
pub mod metrics;
pub mod validate;

use tracing::{info, warn};

use crate::config::Config;
use crate::error::Result;
use crate::extract::{extract_csv, extract_json};
use crate::load::{load_to_csv, load_to_sqlite, query_scalar};

/// Observable counts from a completed run.
#[derive(Debug, Clone)]
pub struct PipelineReport {
    pub raw_sales_rows: usize,
    pub raw_product_rows: usize,
    pub checks_passed: usize,
    pub checks_total: usize,
    pub clean_sales_rows: usize,
    pub duplicates_removed: usize,
    pub unmatched_sales: usize,
    pub categories: usize,
    pub stores: usize,
    pub days: usize,
}

/// Execute the full ETL pipeline end-to-end.
pub fn run_pipeline(config: &Config) -> Result<PipelineReport> {
    info!("starting ETL pipeline");

    // Stage 1: extract
    info!("[stage 1] extract");
    let raw_sales = extract_csv(&config.paths.sales_csv)?;
    let raw_products = extract_json(&config.paths.products_json)?;

    // Stage 2: validate (observational; the run continues either way)
    info!("[stage 2] validate");
    let validator = validate::SalesValidator::with_config(config.validation.clone());
    let report = validator.run(&raw_sales);
    if !report.all_passed() {
        warn!(
            failed = ?report.failed_names(),
            "validation check(s) failed; continuing, cleaning will handle the defects"
        );
    } else {
        info!("all validation checks passed");
    }

    // Stage 3: transform
    info!("[stage 3] transform");
    let clean_sales = clean::clean_sales(&raw_sales);
    let clean_products = clean::clean_products(&raw_products);
    let enriched = enrich::merge_sales_products(&clean_sales, &clean_products);
    let sales_metrics = metrics::calculate_metrics(&enriched.records);

    info!("building aggregations");
    let category_summary = aggregate::aggregate_by_category(&sales_metrics);
    let store_summary = aggregate::aggregate_by_store(&sales_metrics);
    let daily_summary = aggregate::aggregate_by_date(&sales_metrics);

    // Stage 4: load
    info!("[stage 4] load");
    let db = &config.paths.database;
    load_to_sqlite(&sales_metrics, "sales", db)?;
    load_to_sqlite(&clean_products, "products", db)?;
    load_to_sqlite(&category_summary, "summary_by_category", db)?;
    load_to_sqlite(&store_summary, "summary_by_store", db)?;
    load_to_sqlite(&daily_summary, "summary_by_date", db)?;

    let processed = &config.paths.processed_dir;
    load_to_csv(&sales_metrics, processed.join("sales_enriched.csv"))?;
    load_to_csv(&category_summary, processed.join("summary_by_category.csv"))?;
    load_to_csv(&store_summary, processed.join("summary_by_store.csv"))?;
    load_to_csv(&daily_summary, processed.join("summary_by_date.csv"))?;

    // Verify the load landed
    let loaded = query_scalar(db, "SELECT COUNT(*) FROM sales")?;
    info!(loaded, "sales rows verified in database");

    info!("pipeline completed successfully");
    Ok(PipelineReport {
        raw_sales_rows: raw_sales.len(),
        raw_product_rows: raw_products.len(),
        checks_passed: report.passed_count(),
        checks_total: report.len(),
        clean_sales_rows: clean_sales.len(),
        duplicates_removed: raw_sales.len() - clean_sales.len(),
        unmatched_sales: enriched.unmatched,
        categories: category_summary.len(),
        stores: store_summary.len(),
        days: daily_summary.len(),
    })
}
