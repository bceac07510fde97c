//! Data-quality checks over a raw sales batch.
//!
//! Validation is an audit trail, not a gate: every check runs, every outcome
//! is recorded, and the pipeline continues regardless. The cleaning stage is
//! the enforcement mechanism for the same defects. Checks never panic; a
//! nominated column that does not exist is itself reported as a failed check.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::info;

use crate::batch::{self, RawBatch};

/// Columns every raw sales batch is expected to carry.
pub const REQUIRED_SALES_COLUMNS: [&str; 7] = [
    "transaction_id",
    "date",
    "product_id",
    "quantity",
    "unit_price",
    "store_id",
    "discount_pct",
];

/// Outcome of a single quality check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckOutcome {
    pub passed: bool,
    pub message: String,
    pub detail: CheckDetail,
}

/// Check-specific diagnostic payload, tagged by check kind so callers can
/// handle outcomes exhaustively instead of string-matching messages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CheckDetail {
    /// Required columns absent from the batch.
    MissingColumns { missing: Vec<String> },
    /// Null count per nominated column (only columns that exist).
    NullCounts { counts: BTreeMap<String, usize> },
    /// Key values that occur more than once, in first-seen order.
    DuplicateKeys { values: Vec<String> },
    /// Count of numeric values outside the inclusive bounds. Non-numeric
    /// values are treated as missing, not as violations.
    OutOfRange { count: usize },
    /// Count of values that failed to parse with the expected date format.
    InvalidDates { count: usize },
    /// The nominated column does not exist at all.
    ColumnNotFound { column: String },
}

/// Verify that all expected columns are present in the batch.
pub fn check_required_columns(batch: &RawBatch, required: &[&str]) -> CheckOutcome {
    let missing: Vec<String> = required
        .iter()
        .filter(|col| !batch.has_column(col))
        .map(|col| col.to_string())
        .collect();

    if missing.is_empty() {
        CheckOutcome {
            passed: true,
            message: "All required columns present".to_string(),
            detail: CheckDetail::MissingColumns { missing },
        }
    } else {
        CheckOutcome {
            passed: false,
            message: format!("Missing required columns: {missing:?}"),
            detail: CheckDetail::MissingColumns { missing },
        }
    }
}

/// Check that the nominated columns contain no null values. Columns that do
/// not exist are skipped here; `check_required_columns` covers absence.
pub fn check_no_nulls(batch: &RawBatch, columns: &[&str]) -> CheckOutcome {
    let mut counts = BTreeMap::new();
    for col in columns.iter().filter(|col| batch.has_column(col)) {
        let nulls = batch
            .rows()
            .iter()
            .filter(|row| batch::is_null(row.get(*col)))
            .count();
        counts.insert(col.to_string(), nulls);
    }

    let problems: BTreeMap<&String, usize> = counts
        .iter()
        .filter(|(_, &count)| count > 0)
        .map(|(col, &count)| (col, count))
        .collect();

    if problems.is_empty() {
        CheckOutcome {
            passed: true,
            message: "No nulls in required columns".to_string(),
            detail: CheckDetail::NullCounts { counts },
        }
    } else {
        CheckOutcome {
            passed: false,
            message: format!("Null values found: {problems:?}"),
            detail: CheckDetail::NullCounts { counts },
        }
    }
}

/// Check that a column intended to be a unique key has no duplicate values.
/// Every duplicated value is reported once, not just its later occurrences.
pub fn check_no_duplicates(batch: &RawBatch, key_column: &str) -> CheckOutcome {
    if !batch.has_column(key_column) {
        return column_not_found(key_column);
    }

    let mut seen: BTreeMap<String, usize> = BTreeMap::new();
    let mut duplicates: Vec<String> = Vec::new();
    for row in batch.rows() {
        let Some(key) = batch::as_text(row.get(key_column)) else {
            continue;
        };
        let count = seen.entry(key.clone()).or_insert(0);
        *count += 1;
        if *count == 2 {
            duplicates.push(key);
        }
    }

    if duplicates.is_empty() {
        CheckOutcome {
            passed: true,
            message: format!("No duplicates in '{key_column}'"),
            detail: CheckDetail::DuplicateKeys { values: duplicates },
        }
    } else {
        CheckOutcome {
            passed: false,
            message: format!("Duplicate values in '{key_column}': {duplicates:?}"),
            detail: CheckDetail::DuplicateKeys { values: duplicates },
        }
    }
}

/// Check that numeric values in a column fall within `[min, max]` inclusive.
/// Values that do not coerce to a number count as missing, not violations.
pub fn check_numeric_range(batch: &RawBatch, column: &str, min: f64, max: f64) -> CheckOutcome {
    if !batch.has_column(column) {
        return column_not_found(column);
    }

    let count = batch
        .rows()
        .iter()
        .filter_map(|row| batch::as_f64(row.get(column)))
        .filter(|value| *value < min || *value > max)
        .count();

    if count == 0 {
        CheckOutcome {
            passed: true,
            message: format!("'{column}' values are within [{min}, {max}]"),
            detail: CheckDetail::OutOfRange { count },
        }
    } else {
        CheckOutcome {
            passed: false,
            message: format!("'{column}' has {count} value(s) outside [{min}, {max}]"),
            detail: CheckDetail::OutOfRange { count },
        }
    }
}

/// Check that every value in a column parses with the given strftime-style
/// format. Nulls and unparsable values both count as invalid.
pub fn check_date_format(batch: &RawBatch, column: &str, format: &str) -> CheckOutcome {
    if !batch.has_column(column) {
        return column_not_found(column);
    }

    let count = batch
        .rows()
        .iter()
        .filter(|row| {
            batch::as_text(row.get(column))
                .and_then(|text| NaiveDate::parse_from_str(&text, format).ok())
                .is_none()
        })
        .count();

    if count == 0 {
        CheckOutcome {
            passed: true,
            message: format!("All '{column}' values match format '{format}'"),
            detail: CheckDetail::InvalidDates { count },
        }
    } else {
        CheckOutcome {
            passed: false,
            message: format!("'{column}' has {count} value(s) not matching format '{format}'"),
            detail: CheckDetail::InvalidDates { count },
        }
    }
}

fn column_not_found(column: &str) -> CheckOutcome {
    CheckOutcome {
        passed: false,
        message: format!("Column '{column}' not found"),
        detail: CheckDetail::ColumnNotFound {
            column: column.to_string(),
        },
    }
}

/// Bounds and formats for the sales validation suite. Loaded as part of the
/// run configuration rather than held in module state.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    pub quantity_min: f64,
    pub quantity_max: f64,
    pub unit_price_min: f64,
    pub unit_price_max: f64,
    pub discount_min: f64,
    pub discount_max: f64,
    pub date_format: String,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            quantity_min: 1.0,
            quantity_max: 10_000.0,
            unit_price_min: 0.01,
            unit_price_max: 100_000.0,
            discount_min: 0.0,
            discount_max: 1.0,
            date_format: "%Y-%m-%d".to_string(),
        }
    }
}

/// Named check outcomes in the order the checks were declared.
#[derive(Debug, Clone, Default)]
pub struct ValidationReport {
    checks: Vec<(String, CheckOutcome)>,
}

impl ValidationReport {
    fn push(&mut self, name: &str, outcome: CheckOutcome) {
        self.checks.push((name.to_string(), outcome));
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &CheckOutcome)> {
        self.checks.iter().map(|(name, outcome)| (name.as_str(), outcome))
    }

    pub fn get(&self, name: &str) -> Option<&CheckOutcome> {
        self.checks
            .iter()
            .find(|(check, _)| check == name)
            .map(|(_, outcome)| outcome)
    }

    pub fn len(&self) -> usize {
        self.checks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.checks.is_empty()
    }

    pub fn passed_count(&self) -> usize {
        self.checks.iter().filter(|(_, o)| o.passed).count()
    }

    pub fn all_passed(&self) -> bool {
        self.passed_count() == self.len()
    }

    pub fn failed_names(&self) -> Vec<&str> {
        self.checks
            .iter()
            .filter(|(_, o)| !o.passed)
            .map(|(name, _)| name.as_str())
            .collect()
    }
}

/// Runs the fixed suite of quality checks over a raw sales batch.
pub struct SalesValidator {
    config: ValidationConfig,
}

impl SalesValidator {
    pub fn new() -> Self {
        Self::with_config(ValidationConfig::default())
    }

    pub fn with_config(config: ValidationConfig) -> Self {
        Self { config }
    }

    /// Run every check and log a summary. Never aborts: downstream cleaning
    /// independently fixes or tolerates whatever is reported here.
    pub fn run(&self, batch: &RawBatch) -> ValidationReport {
        info!("running sales data validation");
        let c = &self.config;

        let mut report = ValidationReport::default();
        report.push(
            "required_columns",
            check_required_columns(batch, &REQUIRED_SALES_COLUMNS),
        );
        report.push(
            "no_duplicate_transactions",
            check_no_duplicates(batch, "transaction_id"),
        );
        report.push(
            "no_null_transaction_ids",
            check_no_nulls(batch, &["transaction_id"]),
        );
        report.push("no_null_product_ids", check_no_nulls(batch, &["product_id"]));
        report.push(
            "valid_quantity",
            check_numeric_range(batch, "quantity", c.quantity_min, c.quantity_max),
        );
        report.push(
            "valid_unit_price",
            check_numeric_range(batch, "unit_price", c.unit_price_min, c.unit_price_max),
        );
        report.push(
            "valid_discount",
            check_numeric_range(batch, "discount_pct", c.discount_min, c.discount_max),
        );
        report.push(
            "valid_date_format",
            check_date_format(batch, "date", &c.date_format),
        );

        info!(
            passed = report.passed_count(),
            total = report.len(),
            "validation complete"
        );
        for (name, outcome) in report.iter() {
            let status = if outcome.passed { "PASS" } else { "FAIL" };
            info!("  [{status}] {name}: {}", outcome.message);
        }

        report
    }
}

impl Default for SalesValidator {
    fn default() -> Self {
        Self::new()
    }
}

/// Run the full sales validation suite with default bounds.
pub fn run_sales_validation(batch: &RawBatch) -> ValidationReport {
    SalesValidator::new().run(batch)
}
