//! Load stage: write finished batches to SQLite tables and CSV files.
//!
//! Every persisted batch is a flat table of named, typed columns; the
//! [`TabularRecord`] trait is that contract. The same schema drives both
//! the relational tables and the delimited exports.

use rusqlite::types::{ToSqlOutput, Value as DbValue, ValueRef};
use rusqlite::{Connection, ToSql};
use std::path::Path;
use tracing::info;

use crate::domain::{
    CategorySummary, CleanProductRecord, DateSummary, MetricsRecord, StoreSummary,
};
use crate::error::{EtlError, Result};
use crate::pipeline::clean::SALES_DATE_FORMAT;

/// A single cell bound for storage.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
}

/// Declared column type, used for `CREATE TABLE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqlType {
    Integer,
    Real,
    Text,
}

impl SqlType {
    fn ddl(self) -> &'static str {
        match self {
            SqlType::Integer => "INTEGER",
            SqlType::Real => "REAL",
            SqlType::Text => "TEXT",
        }
    }
}

impl ToSql for SqlValue {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            SqlValue::Null => ToSqlOutput::Owned(DbValue::Null),
            SqlValue::Integer(i) => ToSqlOutput::Owned(DbValue::Integer(*i)),
            SqlValue::Real(f) => ToSqlOutput::Owned(DbValue::Real(*f)),
            SqlValue::Text(s) => ToSqlOutput::Borrowed(ValueRef::Text(s.as_bytes())),
        })
    }
}

impl SqlValue {
    fn csv_field(&self) -> String {
        match self {
            SqlValue::Null => String::new(),
            SqlValue::Integer(i) => i.to_string(),
            SqlValue::Real(f) => f.to_string(),
            SqlValue::Text(s) => s.clone(),
        }
    }

    fn from_opt_f64(value: Option<f64>) -> Self {
        value.map_or(SqlValue::Null, SqlValue::Real)
    }

    fn from_opt_i64(value: Option<i64>) -> Self {
        value.map_or(SqlValue::Null, SqlValue::Integer)
    }

    fn from_opt_text(value: Option<&str>) -> Self {
        value.map_or(SqlValue::Null, |s| SqlValue::Text(s.to_string()))
    }
}

/// The flat tabular contract between the transform stages and persistence.
pub trait TabularRecord {
    /// Column names and declared types, in output order.
    fn columns() -> &'static [(&'static str, SqlType)];
    /// One cell per column, in the same order.
    fn row(&self) -> Vec<SqlValue>;
}

/// Write a batch to a SQLite table, replacing the table if it already
/// exists. All rows go in a single transaction.
pub fn load_to_sqlite<T: TabularRecord>(
    records: &[T],
    table_name: &str,
    db_path: impl AsRef<Path>,
) -> Result<()> {
    let db_path = db_path.as_ref();
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    info!(
        rows = records.len(),
        table = table_name,
        db = %db_path.display(),
        "loading into SQLite"
    );

    let columns = T::columns();
    let column_ddl: Vec<String> = columns
        .iter()
        .map(|(name, ty)| format!("\"{}\" {}", name, ty.ddl()))
        .collect();
    let placeholders: Vec<String> = (1..=columns.len()).map(|i| format!("?{i}")).collect();

    let mut conn = Connection::open(db_path)?;
    conn.execute_batch(&format!(
        "DROP TABLE IF EXISTS \"{table_name}\";
         CREATE TABLE \"{table_name}\" ({});",
        column_ddl.join(", ")
    ))?;

    let tx = conn.transaction()?;
    {
        let mut stmt = tx.prepare(&format!(
            "INSERT INTO \"{table_name}\" VALUES ({})",
            placeholders.join(", ")
        ))?;
        for record in records {
            stmt.execute(rusqlite::params_from_iter(record.row()))?;
        }
    }
    tx.commit()?;

    info!(table = table_name, "table written");
    Ok(())
}

/// Write a batch to a CSV file, creating parent directories as needed.
/// Null cells render as empty fields.
pub fn load_to_csv<T: TabularRecord>(records: &[T], path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(T::columns().iter().map(|(name, _)| *name))?;
    for record in records {
        writer.write_record(record.row().iter().map(SqlValue::csv_field))?;
    }
    writer.flush()?;

    info!(path = %path.display(), rows = records.len(), "CSV written");
    Ok(())
}

/// Run a single-value SELECT against the database, for post-load
/// verification and ad-hoc counts.
pub fn query_scalar(db_path: impl AsRef<Path>, sql: &str) -> Result<f64> {
    let db_path = db_path.as_ref();
    if !db_path.exists() {
        return Err(EtlError::MissingInput(db_path.to_path_buf()));
    }
    let conn = Connection::open(db_path)?;
    let value: f64 = conn.query_row(sql, [], |row| row.get(0))?;
    Ok(value)
}

impl TabularRecord for MetricsRecord {
    fn columns() -> &'static [(&'static str, SqlType)] {
        &[
            ("transaction_id", SqlType::Text),
            ("date", SqlType::Text),
            ("product_id", SqlType::Text),
            ("quantity", SqlType::Integer),
            ("unit_price", SqlType::Real),
            ("customer_id", SqlType::Text),
            ("store_id", SqlType::Text),
            ("discount_pct", SqlType::Real),
            ("name", SqlType::Text),
            ("category", SqlType::Text),
            ("brand", SqlType::Text),
            ("cost_price", SqlType::Real),
            ("gross_revenue", SqlType::Real),
            ("discount_amount", SqlType::Real),
            ("net_revenue", SqlType::Real),
            ("cost_total", SqlType::Real),
            ("profit", SqlType::Real),
            ("profit_margin_pct", SqlType::Real),
        ]
    }

    fn row(&self) -> Vec<SqlValue> {
        let sale = &self.enriched.sale;
        vec![
            SqlValue::Text(sale.transaction_id.clone()),
            date_cell(sale.date),
            SqlValue::Text(sale.product_id.clone()),
            SqlValue::from_opt_i64(sale.quantity),
            SqlValue::from_opt_f64(sale.unit_price),
            SqlValue::Text(sale.customer_id.clone()),
            SqlValue::Text(sale.store_id.clone()),
            SqlValue::Real(sale.discount_pct),
            SqlValue::from_opt_text(self.enriched.product_name.as_deref()),
            SqlValue::from_opt_text(self.enriched.category.as_deref()),
            SqlValue::from_opt_text(self.enriched.brand.as_deref()),
            SqlValue::from_opt_f64(self.enriched.cost_price),
            SqlValue::from_opt_f64(self.gross_revenue),
            SqlValue::from_opt_f64(self.discount_amount),
            SqlValue::from_opt_f64(self.net_revenue),
            SqlValue::from_opt_f64(self.cost_total),
            SqlValue::from_opt_f64(self.profit),
            SqlValue::from_opt_f64(self.profit_margin_pct),
        ]
    }
}

impl TabularRecord for CleanProductRecord {
    fn columns() -> &'static [(&'static str, SqlType)] {
        &[
            ("product_id", SqlType::Text),
            ("name", SqlType::Text),
            ("category", SqlType::Text),
            ("brand", SqlType::Text),
            ("cost_price", SqlType::Real),
        ]
    }

    fn row(&self) -> Vec<SqlValue> {
        vec![
            SqlValue::Text(self.product_id.clone()),
            SqlValue::from_opt_text(self.name.as_deref()),
            SqlValue::from_opt_text(self.category.as_deref()),
            SqlValue::from_opt_text(self.brand.as_deref()),
            SqlValue::from_opt_f64(self.cost_price),
        ]
    }
}

impl TabularRecord for CategorySummary {
    fn columns() -> &'static [(&'static str, SqlType)] {
        &[
            ("category", SqlType::Text),
            ("total_transactions", SqlType::Integer),
            ("total_units_sold", SqlType::Integer),
            ("total_gross_revenue", SqlType::Real),
            ("total_net_revenue", SqlType::Real),
            ("total_profit", SqlType::Real),
        ]
    }

    fn row(&self) -> Vec<SqlValue> {
        vec![
            SqlValue::from_opt_text(self.category.as_deref()),
            SqlValue::Integer(self.total_transactions as i64),
            SqlValue::Integer(self.total_units_sold),
            SqlValue::Real(self.total_gross_revenue),
            SqlValue::Real(self.total_net_revenue),
            SqlValue::Real(self.total_profit),
        ]
    }
}

impl TabularRecord for StoreSummary {
    fn columns() -> &'static [(&'static str, SqlType)] {
        &[
            ("store_id", SqlType::Text),
            ("total_transactions", SqlType::Integer),
            ("total_units_sold", SqlType::Integer),
            ("total_net_revenue", SqlType::Real),
            ("total_profit", SqlType::Real),
            ("avg_profit_margin_pct", SqlType::Real),
        ]
    }

    fn row(&self) -> Vec<SqlValue> {
        vec![
            SqlValue::Text(self.store_id.clone()),
            SqlValue::Integer(self.total_transactions as i64),
            SqlValue::Integer(self.total_units_sold),
            SqlValue::Real(self.total_net_revenue),
            SqlValue::Real(self.total_profit),
            SqlValue::from_opt_f64(self.avg_profit_margin_pct),
        ]
    }
}

impl TabularRecord for DateSummary {
    fn columns() -> &'static [(&'static str, SqlType)] {
        &[
            ("date", SqlType::Text),
            ("total_transactions", SqlType::Integer),
            ("total_units_sold", SqlType::Integer),
            ("total_net_revenue", SqlType::Real),
            ("total_profit", SqlType::Real),
        ]
    }

    fn row(&self) -> Vec<SqlValue> {
        vec![
            date_cell(self.date),
            SqlValue::Integer(self.total_transactions as i64),
            SqlValue::Integer(self.total_units_sold),
            SqlValue::Real(self.total_net_revenue),
            SqlValue::Real(self.total_profit),
        ]
    }
}

fn date_cell(date: Option<chrono::NaiveDate>) -> SqlValue {
    match date {
        Some(d) => SqlValue::Text(d.format(SALES_DATE_FORMAT).to_string()),
        None => SqlValue::Null,
    }
}
