use serde_json::Value;
use std::collections::HashMap;

/// A schema-less in-memory table straight out of extraction.
///
/// Column presence is not guaranteed and cell values are whatever the source
/// file contained: CSV cells arrive as strings (empty cell becomes null),
/// JSON values keep their native type. Validation and cleaning both interpret
/// cells through the coercion helpers below so the two stages agree on what
/// counts as null or numeric.
#[derive(Debug, Clone, Default)]
pub struct RawBatch {
    columns: Vec<String>,
    rows: Vec<HashMap<String, Value>>,
}

impl RawBatch {
    pub fn new(columns: Vec<String>, rows: Vec<HashMap<String, Value>>) -> Self {
        Self { columns, rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Column names in source order (CSV header order, or first-seen order
    /// for JSON input).
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c == name)
    }

    pub fn rows(&self) -> &[HashMap<String, Value>] {
        &self.rows
    }
}

/// Whether a cell is null: absent, JSON null, or a blank string.
pub fn is_null(cell: Option<&Value>) -> bool {
    match cell {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.trim().is_empty(),
        Some(_) => false,
    }
}

/// Coerce a cell to text. Scalars stringify; null cells and structured
/// values yield None.
pub fn as_text(cell: Option<&Value>) -> Option<String> {
    if is_null(cell) {
        return None;
    }
    match cell? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Coerce a cell to a float. Non-numeric text yields None rather than an
/// error, mirroring the "unparsable means missing" cleaning rule.
pub fn as_f64(cell: Option<&Value>) -> Option<f64> {
    match cell? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

/// Coerce a cell to an integer. Accepts floats with no fractional part
/// (a quantity of "3.0" is still 3 units); anything else is None.
pub fn as_i64(cell: Option<&Value>) -> Option<i64> {
    if let Some(Value::Number(n)) = cell {
        if let Some(i) = n.as_i64() {
            return Some(i);
        }
    }
    let f = as_f64(cell)?;
    if f.fract() == 0.0 && f >= i64::MIN as f64 && f <= i64::MAX as f64 {
        Some(f as i64)
    } else {
        None
    }
}
