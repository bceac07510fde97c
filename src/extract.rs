//! Extract stage: read raw source files into schema-less [`RawBatch`]es.
//!
//! Only container-level problems are errors here (missing file, unreadable
//! CSV, top-level JSON that is not an array). Dirty cell values travel
//! through untouched for the validator to report on and the cleaner to fix.

use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;
use tracing::info;

use crate::batch::RawBatch;
use crate::error::{EtlError, Result};

/// Read a CSV file with a header row. Empty cells become nulls; everything
/// else stays a string for later coercion.
pub fn extract_csv(path: impl AsRef<Path>) -> Result<RawBatch> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(EtlError::MissingInput(path.to_path_buf()));
    }

    info!(path = %path.display(), "extracting CSV");
    let mut reader = csv::Reader::from_path(path)?;
    let columns: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        let mut row = HashMap::with_capacity(columns.len());
        for (column, cell) in columns.iter().zip(record.iter()) {
            let value = if cell.is_empty() {
                Value::Null
            } else {
                Value::String(cell.to_string())
            };
            row.insert(column.clone(), value);
        }
        rows.push(row);
    }

    info!(rows = rows.len(), columns = columns.len(), "loaded CSV");
    Ok(RawBatch::new(columns, rows))
}

/// Read a JSON file containing an array of objects, e.g.
/// `[{"id": 1, "name": "Alice"}, {"id": 2, "name": "Bob"}]`.
/// Anything else at the top level is a structural error.
pub fn extract_json(path: impl AsRef<Path>) -> Result<RawBatch> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(EtlError::MissingInput(path.to_path_buf()));
    }

    info!(path = %path.display(), "extracting JSON");
    let content = std::fs::read_to_string(path)?;
    let parsed: Value = serde_json::from_str(&content)?;

    let Value::Array(entries) = parsed else {
        return Err(EtlError::MalformedContainer {
            path: path.to_path_buf(),
            found: json_type_name(&parsed).to_string(),
        });
    };

    let mut columns: Vec<String> = Vec::new();
    let mut rows = Vec::with_capacity(entries.len());
    for entry in entries {
        let Value::Object(fields) = entry else {
            return Err(EtlError::MalformedContainer {
                path: path.to_path_buf(),
                found: format!("array element of type {}", json_type_name(&entry)),
            });
        };
        let mut row = HashMap::with_capacity(fields.len());
        for (key, value) in fields {
            if !columns.iter().any(|c| *c == key) {
                columns.push(key.clone());
            }
            row.insert(key, value);
        }
        rows.push(row);
    }

    info!(rows = rows.len(), columns = columns.len(), "loaded JSON");
    Ok(RawBatch::new(columns, rows))
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn csv_reads_rows_and_headers() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.csv");
        std::fs::write(&path, "a,b,c\n1,2,3\n4,,6\n").unwrap();

        let batch = extract_csv(&path).unwrap();
        assert_eq!(batch.len(), 2);
        assert_eq!(batch.columns(), ["a", "b", "c"]);
        // Empty cell becomes null
        assert_eq!(batch.rows()[1].get("b"), Some(&Value::Null));
    }

    #[test]
    fn csv_missing_file_is_a_structural_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = extract_csv(dir.path().join("no_such_file.csv")).unwrap_err();
        assert!(matches!(err, EtlError::MissingInput(_)));
    }

    #[test]
    fn json_reads_list_of_objects() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.json");
        let mut f = std::fs::File::create(&path).unwrap();
        write!(f, r#"[{{"id": 1, "val": "x"}}, {{"id": 2, "val": "y"}}]"#).unwrap();

        let batch = extract_json(&path).unwrap();
        assert_eq!(batch.len(), 2);
        assert!(batch.has_column("id"));
        assert!(batch.has_column("val"));
    }

    #[test]
    fn json_non_array_is_a_structural_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, r#"{"key": "value"}"#).unwrap();

        let err = extract_json(&path).unwrap_err();
        match err {
            EtlError::MalformedContainer { found, .. } => assert_eq!(found, "object"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn json_missing_file_is_a_structural_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = extract_json(dir.path().join("missing.json")).unwrap_err();
        assert!(matches!(err, EtlError::MissingInput(_)));
    }
}
