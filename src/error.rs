use std::path::PathBuf;
use thiserror::Error;

/// Structural failures that abort a pipeline run. Data-quality defects
/// (nulls, duplicates, bad dates, unmatched joins) are never represented
/// here; those flow through validation outcomes and cleaning rules instead.
#[derive(Error, Debug)]
pub enum EtlError {
    #[error("input file not found: {0}")]
    MissingInput(PathBuf),

    #[error("CSV read failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON deserialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML deserialization failed: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{path}: expected a JSON array of objects, found {found}")]
    MalformedContainer { path: PathBuf, found: String },
}

pub type Result<T> = std::result::Result<T, EtlError>;
