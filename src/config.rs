use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{EtlError, Result};
use crate::pipeline::validate::ValidationConfig;

/// Run configuration, loaded from a TOML file. Every knob has a default so
/// the pipeline runs out of the box against the conventional data layout.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub paths: PathsConfig,
    pub validation: ValidationConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Raw sales transactions (CSV with a header row).
    pub sales_csv: PathBuf,
    /// Product catalogue (JSON array of objects).
    pub products_json: PathBuf,
    /// Directory for the processed CSV exports.
    pub processed_dir: PathBuf,
    /// SQLite database file (created if absent).
    pub database: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            sales_csv: PathBuf::from("data/raw/sales.csv"),
            products_json: PathBuf::from("data/raw/products.json"),
            processed_dir: PathBuf::from("data/processed"),
            database: PathBuf::from("database/retail.db"),
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            EtlError::Config(format!("Failed to read config file '{}': {}", path.display(), e))
        })?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load `path` if it exists, otherwise fall back to defaults. A present
    /// but malformed file is still an error; silently ignoring it would hide
    /// a misconfiguration.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            Ok(Self::default())
        }
    }
}
