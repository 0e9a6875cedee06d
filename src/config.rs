//! `dataSource.json` configuration loading (spec §6.2).
//!
//! Parsed with `serde`/`serde_json` the way the teacher's JSON-schema
//! config types are (`src/json_schema.rs`, `src/redactor/config.rs`).
//! Unknown keys are ignored — no `deny_unknown_fields` — so operators can
//! keep fields used by sibling tooling in the same file.

use crate::error::SliceError;
use serde::Deserialize;
use std::path::Path;

/// Source database connection parameters (spec §6.2).
#[derive(Debug, Clone, Deserialize)]
pub struct DataSourceConfig {
    pub host: String,
    pub port: u16,
    #[serde(rename = "dbName")]
    pub db_name: String,
    pub username: String,
    pub password: String,
    #[serde(rename = "sslEnabled", default)]
    pub ssl_enabled: bool,
}

/// Load and parse `dataSource.json` from `path`.
///
/// A missing file or malformed JSON is a fatal config error per spec §7.
pub fn load(path: &Path) -> Result<DataSourceConfig, SliceError> {
    let contents = std::fs::read_to_string(path).map_err(|e| {
        SliceError::Config(format!("could not read {}: {e}", path.display()))
    })?;

    serde_json::from_str(&contents)
        .map_err(|e| SliceError::Config(format!("could not parse {}: {e}", path.display())))
}
