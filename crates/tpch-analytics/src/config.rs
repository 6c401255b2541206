//! JSON configuration file for the pipeline.
//!
//! ```json
//! {
//!     "database": "/var/lib/tpch/warehouse.duckdb",
//!     "report_schema": "reports",
//!     "max_pool_size": 4,
//!     "cache_ttl_secs": 3600
//! }
//! ```
//!
//! Only `database` is required.

use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tpch_warehouse::{validate_identifier, WarehouseConfig};

/// Environment variable that overrides the configuration path.
pub const CONFIG_ENV: &str = "TPCH_CONFIG";

/// Path used when neither a flag nor [`CONFIG_ENV`] is set.
pub const DEFAULT_CONFIG_PATH: &str = "config.json";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("configuration file not found: {}", path.display())]
    Missing { path: PathBuf },

    #[error(
        "configuration file {} is not valid JSON: {source} (keys and strings must use double quotes)",
        path.display()
    )]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to read configuration file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid {field} '{value}': must be a plain SQL identifier")]
    InvalidIdentifier { field: &'static str, value: String },
}

/// Settings shared by the pipeline and the report reader.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AnalyticsConfig {
    /// Path to the `DuckDB` database file.
    pub database: PathBuf,
    #[serde(default = "default_report_schema")]
    pub report_schema: String,
    #[serde(default = "default_max_pool_size")]
    pub max_pool_size: usize,
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,
}

fn default_report_schema() -> String {
    String::from("reports")
}

const fn default_max_pool_size() -> usize {
    4
}

const fn default_cache_ttl_secs() -> u64 {
    3600
}

impl AnalyticsConfig {
    /// Resolve the configuration path: explicit path, then `TPCH_CONFIG`,
    /// then `config.json` in the working directory.
    #[must_use]
    pub fn resolve_path(explicit: Option<&Path>) -> PathBuf {
        if let Some(path) = explicit {
            return path.to_path_buf();
        }
        match env::var_os(CONFIG_ENV) {
            Some(path) if !path.is_empty() => PathBuf::from(path),
            _ => PathBuf::from(DEFAULT_CONFIG_PATH),
        }
    }

    /// Load and validate a configuration file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = match fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(error) if error.kind() == io::ErrorKind::NotFound => {
                return Err(ConfigError::Missing {
                    path: path.to_path_buf(),
                });
            }
            Err(source) => {
                return Err(ConfigError::Io {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };

        let config = Self::from_json(&raw).map_err(|source| ConfigError::Malformed {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        tracing::debug!(path = %path.display(), database = %config.database.display(), "configuration loaded");
        Ok(config)
    }

    fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        validate_identifier(&self.report_schema).map_err(|_| ConfigError::InvalidIdentifier {
            field: "report_schema",
            value: self.report_schema.clone(),
        })
    }

    #[must_use]
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    #[must_use]
    pub fn to_warehouse_config(&self) -> WarehouseConfig {
        WarehouseConfig {
            db_path: self.database.clone(),
            report_schema: self.report_schema.clone(),
            max_pool_size: self.max_pool_size,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_fill_optional_fields() {
        let config = AnalyticsConfig::from_json(r#"{"database": "w.duckdb"}"#).expect("parse");
        assert_eq!(config.report_schema, "reports");
        assert_eq!(config.max_pool_size, 4);
        assert_eq!(config.cache_ttl(), Duration::from_secs(3600));
    }

    #[test]
    fn single_quoted_json_is_malformed() {
        assert!(AnalyticsConfig::from_json("{'database': 'w.duckdb'}").is_err());
    }

    #[test]
    fn explicit_path_wins() {
        let path = AnalyticsConfig::resolve_path(Some(Path::new("/etc/tpch.json")));
        assert_eq!(path, PathBuf::from("/etc/tpch.json"));
    }
}
