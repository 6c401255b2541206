//! Behavior-driven tests for configuration loading
//!
//! Configuration problems are fatal: the pipeline must not start without a
//! readable, well-formed file.

use std::fs;
use std::path::Path;

use tempfile::tempdir;
use tpch_analytics::{AnalyticsConfig, ConfigError, Warehouse, CONFIG_ENV};

#[test]
fn missing_configuration_is_reported_with_its_path() {
    // Given: A path with no file
    let temp = tempdir().expect("tempdir");
    let path = temp.path().join("config.json");

    // When: The configuration is loaded
    let error = AnalyticsConfig::load(&path).expect_err("must fail");

    // Then: The error names the missing file
    assert!(matches!(error, ConfigError::Missing { .. }));
    assert!(error.to_string().contains("config.json"));
}

#[test]
fn malformed_configuration_suggests_double_quotes() {
    // Given: A file written with single quotes
    let temp = tempdir().expect("tempdir");
    let path = temp.path().join("config.json");
    fs::write(&path, "{'database': 'warehouse.duckdb'}").expect("write");

    // When: The configuration is loaded
    let error = AnalyticsConfig::load(&path).expect_err("must fail");

    // Then: The diagnostic carries the quoting hint
    assert!(matches!(error, ConfigError::Malformed { .. }));
    assert!(error.to_string().contains("double quotes"));
}

#[test]
fn unsafe_report_schema_is_rejected() {
    let temp = tempdir().expect("tempdir");
    let path = temp.path().join("config.json");
    fs::write(
        &path,
        r#"{"database": "w.duckdb", "report_schema": "reports; DROP TABLE orders"}"#,
    )
    .expect("write");

    let error = AnalyticsConfig::load(&path).expect_err("must fail");
    assert!(matches!(error, ConfigError::InvalidIdentifier { .. }));
}

#[test]
fn unknown_keys_are_malformed() {
    let temp = tempdir().expect("tempdir");
    let path = temp.path().join("config.json");
    fs::write(&path, r#"{"database": "w.duckdb", "password": "hunter2"}"#).expect("write");

    assert!(matches!(
        AnalyticsConfig::load(&path),
        Err(ConfigError::Malformed { .. })
    ));
}

#[test]
fn valid_configuration_opens_a_warehouse() {
    // Given: A minimal configuration pointing into a scratch directory
    let temp = tempdir().expect("tempdir");
    let path = temp.path().join("config.json");
    let database = temp.path().join("data").join("warehouse.duckdb");
    fs::write(
        &path,
        serde_json::json!({ "database": database, "cache_ttl_secs": 60 }).to_string(),
    )
    .expect("write");

    // When: It is loaded and used to open the warehouse
    let config = AnalyticsConfig::load(&path).expect("load");
    let warehouse = Warehouse::open(config.to_warehouse_config()).expect("open");

    // Then: Defaults apply and the database file exists
    assert_eq!(config.report_schema, "reports");
    assert_eq!(config.cache_ttl().as_secs(), 60);
    assert_eq!(warehouse.db_path(), database.as_path());
    assert!(database.exists());
}

#[test]
fn environment_variable_overrides_default_path() {
    std::env::set_var(CONFIG_ENV, "/srv/tpch/config.json");
    let resolved = AnalyticsConfig::resolve_path(None);
    std::env::remove_var(CONFIG_ENV);

    assert_eq!(resolved, Path::new("/srv/tpch/config.json"));
}
