//! Behavior-driven tests for Warehouse behavior
//!
//! These tests verify how the warehouse stores source data, guards ad-hoc
//! SQL, and serves report tables, focusing on user-visible outcomes.

use std::fs;
use std::time::Duration;

use serde_json::Value;
use tempfile::{tempdir, TempDir};
use time::{Date, Month};
use tpch_warehouse::catalog::REGIONAL_SUMMARY;
use tpch_warehouse::{
    CellValue, OrderRecord, QueryGuardrails, ReportReader, SourceTable, Warehouse,
    WarehouseConfig, WarehouseError,
};

fn open_warehouse(temp: &TempDir) -> Warehouse {
    Warehouse::open(WarehouseConfig {
        db_path: temp.path().join("nested").join("warehouse.duckdb"),
        report_schema: String::from("analytics"),
        max_pool_size: 2,
    })
    .expect("warehouse open")
}

// =============================================================================
// Warehouse: Source Ingestion
// =============================================================================

#[test]
fn when_user_reingests_an_order_it_replaces_the_previous_row() {
    // Given: A warehouse with one order
    let temp = tempdir().expect("tempdir");
    let warehouse = open_warehouse(&temp);
    let first = OrderRecord {
        orderkey: 1,
        custkey: 10,
        order_date: Date::from_calendar_date(1994, Month::May, 1).expect("date"),
    };
    warehouse.ingest_orders(&[first.clone()]).expect("ingest");

    // When: The same order key is ingested with a new date
    let updated = OrderRecord {
        order_date: Date::from_calendar_date(1994, Month::June, 1).expect("date"),
        ..first
    };
    warehouse.ingest_orders(&[updated]).expect("re-ingest");

    // Then: One row remains, carrying the new date
    let result = warehouse
        .execute_query(
            "SELECT o_orderdate FROM orders",
            QueryGuardrails::default(),
            false,
        )
        .expect("query");
    assert_eq!(result.row_count, 1);
    assert_eq!(result.rows[0][0], Value::String("1994-06-01".to_string()));
}

#[test]
fn when_user_loads_a_csv_with_a_bad_row_nothing_is_imported() {
    // Given: An orders CSV whose second row has an unparseable date
    let temp = tempdir().expect("tempdir");
    let warehouse = open_warehouse(&temp);
    let csv = temp.path().join("orders.csv");
    fs::write(
        &csv,
        "o_orderkey,o_custkey,o_orderdate\n1,10,1996-01-02\n2,11,not-a-date\n",
    )
    .expect("write csv");

    // When: The CSV is imported
    let result = warehouse.import_csv(SourceTable::Orders, &csv);

    // Then: The import fails and the table stays empty
    assert!(result.is_err());
    let count = warehouse
        .execute_query(
            "SELECT COUNT(*) FROM orders",
            QueryGuardrails::default(),
            false,
        )
        .expect("count");
    assert_eq!(count.rows[0][0], Value::from(0));
}

// =============================================================================
// Warehouse: Guarded SQL
// =============================================================================

#[test]
fn read_only_mode_rejects_stacked_statements() {
    // Given: A warehouse
    let temp = tempdir().expect("tempdir");
    let warehouse = open_warehouse(&temp);

    // When: A select is followed by a destructive statement
    let error = warehouse
        .execute_query(
            "SELECT 1; DROP TABLE customer",
            QueryGuardrails::default(),
            false,
        )
        .expect_err("must reject");

    // Then: The query is rejected and the table survives
    assert!(matches!(error, WarehouseError::QueryRejected(_)));
    warehouse
        .execute_query("SELECT * FROM customer", QueryGuardrails::default(), false)
        .expect("customer table still exists");
}

#[test]
fn row_limits_truncate_large_results() {
    // Given: A warehouse
    let temp = tempdir().expect("tempdir");
    let warehouse = open_warehouse(&temp);

    // When: A query returns more rows than allowed
    let result = warehouse
        .execute_query(
            "SELECT * FROM range(100)",
            QueryGuardrails {
                max_rows: 10,
                query_timeout_ms: 5_000,
            },
            false,
        )
        .expect("query");

    // Then: Only the allowed rows come back, flagged as truncated
    assert_eq!(result.row_count, 10);
    assert!(result.truncated);
}

#[test]
fn zero_row_limit_is_rejected() {
    let temp = tempdir().expect("tempdir");
    let warehouse = open_warehouse(&temp);

    let error = warehouse
        .execute_query(
            "SELECT 1",
            QueryGuardrails {
                max_rows: 0,
                query_timeout_ms: 5_000,
            },
            false,
        )
        .expect_err("must reject");
    assert!(matches!(error, WarehouseError::QueryRejected(_)));
}

// =============================================================================
// Warehouse: Report Tables
// =============================================================================

#[test]
fn reports_live_in_the_configured_schema() {
    // Given: A warehouse configured with the `analytics` schema
    let temp = tempdir().expect("tempdir");
    let warehouse = open_warehouse(&temp);

    // When: A report table is written
    let write = warehouse
        .replace_table(
            &REGIONAL_SUMMARY,
            &[vec![
                CellValue::from("AMERICA"),
                CellValue::from(1_000.0),
                CellValue::from(3_i64),
                CellValue::from(7_i64),
                CellValue::Null,
            ]],
        )
        .expect("write");

    // Then: It is addressable by its qualified name
    assert_eq!(write.table, "analytics.regional_summary");
    let result = warehouse
        .execute_query(
            "SELECT avg_market_share FROM analytics.regional_summary",
            QueryGuardrails::default(),
            false,
        )
        .expect("query");
    assert_eq!(result.rows[0][0], Value::Null);
}

#[test]
fn report_reader_memoizes_until_cleared() {
    // Given: A written report and a reader with a long TTL
    let temp = tempdir().expect("tempdir");
    let warehouse = open_warehouse(&temp);
    let row = |revenue: f64| {
        vec![
            CellValue::from("EUROPE"),
            CellValue::from(revenue),
            CellValue::from(2_i64),
            CellValue::from(4_i64),
            CellValue::from(Some(100.0)),
        ]
    };
    warehouse
        .replace_table(&REGIONAL_SUMMARY, &[row(10.0)])
        .expect("first write");
    let reader = ReportReader::new(warehouse.clone(), Duration::from_secs(3600));
    let first = reader.load("regional_summary");

    // When: The table is overwritten behind the reader's back
    warehouse
        .replace_table(&REGIONAL_SUMMARY, &[row(20.0)])
        .expect("second write");

    // Then: The memo serves the old result until it is cleared
    let cached = reader.load("regional_summary");
    assert!(cached.cache_hit);
    assert_eq!(cached.result, first.result);

    reader.clear();
    let fresh = reader.load("regional_summary");
    assert!(!fresh.cache_hit);
    assert_eq!(fresh.result.rows[0][1], Value::from(20.0));
}
