//! # TPC-H Warehouse
//!
//! DuckDB-based storage layer for the tpch analytics pipeline.
//!
//! ## Overview
//!
//! This crate owns every interaction with the analytical database:
//!
//! - **Source tables**: `customer`, `orders`, `lineitem`, `part`, created by
//!   migrations and filled by parameterized ingestion or CSV import
//! - **Fact readers**: typed loads of customers, parts and order facts
//!   (orders joined to their line items)
//! - **Report tables**: full-overwrite writes into the report schema, one
//!   transaction per table
//! - **Guarded SQL**: row limits, timeouts and read-only enforcement for
//!   ad-hoc queries
//! - **Report reads**: TTL-memoized loads that degrade to an empty result
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use tpch_warehouse::{QueryGuardrails, Warehouse};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let warehouse = Warehouse::open_default()?;
//!
//!     let result = warehouse.execute_query(
//!         "SELECT c_region_name, COUNT(*) FROM customer GROUP BY 1",
//!         QueryGuardrails::default(),
//!         false,
//!     )?;
//!
//!     println!("Found {} rows", result.row_count);
//!     Ok(())
//! }
//! ```
//!
//! ## Tables
//!
//! | Table | Description |
//! |-------|-------------|
//! | `customer` | Customer dimension with nation/region names |
//! | `orders` | Order headers |
//! | `lineitem` | Order lines with revenue |
//! | `part` | Part dimension |
//! | `<report_schema>.*` | Report tables listed in [`catalog::REPORT_TABLES`] |

pub mod catalog;
pub mod duckdb;
pub mod migrations;
pub mod models;
pub mod reader;

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use ::duckdb::types::Value as DuckValue;
use ::duckdb::Connection;
use ::duckdb::ToSql;
use serde::Serialize;
use serde_json::{Number, Value};
use thiserror::Error;
use time::Date;
use tracing::{debug, info, info_span};

pub use catalog::{find_report_table, ColumnSpec, TableSpec, REPORT_TABLES};
pub use crate::duckdb::{ConnectionPool, PooledConnection};
pub use models::{
    format_date, parse_date, CellValue, CustomerRecord, LineItemRecord, OrderFact, OrderRecord,
    PartRecord,
};
pub use reader::{ReportLoad, ReportReader, DEFAULT_REPORT_TIMEOUT, DEFAULT_REPORT_TTL};

/// Julian day number of 1970-01-01, used to decode `DATE` values.
const UNIX_EPOCH_JULIAN_DAY: i32 = 2_440_588;

/// Errors that can occur during warehouse operations.
#[derive(Debug, Error)]
pub enum WarehouseError {
    /// `DuckDB` database error.
    #[error(transparent)]
    DuckDb(#[from] ::duckdb::Error),

    /// I/O error (file system operations).
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Query was rejected due to policy violation.
    #[error("query rejected: {0}")]
    QueryRejected(String),

    /// Query execution timed out.
    #[error("query timed out after {timeout_ms}ms")]
    QueryTimeout { timeout_ms: u64 },

    /// A stored or supplied value could not be interpreted.
    #[error("invalid value in {context}: {message}")]
    InvalidValue { context: String, message: String },
}

/// Configuration for the warehouse database.
#[derive(Debug, Clone)]
pub struct WarehouseConfig {
    /// Path to the `DuckDB` database file.
    pub db_path: PathBuf,
    /// Schema that receives the report tables.
    pub report_schema: String,
    /// Maximum number of idle connections kept in the pool.
    pub max_pool_size: usize,
}

impl Default for WarehouseConfig {
    fn default() -> Self {
        Self {
            db_path: resolve_tpch_home().join("warehouse.duckdb"),
            report_schema: String::from("reports"),
            max_pool_size: 4,
        }
    }
}

/// Guardrails for query execution to prevent resource exhaustion.
#[derive(Debug, Clone, Copy)]
pub struct QueryGuardrails {
    /// Maximum number of rows to return.
    pub max_rows: usize,
    /// Query timeout in milliseconds.
    pub query_timeout_ms: u64,
}

impl Default for QueryGuardrails {
    fn default() -> Self {
        Self {
            max_rows: 10_000,
            query_timeout_ms: 5_000,
        }
    }
}

impl QueryGuardrails {
    fn timeout(self) -> Duration {
        Duration::from_millis(self.query_timeout_ms.max(1))
    }

    fn validate(self) -> Result<(), WarehouseError> {
        if self.max_rows == 0 {
            return Err(WarehouseError::QueryRejected(String::from(
                "--max-rows must be greater than zero",
            )));
        }
        if self.query_timeout_ms == 0 {
            return Err(WarehouseError::QueryRejected(String::from(
                "--query-timeout-ms must be greater than zero",
            )));
        }
        Ok(())
    }
}

/// Column metadata for query results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SqlColumn {
    /// Column name.
    pub name: String,
    /// Column data type.
    #[serde(rename = "type")]
    pub r#type: String,
}

/// Result of a SQL query execution.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryResult {
    /// Column definitions.
    pub columns: Vec<SqlColumn>,
    /// Row data as JSON values.
    pub rows: Vec<Vec<Value>>,
    /// Number of rows returned.
    pub row_count: usize,
    /// Whether results were truncated due to max_rows limit.
    pub truncated: bool,
}

impl QueryResult {
    /// A result with no columns and no rows.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            columns: Vec::new(),
            rows: Vec::new(),
            row_count: 0,
            truncated: false,
        }
    }
}

/// Source tables accepted by [`Warehouse::import_csv`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceTable {
    Customer,
    Orders,
    Lineitem,
    Part,
}

impl SourceTable {
    pub const ALL: [Self; 4] = [Self::Customer, Self::Orders, Self::Lineitem, Self::Part];

    #[must_use]
    pub const fn table_name(self) -> &'static str {
        match self {
            Self::Customer => "customer",
            Self::Orders => "orders",
            Self::Lineitem => "lineitem",
            Self::Part => "part",
        }
    }

    /// Parse a table name such as `orders` or `LINEITEM`.
    pub fn parse(value: &str) -> Result<Self, WarehouseError> {
        let normalized = value.trim();
        Self::ALL
            .into_iter()
            .find(|table| table.table_name().eq_ignore_ascii_case(normalized))
            .ok_or_else(|| {
                WarehouseError::QueryRejected(format!(
                    "unknown source table '{normalized}', expected one of customer, orders, lineitem, part"
                ))
            })
    }
}

/// Outcome of bulk-loading a CSV file into a source table.
#[derive(Debug, Clone, Serialize)]
pub struct ImportReport {
    pub table: SourceTable,
    pub path: PathBuf,
    pub rows_before: i64,
    pub rows_after: i64,
}

/// Outcome of one full-overwrite report write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableWrite {
    /// Fully qualified table name.
    pub table: String,
    pub rows_written: usize,
}

/// The main warehouse interface.
#[derive(Clone)]
pub struct Warehouse {
    config: WarehouseConfig,
    pool: ConnectionPool,
}

impl Warehouse {
    /// Open a warehouse with default configuration.
    pub fn open_default() -> Result<Self, WarehouseError> {
        Self::open(WarehouseConfig::default())
    }

    /// Open a warehouse with the specified configuration.
    pub fn open(config: WarehouseConfig) -> Result<Self, WarehouseError> {
        validate_identifier(&config.report_schema)?;
        if let Some(parent) = config.db_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let pool = ConnectionPool::open(config.db_path.clone(), config.max_pool_size)?;
        let warehouse = Self { config, pool };
        warehouse.initialize()?;
        Ok(warehouse)
    }

    /// Apply migrations and make sure the report schema exists.
    pub fn initialize(&self) -> Result<(), WarehouseError> {
        let connection = self.pool.acquire()?;
        migrations::apply_migrations(&connection)?;
        connection.execute_batch(&format!(
            "CREATE SCHEMA IF NOT EXISTS {};",
            self.config.report_schema
        ))?;
        Ok(())
    }

    /// Get the path to the database file.
    pub fn db_path(&self) -> &Path {
        self.pool.db_path()
    }

    /// Schema that holds the report tables.
    pub fn report_schema(&self) -> &str {
        self.config.report_schema.as_str()
    }

    /// Execute a SQL query with guardrails.
    ///
    /// # Security
    /// This method enforces read-only mode unless `allow_write` is true.
    pub fn execute_query(
        &self,
        sql: &str,
        guardrails: QueryGuardrails,
        allow_write: bool,
    ) -> Result<QueryResult, WarehouseError> {
        guardrails.validate()?;
        let sql = normalize_sql(sql)?;

        if !allow_write {
            enforce_read_only_query(sql)?;
        }

        let connection = self.pool.acquire()?;
        execute_with_guardrails(&connection, sql, guardrails, allow_write)
    }

    /// Insert or replace customers in one transaction.
    pub fn ingest_customers(&self, rows: &[CustomerRecord]) -> Result<usize, WarehouseError> {
        self.ingest(
            "INSERT OR REPLACE INTO customer \
             (c_custkey, c_name, c_nation_name, c_region_name, c_mktsegment) \
             VALUES (?, ?, ?, ?, ?)",
            rows,
            |row| {
                vec![
                    row.custkey.into(),
                    row.name.as_str().into(),
                    row.nation.as_str().into(),
                    row.region.as_str().into(),
                    row.market_segment.as_str().into(),
                ]
            },
        )
    }

    /// Insert or replace order headers in one transaction.
    pub fn ingest_orders(&self, rows: &[OrderRecord]) -> Result<usize, WarehouseError> {
        self.ingest(
            "INSERT OR REPLACE INTO orders (o_orderkey, o_custkey, o_orderdate) \
             VALUES (?, ?, CAST(? AS DATE))",
            rows,
            |row| {
                vec![
                    row.orderkey.into(),
                    row.custkey.into(),
                    row.order_date.into(),
                ]
            },
        )
    }

    /// Insert or replace line items in one transaction.
    pub fn ingest_lineitems(&self, rows: &[LineItemRecord]) -> Result<usize, WarehouseError> {
        self.ingest(
            "INSERT OR REPLACE INTO lineitem \
             (l_orderkey, l_linenumber, l_partkey, l_quantity, l_extendedprice, l_discount, l_total_amount) \
             VALUES (?, ?, ?, ?, ?, ?, ?)",
            rows,
            |row| {
                vec![
                    row.orderkey.into(),
                    i64::from(row.linenumber).into(),
                    row.partkey.into(),
                    row.quantity.into(),
                    row.extended_price.into(),
                    row.discount.into(),
                    row.total_amount.into(),
                ]
            },
        )
    }

    /// Insert or replace parts in one transaction.
    pub fn ingest_parts(&self, rows: &[PartRecord]) -> Result<usize, WarehouseError> {
        self.ingest(
            "INSERT OR REPLACE INTO part \
             (p_partkey, p_name, p_mfgr, p_brand, p_type, p_type_category) \
             VALUES (?, ?, ?, ?, ?, ?)",
            rows,
            |row| {
                vec![
                    row.partkey.into(),
                    row.name.as_str().into(),
                    row.mfgr.as_str().into(),
                    row.brand.as_str().into(),
                    row.part_type.as_str().into(),
                    row.type_category.as_str().into(),
                ]
            },
        )
    }

    /// Bulk-load a CSV file (with header row) into a source table.
    ///
    /// Columns are matched by name, so the file must use the source column
    /// names (`c_custkey`, `o_orderdate`, ...).
    pub fn import_csv(&self, table: SourceTable, path: &Path) -> Result<ImportReport, WarehouseError> {
        if !path.is_file() {
            return Err(WarehouseError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("csv file not found: {}", path.display()),
            )));
        }

        let _span = info_span!("import_csv", table = table.table_name()).entered();
        let connection = self.pool.acquire()?;
        let rows_before = count_rows(&connection, table.table_name())?;

        // The path is escaped because table functions do not take parameters.
        let sql = format!(
            "INSERT OR REPLACE INTO {table} BY NAME SELECT * FROM read_csv_auto('{path}', header = true)",
            table = table.table_name(),
            path = escape_sql_string(path_to_sql(path).as_str()),
        );
        connection.execute_batch("BEGIN TRANSACTION")?;
        let result = connection
            .execute_batch(sql.as_str())
            .map_err(WarehouseError::from);
        finalize_transaction(&connection, result)?;

        let rows_after = count_rows(&connection, table.table_name())?;
        info!(rows_before, rows_after, path = %path.display(), "csv imported");

        Ok(ImportReport {
            table,
            path: path.to_path_buf(),
            rows_before,
            rows_after,
        })
    }

    /// Load the customer dimension ordered by customer key.
    pub fn load_customers(&self) -> Result<Vec<CustomerRecord>, WarehouseError> {
        let connection = self.pool.acquire()?;
        let mut statement = connection.prepare(
            "SELECT c_custkey, c_name, c_nation_name, c_region_name, c_mktsegment \
             FROM customer ORDER BY c_custkey",
        )?;
        let rows = statement.query_map([], |row| {
            Ok(CustomerRecord {
                custkey: row.get(0)?,
                name: row.get(1)?,
                nation: row.get(2)?,
                region: row.get(3)?,
                market_segment: row.get(4)?,
            })
        })?;
        let customers = rows.collect::<Result<Vec<_>, _>>()?;
        debug!(count = customers.len(), "loaded customers");
        Ok(customers)
    }

    /// Load the part dimension ordered by part key.
    pub fn load_parts(&self) -> Result<Vec<PartRecord>, WarehouseError> {
        let connection = self.pool.acquire()?;
        let mut statement = connection.prepare(
            "SELECT p_partkey, p_name, p_mfgr, p_brand, p_type, p_type_category \
             FROM part ORDER BY p_partkey",
        )?;
        let rows = statement.query_map([], |row| {
            Ok(PartRecord {
                partkey: row.get(0)?,
                name: row.get(1)?,
                mfgr: row.get(2)?,
                brand: row.get(3)?,
                part_type: row.get(4)?,
                type_category: row.get(5)?,
            })
        })?;
        let parts = rows.collect::<Result<Vec<_>, _>>()?;
        debug!(count = parts.len(), "loaded parts");
        Ok(parts)
    }

    /// Load orders joined to their line items.
    ///
    /// Orders without line items do not produce facts.
    pub fn load_order_facts(&self) -> Result<Vec<OrderFact>, WarehouseError> {
        let connection = self.pool.acquire()?;
        let mut statement = connection.prepare(
            "SELECT o.o_orderkey, o.o_custkey, CAST(o.o_orderdate AS VARCHAR), l.l_partkey, \
                    l.l_quantity, l.l_extendedprice, l.l_discount, l.l_total_amount \
             FROM orders o \
             JOIN lineitem l ON o.o_orderkey = l.l_orderkey \
             ORDER BY o.o_orderkey, l.l_linenumber",
        )?;
        let rows = statement.query_map([], |row| {
            let order_date: String = row.get(2)?;
            Ok((
                order_date,
                OrderFact {
                    orderkey: row.get(0)?,
                    custkey: row.get(1)?,
                    order_date: Date::MIN,
                    partkey: row.get(3)?,
                    quantity: row.get(4)?,
                    extended_price: row.get(5)?,
                    discount: row.get(6)?,
                    total_amount: row.get(7)?,
                },
            ))
        })?;

        let mut facts = Vec::new();
        for row in rows {
            let (order_date, mut fact) = row?;
            fact.order_date =
                parse_date(&order_date).map_err(|error| WarehouseError::InvalidValue {
                    context: format!("orders.o_orderdate for order {}", fact.orderkey),
                    message: error.to_string(),
                })?;
            facts.push(fact);
        }
        debug!(count = facts.len(), "loaded order facts");
        Ok(facts)
    }

    /// Replace a report table with `rows`.
    ///
    /// The table is dropped and recreated inside one transaction, so readers
    /// see either the previous contents or the complete new contents.
    pub fn replace_table(
        &self,
        spec: &TableSpec,
        rows: &[Vec<CellValue>],
    ) -> Result<TableWrite, WarehouseError> {
        validate_identifier(spec.name)?;
        for column in spec.columns {
            validate_identifier(column.name)?;
        }

        let qualified = format!("{}.{}", self.config.report_schema, spec.name);
        let _span = info_span!("replace_table", table = %qualified).entered();
        let connection = self.pool.acquire()?;

        connection.execute_batch("BEGIN TRANSACTION")?;
        let result = (|| -> Result<usize, WarehouseError> {
            connection.execute_batch(&format!(
                "CREATE OR REPLACE TABLE {qualified} ({});",
                spec.column_definitions()
            ))?;

            let insert_sql = format!(
                "INSERT INTO {qualified} ({}) VALUES ({})",
                spec.column_list(),
                spec.placeholders()
            );
            let mut statement = connection.prepare(insert_sql.as_str())?;
            for (index, row) in rows.iter().enumerate() {
                if row.len() != spec.columns.len() {
                    return Err(WarehouseError::InvalidValue {
                        context: format!("{qualified} row {index}"),
                        message: format!(
                            "expected {} values, got {}",
                            spec.columns.len(),
                            row.len()
                        ),
                    });
                }
                let params: Vec<&dyn ToSql> = row.iter().map(|cell| cell as &dyn ToSql).collect();
                statement.execute(params.as_slice())?;
            }

            Ok(rows.len())
        })();

        let rows_written = finalize_transaction(&connection, result)?;
        info!(rows_written, "report table replaced");
        Ok(TableWrite {
            table: qualified,
            rows_written,
        })
    }

    /// Read a report table in its catalog order.
    pub fn read_report(
        &self,
        spec: &TableSpec,
        guardrails: QueryGuardrails,
    ) -> Result<QueryResult, WarehouseError> {
        guardrails.validate()?;
        validate_identifier(spec.name)?;
        let sql = format!(
            "SELECT {} FROM {}.{} ORDER BY {}",
            spec.column_list(),
            self.config.report_schema,
            spec.name,
            spec.order_by
        );
        let connection = self.pool.acquire()?;
        execute_select_query(&connection, sql.as_str(), guardrails, Instant::now())
    }

    fn ingest<T>(
        &self,
        sql: &str,
        rows: &[T],
        bind: impl Fn(&T) -> Vec<CellValue>,
    ) -> Result<usize, WarehouseError> {
        if rows.is_empty() {
            return Ok(0);
        }

        let connection = self.pool.acquire()?;
        connection.execute_batch("BEGIN TRANSACTION")?;
        let result = (|| -> Result<usize, WarehouseError> {
            let mut statement = connection.prepare(sql)?;
            for row in rows {
                // SECURITY: every value is bound as a parameter
                let cells = bind(row);
                let params: Vec<&dyn ToSql> =
                    cells.iter().map(|cell| cell as &dyn ToSql).collect();
                statement.execute(params.as_slice())?;
            }
            Ok(rows.len())
        })();

        finalize_transaction(&connection, result)
    }
}

/// Finalize a transaction, committing on success or rolling back on failure.
fn finalize_transaction<T>(
    connection: &Connection,
    result: Result<T, WarehouseError>,
) -> Result<T, WarehouseError> {
    match result {
        Ok(value) => {
            connection.execute_batch("COMMIT")?;
            Ok(value)
        }
        Err(error) => {
            let _ = connection.execute_batch("ROLLBACK");
            Err(error)
        }
    }
}

fn count_rows(connection: &Connection, table: &str) -> Result<i64, WarehouseError> {
    let sql = format!("SELECT COUNT(*) FROM {table}");
    Ok(connection.query_row(sql.as_str(), [], |row| row.get(0))?)
}

/// Execute a query with guardrails (timeout, row limits).
fn execute_with_guardrails(
    connection: &Connection,
    sql: &str,
    guardrails: QueryGuardrails,
    allow_write: bool,
) -> Result<QueryResult, WarehouseError> {
    let started = Instant::now();
    if is_select_like(sql) {
        execute_select_query(connection, sql, guardrails, started)
    } else if allow_write {
        connection.execute_batch(sql)?;
        ensure_timeout(started, guardrails.timeout())?;
        Ok(QueryResult::empty())
    } else {
        Err(WarehouseError::QueryRejected(String::from(
            "only SELECT/CTE queries are allowed unless --write is provided",
        )))
    }
}

/// Execute a SELECT query and collect results.
fn execute_select_query(
    connection: &Connection,
    sql: &str,
    guardrails: QueryGuardrails,
    started: Instant,
) -> Result<QueryResult, WarehouseError> {
    let mut statement = connection.prepare(sql)?;
    // Column metadata is only available once the statement has executed.
    let _ = statement.query([] as [&dyn ToSql; 0])?;

    let column_count = statement.column_count();
    let mut columns = Vec::with_capacity(column_count);
    for index in 0..column_count {
        let name = statement
            .column_name(index)
            .map(ToString::to_string)
            .unwrap_or_else(|_| format!("column_{index}"));
        columns.push(SqlColumn {
            name,
            r#type: statement.column_type(index).to_string(),
        });
    }

    let mut rows_cursor = statement.query([] as [&dyn ToSql; 0])?;
    let mut rows = Vec::new();
    let mut truncated = false;
    while let Some(row) = rows_cursor.next()? {
        ensure_timeout(started, guardrails.timeout())?;

        if rows.len() >= guardrails.max_rows {
            truncated = true;
            break;
        }

        rows.push(read_row(row, column_count)?);
    }

    ensure_timeout(started, guardrails.timeout())?;

    Ok(QueryResult {
        columns,
        row_count: rows.len(),
        rows,
        truncated,
    })
}

fn read_row(row: &::duckdb::Row<'_>, column_count: usize) -> Result<Vec<Value>, ::duckdb::Error> {
    let mut output = Vec::with_capacity(column_count);
    for index in 0..column_count {
        let value: DuckValue = row.get(index)?;
        output.push(to_json_value(value));
    }
    Ok(output)
}

/// Convert a DuckDB value to a JSON value.
fn to_json_value(value: DuckValue) -> Value {
    match value {
        DuckValue::Null => Value::Null,
        DuckValue::Boolean(value) => Value::Bool(value),
        DuckValue::TinyInt(value) => Value::Number(Number::from(value)),
        DuckValue::SmallInt(value) => Value::Number(Number::from(value)),
        DuckValue::Int(value) => Value::Number(Number::from(value)),
        DuckValue::BigInt(value) => Value::Number(Number::from(value)),
        DuckValue::UTinyInt(value) => Value::Number(Number::from(value)),
        DuckValue::USmallInt(value) => Value::Number(Number::from(value)),
        DuckValue::UInt(value) => Value::Number(Number::from(value)),
        DuckValue::UBigInt(value) => Value::Number(Number::from(value)),
        DuckValue::Float(value) => number_from_f64(f64::from(value)),
        DuckValue::Double(value) => number_from_f64(value),
        DuckValue::Text(value) => Value::String(value),
        DuckValue::Blob(value) => Value::String(hex::encode(value)),
        DuckValue::Date32(days) => date_from_epoch_days(days)
            .map(|date| Value::String(format_date(date)))
            .unwrap_or(Value::Null),
        other => Value::String(format!("{other:?}")),
    }
}

fn date_from_epoch_days(days: i32) -> Option<Date> {
    Date::from_julian_day(UNIX_EPOCH_JULIAN_DAY.checked_add(days)?).ok()
}

/// Convert an f64 to a JSON number, returning Null for NaN/Inf.
fn number_from_f64(value: f64) -> Value {
    Number::from_f64(value)
        .map(Value::Number)
        .unwrap_or(Value::Null)
}

fn normalize_sql(sql: &str) -> Result<&str, WarehouseError> {
    let normalized = sql.trim();
    if normalized.is_empty() {
        return Err(WarehouseError::QueryRejected(String::from(
            "query must not be empty",
        )));
    }
    Ok(normalized.trim_end_matches(';').trim())
}

fn enforce_read_only_query(sql: &str) -> Result<(), WarehouseError> {
    if !is_select_like(sql) {
        return Err(WarehouseError::QueryRejected(String::from(
            "read-only mode accepts only SELECT/CTE queries; use --write for write statements",
        )));
    }
    if has_multiple_statements(sql) {
        return Err(WarehouseError::QueryRejected(String::from(
            "multiple SQL statements are not allowed in read-only mode",
        )));
    }
    Ok(())
}

fn is_select_like(sql: &str) -> bool {
    let first_keyword = sql
        .split_whitespace()
        .next()
        .unwrap_or_default()
        .to_ascii_uppercase();
    matches!(
        first_keyword.as_str(),
        "SELECT" | "WITH" | "EXPLAIN" | "SHOW" | "DESCRIBE"
    )
}

fn has_multiple_statements(sql: &str) -> bool {
    sql.split(';')
        .filter(|part| !part.trim().is_empty())
        .count()
        > 1
}

fn ensure_timeout(started: Instant, timeout: Duration) -> Result<(), WarehouseError> {
    if started.elapsed() > timeout {
        return Err(WarehouseError::QueryTimeout {
            timeout_ms: timeout.as_millis().min(u128::from(u64::MAX)) as u64,
        });
    }
    Ok(())
}

/// Check that `value` is a plain SQL identifier (`[A-Za-z_][A-Za-z0-9_]*`).
pub fn validate_identifier(value: &str) -> Result<(), WarehouseError> {
    let mut chars = value.chars();
    let valid_start = chars
        .next()
        .is_some_and(|ch| ch.is_ascii_alphabetic() || ch == '_');
    if valid_start && chars.all(|ch| ch.is_ascii_alphanumeric() || ch == '_') {
        return Ok(());
    }
    Err(WarehouseError::QueryRejected(format!(
        "'{value}' is not a valid SQL identifier"
    )))
}

/// Resolve the tpch home directory from environment or default.
fn resolve_tpch_home() -> PathBuf {
    if let Some(path) = env::var_os("TPCH_HOME") {
        let path = PathBuf::from(path);
        if !path.as_os_str().is_empty() {
            return path;
        }
    }

    if let Some(home) = env::var_os("HOME") {
        return PathBuf::from(home).join(".tpch");
    }

    PathBuf::from(".tpch")
}

fn path_to_sql(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

/// Escape a string for inclusion in a SQL literal.
///
/// Only used for file paths handed to table functions.
fn escape_sql_string(value: &str) -> String {
    value.replace('\'', "''")
}
