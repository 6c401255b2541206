//! Source records and report cell values.

use ::duckdb::types::{ToSqlOutput, Value as DuckValue};
use ::duckdb::ToSql;
use serde::{Deserialize, Serialize};
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;
use time::Date;

/// Format used for every `DATE` exchanged with the warehouse as text.
pub const DATE_FORMAT: &[BorrowedFormatItem<'static>] =
    format_description!("[year]-[month]-[day]");

/// A customer dimension row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerRecord {
    pub custkey: i64,
    pub name: String,
    pub nation: String,
    pub region: String,
    pub market_segment: String,
}

/// An order header row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderRecord {
    pub orderkey: i64,
    pub custkey: i64,
    pub order_date: Date,
}

/// A line item row. `total_amount` is the line revenue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItemRecord {
    pub orderkey: i64,
    pub linenumber: i32,
    pub partkey: i64,
    pub quantity: f64,
    pub extended_price: f64,
    pub discount: f64,
    pub total_amount: f64,
}

/// A part dimension row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartRecord {
    pub partkey: i64,
    pub name: String,
    pub mfgr: String,
    pub brand: String,
    pub part_type: String,
    pub type_category: String,
}

/// One order header joined to one of its line items.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderFact {
    pub orderkey: i64,
    pub custkey: i64,
    pub order_date: Date,
    pub partkey: i64,
    pub quantity: f64,
    pub extended_price: f64,
    pub discount: f64,
    pub total_amount: f64,
}

/// A single value bound into a report table insert.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Null,
    Boolean(bool),
    Integer(i64),
    Double(f64),
    Text(String),
    Date(Date),
}

impl ToSql for CellValue {
    fn to_sql(&self) -> ::duckdb::Result<ToSqlOutput<'_>> {
        let value = match self {
            Self::Null => DuckValue::Null,
            Self::Boolean(value) => DuckValue::Boolean(*value),
            Self::Integer(value) => DuckValue::BigInt(*value),
            Self::Double(value) => DuckValue::Double(*value),
            Self::Text(value) => DuckValue::Text(value.clone()),
            // Inserts cast each placeholder to the column type.
            Self::Date(value) => DuckValue::Text(format_date(*value)),
        };
        Ok(ToSqlOutput::Owned(value))
    }
}

impl From<bool> for CellValue {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl From<i64> for CellValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<u8> for CellValue {
    fn from(value: u8) -> Self {
        Self::Integer(i64::from(value))
    }
}

impl From<u32> for CellValue {
    fn from(value: u32) -> Self {
        Self::Integer(i64::from(value))
    }
}

impl From<usize> for CellValue {
    fn from(value: usize) -> Self {
        Self::Integer(i64::try_from(value).unwrap_or(i64::MAX))
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        Self::Double(value)
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<Date> for CellValue {
    fn from(value: Date) -> Self {
        Self::Date(value)
    }
}

impl<T> From<Option<T>> for CellValue
where
    T: Into<CellValue>,
{
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

/// Render a date as `YYYY-MM-DD`.
#[must_use]
pub fn format_date(date: Date) -> String {
    // The format description has no fallible components for valid dates.
    date.format(DATE_FORMAT).unwrap_or_default()
}

/// Parse a `YYYY-MM-DD` date.
pub fn parse_date(value: &str) -> Result<Date, time::error::Parse> {
    Date::parse(value.trim(), DATE_FORMAT)
}
