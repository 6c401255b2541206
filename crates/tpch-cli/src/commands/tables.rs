use serde::Serialize;
use tpch_warehouse::REPORT_TABLES;

use crate::error::CliError;

use super::CommandResult;

#[derive(Debug, Serialize)]
struct ColumnRow {
    name: &'static str,
    #[serde(rename = "type")]
    r#type: &'static str,
}

#[derive(Debug, Serialize)]
struct TableRow {
    name: &'static str,
    order_by: &'static str,
    columns: Vec<ColumnRow>,
}

pub fn run() -> Result<CommandResult, CliError> {
    let tables = REPORT_TABLES
        .iter()
        .map(|spec| TableRow {
            name: spec.name,
            order_by: spec.order_by,
            columns: spec
                .columns
                .iter()
                .map(|column| ColumnRow {
                    name: column.name,
                    r#type: column.sql_type,
                })
                .collect(),
        })
        .collect::<Vec<_>>();

    Ok(CommandResult::ok(serde_json::json!({
        "tables": tables,
        "count": REPORT_TABLES.len(),
    })))
}
