use tpch_warehouse::SourceTable;

use crate::cli::LoadArgs;
use crate::error::CliError;

use super::{CommandResult, Context};

pub fn run(args: &LoadArgs, context: &Context) -> Result<CommandResult, CliError> {
    let table = SourceTable::parse(&args.table)?;
    let report = context.warehouse.import_csv(table, &args.csv)?;

    let mut result = CommandResult::ok(serde_json::to_value(&report)?);
    if report.rows_after == report.rows_before {
        result = result.with_warning(format!(
            "{} row count unchanged; existing keys were replaced",
            table.table_name()
        ));
    }
    Ok(result)
}
