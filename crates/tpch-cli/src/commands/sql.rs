use tpch_warehouse::QueryGuardrails;

use crate::cli::SqlArgs;
use crate::error::CliError;

use super::{CommandResult, Context};

pub fn run(args: &SqlArgs, context: &Context) -> Result<CommandResult, CliError> {
    let query = args.query.trim();
    if query.is_empty() {
        return Err(CliError::Command(String::from("query must not be empty")));
    }

    let guardrails = QueryGuardrails {
        max_rows: args.max_rows,
        query_timeout_ms: args.query_timeout_ms,
    };
    let result = context
        .warehouse
        .execute_query(query, guardrails, args.write)?;

    let mut command_result = CommandResult::ok(serde_json::to_value(&result)?);
    if result.truncated {
        command_result = command_result.with_warning(format!(
            "result truncated at {} rows (use --max-rows to increase limit)",
            result.row_count
        ));
    }
    Ok(command_result)
}
