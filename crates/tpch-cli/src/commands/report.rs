use serde_json::json;
use tpch_warehouse::ReportReader;

use crate::cli::ReportArgs;
use crate::envelope::EnvelopeError;
use crate::error::CliError;

use super::{CommandResult, Context};

pub fn run(args: &ReportArgs, context: Context) -> Result<CommandResult, CliError> {
    let ttl = context.config.cache_ttl();
    let reader = ReportReader::new(context.warehouse, ttl).with_max_rows(args.limit);

    let loads = match args.table.as_deref() {
        Some(table) if !args.all => vec![reader.load(table)],
        _ => reader.load_all(),
    };

    let errors = loads
        .iter()
        .filter_map(|load| {
            load.error.as_ref().map(|message| {
                EnvelopeError::new("report.load_failed", message.clone()).with_table(&load.table)
            })
        })
        .collect::<Vec<_>>();

    let truncated = loads
        .iter()
        .filter(|load| load.result.truncated)
        .map(|load| load.table.clone())
        .collect::<Vec<_>>();
    let cache_hit = !loads.is_empty() && loads.iter().all(|load| load.cache_hit);

    let mut result = CommandResult::ok(json!({ "reports": loads }))
        .with_errors(errors)
        .with_cache_hit(cache_hit);
    for table in truncated {
        result = result.with_warning(format!(
            "{table} truncated at {} rows (use --limit to increase)",
            args.limit
        ));
    }
    Ok(result)
}
