mod load;
mod report;
mod run;
mod sql;
mod tables;

use std::time::Instant;

use serde_json::Value;
use tpch_analytics::AnalyticsConfig;
use tpch_warehouse::Warehouse;

use crate::cli::{Cli, Command};
use crate::envelope::{Envelope, EnvelopeError, EnvelopeMeta};
use crate::error::CliError;

pub struct CommandResult {
    pub data: Value,
    pub warnings: Vec<String>,
    pub errors: Vec<EnvelopeError>,
    pub cache_hit: bool,
}

impl CommandResult {
    pub fn ok(data: Value) -> Self {
        Self {
            data,
            warnings: Vec::new(),
            errors: Vec::new(),
            cache_hit: false,
        }
    }

    pub fn with_warning(mut self, warning: impl Into<String>) -> Self {
        self.warnings.push(warning.into());
        self
    }

    pub fn with_errors(mut self, errors: Vec<EnvelopeError>) -> Self {
        self.errors.extend(errors);
        self
    }

    pub fn with_cache_hit(mut self, cache_hit: bool) -> Self {
        self.cache_hit = cache_hit;
        self
    }
}

/// Configuration and an open warehouse for commands that need one.
pub struct Context {
    pub config: AnalyticsConfig,
    pub warehouse: Warehouse,
}

impl Context {
    fn open(cli: &Cli) -> Result<Self, CliError> {
        let path = AnalyticsConfig::resolve_path(cli.config.as_deref());
        let config = AnalyticsConfig::load(&path)?;
        let warehouse = Warehouse::open(config.to_warehouse_config())?;
        Ok(Self { config, warehouse })
    }
}

pub fn run(cli: &Cli) -> Result<Envelope<Value>, CliError> {
    let started = Instant::now();

    let command_result = match &cli.command {
        Command::Tables => tables::run()?,
        Command::Load(args) => load::run(args, &Context::open(cli)?)?,
        Command::Run(args) => run::run(args, &Context::open(cli)?)?,
        Command::Report(args) => report::run(args, Context::open(cli)?)?,
        Command::Sql(args) => sql::run(args, &Context::open(cli)?)?,
    };

    let CommandResult {
        data,
        warnings,
        errors,
        cache_hit,
    } = command_result;

    let latency_ms = started.elapsed().as_millis().min(u128::from(u64::MAX)) as u64;
    let mut meta = EnvelopeMeta::new(latency_ms, cache_hit);
    for warning in warnings {
        meta.push_warning(warning);
    }

    Ok(Envelope::new(meta, data, errors))
}
