//! CLI argument definitions for tpch.
//!
//! # Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `load` | Import a source table from CSV |
//! | `run` | Run the analytics pipeline |
//! | `report` | Read report tables |
//! | `sql` | Query the DuckDB warehouse |
//! | `tables` | List the report catalog |
//!
//! # Global Options
//!
//! | Option | Default | Description |
//! |--------|---------|-------------|
//! | `--config` | `config.json` | Configuration file (`TPCH_CONFIG` overrides the default) |
//! | `--format` | `json` | Output format (json, ndjson, table) |
//! | `--pretty` | `false` | Pretty-print JSON output |
//! | `--strict` | `false` | Treat warnings as errors |
//!
//! # Examples
//!
//! ```bash
//! tpch load orders data/orders.csv
//! tpch run --as-of 1998-08-02
//! tpch report customer_rfm_scores --limit 20 --pretty
//! tpch report --all --strict
//! ```

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

/// TPC-H customer and sales analytics.
#[derive(Debug, Parser)]
#[command(
    name = "tpch",
    author,
    version,
    about = "RFM segmentation, sales trends, and revenue rollups over TPC-H data"
)]
pub struct Cli {
    /// Configuration file. Defaults to $TPCH_CONFIG, then ./config.json.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Output format for results.
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Json)]
    pub format: OutputFormat,

    /// Pretty-print JSON output with indentation.
    #[arg(long, global = true, default_value_t = false)]
    pub pretty: bool,

    /// Treat warnings and errors as failures (exit code 5).
    #[arg(long, global = true, default_value_t = false)]
    pub strict: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable layout for terminal display.
    Table,
    /// Single JSON object output.
    Json,
    /// Newline-delimited JSON (one object per line).
    Ndjson,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Import a source table from a CSV file with a header row.
    ///
    ///   tpch load customer data/customer.csv
    Load(LoadArgs),

    /// Run the analytics pipeline and overwrite its report tables.
    ///
    ///   tpch run
    ///   tpch run --step rfm --as-of 1998-08-02
    Run(RunArgs),

    /// Read report tables.
    ///
    /// A table that cannot be read is returned empty with an envelope error.
    ///
    ///   tpch report monthly_sales_trends
    ///   tpch report --all
    Report(ReportArgs),

    /// Run SQL queries against the DuckDB warehouse.
    ///
    /// Default mode is read-only; use --write for data modifications.
    Sql(SqlArgs),

    /// List the report tables and their columns.
    Tables,
}

#[derive(Debug, Args)]
pub struct LoadArgs {
    /// Source table: customer, orders, lineitem, or part.
    pub table: String,

    /// CSV file whose header uses the table's column names.
    pub csv: PathBuf,
}

#[derive(Debug, Args)]
pub struct RunArgs {
    /// Step to run: all, rfm, trends, products, or regions.
    #[arg(long, default_value = "all")]
    pub step: String,

    /// Reference date for recency (YYYY-MM-DD). Defaults to today (UTC).
    #[arg(long)]
    pub as_of: Option<String>,
}

#[derive(Debug, Args)]
pub struct ReportArgs {
    /// Report table name.
    #[arg(required_unless_present = "all", conflicts_with = "all")]
    pub table: Option<String>,

    /// Read every report table.
    #[arg(long, default_value_t = false)]
    pub all: bool,

    /// Maximum rows per table.
    #[arg(long, default_value_t = 10_000)]
    pub limit: usize,
}

#[derive(Debug, Args)]
pub struct SqlArgs {
    /// SQL query to execute.
    pub query: String,

    /// Allow write operations (INSERT, UPDATE, DELETE, CREATE, etc.).
    #[arg(long, default_value_t = false)]
    pub write: bool,

    /// Maximum number of rows to return.
    #[arg(long, default_value_t = 10_000)]
    pub max_rows: usize,

    /// Query timeout in milliseconds.
    #[arg(long, default_value_t = 5_000)]
    pub query_timeout_ms: u64,
}
