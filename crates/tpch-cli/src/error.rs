use thiserror::Error;

/// CLI-level error categories mapped to exit codes.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Config(#[from] tpch_analytics::ConfigError),

    #[error(transparent)]
    Analytics(#[from] tpch_analytics::AnalyticsError),

    #[error(transparent)]
    Warehouse(#[from] tpch_warehouse::WarehouseError),

    #[error("command error: {0}")]
    Command(String),

    #[error("strict mode failed: warnings={warning_count}, errors={error_count}")]
    StrictModeViolation {
        warning_count: usize,
        error_count: usize,
    },

    #[error(transparent)]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CliError {
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::Config(_) => 2,
            Self::Command(_) => 2,
            Self::Analytics(_) | Self::Warehouse(_) => 4,
            Self::StrictModeViolation { .. } => 5,
            Self::Serialization(_) => 6,
            Self::Io(_) => 10,
        }
    }
}
