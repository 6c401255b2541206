use thiserror::Error;

use crate::config::ConfigError;

/// Top-level error type for analytics operations.
#[derive(Debug, Error)]
pub enum AnalyticsError {
    #[error(transparent)]
    Warehouse(#[from] tpch_warehouse::WarehouseError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("invalid date '{value}', expected YYYY-MM-DD")]
    InvalidDate { value: String },

    #[error("invalid step '{value}', expected one of rfm, trends, products, regions, all")]
    InvalidStep { value: String },
}
