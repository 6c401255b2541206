//! Customer and sales analytics over TPC-H data.
//!
//! This crate contains:
//! - RFM scoring and segmentation
//! - Monthly, quarterly, and day-of-week sales trends
//! - Product and regional revenue rollups
//! - The pipeline runner that writes every report table
//! - The JSON configuration file

pub mod config;
pub mod error;
pub mod pipeline;
pub mod report;
pub mod rfm;
pub mod rollups;
pub mod trends;

pub use config::{AnalyticsConfig, ConfigError, CONFIG_ENV, DEFAULT_CONFIG_PATH};
pub use error::AnalyticsError;
pub use pipeline::{Pipeline, PipelineOptions, Step, StepReport};
pub use report::ReportRow;
pub use rfm::{
    assign_segment, customer_measures, ntile, score_customers, segment_summary, top_champions,
    CustomerMeasures, RfmScore, Segment, SegmentSummary,
};
pub use rollups::{
    category_performance, product_performance, region_summary, regional_performance,
    CategoryPerformance, ProductPerformance, RegionKey, RegionSummary, RegionalPerformance,
};
pub use trends::{
    day_name, day_of_week_sales, growth_pct, monthly_trends, quarterly_trends, DayOfWeekSales,
    MonthlyTrend, PeriodTotals, QuarterlyTrend,
};
pub use tpch_warehouse::{
    QueryGuardrails, QueryResult, ReportLoad, ReportReader, TableWrite, Warehouse,
    WarehouseConfig, WarehouseError,
};
