//! Linear pipeline runner.
//!
//! Steps run synchronously in a fixed order and the first failure aborts the
//! run. Each step reads the source tables afresh, so steps can also run alone.

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::Serialize;
use time::{Date, OffsetDateTime};
use tpch_warehouse::{parse_date, TableWrite, Warehouse};
use tracing::{info, info_span};

use crate::error::AnalyticsError;
use crate::report::{to_rows, ReportRow};
use crate::rfm::{customer_measures, score_customers, segment_summary, RfmScore, SegmentSummary};
use crate::rollups::{
    category_performance, product_performance, region_summary, regional_performance,
    CategoryPerformance, ProductPerformance, RegionSummary, RegionalPerformance,
};
use crate::trends::{
    day_of_week_sales, monthly_trends, quarterly_trends, DayOfWeekSales, MonthlyTrend,
    QuarterlyTrend,
};

/// A pipeline step, or all of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    Rfm,
    Trends,
    Products,
    Regions,
    All,
}

impl Step {
    /// Execution order of [`Step::All`].
    pub const ORDER: [Self; 4] = [Self::Rfm, Self::Trends, Self::Products, Self::Regions];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Rfm => "rfm",
            Self::Trends => "trends",
            Self::Products => "products",
            Self::Regions => "regions",
            Self::All => "all",
        }
    }
}

/// A step that writes tables. Unlike [`Step`] it has no `All` member.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Rfm,
    Trends,
    Products,
    Regions,
}

impl Stage {
    const ORDER: [Self; 4] = [Self::Rfm, Self::Trends, Self::Products, Self::Regions];

    const fn step(self) -> Step {
        match self {
            Self::Rfm => Step::Rfm,
            Self::Trends => Step::Trends,
            Self::Products => Step::Products,
            Self::Regions => Step::Regions,
        }
    }

    fn of(step: Step) -> &'static [Self] {
        match step {
            Step::Rfm => &Self::ORDER[0..1],
            Step::Trends => &Self::ORDER[1..2],
            Step::Products => &Self::ORDER[2..3],
            Step::Regions => &Self::ORDER[3..4],
            Step::All => &Self::ORDER,
        }
    }
}

impl Display for Step {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Step {
    type Err = AnalyticsError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "rfm" => Ok(Self::Rfm),
            "trends" => Ok(Self::Trends),
            "products" => Ok(Self::Products),
            "regions" => Ok(Self::Regions),
            "all" => Ok(Self::All),
            _ => Err(AnalyticsError::InvalidStep {
                value: value.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineOptions {
    /// Reference date for recency.
    pub as_of: Date,
}

impl PipelineOptions {
    /// Options with `as_of` set to the current UTC date.
    #[must_use]
    pub fn today() -> Self {
        Self {
            as_of: OffsetDateTime::now_utc().date(),
        }
    }

    /// Options for an explicit `YYYY-MM-DD` date.
    pub fn as_of(value: &str) -> Result<Self, AnalyticsError> {
        let as_of = parse_date(value).map_err(|_| AnalyticsError::InvalidDate {
            value: value.to_string(),
        })?;
        Ok(Self { as_of })
    }
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self::today()
    }
}

/// Tables written by one step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepReport {
    pub step: Step,
    pub tables: Vec<TableWrite>,
}

pub struct Pipeline {
    warehouse: Warehouse,
    options: PipelineOptions,
}

impl Pipeline {
    pub fn new(warehouse: Warehouse, options: PipelineOptions) -> Self {
        Self { warehouse, options }
    }

    #[must_use]
    pub fn options(&self) -> PipelineOptions {
        self.options
    }

    /// Run one step, or every step in order for [`Step::All`].
    pub fn run(&self, step: Step) -> Result<Vec<StepReport>, AnalyticsError> {
        Stage::of(step)
            .iter()
            .map(|stage| self.run_stage(*stage))
            .collect()
    }

    /// Run rfm, trends, products, regions. Stops at the first error.
    pub fn run_all(&self) -> Result<Vec<StepReport>, AnalyticsError> {
        self.run(Step::All)
    }

    fn run_stage(&self, stage: Stage) -> Result<StepReport, AnalyticsError> {
        let step = stage.step();
        let _span = info_span!("pipeline_step", step = step.as_str()).entered();
        let tables = match stage {
            Stage::Rfm => self.run_rfm()?,
            Stage::Trends => self.run_trends()?,
            Stage::Products => self.run_products()?,
            Stage::Regions => self.run_regions()?,
        };
        info!(tables = tables.len(), "step complete");
        Ok(StepReport { step, tables })
    }

    /// Score customers and write `customer_rfm_scores` and `rfm_segment_summary`.
    pub fn run_rfm(&self) -> Result<Vec<TableWrite>, AnalyticsError> {
        let customers = self.warehouse.load_customers()?;
        let facts = self.warehouse.load_order_facts()?;

        let scores = score_customers(customer_measures(&customers, &facts, self.options.as_of));
        let summary = segment_summary(&scores);
        info!(
            customers = scores.len(),
            segments = summary.len(),
            as_of = %self.options.as_of,
            "rfm scored"
        );

        Ok(vec![
            self.write::<RfmScore>(&scores)?,
            self.write::<SegmentSummary>(&summary)?,
        ])
    }

    /// Write monthly, quarterly, and day-of-week sales.
    pub fn run_trends(&self) -> Result<Vec<TableWrite>, AnalyticsError> {
        let facts = self.warehouse.load_order_facts()?;

        Ok(vec![
            self.write::<MonthlyTrend>(&monthly_trends(&facts))?,
            self.write::<QuarterlyTrend>(&quarterly_trends(&facts))?,
            self.write::<DayOfWeekSales>(&day_of_week_sales(&facts))?,
        ])
    }

    /// Write `product_analysis_results` and `product_category_performance`.
    pub fn run_products(&self) -> Result<Vec<TableWrite>, AnalyticsError> {
        let facts = self.warehouse.load_order_facts()?;
        let parts = self.warehouse.load_parts()?;

        let products = product_performance(&facts, &parts);
        let categories = category_performance(&products);

        Ok(vec![
            self.write::<ProductPerformance>(&products)?,
            self.write::<CategoryPerformance>(&categories)?,
        ])
    }

    /// Write `regional_performance_analysis` and `regional_summary`.
    pub fn run_regions(&self) -> Result<Vec<TableWrite>, AnalyticsError> {
        let customers = self.warehouse.load_customers()?;
        let facts = self.warehouse.load_order_facts()?;

        let regional = regional_performance(&customers, &facts);
        let summary = region_summary(&regional);

        Ok(vec![
            self.write::<RegionalPerformance>(&regional)?,
            self.write::<RegionSummary>(&summary)?,
        ])
    }

    fn write<R: ReportRow>(&self, records: &[R]) -> Result<TableWrite, AnalyticsError> {
        Ok(self.warehouse.replace_table(R::spec(), &to_rows(records))?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn steps_parse_case_insensitively() {
        assert_eq!("RFM".parse::<Step>().expect("parse"), Step::Rfm);
        assert_eq!(" all ".parse::<Step>().expect("parse"), Step::All);
        assert!(matches!(
            "nation".parse::<Step>(),
            Err(AnalyticsError::InvalidStep { .. })
        ));
    }

    #[test]
    fn every_step_maps_onto_the_stages_it_runs() {
        for step in Step::ORDER {
            let stages = Stage::of(step);
            assert_eq!(stages.len(), 1);
            assert_eq!(stages[0].step(), step);
        }

        let all: Vec<Step> = Stage::of(Step::All).iter().map(|s| s.step()).collect();
        assert_eq!(all, Step::ORDER.to_vec());
    }

    #[test]
    fn as_of_requires_iso_dates() {
        let options = PipelineOptions::as_of("1998-08-02").expect("parse");
        assert_eq!(options.as_of.year(), 1998);
        assert!(matches!(
            PipelineOptions::as_of("08/02/1998"),
            Err(AnalyticsError::InvalidDate { .. })
        ));
    }
}
