//! Monthly, quarterly, and day-of-week sales aggregation.

use std::collections::{BTreeMap, HashSet};

use serde::Serialize;
use time::{Date, Duration};
use tpch_warehouse::catalog::{DAY_OF_WEEK_SALES, MONTHLY_SALES_TRENDS, QUARTERLY_SALES_TRENDS};
use tpch_warehouse::{CellValue, OrderFact, TableSpec};

use crate::report::ReportRow;

/// Period-over-period growth in percent.
///
/// `None` when there is no previous period or its revenue is zero.
#[must_use]
pub fn growth_pct(previous: Option<f64>, current: f64) -> Option<f64> {
    match previous {
        Some(previous) if previous != 0.0 => Some((current - previous) / previous * 100.0),
        _ => None,
    }
}

/// Totals shared by every period grouping.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeriodTotals {
    /// Distinct orders.
    pub order_count: i64,
    pub unique_customers: i64,
    pub total_revenue: f64,
    /// Average line revenue.
    pub avg_order_item_value: f64,
    pub total_items_sold: f64,
}

#[derive(Default)]
struct PeriodAccumulator {
    orders: HashSet<i64>,
    customers: HashSet<i64>,
    revenue: f64,
    lines: usize,
    quantity: f64,
}

impl PeriodAccumulator {
    fn add(&mut self, fact: &OrderFact) {
        self.orders.insert(fact.orderkey);
        self.customers.insert(fact.custkey);
        self.revenue += fact.total_amount;
        self.lines += 1;
        self.quantity += fact.quantity;
    }

    fn finish(self) -> PeriodTotals {
        PeriodTotals {
            order_count: count(self.orders.len()),
            unique_customers: count(self.customers.len()),
            total_revenue: self.revenue,
            avg_order_item_value: if self.lines == 0 {
                0.0
            } else {
                self.revenue / self.lines as f64
            },
            total_items_sold: self.quantity,
        }
    }
}

fn count(value: usize) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

fn group_by<K: Ord>(facts: &[OrderFact], key: impl Fn(&OrderFact) -> K) -> BTreeMap<K, PeriodTotals> {
    let mut groups: BTreeMap<K, PeriodAccumulator> = BTreeMap::new();
    for fact in facts {
        groups.entry(key(fact)).or_default().add(fact);
    }
    groups
        .into_iter()
        .map(|(key, acc)| (key, acc.finish()))
        .collect()
}

fn month_start(date: Date) -> Date {
    date - Duration::days(i64::from(date.day()) - 1)
}

/// Calendar quarter 1-4.
#[must_use]
pub fn quarter_of(date: Date) -> u8 {
    (u8::from(date.month()) - 1) / 3 + 1
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyTrend {
    pub month_start: Date,
    pub order_year: i32,
    pub order_month: u8,
    #[serde(flatten)]
    pub totals: PeriodTotals,
    pub prev_month_revenue: Option<f64>,
    pub mom_growth_pct: Option<f64>,
}

impl ReportRow for MonthlyTrend {
    fn spec() -> &'static TableSpec {
        &MONTHLY_SALES_TRENDS
    }

    fn cells(&self) -> Vec<CellValue> {
        vec![
            self.month_start.into(),
            i64::from(self.order_year).into(),
            self.order_month.into(),
            self.totals.order_count.into(),
            self.totals.unique_customers.into(),
            self.totals.total_revenue.into(),
            self.totals.avg_order_item_value.into(),
            self.totals.total_items_sold.into(),
            self.prev_month_revenue.into(),
            self.mom_growth_pct.into(),
        ]
    }
}

/// One row per calendar month present in `facts`, oldest first.
pub fn monthly_trends(facts: &[OrderFact]) -> Vec<MonthlyTrend> {
    let mut previous: Option<f64> = None;
    group_by(facts, |fact| month_start(fact.order_date))
        .into_iter()
        .map(|(month_start, totals)| {
            let row = MonthlyTrend {
                month_start,
                order_year: month_start.year(),
                order_month: u8::from(month_start.month()),
                prev_month_revenue: previous,
                mom_growth_pct: growth_pct(previous, totals.total_revenue),
                totals,
            };
            previous = Some(row.totals.total_revenue);
            row
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuarterlyTrend {
    pub order_year: i32,
    pub order_quarter: u8,
    #[serde(flatten)]
    pub totals: PeriodTotals,
    pub prev_quarter_revenue: Option<f64>,
    pub qoq_growth_pct: Option<f64>,
}

impl ReportRow for QuarterlyTrend {
    fn spec() -> &'static TableSpec {
        &QUARTERLY_SALES_TRENDS
    }

    fn cells(&self) -> Vec<CellValue> {
        vec![
            i64::from(self.order_year).into(),
            self.order_quarter.into(),
            self.totals.order_count.into(),
            self.totals.unique_customers.into(),
            self.totals.total_revenue.into(),
            self.totals.avg_order_item_value.into(),
            self.totals.total_items_sold.into(),
            self.prev_quarter_revenue.into(),
            self.qoq_growth_pct.into(),
        ]
    }
}

/// One row per (year, quarter) present in `facts`, oldest first.
pub fn quarterly_trends(facts: &[OrderFact]) -> Vec<QuarterlyTrend> {
    let mut previous: Option<f64> = None;
    group_by(facts, |fact| (fact.order_date.year(), quarter_of(fact.order_date)))
        .into_iter()
        .map(|((order_year, order_quarter), totals)| {
            let row = QuarterlyTrend {
                order_year,
                order_quarter,
                prev_quarter_revenue: previous,
                qoq_growth_pct: growth_pct(previous, totals.total_revenue),
                totals,
            };
            previous = Some(row.totals.total_revenue);
            row
        })
        .collect()
}

/// English weekday name for a code where 0 is Sunday.
#[must_use]
pub fn day_name(code: u8) -> Option<&'static str> {
    const NAMES: [&str; 7] = [
        "Sunday",
        "Monday",
        "Tuesday",
        "Wednesday",
        "Thursday",
        "Friday",
        "Saturday",
    ];
    NAMES.get(usize::from(code)).copied()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DayOfWeekSales {
    /// 0 = Sunday.
    pub day_of_week: u8,
    pub day_name: &'static str,
    #[serde(flatten)]
    pub totals: PeriodTotals,
}

impl ReportRow for DayOfWeekSales {
    fn spec() -> &'static TableSpec {
        &DAY_OF_WEEK_SALES
    }

    fn cells(&self) -> Vec<CellValue> {
        vec![
            self.day_of_week.into(),
            self.day_name.into(),
            self.totals.order_count.into(),
            self.totals.unique_customers.into(),
            self.totals.total_revenue.into(),
            self.totals.avg_order_item_value.into(),
            self.totals.total_items_sold.into(),
        ]
    }
}

/// One row per weekday present in `facts`, ordered by code.
pub fn day_of_week_sales(facts: &[OrderFact]) -> Vec<DayOfWeekSales> {
    group_by(facts, |fact| fact.order_date.weekday().number_days_from_sunday())
        .into_iter()
        .map(|(day_of_week, totals)| DayOfWeekSales {
            day_of_week,
            day_name: day_name(day_of_week).unwrap_or("Unknown"),
            totals,
        })
        .collect()
}
