//! Behavior-driven tests for the analytics pipeline
//!
//! These tests run the pipeline end to end against a scratch warehouse and
//! inspect the report tables a dashboard would read.

use std::collections::HashMap;
use std::time::Duration;

use serde_json::Value;
use tempfile::{tempdir, TempDir};
use time::{Date, Month};
use tpch_analytics::{
    AnalyticsError, Pipeline, PipelineOptions, QueryGuardrails, ReportReader, Step, Warehouse,
    WarehouseConfig,
};
use tpch_warehouse::{CustomerRecord, LineItemRecord, OrderRecord, PartRecord};

// =============================================================================
// Fixtures
// =============================================================================

fn date(year: i32, month: Month, day: u8) -> Date {
    Date::from_calendar_date(year, month, day).expect("valid date")
}

fn open_warehouse(temp: &TempDir) -> Warehouse {
    Warehouse::open(WarehouseConfig {
        db_path: temp.path().join("warehouse.duckdb"),
        report_schema: String::from("reports"),
        max_pool_size: 2,
    })
    .expect("warehouse open")
}

/// Twelve customers. Customer `k` (1..=11) places `k` orders; customer 12
/// never orders.
fn seed(warehouse: &Warehouse) {
    let customers = (1..=12)
        .map(|custkey| CustomerRecord {
            custkey,
            name: format!("Customer#{custkey:09}"),
            nation: if custkey % 2 == 0 { "JAPAN" } else { "FRANCE" }.to_string(),
            region: if custkey % 2 == 0 { "ASIA" } else { "EUROPE" }.to_string(),
            market_segment: if custkey % 3 == 0 { "BUILDING" } else { "MACHINERY" }.to_string(),
        })
        .collect::<Vec<_>>();

    let months = [
        Month::January,
        Month::February,
        Month::March,
        Month::April,
        Month::May,
        Month::June,
        Month::July,
    ];

    let mut orders = Vec::new();
    let mut lineitems = Vec::new();
    let mut orderkey = 0_i64;
    for custkey in 1..=11_i64 {
        for n in 0..custkey {
            orderkey += 1;
            let month = months[usize::try_from((custkey + n) % 7).expect("index")];
            orders.push(OrderRecord {
                orderkey,
                custkey,
                order_date: date(1998, month, u8::try_from(custkey).expect("day")),
            });
            for linenumber in 1..=2 {
                let amount = 100.0 * custkey as f64 + f64::from(linenumber);
                lineitems.push(LineItemRecord {
                    orderkey,
                    linenumber,
                    partkey: i64::from(linenumber) + (orderkey % 3),
                    quantity: f64::from(linenumber) * 2.0,
                    extended_price: amount,
                    discount: 0.04,
                    total_amount: amount * 0.96,
                });
            }
        }
    }

    let parts = (1..=4)
        .map(|partkey| PartRecord {
            partkey,
            name: format!("part {partkey}"),
            mfgr: String::from("Manufacturer#2"),
            brand: String::from("Brand#23"),
            part_type: String::from("STANDARD POLISHED STEEL"),
            type_category: if partkey <= 2 { "STANDARD" } else { "PROMO" }.to_string(),
        })
        .collect::<Vec<_>>();

    warehouse.ingest_customers(&customers).expect("customers");
    warehouse.ingest_orders(&orders).expect("orders");
    warehouse.ingest_lineitems(&lineitems).expect("lineitems");
    warehouse.ingest_parts(&parts).expect("parts");
}

fn options() -> PipelineOptions {
    PipelineOptions::as_of("1998-08-02").expect("as-of")
}

fn column(result: &tpch_analytics::QueryResult, name: &str) -> usize {
    result
        .columns
        .iter()
        .position(|column| column.name == name)
        .unwrap_or_else(|| panic!("missing column {name}"))
}

fn as_i64(value: &Value) -> i64 {
    value.as_i64().unwrap_or_else(|| panic!("not an integer: {value}"))
}

fn as_f64(value: &Value) -> f64 {
    value.as_f64().unwrap_or_else(|| panic!("not a number: {value}"))
}

// =============================================================================
// Pipeline: Full Run
// =============================================================================

#[test]
fn when_pipeline_runs_every_report_table_is_written_in_order() {
    // Given: A seeded warehouse
    let temp = tempdir().expect("tempdir");
    let warehouse = open_warehouse(&temp);
    seed(&warehouse);

    // When: The full pipeline runs
    let reports = Pipeline::new(warehouse.clone(), options())
        .run(Step::All)
        .expect("pipeline");

    // Then: Steps ran in the fixed order and every table has rows
    let steps: Vec<Step> = reports.iter().map(|report| report.step).collect();
    assert_eq!(steps, vec![Step::Rfm, Step::Trends, Step::Products, Step::Regions]);

    let reader = ReportReader::new(warehouse, Duration::from_secs(60));
    for load in reader.load_all() {
        assert!(load.error.is_none(), "{}: {:?}", load.table, load.error);
        assert!(load.result.row_count > 0, "{} is empty", load.table);
    }
}

#[test]
fn rfm_scores_reflect_the_whole_population() {
    // Given: A pipeline run over twelve customers
    let temp = tempdir().expect("tempdir");
    let warehouse = open_warehouse(&temp);
    seed(&warehouse);
    Pipeline::new(warehouse.clone(), options())
        .run_rfm()
        .expect("rfm");

    // When: The scores table is read back
    let spec = tpch_warehouse::find_report_table("customer_rfm_scores").expect("catalog");
    let result = warehouse
        .read_report(spec, QueryGuardrails::default())
        .expect("read");

    // Then: Every customer has one row with scores in [1, 5]
    assert_eq!(result.row_count, 12);
    let frequency = column(&result, "frequency");
    let r = column(&result, "r_score");
    let f = column(&result, "f_score");
    let m = column(&result, "m_score");
    let history = column(&result, "has_purchase_history");
    let aov = column(&result, "avg_order_value");
    let recency = column(&result, "recency_days");

    let mut bucket_sizes: HashMap<(usize, i64), usize> = HashMap::new();
    for (index, row) in result.rows.iter().enumerate() {
        let custkey = i64::try_from(index + 1).expect("key");
        for score_column in [r, f, m] {
            let score = as_i64(&row[score_column]);
            assert!((1..=5).contains(&score), "score {score} out of range");
            *bucket_sizes.entry((score_column, score)).or_default() += 1;
        }

        if custkey <= 11 {
            // Frequency is the distinct order count, not the line count.
            assert_eq!(as_i64(&row[frequency]), custkey);
            assert!(as_i64(&row[recency]) >= 0);
            assert_eq!(row[history], Value::Bool(true));
        }
    }

    // 12 customers into 5 buckets: sizes 3, 3, 2, 2, 2.
    for score_column in [r, f, m] {
        let sizes: Vec<usize> = (1..=5)
            .map(|score| bucket_sizes.get(&(score_column, score)).copied().unwrap_or(0))
            .collect();
        let max = sizes.iter().max().copied().unwrap_or(0);
        let min = sizes.iter().min().copied().unwrap_or(0);
        assert!(max - min <= 1, "uneven buckets {sizes:?}");
    }

    // And: The customer without orders is scored as the weakest
    let idle = &result.rows[11];
    assert_eq!(idle[history], Value::Bool(false));
    assert_eq!(idle[recency], Value::Null);
    assert_eq!(as_i64(&idle[frequency]), 0);
    assert!(as_f64(&idle[aov]).abs() < f64::EPSILON);
    assert_eq!(idle[column(&result, "rfm_segment")], Value::String("Lost".to_string()));

    // And: The most frequent, highest spending customer scores at the top end
    let best = &result.rows[10];
    assert_eq!(as_i64(&best[f]), 5);
    assert_eq!(as_i64(&best[m]), 5);
}

#[test]
fn monthly_growth_is_undefined_for_the_first_month() {
    // Given: A completed trends step
    let temp = tempdir().expect("tempdir");
    let warehouse = open_warehouse(&temp);
    seed(&warehouse);
    Pipeline::new(warehouse.clone(), options())
        .run_trends()
        .expect("trends");

    // When: Monthly trends are read
    let spec = tpch_warehouse::find_report_table("monthly_sales_trends").expect("catalog");
    let result = warehouse
        .read_report(spec, QueryGuardrails::default())
        .expect("read");

    // Then: The first month has no growth and later months chain revenue
    let revenue = column(&result, "total_revenue");
    let previous = column(&result, "prev_month_revenue");
    let growth = column(&result, "mom_growth_pct");
    assert_eq!(result.rows[0][growth], Value::Null);
    for pair in result.rows.windows(2) {
        let p = as_f64(&pair[0][revenue]);
        let c = as_f64(&pair[1][revenue]);
        assert!((as_f64(&pair[1][previous]) - p).abs() < 1e-9);
        assert!((as_f64(&pair[1][growth]) - (c - p) / p * 100.0).abs() < 1e-9);
    }
}

#[test]
fn regional_market_shares_sum_to_one_hundred() {
    // Given: A completed regions step
    let temp = tempdir().expect("tempdir");
    let warehouse = open_warehouse(&temp);
    seed(&warehouse);
    Pipeline::new(warehouse.clone(), options())
        .run_regions()
        .expect("regions");

    // When: Regional performance is read
    let spec =
        tpch_warehouse::find_report_table("regional_performance_analysis").expect("catalog");
    let result = warehouse
        .read_report(spec, QueryGuardrails::default())
        .expect("read");

    // Then: Shares add up to the whole
    let share = column(&result, "market_share_pct");
    let total: f64 = result.rows.iter().map(|row| as_f64(&row[share])).sum();
    assert!((total - 100.0).abs() < 1e-9, "total={total}");
}

#[test]
fn product_ranks_are_a_permutation() {
    // Given: A completed products step
    let temp = tempdir().expect("tempdir");
    let warehouse = open_warehouse(&temp);
    seed(&warehouse);
    Pipeline::new(warehouse.clone(), options())
        .run_products()
        .expect("products");

    // When: Product results are read in rank order
    let spec = tpch_warehouse::find_report_table("product_analysis_results").expect("catalog");
    let result = warehouse
        .read_report(spec, QueryGuardrails::default())
        .expect("read");

    // Then: Revenue ranks run 1..=n with non-increasing revenue
    let rank = column(&result, "revenue_rank");
    let revenue = column(&result, "total_revenue");
    for (index, row) in result.rows.iter().enumerate() {
        assert_eq!(as_i64(&row[rank]), i64::try_from(index + 1).expect("rank"));
    }
    assert!(result
        .rows
        .windows(2)
        .all(|pair| as_f64(&pair[0][revenue]) >= as_f64(&pair[1][revenue])));
}

// =============================================================================
// Pipeline: Overwrite and Failure Semantics
// =============================================================================

#[test]
fn rerunning_the_pipeline_overwrites_instead_of_appending() {
    // Given: A pipeline that already ran once
    let temp = tempdir().expect("tempdir");
    let warehouse = open_warehouse(&temp);
    seed(&warehouse);
    let pipeline = Pipeline::new(warehouse.clone(), options());
    let first = pipeline.run_all().expect("first run");

    // When: It runs again
    let second = pipeline.run_all().expect("second run");

    // Then: Every table holds the same number of rows as before
    assert_eq!(first, second);
}

#[test]
fn a_failed_step_aborts_the_remaining_steps() {
    // Given: A warehouse whose part table has been dropped
    let temp = tempdir().expect("tempdir");
    let warehouse = open_warehouse(&temp);
    seed(&warehouse);
    warehouse
        .execute_query("DROP TABLE part", QueryGuardrails::default(), true)
        .expect("drop part");

    // When: The full pipeline runs
    let error = Pipeline::new(warehouse.clone(), options())
        .run_all()
        .expect_err("products step must fail");

    // Then: The error propagates and later steps never wrote their tables
    assert!(matches!(error, AnalyticsError::Warehouse(_)));
    let reader = ReportReader::new(warehouse, Duration::from_secs(60));
    assert!(reader.load("customer_rfm_scores").error.is_none());
    assert!(reader.load("monthly_sales_trends").error.is_none());
    assert!(reader.load("regional_performance_analysis").error.is_some());
}

#[test]
fn empty_sources_produce_empty_reports() {
    // Given: A warehouse with no source rows
    let temp = tempdir().expect("tempdir");
    let warehouse = open_warehouse(&temp);

    // When: The pipeline runs
    let reports = Pipeline::new(warehouse, options())
        .run_all()
        .expect("pipeline");

    // Then: Every table is written with zero rows
    assert!(reports
        .iter()
        .flat_map(|report| report.tables.iter())
        .all(|table| table.rows_written == 0));
}
