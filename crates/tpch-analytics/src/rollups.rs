//! Product and regional revenue rollups.

use std::collections::{BTreeMap, HashMap, HashSet};

use serde::Serialize;
use tpch_warehouse::catalog::{
    PRODUCT_ANALYSIS_RESULTS, PRODUCT_CATEGORY_PERFORMANCE, REGIONAL_PERFORMANCE_ANALYSIS,
    REGIONAL_SUMMARY,
};
use tpch_warehouse::{CellValue, CustomerRecord, OrderFact, PartRecord, TableSpec};

use crate::report::ReportRow;

fn count(value: usize) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

/// One row of `product_analysis_results`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductPerformance {
    pub part: PartRecord,
    pub total_quantity: f64,
    pub total_revenue: f64,
    /// Average extended price per line.
    pub avg_price: f64,
    pub avg_discount: f64,
    /// Distinct orders.
    pub order_count: i64,
    pub revenue_rank: i64,
    pub quantity_rank: i64,
}

impl ReportRow for ProductPerformance {
    fn spec() -> &'static TableSpec {
        &PRODUCT_ANALYSIS_RESULTS
    }

    fn cells(&self) -> Vec<CellValue> {
        vec![
            self.part.partkey.into(),
            self.part.name.as_str().into(),
            self.part.mfgr.as_str().into(),
            self.part.brand.as_str().into(),
            self.part.part_type.as_str().into(),
            self.part.type_category.as_str().into(),
            self.total_quantity.into(),
            self.total_revenue.into(),
            self.avg_price.into(),
            self.avg_discount.into(),
            self.order_count.into(),
            self.revenue_rank.into(),
            self.quantity_rank.into(),
        ]
    }
}

#[derive(Default)]
struct ProductAccumulator {
    quantity: f64,
    revenue: f64,
    price_sum: f64,
    discount_sum: f64,
    lines: usize,
    orders: HashSet<i64>,
}

/// Join line items to parts and rank every sold part.
///
/// Ranks are ordinal; ties go to the lower part key. Facts whose part is
/// unknown are dropped. Output is ordered by `revenue_rank`.
pub fn product_performance(facts: &[OrderFact], parts: &[PartRecord]) -> Vec<ProductPerformance> {
    let catalog: HashMap<i64, &PartRecord> = parts.iter().map(|part| (part.partkey, part)).collect();

    let mut groups: BTreeMap<i64, ProductAccumulator> = BTreeMap::new();
    for fact in facts.iter().filter(|fact| catalog.contains_key(&fact.partkey)) {
        let acc = groups.entry(fact.partkey).or_default();
        acc.quantity += fact.quantity;
        acc.revenue += fact.total_amount;
        acc.price_sum += fact.extended_price;
        acc.discount_sum += fact.discount;
        acc.lines += 1;
        acc.orders.insert(fact.orderkey);
    }

    let mut products: Vec<ProductPerformance> = groups
        .into_iter()
        .filter_map(|(partkey, acc)| {
            let part = catalog.get(&partkey)?;
            let lines = acc.lines.max(1) as f64;
            Some(ProductPerformance {
                part: (*part).clone(),
                total_quantity: acc.quantity,
                total_revenue: acc.revenue,
                avg_price: acc.price_sum / lines,
                avg_discount: acc.discount_sum / lines,
                order_count: count(acc.orders.len()),
                revenue_rank: 0,
                quantity_rank: 0,
            })
        })
        .collect();

    products.sort_by(|a, b| {
        b.total_quantity
            .total_cmp(&a.total_quantity)
            .then_with(|| a.part.partkey.cmp(&b.part.partkey))
    });
    for (rank, product) in products.iter_mut().enumerate() {
        product.quantity_rank = count(rank + 1);
    }

    products.sort_by(|a, b| {
        b.total_revenue
            .total_cmp(&a.total_revenue)
            .then_with(|| a.part.partkey.cmp(&b.part.partkey))
    });
    for (rank, product) in products.iter_mut().enumerate() {
        product.revenue_rank = count(rank + 1);
    }

    products
}

/// One row of `product_category_performance`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryPerformance {
    pub type_category: String,
    pub product_count: i64,
    pub category_revenue: f64,
    pub avg_product_revenue: f64,
    pub category_quantity: f64,
}

impl ReportRow for CategoryPerformance {
    fn spec() -> &'static TableSpec {
        &PRODUCT_CATEGORY_PERFORMANCE
    }

    fn cells(&self) -> Vec<CellValue> {
        vec![
            self.type_category.as_str().into(),
            self.product_count.into(),
            self.category_revenue.into(),
            self.avg_product_revenue.into(),
            self.category_quantity.into(),
        ]
    }
}

/// Per type category totals, highest revenue first.
pub fn category_performance(products: &[ProductPerformance]) -> Vec<CategoryPerformance> {
    let mut groups: BTreeMap<&str, (usize, f64, f64)> = BTreeMap::new();
    for product in products {
        let entry = groups
            .entry(product.part.type_category.as_str())
            .or_insert((0, 0.0, 0.0));
        entry.0 += 1;
        entry.1 += product.total_revenue;
        entry.2 += product.total_quantity;
    }

    let mut categories: Vec<CategoryPerformance> = groups
        .into_iter()
        .map(|(category, (products, revenue, quantity))| CategoryPerformance {
            type_category: category.to_string(),
            product_count: count(products),
            category_revenue: revenue,
            avg_product_revenue: revenue / products.max(1) as f64,
            category_quantity: quantity,
        })
        .collect();
    categories.sort_by(|a, b| {
        b.category_revenue
            .total_cmp(&a.category_revenue)
            .then_with(|| a.type_category.cmp(&b.type_category))
    });
    categories
}

/// Grouping key of the regional rollup.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct RegionKey {
    pub region: String,
    pub nation: String,
    pub market_segment: String,
}

/// One row of `regional_performance_analysis`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegionalPerformance {
    #[serde(flatten)]
    pub key: RegionKey,
    pub customer_count: i64,
    pub order_count: i64,
    pub total_revenue: f64,
    pub avg_order_line_value: f64,
    pub total_quantity: f64,
    /// Share of global revenue in percent; `None` when global revenue is 0.
    pub market_share_pct: Option<f64>,
    pub revenue_per_customer: f64,
}

impl ReportRow for RegionalPerformance {
    fn spec() -> &'static TableSpec {
        &REGIONAL_PERFORMANCE_ANALYSIS
    }

    fn cells(&self) -> Vec<CellValue> {
        vec![
            self.key.region.as_str().into(),
            self.key.nation.as_str().into(),
            self.key.market_segment.as_str().into(),
            self.customer_count.into(),
            self.order_count.into(),
            self.total_revenue.into(),
            self.avg_order_line_value.into(),
            self.total_quantity.into(),
            self.market_share_pct.into(),
            self.revenue_per_customer.into(),
        ]
    }
}

#[derive(Default)]
struct RegionAccumulator {
    customers: HashSet<i64>,
    orders: HashSet<i64>,
    revenue: f64,
    lines: usize,
    quantity: f64,
}

/// Revenue by region, nation, and market segment.
///
/// Output is ordered by revenue descending, then by key.
pub fn regional_performance(
    customers: &[CustomerRecord],
    facts: &[OrderFact],
) -> Vec<RegionalPerformance> {
    let directory: HashMap<i64, &CustomerRecord> = customers
        .iter()
        .map(|customer| (customer.custkey, customer))
        .collect();

    let mut groups: BTreeMap<RegionKey, RegionAccumulator> = BTreeMap::new();
    for fact in facts {
        let Some(customer) = directory.get(&fact.custkey) else {
            continue;
        };
        let key = RegionKey {
            region: customer.region.clone(),
            nation: customer.nation.clone(),
            market_segment: customer.market_segment.clone(),
        };
        let acc = groups.entry(key).or_default();
        acc.customers.insert(fact.custkey);
        acc.orders.insert(fact.orderkey);
        acc.revenue += fact.total_amount;
        acc.lines += 1;
        acc.quantity += fact.quantity;
    }

    let global_revenue: f64 = groups.values().map(|acc| acc.revenue).sum();

    let mut regions: Vec<RegionalPerformance> = groups
        .into_iter()
        .map(|(key, acc)| RegionalPerformance {
            key,
            customer_count: count(acc.customers.len()),
            order_count: count(acc.orders.len()),
            total_revenue: acc.revenue,
            avg_order_line_value: acc.revenue / acc.lines.max(1) as f64,
            total_quantity: acc.quantity,
            market_share_pct: (global_revenue != 0.0)
                .then(|| acc.revenue / global_revenue * 100.0),
            revenue_per_customer: acc.revenue / acc.customers.len().max(1) as f64,
        })
        .collect();
    regions.sort_by(|a, b| {
        b.total_revenue
            .total_cmp(&a.total_revenue)
            .then_with(|| a.key.cmp(&b.key))
    });
    regions
}

/// One row of `regional_summary`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegionSummary {
    pub region: String,
    pub region_revenue: f64,
    pub region_customers: i64,
    pub region_orders: i64,
    pub avg_market_share: Option<f64>,
}

impl ReportRow for RegionSummary {
    fn spec() -> &'static TableSpec {
        &REGIONAL_SUMMARY
    }

    fn cells(&self) -> Vec<CellValue> {
        vec![
            self.region.as_str().into(),
            self.region_revenue.into(),
            self.region_customers.into(),
            self.region_orders.into(),
            self.avg_market_share.into(),
        ]
    }
}

/// Collapse the regional rollup to one row per region.
///
/// A customer belongs to exactly one nation and segment, so group counts
/// add up without double counting.
pub fn region_summary(regional: &[RegionalPerformance]) -> Vec<RegionSummary> {
    #[derive(Default)]
    struct Acc {
        revenue: f64,
        customers: i64,
        orders: i64,
        share_sum: f64,
        share_count: usize,
    }

    let mut groups: BTreeMap<&str, Acc> = BTreeMap::new();
    for row in regional {
        let acc = groups.entry(row.key.region.as_str()).or_default();
        acc.revenue += row.total_revenue;
        acc.customers += row.customer_count;
        acc.orders += row.order_count;
        if let Some(share) = row.market_share_pct {
            acc.share_sum += share;
            acc.share_count += 1;
        }
    }

    let mut summary: Vec<RegionSummary> = groups
        .into_iter()
        .map(|(region, acc)| RegionSummary {
            region: region.to_string(),
            region_revenue: acc.revenue,
            region_customers: acc.customers,
            region_orders: acc.orders,
            avg_market_share: (acc.share_count > 0)
                .then(|| acc.share_sum / acc.share_count as f64),
        })
        .collect();
    summary.sort_by(|a, b| {
        b.region_revenue
            .total_cmp(&a.region_revenue)
            .then_with(|| a.region.cmp(&b.region))
    });
    summary
}
