//! Report table catalog.
//!
//! These are the tables the pipeline overwrites on every run and the dashboard
//! reads. Column order here is the order in which rows are bound.

/// A column of a report table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnSpec {
    pub name: &'static str,
    pub sql_type: &'static str,
}

/// Shape of a full-overwrite report table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableSpec {
    pub name: &'static str,
    pub columns: &'static [ColumnSpec],
    /// Deterministic order used when the table is read back.
    pub order_by: &'static str,
}

impl TableSpec {
    /// Comma separated column names.
    #[must_use]
    pub fn column_list(&self) -> String {
        self.columns
            .iter()
            .map(|column| column.name)
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Column definitions for `CREATE TABLE`.
    #[must_use]
    pub fn column_definitions(&self) -> String {
        self.columns
            .iter()
            .map(|column| format!("{} {}", column.name, column.sql_type))
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// One `CAST(? AS type)` placeholder per column.
    #[must_use]
    pub fn placeholders(&self) -> String {
        self.columns
            .iter()
            .map(|column| format!("CAST(? AS {})", column.sql_type))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

const fn col(name: &'static str, sql_type: &'static str) -> ColumnSpec {
    ColumnSpec { name, sql_type }
}

pub const CUSTOMER_RFM_SCORES: TableSpec = TableSpec {
    name: "customer_rfm_scores",
    columns: &[
        col("c_custkey", "BIGINT"),
        col("c_name", "VARCHAR"),
        col("c_nation_name", "VARCHAR"),
        col("c_region_name", "VARCHAR"),
        col("c_mktsegment", "VARCHAR"),
        col("last_order_date", "DATE"),
        col("first_order_date", "DATE"),
        col("recency_days", "BIGINT"),
        col("frequency", "BIGINT"),
        col("monetary", "DOUBLE"),
        col("r_score", "INTEGER"),
        col("f_score", "INTEGER"),
        col("m_score", "INTEGER"),
        col("rfm_score", "VARCHAR"),
        col("rfm_segment", "VARCHAR"),
        col("lifetime_value", "DOUBLE"),
        col("avg_order_value", "DOUBLE"),
        col("has_purchase_history", "BOOLEAN"),
    ],
    order_by: "c_custkey",
};

pub const RFM_SEGMENT_SUMMARY: TableSpec = TableSpec {
    name: "rfm_segment_summary",
    columns: &[
        col("rfm_segment", "VARCHAR"),
        col("customer_count", "BIGINT"),
        col("avg_recency", "DOUBLE"),
        col("avg_frequency", "DOUBLE"),
        col("avg_monetary", "DOUBLE"),
    ],
    order_by: "customer_count DESC, rfm_segment",
};

pub const MONTHLY_SALES_TRENDS: TableSpec = TableSpec {
    name: "monthly_sales_trends",
    columns: &[
        col("month_start", "DATE"),
        col("order_year", "INTEGER"),
        col("order_month", "INTEGER"),
        col("order_count", "BIGINT"),
        col("unique_customers", "BIGINT"),
        col("total_revenue", "DOUBLE"),
        col("avg_order_item_value", "DOUBLE"),
        col("total_items_sold", "DOUBLE"),
        col("prev_month_revenue", "DOUBLE"),
        col("mom_growth_pct", "DOUBLE"),
    ],
    order_by: "month_start",
};

pub const QUARTERLY_SALES_TRENDS: TableSpec = TableSpec {
    name: "quarterly_sales_trends",
    columns: &[
        col("order_year", "INTEGER"),
        col("order_quarter", "INTEGER"),
        col("order_count", "BIGINT"),
        col("unique_customers", "BIGINT"),
        col("total_revenue", "DOUBLE"),
        col("avg_order_item_value", "DOUBLE"),
        col("total_items_sold", "DOUBLE"),
        col("prev_quarter_revenue", "DOUBLE"),
        col("qoq_growth_pct", "DOUBLE"),
    ],
    order_by: "order_year, order_quarter",
};

pub const DAY_OF_WEEK_SALES: TableSpec = TableSpec {
    name: "day_of_week_sales",
    columns: &[
        col("day_of_week", "INTEGER"),
        col("day_name", "VARCHAR"),
        col("order_count", "BIGINT"),
        col("unique_customers", "BIGINT"),
        col("total_revenue", "DOUBLE"),
        col("avg_order_item_value", "DOUBLE"),
        col("total_items_sold", "DOUBLE"),
    ],
    order_by: "day_of_week",
};

pub const PRODUCT_ANALYSIS_RESULTS: TableSpec = TableSpec {
    name: "product_analysis_results",
    columns: &[
        col("p_partkey", "BIGINT"),
        col("p_name", "VARCHAR"),
        col("p_mfgr", "VARCHAR"),
        col("p_brand", "VARCHAR"),
        col("p_type", "VARCHAR"),
        col("p_type_category", "VARCHAR"),
        col("total_quantity", "DOUBLE"),
        col("total_revenue", "DOUBLE"),
        col("avg_price", "DOUBLE"),
        col("avg_discount", "DOUBLE"),
        col("order_count", "BIGINT"),
        col("revenue_rank", "BIGINT"),
        col("quantity_rank", "BIGINT"),
    ],
    order_by: "revenue_rank",
};

pub const PRODUCT_CATEGORY_PERFORMANCE: TableSpec = TableSpec {
    name: "product_category_performance",
    columns: &[
        col("p_type_category", "VARCHAR"),
        col("product_count", "BIGINT"),
        col("category_revenue", "DOUBLE"),
        col("avg_product_revenue", "DOUBLE"),
        col("category_quantity", "DOUBLE"),
    ],
    order_by: "category_revenue DESC, p_type_category",
};

pub const REGIONAL_PERFORMANCE_ANALYSIS: TableSpec = TableSpec {
    name: "regional_performance_analysis",
    columns: &[
        col("c_region_name", "VARCHAR"),
        col("c_nation_name", "VARCHAR"),
        col("c_mktsegment", "VARCHAR"),
        col("customer_count", "BIGINT"),
        col("order_count", "BIGINT"),
        col("total_revenue", "DOUBLE"),
        col("avg_order_line_value", "DOUBLE"),
        col("total_quantity", "DOUBLE"),
        col("market_share_pct", "DOUBLE"),
        col("revenue_per_customer", "DOUBLE"),
    ],
    order_by: "total_revenue DESC, c_region_name, c_nation_name, c_mktsegment",
};

pub const REGIONAL_SUMMARY: TableSpec = TableSpec {
    name: "regional_summary",
    columns: &[
        col("c_region_name", "VARCHAR"),
        col("region_revenue", "DOUBLE"),
        col("region_customers", "BIGINT"),
        col("region_orders", "BIGINT"),
        col("avg_market_share", "DOUBLE"),
    ],
    order_by: "region_revenue DESC, c_region_name",
};

/// Every table the pipeline writes, in pipeline order.
pub const REPORT_TABLES: &[&TableSpec] = &[
    &CUSTOMER_RFM_SCORES,
    &RFM_SEGMENT_SUMMARY,
    &MONTHLY_SALES_TRENDS,
    &QUARTERLY_SALES_TRENDS,
    &DAY_OF_WEEK_SALES,
    &PRODUCT_ANALYSIS_RESULTS,
    &PRODUCT_CATEGORY_PERFORMANCE,
    &REGIONAL_PERFORMANCE_ANALYSIS,
    &REGIONAL_SUMMARY,
];

/// Look up a report table by name (case-insensitive).
#[must_use]
pub fn find_report_table(name: &str) -> Option<&'static TableSpec> {
    REPORT_TABLES
        .iter()
        .copied()
        .find(|spec| spec.name.eq_ignore_ascii_case(name.trim()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_names_are_unique_and_resolvable() {
        for spec in REPORT_TABLES {
            let found = find_report_table(&spec.name.to_ascii_uppercase()).expect("resolvable");
            assert_eq!(found.name, spec.name);
        }
        assert!(find_report_table("quotes_latest").is_none());
    }

    #[test]
    fn placeholders_cast_to_column_types() {
        let rendered = DAY_OF_WEEK_SALES.placeholders();
        assert!(rendered.starts_with("CAST(? AS INTEGER), CAST(? AS VARCHAR)"));
        assert_eq!(rendered.matches('?').count(), DAY_OF_WEEK_SALES.columns.len());
    }
}
