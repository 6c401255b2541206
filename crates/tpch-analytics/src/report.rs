use tpch_warehouse::{CellValue, TableSpec};

/// A computed record that maps onto one report table row.
///
/// `cells` must yield values in the column order of [`ReportRow::spec`].
pub trait ReportRow {
    fn spec() -> &'static TableSpec;

    fn cells(&self) -> Vec<CellValue>;
}

/// Render records as insert rows.
pub fn to_rows<R: ReportRow>(records: &[R]) -> Vec<Vec<CellValue>> {
    records.iter().map(ReportRow::cells).collect()
}
