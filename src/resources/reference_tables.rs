//! Reference table listing, with the size of each table's grid.

use crate::errors::ConfigError;
use crate::filtering::config::{
    BaseSpec, ChildSummary, ColumnRef, FilterConfig, FilterDescriptor, SortSpec, TableRef,
};

const REFERENCE_TABLES: TableRef = TableRef::new("reference_tables", "rt");
const ROWS: TableRef = TableRef::new("reference_table_rows", "rtr");
const COLUMNS: TableRef = TableRef::new("reference_table_columns", "rtc");

/// # Errors
///
/// Returns a [`ConfigError`] if the declaration is inconsistent.
pub fn config() -> Result<FilterConfig, ConfigError> {
    FilterConfig::builder("reference_tables", BaseSpec::new(REFERENCE_TABLES, "id", "name"))
        .filter("name", FilterDescriptor::search(ColumnRef::base("name")))
        .filter("slug", FilterDescriptor::search(ColumnRef::base("slug")))
        .summary(ChildSummary::count(ROWS, "table_id", "id", "row_count"))
        .summary(ChildSummary::next_index(COLUMNS, "table_id", "column_index", "column_count"))
        .sort(SortSpec::column("name", ColumnRef::base("name")))
        .sort(SortSpec::column("slug", ColumnRef::base("slug")))
        .default_limit(25)
        .build()
}
