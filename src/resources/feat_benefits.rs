use crate::errors::ConfigError;
use crate::filtering::config::{
    BaseSpec, ColumnRef, DataType, FilterConfig, FilterDescriptor, SortSpec, TableRef,
};

const FEAT_BENEFITS: TableRef = TableRef::new("feat_benefit_map", "fbm");

/// # Errors
///
/// Returns a [`ConfigError`] if the declaration is inconsistent.
pub fn config() -> Result<FilterConfig, ConfigError> {
    FilterConfig::builder(
        "feat_benefits",
        BaseSpec::new(FEAT_BENEFITS, "benefit_id", "benefit_id"),
    )
    .filter("feat_id", FilterDescriptor::direct(ColumnRef::base("feat_id")))
    .filter(
        "benefit_type",
        FilterDescriptor::direct(ColumnRef::base("benefit_type")).data_type(DataType::String),
    )
    .filter("benefit_type_id", FilterDescriptor::direct(ColumnRef::base("benefit_type_id")))
    .filter("benefit_amount", FilterDescriptor::direct(ColumnRef::base("benefit_amount")))
    .sort(SortSpec::column("benefit_id", ColumnRef::base("benefit_id")))
    .sort(SortSpec::column("feat_id", ColumnRef::base("feat_id")))
    .build()
}
