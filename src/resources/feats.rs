use crate::errors::ConfigError;
use crate::filtering::config::{
    BaseSpec, ColumnRef, DataType, FilterConfig, FilterDescriptor, SortSpec, TableRef,
};

const FEATS: TableRef = TableRef::new("feats", "f");

const SEARCHABLE: [&str; 6] = [
    "feat_name",
    "feat_description",
    "feat_benefit",
    "feat_normal",
    "feat_special",
    "feat_prereq",
];

/// # Errors
///
/// Returns a [`ConfigError`] if the declaration is inconsistent.
pub fn config() -> Result<FilterConfig, ConfigError> {
    let builder = SEARCHABLE.into_iter().fold(
        FilterConfig::builder("feats", BaseSpec::new(FEATS, "feat_id", "feat_name")),
        |builder, column| builder.filter(column, FilterDescriptor::search(ColumnRef::base(column))),
    );

    builder
        .filter(
            "feat_type",
            FilterDescriptor::direct(ColumnRef::base("feat_type")).data_type(DataType::String),
        )
        .filter(
            "feat_multi_times",
            FilterDescriptor::direct(ColumnRef::base("feat_multi_times")).data_type(DataType::Boolean),
        )
        .sort(SortSpec::column("feat_name", ColumnRef::base("feat_name")))
        .sort(SortSpec::column("feat_type", ColumnRef::base("feat_type")))
        .build()
}
