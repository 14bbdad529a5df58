use crate::errors::ConfigError;
use crate::filtering::config::{
    Aggregate, BaseSpec, ColumnRef, DataType, FilterConfig, FilterDescriptor, SortSpec, TableRef,
};
use crate::resources::Lookups;

const RACES: TableRef = TableRef::new("races", "r");

/// # Errors
///
/// Returns a [`ConfigError`] if the declaration is inconsistent.
pub fn config(lookups: &Lookups) -> Result<FilterConfig, ConfigError> {
    FilterConfig::builder("races", BaseSpec::new(RACES, "race_id", "race_name"))
        .filter("race_name", FilterDescriptor::search(ColumnRef::base("race_name")))
        .filter(
            "edition_id",
            FilterDescriptor::direct(ColumnRef::base("edition_id"))
                .multi_valued()
                .with_logic()
                .aggregate(Aggregate::distinct("edition_ids")),
        )
        .filter(
            "display",
            FilterDescriptor::direct(ColumnRef::base("display")).data_type(DataType::Boolean),
        )
        .filter("size_id", FilterDescriptor::direct(ColumnRef::base("size_id")))
        .filter("race_speed", FilterDescriptor::direct(ColumnRef::base("race_speed")))
        .filter(
            "favored_class_id",
            FilterDescriptor::direct(ColumnRef::base("favored_class_id"))
                .with_cache(lookups.classes.clone()),
        )
        .sort(SortSpec::column("race_name", ColumnRef::base("race_name")))
        .sort(SortSpec::column("edition_id", ColumnRef::base("edition_id")))
        .sort(SortSpec::column("race_speed", ColumnRef::base("race_speed")))
        .build()
}
