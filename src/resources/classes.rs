use crate::errors::ConfigError;
use crate::filtering::config::{
    BaseSpec, ColumnRef, DataType, FilterConfig, FilterDescriptor, JoinSpec, SortSpec, TableRef,
};
use crate::resources::Lookups;

const CLASSES: TableRef = TableRef::new("classes", "c");
const SOURCE_MAP: TableRef = TableRef::new("class_source_map", "csm");

const SORTABLE: [&str; 7] = [
    "class_name",
    "class_abbr",
    "edition_id",
    "is_prestige_class",
    "display",
    "caster",
    "hit_die",
];

/// # Errors
///
/// Returns a [`ConfigError`] if the declaration is inconsistent.
pub fn config(lookups: &Lookups) -> Result<FilterConfig, ConfigError> {
    let flag = |column| FilterDescriptor::direct(ColumnRef::base(column)).data_type(DataType::Boolean);

    let builder = FilterConfig::builder("classes", BaseSpec::new(CLASSES, "class_id", "class_name"))
        .filter(
            "class_name",
            FilterDescriptor::direct(ColumnRef::base("class_name")).data_type(DataType::String),
        )
        .filter(
            "class_abbr",
            FilterDescriptor::direct(ColumnRef::base("class_abbr")).data_type(DataType::String),
        )
        .filter(
            "edition_id",
            FilterDescriptor::direct(ColumnRef::base("edition_id"))
                .multi_valued()
                .with_logic(),
        )
        .filter("is_prestige_class", flag("is_prestige_class"))
        .filter("display", flag("display"))
        .filter("caster", flag("caster"))
        .filter(
            "hit_die",
            FilterDescriptor::direct(ColumnRef::base("hit_die"))
                .multi_valued()
                .with_logic(),
        )
        .filter(
            "source",
            FilterDescriptor::join(JoinSpec::new(SOURCE_MAP, "class_id", "book_id"))
                .multi_valued()
                .with_logic()
                .with_cache(lookups.sources.clone()),
        );

    SORTABLE
        .into_iter()
        .fold(builder, |builder, key| {
            builder.sort(SortSpec::column(key, ColumnRef::base(key)))
        })
        .build()
}
