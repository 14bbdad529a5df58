use crate::errors::ConfigError;
use crate::filtering::config::{BaseSpec, ColumnRef, FilterConfig, FilterDescriptor, SortSpec, TableRef};

const RACE_TRAITS: TableRef = TableRef::new("race_traits", "rt");

/// # Errors
///
/// Returns a [`ConfigError`] if the declaration is inconsistent.
pub fn config() -> Result<FilterConfig, ConfigError> {
    FilterConfig::builder("race_traits", BaseSpec::new(RACE_TRAITS, "trait_slug", "trait_slug"))
        .filter("trait_name", FilterDescriptor::search(ColumnRef::base("trait_name")))
        .filter("trait_slug", FilterDescriptor::search(ColumnRef::base("trait_slug")))
        .filter(
            "trait_description",
            FilterDescriptor::search(ColumnRef::base("trait_description")),
        )
        .sort(SortSpec::column("trait_slug", ColumnRef::base("trait_slug")))
        .sort(SortSpec::column("trait_name", ColumnRef::base("trait_name")))
        .build()
}
