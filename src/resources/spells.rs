//! Spell list filters.
//!
//! Spells drive the only alternate base table: filtering by class means
//! querying through `spell_level_map`, where a spell has one row per class.

use std::sync::Arc;

use crate::errors::ConfigError;
use crate::filtering::clause::Predicate;
use crate::filtering::config::{
    Aggregate, AltTable, BaseSpec, ColumnRef, FilterConfig, FilterDescriptor, FixedCondition,
    JoinSpec, SortColumn, SortSpec, SqlFunction, TableRef,
};
use crate::filtering::value::{FilterValue, Scalar};
use crate::lookup::LookupTable;
use crate::resources::Lookups;

const SPELLS: TableRef = TableRef::new("spells", "sp");
const LEVEL_MAP: TableRef = TableRef::new("spell_level_map", "slm");
const SCHOOL_MAP: TableRef = TableRef::new("spell_school_map", "ssm");
const SUBSCHOOL_MAP: TableRef = TableRef::new("spell_subschool_map", "ssubm");
const DESCRIPTOR_MAP: TableRef = TableRef::new("spell_descriptor_map", "sdm");
const COMPONENT_MAP: TableRef = TableRef::new("spell_component_map", "scm");
const SOURCE_MAP: TableRef = TableRef::new("spell_source_map", "ssm_src");

const DISPLAYED: &[FixedCondition] = &[FixedCondition::eq("display", 1)];

/// 3E rules are published alongside 3.5E, so asking for 3E matches both.
const EDITION_3E: i64 = 4;
const EDITION_35E: i64 = 5;

fn edition_predicate(column: &str, value: &FilterValue, out: &mut Vec<Predicate>) {
    match value.as_slice() {
        [Scalar::Int(EDITION_3E)] => out.push(Predicate::is_in(
            column,
            vec![Scalar::Int(EDITION_3E), Scalar::Int(EDITION_35E)],
        )),
        [single] => out.push(Predicate::eq(column, single.clone())),
        _ => {}
    }
}

fn tag_filter(table: TableRef, filter_column: &'static str, cache: &Arc<LookupTable>) -> FilterDescriptor {
    FilterDescriptor::join(JoinSpec::new(table, "spell_id", filter_column))
        .multi_valued()
        .with_logic()
        .with_cache(cache.clone())
}

/// # Errors
///
/// Returns a [`ConfigError`] if the declaration is inconsistent.
pub fn config(lookups: &Lookups) -> Result<FilterConfig, ConfigError> {
    let base = BaseSpec::new(SPELLS, "spell_id", "spell_name")
        .with_alternate(AltTable::new(LEVEL_MAP, "spell_id").with_fixed(DISPLAYED));

    FilterConfig::builder("spells", base)
        .filter("name", FilterDescriptor::search(ColumnRef::base("spell_name")))
        .filter(
            "classId",
            FilterDescriptor::direct(ColumnRef::alt("class_id"))
                .multi_valued()
                .with_logic()
                .base_table_decider()
                .fixed(DISPLAYED)
                .with_cache(lookups.classes.clone())
                .aggregate(Aggregate::pair("spell_level", "class_info")),
        )
        .filter("spell_level", FilterDescriptor::direct(ColumnRef::alt("spell_level")))
        .filter(
            "school",
            tag_filter(SCHOOL_MAP, "school_id", &lookups.schools)
                .aggregate(Aggregate::distinct("school_ids")),
        )
        .filter(
            "subschool",
            tag_filter(SUBSCHOOL_MAP, "sub_id", &lookups.subschools)
                .aggregate(Aggregate::distinct("subschool_ids")),
        )
        .filter(
            "descriptors",
            tag_filter(DESCRIPTOR_MAP, "desc_id", &lookups.descriptors)
                .aggregate(Aggregate::distinct("desc_ids")),
        )
        .filter(
            "components",
            tag_filter(COMPONENT_MAP, "comp_id", &lookups.components)
                .aggregate(Aggregate::distinct("component_ids")),
        )
        .filter(
            "source",
            tag_filter(SOURCE_MAP, "book_id", &lookups.sources)
                .fixed(DISPLAYED)
                .aggregate(Aggregate::pair("page_number", "source_info")),
        )
        .filter(
            "edition_id",
            FilterDescriptor::custom(ColumnRef::base("edition_id"), edition_predicate)
                .with_cache(lookups.editions.clone()),
        )
        .sort(SortSpec::column("spell_name", ColumnRef::base("spell_name")))
        .sort(
            SortSpec::column("spell_level", ColumnRef::base("spell_level")).on_alternate(
                SortColumn::new(ColumnRef::alt("spell_level"))
                    .function(SqlFunction::Min)
                    .alias("spell_level"),
            ),
        )
        .sort(SortSpec::column("classId", ColumnRef::alt("class_id")))
        .build()
}
