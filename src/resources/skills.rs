use crate::errors::ConfigError;
use crate::filtering::config::{
    BaseSpec, ColumnRef, DataType, FilterConfig, FilterDescriptor, SortSpec, TableRef,
};

const SKILLS: TableRef = TableRef::new("skills", "sk");

const TEXT_COLUMNS: [&str; 7] = [
    "skill_description",
    "skill_check",
    "skill_action",
    "skill_try_again_desc",
    "skill_special",
    "skill_synergy_desc",
    "untrained_desc",
];

const FLAG_COLUMNS: [&str; 3] = ["trained_only", "skill_armor_check_penalty", "skill_try_again"];

/// # Errors
///
/// Returns a [`ConfigError`] if the declaration is inconsistent.
pub fn config() -> Result<FilterConfig, ConfigError> {
    let builder = FilterConfig::builder("skills", BaseSpec::new(SKILLS, "skill_id", "skill_name"))
        .filter("skill_name", FilterDescriptor::search(ColumnRef::base("skill_name")))
        .filter("ability_id", FilterDescriptor::direct(ColumnRef::base("ability_id")));

    let builder = TEXT_COLUMNS.into_iter().fold(builder, |builder, column| {
        builder.filter(
            column,
            FilterDescriptor::direct(ColumnRef::base(column)).data_type(DataType::String),
        )
    });
    let builder = FLAG_COLUMNS.into_iter().fold(builder, |builder, column| {
        builder.filter(
            column,
            FilterDescriptor::direct(ColumnRef::base(column)).data_type(DataType::Boolean),
        )
    });

    builder
        .sort(SortSpec::column("skill_name", ColumnRef::base("skill_name")))
        .sort(SortSpec::column("ability_id", ColumnRef::base("ability_id")))
        .sort(SortSpec::column("trained_only", ColumnRef::base("trained_only")))
        .build()
}
