//! Validation and normalization of raw list-request parameters.
//!
//! [`process`] never fails on bad client input: every problem is collected
//! into [`NormalizedRequest::errors`] so the client can fix them all at once.
//! It only returns `Err` when a lookup cache cannot be consulted.

use std::collections::{HashMap, HashSet};

use indexmap::IndexMap;

use crate::errors::{FilterError, QueryError};
use crate::filtering::config::{DataType, FilterConfig, FilterDescriptor};
use crate::filtering::pagination::{Pagination, parse_limit, parse_page};
use crate::filtering::sort::{Sort, parse_sorting};
use crate::filtering::value::{FilterValue, Logic, RawParams, RawValue, Scalar};

/// Keys accepted on every entity in addition to its filters.
pub const RESERVED_PARAMS: [&str; 6] = ["page", "limit", "sort", "order", "mclist", "mcfilter"];

/// `mclist=a,b&mcfilter=text`: one pattern matched against several columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultiColumnSearch {
    pub keys: Vec<&'static str>,
    /// Already wrapped as `%text%`
    pub pattern: String,
}

/// Coerced filter values in first-appearance order, with their logic
/// companions kept alongside rather than as separate entries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filters {
    values: IndexMap<&'static str, FilterValue>,
    logic: HashMap<&'static str, Logic>,
    search: Option<MultiColumnSearch>,
}

impl Filters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: &'static str, value: FilterValue) {
        self.values.insert(key, value);
    }

    pub fn set_logic(&mut self, key: &'static str, logic: Logic) {
        self.logic.insert(key, logic);
    }

    pub fn set_search(&mut self, search: MultiColumnSearch) {
        self.search = Some(search);
    }

    pub fn get(&self, key: &str) -> Option<&FilterValue> {
        self.values.get(key)
    }

    /// Logic for a key; OR unless the request said otherwise.
    pub fn logic(&self, key: &str) -> Logic {
        self.logic.get(key).copied().unwrap_or_default()
    }

    pub fn search(&self) -> Option<&MultiColumnSearch> {
        self.search.as_ref()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &FilterValue)> {
        self.values.iter().map(|(key, value)| (*key, value))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedRequest {
    pub filters: Filters,
    pub pagination: Pagination,
    pub sort: Sort,
    pub errors: Vec<FilterError>,
    pub use_alternate_base_table: bool,
}

impl NormalizedRequest {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

enum Coerced {
    Value(FilterValue),
    /// Empty input: the filter is omitted without error
    Empty,
    Rejected(Vec<FilterError>),
}

/// Validate `raw` against `config` and produce a normalized request.
///
/// # Errors
///
/// Returns [`QueryError::Cache`] when a lookup cache needed by the request is
/// not ready. Client mistakes are reported through
/// [`NormalizedRequest::errors`] instead.
pub fn process(raw: &RawParams, config: &FilterConfig) -> Result<NormalizedRequest, QueryError> {
    let mut filters = Filters::new();
    let mut errors = Vec::new();
    let mut use_alternate_base_table = false;
    let mut mclist: Option<&RawValue> = None;
    let mut mcfilter: Option<&RawValue> = None;

    for (key, value) in raw.iter() {
        match key {
            "page" | "limit" | "sort" | "order" => continue,
            "mclist" => {
                mclist = Some(value);
                continue;
            }
            "mcfilter" => {
                mcfilter = Some(value);
                continue;
            }
            _ => {}
        }

        if let Some((key, descriptor)) = config.entry(key) {
            match coerce(key, value, descriptor)? {
                Coerced::Value(value) => {
                    if descriptor.is_base_table_decider() && !value.is_empty() {
                        use_alternate_base_table = true;
                    }
                    filters.insert(key, value);
                }
                Coerced::Empty => {}
                Coerced::Rejected(mut rejected) => errors.append(&mut rejected),
            }
        } else if let Some((base_key, descriptor)) =
            key.strip_suffix("_logic").and_then(|base| config.entry(base))
        {
            if descriptor.supports_logic() {
                filters.set_logic(base_key, Logic::parse(value.first()));
            } else {
                errors.push(FilterError::UnsupportedLogic {
                    key: base_key.to_string(),
                });
            }
        } else {
            errors.push(FilterError::UnknownParameter {
                key: key.to_string(),
            });
        }
    }

    if let Some(list) = mclist {
        match parse_search(list, mcfilter, config) {
            Ok(Some(search)) => filters.set_search(search),
            Ok(None) => {}
            Err(err) => errors.push(err),
        }
    }

    let pagination = Pagination {
        page: parse_page(raw.get("page").map(RawValue::first)),
        limit: parse_limit(raw.get("limit").map(RawValue::first), config.default_limit()),
    };
    let sort = parse_sorting(
        raw.get("sort").map(RawValue::first),
        raw.get("order").map(RawValue::first),
        config,
    );

    Ok(NormalizedRequest {
        filters,
        pagination,
        sort,
        errors,
        use_alternate_base_table,
    })
}

fn coerce(key: &str, raw: &RawValue, descriptor: &FilterDescriptor) -> Result<Coerced, QueryError> {
    if descriptor.is_multi_valued() {
        coerce_many(key, raw, descriptor)
    } else {
        coerce_one(key, raw, descriptor)
    }
}

fn coerce_many(key: &str, raw: &RawValue, descriptor: &FilterDescriptor) -> Result<Coerced, QueryError> {
    let elements = raw.elements();
    if elements.is_empty() {
        return Ok(Coerced::Empty);
    }

    let mut seen = HashSet::new();
    let mut values = Vec::with_capacity(elements.len());
    let mut misses = Vec::new();
    for element in elements {
        let scalar = match descriptor.cache() {
            Some(cache) => match cache.get_id(element)? {
                Some(id) => Some(Scalar::Int(id)),
                None => {
                    misses.push(FilterError::LookupNotFound {
                        key: key.to_string(),
                        value: element.to_string(),
                    });
                    None
                }
            },
            None => parse_scalar(element, descriptor.data_type_of()),
        };
        // Repeated values would inflate the AND-logic count
        if let Some(scalar) = scalar
            && seen.insert(scalar.clone())
        {
            values.push(scalar);
        }
    }

    if !misses.is_empty() {
        return Ok(Coerced::Rejected(misses));
    }
    if values.is_empty() {
        return Ok(Coerced::Rejected(vec![FilterError::NoValidValues {
            key: key.to_string(),
            original: raw.as_text(),
        }]));
    }
    Ok(Coerced::Value(FilterValue::List(values)))
}

fn coerce_one(key: &str, raw: &RawValue, descriptor: &FilterDescriptor) -> Result<Coerced, QueryError> {
    let text = raw.first();
    if text.trim().is_empty() {
        return Ok(Coerced::Empty);
    }

    if descriptor.is_search() {
        return Ok(Coerced::Value(FilterValue::Single(Scalar::Text(format!("%{text}%")))));
    }

    let scalar = match descriptor.cache() {
        Some(cache) => match cache.get_id(text)? {
            Some(id) => Scalar::Int(id),
            None => {
                return Ok(Coerced::Rejected(vec![FilterError::LookupNotFound {
                    key: key.to_string(),
                    value: text.to_string(),
                }]));
            }
        },
        None => match parse_scalar(text, descriptor.data_type_of()) {
            Some(scalar) => scalar,
            None => {
                return Ok(Coerced::Rejected(vec![FilterError::InvalidValue {
                    key: key.to_string(),
                    value: text.to_string(),
                }]));
            }
        },
    };
    Ok(Coerced::Value(FilterValue::Single(scalar)))
}

fn parse_scalar(text: &str, data_type: DataType) -> Option<Scalar> {
    match data_type {
        DataType::String => Some(Scalar::Text(text.to_string())),
        DataType::Int => text.trim().parse::<i64>().ok().map(Scalar::Int),
        DataType::Boolean => parse_bool(text).map(Scalar::Bool),
    }
}

fn parse_bool(text: &str) -> Option<bool> {
    match text.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Some(true),
        "false" | "0" | "no" => Some(false),
        _ => None,
    }
}

/// `Ok(None)` when there is no usable pattern to search for.
fn parse_search(
    list: &RawValue,
    filter: Option<&RawValue>,
    config: &FilterConfig,
) -> Result<Option<MultiColumnSearch>, FilterError> {
    let mut keys = Vec::new();
    let mut invalid = Vec::new();
    for element in list.elements() {
        match config.entry(element) {
            Some((key, descriptor)) if descriptor.searchable_column().is_some() => {
                if !keys.contains(&key) {
                    keys.push(key);
                }
            }
            _ => invalid.push(element.to_string()),
        }
    }
    if !invalid.is_empty() {
        return Err(FilterError::InvalidSearchColumns { columns: invalid });
    }

    let text = filter.map_or("", RawValue::first);
    if keys.is_empty() || text.trim().is_empty() {
        return Ok(None);
    }
    Ok(Some(MultiColumnSearch {
        keys,
        pattern: format!("%{text}%"),
    }))
}
