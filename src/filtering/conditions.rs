//! Turns normalized filters into `WHERE` and `HAVING` predicates.

use sea_orm::Value;

use crate::filtering::clause::{ExistsClause, Predicate, render};
use crate::filtering::config::{
    ColumnRef, FilterConfig, FilterDescriptor, FilterKind, FixedCondition, JoinSpec,
};
use crate::filtering::query_parser::Filters;
use crate::filtering::value::{FilterValue, Logic, Scalar};

/// Rendered filter SQL. The keywords `WHERE`/`HAVING` are not included and
/// empty strings mean no clause.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClauseBundle {
    pub where_sql: String,
    pub having_sql: String,
    pub where_params: Vec<Value>,
    pub having_params: Vec<Value>,
}

/// Predicates for the outer `WHERE` and `HAVING`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClausePredicates {
    pub where_clause: Vec<Predicate>,
    pub having_clause: Vec<Predicate>,
}

/// Build and render the filter clauses for a request.
pub fn build(filters: &Filters, config: &FilterConfig) -> ClauseBundle {
    let predicates = build_predicates(filters, config);
    let (where_sql, where_params) = render(&predicates.where_clause);
    let (having_sql, having_params) = render(&predicates.having_clause);
    debug_assert_eq!(placeholders(&predicates.where_clause), where_params.len());
    debug_assert_eq!(placeholders(&predicates.having_clause), having_params.len());
    ClauseBundle {
        where_sql,
        having_sql,
        where_params,
        having_params,
    }
}

/// Predicates in request order, followed by the multi-column search.
pub fn build_predicates(filters: &Filters, config: &FilterConfig) -> ClausePredicates {
    let mut predicates = ClausePredicates::default();

    for (key, value) in filters.iter() {
        let Some(descriptor) = config.descriptor(key) else {
            continue;
        };
        if value.is_empty() {
            continue;
        }
        let logic = if descriptor.supports_logic() {
            filters.logic(key)
        } else {
            Logic::Or
        };
        push_filter(descriptor, value, logic, config, &mut predicates);
    }

    if let Some(search) = filters.search() {
        let terms: Vec<Predicate> = search
            .keys
            .iter()
            .filter_map(|key| config.descriptor(key)?.searchable_column())
            .map(|column| Predicate::like(config.qualify(column), search.pattern.clone()))
            .collect();
        if !terms.is_empty() {
            predicates.where_clause.push(Predicate::AnyOf(terms));
        }
    }

    predicates
}

fn push_filter(
    descriptor: &FilterDescriptor,
    value: &FilterValue,
    logic: Logic,
    config: &FilterConfig,
    predicates: &mut ClausePredicates,
) {
    match *descriptor.kind() {
        FilterKind::Custom { column, handler } => {
            handler(&config.qualify(column), value, &mut predicates.where_clause);
        }
        FilterKind::Direct { column, fixed } => {
            let qualified = config.qualify(column);
            let values = value.as_slice();
            if values.len() > 1 && logic == Logic::And {
                predicates.having_clause.push(Predicate::CountDistinct {
                    column: qualified.clone(),
                    count: count_of(values),
                });
            }
            predicates.where_clause.push(match_values(qualified, values));
            let alias = config.alias(column.side);
            predicates
                .where_clause
                .extend(fixed.iter().map(|condition| fixed_predicate(alias, condition)));
        }
        FilterKind::Join(spec) => {
            predicates
                .where_clause
                .push(exists_predicate(&spec, value.as_slice(), logic, config));
        }
        FilterKind::Search { column, operator } => {
            if let Some(scalar) = value.as_slice().first() {
                predicates.where_clause.push(Predicate::AnyOf(vec![Predicate::Search {
                    column: config.qualify(column),
                    operator,
                    value: scalar.clone(),
                }]));
            }
        }
    }
}

/// `= ?` for a single value, `IN (...)` otherwise.
fn match_values(column: String, values: &[Scalar]) -> Predicate {
    match values {
        [single] => Predicate::eq(column, single.clone()),
        many => Predicate::is_in(column, many.to_vec()),
    }
}

fn exists_predicate(spec: &JoinSpec, values: &[Scalar], logic: Logic, config: &FilterConfig) -> Predicate {
    let alias = spec.table.alias;
    let inner_id = format!("{alias}.{}", spec.id_column);
    let filter_column = format!("{alias}.{}", spec.filter_column);

    let mut conditions = vec![match_values(filter_column.clone(), values)];
    conditions.extend(spec.fixed.iter().map(|condition| fixed_predicate(alias, condition)));

    let (group_by, having) = if values.len() > 1 && logic == Logic::And {
        (
            Some(inner_id.clone()),
            Some(Predicate::CountDistinct {
                column: filter_column,
                count: count_of(values),
            }),
        )
    } else {
        (None, None)
    };

    Predicate::Exists(Box::new(ExistsClause {
        table: spec.table,
        inner_id,
        outer_id: config.qualify(ColumnRef::base(spec.id_column)),
        conditions,
        group_by,
        having,
    }))
}

fn fixed_predicate(alias: &str, condition: &FixedCondition) -> Predicate {
    Predicate::Fixed {
        column: format!("{alias}.{}", condition.column),
        value: condition.value,
    }
}

fn placeholders(predicates: &[Predicate]) -> usize {
    predicates.iter().map(Predicate::placeholder_count).sum()
}

fn count_of(values: &[Scalar]) -> i64 {
    i64::try_from(values.len()).unwrap_or(i64::MAX)
}
