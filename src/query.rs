//! # List Query Assembly
//!
//! Combines a validated [`NormalizedRequest`] with its [`FilterConfig`] into a
//! single statement:
//!
//! ```sql
//! SELECT sp.*, <sort select>, <aggregates>, COUNT(*) OVER() AS total_count
//! FROM ... [JOIN ...]
//! WHERE ...
//! GROUP BY sp.spell_id
//! HAVING ...
//! ORDER BY ...
//! LIMIT ? OFFSET ?
//! ```
//!
//! Parameters are bound in the order `[where..., having..., limit, offset]`.

use sea_orm::{DatabaseBackend, Statement, Value};

use crate::errors::QueryError;
use crate::filtering::conditions::build;
use crate::filtering::config::{FilterConfig, FilterKind, FixedCondition, SummaryFunction};
use crate::filtering::query_parser::NormalizedRequest;
use crate::filtering::sort::sort_clause;

/// Which `FROM` skeleton a request compiles against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BaseTable {
    #[default]
    Primary,
    /// The mapping table drives the query and joins the primary table
    Alternate,
}

impl BaseTable {
    pub fn for_request(request: &NormalizedRequest) -> Self {
        if request.use_alternate_base_table {
            Self::Alternate
        } else {
            Self::Primary
        }
    }

    pub fn is_alternate(self) -> bool {
        self == Self::Alternate
    }

    /// `FROM ...` plus the join to the other base table, if any.
    pub fn from_clause(self, config: &FilterConfig) -> String {
        let base = config.base();
        let primary = base.table;
        match (self, base.alt) {
            (Self::Alternate, Some(alt)) => format!(
                "FROM {alt_name} {alt_alias} JOIN {name} {alias} ON {alt_alias}.{column} = {alias}.{column}",
                alt_name = alt.table.name,
                alt_alias = alt.table.alias,
                name = primary.name,
                alias = primary.alias,
                column = alt.join_column,
            ),
            (Self::Primary, Some(alt)) => format!(
                "FROM {name} {alias} LEFT JOIN {alt_name} {alt_alias} ON {alias}.{column} = {alt_alias}.{column}{fixed}",
                name = primary.name,
                alias = primary.alias,
                alt_name = alt.table.name,
                alt_alias = alt.table.alias,
                column = alt.join_column,
                fixed = fixed_suffix(alt.table.alias, alt.fixed),
            ),
            (_, None) => format!("FROM {} {}", primary.name, primary.alias),
        }
    }
}

fn fixed_suffix(alias: &str, fixed: &[FixedCondition]) -> String {
    fixed
        .iter()
        .map(|condition| format!(" AND {alias}.{} = {}", condition.column, condition.value))
        .collect()
}

/// A compiled list statement ready for execution.
#[derive(Debug, Clone, PartialEq)]
pub struct ListQuery {
    pub sql: String,
    pub values: Vec<Value>,
    pub base_table: BaseTable,
}

impl ListQuery {
    pub fn statement(&self, backend: DatabaseBackend) -> Statement {
        Statement::from_sql_and_values(backend, self.sql.clone(), self.values.clone())
    }
}

/// Select-list aggregates and the junction or child joins that feed them.
struct Aggregates {
    select: Vec<String>,
    joins: Vec<String>,
}

fn aggregates(config: &FilterConfig, backend: DatabaseBackend) -> Aggregates {
    let base = config.base().table;
    let mut select = Vec::new();
    let mut joins: Vec<String> = Vec::new();
    let mut joined_aliases: Vec<&str> = Vec::new();

    for (_, descriptor) in config.descriptors() {
        let Some(aggregate) = descriptor.aggregate_column() else {
            continue;
        };
        let (alias, column) = match *descriptor.kind() {
            FilterKind::Join(spec) => {
                if !joined_aliases.contains(&spec.table.alias) {
                    joined_aliases.push(spec.table.alias);
                    joins.push(format!(
                        "LEFT JOIN {table} {alias} ON {base_alias}.{id} = {alias}.{id}{fixed}",
                        table = spec.table.name,
                        alias = spec.table.alias,
                        base_alias = base.alias,
                        id = spec.id_column,
                        fixed = fixed_suffix(spec.table.alias, spec.fixed),
                    ));
                }
                (spec.table.alias, spec.filter_column)
            }
            FilterKind::Direct { column, .. }
            | FilterKind::Search { column, .. }
            | FilterKind::Custom { column, .. } => (config.alias(column.side), column.name),
        };

        let expression = match aggregate.paired_with {
            Some(paired) => concat_pair(backend, &format!("{alias}.{column}"), &format!("{alias}.{paired}")),
            None => format!("{alias}.{column}"),
        };
        select.push(format!("GROUP_CONCAT(DISTINCT {expression}) AS {}", aggregate.alias));
    }

    let group_column = config.base().group_column;
    for summary in config.summaries() {
        let table = summary.table;
        if !joined_aliases.contains(&table.alias) {
            joined_aliases.push(table.alias);
            joins.push(format!(
                "LEFT JOIN {name} {alias} ON {base_alias}.{group_column} = {alias}.{parent}",
                name = table.name,
                alias = table.alias,
                base_alias = base.alias,
                parent = summary.parent_column,
            ));
        }
        let column = format!("{}.{}", table.alias, summary.column);
        select.push(match summary.function {
            SummaryFunction::Count => format!("COUNT(DISTINCT {column}) AS {}", summary.alias),
            SummaryFunction::NextIndex => format!("COALESCE(MAX({column}) + 1, 0) AS {}", summary.alias),
        });
    }

    Aggregates { select, joins }
}

fn concat_pair(backend: DatabaseBackend, left: &str, right: &str) -> String {
    match backend {
        DatabaseBackend::Sqlite => format!("{left} || ':' || {right}"),
        _ => format!("CONCAT({left}, ':', {right})"),
    }
}

fn to_param(value: u64) -> Value {
    Value::from(i64::try_from(value).unwrap_or(i64::MAX))
}

/// Assemble the full list statement for a validated request.
///
/// # Errors
///
/// Returns [`QueryError::InvalidRequest`] if the request carries filter
/// errors and [`QueryError::UnsupportedBackend`] for backends that do not use
/// `?` placeholders.
pub fn build_list_query(
    config: &FilterConfig,
    request: &NormalizedRequest,
    backend: DatabaseBackend,
) -> Result<ListQuery, QueryError> {
    if !request.errors.is_empty() {
        return Err(QueryError::InvalidRequest(request.errors.clone()));
    }
    if backend == DatabaseBackend::Postgres {
        return Err(QueryError::UnsupportedBackend(backend));
    }

    let base_table = BaseTable::for_request(request);
    let base = config.base();
    let alias = base.table.alias;
    let clauses = build(&request.filters, config);
    let Aggregates { select: aggregate_select, joins } = aggregates(config, backend);

    let sort_spec = config
        .sort(request.sort.sort_by)
        .or_else(|| config.sort(base.default_sort));
    let sort = sort_spec.map(|spec| sort_clause(spec, request.sort, config, base_table.is_alternate()));

    let mut select = vec![format!("{alias}.*")];
    select.extend(sort.as_ref().and_then(|sort| sort.select.clone()));
    select.extend(aggregate_select);
    select.push("COUNT(*) OVER() AS total_count".to_string());

    let mut sql = format!("SELECT {} {}", select.join(", "), base_table.from_clause(config));
    for join in &joins {
        sql.push(' ');
        sql.push_str(join);
    }
    if !clauses.where_sql.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&clauses.where_sql);
    }
    sql.push_str(&format!(" GROUP BY {alias}.{}", base.group_column));
    if !clauses.having_sql.is_empty() {
        sql.push_str(" HAVING ");
        sql.push_str(&clauses.having_sql);
    }
    let order_by = sort.map_or_else(|| format!("{alias}.{} ASC", base.group_column), |sort| sort.order_by);
    sql.push_str(" ORDER BY ");
    sql.push_str(&order_by);
    sql.push_str(" LIMIT ? OFFSET ?");

    let mut values = clauses.where_params;
    values.extend(clauses.having_params);
    values.push(to_param(request.pagination.limit));
    values.push(to_param(request.pagination.offset()));

    tracing::debug!(
        resource = config.resource(),
        base_table = ?base_table,
        params = values.len(),
        sql = %sql,
        "compiled list query"
    );

    Ok(ListQuery {
        sql,
        values,
        base_table,
    })
}
