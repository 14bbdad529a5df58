//! Predicate tree for `WHERE` and `HAVING` fragments.
//!
//! SQL text is produced only by [`Predicate::write_to`], which appends each
//! `?` and pushes its bound value in the same step, so placeholders and
//! parameters cannot drift apart.

use sea_orm::Value;

use crate::filtering::config::{SearchOperator, TableRef};
use crate::filtering::value::Scalar;

#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// `column = ?`
    Eq { column: String, value: Scalar },
    /// `column LIKE ?`
    Search {
        column: String,
        operator: SearchOperator,
        value: Scalar,
    },
    /// `column IN (?, ?, ...)`
    In { column: String, values: Vec<Scalar> },
    /// `column = <literal>` for trusted, code-declared conditions
    Fixed { column: String, value: i64 },
    /// `COUNT(DISTINCT column) = ?`
    CountDistinct { column: String, count: i64 },
    /// `(a OR b ...)`
    AnyOf(Vec<Predicate>),
    Exists(Box<ExistsClause>),
}

/// `EXISTS (SELECT 1 FROM <table> <alias> WHERE <inner> = <outer> AND ...)`
#[derive(Debug, Clone, PartialEq)]
pub struct ExistsClause {
    pub table: TableRef,
    pub inner_id: String,
    pub outer_id: String,
    pub conditions: Vec<Predicate>,
    pub group_by: Option<String>,
    pub having: Option<Predicate>,
}

impl Predicate {
    pub fn eq(column: impl Into<String>, value: Scalar) -> Self {
        Self::Eq {
            column: column.into(),
            value,
        }
    }

    pub fn is_in(column: impl Into<String>, values: Vec<Scalar>) -> Self {
        Self::In {
            column: column.into(),
            values,
        }
    }

    pub fn like(column: impl Into<String>, pattern: impl Into<String>) -> Self {
        Self::Search {
            column: column.into(),
            operator: SearchOperator::Like,
            value: Scalar::Text(pattern.into()),
        }
    }

    /// Number of `?` placeholders this predicate renders.
    pub fn placeholder_count(&self) -> usize {
        match self {
            Self::Eq { .. } | Self::Search { .. } | Self::CountDistinct { .. } => 1,
            Self::In { values, .. } => values.len(),
            Self::Fixed { .. } => 0,
            Self::AnyOf(terms) => terms.iter().map(Self::placeholder_count).sum(),
            Self::Exists(exists) => {
                exists
                    .conditions
                    .iter()
                    .map(Self::placeholder_count)
                    .sum::<usize>()
                    + exists.having.as_ref().map_or(0, Self::placeholder_count)
            }
        }
    }

    pub fn write_to(&self, sql: &mut String, values: &mut Vec<Value>) {
        match self {
            Self::Eq { column, value } => {
                sql.push_str(column);
                sql.push_str(" = ?");
                values.push(value.to_value());
            }
            Self::Search {
                column,
                operator,
                value,
            } => {
                sql.push_str(column);
                sql.push(' ');
                sql.push_str(operator.as_sql());
                sql.push_str(" ?");
                values.push(value.to_value());
            }
            Self::In {
                column,
                values: items,
            } => {
                sql.push_str(column);
                sql.push_str(" IN (");
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        sql.push_str(", ");
                    }
                    sql.push('?');
                    values.push(item.to_value());
                }
                sql.push(')');
            }
            Self::Fixed { column, value } => {
                sql.push_str(column);
                sql.push_str(" = ");
                sql.push_str(&value.to_string());
            }
            Self::CountDistinct { column, count } => {
                sql.push_str("COUNT(DISTINCT ");
                sql.push_str(column);
                sql.push_str(") = ?");
                values.push(Value::from(*count));
            }
            Self::AnyOf(terms) => {
                sql.push('(');
                write_joined(terms, " OR ", sql, values);
                sql.push(')');
            }
            Self::Exists(exists) => exists.write_to(sql, values),
        }
    }
}

impl ExistsClause {
    fn write_to(&self, sql: &mut String, values: &mut Vec<Value>) {
        sql.push_str("EXISTS (SELECT 1 FROM ");
        sql.push_str(self.table.name);
        sql.push(' ');
        sql.push_str(self.table.alias);
        sql.push_str(" WHERE ");
        sql.push_str(&self.inner_id);
        sql.push_str(" = ");
        sql.push_str(&self.outer_id);
        for condition in &self.conditions {
            sql.push_str(" AND ");
            condition.write_to(sql, values);
        }
        if let Some(group_by) = &self.group_by {
            sql.push_str(" GROUP BY ");
            sql.push_str(group_by);
        }
        if let Some(having) = &self.having {
            sql.push_str(" HAVING ");
            having.write_to(sql, values);
        }
        sql.push(')');
    }
}

fn write_joined(predicates: &[Predicate], separator: &str, sql: &mut String, values: &mut Vec<Value>) {
    for (i, predicate) in predicates.iter().enumerate() {
        if i > 0 {
            sql.push_str(separator);
        }
        predicate.write_to(sql, values);
    }
}

/// Render predicates joined with ` AND `. An empty slice renders nothing.
pub fn render(predicates: &[Predicate]) -> (String, Vec<Value>) {
    let mut sql = String::new();
    let mut values = Vec::new();
    write_joined(predicates, " AND ", &mut sql, &mut values);
    (sql, values)
}
