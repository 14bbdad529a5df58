//! Executes compiled list queries through sea-orm.

use std::time::Instant;

use sea_orm::{ConnectionTrait, DbErr, FromQueryResult, JsonValue, QueryResult};
use serde::Serialize;

use crate::filtering::pagination::Pagination;
use crate::query::ListQuery;

/// Window-function column carrying the unpaginated row count.
pub const TOTAL_COUNT_COLUMN: &str = "total_count";

/// One page of results plus the total number of matching rows.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ListPage<M> {
    pub page: u64,
    pub limit: u64,
    pub total: u64,
    pub results: Vec<M>,
}

/// Read the total from the first row; an empty page has a total of 0.
fn total_of(rows: &[QueryResult]) -> Result<u64, DbErr> {
    match rows.first() {
        Some(row) => {
            let total = row.try_get::<i64>("", TOTAL_COUNT_COLUMN)?;
            Ok(u64::try_from(total).unwrap_or(0))
        }
        None => Ok(0),
    }
}

async fn query_rows<C: ConnectionTrait>(db: &C, query: &ListQuery, label: &str) -> Result<Vec<QueryResult>, DbErr> {
    let started = Instant::now();
    let result = db.query_all(query.statement(db.get_database_backend())).await;
    tracing::debug!(
        query = label,
        elapsed_ms = started.elapsed().as_millis(),
        rows = result.as_ref().map_or(0, Vec::len),
        "list query executed"
    );
    result
}

/// Execute `query` and map each row to `M`.
///
/// # Errors
///
/// Returns a [`DbErr`] if the statement fails or a row cannot be converted.
pub async fn fetch_page_as<C, M>(
    db: &C,
    query: &ListQuery,
    pagination: Pagination,
    label: &str,
) -> Result<ListPage<M>, DbErr>
where
    C: ConnectionTrait,
    M: FromQueryResult,
{
    let rows = query_rows(db, query, label).await?;
    let total = total_of(&rows)?;
    let results = rows
        .iter()
        .map(|row| M::from_query_result(row, ""))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(ListPage {
        page: pagination.page,
        limit: pagination.limit,
        total,
        results,
    })
}

/// Execute `query` and return rows as JSON objects without the total column.
///
/// # Errors
///
/// Returns a [`DbErr`] if the statement fails or a row cannot be converted.
pub async fn fetch_page<C: ConnectionTrait>(
    db: &C,
    query: &ListQuery,
    pagination: Pagination,
    label: &str,
) -> Result<ListPage<JsonValue>, DbErr> {
    let mut page = fetch_page_as::<C, JsonValue>(db, query, pagination, label).await?;
    for row in &mut page.results {
        if let JsonValue::Object(map) = row {
            map.remove(TOTAL_COUNT_COLUMN);
        }
    }
    Ok(page)
}
