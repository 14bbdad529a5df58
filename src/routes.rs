//! List endpoints, one per [`Resource`].
//!
//! Every endpoint runs the same pipeline: normalize the query string, reject
//! the request with every error found, compile, execute, and answer with
//! `{ page, limit, total, results }` plus a `Content-Range` header.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Query, State},
    http::HeaderMap,
    routing::get,
};
use sea_orm::{ConnectionTrait, DatabaseConnection, JsonValue};

use crate::errors::ApiError;
use crate::filtering::pagination::calculate_content_range;
use crate::filtering::query_parser::process;
use crate::filtering::value::RawParams;
use crate::operations::{ListPage, fetch_page};
use crate::query::build_list_query;
use crate::resources::{Catalog, Resource};

#[derive(Debug, Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub catalog: Arc<Catalog>,
}

impl AppState {
    pub fn new(db: DatabaseConnection, catalog: Catalog) -> Self {
        Self {
            db,
            catalog: Arc::new(catalog),
        }
    }
}

/// Mount `GET` list routes for every resource.
pub fn router(state: AppState) -> Router {
    Resource::ALL
        .into_iter()
        .fold(Router::new(), |router, resource| {
            router.route(
                resource.path(),
                get(
                    move |State(state): State<AppState>, Query(pairs): Query<Vec<(String, String)>>| async move {
                        list_resource(resource, &state, pairs).await
                    },
                ),
            )
        })
        .with_state(state)
}

/// Run one list request for `resource`.
///
/// # Errors
///
/// Returns [`ApiError::BadRequest`] with every filter error when the query
/// string is rejected, and a 500-class [`ApiError`] for cache or database
/// failures.
pub async fn list_resource(
    resource: Resource,
    state: &AppState,
    pairs: Vec<(String, String)>,
) -> Result<(HeaderMap, Json<ListPage<JsonValue>>), ApiError> {
    let config = state.catalog.config(resource);
    let raw = RawParams::from_pairs(pairs);

    let request = process(&raw, config)?;
    if !request.is_valid() {
        return Err(ApiError::bad_request(&request.errors));
    }

    let query = build_list_query(config, &request, state.db.get_database_backend())?;
    let page = fetch_page(&state.db, &query, request.pagination, resource.name()).await?;

    let headers = calculate_content_range(
        request.pagination.offset(),
        request.pagination.limit,
        page.total,
        resource.name(),
    );
    Ok((headers, Json(page)))
}
