//! # Error Handling
//!
//! Two layers of errors live here:
//!
//! - **Request errors** ([`FilterError`]) describe problems with an incoming
//!   query string. They are collected, never thrown, so a client can fix every
//!   problem in one round trip.
//! - **Fatal errors** ([`QueryError`], [`CacheError`], [`ConfigError`]) are
//!   precondition failures: an uninitialized lookup cache, an invalid entity
//!   configuration, or an attempt to assemble SQL for a rejected request.
//!
//! [`ApiError`] maps both onto HTTP responses. Internal details are logged
//! with `tracing` and never sent to clients.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use sea_orm::{DatabaseBackend, DbErr};
use serde::Serialize;
use std::fmt;

/// A problem with a single query parameter.
///
/// The `Display` text is the exact message reported to clients.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FilterError {
    /// A key that is neither a configured filter nor a reserved parameter.
    #[error("Invalid query parameter: {key}")]
    UnknownParameter { key: String },

    /// A `<key>_logic` companion for a filter that has no AND/OR support.
    #[error("Logic parameter {key}_logic not supported for {key}")]
    UnsupportedLogic { key: String },

    /// A cache-backed value that did not resolve to an id.
    #[error("{key} not found: {value}")]
    LookupNotFound { key: String, value: String },

    /// A multi-valued filter whose non-empty input had no valid element.
    #[error("No valid IDs found for {key}: {original}")]
    NoValidValues { key: String, original: String },

    /// A single value that cannot be coerced to the declared type.
    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },

    /// `mclist` named keys that are not searchable columns.
    #[error("Invalid columns in mclist: {}", .columns.join(", "))]
    InvalidSearchColumns { columns: Vec<String> },
}

/// Lookup cache failures. All of them are fatal for the request.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("{cache} lookup cache is not initialized")]
    NotReady { cache: String },

    #[error("{cache} lookup cache lock is poisoned")]
    Poisoned { cache: String },

    #[error("failed to load {cache} lookup cache: {source}")]
    Load {
        cache: String,
        #[source]
        source: DbErr,
    },
}

/// Invalid entity filter configuration, raised once at startup.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("{resource}: filter key `{key}` is declared twice")]
    DuplicateKey { resource: String, key: String },

    #[error("{resource}: filter key `{key}` collides with a reserved parameter")]
    ReservedKey { resource: String, key: String },

    #[error("{resource}: `{key}` is multi-valued or supports logic but is neither a join nor a direct column")]
    MissingJoin { resource: String, key: String },

    #[error("{resource}: `{key}` refers to the alternate base table, which is not configured")]
    MissingAlternateTable { resource: String, key: String },

    #[error("{resource}: default sort `{sort}` is not an allowed sort key")]
    UnknownDefaultSort { resource: String, sort: String },

    #[error("{resource}: default limit must be greater than zero")]
    InvalidDefaultLimit { resource: String },
}

/// Fatal failures while compiling a list query.
#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    #[error(transparent)]
    Cache(#[from] CacheError),

    #[error("request rejected with {} filter error(s)", .0.len())]
    InvalidRequest(Vec<FilterError>),

    #[error("{0:?} backend is not supported; queries use `?` placeholders")]
    UnsupportedBackend(DatabaseBackend),
}

/// Startup failures while building the resource catalog.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error(transparent)]
    Cache(#[from] CacheError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// API error type with automatic logging and sanitized responses
#[derive(Debug)]
pub enum ApiError {
    /// 400 Bad Request - every filter error found in the request
    BadRequest {
        /// User-facing error messages
        errors: Vec<String>,
    },

    /// 500 Internal Server Error - Database error (details logged, not exposed)
    Database {
        /// User-facing generic message
        message: String,
        /// Internal error (logged, not sent to user)
        internal: DbErr,
    },

    /// 500 Internal Server Error - Generic internal error
    Internal {
        /// User-facing generic message
        message: String,
        /// Internal error details (logged, not sent to user)
        internal: Option<String>,
    },
}

impl ApiError {
    /// Create a 400 Bad Request error from filter errors
    pub fn bad_request(errors: &[FilterError]) -> Self {
        Self::BadRequest {
            errors: errors.iter().map(ToString::to_string).collect(),
        }
    }

    /// Create a 500 Internal Server Error from a database error
    pub fn database(err: DbErr) -> Self {
        Self::Database {
            message: "A database error occurred".to_string(),
            internal: err,
        }
    }

    /// Create a 500 Internal Server Error with optional details
    pub fn internal(message: impl Into<String>, internal: Option<String>) -> Self {
        Self::Internal {
            message: message.into(),
            internal,
        }
    }

    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest { .. } => StatusCode::BAD_REQUEST,
            Self::Database { .. } | Self::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the user-facing error message (sanitized)
    pub fn user_message(&self) -> String {
        match self {
            Self::BadRequest { errors } => errors.join("; "),
            Self::Database { message, .. } | Self::Internal { message, .. } => message.clone(),
        }
    }

    /// Log internal error details (not sent to user)
    fn log_internal(&self) {
        match self {
            Self::Database { internal, .. } => {
                tracing::error!(error = ?internal, "Database error occurred");
            }
            Self::Internal {
                internal: Some(details),
                ..
            } => {
                tracing::error!(details = %details, "Internal error occurred");
            }
            _ => {
                tracing::debug!(
                    error = %self.user_message(),
                    status = %self.status_code(),
                    "API error"
                );
            }
        }
    }
}

/// Error response sent to users (sanitized)
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<Vec<String>>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        self.log_internal();

        let status = self.status_code();
        let response = match &self {
            Self::BadRequest { errors } => ErrorResponse {
                error: self.user_message(),
                details: Some(errors.clone()),
            },
            _ => ErrorResponse {
                error: self.user_message(),
                details: None,
            },
        };

        (status, Json(response)).into_response()
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.user_message())
    }
}

impl std::error::Error for ApiError {}

impl From<DbErr> for ApiError {
    fn from(err: DbErr) -> Self {
        Self::database(err)
    }
}

impl From<QueryError> for ApiError {
    fn from(err: QueryError) -> Self {
        match err {
            QueryError::InvalidRequest(errors) => Self::bad_request(&errors),
            QueryError::Cache(CacheError::Load { source, .. }) => Self::database(source),
            other => Self::internal("Failed to build query", Some(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_error_messages() {
        let cases = vec![
            (
                FilterError::UnknownParameter { key: "unknownParam".into() },
                "Invalid query parameter: unknownParam",
            ),
            (
                FilterError::UnsupportedLogic { key: "name".into() },
                "Logic parameter name_logic not supported for name",
            ),
            (
                FilterError::LookupNotFound { key: "school".into(), value: "pyromancy".into() },
                "school not found: pyromancy",
            ),
            (
                FilterError::NoValidValues { key: "school".into(), original: "abc,def".into() },
                "No valid IDs found for school: abc,def",
            ),
            (
                FilterError::InvalidSearchColumns { columns: vec!["foo".into(), "bar".into()] },
                "Invalid columns in mclist: foo, bar",
            ),
        ];

        for (err, expected) in cases {
            assert_eq!(err.to_string(), expected);
        }
    }

    #[test]
    fn test_bad_request_joins_all_errors() {
        let err = ApiError::bad_request(&[
            FilterError::UnknownParameter { key: "foo".into() },
            FilterError::UnknownParameter { key: "bar".into() },
        ]);
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            err.user_message(),
            "Invalid query parameter: foo; Invalid query parameter: bar"
        );
    }

    #[test]
    fn test_database_error_is_sanitized() {
        let err: ApiError = DbErr::Custom("connection refused on 10.0.0.4".to_string()).into();
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.user_message(), "A database error occurred");
    }

    #[test]
    fn test_invalid_request_becomes_bad_request() {
        let err: ApiError = QueryError::InvalidRequest(vec![FilterError::UnknownParameter {
            key: "foo".into(),
        }])
        .into();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_cache_not_ready_becomes_internal() {
        let err: ApiError = QueryError::Cache(CacheError::NotReady {
            cache: "schools".into(),
        })
        .into();
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.user_message(), "Failed to build query");
    }

    #[test]
    fn test_display_trait() {
        let err = ApiError::internal("Test error", None);
        assert_eq!(format!("{err}"), "Test error");
    }
}
