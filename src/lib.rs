//! # grimoire
//!
//! Declarative filter-to-SQL list queries for tabletop RPG rules data.
//!
//! Each browsable entity declares a [`FilterConfig`] once. An untrusted query
//! string is validated against it by [`process`], and a valid request is
//! compiled by [`build_list_query`] into one paginated, sorted statement with
//! bound parameters, including "any of" / "all of" tag filters over junction
//! tables.
//!
//! ```rust,ignore
//! let catalog = Catalog::load(&db).await?;
//! let app = router(AppState::new(db, catalog));
//! // GET /spells?school=evocation,conjuration&school_logic=and&name=fire&page=2
//! ```

pub mod errors;
pub mod filtering;
pub mod lookup;
pub mod operations;
pub mod query;
pub mod resources;
pub mod routes;

pub use errors::{ApiError, CacheError, CatalogError, ConfigError, FilterError, QueryError};
pub use filtering::{FilterConfig, NormalizedRequest, RawParams, process};
pub use lookup::{LookupCache, LookupTable};
pub use operations::{ListPage, fetch_page};
pub use query::{BaseTable, ListQuery, build_list_query};
pub use resources::{Catalog, Lookups, Resource};
pub use routes::{AppState, router};
