//! # Filtering
//!
//! Query-string validation and SQL clause generation.
//!
//! ## Main Components
//!
//! - **[`FilterConfig`]**: per-entity declaration of filters, base table and sorts
//! - **[`process`]**: validates raw parameters into a [`NormalizedRequest`]
//! - **[`build`]**: emits `WHERE`/`HAVING` fragments as a [`ClauseBundle`]
//! - **[`parse_sorting`]** and **[`Pagination`]**: lenient sort and paging
//!
//! ## Query Parameter Examples
//!
//! ```rust,ignore
//! // Any of the listed schools (OR is the default)
//! GET /spells?school=1,2
//!
//! // All of the listed schools
//! GET /spells?school=evocation&school=conjuration&school_logic=and
//!
//! // Substring search, paging and sorting
//! GET /spells?name=fire&page=2&limit=10&sort=spell_level&order=desc
//!
//! // One pattern across several columns
//! GET /feats?mclist=feat_name,feat_benefit&mcfilter=shield
//! ```

pub mod clause;
pub mod conditions;
pub mod config;
pub mod pagination;
pub mod query_parser;
pub mod sort;
pub mod value;

pub use clause::Predicate;
pub use conditions::{ClauseBundle, build};
pub use config::{FilterConfig, FilterDescriptor, FilterKind};
pub use pagination::{Pagination, calculate_content_range};
pub use query_parser::{Filters, NormalizedRequest, process};
pub use sort::{Sort, SortOrder, parse_sorting};
pub use value::{FilterValue, Logic, RawParams, RawValue, Scalar};
