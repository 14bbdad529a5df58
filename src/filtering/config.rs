//! # Filter Configuration
//!
//! A [`FilterConfig`] declares, once per entity, which query-string keys are
//! filters and how each one reaches the database: a column on the base table,
//! a correlated `EXISTS` against a junction table, a `LIKE` search, or a
//! custom predicate. It also declares the base table (with an optional
//! alternate base for filters that change the join shape), the grouping
//! column and the sort allow-list.
//!
//! Configurations are validated when built and are immutable afterwards.
//!
//! ```rust,ignore
//! let config = FilterConfig::builder("spells", BaseSpec::new(SPELLS, "spell_id", "spell_name"))
//!     .filter("name", FilterDescriptor::search(ColumnRef::base("spell_name")))
//!     .filter(
//!         "school",
//!         FilterDescriptor::join(JoinSpec::new(SCHOOL_MAP, "spell_id", "school_id"))
//!             .multi_valued()
//!             .with_logic(),
//!     )
//!     .sort(SortSpec::column("spell_name", ColumnRef::base("spell_name")))
//!     .build()?;
//! ```

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;

use crate::errors::ConfigError;
use crate::filtering::clause::Predicate;
use crate::filtering::query_parser::RESERVED_PARAMS;
use crate::filtering::value::FilterValue;
use crate::lookup::LookupCache;

pub const DEFAULT_PAGE: u64 = 1;
pub const DEFAULT_LIMIT: u64 = 20;

/// A table and the alias it is given in compiled SQL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableRef {
    pub name: &'static str,
    pub alias: &'static str,
}

impl TableRef {
    pub const fn new(name: &'static str, alias: &'static str) -> Self {
        Self { name, alias }
    }
}

/// Which of the two base tables a column lives on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableSide {
    Base,
    Alt,
}

/// An unqualified column plus the base table it belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnRef {
    pub side: TableSide,
    pub name: &'static str,
}

impl ColumnRef {
    pub const fn base(name: &'static str) -> Self {
        Self {
            side: TableSide::Base,
            name,
        }
    }

    pub const fn alt(name: &'static str) -> Self {
        Self {
            side: TableSide::Alt,
            name,
        }
    }
}

/// A trusted `column = <literal>` condition declared in code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedCondition {
    pub column: &'static str,
    pub value: i64,
}

impl FixedCondition {
    pub const fn eq(column: &'static str, value: i64) -> Self {
        Self { column, value }
    }
}

/// Declared type of a filter value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DataType {
    String,
    #[default]
    Int,
    Boolean,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchOperator {
    #[default]
    Like,
}

impl SearchOperator {
    pub fn as_sql(self) -> &'static str {
        match self {
            Self::Like => "LIKE",
        }
    }
}

/// A junction table reached through a correlated `EXISTS`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JoinSpec {
    pub table: TableRef,
    /// Column shared by the junction table and the base table
    pub id_column: &'static str,
    /// Junction column the request values are matched against
    pub filter_column: &'static str,
    pub fixed: &'static [FixedCondition],
}

impl JoinSpec {
    pub const fn new(table: TableRef, id_column: &'static str, filter_column: &'static str) -> Self {
        Self {
            table,
            id_column,
            filter_column,
            fixed: &[],
        }
    }

    #[must_use]
    pub const fn with_fixed(mut self, fixed: &'static [FixedCondition]) -> Self {
        self.fixed = fixed;
        self
    }
}

/// Emits predicates for filters that need irregular SQL.
///
/// Receives the qualified column and the coerced value.
pub type CustomHandler = fn(column: &str, value: &FilterValue, out: &mut Vec<Predicate>);

/// How a filter reaches the database.
#[derive(Clone, Copy)]
pub enum FilterKind {
    /// Predicate on a column of the outer query, plus fixed conditions on the
    /// same table.
    Direct {
        column: ColumnRef,
        fixed: &'static [FixedCondition],
    },
    /// Correlated `EXISTS` against a junction table.
    Join(JoinSpec),
    /// `(column LIKE ?)` with a `%value%` pattern.
    Search {
        column: ColumnRef,
        operator: SearchOperator,
    },
    Custom {
        column: ColumnRef,
        handler: CustomHandler,
    },
}

impl fmt::Debug for FilterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Direct { column, fixed } => f
                .debug_struct("Direct")
                .field("column", column)
                .field("fixed", fixed)
                .finish(),
            Self::Join(spec) => f.debug_tuple("Join").field(spec).finish(),
            Self::Search { column, operator } => f
                .debug_struct("Search")
                .field("column", column)
                .field("operator", operator)
                .finish(),
            Self::Custom { column, .. } => f
                .debug_struct("Custom")
                .field("column", column)
                .finish_non_exhaustive(),
        }
    }
}

/// A `GROUP_CONCAT` select column fed by a filter's own column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Aggregate {
    /// Second column concatenated as `column:paired_with`
    pub paired_with: Option<&'static str>,
    pub alias: &'static str,
}

impl Aggregate {
    /// `GROUP_CONCAT(DISTINCT column) AS alias`
    pub const fn distinct(alias: &'static str) -> Self {
        Self {
            paired_with: None,
            alias,
        }
    }

    /// `GROUP_CONCAT(DISTINCT column || ':' || paired_with) AS alias`
    pub const fn pair(paired_with: &'static str, alias: &'static str) -> Self {
        Self {
            paired_with: Some(paired_with),
            alias,
        }
    }
}

/// How a [`ChildSummary`] reduces the child rows of one entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SummaryFunction {
    /// `COUNT(DISTINCT column)`
    Count,
    /// `COALESCE(MAX(column) + 1, 0)`, for zero-based position columns
    NextIndex,
}

/// A per-entity summary of a child table, `LEFT JOIN`ed on the group column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChildSummary {
    pub table: TableRef,
    /// Child column referencing the base group column
    pub parent_column: &'static str,
    pub column: &'static str,
    pub function: SummaryFunction,
    pub alias: &'static str,
}

impl ChildSummary {
    pub const fn count(
        table: TableRef,
        parent_column: &'static str,
        column: &'static str,
        alias: &'static str,
    ) -> Self {
        Self {
            table,
            parent_column,
            column,
            function: SummaryFunction::Count,
            alias,
        }
    }

    pub const fn next_index(
        table: TableRef,
        parent_column: &'static str,
        column: &'static str,
        alias: &'static str,
    ) -> Self {
        Self {
            table,
            parent_column,
            column,
            function: SummaryFunction::NextIndex,
            alias,
        }
    }
}

/// Declaration of one filter key.
#[derive(Clone)]
pub struct FilterDescriptor {
    kind: FilterKind,
    data_type: DataType,
    multi_valued: bool,
    logic_supported: bool,
    base_table_decider: bool,
    cache: Option<Arc<dyn LookupCache>>,
    aggregate: Option<Aggregate>,
}

impl FilterDescriptor {
    fn with_kind(kind: FilterKind) -> Self {
        Self {
            kind,
            data_type: DataType::default(),
            multi_valued: false,
            logic_supported: false,
            base_table_decider: false,
            cache: None,
            aggregate: None,
        }
    }

    /// Plain equality on a column of the outer query.
    pub fn direct(column: ColumnRef) -> Self {
        Self::with_kind(FilterKind::Direct { column, fixed: &[] })
    }

    pub fn join(spec: JoinSpec) -> Self {
        Self::with_kind(FilterKind::Join(spec))
    }

    pub fn search(column: ColumnRef) -> Self {
        Self::with_kind(FilterKind::Search {
            column,
            operator: SearchOperator::Like,
        })
        .data_type(DataType::String)
    }

    pub fn custom(column: ColumnRef, handler: CustomHandler) -> Self {
        Self::with_kind(FilterKind::Custom { column, handler })
    }

    #[must_use]
    pub fn data_type(mut self, data_type: DataType) -> Self {
        self.data_type = data_type;
        self
    }

    /// Accept a comma-separated list or a repeated key.
    #[must_use]
    pub fn multi_valued(mut self) -> Self {
        self.multi_valued = true;
        self
    }

    /// Accept a `<key>_logic=and|or` companion parameter.
    #[must_use]
    pub fn with_logic(mut self) -> Self {
        self.logic_supported = true;
        self
    }

    /// Switch the request to the alternate base table when this filter is set.
    #[must_use]
    pub fn base_table_decider(mut self) -> Self {
        self.base_table_decider = true;
        self
    }

    /// Extra conditions on the filtered table. Ignored for search and custom
    /// filters.
    #[must_use]
    pub fn fixed(mut self, conditions: &'static [FixedCondition]) -> Self {
        match &mut self.kind {
            FilterKind::Direct { fixed, .. } => *fixed = conditions,
            FilterKind::Join(spec) => spec.fixed = conditions,
            FilterKind::Search { .. } | FilterKind::Custom { .. } => {}
        }
        self
    }

    /// Resolve values through a lookup cache before they reach SQL.
    #[must_use]
    pub fn with_cache(mut self, cache: Arc<dyn LookupCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    #[must_use]
    pub fn aggregate(mut self, aggregate: Aggregate) -> Self {
        self.aggregate = Some(aggregate);
        self
    }

    pub fn kind(&self) -> &FilterKind {
        &self.kind
    }

    pub fn data_type_of(&self) -> DataType {
        self.data_type
    }

    pub fn is_multi_valued(&self) -> bool {
        self.multi_valued
    }

    pub fn supports_logic(&self) -> bool {
        self.logic_supported
    }

    pub fn is_base_table_decider(&self) -> bool {
        self.base_table_decider
    }

    pub fn cache(&self) -> Option<&dyn LookupCache> {
        self.cache.as_deref()
    }

    pub fn aggregate_column(&self) -> Option<&Aggregate> {
        self.aggregate.as_ref()
    }

    pub fn is_search(&self) -> bool {
        matches!(self.kind, FilterKind::Search { .. })
    }

    /// Direct and search filters name a single outer column, so they may be
    /// used by multi-column search.
    pub fn searchable_column(&self) -> Option<ColumnRef> {
        match self.kind {
            FilterKind::Direct { column, .. } | FilterKind::Search { column, .. } => Some(column),
            FilterKind::Join(_) | FilterKind::Custom { .. } => None,
        }
    }

    fn uses_alt_side(&self) -> bool {
        match self.kind {
            FilterKind::Direct { column, .. }
            | FilterKind::Search { column, .. }
            | FilterKind::Custom { column, .. } => column.side == TableSide::Alt,
            FilterKind::Join(_) => false,
        }
    }
}

impl fmt::Debug for FilterDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilterDescriptor")
            .field("kind", &self.kind)
            .field("data_type", &self.data_type)
            .field("multi_valued", &self.multi_valued)
            .field("logic_supported", &self.logic_supported)
            .field("base_table_decider", &self.base_table_decider)
            .field("cache", &self.cache.as_ref().map(|cache| cache.name().to_string()))
            .field("aggregate", &self.aggregate)
            .finish()
    }
}

/// Aggregate applied to a sort column, needed when the column is not
/// functionally dependent on the group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqlFunction {
    Min,
    Max,
}

impl SqlFunction {
    pub fn as_sql(self) -> &'static str {
        match self {
            Self::Min => "MIN",
            Self::Max => "MAX",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortColumn {
    pub column: ColumnRef,
    pub function: Option<SqlFunction>,
    /// Also select the expression under this name
    pub alias: Option<&'static str>,
}

impl SortColumn {
    pub const fn new(column: ColumnRef) -> Self {
        Self {
            column,
            function: None,
            alias: None,
        }
    }

    #[must_use]
    pub const fn function(mut self, function: SqlFunction) -> Self {
        self.function = Some(function);
        self
    }

    #[must_use]
    pub const fn alias(mut self, alias: &'static str) -> Self {
        self.alias = Some(alias);
        self
    }
}

/// An allowed sort key, optionally with a different expression when the
/// alternate base table is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortSpec {
    pub key: &'static str,
    pub base: SortColumn,
    pub alt: Option<SortColumn>,
}

impl SortSpec {
    pub const fn column(key: &'static str, column: ColumnRef) -> Self {
        Self {
            key,
            base: SortColumn::new(column),
            alt: None,
        }
    }

    pub const fn new(key: &'static str, base: SortColumn) -> Self {
        Self {
            key,
            base,
            alt: None,
        }
    }

    #[must_use]
    pub const fn on_alternate(mut self, alt: SortColumn) -> Self {
        self.alt = Some(alt);
        self
    }

    fn uses_alt_side(&self) -> bool {
        self.base.column.side == TableSide::Alt
            || self.alt.is_some_and(|alt| alt.column.side == TableSide::Alt)
    }
}

/// Secondary mapping table used as the base when a decider filter is set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AltTable {
    pub table: TableRef,
    pub join_column: &'static str,
    /// Applied to the `LEFT JOIN` of the primary skeleton
    pub fixed: &'static [FixedCondition],
}

impl AltTable {
    pub const fn new(table: TableRef, join_column: &'static str) -> Self {
        Self {
            table,
            join_column,
            fixed: &[],
        }
    }

    #[must_use]
    pub const fn with_fixed(mut self, fixed: &'static [FixedCondition]) -> Self {
        self.fixed = fixed;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BaseSpec {
    pub table: TableRef,
    pub alt: Option<AltTable>,
    pub group_column: &'static str,
    pub default_sort: &'static str,
}

impl BaseSpec {
    pub const fn new(table: TableRef, group_column: &'static str, default_sort: &'static str) -> Self {
        Self {
            table,
            alt: None,
            group_column,
            default_sort,
        }
    }

    #[must_use]
    pub const fn with_alternate(mut self, alt: AltTable) -> Self {
        self.alt = Some(alt);
        self
    }
}

/// Validated, immutable filter configuration for one entity.
#[derive(Debug, Clone)]
pub struct FilterConfig {
    resource: &'static str,
    base: BaseSpec,
    filters: IndexMap<&'static str, FilterDescriptor>,
    sorts: IndexMap<&'static str, SortSpec>,
    summaries: Vec<ChildSummary>,
    default_limit: u64,
}

impl FilterConfig {
    pub fn builder(resource: &'static str, base: BaseSpec) -> FilterConfigBuilder {
        FilterConfigBuilder {
            resource,
            base,
            filters: Vec::new(),
            sorts: Vec::new(),
            summaries: Vec::new(),
            default_limit: DEFAULT_LIMIT,
        }
    }

    pub fn resource(&self) -> &'static str {
        self.resource
    }

    pub fn base(&self) -> &BaseSpec {
        &self.base
    }

    pub fn descriptor(&self, key: &str) -> Option<&FilterDescriptor> {
        self.filters.get(key)
    }

    /// The descriptor together with its `'static` key.
    pub fn entry(&self, key: &str) -> Option<(&'static str, &FilterDescriptor)> {
        self.filters
            .get_key_value(key)
            .map(|(key, descriptor)| (*key, descriptor))
    }

    pub fn descriptors(&self) -> impl Iterator<Item = (&'static str, &FilterDescriptor)> {
        self.filters.iter().map(|(key, descriptor)| (*key, descriptor))
    }

    pub fn sort(&self, key: &str) -> Option<&SortSpec> {
        self.sorts.get(key)
    }

    pub fn sort_keys(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.sorts.keys().copied()
    }

    pub fn summaries(&self) -> &[ChildSummary] {
        &self.summaries
    }

    pub fn default_limit(&self) -> u64 {
        self.default_limit
    }

    pub fn alias(&self, side: TableSide) -> &'static str {
        match (side, self.base.alt) {
            (TableSide::Alt, Some(alt)) => alt.table.alias,
            _ => self.base.table.alias,
        }
    }

    /// `alias.column` for the table the column lives on.
    pub fn qualify(&self, column: ColumnRef) -> String {
        format!("{}.{}", self.alias(column.side), column.name)
    }
}

/// Collects declarations; [`FilterConfigBuilder::build`] validates them.
#[derive(Debug)]
pub struct FilterConfigBuilder {
    resource: &'static str,
    base: BaseSpec,
    filters: Vec<(&'static str, FilterDescriptor)>,
    sorts: Vec<SortSpec>,
    summaries: Vec<ChildSummary>,
    default_limit: u64,
}

impl FilterConfigBuilder {
    #[must_use]
    pub fn filter(mut self, key: &'static str, descriptor: FilterDescriptor) -> Self {
        self.filters.push((key, descriptor));
        self
    }

    #[must_use]
    pub fn sort(mut self, sort: SortSpec) -> Self {
        self.sorts.push(sort);
        self
    }

    #[must_use]
    pub fn summary(mut self, summary: ChildSummary) -> Self {
        self.summaries.push(summary);
        self
    }

    #[must_use]
    pub fn default_limit(mut self, limit: u64) -> Self {
        self.default_limit = limit;
        self
    }

    /// Validate and freeze the configuration.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] for duplicate or reserved keys, multi-valued
    /// or logic-capable filters that are neither direct nor joins, references
    /// to a missing alternate table, a default sort outside the allow-list, or
    /// a zero default limit.
    pub fn build(self) -> Result<FilterConfig, ConfigError> {
        let resource = self.resource.to_string();
        let has_alt = self.base.alt.is_some();

        let mut filters = IndexMap::with_capacity(self.filters.len());
        for (key, descriptor) in self.filters {
            if RESERVED_PARAMS.contains(&key) || key.ends_with("_logic") {
                return Err(ConfigError::ReservedKey {
                    resource,
                    key: key.to_string(),
                });
            }
            if (descriptor.multi_valued || descriptor.logic_supported)
                && !matches!(descriptor.kind, FilterKind::Direct { .. } | FilterKind::Join(_))
            {
                return Err(ConfigError::MissingJoin {
                    resource,
                    key: key.to_string(),
                });
            }
            if !has_alt && (descriptor.base_table_decider || descriptor.uses_alt_side()) {
                return Err(ConfigError::MissingAlternateTable {
                    resource,
                    key: key.to_string(),
                });
            }
            if filters.insert(key, descriptor).is_some() {
                return Err(ConfigError::DuplicateKey {
                    resource,
                    key: key.to_string(),
                });
            }
        }

        let mut sorts = IndexMap::with_capacity(self.sorts.len());
        for sort in self.sorts {
            if !has_alt && sort.uses_alt_side() {
                return Err(ConfigError::MissingAlternateTable {
                    resource,
                    key: sort.key.to_string(),
                });
            }
            if sorts.insert(sort.key, sort).is_some() {
                return Err(ConfigError::DuplicateKey {
                    resource,
                    key: sort.key.to_string(),
                });
            }
        }

        if !sorts.contains_key(self.base.default_sort) {
            return Err(ConfigError::UnknownDefaultSort {
                resource,
                sort: self.base.default_sort.to_string(),
            });
        }
        for (index, summary) in self.summaries.iter().enumerate() {
            if self.summaries[..index].iter().any(|other| other.alias == summary.alias) {
                return Err(ConfigError::DuplicateKey {
                    resource,
                    key: summary.alias.to_string(),
                });
            }
        }
        if self.default_limit == 0 {
            return Err(ConfigError::InvalidDefaultLimit { resource });
        }

        Ok(FilterConfig {
            resource: self.resource,
            base: self.base,
            filters,
            sorts,
            summaries: self.summaries,
            default_limit: self.default_limit,
        })
    }
}
