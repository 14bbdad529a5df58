use crate::filtering::config::{FilterConfig, SortColumn, SortSpec};

/// Sort direction. Anything but `desc` is ascending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    pub fn parse(raw: &str) -> Self {
        if raw.trim().eq_ignore_ascii_case("desc") {
            Self::Desc
        } else {
            Self::Asc
        }
    }

    pub fn as_sql(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

/// A validated sort: the key is always in the entity allow-list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sort {
    pub sort_by: &'static str,
    pub order: SortOrder,
}

/// Resolve `sort`/`order`, falling back to the entity default sort when the
/// key is missing or not allowed.
pub fn parse_sorting(sort: Option<&str>, order: Option<&str>, config: &FilterConfig) -> Sort {
    let default_sort = config.base().default_sort;
    let sort_by = sort
        .map(str::trim)
        .and_then(|key| config.sort_keys().find(|allowed| *allowed == key))
        .unwrap_or(default_sort);

    Sort {
        sort_by,
        order: order.map(SortOrder::parse).unwrap_or_default(),
    }
}

/// Rendered sort: an optional select-list entry and the ORDER BY list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortClause {
    pub select: Option<String>,
    pub order_by: String,
}

/// Build the sort expressions for the active base table.
///
/// The group column is appended as a tie-breaker so paging is stable.
pub fn sort_clause(spec: &SortSpec, sort: Sort, config: &FilterConfig, alternate: bool) -> SortClause {
    let column: SortColumn = match spec.alt {
        Some(alt) if alternate => alt,
        _ => spec.base,
    };

    let qualified = config.qualify(column.column);
    let expression = match column.function {
        Some(function) => format!("{}({qualified})", function.as_sql()),
        None => qualified,
    };
    let select = column.alias.map(|alias| format!("{expression} AS {alias}"));

    let direction = sort.order.as_sql();
    let base = config.base();
    let tie_breaker = format!("{}.{}", base.table.alias, base.group_column);
    let order_by = if expression == tie_breaker {
        format!("{expression} {direction}")
    } else {
        format!("{expression} {direction}, {tie_breaker} ASC")
    };

    SortClause { select, order_by }
}
