//! Translation from a validated [`Criteria`] into a [`StoreQuery`].
//!
//! The converter owns two pieces of injected configuration: the soft-delete
//! allow-list (tables whose reads must always exclude soft-deleted rows) and
//! the list of views whose inline exact count is skipped. Both are
//! per-deployment configuration, not module constants.

use chrono::SecondsFormat;

use crate::{
    criteria::Criteria,
    filter::{Filter, FilterValue, Operator},
    plan::{CountMode, StoreQuery},
};

/// The sentinel column used by the soft-delete convention.
const SOFT_DELETE_COLUMN: &str = "deleted_at";

/// Injected converter configuration.
#[derive(Debug, Clone, Default)]
pub struct ConverterConfig {
    /// Tables and views whose queries must always exclude soft-deleted rows.
    pub soft_delete_tables: Vec<String>,
    /// Views whose inline exact count is too expensive and is not requested.
    pub uncounted_tables: Vec<String>,
}

impl ConverterConfig {
    /// Creates a configuration from the two table lists.
    pub fn new(
        soft_delete_tables: impl IntoIterator<Item = impl Into<String>>,
        uncounted_tables: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            soft_delete_tables: soft_delete_tables.into_iter().map(Into::into).collect(),
            uncounted_tables: uncounted_tables.into_iter().map(Into::into).collect(),
        }
    }
}

/// Maps criteria into store query specifications.
#[derive(Debug, Clone, Default)]
pub struct QueryConverter {
    config: ConverterConfig,
}

impl QueryConverter {
    /// Creates a converter with the given configuration.
    pub fn new(config: ConverterConfig) -> Self {
        Self { config }
    }

    /// Returns true when reads of `table` must exclude soft-deleted rows.
    pub fn is_soft_delete(&self, table: &str) -> bool {
        self.config
            .soft_delete_tables
            .iter()
            .any(|t| t == table)
    }

    /// Converts a criteria into a store query.
    ///
    /// The query projects `criteria.columns` from `criteria.table` and
    /// requests an exact count unless the table is listed as uncounted. For
    /// soft-delete tables a `deleted_at IS NULL` predicate is injected
    /// unconditionally, in addition to the caller's filters; callers cannot
    /// override it. Each filter becomes one native predicate and an ordering
    /// clause is appended when present. The range restriction is left to the
    /// execution service.
    pub fn convert(&self, criteria: &Criteria) -> StoreQuery {
        let count = if self
            .config
            .uncounted_tables
            .iter()
            .any(|t| t == &criteria.table)
        {
            CountMode::None
        } else {
            CountMode::Exact
        };

        let mut query = StoreQuery::new(&criteria.table, &criteria.columns, count);

        if self.is_soft_delete(&criteria.table) {
            query = query.filter(SOFT_DELETE_COLUMN, Operator::Is, None);
        }

        for filter in criteria.filters.iter().flatten() {
            query = apply_filter(query, filter);
        }

        if let Some(order) = &criteria.order_by {
            query = query.order(&order.field, order.direction.is_ascending());
        }

        query
    }
}

fn apply_filter(query: StoreQuery, filter: &Filter) -> StoreQuery {
    // Array overlap uses the store's set-literal syntax rather than the
    // generic scalar formatting.
    if filter.operator == Operator::ArrayIntersects {
        return query.filter(
            &filter.field,
            filter.operator,
            Some(set_literal(&filter.value)),
        );
    }

    query.filter(&filter.field, filter.operator, format_value(&filter.value))
}

/// Renders a value in the store's generic literal syntax: `None` for null,
/// a comma-joined tuple `(v1,v2)` for lists, and the plain string form for
/// scalars (dates as RFC 3339).
fn format_value(value: &FilterValue) -> Option<String> {
    match value {
        FilterValue::Null => None,
        FilterValue::Text(text) => Some(text.clone()),
        FilterValue::Number(number) => Some(format_number(*number)),
        FilterValue::Date(date) => Some(date.to_rfc3339_opts(SecondsFormat::Millis, true)),
        FilterValue::TextList(items) => Some(format!("({})", items.join(","))),
        FilterValue::NumberList(items) => Some(format!("({})", join_numbers(items))),
    }
}

/// Renders a value as a set literal `{v1,v2}`; scalars become a one-element set.
fn set_literal(value: &FilterValue) -> String {
    match value {
        FilterValue::Null => "{}".to_string(),
        FilterValue::Text(text) => format!("{{{text}}}"),
        FilterValue::Number(number) => format!("{{{}}}", format_number(*number)),
        FilterValue::Date(date) => {
            format!("{{{}}}", date.to_rfc3339_opts(SecondsFormat::Millis, true))
        }
        FilterValue::TextList(items) => format!("{{{}}}", items.join(",")),
        FilterValue::NumberList(items) => format!("{{{}}}", join_numbers(items)),
    }
}

// Whole numbers print without a trailing ".0" so literals match what the
// caller wrote.
fn format_number(number: f64) -> String {
    if number.fract() == 0.0 && number.abs() < 1e15 {
        format!("{}", number as i64)
    } else {
        number.to_string()
    }
}

fn join_numbers(items: &[f64]) -> String {
    items
        .iter()
        .map(|n| format_number(*n))
        .collect::<Vec<_>>()
        .join(",")
}
