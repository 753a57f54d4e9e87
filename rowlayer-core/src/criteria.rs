//! The validated, immutable [`Criteria`] aggregate and its raw-input parsing.
//!
//! A criteria describes what to query, how to filter and order it, and which
//! page to return. It is built once per request from string-encoded transport
//! parameters via [`Criteria::build`], validated eagerly (before any store
//! call), and discarded after the request completes.
//!
//! # Example
//!
//! ```ignore
//! use rowlayer::criteria::{Criteria, RawQuery};
//!
//! let raw = RawQuery {
//!     filters: Some(r#"[{"field":"status","operator":"in","value":["A","B"]}]"#.to_string()),
//!     order_by: Some("created_at".to_string()),
//!     order_direction: Some("descending".to_string()),
//!     limit: Some("25".to_string()),
//!     offset: Some("0".to_string()),
//! };
//!
//! let criteria = Criteria::build("contacts", "*", &raw, None)?;
//! # Ok::<(), rowlayer::error::ValidationError>(())
//! ```

use std::str::FromStr;

use serde::Deserialize;
use serde_json::Value;

use crate::{
    error::{ValidationError, ValidationResult},
    filter::{Filter, FilterValue, Operator},
};

/// Sort direction for an [`Order`] clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Ascending order (A to Z, 0 to 9, earliest to latest).
    Ascending,
    /// Descending order (Z to A, 9 to 0, latest to earliest).
    Descending,
}

impl Direction {
    /// Returns true for the ascending direction.
    pub fn is_ascending(&self) -> bool {
        matches!(self, Direction::Ascending)
    }

    /// The uppercase token used in RPC parameters (`ASC` / `DESC`).
    pub fn token(&self) -> &'static str {
        match self {
            Direction::Ascending => "ASC",
            Direction::Descending => "DESC",
        }
    }
}

impl FromStr for Direction {
    type Err = ValidationError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.to_uppercase().as_str() {
            "ASCENDING" | "ASC" => Ok(Direction::Ascending),
            "DESCENDING" | "DESC" => Ok(Direction::Descending),
            _ => Err(ValidationError::UnknownDirection(raw.to_string())),
        }
    }
}

/// A single-key ordering clause.
#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    /// The field to order by.
    pub field: String,
    /// The sort direction.
    pub direction: Direction,
}

/// Raw string-encoded query parameters, as delivered by a transport layer.
///
/// Decoding query strings or request bodies into this shape is the caller's
/// concern; the criteria layer only validates it.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawQuery {
    /// JSON-encoded array of `{field, operator, value}` filter descriptors.
    pub filters: Option<String>,
    /// Field to order by; only honored together with `order_direction`.
    pub order_by: Option<String>,
    /// Order direction; only honored together with `order_by`.
    pub order_direction: Option<String>,
    /// Page size, string-encoded; must be paired with `offset`.
    pub limit: Option<String>,
    /// Row offset, string-encoded; must be paired with `limit`.
    pub offset: Option<String>,
}

/// An implicit equality filter appended to the caller's filter set,
/// typically scoping a query to a parent entity.
#[derive(Debug, Clone)]
pub struct ScopeFilter {
    /// The field to scope on.
    pub field: String,
    /// The value the field must equal.
    pub value: FilterValue,
}

impl ScopeFilter {
    /// Creates a scope filter from a field name and value.
    pub fn new(field: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        Self {
            field: field.into(),
            value: value.into(),
        }
    }
}

/// A validated, immutable description of one query.
///
/// `filters` is `None` when no filtering was requested at all, which callers
/// must be able to distinguish from an explicitly empty filter list.
#[derive(Debug, Clone)]
pub struct Criteria {
    /// The table or view to query.
    pub table: String,
    /// The projection spec, in the store's column-selection syntax.
    pub columns: String,
    /// Decoded filters, absent when neither raw filters nor a scope filter
    /// were supplied.
    pub filters: Option<Vec<Filter>>,
    /// Ordering clause, present only when both field and direction were given.
    pub order_by: Option<Order>,
    /// Requested page size; absent means no explicit page was requested.
    pub limit: Option<u64>,
    /// Requested row offset; paired with `limit`.
    pub offset: Option<u64>,
}

impl Criteria {
    /// Builds a criteria from raw string-encoded inputs.
    ///
    /// Each section is validated independently: filters (JSON decode plus
    /// per-filter operator/value checks), ordering (both-or-neither), and
    /// pagination (both-or-neither, non-negative integers). The optional
    /// `scope` descriptor is appended to the filter set as one more
    /// equality filter.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] naming the offending input. No store
    /// interaction happens here or anywhere in construction.
    pub fn build(
        table: impl Into<String>,
        columns: impl Into<String>,
        raw: &RawQuery,
        scope: Option<ScopeFilter>,
    ) -> ValidationResult<Self> {
        let filters = Self::parse_filters(raw.filters.as_deref(), scope)?;
        let order_by = Self::parse_order(raw.order_by.as_deref(), raw.order_direction.as_deref())?;
        let (limit, offset) = Self::parse_page_bounds(raw.limit.as_deref(), raw.offset.as_deref())?;

        Ok(Self {
            table: table.into(),
            columns: columns.into(),
            filters,
            order_by,
            limit,
            offset,
        })
    }

    fn parse_filters(
        raw: Option<&str>,
        scope: Option<ScopeFilter>,
    ) -> ValidationResult<Option<Vec<Filter>>> {
        if raw.is_none() && scope.is_none() {
            return Ok(None);
        }

        let mut filters = Vec::new();

        if let Some(raw) = raw {
            let descriptors: Vec<RawFilter> = serde_json::from_str(raw)
                .map_err(|err| ValidationError::MalformedFilters(err.to_string()))?;

            for descriptor in descriptors {
                filters.push(Filter::parse(
                    descriptor.field,
                    &descriptor.operator,
                    descriptor.value,
                )?);
            }
        }

        if let Some(scope) = scope {
            filters.push(Filter::new(scope.field, Operator::Equal, scope.value));
        }

        Ok(Some(filters))
    }

    fn parse_order(
        field: Option<&str>,
        direction: Option<&str>,
    ) -> ValidationResult<Option<Order>> {
        // Partial ordering input is treated as no ordering at all.
        let (Some(field), Some(direction)) = (field, direction) else {
            return Ok(None);
        };

        Ok(Some(Order {
            field: field.to_string(),
            direction: direction.parse()?,
        }))
    }

    fn parse_page_bounds(
        limit: Option<&str>,
        offset: Option<&str>,
    ) -> ValidationResult<(Option<u64>, Option<u64>)> {
        match (limit, offset) {
            (None, None) => Ok((None, None)),
            (Some(_), None) => Err(ValidationError::LimitWithoutOffset),
            (None, Some(_)) => Err(ValidationError::OffsetWithoutLimit),
            (Some(limit), Some(offset)) => Ok((
                Some(Self::parse_bound("limit", limit)?),
                Some(Self::parse_bound("offset", offset)?),
            )),
        }
    }

    fn parse_bound(name: &'static str, raw: &str) -> ValidationResult<u64> {
        raw.trim()
            .parse::<i64>()
            .ok()
            .and_then(|parsed| u64::try_from(parsed).ok())
            .ok_or_else(|| ValidationError::InvalidPageBound {
                name,
                value: raw.to_string(),
            })
    }
}

#[derive(Debug, Deserialize)]
struct RawFilter {
    field: String,
    operator: String,
    #[serde(default)]
    value: Value,
}
