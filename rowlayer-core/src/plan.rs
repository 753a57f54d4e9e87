//! The composable store query specification.
//!
//! Instead of passing an opaque fluent-builder handle around, the converter
//! produces a [`StoreQuery`]: a small tagged list of predicate, order, and
//! range operations plus a count request. Store bindings interpret the value
//! against their native query interface, which keeps the converter
//! unit-testable without a live store.
//!
//! # Example
//!
//! ```ignore
//! use rowlayer::plan::{StoreQuery, CountMode};
//! use rowlayer::filter::Operator;
//!
//! let query = StoreQuery::new("contacts", "*", CountMode::Exact)
//!     .filter("status", Operator::Equal, Some("open".to_string()))
//!     .order("created_at", false)
//!     .range(0, 24);
//! ```

use crate::filter::Operator;

/// Whether the store should compute an exact row count alongside the data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountMode {
    /// Request an exact count of all matching rows in the same round trip.
    Exact,
    /// Do not count; the total is obtained some other way or not at all.
    None,
}

/// One operation of a store query, applied in sequence.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryOp {
    /// A native predicate `(field, operator, formatted value)`. The value is
    /// already rendered in the store's literal syntax; `None` stands for the
    /// null literal.
    Predicate {
        /// The column the predicate applies to.
        field: String,
        /// The comparison operator.
        operator: Operator,
        /// The formatted comparison value, or `None` for null.
        value: Option<String>,
    },
    /// A single-key ordering clause.
    Order {
        /// The column to order by.
        field: String,
        /// True for ascending order.
        ascending: bool,
    },
    /// An inclusive row-range restriction `[start, end]`.
    Range {
        /// First row index of the window.
        start: u64,
        /// Last row index of the window, inclusive.
        end: u64,
    },
}

/// A complete store query: target, projection, count request, and operations.
#[derive(Debug, Clone, PartialEq)]
pub struct StoreQuery {
    /// The table or view to query.
    pub table: String,
    /// The projection spec.
    pub columns: String,
    /// Whether an exact count is requested.
    pub count: CountMode,
    /// The predicate/order/range operations, in application order.
    pub ops: Vec<QueryOp>,
}

impl StoreQuery {
    /// Begins a query against a table with the given projection and count mode.
    pub fn new(table: impl Into<String>, columns: impl Into<String>, count: CountMode) -> Self {
        Self {
            table: table.into(),
            columns: columns.into(),
            count,
            ops: Vec::new(),
        }
    }

    /// Appends a predicate operation.
    pub fn filter(
        mut self,
        field: impl Into<String>,
        operator: Operator,
        value: Option<String>,
    ) -> Self {
        self.ops.push(QueryOp::Predicate {
            field: field.into(),
            operator,
            value,
        });
        self
    }

    /// Appends an ordering operation.
    pub fn order(mut self, field: impl Into<String>, ascending: bool) -> Self {
        self.ops.push(QueryOp::Order {
            field: field.into(),
            ascending,
        });
        self
    }

    /// Appends an inclusive row-range restriction.
    pub fn range(mut self, start: u64, end: u64) -> Self {
        self.ops.push(QueryOp::Range { start, end });
        self
    }

    /// Iterates over the predicate operations only.
    pub fn predicates(&self) -> impl Iterator<Item = (&str, Operator, Option<&str>)> {
        self.ops.iter().filter_map(|op| match op {
            QueryOp::Predicate { field, operator, value } => {
                Some((field.as_str(), *operator, value.as_deref()))
            }
            _ => None,
        })
    }
}
