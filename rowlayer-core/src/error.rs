//! Error types and result types for criteria and query operations.
//!
//! Errors fall into two families: [`ValidationError`] for structurally invalid
//! caller input (always detected before any store interaction) and
//! [`ExecutionError`] for failures raised by the store while running a query.

use serde_json::Error as SerdeJsonError;
use thiserror::Error;

/// Represents structurally invalid caller input.
///
/// Every variant names the offending field or value so a caller can identify
/// exactly which part of the request failed. Validation errors are raised
/// during criteria construction, before any store call is issued.
#[derive(Error, Debug)]
pub enum ValidationError {
    /// The filter operator is not part of the closed operator set.
    #[error("invalid operator '{0}'")]
    UnknownOperator(String),
    /// The order direction string is neither ascending nor descending.
    #[error("invalid order direction '{0}'")]
    UnknownDirection(String),
    /// The filter value has a shape outside the legal set
    /// (null, string, number, date, homogeneous string/number array).
    #[error("invalid value for filter on '{field}': {detail}")]
    InvalidValue {
        /// The field the filter targets.
        field: String,
        /// What was wrong with the value.
        detail: String,
    },
    /// The raw filter string could not be decoded as a JSON filter array.
    #[error("malformed filter JSON: {0}")]
    MalformedFilters(String),
    /// A limit was supplied without its paired offset.
    #[error("limit provided without an offset")]
    LimitWithoutOffset,
    /// An offset was supplied without its paired limit.
    #[error("offset provided without a limit")]
    OffsetWithoutLimit,
    /// A limit or offset was not a non-negative integer.
    #[error("{name} must be a non-negative integer, got '{value}'")]
    InvalidPageBound {
        /// Which bound was invalid ("limit" or "offset").
        name: &'static str,
        /// The raw value as supplied by the caller.
        value: String,
    },
}

/// Represents a failure raised while executing a query against the store.
///
/// Store-level detail is preserved verbatim; an execution error aborts the
/// whole operation and is never paired with a partial result.
#[derive(Error, Debug)]
pub enum ExecutionError {
    /// The criteria or one of its filters failed validation.
    #[error(transparent)]
    Criteria(#[from] ValidationError),
    /// The store rejected or failed a query.
    #[error("store error: {0}")]
    Store(String),
    /// A named remote procedure call failed.
    #[error("procedure '{0}' failed: {1}")]
    Procedure(String, String),
    /// A row returned by the store could not be decoded into the caller's type.
    #[error("row decoding error: {0}")]
    Decode(String),
}

/// A specialized `Result` type for criteria construction and validation.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// A specialized `Result` type for query execution against a store backend.
pub type ExecutionResult<T> = Result<T, ExecutionError>;

impl From<SerdeJsonError> for ExecutionError {
    fn from(err: SerdeJsonError) -> Self {
        ExecutionError::Decode(err.to_string())
    }
}
