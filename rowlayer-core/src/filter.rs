//! Filter operators, filter values, and the validated [`Filter`] type.
//!
//! A [`Filter`] pairs a field name with one operator from a closed comparison
//! vocabulary and a value whose shape is validated at construction time. A
//! filter is never partially valid: an unknown operator or an illegal value
//! shape fails construction with a [`ValidationError`] naming the field.
//!
//! # Example
//!
//! ```ignore
//! use rowlayer::filter::{Filter, Operator, FilterValue};
//!
//! // From raw transport input (operator name is case-insensitive)
//! let filter = Filter::parse("status", "in", serde_json::json!(["open", "paused"]))?;
//!
//! // Programmatic construction
//! let filter = Filter::new("age", Operator::GreaterEqual, 18.0);
//! # Ok::<(), rowlayer::error::ValidationError>(())
//! ```

use std::{fmt, str::FromStr};

use chrono::{DateTime, SecondsFormat, Utc};
use serde::ser::{Serialize, SerializeSeq, SerializeStruct, Serializer};
use serde_json::Value;

use crate::error::{ValidationError, ValidationResult};

/// The closed set of comparison operators a filter may use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    /// Exact equality.
    Equal,
    /// Strictly greater than.
    Greater,
    /// Strictly less than.
    Less,
    /// Greater than or equal to.
    GreaterEqual,
    /// Less than or equal to.
    LessEqual,
    /// Not equal to.
    NotEqual,
    /// Membership in a list of values.
    In,
    /// Identity check against null or a boolean (`IS NULL`, `IS TRUE`).
    Is,
    /// Case-sensitive pattern match with `%` wildcards.
    Like,
    /// Case-insensitive pattern match with `%` wildcards.
    Ilike,
    /// Array overlap: the row's array field shares at least one element
    /// with the supplied set.
    ArrayIntersects,
}

impl Operator {
    /// Returns the wire token used when this operator is sent to a store
    /// binding or serialized into RPC parameters.
    pub fn code(&self) -> &'static str {
        match self {
            Operator::Equal => "eq",
            Operator::Greater => "gt",
            Operator::Less => "lt",
            Operator::GreaterEqual => "gte",
            Operator::LessEqual => "lte",
            Operator::NotEqual => "neq",
            Operator::In => "in",
            Operator::Is => "is",
            Operator::Like => "like",
            Operator::Ilike => "ilike",
            Operator::ArrayIntersects => "ov",
        }
    }
}

impl FromStr for Operator {
    type Err = ValidationError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.to_uppercase().as_str() {
            "EQUAL" => Ok(Operator::Equal),
            "GREATER" => Ok(Operator::Greater),
            "LESS" => Ok(Operator::Less),
            "GREATER_EQUAL" => Ok(Operator::GreaterEqual),
            "LESS_EQUAL" => Ok(Operator::LessEqual),
            "NOT_EQUAL" => Ok(Operator::NotEqual),
            "IN" => Ok(Operator::In),
            "IS" => Ok(Operator::Is),
            "LIKE" => Ok(Operator::Like),
            "ILIKE" => Ok(Operator::Ilike),
            "ARRAY_INTERSECTS" => Ok(Operator::ArrayIntersects),
            _ => Err(ValidationError::UnknownOperator(raw.to_string())),
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl Serialize for Operator {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.code())
    }
}

/// The legal value shapes a filter may carry.
///
/// Raw JSON input is validated through [`FilterValue::from_json`]; arrays must
/// be homogeneous lists of strings or numbers. Dates are only constructed
/// programmatically and serialize as RFC 3339 strings.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
    /// The null value, used with `IS` and equality-style operators.
    Null,
    /// A string scalar.
    Text(String),
    /// A numeric scalar.
    Number(f64),
    /// A timestamp scalar.
    Date(DateTime<Utc>),
    /// A homogeneous list of strings.
    TextList(Vec<String>),
    /// A homogeneous list of numbers.
    NumberList(Vec<f64>),
}

impl FilterValue {
    /// Validates a raw JSON value into a filter value.
    ///
    /// `field` is only used to produce a descriptive error.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidValue`] for booleans, objects,
    /// heterogeneous arrays, and arrays of anything but strings or numbers.
    pub fn from_json(field: &str, value: Value) -> ValidationResult<Self> {
        let invalid = |detail: &str| ValidationError::InvalidValue {
            field: field.to_string(),
            detail: detail.to_string(),
        };

        match value {
            Value::Null => Ok(FilterValue::Null),
            Value::String(text) => Ok(FilterValue::Text(text)),
            Value::Number(number) => number
                .as_f64()
                .map(FilterValue::Number)
                .ok_or_else(|| invalid("number out of range")),
            Value::Array(items) => {
                if items.iter().all(Value::is_string) {
                    Ok(FilterValue::TextList(
                        items
                            .into_iter()
                            .filter_map(|item| match item {
                                Value::String(text) => Some(text),
                                _ => None,
                            })
                            .collect(),
                    ))
                } else if items.iter().all(Value::is_number) {
                    Ok(FilterValue::NumberList(
                        items
                            .iter()
                            .filter_map(Value::as_f64)
                            .collect(),
                    ))
                } else {
                    Err(invalid("arrays must contain only strings or only numbers"))
                }
            }
            Value::Bool(_) => Err(invalid("booleans are not a legal filter value")),
            Value::Object(_) => Err(invalid("objects are not a legal filter value")),
        }
    }

    /// Returns true when this value is a list shape.
    pub fn is_list(&self) -> bool {
        matches!(self, FilterValue::TextList(_) | FilterValue::NumberList(_))
    }
}

impl From<&str> for FilterValue {
    fn from(value: &str) -> Self {
        FilterValue::Text(value.to_string())
    }
}

impl From<String> for FilterValue {
    fn from(value: String) -> Self {
        FilterValue::Text(value)
    }
}

impl From<f64> for FilterValue {
    fn from(value: f64) -> Self {
        FilterValue::Number(value)
    }
}

impl From<i64> for FilterValue {
    fn from(value: i64) -> Self {
        FilterValue::Number(value as f64)
    }
}

impl From<DateTime<Utc>> for FilterValue {
    fn from(value: DateTime<Utc>) -> Self {
        FilterValue::Date(value)
    }
}

impl From<Vec<String>> for FilterValue {
    fn from(values: Vec<String>) -> Self {
        FilterValue::TextList(values)
    }
}

impl From<Vec<f64>> for FilterValue {
    fn from(values: Vec<f64>) -> Self {
        FilterValue::NumberList(values)
    }
}

impl Serialize for FilterValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            FilterValue::Null => serializer.serialize_none(),
            FilterValue::Text(text) => serializer.serialize_str(text),
            FilterValue::Number(number) => serializer.serialize_f64(*number),
            FilterValue::Date(date) => {
                serializer.serialize_str(&date.to_rfc3339_opts(SecondsFormat::Millis, true))
            }
            FilterValue::TextList(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            FilterValue::NumberList(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
        }
    }
}

/// A validated filter: one field, one operator, one value.
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    /// The column or attribute the filter targets.
    pub field: String,
    /// The comparison operator.
    pub operator: Operator,
    /// The validated comparison value.
    pub value: FilterValue,
}

impl Filter {
    /// Creates a filter from already-typed parts.
    pub fn new(field: impl Into<String>, operator: Operator, value: impl Into<FilterValue>) -> Self {
        Self {
            field: field.into(),
            operator,
            value: value.into(),
        }
    }

    /// Validates raw string-encoded parts into a filter.
    ///
    /// The operator name is matched case-insensitively against the closed
    /// operator set and the value shape is checked per
    /// [`FilterValue::from_json`].
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] identifying the operator or value that
    /// failed; the filter is never partially constructed.
    pub fn parse(field: impl Into<String>, operator: &str, value: Value) -> ValidationResult<Self> {
        let field = field.into();
        let operator = operator.parse::<Operator>()?;
        let value = FilterValue::from_json(&field, value)?;

        Ok(Self { field, operator, value })
    }
}

// Serialized shape is `{field, operator: <wire code>, value}`, the layout the
// aggregate path's stored procedures expect in their `p_filters` parameter.
impl Serialize for Filter {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("Filter", 3)?;
        state.serialize_field("field", &self.field)?;
        state.serialize_field("operator", &self.operator)?;
        state.serialize_field("value", &self.value)?;
        state.end()
    }
}
