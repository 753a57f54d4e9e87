//! Predicate evaluation for in-memory row filtering.
//!
//! This module interprets the formatted predicate literals of a
//! [`StoreQuery`](rowlayer_core::plan::StoreQuery) against JSON rows:
//! scalar comparisons, tuple-literal membership, set-literal intersection,
//! `%`-wildcard pattern matching, and null/boolean identity checks.

use std::cmp::Ordering;

use serde_json::Value;

use rowlayer_core::filter::Operator;

/// Type-erased, comparable representation of JSON scalars.
///
/// Numeric values are normalized to f64 for comparison; objects and other
/// non-comparable shapes collapse to `Null`.
#[derive(Debug)]
pub(crate) enum Comparable<'a> {
    /// Null or non-comparable value
    Null,
    /// Boolean value
    Bool(bool),
    /// Numeric value
    Number(f64),
    /// String value
    String(&'a str),
    /// Array of comparable values
    Array(Vec<Comparable<'a>>),
}

impl<'a> From<&'a Value> for Comparable<'a> {
    fn from(value: &'a Value) -> Self {
        match value {
            Value::Null => Comparable::Null,
            Value::Bool(value) => Comparable::Bool(*value),
            Value::Number(number) => number
                .as_f64()
                .map(Comparable::Number)
                .unwrap_or(Comparable::Null),
            Value::String(text) => Comparable::String(text),
            Value::Array(items) => Comparable::Array(
                items
                    .iter()
                    .map(Comparable::from)
                    .collect::<Vec<_>>(),
            ),
            Value::Object(_) => Comparable::Null,
        }
    }
}

impl<'a> PartialEq for Comparable<'a> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Comparable::Null, Comparable::Null) => true,
            (Comparable::Bool(a), Comparable::Bool(b)) => a == b,
            (Comparable::Number(a), Comparable::Number(b)) => a == b,
            (Comparable::String(a), Comparable::String(b)) => a == b,
            (Comparable::Array(a), Comparable::Array(b)) => a == b,
            _ => false,
        }
    }
}

impl<'a> PartialOrd for Comparable<'a> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Comparable::Bool(a), Comparable::Bool(b)) => a.partial_cmp(b),
            (Comparable::Number(a), Comparable::Number(b)) => a.partial_cmp(b),
            (Comparable::String(a), Comparable::String(b)) => a.partial_cmp(b),
            _ => None,
        }
    }
}

/// Compares two row field values for sorting; incomparable pairs tie.
pub(crate) fn compare_fields(left: &Value, right: &Value) -> Ordering {
    Comparable::from(left)
        .partial_cmp(&Comparable::from(right))
        .unwrap_or(Ordering::Equal)
}

/// Evaluates one predicate against a row.
///
/// Missing fields behave as null. `literal` is the predicate value already
/// rendered in the store's literal syntax, `None` standing for null.
pub(crate) fn row_matches(
    row: &Value,
    field: &str,
    operator: Operator,
    literal: Option<&str>,
) -> bool {
    let field_value = row
        .as_object()
        .and_then(|object| object.get(field))
        .unwrap_or(&Value::Null);

    match operator {
        Operator::Is => match literal {
            None => field_value.is_null(),
            Some("null") => field_value.is_null(),
            Some("true") => field_value == &Value::Bool(true),
            Some("false") => field_value == &Value::Bool(false),
            Some(_) => false,
        },
        Operator::Equal => scalar_equals(field_value, literal),
        Operator::NotEqual => !scalar_equals(field_value, literal),
        Operator::Greater | Operator::GreaterEqual | Operator::Less | Operator::LessEqual => {
            let Some(literal) = literal else { return false };
            match compare_scalar(field_value, literal) {
                Some(ordering) => match operator {
                    Operator::Greater => ordering == Ordering::Greater,
                    Operator::GreaterEqual => ordering != Ordering::Less,
                    Operator::Less => ordering == Ordering::Less,
                    Operator::LessEqual => ordering != Ordering::Greater,
                    _ => unreachable!(),
                },
                None => false,
            }
        }
        Operator::In => literal
            .and_then(unwrap_tuple)
            .map(|items| {
                items
                    .iter()
                    .any(|item| scalar_equals(field_value, Some(item)))
            })
            .unwrap_or(false),
        Operator::Like | Operator::Ilike => match (field_value.as_str(), literal) {
            (Some(text), Some(pattern)) => {
                if operator == Operator::Ilike {
                    like_match(&text.to_lowercase(), &pattern.to_lowercase())
                } else {
                    like_match(text, pattern)
                }
            }
            _ => false,
        },
        Operator::ArrayIntersects => {
            let (Some(items), Some(elements)) =
                (literal.and_then(unwrap_set), field_value.as_array())
            else {
                return false;
            };

            elements.iter().any(|element| {
                items
                    .iter()
                    .any(|item| scalar_equals(element, Some(item)))
            })
        }
    }
}

fn scalar_equals(value: &Value, literal: Option<&str>) -> bool {
    match literal {
        None => value.is_null(),
        Some(literal) => compare_scalar(value, literal) == Some(Ordering::Equal),
    }
}

fn compare_scalar(value: &Value, literal: &str) -> Option<Ordering> {
    match value {
        Value::Number(number) => {
            let number = number.as_f64()?;
            number.partial_cmp(&literal.parse::<f64>().ok()?)
        }
        Value::String(text) => Some(text.as_str().cmp(literal)),
        Value::Bool(value) => Some(value.cmp(&literal.parse::<bool>().ok()?)),
        _ => None,
    }
}

/// Splits a tuple literal `(a,b,c)` into its items.
fn unwrap_tuple(literal: &str) -> Option<Vec<&str>> {
    unwrap_delimited(literal, '(', ')')
}

/// Splits a set literal `{a,b,c}` into its items.
fn unwrap_set(literal: &str) -> Option<Vec<&str>> {
    unwrap_delimited(literal, '{', '}')
}

fn unwrap_delimited(literal: &str, open: char, close: char) -> Option<Vec<&str>> {
    let inner = literal.strip_prefix(open)?.strip_suffix(close)?;

    if inner.is_empty() {
        return Some(Vec::new());
    }

    Some(inner.split(',').map(str::trim).collect())
}

/// Matches a `%`-wildcard pattern against text.
fn like_match(text: &str, pattern: &str) -> bool {
    let parts: Vec<&str> = pattern.split('%').collect();

    if parts.len() == 1 {
        return text == pattern;
    }

    let first = parts[0];
    let last = parts[parts.len() - 1];

    if text.len() < first.len() + last.len()
        || !text.starts_with(first)
        || !text.ends_with(last)
    {
        return false;
    }

    // Middle segments must appear in order between the anchors.
    let mut rest = &text[first.len()..text.len() - last.len()];

    for part in &parts[1..parts.len() - 1] {
        if part.is_empty() {
            continue;
        }

        match rest.find(part) {
            Some(index) => rest = &rest[index + part.len()..],
            None => return false,
        }
    }

    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn scalar_comparisons_coerce_numbers() {
        let row = json!({"age": 30});

        assert!(row_matches(&row, "age", Operator::Equal, Some("30")));
        assert!(row_matches(&row, "age", Operator::Greater, Some("18")));
        assert!(row_matches(&row, "age", Operator::LessEqual, Some("30")));
        assert!(!row_matches(&row, "age", Operator::Less, Some("30")));
    }

    #[test]
    fn is_checks_null_and_booleans() {
        let row = json!({"deleted_at": null, "active": true});

        assert!(row_matches(&row, "deleted_at", Operator::Is, None));
        assert!(row_matches(&row, "missing", Operator::Is, None));
        assert!(row_matches(&row, "active", Operator::Is, Some("true")));
        assert!(!row_matches(&row, "active", Operator::Is, Some("false")));

        let deleted = json!({"deleted_at": "2024-01-01T00:00:00Z"});
        assert!(!row_matches(&deleted, "deleted_at", Operator::Is, None));
    }

    #[test]
    fn in_membership_uses_tuple_literals() {
        let row = json!({"status": "open"});

        assert!(row_matches(&row, "status", Operator::In, Some("(open,paused)")));
        assert!(!row_matches(&row, "status", Operator::In, Some("(closed)")));
    }

    #[test]
    fn array_intersects_uses_set_literals() {
        let row = json!({"tags": ["vip", "beta"]});

        assert!(row_matches(&row, "tags", Operator::ArrayIntersects, Some("{beta,gold}")));
        assert!(!row_matches(&row, "tags", Operator::ArrayIntersects, Some("{gold}")));
        assert!(!row_matches(&row, "tags", Operator::ArrayIntersects, Some("{}")));
    }

    #[test]
    fn like_patterns_anchor_and_float() {
        let row = json!({"name": "Alice Cooper"});

        assert!(row_matches(&row, "name", Operator::Like, Some("Alice%")));
        assert!(row_matches(&row, "name", Operator::Like, Some("%Cooper")));
        assert!(row_matches(&row, "name", Operator::Like, Some("%ice%")));
        assert!(row_matches(&row, "name", Operator::Like, Some("Alice Cooper")));
        assert!(!row_matches(&row, "name", Operator::Like, Some("alice%")));
        assert!(row_matches(&row, "name", Operator::Ilike, Some("alice%")));
    }

    #[test]
    fn short_text_cannot_satisfy_overlapping_anchors() {
        let row = json!({"name": "abc"});

        assert!(!row_matches(&row, "name", Operator::Like, Some("abc%bc")));
    }

    #[test]
    fn sorting_ties_on_incomparable_values() {
        assert_eq!(compare_fields(&json!(1), &json!(2)), Ordering::Less);
        assert_eq!(compare_fields(&json!("b"), &json!("a")), Ordering::Greater);
        assert_eq!(compare_fields(&json!(1), &json!("a")), Ordering::Equal);
    }
}
