//! Type-directed coercion of raw JSON query values.
//!
//! A raw value is coerced according to the descriptor its field path resolved
//! to. `None` stands for an untyped path below an open document, where the
//! value keeps its native JSON type.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use dynaquery_model::{AttributeDescriptor, QueryValue};
use serde_json::Value;

use crate::error::QueryError;

/// Accepted timestamp layouts, tried in order.
///
/// Layouts carrying an offset are converted to UTC; layouts without one are
/// taken to be UTC already. A bare date means midnight.
pub const TIMESTAMP_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f%:z",
    "%Y-%m-%dT%H:%M:%S%.fZ",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f%:z",
    "%Y-%m-%d %H:%M:%S%.fZ",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%d",
];

/// Separator splitting a string supplied for a list field.
pub const LIST_SEPARATOR: char = ',';

/// An operand after coercion: one value, or the elements of a supplied list.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    /// A single value.
    Single(QueryValue),
    /// Elements of a list, each coerced on its own.
    Many(Vec<QueryValue>),
}

/// Coerces `raw` to the type described by `desc`.
///
/// JSON `null` is accepted for every type and yields [`QueryValue::Null`].
///
/// # Errors
///
/// Returns [`QueryError::ValueType`] or [`QueryError::EnumMembership`] tagged
/// with `field` when `raw` does not fit the declared type.
pub fn parse_value(
    desc: Option<&AttributeDescriptor>,
    field: &str,
    raw: &Value,
) -> Result<QueryValue, QueryError> {
    if raw.is_null() {
        return Ok(QueryValue::Null);
    }
    let Some(desc) = desc else {
        return Ok(untyped(raw));
    };

    match desc {
        AttributeDescriptor::String => parse_string(field, raw),
        AttributeDescriptor::Number => parse_number(field, raw),
        AttributeDescriptor::Boolean => parse_bool(field, raw),
        AttributeDescriptor::Timestamp => parse_timestamp(field, raw).map(QueryValue::Timestamp),
        AttributeDescriptor::StringSet => match raw {
            Value::Array(items) => items
                .iter()
                .map(|item| parse_string(field, item))
                .collect::<Result<Vec<_>, _>>()
                .map(QueryValue::List),
            other => parse_string(field, other),
        },
        AttributeDescriptor::List { of } => parse_list(of.as_deref(), field, raw),
        AttributeDescriptor::Document { .. } | AttributeDescriptor::OpenDocument { .. } => {
            Ok(match raw {
                Value::Object(_) | Value::Array(_) => QueryValue::Document(raw.clone()),
                scalar => untyped(scalar),
            })
        }
        AttributeDescriptor::Enumeration { .. } => parse_enum(desc, field, raw),
    }
}

/// Coerces the operand of a `contains` or `is_in` predicate.
///
/// A list (or, for list fields, a separator-delimited string) becomes
/// [`Operand::Many`] with every element coerced to the element type; anything
/// else is a single value.
///
/// # Errors
///
/// Same as [`parse_value`].
pub fn parse_operand(
    desc: Option<&AttributeDescriptor>,
    field: &str,
    raw: &Value,
) -> Result<Operand, QueryError> {
    let parsed = match (desc, raw) {
        (Some(AttributeDescriptor::List { .. } | AttributeDescriptor::Enumeration { .. }), _) => {
            parse_value(desc, field, raw)?
        }
        (Some(AttributeDescriptor::StringSet), Value::Array(_)) => parse_value(desc, field, raw)?,
        (_, Value::Array(items)) => {
            return items
                .iter()
                .map(|item| parse_value(desc, field, item))
                .collect::<Result<Vec<_>, _>>()
                .map(Operand::Many);
        }
        _ => return parse_value(desc, field, raw).map(Operand::Single),
    };

    Ok(match parsed {
        QueryValue::List(items) => Operand::Many(items),
        single => Operand::Single(single),
    })
}

/// Parses a timestamp string against [`TIMESTAMP_FORMATS`].
///
/// # Errors
///
/// Returns [`QueryError::ValueType`] listing the accepted layouts.
pub fn parse_timestamp(field: &str, raw: &Value) -> Result<DateTime<Utc>, QueryError> {
    let Value::String(text) = raw else {
        return Err(QueryError::timestamp_format(field, raw, TIMESTAMP_FORMATS));
    };
    let text = text.trim();

    TIMESTAMP_FORMATS
        .iter()
        .find_map(|fmt| parse_with_format(text, fmt))
        .ok_or_else(|| QueryError::timestamp_format(field, raw, TIMESTAMP_FORMATS))
}

fn parse_with_format(text: &str, fmt: &str) -> Option<DateTime<Utc>> {
    if fmt.ends_with("%:z") {
        DateTime::parse_from_str(text, fmt)
            .ok()
            .map(|ts| ts.with_timezone(&Utc))
    } else if fmt == "%Y-%m-%d" {
        NaiveDate::parse_from_str(text, fmt)
            .ok()
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map(|ts| ts.and_utc())
    } else {
        NaiveDateTime::parse_from_str(text, fmt)
            .ok()
            .map(|ts| ts.and_utc())
    }
}

fn parse_string(field: &str, raw: &Value) -> Result<QueryValue, QueryError> {
    match raw {
        Value::String(s) => Ok(QueryValue::String(s.clone())),
        other => Err(QueryError::value_type(field, other)),
    }
}

fn parse_number(field: &str, raw: &Value) -> Result<QueryValue, QueryError> {
    match raw {
        Value::Number(n) => Ok(QueryValue::Number(n.to_string())),
        Value::String(s) if is_decimal(s.trim()) => Ok(QueryValue::Number(s.trim().to_owned())),
        other => Err(QueryError::value_type(field, other)),
    }
}

/// Finite decimal in plain or exponent notation; rejects `inf`/`nan` spellings.
fn is_decimal(text: &str) -> bool {
    !text.is_empty()
        && text
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, '+' | '-' | '.' | 'e' | 'E'))
        && text.parse::<f64>().is_ok_and(f64::is_finite)
}

fn parse_bool(field: &str, raw: &Value) -> Result<QueryValue, QueryError> {
    match raw {
        Value::Bool(b) => Ok(QueryValue::Bool(*b)),
        Value::String(s) if s.trim().eq_ignore_ascii_case("true") => Ok(QueryValue::Bool(true)),
        Value::String(s) if s.trim().eq_ignore_ascii_case("false") => Ok(QueryValue::Bool(false)),
        other => Err(QueryError::value_type(field, other)),
    }
}

fn parse_list(
    element: Option<&AttributeDescriptor>,
    field: &str,
    raw: &Value,
) -> Result<QueryValue, QueryError> {
    let items: Vec<Value> = match raw {
        Value::Array(items) => items.clone(),
        Value::String(s) => s
            .split(LIST_SEPARATOR)
            .map(|part| Value::String(part.to_owned()))
            .collect(),
        other => return Err(QueryError::value_type(field, other)),
    };

    // Elements of an untyped list keep their JSON type; split parts are strings.
    items
        .iter()
        .map(|item| parse_value(element, field, item))
        .collect::<Result<Vec<_>, _>>()
        .map(QueryValue::List)
}

fn parse_enum(
    desc: &AttributeDescriptor,
    field: &str,
    raw: &Value,
) -> Result<QueryValue, QueryError> {
    let member = |item: &Value| {
        item.as_str().and_then(|name| desc.enum_member(name)).map(|m| QueryValue::Enum {
            name: m.name.clone(),
            value: m.value.clone(),
        })
    };
    let rejected = || QueryError::enum_membership(field, raw, &desc.member_names());

    match raw {
        Value::Array(items) => items
            .iter()
            .map(|item| member(item).ok_or_else(rejected))
            .collect::<Result<Vec<_>, _>>()
            .map(QueryValue::List),
        scalar => member(scalar).ok_or_else(rejected),
    }
}

/// Keeps the native JSON type of a value below an open document.
fn untyped(raw: &Value) -> QueryValue {
    match raw {
        Value::Null => QueryValue::Null,
        Value::Bool(b) => QueryValue::Bool(*b),
        Value::Number(n) => QueryValue::Number(n.to_string()),
        Value::String(s) => QueryValue::String(s.clone()),
        Value::Array(items) => QueryValue::List(items.iter().map(untyped).collect()),
        Value::Object(_) => QueryValue::Document(raw.clone()),
    }
}
