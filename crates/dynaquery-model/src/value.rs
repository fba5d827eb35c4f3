//! Query values after type-directed coercion.

use std::fmt;

use chrono::{DateTime, Utc};

use crate::attribute_value::AttributeValue;
use crate::descriptor::EnumValue;

/// Format used when a timestamp is stored or rendered: microsecond precision,
/// explicit UTC offset.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6f+00:00";

/// A raw query value coerced to the declared attribute type.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryValue {
    /// JSON `null`; means "attribute absent" for equality.
    Null,
    /// String.
    String(String),
    /// Number, kept in its decimal text form.
    Number(String),
    /// Boolean.
    Bool(bool),
    /// UTC timestamp.
    Timestamp(DateTime<Utc>),
    /// List of coerced elements.
    List(Vec<QueryValue>),
    /// Composite value passed through untouched (documents, untyped nested data).
    Document(serde_json::Value),
    /// Enumeration member, by name and stored value.
    Enum {
        /// Member name.
        name: String,
        /// Stored representation.
        value: EnumValue,
    },
}

impl QueryValue {
    /// Returns `true` for [`QueryValue::Null`].
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Stored DynamoDB representation of this value.
    #[must_use]
    pub fn to_attribute_value(&self) -> AttributeValue {
        match self {
            Self::Null => AttributeValue::Null(true),
            Self::String(s) => AttributeValue::S(s.clone()),
            Self::Number(n) => AttributeValue::N(n.clone()),
            Self::Bool(b) => AttributeValue::Bool(*b),
            Self::Timestamp(ts) => AttributeValue::S(format_timestamp(ts)),
            Self::List(items) => {
                AttributeValue::L(items.iter().map(Self::to_attribute_value).collect())
            }
            Self::Document(json) => AttributeValue::from_json(json),
            Self::Enum { value, .. } => match value {
                EnumValue::Number(n) => AttributeValue::N(n.to_string()),
                EnumValue::String(s) => AttributeValue::S(s.clone()),
            },
        }
    }
}

/// Formats a timestamp with [`TIMESTAMP_FORMAT`].
#[must_use]
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

impl fmt::Display for QueryValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::String(s) | Self::Number(s) => f.write_str(s),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Timestamp(ts) => f.write_str(&format_timestamp(ts)),
            Self::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            Self::Document(json) => write!(f, "{json}"),
            Self::Enum { name, .. } => f.write_str(name),
        }
    }
}
