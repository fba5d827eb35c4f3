//! Attribute descriptors: the declared type of every queryable field.
//!
//! The variant set is closed; the compiler matches on it exhaustively to pick
//! value coercion and path-resolution behavior.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Declared type of a record attribute.
///
/// Deserializes from an internally tagged JSON form, e.g.
/// `{"type": "enumeration", "members": [{"name": "finance", "value": 1}]}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AttributeDescriptor {
    /// Scalar string.
    String,
    /// Scalar number.
    Number,
    /// Boolean.
    Boolean,
    /// UTC timestamp, stored as an ISO-8601 string.
    Timestamp,
    /// Set of strings.
    StringSet,
    /// Ordered list, optionally with a declared element type.
    List {
        /// Element type; elements are treated as strings when absent.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        of: Option<Box<AttributeDescriptor>>,
    },
    /// Nested document with a fixed set of fields.
    Document {
        /// Fields of the nested document.
        attributes: BTreeMap<String, AttributeDescriptor>,
    },
    /// Schema-less nested map; any sub-key is accepted.
    OpenDocument {
        /// Type of the map's values, if declared.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        of: Option<Box<AttributeDescriptor>>,
    },
    /// Enumeration over a fixed, ordered set of named members.
    Enumeration {
        /// Legal members in declaration order.
        members: Vec<EnumMember>,
    },
}

impl AttributeDescriptor {
    /// Enumeration whose members are numbered from 1 in the given order.
    #[must_use]
    pub fn enumeration<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let members = names
            .into_iter()
            .zip(1_i64..)
            .map(|(name, n)| EnumMember {
                name: name.into(),
                value: EnumValue::Number(n),
            })
            .collect();
        Self::Enumeration { members }
    }

    /// Open document without a declared element type.
    #[must_use]
    pub fn open_document() -> Self {
        Self::OpenDocument { of: None }
    }

    /// List with the given element type.
    #[must_use]
    pub fn list_of(element: AttributeDescriptor) -> Self {
        Self::List {
            of: Some(Box::new(element)),
        }
    }

    /// Fixed document built from `(name, descriptor)` pairs.
    #[must_use]
    pub fn document<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = (S, AttributeDescriptor)>,
        S: Into<String>,
    {
        Self::Document {
            attributes: fields.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }

    /// Short lowercase name of the type, used in messages.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::Timestamp => "timestamp",
            Self::StringSet => "string_set",
            Self::List { .. } => "list",
            Self::Document { .. } => "document",
            Self::OpenDocument { .. } => "open_document",
            Self::Enumeration { .. } => "enumeration",
        }
    }

    /// Whether the attribute can serve as a hash or range key.
    #[must_use]
    pub fn is_key_eligible(&self) -> bool {
        matches!(
            self,
            Self::String | Self::Number | Self::Timestamp | Self::Enumeration { .. }
        )
    }

    /// Declared element type of a list or open document.
    #[must_use]
    pub fn element(&self) -> Option<&AttributeDescriptor> {
        match self {
            Self::List { of } | Self::OpenDocument { of } => of.as_deref(),
            _ => None,
        }
    }

    /// Looks up an enumeration member by name.
    #[must_use]
    pub fn enum_member(&self, name: &str) -> Option<&EnumMember> {
        match self {
            Self::Enumeration { members } => members.iter().find(|m| m.name == name),
            _ => None,
        }
    }

    /// Member names of an enumeration, in declaration order.
    #[must_use]
    pub fn member_names(&self) -> Vec<&str> {
        match self {
            Self::Enumeration { members } => members.iter().map(|m| m.name.as_str()).collect(),
            _ => Vec::new(),
        }
    }
}

/// A named enumeration member and the value it is stored as.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnumMember {
    /// Member name, as used in queries.
    pub name: String,
    /// Stored representation.
    pub value: EnumValue,
}

/// Stored representation of an enumeration member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EnumValue {
    /// Numeric enumeration (stored as `N`).
    Number(i64),
    /// String enumeration (stored as `S`).
    String(String),
}

impl fmt::Display for EnumValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::String(s) => f.write_str(s),
        }
    }
}
