//! Key schema types for tables and secondary indexes.
//!
//! [`KeySchemaElement`] and [`KeyType`] follow the DynamoDB JSON wire format so
//! a key schema can be taken straight from a `DescribeTable` response.
//! [`KeyPair`] is the compiler's view of a key schema: a hash field and an
//! optional range field.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::schema::SchemaError;

/// Key type within a key schema element.
///
/// `Hash` denotes the partition key; `Range` denotes the sort key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KeyType {
    /// Partition key.
    #[serde(rename = "HASH")]
    Hash,
    /// Sort key.
    #[serde(rename = "RANGE")]
    Range,
}

impl KeyType {
    /// Returns the DynamoDB wire-format string representation of this key type.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Hash => "HASH",
            Self::Range => "RANGE",
        }
    }
}

impl fmt::Display for KeyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An element of the key schema for a table or index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct KeySchemaElement {
    /// The name of the key attribute.
    pub attribute_name: String,
    /// The role of the attribute in the key schema (`HASH` or `RANGE`).
    pub key_type: KeyType,
}

/// Hash field plus optional range field of a table or index.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct KeyPair {
    /// Partition key attribute name.
    pub hash: String,
    /// Sort key attribute name, if the key schema has one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range: Option<String>,
}

impl KeyPair {
    /// Key pair with a hash field only.
    #[must_use]
    pub fn hash(hash: impl Into<String>) -> Self {
        Self {
            hash: hash.into(),
            range: None,
        }
    }

    /// Key pair with both hash and range fields.
    #[must_use]
    pub fn hash_range(hash: impl Into<String>, range: impl Into<String>) -> Self {
        Self {
            hash: hash.into(),
            range: Some(range.into()),
        }
    }

    /// Builds a key pair from DynamoDB key schema elements.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::MissingHashKey`] if no `HASH` element is present.
    pub fn from_key_schema(elements: &[KeySchemaElement]) -> Result<Self, SchemaError> {
        let hash = elements
            .iter()
            .find(|e| e.key_type == KeyType::Hash)
            .ok_or(SchemaError::MissingHashKey)?;
        let range = elements.iter().find(|e| e.key_type == KeyType::Range);
        Ok(Self {
            hash: hash.attribute_name.clone(),
            range: range.map(|e| e.attribute_name.clone()),
        })
    }

    /// Iterates over the fields of this key pair, hash first.
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.hash.as_str()).chain(self.range.as_deref())
    }
}

impl fmt::Display for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.range {
            Some(range) => write!(f, "({}, {range})", self.hash),
            None => write!(f, "({}, -)", self.hash),
        }
    }
}

/// Kind of secondary index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexKind {
    /// Global secondary index: independent hash key.
    Global,
    /// Local secondary index: shares the table hash key.
    Local,
}

/// A secondary index declared on a record type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecondaryIndex {
    /// Index name as known to the store.
    pub name: String,
    /// Global or local.
    pub kind: IndexKind,
    /// Key pair of the index.
    pub key: KeyPair,
}

/// Which key structure a query should be executed against.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum IndexHandle {
    /// The table itself, through its primary key.
    Table,
    /// A named secondary index.
    Index {
        /// Index name.
        name: String,
        /// Global or local.
        kind: IndexKind,
    },
}

impl IndexHandle {
    /// Index name for the store's `IndexName` parameter; `None` for the table.
    #[must_use]
    pub fn index_name(&self) -> Option<&str> {
        match self {
            Self::Table => None,
            Self::Index { name, .. } => Some(name),
        }
    }
}

impl fmt::Display for IndexHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Table => f.write_str("table"),
            Self::Index { name, .. } => f.write_str(name),
        }
    }
}
