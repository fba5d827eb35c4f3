//! Schema descriptors for record types.
//!
//! A [`Schema`] is built once per record type and is read-only afterwards, so
//! it can be shared between threads and compile calls without locking.
//!
//! # Example
//!
//! ```
//! use dynaquery_model::{AttributeDescriptor, KeyPair, Schema};
//!
//! let schema = Schema::builder(KeyPair::hash_range("name", "sub_name"))
//!     .attribute("name", AttributeDescriptor::String)
//!     .attribute("sub_name", AttributeDescriptor::String)
//!     .attribute("tags", AttributeDescriptor::open_document())
//!     .build()
//!     .unwrap();
//! assert_eq!(schema.available_paths(), vec!["name", "sub_name", "tags", "tags.*"]);
//! ```

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::descriptor::AttributeDescriptor;
use crate::keys::{IndexHandle, IndexKind, KeyPair, SecondaryIndex};

/// Errors raised while constructing a [`Schema`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    /// A key schema has no `HASH` element.
    #[error("key schema has no HASH element")]
    MissingHashKey,
    /// A key references an attribute that is not declared.
    #[error("key attribute '{attribute}' of {owner} is not declared")]
    UnknownKeyAttribute {
        /// The undeclared attribute.
        attribute: String,
        /// `table` or the index name.
        owner: String,
    },
    /// A key references an attribute whose type cannot be a key.
    #[error("attribute '{attribute}' of type {type_name} cannot be used as a key")]
    InvalidKeyType {
        /// The key attribute.
        attribute: String,
        /// Its declared type.
        type_name: &'static str,
    },
    /// An enumeration declares no members.
    #[error("enumeration '{attribute}' has no members")]
    EmptyEnumeration {
        /// Path of the enumeration attribute.
        attribute: String,
    },
    /// Two secondary indexes share a name.
    #[error("duplicate index name '{name}'")]
    DuplicateIndex {
        /// The repeated name.
        name: String,
    },
}

/// Schema descriptor of a record type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawSchema", into = "RawSchema")]
pub struct Schema {
    attributes: BTreeMap<String, AttributeDescriptor>,
    primary_key: KeyPair,
    secondary_indexes: Vec<SecondaryIndex>,
    denylist: BTreeSet<String>,
}

/// Unvalidated serde form of [`Schema`].
#[derive(Debug, Clone, Serialize, Deserialize)]
struct RawSchema {
    attributes: BTreeMap<String, AttributeDescriptor>,
    primary_key: KeyPair,
    #[serde(default)]
    secondary_indexes: Vec<SecondaryIndex>,
    #[serde(default)]
    denylist: BTreeSet<String>,
}

impl TryFrom<RawSchema> for Schema {
    type Error = SchemaError;

    fn try_from(raw: RawSchema) -> Result<Self, Self::Error> {
        let schema = Self {
            attributes: raw.attributes,
            primary_key: raw.primary_key,
            secondary_indexes: raw.secondary_indexes,
            denylist: raw.denylist,
        };
        schema.validate()?;
        Ok(schema)
    }
}

impl From<Schema> for RawSchema {
    fn from(schema: Schema) -> Self {
        Self {
            attributes: schema.attributes,
            primary_key: schema.primary_key,
            secondary_indexes: schema.secondary_indexes,
            denylist: schema.denylist,
        }
    }
}

impl Schema {
    /// Starts building a schema with the given primary key.
    #[must_use]
    pub fn builder(primary_key: KeyPair) -> SchemaBuilder {
        SchemaBuilder {
            attributes: BTreeMap::new(),
            primary_key,
            secondary_indexes: Vec::new(),
            denylist: BTreeSet::new(),
        }
    }

    /// Top-level attributes, ordered by name.
    #[must_use]
    pub fn attributes(&self) -> &BTreeMap<String, AttributeDescriptor> {
        &self.attributes
    }

    /// Declared type of a top-level attribute.
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&AttributeDescriptor> {
        self.attributes.get(name)
    }

    /// Primary key of the table.
    #[must_use]
    pub fn primary_key(&self) -> &KeyPair {
        &self.primary_key
    }

    /// Secondary indexes in declaration order.
    #[must_use]
    pub fn secondary_indexes(&self) -> &[SecondaryIndex] {
        &self.secondary_indexes
    }

    /// Paths excluded from querying.
    #[must_use]
    pub fn denylist(&self) -> &BTreeSet<String> {
        &self.denylist
    }

    /// Whether `path` (or one of its ancestors) is denylisted.
    #[must_use]
    pub fn is_denied(&self, path: &str) -> bool {
        self.denylist.iter().any(|denied| {
            path == denied
                || path
                    .strip_prefix(denied.as_str())
                    .is_some_and(|rest| rest.starts_with('.'))
        })
    }

    /// Index candidates in evaluation order: the table key first, then every
    /// secondary index as declared.
    #[must_use]
    pub fn index_map(&self) -> Vec<(IndexHandle, &KeyPair)> {
        std::iter::once((IndexHandle::Table, &self.primary_key))
            .chain(self.secondary_indexes.iter().map(|index| {
                (
                    IndexHandle::Index {
                        name: index.name.clone(),
                        kind: index.kind,
                    },
                    &index.key,
                )
            }))
            .collect()
    }

    /// Every queryable path, sorted. Open documents appear both bare and with a
    /// `.*` suffix; denylisted paths are left out.
    #[must_use]
    pub fn available_paths(&self) -> Vec<String> {
        let mut paths = Vec::new();
        collect_paths(&self.attributes, "", &mut paths);
        paths.retain(|p| !self.is_denied(p.trim_end_matches(".*")));
        paths.sort();
        paths
    }

    fn validate(&self) -> Result<(), SchemaError> {
        for (name, desc) in &self.attributes {
            validate_descriptor(name, desc)?;
        }

        self.validate_key("table", &self.primary_key)?;

        let mut names = BTreeSet::new();
        for index in &self.secondary_indexes {
            if !names.insert(index.name.as_str()) {
                return Err(SchemaError::DuplicateIndex {
                    name: index.name.clone(),
                });
            }
            self.validate_key(&index.name, &index.key)?;
        }
        Ok(())
    }

    fn validate_key(&self, owner: &str, key: &KeyPair) -> Result<(), SchemaError> {
        for field in key.fields() {
            let desc =
                self.attributes
                    .get(field)
                    .ok_or_else(|| SchemaError::UnknownKeyAttribute {
                        attribute: field.to_owned(),
                        owner: owner.to_owned(),
                    })?;
            if !desc.is_key_eligible() {
                return Err(SchemaError::InvalidKeyType {
                    attribute: field.to_owned(),
                    type_name: desc.type_name(),
                });
            }
        }
        Ok(())
    }
}

fn collect_paths(attributes: &BTreeMap<String, AttributeDescriptor>, prefix: &str, out: &mut Vec<String>) {
    for (name, desc) in attributes {
        let path = format!("{prefix}{name}");
        match desc {
            AttributeDescriptor::Document { attributes } => {
                collect_paths(attributes, &format!("{path}."), out);
            }
            AttributeDescriptor::OpenDocument { .. } => out.push(format!("{path}.*")),
            _ => {}
        }
        out.push(path);
    }
}

fn validate_descriptor(path: &str, desc: &AttributeDescriptor) -> Result<(), SchemaError> {
    match desc {
        AttributeDescriptor::Enumeration { members } if members.is_empty() => {
            Err(SchemaError::EmptyEnumeration {
                attribute: path.to_owned(),
            })
        }
        AttributeDescriptor::Document { attributes } => attributes
            .iter()
            .try_for_each(|(name, inner)| validate_descriptor(&format!("{path}.{name}"), inner)),
        AttributeDescriptor::List { of: Some(inner) }
        | AttributeDescriptor::OpenDocument { of: Some(inner) } => validate_descriptor(path, inner),
        _ => Ok(()),
    }
}

/// Builder for [`Schema`]; validation happens in [`SchemaBuilder::build`].
#[derive(Debug)]
pub struct SchemaBuilder {
    attributes: BTreeMap<String, AttributeDescriptor>,
    primary_key: KeyPair,
    secondary_indexes: Vec<SecondaryIndex>,
    denylist: BTreeSet<String>,
}

impl SchemaBuilder {
    /// Declares a top-level attribute.
    #[must_use]
    pub fn attribute(mut self, name: impl Into<String>, desc: AttributeDescriptor) -> Self {
        self.attributes.insert(name.into(), desc);
        self
    }

    /// Declares a global secondary index.
    #[must_use]
    pub fn global_index(self, name: impl Into<String>, key: KeyPair) -> Self {
        self.index(name.into(), IndexKind::Global, key)
    }

    /// Declares a local secondary index.
    #[must_use]
    pub fn local_index(self, name: impl Into<String>, key: KeyPair) -> Self {
        self.index(name.into(), IndexKind::Local, key)
    }

    /// Excludes a path (and everything beneath it) from querying.
    #[must_use]
    pub fn deny(mut self, path: impl Into<String>) -> Self {
        self.denylist.insert(path.into());
        self
    }

    fn index(mut self, name: String, kind: IndexKind, key: KeyPair) -> Self {
        self.secondary_indexes.push(SecondaryIndex { name, kind, key });
        self
    }

    /// Validates and returns the schema.
    ///
    /// # Errors
    ///
    /// Returns a [`SchemaError`] if a key names an undeclared or non-key
    /// attribute, an index name repeats, or an enumeration is empty.
    pub fn build(self) -> Result<Schema, SchemaError> {
        RawSchema {
            attributes: self.attributes,
            primary_key: self.primary_key,
            secondary_indexes: self.secondary_indexes,
            denylist: self.denylist,
        }
        .try_into()
    }
}
