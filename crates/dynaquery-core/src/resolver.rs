//! Field path resolution against a schema.
//!
//! Paths are dot-separated. Fixed documents are walked level by level; once a
//! path enters an open document the rest of it is accepted without checks and
//! typed by the document's element type, if any.

use std::fmt;

use dynaquery_model::{AttributeDescriptor, Schema};

use crate::error::QueryError;

/// Separator between path segments.
pub const PATH_SEPARATOR: char = '.';

/// A dot-separated attribute path, split into segments.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FieldPath {
    segments: Vec<String>,
}

impl FieldPath {
    /// Splits a dotted path. Empty segments are kept so resolution can reject them.
    #[must_use]
    pub fn parse(path: &str) -> Self {
        Self {
            segments: path.split(PATH_SEPARATOR).map(str::to_owned).collect(),
        }
    }

    /// Path segments, outermost first.
    #[must_use]
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Top-level attribute name.
    #[must_use]
    pub fn root(&self) -> &str {
        self.segments.first().map_or("", String::as_str)
    }

    /// Whether this path equals `field` or lies below it.
    #[must_use]
    pub fn starts_with_field(&self, field: &str) -> bool {
        let prefix = FieldPath::parse(field);
        self.segments.starts_with(&prefix.segments)
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.segments.join("."))
    }
}

impl From<&str> for FieldPath {
    fn from(path: &str) -> Self {
        Self::parse(path)
    }
}

/// A path that resolved against the schema.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedAttribute<'s> {
    /// The resolved path.
    pub path: FieldPath,
    /// Type used for value coercion; `None` when the path is untyped.
    pub descriptor: Option<&'s AttributeDescriptor>,
    /// Whether the path crossed into an open document.
    pub unvalidated: bool,
}

impl ResolvedAttribute<'_> {
    /// The path in dotted form, as used for error tagging.
    #[must_use]
    pub fn field(&self) -> String {
        self.path.to_string()
    }
}

/// Resolves a dotted `path` against `schema`.
///
/// # Errors
///
/// Returns [`QueryError::FieldNotAvailable`] when a segment is not declared,
/// the path descends into a scalar, or the path is denylisted. The message
/// names the failing segment and lists every available path.
pub fn resolve<'s>(schema: &'s Schema, path: &str) -> Result<ResolvedAttribute<'s>, QueryError> {
    let field_path = FieldPath::parse(path);
    let not_available =
        |segment: &str| QueryError::field_not_available(path, segment, &schema.available_paths());

    if schema.is_denied(path) {
        return Err(not_available(path));
    }

    let segments = field_path.segments();
    let mut attributes = schema.attributes();
    for (i, segment) in segments.iter().enumerate() {
        let desc = attributes
            .get(segment)
            .ok_or_else(|| not_available(segment))?;
        let rest = &segments[i + 1..];
        if rest.is_empty() {
            return Ok(ResolvedAttribute {
                path: field_path.clone(),
                descriptor: Some(desc),
                unvalidated: false,
            });
        }

        match desc {
            AttributeDescriptor::Document { attributes: inner } => attributes = inner,
            AttributeDescriptor::OpenDocument { of } => {
                let descriptor = of.as_deref().and_then(|element| lenient(element, &rest[1..]));
                return Ok(ResolvedAttribute {
                    path: field_path.clone(),
                    descriptor,
                    unvalidated: true,
                });
            }
            _ => return Err(not_available(&rest[0])),
        }
    }

    Err(not_available(path))
}

/// Best-effort typing below an open document; gives up instead of failing.
fn lenient<'s>(desc: &'s AttributeDescriptor, rest: &[String]) -> Option<&'s AttributeDescriptor> {
    let Some((head, tail)) = rest.split_first() else {
        return Some(desc);
    };
    match desc {
        AttributeDescriptor::Document { attributes } => {
            attributes.get(head).and_then(|inner| lenient(inner, tail))
        }
        AttributeDescriptor::OpenDocument { of } => {
            of.as_deref().and_then(|element| lenient(element, tail))
        }
        _ => None,
    }
}
