//! Query compilation errors.
//!
//! Every failure is reported as a [`QueryError`] tagged with the offending
//! field path. [`CompileError`] aggregates the failures of one compilation and
//! renders them in the `{"Query": {field: [messages]}}` shape callers expose to
//! their clients.

use std::fmt;

use serde_json::{Map, Value, json};

use crate::operator::Operator;

/// Top-level key of the rendered error document.
pub const ERROR_ROOT_KEY: &str = "Query";

/// Machine-readable kind of a [`QueryError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum QueryErrorCode {
    /// The operator suffix is not in the vocabulary.
    InvalidOperator,
    /// The field path does not resolve against the schema.
    FieldNotAvailable,
    /// The raw value cannot be coerced to the declared type.
    ValueTypeError,
    /// The value is not a member of the declared enumeration.
    EnumMembershipError,
    /// `AND`/`OR` nesting is deeper than the configured bound.
    DepthExceeded,
    /// No usable table or index key matches the query.
    IndexNotFound,
}

impl QueryErrorCode {
    /// Returns the code as a string.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidOperator => "InvalidOperator",
            Self::FieldNotAvailable => "FieldNotAvailable",
            Self::ValueTypeError => "ValueTypeError",
            Self::EnumMembershipError => "EnumMembershipError",
            Self::DepthExceeded => "DepthExceeded",
            Self::IndexNotFound => "IndexNotFound",
        }
    }
}

impl fmt::Display for QueryErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single query compilation failure.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QueryError {
    /// Unknown operator suffix.
    #[error("{field}: {message}")]
    InvalidOperator {
        /// Field path the operator was attached to.
        field: String,
        /// Human-readable message.
        message: String,
    },

    /// Field path not declared, or denylisted.
    #[error("{field}: {message}")]
    FieldNotAvailable {
        /// Field path as written in the query.
        field: String,
        /// Human-readable message.
        message: String,
    },

    /// Value of the wrong type.
    #[error("{field}: {message}")]
    ValueType {
        /// Field path the value was supplied for.
        field: String,
        /// Human-readable message.
        message: String,
    },

    /// Value outside the declared enumeration.
    #[error("{field}: {message}")]
    EnumMembership {
        /// Field path the value was supplied for.
        field: String,
        /// Human-readable message.
        message: String,
    },

    /// Nesting bound exceeded.
    #[error("Maximal query depth has been reached.")]
    DepthExceeded {
        /// Configured bound.
        max_depth: usize,
    },

    /// No table or index key can serve the query.
    #[error("Could not find index for query.")]
    IndexNotFound,
}

impl QueryError {
    /// Unknown operator `token` on `field`.
    #[must_use]
    pub fn invalid_operator(field: &str, token: &str) -> Self {
        let available: Vec<&str> = Operator::ALL.iter().map(|op| op.token()).collect();
        Self::InvalidOperator {
            field: field.to_owned(),
            message: format!(
                "Operator {token} does not exist. Choose some of available: {}",
                available.join(", ")
            ),
        }
    }

    /// `segment` of `field` does not resolve; `available` lists legal paths.
    #[must_use]
    pub fn field_not_available(field: &str, segment: &str, available: &[String]) -> Self {
        Self::FieldNotAvailable {
            field: field.to_owned(),
            message: format!(
                "Parameter {segment} does not exist. Choose some of available: {}",
                available.join(", ")
            ),
        }
    }

    /// `raw` cannot be coerced to the type of `field`.
    #[must_use]
    pub fn value_type(field: &str, raw: &Value) -> Self {
        Self::ValueType {
            field: field.to_owned(),
            message: format!("{} is not valid type of {field}.", display_raw(raw)),
        }
    }

    /// `raw` is not a timestamp in any of `formats`.
    #[must_use]
    pub fn timestamp_format(field: &str, raw: &Value, formats: &[&str]) -> Self {
        Self::ValueType {
            field: field.to_owned(),
            message: format!(
                "{} is not valid type of {field}. Supported formats are {}",
                display_raw(raw),
                formats.join(", ")
            ),
        }
    }

    /// `raw` (a scalar or a list) is not within `members`.
    #[must_use]
    pub fn enum_membership(field: &str, raw: &Value, members: &[&str]) -> Self {
        let supplied = match raw {
            Value::Array(items) => items.iter().map(display_raw).collect::<Vec<_>>().join(", "),
            other => display_raw(other),
        };
        Self::EnumMembership {
            field: field.to_owned(),
            message: format!("{supplied} is not member of {}.", members.join(", ")),
        }
    }

    /// Returns the error code.
    #[must_use]
    pub fn code(&self) -> QueryErrorCode {
        match self {
            Self::InvalidOperator { .. } => QueryErrorCode::InvalidOperator,
            Self::FieldNotAvailable { .. } => QueryErrorCode::FieldNotAvailable,
            Self::ValueType { .. } => QueryErrorCode::ValueTypeError,
            Self::EnumMembership { .. } => QueryErrorCode::EnumMembershipError,
            Self::DepthExceeded { .. } => QueryErrorCode::DepthExceeded,
            Self::IndexNotFound => QueryErrorCode::IndexNotFound,
        }
    }

    /// Field path the error is tagged with; `None` for query-wide errors.
    #[must_use]
    pub fn field(&self) -> Option<&str> {
        match self {
            Self::InvalidOperator { field, .. }
            | Self::FieldNotAvailable { field, .. }
            | Self::ValueType { field, .. }
            | Self::EnumMembership { field, .. } => Some(field),
            Self::DepthExceeded { .. } | Self::IndexNotFound => None,
        }
    }

    /// Human-readable message without the field prefix.
    #[must_use]
    pub fn message(&self) -> String {
        match self {
            Self::InvalidOperator { message, .. }
            | Self::FieldNotAvailable { message, .. }
            | Self::ValueType { message, .. }
            | Self::EnumMembership { message, .. } => message.clone(),
            Self::DepthExceeded { .. } | Self::IndexNotFound => self.to_string(),
        }
    }
}

/// Renders a raw JSON value for messages; strings are shown unquoted.
fn display_raw(raw: &Value) -> String {
    match raw {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// All failures of one compilation, in discovery order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileError {
    errors: Vec<QueryError>,
}

impl CompileError {
    /// Wraps a non-empty list of errors.
    #[must_use]
    pub fn new(errors: Vec<QueryError>) -> Self {
        debug_assert!(!errors.is_empty(), "compile error without causes");
        Self { errors }
    }

    /// Individual failures.
    #[must_use]
    pub fn errors(&self) -> &[QueryError] {
        &self.errors
    }

    /// Consumes the aggregate, returning the individual failures.
    #[must_use]
    pub fn into_errors(self) -> Vec<QueryError> {
        self.errors
    }

    /// Whether any failure has the given code.
    #[must_use]
    pub fn has_code(&self, code: QueryErrorCode) -> bool {
        self.errors.iter().any(|e| e.code() == code)
    }

    /// Renders the errors as `{"Query": {field: [messages]}}`.
    ///
    /// Query-wide errors (depth, index selection) have no field; when only
    /// those are present the shape is `{"Query": [messages]}`, otherwise they
    /// are listed under a `"Query"` key next to the field entries.
    #[must_use]
    pub fn to_json(&self) -> Value {
        let mut by_field = Map::new();
        let mut general = Vec::new();
        for error in &self.errors {
            match error.field() {
                Some(field) => {
                    let entry = by_field
                        .entry(field.to_owned())
                        .or_insert_with(|| Value::Array(Vec::new()));
                    if let Value::Array(messages) = entry {
                        messages.push(Value::String(error.message()));
                    }
                }
                None => general.push(Value::String(error.message())),
            }
        }

        if by_field.is_empty() {
            return json!({ ERROR_ROOT_KEY: general });
        }
        if !general.is_empty() {
            by_field.insert(ERROR_ROOT_KEY.to_owned(), Value::Array(general));
        }
        json!({ ERROR_ROOT_KEY: by_field })
    }
}

impl From<QueryError> for CompileError {
    fn from(error: QueryError) -> Self {
        Self {
            errors: vec![error],
        }
    }
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid query")?;
        for (i, error) in self.errors.iter().enumerate() {
            let sep = if i == 0 { ": " } else { "; " };
            write!(f, "{sep}{error}")?;
        }
        Ok(())
    }
}

impl std::error::Error for CompileError {}
