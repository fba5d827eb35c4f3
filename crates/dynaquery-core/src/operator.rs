//! The operator vocabulary.
//!
//! A query key is `field` or `field__operator`, where the operator may carry a
//! `not_` prefix. Each operator knows how to coerce its raw value and which
//! condition it produces.

use std::fmt;

use dynaquery_model::QueryValue;
use serde_json::Value;

use crate::condition::{Comparison, Condition, Predicate};
use crate::error::QueryError;
use crate::resolver::ResolvedAttribute;
use crate::value::{Operand, parse_operand, parse_value};

/// Separator between the field path and the operator in a query key.
pub const OPERATOR_SEPARATOR: &str = "__";

/// Prefix negating an operator.
pub const NEGATION_PREFIX: &str = "not_";

/// A query operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    /// `equals`: equality; `null` asserts absence.
    Equals,
    /// `contains`: substring or membership; lists are ANDed.
    Contains,
    /// `exists`: presence; the value is ignored.
    Exists,
    /// `startswith`: string prefix.
    StartsWith,
    /// `gt`
    Gt,
    /// `lt`
    Lt,
    /// `gte`
    Gte,
    /// `lte`
    Lte,
    /// `is_in`: equality with any listed value.
    IsIn,
}

impl Operator {
    /// Every operator, in the order used by error messages.
    pub const ALL: [Self; 9] = [
        Self::Equals,
        Self::Contains,
        Self::Exists,
        Self::StartsWith,
        Self::Gt,
        Self::Lt,
        Self::Gte,
        Self::Lte,
        Self::IsIn,
    ];

    /// Query token for this operator.
    #[must_use]
    pub fn token(&self) -> &'static str {
        match self {
            Self::Equals => "equals",
            Self::Contains => "contains",
            Self::Exists => "exists",
            Self::StartsWith => "startswith",
            Self::Gt => "gt",
            Self::Lt => "lt",
            Self::Gte => "gte",
            Self::Lte => "lte",
            Self::IsIn => "is_in",
        }
    }

    /// Looks up an operator by its token.
    #[must_use]
    pub fn from_token(token: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|op| op.token() == token)
    }

    fn comparison(self) -> Option<Comparison> {
        match self {
            Self::Gt => Some(Comparison::Gt),
            Self::Lt => Some(Comparison::Lt),
            Self::Gte => Some(Comparison::Ge),
            Self::Lte => Some(Comparison::Le),
            _ => None,
        }
    }

    /// Builds the (non-negated) condition for `attr` with the raw `value`.
    ///
    /// # Errors
    ///
    /// Returns a value error when `value` does not fit the attribute type,
    /// or when `null` is given to an operator other than `equals`/`exists`.
    pub fn build(
        self,
        attr: &ResolvedAttribute<'_>,
        value: &Value,
    ) -> Result<Condition, QueryError> {
        let field = attr.field();
        let path = attr.path.clone();
        let non_null = |parsed: QueryValue| {
            if parsed.is_null() {
                Err(QueryError::value_type(&field, value))
            } else {
                Ok(parsed)
            }
        };

        match self {
            Self::Exists => Ok(Condition::leaf(path, Predicate::Exists)),
            Self::Equals => {
                let parsed = parse_value(attr.descriptor, &field, value)?;
                if parsed.is_null() {
                    Ok(Condition::leaf(path, Predicate::Exists).negate())
                } else {
                    Ok(Condition::leaf(path, Predicate::Equals(parsed)))
                }
            }
            Self::StartsWith => {
                let parsed = non_null(parse_value(attr.descriptor, &field, value)?)?;
                Ok(Condition::leaf(path, Predicate::BeginsWith(parsed)))
            }
            Self::Gt | Self::Lt | Self::Gte | Self::Lte => {
                let parsed = non_null(parse_value(attr.descriptor, &field, value)?)?;
                let cmp = self.comparison().ok_or_else(|| QueryError::value_type(&field, value))?;
                Ok(Condition::leaf(path, Predicate::Compare(cmp, parsed)))
            }
            Self::Contains | Self::IsIn => {
                type Combine = fn(Vec<Condition>) -> Option<Condition>;
                let (predicate, combine): (fn(QueryValue) -> Predicate, Combine) =
                    if self == Self::Contains {
                        (Predicate::Contains, Condition::all)
                    } else {
                        (Predicate::In, Condition::any)
                    };
                match parse_operand(attr.descriptor, &field, value)? {
                    Operand::Single(parsed) => {
                        let parsed = non_null(parsed)?;
                        Ok(Condition::leaf(path, predicate(parsed)))
                    }
                    Operand::Many(items) => {
                        let leaves = items
                            .into_iter()
                            .map(|item| {
                                non_null(item).map(|v| Condition::leaf(path.clone(), predicate(v)))
                            })
                            .collect::<Result<Vec<_>, _>>()?;
                        combine(leaves).ok_or_else(|| QueryError::value_type(&field, value))
                    }
                }
            }
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

/// Splits a query key into its field path and operator token at the last
/// [`OPERATOR_SEPARATOR`].
#[must_use]
pub fn split_key(key: &str) -> (&str, Option<&str>) {
    match key.rsplit_once(OPERATOR_SEPARATOR) {
        Some((field, token)) => (field, Some(token)),
        None => (key, None),
    }
}

/// Parses an operator token, returning the operator and whether it is negated.
///
/// A missing token, an empty token and a bare `not_` all mean `equals`.
///
/// # Errors
///
/// Returns [`QueryError::InvalidOperator`] for tokens outside the vocabulary.
pub fn parse_operator(field: &str, token: Option<&str>) -> Result<(Operator, bool), QueryError> {
    let Some(token) = token else {
        return Ok((Operator::Equals, false));
    };
    let (name, negated) = match token.strip_prefix(NEGATION_PREFIX) {
        Some(rest) => (rest, true),
        None => (token, false),
    };
    if name.is_empty() {
        return Ok((Operator::Equals, negated));
    }
    Operator::from_token(name)
        .map(|op| (op, negated))
        .ok_or_else(|| QueryError::invalid_operator(field, token))
}
