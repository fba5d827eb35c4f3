//! Recursive construction of condition trees from query objects.
//!
//! At each level, plain keys become leaves joined by the level's combinator;
//! `AND`/`OR` keys open a nested level. The leaves, the `AND` subtree and the
//! `OR` subtree of a level are then joined with `AND`.

use dynaquery_model::Schema;
use serde_json::{Map, Value};
use tracing::{debug, trace};

use crate::condition::{Combinator, Condition};
use crate::config::CompilerConfig;
use crate::error::{CompileError, QueryError};
use crate::operator::{parse_operator, split_key};
use crate::resolver::resolve;

/// Builds condition trees for one schema.
#[derive(Debug, Clone, Copy)]
pub struct ConditionBuilder<'a> {
    schema: &'a Schema,
    config: &'a CompilerConfig,
}

impl<'a> ConditionBuilder<'a> {
    /// Creates a builder.
    #[must_use]
    pub fn new(schema: &'a Schema, config: &'a CompilerConfig) -> Self {
        Self { schema, config }
    }

    /// Builds the condition for a top-level query object.
    ///
    /// Returns `Ok(None)` when the query has no predicates.
    ///
    /// # Errors
    ///
    /// Returns every leaf error found in the tree, or the depth error alone
    /// when nesting exceeds the configured bound.
    pub fn build(&self, query: &Map<String, Value>) -> Result<Option<Condition>, CompileError> {
        self.build_at(query, Combinator::And, 0)
    }

    /// Builds the condition for `query` as a level with the given combinator
    /// and depth.
    ///
    /// # Errors
    ///
    /// See [`ConditionBuilder::build`].
    pub fn build_at(
        &self,
        query: &Map<String, Value>,
        combinator: Combinator,
        depth: usize,
    ) -> Result<Option<Condition>, CompileError> {
        let mut errors = Vec::new();
        let condition = self.build_level(query, combinator, depth, &mut errors)?;
        if errors.is_empty() {
            Ok(condition)
        } else {
            Err(CompileError::new(errors))
        }
    }

    fn build_level(
        &self,
        query: &Map<String, Value>,
        combinator: Combinator,
        depth: usize,
        errors: &mut Vec<QueryError>,
    ) -> Result<Option<Condition>, QueryError> {
        if depth > self.config.max_query_depth {
            return Err(QueryError::DepthExceeded {
                max_depth: self.config.max_query_depth,
            });
        }
        trace!(depth, %combinator, keys = query.len(), "building query level");

        let mut leaves = Vec::new();
        let mut and_group = None;
        let mut or_group = None;
        for (key, value) in query {
            match key.as_str() {
                "AND" => and_group = self.build_group(Combinator::And, value, depth, errors)?,
                "OR" => or_group = self.build_group(Combinator::Or, value, depth, errors)?,
                _ => match self.build_leaf(key, value) {
                    Ok(Some(leaf)) => leaves.push(leaf),
                    Ok(None) => {}
                    Err(e) => errors.push(e),
                },
            }
        }

        let leaves = Condition::combine(combinator, leaves);
        Ok(Condition::all(
            leaves.into_iter().chain(and_group).chain(or_group),
        ))
    }

    fn build_group(
        &self,
        combinator: Combinator,
        value: &Value,
        depth: usize,
        errors: &mut Vec<QueryError>,
    ) -> Result<Option<Condition>, QueryError> {
        match value {
            Value::Object(nested) => self.build_level(nested, combinator, depth + 1, errors),
            // Each array element is an AND-ed object; the elements are joined
            // by the group's combinator.
            Value::Array(items) => {
                let mut parts = Vec::new();
                for item in items {
                    match item {
                        Value::Object(nested) => parts.extend(self.build_level(
                            nested,
                            Combinator::And,
                            depth + 1,
                            errors,
                        )?),
                        other => errors.push(QueryError::value_type(combinator.as_str(), other)),
                    }
                }
                Ok(Condition::combine(combinator, parts))
            }
            Value::Null => Ok(None),
            other => {
                errors.push(QueryError::value_type(combinator.as_str(), other));
                Ok(None)
            }
        }
    }

    fn build_leaf(&self, key: &str, value: &Value) -> Result<Option<Condition>, QueryError> {
        let (field, token) = split_key(key);
        let (operator, negated) = parse_operator(field, token)?;

        let attr = match resolve(self.schema, field) {
            Ok(attr) => attr,
            Err(QueryError::FieldNotAvailable { .. }) if !self.config.raise_on_unavailable_field => {
                debug!(field, "dropping predicate on unavailable field");
                return Ok(None);
            }
            Err(e) => return Err(e),
        };

        let condition = operator.build(&attr, value)?;
        trace!(field, %operator, negated, "built leaf");
        Ok(Some(if negated {
            condition.negate()
        } else {
            condition
        }))
    }
}
