//! Compiler entry points.
//!
//! [`QueryCompiler`] ties the pieces together: it builds scan filters from
//! whole queries, and for indexed queries selects a key pair, extracts the
//! hash value and builds the key and filter conditions from the query's
//! partitions.

use std::collections::HashMap;

use dynaquery_model::{AttributeValue, IndexHandle, KeyPair, QueryValue, Schema};
use serde_json::{Map, Value};
use tracing::debug;

use crate::builder::ConditionBuilder;
use crate::condition::{Condition, Predicate};
use crate::config::CompilerConfig;
use crate::error::{CompileError, ERROR_ROOT_KEY, QueryError};
use crate::index::{PredicateFields, partition, select_for_schema};
use crate::render::{ExpressionRenderer, RenderedExpression};
use crate::resolver::{FieldPath, resolve};
use crate::value::parse_value;

/// Result of an indexed compile.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexQuery {
    /// Table or secondary index to query.
    pub index: IndexHandle,
    /// Key pair of the selected index.
    pub key: KeyPair,
    /// Value of the hash key.
    pub hash_key: QueryValue,
    /// Condition on the range key, if any.
    pub range_key_condition: Option<Condition>,
    /// Remaining predicates, applied as a filter.
    pub filter_condition: Option<Condition>,
}

/// An [`IndexQuery`] rendered as DynamoDB `Query` parameters.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RenderedQuery {
    /// `IndexName`; `None` for the table.
    pub index_name: Option<String>,
    /// `KeyConditionExpression`.
    pub key_condition_expression: String,
    /// `FilterExpression`.
    pub filter_expression: Option<String>,
    /// `ExpressionAttributeNames`.
    pub names: HashMap<String, String>,
    /// `ExpressionAttributeValues`.
    pub values: HashMap<String, AttributeValue>,
}

impl IndexQuery {
    /// Renders the query with shared placeholder maps.
    #[must_use]
    pub fn render(&self) -> RenderedQuery {
        let mut renderer = ExpressionRenderer::default();
        let mut key_condition =
            renderer.equality(&FieldPath::parse(&self.key.hash), &self.hash_key);
        if let Some(range) = &self.range_key_condition {
            key_condition = format!("{key_condition} AND {}", renderer.condition(range));
        }
        let filter_expression = self
            .filter_condition
            .as_ref()
            .map(|filter| renderer.condition(filter));
        let RenderedExpression {
            expression,
            names,
            values,
        } = renderer.finish(key_condition);

        RenderedQuery {
            index_name: self.index.index_name().map(str::to_owned),
            key_condition_expression: expression,
            filter_expression,
            names,
            values,
        }
    }

    /// Whether `item` would be returned by this query.
    #[must_use]
    pub fn matches(&self, item: &HashMap<String, AttributeValue>) -> bool {
        let hash_matches = Condition::leaf(
            FieldPath::parse(&self.key.hash),
            Predicate::Equals(self.hash_key.clone()),
        )
        .matches(item);
        hash_matches
            && self.range_key_condition.as_ref().is_none_or(|c| c.matches(item))
            && self.filter_condition.as_ref().is_none_or(|c| c.matches(item))
    }
}

/// Compiles JSON queries against one schema.
#[derive(Debug, Clone)]
pub struct QueryCompiler<'s> {
    schema: &'s Schema,
    config: CompilerConfig,
}

impl<'s> QueryCompiler<'s> {
    /// Compiler with the default configuration.
    #[must_use]
    pub fn new(schema: &'s Schema) -> Self {
        Self::with_config(schema, CompilerConfig::default())
    }

    /// Compiler with an explicit configuration.
    #[must_use]
    pub fn with_config(schema: &'s Schema, config: CompilerConfig) -> Self {
        Self { schema, config }
    }

    /// The schema queries are compiled against.
    #[must_use]
    pub fn schema(&self) -> &'s Schema {
        self.schema
    }

    /// The active configuration.
    #[must_use]
    pub fn config(&self) -> &CompilerConfig {
        &self.config
    }

    /// Compiles a query into a scan filter; `Ok(None)` means "no filter".
    ///
    /// # Errors
    ///
    /// Returns every operator, field and value error found, or the depth error.
    pub fn compile_filter(
        &self,
        query: &Map<String, Value>,
    ) -> Result<Option<Condition>, CompileError> {
        ConditionBuilder::new(self.schema, &self.config).build(query)
    }

    /// Like [`QueryCompiler::compile_filter`] for a query given as any JSON
    /// value; a non-object query is a value error.
    ///
    /// # Errors
    ///
    /// See [`QueryCompiler::compile_filter`].
    pub fn compile_filter_value(&self, query: &Value) -> Result<Option<Condition>, CompileError> {
        self.compile_filter(as_object(query)?)
    }

    /// Compiles a query into an index selection with key and filter conditions.
    ///
    /// The whole query is validated first, so a query rejected by
    /// [`QueryCompiler::compile_filter`] is rejected here with the same errors.
    /// Fields that do not resolve (denylisted, or dropped in lenient mode)
    /// take no part in index selection.
    ///
    /// # Errors
    ///
    /// Returns every operator, field and value error in the query, or
    /// [`QueryError::IndexNotFound`] when no key pair matches or the selected
    /// key's hash field has no equality value.
    pub fn compile_index_query(
        &self,
        query: &Map<String, Value>,
    ) -> Result<IndexQuery, CompileError> {
        let builder = ConditionBuilder::new(self.schema, &self.config);
        builder.build(query)?;

        let mut fields = PredicateFields::from_query(query);
        fields.retain_available(self.schema);
        let equality = fields.equality_fields();

        let (index, key) = select_for_schema(self.schema, &equality, &fields.range)
            .ok_or(QueryError::IndexNotFound)?;
        debug!(index = %index, key = %key, "selected index");

        let raw_hash = fields
            .equality
            .get(key.hash.as_str())
            .ok_or(QueryError::IndexNotFound)?;
        let hash_attr = resolve(self.schema, &key.hash)?;
        let hash_key = parse_value(hash_attr.descriptor, &key.hash, raw_hash)?;
        if hash_key.is_null() {
            return Err(QueryError::value_type(&key.hash, raw_hash).into());
        }

        // The hash bucket was validated with the whole query; its equality
        // value is the hash key.
        let parts = partition(query, key);
        Ok(IndexQuery {
            index,
            key: key.clone(),
            hash_key,
            range_key_condition: builder.build(&parts.range)?,
            filter_condition: builder.build(&parts.filter)?,
        })
    }

    /// Like [`QueryCompiler::compile_index_query`] for any JSON value.
    ///
    /// # Errors
    ///
    /// See [`QueryCompiler::compile_index_query`].
    pub fn compile_index_query_value(&self, query: &Value) -> Result<IndexQuery, CompileError> {
        self.compile_index_query(as_object(query)?)
    }
}

fn as_object(query: &Value) -> Result<&Map<String, Value>, CompileError> {
    match query {
        Value::Object(map) => Ok(map),
        other => Err(QueryError::ValueType {
            field: ERROR_ROOT_KEY.to_owned(),
            message: format!("{other} is not a query object."),
        }
        .into()),
    }
}
