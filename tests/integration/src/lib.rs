//! End-to-end tests for the dynaquery compiler.
//!
//! The fixtures model a blog post record: `name`/`sub_name` primary key, an
//! enumerated `category`, a `created_at` timestamp, free-form `tags` and a
//! fixed `author` document, with a global index on `(category, created_at)`.

use std::collections::HashMap;
use std::sync::Once;

use dynaquery_core::{CompileError, CompilerConfig, Condition, IndexQuery, QueryCompiler};
use dynaquery_model::{AttributeDescriptor, AttributeValue, KeyPair, Schema};
use serde_json::{Map, Value};

static INIT: Once = Once::new();

/// Initialize tracing (once).
fn init_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
            )
            .with_test_writer()
            .init();
    });
}

/// Schema of the post record.
#[must_use]
pub fn post_schema() -> Schema {
    init_tracing();

    Schema::builder(KeyPair::hash_range("name", "sub_name"))
        .attribute("name", AttributeDescriptor::String)
        .attribute("sub_name", AttributeDescriptor::String)
        .attribute(
            "category",
            AttributeDescriptor::enumeration(["finance", "politics"]),
        )
        .attribute("created_at", AttributeDescriptor::Timestamp)
        .attribute("views", AttributeDescriptor::Number)
        .attribute("published", AttributeDescriptor::Boolean)
        .attribute("labels", AttributeDescriptor::StringSet)
        .attribute("tags", AttributeDescriptor::open_document())
        .attribute(
            "author",
            AttributeDescriptor::document([
                ("email", AttributeDescriptor::String),
                ("karma", AttributeDescriptor::Number),
            ]),
        )
        .global_index(
            "category-created_at",
            KeyPair::hash_range("category", "created_at"),
        )
        .deny("author.email")
        .build()
        .unwrap_or_else(|e| panic!("invalid post schema: {e}"))
}

/// Unwraps a JSON object.
#[must_use]
pub fn query(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        other => panic!("query must be an object, got {other}"),
    }
}

/// Compiles `value` as a scan filter with the default configuration.
pub fn compile_filter(schema: &Schema, value: Value) -> Result<Option<Condition>, CompileError> {
    QueryCompiler::new(schema).compile_filter(&query(value))
}

/// Compiles `value` as a scan filter with `config`.
pub fn compile_filter_with(
    schema: &Schema,
    config: CompilerConfig,
    value: Value,
) -> Result<Option<Condition>, CompileError> {
    QueryCompiler::with_config(schema, config).compile_filter(&query(value))
}

/// Compiles `value` as an indexed query.
pub fn compile_index(schema: &Schema, value: Value) -> Result<IndexQuery, CompileError> {
    QueryCompiler::new(schema).compile_index_query(&query(value))
}

/// Compiles `value` as an indexed query with `config`.
pub fn compile_index_with(
    schema: &Schema,
    config: CompilerConfig,
    value: Value,
) -> Result<IndexQuery, CompileError> {
    QueryCompiler::with_config(schema, config).compile_index_query(&query(value))
}

/// Builds a stored item from its JSON form.
#[must_use]
pub fn item(value: &Value) -> HashMap<String, AttributeValue> {
    match AttributeValue::from_json(value) {
        AttributeValue::M(map) => map,
        other => panic!("item must be a map, got {other}"),
    }
}

/// A small corpus of stored posts.
#[must_use]
pub fn sample_items() -> Vec<HashMap<String, AttributeValue>> {
    use serde_json::json;

    [
        json!({
            "name": "markets", "sub_name": "2019-01", "category": 1,
            "created_at": "2019-01-01T00:00:00.000000+00:00", "views": 10,
            "tags": {"type": "news", "topics": ["NYSE", "NASDAQ"]},
        }),
        json!({
            "name": "markets", "sub_name": "2019-02", "category": 1,
            "created_at": "2019-02-01T00:00:00.000000+00:00", "views": 250,
            "tags": {"type": "opinion", "topics": ["NYSE"]},
        }),
        json!({
            "name": "elections", "sub_name": "2020-11", "category": 2,
            "created_at": "2020-11-03T12:00:00.000000+00:00", "views": 5000,
            "tags": {"type": "news"},
        }),
        json!({
            "name": "draft", "sub_name": "0", "views": 0,
        }),
    ]
    .iter()
    .map(item)
    .collect()
}

/// Names (`name/sub_name`) of the sample items matching `condition`.
#[must_use]
pub fn matching(condition: &Condition) -> Vec<String> {
    sample_items()
        .iter()
        .filter(|item| condition.matches(item))
        .map(|item| {
            format!(
                "{}/{}",
                item["name"].as_s().unwrap_or_default(),
                item["sub_name"].as_s().unwrap_or_default()
            )
        })
        .collect()
}

mod test_equivalence;
mod test_errors;
mod test_filter;
mod test_index;
