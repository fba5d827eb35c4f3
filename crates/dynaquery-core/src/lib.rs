//! Compiles JSON query objects into DynamoDB condition trees and index
//! selections.
//!
//! The pipeline is:
//!
//! 1. **Resolution**: each `field__operator` key is split, its operator looked
//!    up and its dotted field path resolved against the [`Schema`].
//! 2. **Coercion**: the raw value is coerced to the declared attribute type.
//! 3. **Building**: leaves and nested `AND`/`OR` groups become a [`Condition`].
//! 4. **Index selection** (optional): a key pair is chosen for the query and
//!    the query is split into hash value, key condition and filter.
//!
//! [`Schema`]: dynaquery_model::Schema
#![allow(clippy::doc_markdown, clippy::module_name_repetitions)]

pub mod builder;
pub mod compiler;
pub mod condition;
pub mod config;
pub mod error;
pub mod evaluator;
pub mod index;
pub mod operator;
pub mod render;
pub mod resolver;
pub mod value;

pub use builder::ConditionBuilder;
pub use compiler::{IndexQuery, QueryCompiler, RenderedQuery};
pub use condition::{Combinator, Comparison, Condition, Leaf, Predicate};
pub use config::CompilerConfig;
pub use error::{CompileError, QueryError, QueryErrorCode};
pub use evaluator::EvalContext;
pub use operator::Operator;
pub use render::{RenderedExpression, render};
pub use resolver::{FieldPath, ResolvedAttribute, resolve};
pub use value::{TIMESTAMP_FORMATS, parse_value};
