//! Model types for the dynaquery compiler.
//!
//! This crate holds the data the compiler consumes and produces but none of
//! its logic: schema descriptors supplied by the record layer, DynamoDB key
//! schemas, the `AttributeValue` wire type, and coerced query values.
// "DynamoDB" appears in virtually every doc comment in this crate.
#![allow(clippy::doc_markdown)]
#![allow(clippy::module_name_repetitions)]

pub mod attribute_value;
pub mod descriptor;
pub mod keys;
pub mod schema;
pub mod value;

pub use attribute_value::AttributeValue;
pub use descriptor::{AttributeDescriptor, EnumMember, EnumValue};
pub use keys::{IndexHandle, IndexKind, KeyPair, KeySchemaElement, KeyType, SecondaryIndex};
pub use schema::{Schema, SchemaBuilder, SchemaError};
pub use value::{QueryValue, TIMESTAMP_FORMAT, format_timestamp};
