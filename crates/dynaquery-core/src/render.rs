//! Rendering condition trees as DynamoDB expressions.
//!
//! Path segments are replaced by `#nN` name placeholders and values by `:vN`
//! value placeholders, so the output can be handed to a `Query` or `Scan`
//! call together with its `ExpressionAttributeNames` and
//! `ExpressionAttributeValues` maps.

use std::collections::HashMap;

use dynaquery_model::{AttributeValue, QueryValue};

use crate::condition::{Condition, Leaf, Predicate};
use crate::resolver::FieldPath;

/// An expression string with its placeholder maps.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RenderedExpression {
    /// Expression text.
    pub expression: String,
    /// `#nN` -> attribute name.
    pub names: HashMap<String, String>,
    /// `:vN` -> value.
    pub values: HashMap<String, AttributeValue>,
}

/// Renders a single condition.
#[must_use]
pub fn render(condition: &Condition) -> RenderedExpression {
    let mut renderer = ExpressionRenderer::default();
    let expression = renderer.condition(condition);
    renderer.finish(expression)
}

/// Accumulates placeholders across several expressions that share one set of
/// name and value maps (key condition plus filter).
#[derive(Debug, Default)]
pub struct ExpressionRenderer {
    names: HashMap<String, String>,
    placeholders: HashMap<String, String>,
    values: HashMap<String, AttributeValue>,
}

impl ExpressionRenderer {
    /// Renders `condition`, registering its names and values.
    pub fn condition(&mut self, condition: &Condition) -> String {
        match condition {
            Condition::Leaf(leaf) => self.leaf(leaf),
            Condition::Group {
                combinator,
                children,
            } => {
                let parts: Vec<String> = children.iter().map(|c| self.condition(c)).collect();
                format!("({})", parts.join(&format!(" {combinator} ")))
            }
        }
    }

    /// Renders `path = value`.
    pub fn equality(&mut self, path: &FieldPath, value: &QueryValue) -> String {
        let name = self.path(path);
        let value = self.value(value);
        format!("{name} = {value}")
    }

    /// Consumes the renderer, pairing `expression` with the collected maps.
    #[must_use]
    pub fn finish(self, expression: String) -> RenderedExpression {
        RenderedExpression {
            expression,
            names: self.names,
            values: self.values,
        }
    }

    fn leaf(&mut self, leaf: &Leaf) -> String {
        let path = self.path(&leaf.path);
        let body = match &leaf.predicate {
            Predicate::Exists if leaf.negated => return format!("attribute_not_exists({path})"),
            Predicate::Exists => format!("attribute_exists({path})"),
            Predicate::Equals(v) => format!("{path} = {}", self.value(v)),
            Predicate::Compare(cmp, v) => format!("{path} {} {}", cmp.as_str(), self.value(v)),
            Predicate::BeginsWith(v) => format!("begins_with({path}, {})", self.value(v)),
            Predicate::Contains(v) => format!("contains({path}, {})", self.value(v)),
            Predicate::In(v) => format!("{path} IN ({})", self.value(v)),
        };
        if leaf.negated {
            format!("(NOT {body})")
        } else {
            body
        }
    }

    fn path(&mut self, path: &FieldPath) -> String {
        path.segments()
            .iter()
            .map(|segment| self.name(segment))
            .collect::<Vec<_>>()
            .join(".")
    }

    fn name(&mut self, segment: &str) -> String {
        if let Some(placeholder) = self.placeholders.get(segment) {
            return placeholder.clone();
        }
        let placeholder = format!("#n{}", self.placeholders.len());
        self.placeholders
            .insert(segment.to_owned(), placeholder.clone());
        self.names.insert(placeholder.clone(), segment.to_owned());
        placeholder
    }

    fn value(&mut self, value: &QueryValue) -> String {
        let placeholder = format!(":v{}", self.values.len());
        self.values
            .insert(placeholder.clone(), value.to_attribute_value());
        placeholder
    }
}
