//! In-memory evaluation of condition trees against stored items.
//!
//! Follows DynamoDB semantics: a predicate on a missing attribute is false
//! (except `attribute_not_exists`), and values of different types never
//! compare.

use std::cmp::Ordering;
use std::collections::HashMap;

use dynaquery_model::AttributeValue;

use crate::condition::{Combinator, Comparison, Condition, Leaf, Predicate};
use crate::resolver::FieldPath;

/// Binds an item for evaluation.
#[derive(Debug, Clone, Copy)]
pub struct EvalContext<'a> {
    /// The item being evaluated.
    pub item: &'a HashMap<String, AttributeValue>,
}

impl<'a> EvalContext<'a> {
    /// Creates a context for `item`.
    #[must_use]
    pub fn new(item: &'a HashMap<String, AttributeValue>) -> Self {
        Self { item }
    }

    /// Evaluates `condition` against the item.
    #[must_use]
    pub fn evaluate(&self, condition: &Condition) -> bool {
        match condition {
            Condition::Leaf(leaf) => self.eval_leaf(leaf),
            Condition::Group {
                combinator: Combinator::And,
                children,
            } => children.iter().all(|c| self.evaluate(c)),
            Condition::Group {
                combinator: Combinator::Or,
                children,
            } => children.iter().any(|c| self.evaluate(c)),
        }
    }

    fn eval_leaf(&self, leaf: &Leaf) -> bool {
        let attr = self.resolve_path(&leaf.path);
        let holds = match (&leaf.predicate, attr) {
            (Predicate::Exists, attr) => attr.is_some(),
            (_, None) => false,
            (Predicate::Equals(v) | Predicate::In(v), Some(attr)) => {
                values_equal(attr, &v.to_attribute_value())
            }
            (Predicate::Compare(cmp, v), Some(attr)) => {
                compare_values(attr, &v.to_attribute_value()).is_some_and(|ord| match cmp {
                    Comparison::Gt => ord == Ordering::Greater,
                    Comparison::Lt => ord == Ordering::Less,
                    Comparison::Ge => ord != Ordering::Less,
                    Comparison::Le => ord != Ordering::Greater,
                })
            }
            (Predicate::BeginsWith(v), Some(attr)) => {
                match (attr, &v.to_attribute_value()) {
                    (AttributeValue::S(s), AttributeValue::S(prefix)) => s.starts_with(prefix.as_str()),
                    _ => false,
                }
            }
            (Predicate::Contains(v), Some(attr)) => contains(attr, &v.to_attribute_value()),
        };
        holds != leaf.negated
    }

    /// Resolves a dotted path through nested maps.
    #[must_use]
    pub fn resolve_path(&self, path: &FieldPath) -> Option<&'a AttributeValue> {
        let (first, rest) = path.segments().split_first()?;
        let mut current = self.item.get(first)?;
        for segment in rest {
            current = current.as_m()?.get(segment)?;
        }
        Some(current)
    }
}

impl Condition {
    /// Whether `item` satisfies this condition.
    #[must_use]
    pub fn matches(&self, item: &HashMap<String, AttributeValue>) -> bool {
        EvalContext::new(item).evaluate(self)
    }
}

/// Orders two scalars of the same type; `None` when they do not compare.
fn compare_values(left: &AttributeValue, right: &AttributeValue) -> Option<Ordering> {
    match (left, right) {
        (AttributeValue::S(a), AttributeValue::S(b)) => Some(a.cmp(b)),
        // Integers compare exactly; anything else falls back to f64.
        (AttributeValue::N(a), AttributeValue::N(b)) => {
            match (a.parse::<i128>(), b.parse::<i128>()) {
                (Ok(ia), Ok(ib)) => Some(ia.cmp(&ib)),
                _ => {
                    let fa = a.parse::<f64>().ok()?;
                    let fb = b.parse::<f64>().ok()?;
                    fa.partial_cmp(&fb)
                }
            }
        }
        _ => None,
    }
}

fn values_equal(left: &AttributeValue, right: &AttributeValue) -> bool {
    match (left, right) {
        (AttributeValue::N(_), AttributeValue::N(_)) => {
            compare_values(left, right) == Some(Ordering::Equal)
        }
        (AttributeValue::Ss(a), AttributeValue::Ss(b)) | (AttributeValue::Ns(a), AttributeValue::Ns(b)) => {
            a.len() == b.len() && a.iter().all(|x| b.contains(x))
        }
        // A list query value matches a stored set with the same members.
        (AttributeValue::Ss(set), AttributeValue::L(items)) => {
            set.len() == items.len()
                && items
                    .iter()
                    .all(|item| item.as_s().is_some_and(|s| set.iter().any(|m| m == s)))
        }
        (AttributeValue::L(a), AttributeValue::L(b)) => {
            a.len() == b.len() && a.iter().zip(b).all(|(x, y)| values_equal(x, y))
        }
        (AttributeValue::M(a), AttributeValue::M(b)) => {
            a.len() == b.len()
                && a.iter()
                    .all(|(k, x)| b.get(k).is_some_and(|y| values_equal(x, y)))
        }
        _ => left == right,
    }
}

fn contains(attr: &AttributeValue, search: &AttributeValue) -> bool {
    match (attr, search) {
        (AttributeValue::S(s), AttributeValue::S(sub)) => s.contains(sub.as_str()),
        (AttributeValue::Ss(set), AttributeValue::S(val)) => set.contains(val),
        (AttributeValue::Ns(set), AttributeValue::N(_)) => set
            .iter()
            .any(|n| values_equal(&AttributeValue::N(n.clone()), search)),
        (AttributeValue::L(list), _) => list.iter().any(|item| values_equal(item, search)),
        _ => false,
    }
}
