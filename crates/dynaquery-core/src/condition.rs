//! Condition trees.
//!
//! A [`Condition`] is either a predicate on one attribute path or an `AND`/`OR`
//! group of conditions. Groups are kept flat: a child never has the same
//! combinator as its parent, and a group always has at least two children.

use std::fmt;

use dynaquery_model::QueryValue;

use crate::resolver::FieldPath;

/// Logical combinator of a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Combinator {
    /// All children must hold.
    And,
    /// At least one child must hold.
    Or,
}

impl Combinator {
    /// Reserved query key introducing a group with this combinator.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::And => "AND",
            Self::Or => "OR",
        }
    }

    /// The other combinator.
    #[must_use]
    pub fn flip(self) -> Self {
        match self {
            Self::And => Self::Or,
            Self::Or => Self::And,
        }
    }
}

impl fmt::Display for Combinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ordering comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Comparison {
    /// `>`
    Gt,
    /// `<`
    Lt,
    /// `>=`
    Ge,
    /// `<=`
    Le,
}

impl Comparison {
    /// Expression symbol.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Gt => ">",
            Self::Lt => "<",
            Self::Ge => ">=",
            Self::Le => "<=",
        }
    }
}

/// What a leaf asserts about its attribute.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// Attribute equals the value.
    Equals(QueryValue),
    /// Attribute compares to the value.
    Compare(Comparison, QueryValue),
    /// String attribute starts with the value.
    BeginsWith(QueryValue),
    /// String contains the value as a substring, or a set/list holds it.
    Contains(QueryValue),
    /// Attribute is one of the listed values.
    In(QueryValue),
    /// Attribute is present.
    Exists,
}

/// A predicate on a single attribute path.
#[derive(Debug, Clone, PartialEq)]
pub struct Leaf {
    /// Attribute path the predicate applies to.
    pub path: FieldPath,
    /// The assertion.
    pub predicate: Predicate,
    /// Whether the assertion is negated.
    pub negated: bool,
}

/// A condition tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// Single predicate.
    Leaf(Leaf),
    /// Two or more children joined by a combinator.
    Group {
        /// How children are joined.
        combinator: Combinator,
        /// Child conditions.
        children: Vec<Condition>,
    },
}

impl Condition {
    /// Non-negated leaf.
    #[must_use]
    pub fn leaf(path: FieldPath, predicate: Predicate) -> Self {
        Self::Leaf(Leaf {
            path,
            predicate,
            negated: false,
        })
    }

    /// Joins `children` with `combinator`.
    ///
    /// Children with the same combinator are inlined. Returns `None` for no
    /// children and the child itself for exactly one.
    #[must_use]
    pub fn combine<I>(combinator: Combinator, children: I) -> Option<Self>
    where
        I: IntoIterator<Item = Condition>,
    {
        let mut flat = Vec::new();
        for child in children {
            match child {
                Self::Group {
                    combinator: inner,
                    children,
                } if inner == combinator => flat.extend(children),
                other => flat.push(other),
            }
        }

        match flat.len() {
            0 => None,
            1 => flat.pop(),
            _ => Some(Self::Group {
                combinator,
                children: flat,
            }),
        }
    }

    /// `AND` of `children`; see [`Condition::combine`].
    #[must_use]
    pub fn all<I>(children: I) -> Option<Self>
    where
        I: IntoIterator<Item = Condition>,
    {
        Self::combine(Combinator::And, children)
    }

    /// `OR` of `children`; see [`Condition::combine`].
    #[must_use]
    pub fn any<I>(children: I) -> Option<Self>
    where
        I: IntoIterator<Item = Condition>,
    {
        Self::combine(Combinator::Or, children)
    }

    /// Logical negation. Leaves toggle their flag; groups are pushed down
    /// with De Morgan's laws so negation only ever sits on leaves.
    #[must_use]
    pub fn negate(self) -> Self {
        match self {
            Self::Leaf(mut leaf) => {
                leaf.negated = !leaf.negated;
                Self::Leaf(leaf)
            }
            Self::Group {
                combinator,
                children,
            } => Self::Group {
                combinator: combinator.flip(),
                children: children.into_iter().map(Self::negate).collect(),
            },
        }
    }

    /// Visits every leaf, depth first.
    pub fn for_each_leaf<'a>(&'a self, f: &mut impl FnMut(&'a Leaf)) {
        match self {
            Self::Leaf(leaf) => f(leaf),
            Self::Group { children, .. } => {
                for child in children {
                    child.for_each_leaf(f);
                }
            }
        }
    }

    /// Number of leaves.
    #[must_use]
    pub fn leaf_count(&self) -> usize {
        let mut count = 0;
        self.for_each_leaf(&mut |_| count += 1);
        count
    }
}

impl fmt::Display for Leaf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let path = &self.path;
        let body = match &self.predicate {
            Predicate::Exists if self.negated => return write!(f, "attribute_not_exists({path})"),
            Predicate::Exists => format!("attribute_exists({path})"),
            Predicate::Equals(v) => format!("{path} = {v}"),
            Predicate::Compare(cmp, v) => format!("{path} {} {v}", cmp.as_str()),
            Predicate::BeginsWith(v) => format!("begins_with({path}, {v})"),
            Predicate::Contains(v) => format!("contains({path}, {v})"),
            Predicate::In(v) => format!("{path} IN ({v})"),
        };
        if self.negated {
            write!(f, "(NOT {body})")
        } else {
            f.write_str(&body)
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Leaf(leaf) => write!(f, "{leaf}"),
            Self::Group {
                combinator,
                children,
            } => {
                f.write_str("(")?;
                for (i, child) in children.iter().enumerate() {
                    if i > 0 {
                        write!(f, " {combinator} ")?;
                    }
                    write!(f, "{child}")?;
                }
                f.write_str(")")
            }
        }
    }
}
