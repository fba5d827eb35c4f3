//! Index selection and query partitioning.
//!
//! Every candidate key pair (the table key first, then secondary indexes in
//! declaration order) is scored against the query's equality and range
//! fields. The highest score wins; on ties the earlier candidate is kept.

use std::collections::{BTreeMap, BTreeSet};

use dynaquery_model::{IndexHandle, KeyPair, Schema};
use serde_json::{Map, Value};
use tracing::debug;

use crate::condition::Combinator;
use crate::operator::{Operator, parse_operator, split_key};
use crate::resolver::{FieldPath, resolve};

/// Field paths of a query, split by predicate kind.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PredicateFields<'q> {
    /// Fields compared with `equals` (or no operator), with their raw values.
    pub equality: BTreeMap<&'q str, &'q Value>,
    /// Fields with any other operator.
    pub range: BTreeSet<&'q str>,
}

impl<'q> PredicateFields<'q> {
    /// Classifies the top-level keys of `query`. `AND`/`OR` groups are skipped;
    /// keys with unknown operators count as range fields and fail later when
    /// the condition is built.
    #[must_use]
    pub fn from_query(query: &'q Map<String, Value>) -> Self {
        let mut fields = Self::default();
        for (key, value) in query {
            if is_group_key(key) {
                continue;
            }
            let (field, token) = split_key(key);
            match parse_operator(field, token) {
                Ok((Operator::Equals, false)) => {
                    fields.equality.insert(field, value);
                }
                _ => {
                    fields.range.insert(field);
                }
            }
        }
        fields
    }

    /// Drops fields that do not resolve against `schema`, such as denylisted
    /// paths, so they cannot drive index selection.
    pub fn retain_available(&mut self, schema: &Schema) {
        self.equality.retain(|field, _| resolve(schema, field).is_ok());
        self.range.retain(|field| resolve(schema, field).is_ok());
    }

    /// Equality field names.
    #[must_use]
    pub fn equality_fields(&self) -> BTreeSet<&'q str> {
        self.equality.keys().copied().collect()
    }
}

/// Scores a key pair against the query's equality and range fields.
///
/// The score is the larger of the number of key fields matched by equality
/// and `[hash in equality] + [range in range fields]`.
#[must_use]
pub fn score(key: &KeyPair, equality: &BTreeSet<&str>, range: &BTreeSet<&str>) -> usize {
    let by_equality = key.fields().filter(|f| equality.contains(f)).count();
    let hash_hit = usize::from(equality.contains(key.hash.as_str()));
    let range_hit = usize::from(
        key.range
            .as_deref()
            .is_some_and(|field| range.contains(field)),
    );
    by_equality.max(hash_hit + range_hit)
}

/// Picks the best-scoring key pair among `candidates`, which must list the
/// table key first; `None` when nothing scores above zero.
#[must_use]
pub fn select<'k>(
    candidates: &[(IndexHandle, &'k KeyPair)],
    equality: &BTreeSet<&str>,
    range: &BTreeSet<&str>,
) -> Option<(IndexHandle, &'k KeyPair)> {
    let mut best: Option<(&IndexHandle, &'k KeyPair, usize)> = None;
    for (handle, key) in candidates {
        let s = score(key, equality, range);
        debug!(index = %handle, key = %key, score = s, "scored index candidate");
        if s > best.map_or(0, |(_, _, top)| top) {
            best = Some((handle, *key, s));
        }
    }
    best.map(|(handle, key, _)| (handle.clone(), key))
}

/// Convenience over [`select`] using [`Schema::index_map`] as candidates.
#[must_use]
pub fn select_for_schema<'s>(
    schema: &'s Schema,
    equality: &BTreeSet<&str>,
    range: &BTreeSet<&str>,
) -> Option<(IndexHandle, &'s KeyPair)> {
    select(&schema.index_map(), equality, range)
}

/// A query split along the chosen key pair.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryPartition {
    /// Keys on the range field; they form the key condition.
    pub range: Map<String, Value>,
    /// Keys on the hash field; their value is taken separately.
    pub hash: Map<String, Value>,
    /// Everything else, including `AND`/`OR` groups; they form the filter.
    pub filter: Map<String, Value>,
}

/// Splits `query` into range, hash and filter buckets for `key`.
#[must_use]
pub fn partition(query: &Map<String, Value>, key: &KeyPair) -> QueryPartition {
    let mut out = QueryPartition::default();
    for (k, v) in query {
        let bucket = if is_group_key(k) {
            &mut out.filter
        } else {
            let path = FieldPath::parse(split_key(k).0);
            if key
                .range
                .as_deref()
                .is_some_and(|range| path.starts_with_field(range))
            {
                &mut out.range
            } else if path.starts_with_field(&key.hash) {
                &mut out.hash
            } else {
                &mut out.filter
            }
        };
        bucket.insert(k.clone(), v.clone());
    }
    if out.hash.len() > 1 {
        debug!(keys = ?out.hash.keys().collect::<Vec<_>>(), "extra hash key predicates not applied");
    }
    out
}

fn is_group_key(key: &str) -> bool {
    key == Combinator::And.as_str() || key == Combinator::Or.as_str()
}
