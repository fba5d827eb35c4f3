//! Compiler configuration.

use serde::{Deserialize, Serialize};
use typed_builder::TypedBuilder;

/// Default bound on `AND`/`OR` nesting.
pub const DEFAULT_MAX_QUERY_DEPTH: usize = 10;

/// Configuration for [`QueryCompiler`](crate::QueryCompiler).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TypedBuilder)]
#[serde(default)]
pub struct CompilerConfig {
    /// Deepest `AND`/`OR` nesting accepted; the top level is depth 0.
    #[builder(default = DEFAULT_MAX_QUERY_DEPTH)]
    pub max_query_depth: usize,
    /// Fail on unknown or denylisted fields instead of dropping them.
    #[builder(default = true)]
    pub raise_on_unavailable_field: bool,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            max_query_depth: DEFAULT_MAX_QUERY_DEPTH,
            raise_on_unavailable_field: true,
        }
    }
}

impl CompilerConfig {
    /// Create configuration from environment variables.
    ///
    /// | Variable | Default |
    /// |---|---|
    /// | `DYNAQUERY_MAX_QUERY_DEPTH` | `10` |
    /// | `DYNAQUERY_RAISE_ON_UNAVAILABLE_FIELD` | `true` |
    ///
    /// Unparsable values are ignored and the default is kept.
    #[must_use]
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(v) = std::env::var("DYNAQUERY_MAX_QUERY_DEPTH") {
            match v.trim().parse::<usize>() {
                Ok(n) => config.max_query_depth = n,
                Err(_) => tracing::warn!(
                    value = %v,
                    "ignoring invalid DYNAQUERY_MAX_QUERY_DEPTH"
                ),
            }
        }
        if let Ok(v) = std::env::var("DYNAQUERY_RAISE_ON_UNAVAILABLE_FIELD") {
            config.raise_on_unavailable_field = parse_bool(&v);
        }

        config
    }
}

/// Parse a string as a boolean, accepting `"1"` and `"true"` (case-insensitive).
fn parse_bool(value: &str) -> bool {
    let value = value.trim();
    value == "1" || value.eq_ignore_ascii_case("true")
}
