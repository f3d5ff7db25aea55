//! Assembly settings and the parameter bag.
//!
//! Both can be read from environment variables, with values parsed as
//! integer, float, boolean or string in that order.

use std::env;

use indexmap::IndexMap;
#[cfg(feature = "config")]
use serde::{Deserialize, Serialize};

use crate::error::{WireError, WireResult};
use crate::statement::Literal;

/// Settings for [`PlanAssembler`](crate::PlanAssembler).
///
/// # Examples
///
/// ```rust
/// use ferrous_wire::AssemblerConfig;
///
/// let config = AssemblerConfig::default().with_fail_fast(true);
/// assert_eq!(config.max_depth, None);
/// assert!(config.lazy);
/// assert!(config.fail_fast);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "config", derive(Serialize, Deserialize), serde(default))]
pub struct AssemblerConfig {
    /// Optional bound on combined service and statement nesting. Unset by
    /// default: cycles are caught by the resolution stack and statement
    /// trees are finite.
    pub max_depth: Option<usize>,
    /// When `false`, every plan is built eagerly regardless of its definition
    pub lazy: bool,
    /// Stop at the first failed definition instead of collecting all errors
    pub fail_fast: bool,
}

impl Default for AssemblerConfig {
    fn default() -> Self {
        Self {
            max_depth: None,
            lazy: true,
            fail_fast: false,
        }
    }
}

impl AssemblerConfig {
    pub const ENV_MAX_DEPTH: &'static str = "FERROUS_WIRE_MAX_DEPTH";
    pub const ENV_LAZY: &'static str = "FERROUS_WIRE_LAZY";
    pub const ENV_FAIL_FAST: &'static str = "FERROUS_WIRE_FAIL_FAST";

    /// Defaults overridden by any `FERROUS_WIRE_*` variables that are set.
    /// Unparseable values are ignored.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(Literal::Int(depth)) = env_literal(Self::ENV_MAX_DEPTH) {
            if depth > 0 {
                config.max_depth = Some(depth as usize);
            }
        }
        if let Some(Literal::Bool(lazy)) = env_literal(Self::ENV_LAZY) {
            config.lazy = lazy;
        }
        if let Some(Literal::Bool(fail_fast)) = env_literal(Self::ENV_FAIL_FAST) {
            config.fail_fast = fail_fast;
        }
        config
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = Some(max_depth);
        self
    }

    pub fn with_lazy(mut self, lazy: bool) -> Self {
        self.lazy = lazy;
        self
    }

    pub fn with_fail_fast(mut self, fail_fast: bool) -> Self {
        self.fail_fast = fail_fast;
        self
    }
}

fn parse_literal(value: String) -> Literal {
    if let Ok(int) = value.parse::<i64>() {
        Literal::Int(int)
    } else if let Ok(float) = value.parse::<f64>() {
        Literal::Float(float)
    } else if let Ok(boolean) = value.parse::<bool>() {
        Literal::Bool(boolean)
    } else {
        Literal::String(value)
    }
}

fn env_literal(key: &str) -> Option<Literal> {
    env::var(key).ok().map(parse_literal)
}

/// Values substituted for `%name%` placeholders.
///
/// # Examples
///
/// ```rust
/// use ferrous_wire::{Literal, Parameters};
///
/// let params = Parameters::new().with("table", "articles").with("debug", true);
/// assert_eq!(params.get("table").unwrap(), &Literal::from("articles"));
/// assert!(params.get("missing").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "config", derive(Serialize, Deserialize), serde(transparent))]
pub struct Parameters {
    values: IndexMap<String, Literal>,
}

impl Parameters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads every `PREFIX_*` environment variable as a parameter named by
    /// the lowercased remainder (`APP_DB_HOST` -> `db_host`).
    pub fn from_env(prefix: &str) -> Self {
        let prefix = format!("{}_", prefix.to_uppercase());
        let values = env::vars()
            .filter_map(|(key, value)| {
                key.strip_prefix(&prefix)
                    .map(|rest| (rest.to_lowercase(), parse_literal(value)))
            })
            .collect();
        Self { values }
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Literal>) -> &mut Self {
        self.values.insert(name.into(), value.into());
        self
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<Literal>) -> Self {
        self.insert(name, value);
        self
    }

    /// Looks up a parameter, failing with [`WireError::MissingParameter`].
    pub fn get(&self, name: &str) -> WireResult<&Literal> {
        self.values
            .get(name)
            .ok_or_else(|| WireError::MissingParameter(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// Merges `other` over `self`; later values win.
    pub fn extend(&mut self, other: Parameters) {
        self.values.extend(other.values);
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Literal)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }
}
