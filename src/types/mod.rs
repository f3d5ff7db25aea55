//! Type metadata consulted during resolution.
//!
//! The resolver never inspects real types. Everything it knows about classes,
//! interfaces, constructors and functions comes through a [`TypeCatalog`],
//! which the embedding tool fills from whatever type system it compiles for.

use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

pub mod catalog;
pub mod signature;

pub use catalog::{TypeCatalog, TypeRegistry};
pub use signature::{ClassInfo, ClassKind, Method, ParamType, Parameter, ScalarKind, Signature};

/// Name of a class or interface as known to the catalog.
///
/// # Examples
///
/// ```rust
/// use ferrous_wire::TypeName;
///
/// let pdo = TypeName::from("PDO");
/// assert_eq!(pdo.as_str(), "PDO");
/// assert_eq!(pdo.to_string(), "PDO");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(transparent))]
pub struct TypeName(String);

impl TypeName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TypeName {
    fn from(name: &str) -> Self {
        Self(name.to_string())
    }
}

impl From<String> for TypeName {
    fn from(name: String) -> Self {
        Self(name)
    }
}

impl From<&TypeName> for TypeName {
    fn from(name: &TypeName) -> Self {
        name.clone()
    }
}

impl AsRef<str> for TypeName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
