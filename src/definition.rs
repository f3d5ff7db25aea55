//! Service definitions: the nodes of the service graph.

use indexmap::IndexMap;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::statement::{Literal, Statement};
use crate::types::TypeName;

/// Whether, and for which requests, a definition is an autowiring candidate.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Autowired {
    /// Candidate for its type and every ancestor
    #[default]
    Enabled,
    /// Never chosen by autowiring; reachable by name only
    Disabled,
    /// Candidate only for requests of these types or their subtypes
    Narrowed(Vec<TypeName>),
}

impl Autowired {
    pub fn is_disabled(&self) -> bool {
        matches!(self, Autowired::Disabled)
    }
}

/// A named node in the service graph.
///
/// Built by configuration loaders or extensions and stored in a
/// [`DefinitionStore`](crate::DefinitionStore). Every builder method takes and
/// returns `self`, so a definition reads as one expression.
///
/// # Examples
///
/// ```rust
/// use ferrous_wire::{Autowired, ServiceDefinition, Statement};
///
/// let main_db = ServiceDefinition::new()
///     .with_type("PDO")
///     .with_factory(Statement::new("PDO").arg("sqlite::memory:"))
///     .preferred_for("PDO")
///     .with_tag("db", None);
///
/// let temp_db = ServiceDefinition::of_type("PDO").with_autowired(Autowired::Disabled);
///
/// assert_eq!(main_db.preferred_for.len(), 1);
/// assert!(temp_db.autowired.is_disabled());
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ServiceDefinition {
    /// Declared type; `None` means infer it from the factory
    pub ty: Option<TypeName>,
    /// Construction statement; `None` means `new <ty>()`
    pub factory: Option<Statement>,
    /// Calls executed on the new instance, in order
    pub setup: Vec<Statement>,
    pub autowired: Autowired,
    /// Types for which this definition wins ties
    pub preferred_for: Vec<TypeName>,
    pub tags: IndexMap<String, Option<Literal>>,
    pub lazy: bool,
    /// Supplied at runtime from outside; never constructed
    pub imported: bool,
}

impl ServiceDefinition {
    pub fn new() -> Self {
        Self::default()
    }

    /// Definition with a declared type and the implied `new <ty>()` factory.
    pub fn of_type(ty: impl Into<TypeName>) -> Self {
        Self::new().with_type(ty)
    }

    /// Definition built by the given factory; the type is inferred.
    pub fn from_factory(factory: Statement) -> Self {
        Self::new().with_factory(factory)
    }

    /// Externally supplied service of the given type.
    pub fn imported(ty: impl Into<TypeName>) -> Self {
        Self {
            ty: Some(ty.into()),
            imported: true,
            ..Self::default()
        }
    }

    pub fn with_type(mut self, ty: impl Into<TypeName>) -> Self {
        self.ty = Some(ty.into());
        self
    }

    pub fn with_factory(mut self, factory: Statement) -> Self {
        self.factory = Some(factory);
        self
    }

    pub fn with_setup(mut self, statement: Statement) -> Self {
        self.setup.push(statement);
        self
    }

    pub fn with_autowired(mut self, autowired: Autowired) -> Self {
        self.autowired = autowired;
        self
    }

    /// Narrows autowiring to the given types.
    pub fn autowired_as<I, T>(self, types: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<TypeName>,
    {
        self.with_autowired(Autowired::Narrowed(types.into_iter().map(Into::into).collect()))
    }

    pub fn preferred_for(mut self, ty: impl Into<TypeName>) -> Self {
        self.preferred_for.push(ty.into());
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>, value: Option<Literal>) -> Self {
        self.tags.insert(tag.into(), value);
        self
    }

    pub fn lazy(mut self, lazy: bool) -> Self {
        self.lazy = lazy;
        self
    }

    /// Adds a setup statement in place; used by extensions.
    pub fn add_setup(&mut self, statement: Statement) -> &mut Self {
        self.setup.push(statement);
        self
    }

    /// Adds or replaces a tag in place; used by extensions.
    pub fn add_tag(&mut self, tag: impl Into<String>, value: Option<Literal>) -> &mut Self {
        self.tags.insert(tag.into(), value);
        self
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.contains_key(tag)
    }

    pub fn is_preferred_for(&self, ty: &TypeName) -> bool {
        self.preferred_for.iter().any(|p| p == ty)
    }

    /// Type known without resolution: the declared type, or the class a
    /// `new` factory instantiates.
    pub fn known_type(&self) -> Option<&TypeName> {
        self.ty.as_ref().or_else(|| match self.factory.as_ref().map(|f| &f.entity) {
            Some(crate::statement::Entity::New(class)) => Some(class),
            _ => None,
        })
    }
}
