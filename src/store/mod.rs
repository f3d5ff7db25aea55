//! The definition store: single source of truth for which services exist.
//!
//! The store has two phases. While *building*, configuration loaders and
//! extensions add, modify and remove definitions. [`DefinitionStore::freeze`]
//! moves it to *frozen*, after which every mutating operation fails with
//! [`WireError::Frozen`] and plan assembly may read it.

pub mod extension;
pub use extension::{Extension, ExtensionContext};

use crate::definition::ServiceDefinition;
use crate::error::{WireError, WireResult};
use crate::internal::Map;
use crate::resolver::typing::infer_types;
use crate::statement::Literal;
use crate::types::{TypeCatalog, TypeName};

/// Lifecycle phase of a [`DefinitionStore`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    /// Definitions may be added, changed and removed
    #[default]
    Building,
    /// Read-only; assembly may begin
    Frozen,
}

/// Ordered collection of service definitions keyed by unique name.
///
/// Iteration follows insertion order, which makes autowiring candidate lists
/// and assembly output deterministic.
///
/// # Examples
///
/// ```rust
/// use ferrous_wire::{DefinitionStore, ServiceDefinition, WireError};
///
/// let mut store = DefinitionStore::new();
/// store.add("mainDb", ServiceDefinition::of_type("PDO")).unwrap();
///
/// assert!(matches!(
///     store.add("mainDb", ServiceDefinition::of_type("PDO")),
///     Err(WireError::DuplicateName(_))
/// ));
///
/// store.freeze();
/// assert!(matches!(store.remove("mainDb"), Err(WireError::Frozen { .. })));
/// assert!(store.get("mainDb").is_ok());
/// ```
#[derive(Debug, Default, Clone)]
pub struct DefinitionStore {
    definitions: Map<String, ServiceDefinition>,
    phase: Phase,
    anonymous_counter: usize,
}

impl DefinitionStore {
    /// Creates an empty store in the building phase.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_frozen(&self) -> bool {
        self.phase == Phase::Frozen
    }

    /// Ends the building phase. Calling it again is a no-op.
    pub fn freeze(&mut self) {
        if self.phase != Phase::Frozen {
            tracing::debug!(definitions = self.definitions.len(), "definition store frozen");
        }
        self.phase = Phase::Frozen;
    }

    fn ensure_building(&self, operation: &'static str, service: &str) -> WireResult<()> {
        match self.phase {
            Phase::Building => Ok(()),
            Phase::Frozen => Err(WireError::Frozen {
                operation,
                service: service.to_string(),
            }),
        }
    }

    /// Adds a definition under a new name.
    pub fn add(&mut self, name: impl Into<String>, definition: ServiceDefinition) -> WireResult<&mut ServiceDefinition> {
        let name = name.into();
        self.ensure_building("add", &name)?;
        if self.definitions.contains_key(&name) {
            return Err(WireError::DuplicateName(name));
        }
        let entry = self.definitions.entry(name).or_insert(definition);
        Ok(entry)
    }

    /// Adds a definition under a generated name (`"01"`, `"02"`, ...) and
    /// returns that name.
    pub fn add_anonymous(&mut self, definition: ServiceDefinition) -> WireResult<String> {
        self.ensure_building("add", "<anonymous>")?;
        let name = loop {
            self.anonymous_counter += 1;
            let candidate = format!("{:02}", self.anonymous_counter);
            if !self.definitions.contains_key(&candidate) {
                break candidate;
            }
        };
        self.definitions.insert(name.clone(), definition);
        Ok(name)
    }

    pub fn get(&self, name: &str) -> WireResult<&ServiceDefinition> {
        self.definitions
            .get(name)
            .ok_or_else(|| WireError::NotFound(name.to_string()))
    }

    /// Mutable access for extensions; fails once frozen.
    pub fn get_mut(&mut self, name: &str) -> WireResult<&mut ServiceDefinition> {
        self.ensure_building("modify", name)?;
        self.definitions
            .get_mut(name)
            .ok_or_else(|| WireError::NotFound(name.to_string()))
    }

    /// Removes a definition, keeping the order of the remaining ones.
    pub fn remove(&mut self, name: &str) -> WireResult<ServiceDefinition> {
        self.ensure_building("remove", name)?;
        self.definitions
            .shift_remove(name)
            .ok_or_else(|| WireError::NotFound(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.definitions.contains_key(name)
    }

    /// Position of a definition in insertion order.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.definitions.get_index_of(name)
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.definitions.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ServiceDefinition)> {
        self.definitions.iter().map(|(name, def)| (name.as_str(), def))
    }

    /// Definitions whose resolved or declared type is `ty` or a subtype of
    /// it, in insertion order. Autowiring settings are ignored.
    ///
    /// The resolved type is inferred from the factory's return class when no
    /// type is declared. A definition whose inference fails is matched on
    /// its declared type alone.
    pub fn find_by_type<'a>(
        &'a self,
        ty: &TypeName,
        catalog: &dyn TypeCatalog,
    ) -> Vec<(&'a str, &'a ServiceDefinition)> {
        let inferred = infer_types(self, catalog).types;
        self.iter()
            .filter(|(name, def)| {
                inferred
                    .get(*name)
                    .or_else(|| def.known_type())
                    .is_some_and(|t| catalog.is_compatible(t, ty))
            })
            .collect()
    }

    /// Definitions carrying `tag`, with the tag's value, in insertion order.
    pub fn find_by_tag<'a>(&'a self, tag: &str) -> Vec<(&'a str, Option<&'a Literal>)> {
        self.iter()
            .filter_map(|(name, def)| def.tags.get(tag).map(|value| (name, value.as_ref())))
            .collect()
    }
}
