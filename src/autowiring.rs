//! Type index: matches required types against autowirable definitions.

use indexmap::IndexMap;

use crate::definition::{Autowired, ServiceDefinition};
use crate::error::{ServiceError, Site, WireError, WireResult};
use crate::plan::WiringEntry;
use crate::store::DefinitionStore;
use crate::types::{TypeCatalog, TypeName};

/// Autowiring view over a frozen store and the inferred type of each
/// definition.
///
/// Candidates are always reported in store order, so resolution never
/// depends on hashing or on the order in which definitions were resolved.
pub struct TypeIndex<'a> {
    store: &'a DefinitionStore,
    catalog: &'a dyn TypeCatalog,
    types: &'a IndexMap<String, TypeName>,
}

impl<'a> TypeIndex<'a> {
    pub fn new(
        store: &'a DefinitionStore,
        catalog: &'a dyn TypeCatalog,
        types: &'a IndexMap<String, TypeName>,
    ) -> Self {
        Self { store, catalog, types }
    }

    /// Inferred type of a definition.
    pub fn type_of(&self, name: &str) -> Option<&'a TypeName> {
        self.types.get(name)
    }

    /// `true` if the definition may satisfy a request for `required`.
    fn accepts(&self, definition: &ServiceDefinition, ty: &TypeName, required: &TypeName) -> bool {
        if !self.catalog.is_compatible(ty, required) {
            return false;
        }
        match &definition.autowired {
            Autowired::Enabled => true,
            Autowired::Disabled => false,
            Autowired::Narrowed(allowed) => {
                allowed.iter().any(|narrowed| self.catalog.is_compatible(required, narrowed))
            }
        }
    }

    /// Every definition autowirable as `required`, in store order.
    pub fn candidates(&self, required: &TypeName) -> Vec<&'a str> {
        self.store
            .iter()
            .filter_map(|(name, definition)| {
                let ty = self.types.get(name)?;
                self.accepts(definition, ty, required).then_some(name)
            })
            .collect()
    }

    /// The single candidate explicitly preferred for `required`, if exactly
    /// one of `candidates` is.
    fn preferred<'n>(&self, required: &TypeName, candidates: &[&'n str]) -> Option<&'n str> {
        let mut preferred = candidates.iter().copied().filter(|name| {
            self.store
                .get(name)
                .map(|definition| definition.is_preferred_for(required))
                .unwrap_or(false)
        });
        match (preferred.next(), preferred.next()) {
            (Some(winner), None) => Some(winner),
            _ => None,
        }
    }

    /// Picks the one definition that satisfies `required`.
    ///
    /// A unique candidate wins outright. Among several, the single one marked
    /// preferred for exactly `required` wins; anything else is ambiguous.
    pub fn resolve_by_type(&self, required: &TypeName, site: &Site) -> WireResult<&'a str> {
        let candidates = self.candidates(required);
        let chosen = match candidates.as_slice() {
            [] => {
                return Err(WireError::NoServiceFound {
                    required: required.clone(),
                    site: site.clone(),
                })
            }
            [only] => *only,
            many => self.preferred(required, many).ok_or_else(|| WireError::AmbiguousService {
                required: required.clone(),
                candidates: many.iter().map(|n| n.to_string()).collect(),
                site: site.clone(),
            })?,
        };
        tracing::trace!(required = %required, service = chosen, "autowired");
        Ok(chosen)
    }

    /// Every autowirable definition of type `required`, skipping `exclude`.
    ///
    /// Never fails; no match yields an empty list.
    pub fn resolve_all_by_type(&self, required: &TypeName, exclude: Option<&str>) -> Vec<&'a str> {
        let mut all = self.candidates(required);
        if let Some(exclude) = exclude {
            all.retain(|name| *name != exclude);
        }
        tracing::trace!(required = %required, count = all.len(), "collected by type");
        all
    }

    /// Checks narrowing and preference settings against each definition's
    /// type. Reports every problem found.
    pub fn validate(&self) -> Vec<ServiceError> {
        let mut errors = Vec::new();
        for (name, definition) in self.store.iter() {
            let Some(ty) = self.types.get(name) else { continue };

            if let Autowired::Narrowed(allowed) = &definition.autowired {
                for narrowed in allowed {
                    if !self.catalog.is_compatible(ty, narrowed) {
                        errors.push(ServiceError {
                            service: name.to_string(),
                            error: WireError::IncompatibleNarrowing {
                                service: name.to_string(),
                                ty: ty.clone(),
                                narrowed: narrowed.clone(),
                            },
                        });
                    }
                }
            }

            for preferred in &definition.preferred_for {
                if !self.accepts(definition, ty, preferred) {
                    errors.push(ServiceError {
                        service: name.to_string(),
                        error: WireError::ConflictingAutowiring {
                            service: name.to_string(),
                            ty: preferred.clone(),
                        },
                    });
                }
            }
        }
        errors
    }

    /// Autowiring table for the runtime: every type some definition can be
    /// autowired as, with its candidates and the preferred winner.
    pub fn wiring(&self) -> IndexMap<TypeName, WiringEntry> {
        let mut wiring: IndexMap<TypeName, WiringEntry> = IndexMap::new();
        for (name, definition) in self.store.iter() {
            let Some(ty) = self.types.get(name) else { continue };
            if definition.autowired.is_disabled() {
                continue;
            }
            for ancestor in self.catalog.ancestors(ty) {
                if self.accepts(definition, ty, &ancestor) {
                    wiring.entry(ancestor).or_default().candidates.push(name.to_string());
                }
            }
        }
        for (ty, entry) in wiring.iter_mut() {
            if entry.candidates.len() > 1 {
                let names: Vec<&str> = entry.candidates.iter().map(String::as_str).collect();
                entry.preferred = self.preferred(ty, &names).map(str::to_string);
            }
        }
        wiring
    }
}
