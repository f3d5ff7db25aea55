//! Service type inference, run once before autowiring is indexed.

use indexmap::IndexMap;

use crate::definition::ServiceDefinition;
use crate::error::{ServiceError, Site, WireError, WireResult};
use crate::internal::{ResolutionStack, Set};
use crate::statement::{Entity, Receiver, Reference, Statement};
use crate::store::DefinitionStore;
use crate::types::{TypeCatalog, TypeName};

/// Outcome of inference: a type for every definition that has one, and an
/// error for every definition that does not.
pub(crate) struct InferredTypes {
    pub types: IndexMap<String, TypeName>,
    pub errors: Vec<ServiceError>,
}

/// Infers the type of every definition in `store`.
///
/// The declared type wins when present; otherwise the class a factory
/// returns is used. A declared type that is unrelated to the factory's known
/// return type is a [`WireError::TypeMismatch`].
pub(crate) fn infer_types(store: &DefinitionStore, catalog: &dyn TypeCatalog) -> InferredTypes {
    let mut inference = TypeInference {
        store,
        catalog,
        types: IndexMap::new(),
        errors: Vec::new(),
        failed: Set::default(),
        visiting: ResolutionStack::new(),
    };
    for name in store.names() {
        inference.infer(name);
    }
    InferredTypes {
        types: store
            .names()
            .filter_map(|name| inference.types.get(name).map(|ty| (name.to_string(), ty.clone())))
            .collect(),
        errors: inference.errors,
    }
}

struct TypeInference<'a> {
    store: &'a DefinitionStore,
    catalog: &'a dyn TypeCatalog,
    types: IndexMap<String, TypeName>,
    errors: Vec<ServiceError>,
    failed: Set<String>,
    visiting: ResolutionStack,
}

impl<'a> TypeInference<'a> {
    fn infer(&mut self, name: &str) -> Option<TypeName> {
        if let Some(ty) = self.types.get(name) {
            return Some(ty.clone());
        }
        if self.failed.contains(name) {
            return None;
        }
        let store = self.store;
        let definition = store.get(name).ok()?;
        // a factory chain leading back here has no type to offer
        self.visiting.enter(name).ok()?;
        let result = self.infer_definition(name, definition);
        self.visiting.leave(name);

        match result {
            Ok(ty) => {
                tracing::trace!(service = name, ty = %ty, "type inferred");
                self.types.insert(name.to_string(), ty.clone());
                Some(ty)
            }
            Err(error) => {
                self.failed.insert(name.to_string());
                self.errors.push(ServiceError { service: name.to_string(), error });
                None
            }
        }
    }

    fn infer_definition(&mut self, name: &str, definition: &ServiceDefinition) -> WireResult<TypeName> {
        if definition.imported {
            if definition.factory.is_some() || !definition.setup.is_empty() {
                return Err(WireError::InvalidStatement(format!(
                    "imported service '{}' cannot have a factory or setup",
                    name
                )));
            }
            return definition.ty.clone().ok_or_else(|| WireError::UnresolvedType(name.to_string()));
        }

        let returned = definition.factory.as_ref().and_then(|factory| self.return_type(factory));
        match (&definition.ty, returned) {
            (Some(declared), Some(returned)) => {
                if self.catalog.is_compatible(&returned, declared)
                    || self.catalog.is_compatible(declared, &returned)
                {
                    Ok(declared.clone())
                } else {
                    Err(WireError::TypeMismatch {
                        expected: declared.clone(),
                        found: returned,
                        site: Site::service(name),
                    })
                }
            }
            (Some(declared), None) => Ok(declared.clone()),
            (None, Some(returned)) => Ok(returned),
            (None, None) => Err(WireError::UnresolvedType(name.to_string())),
        }
    }

    /// Class a statement produces, when it can be known without resolving
    /// arguments.
    fn return_type(&mut self, statement: &Statement) -> Option<TypeName> {
        if statement.callable {
            return None;
        }
        let catalog = self.catalog;
        match &statement.entity {
            Entity::New(class) => Some(class.clone()),
            Entity::Static(class, method) => catalog.method(class, method)?.signature.return_class().cloned(),
            Entity::Function(function) => catalog.function(function)?.return_class().cloned(),
            Entity::Method(receiver, method) => {
                let receiver = match receiver {
                    Receiver::Reference(Reference::Name(service)) => self.infer(service)?,
                    Receiver::Reference(Reference::Type(ty)) => ty.clone(),
                    Receiver::Reference(Reference::SelfRef) => return None,
                    Receiver::Statement(inner) => self.return_type(inner)?,
                };
                catalog.method(&receiver, method)?.signature.return_class().cloned()
            }
            Entity::SelfMethod(_) | Entity::SelfProperty(_) | Entity::SelfAppend(_) => None,
        }
    }
}
