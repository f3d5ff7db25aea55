//! Extensions: build-phase plugins that populate and adjust definitions.

use crate::definition::ServiceDefinition;
use crate::error::WireResult;
use crate::statement::Literal;
use crate::types::{TypeCatalog, TypeName};

use super::DefinitionStore;

/// A build-phase plugin.
///
/// Extensions run in two rounds before the store is frozen: every
/// extension's [`load_configuration`](Extension::load_configuration) first,
/// then every extension's [`before_compile`](Extension::before_compile). The
/// second round sees all definitions contributed in the first, which is where
/// cross-cutting changes such as "add a setup call to every service tagged
/// `x`" belong.
///
/// # Example
///
/// ```rust
/// use ferrous_wire::{Extension, ExtensionContext, ServiceDefinition, Statement, Value, WireResult};
///
/// struct ConsoleExtension;
///
/// impl Extension for ConsoleExtension {
///     fn name(&self) -> &str {
///         "console"
///     }
///
///     fn load_configuration(&mut self, ctx: &mut ExtensionContext<'_>) -> WireResult<()> {
///         ctx.add("application", ServiceDefinition::of_type("Console\\Application"))?;
///         Ok(())
///     }
///
///     fn before_compile(&mut self, ctx: &mut ExtensionContext<'_>) -> WireResult<()> {
///         let app = ctx.prefixed("application");
///         for name in ctx.names_tagged("console.command") {
///             ctx.get_mut(&app)?
///                 .add_setup(Statement::setup("add").arg(Value::reference(name)));
///         }
///         Ok(())
///     }
/// }
/// ```
pub trait Extension {
    /// Name used to prefix the extension's own definitions.
    fn name(&self) -> &str;

    /// First round: contribute definitions.
    fn load_configuration(&mut self, _ctx: &mut ExtensionContext<'_>) -> WireResult<()> {
        Ok(())
    }

    /// Second round: adjust definitions contributed by anyone.
    fn before_compile(&mut self, _ctx: &mut ExtensionContext<'_>) -> WireResult<()> {
        Ok(())
    }
}

/// What an extension sees of the build: the store plus its own name.
///
/// Definitions added through [`ExtensionContext::add`] are prefixed with
/// `"<extension>."`; every other accessor takes full names.
pub struct ExtensionContext<'a> {
    extension: &'a str,
    store: &'a mut DefinitionStore,
    catalog: &'a dyn TypeCatalog,
}

impl<'a> ExtensionContext<'a> {
    pub fn new(extension: &'a str, store: &'a mut DefinitionStore, catalog: &'a dyn TypeCatalog) -> Self {
        Self { extension, store, catalog }
    }

    pub fn extension(&self) -> &str {
        self.extension
    }

    /// Full name for a definition local to this extension.
    pub fn prefixed(&self, local: &str) -> String {
        format!("{}.{}", self.extension, local)
    }

    /// Adds a definition under `<extension>.<local>`.
    pub fn add(&mut self, local: &str, definition: ServiceDefinition) -> WireResult<&mut ServiceDefinition> {
        let name = self.prefixed(local);
        self.store.add(name, definition)
    }

    pub fn get(&self, name: &str) -> WireResult<&ServiceDefinition> {
        self.store.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> WireResult<&mut ServiceDefinition> {
        self.store.get_mut(name)
    }

    pub fn remove(&mut self, name: &str) -> WireResult<ServiceDefinition> {
        self.store.remove(name)
    }

    pub fn find_by_tag(&self, tag: &str) -> Vec<(&str, Option<&Literal>)> {
        self.store.find_by_tag(tag)
    }

    /// Owned names of definitions carrying `tag`, for use while mutating.
    pub fn names_tagged(&self, tag: &str) -> Vec<String> {
        self.store.find_by_tag(tag).into_iter().map(|(name, _)| name.to_string()).collect()
    }

    pub fn find_by_type(&self, ty: &TypeName) -> Vec<(&str, &ServiceDefinition)> {
        self.store.find_by_type(ty, self.catalog)
    }

    pub fn store(&self) -> &DefinitionStore {
        &*self.store
    }

    pub fn store_mut(&mut self) -> &mut DefinitionStore {
        &mut *self.store
    }
}
