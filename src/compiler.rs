//! Build-phase driver: extensions, freeze, assembly.

use std::sync::Arc;

use crate::assembler::PlanAssembler;
use crate::config::{AssemblerConfig, Parameters};
use crate::definition::ServiceDefinition;
use crate::error::{AssemblyError, ServiceError, WireResult};
use crate::observer::{AssemblyObserver, Observers};
use crate::plan::ConstructionGraph;
use crate::store::{DefinitionStore, Extension, ExtensionContext};
use crate::types::TypeCatalog;

/// Owns everything a build needs and runs it in order.
///
/// Definitions come from the caller (usually a configuration loader) and
/// from registered extensions. [`Compiler::compile`] runs every extension's
/// `load_configuration`, then every extension's `before_compile`, freezes
/// the store and assembles it.
///
/// # Examples
///
/// ```rust
/// use ferrous_wire::*;
///
/// struct Clock;
///
/// impl Extension for Clock {
///     fn name(&self) -> &str {
///         "clock"
///     }
///
///     fn load_configuration(&mut self, ctx: &mut ExtensionContext<'_>) -> WireResult<()> {
///         ctx.add("system", ServiceDefinition::of_type("SystemClock"))?;
///         Ok(())
///     }
/// }
///
/// let types = TypeRegistry::new();
/// let mut compiler = Compiler::new(&types);
/// compiler.add_extension(Clock);
/// let graph = compiler.compile().unwrap();
///
/// assert!(graph.get("clock.system").is_some());
/// assert!(compiler.store().is_frozen());
/// ```
pub struct Compiler<'a> {
    catalog: &'a dyn TypeCatalog,
    store: DefinitionStore,
    parameters: Parameters,
    extensions: Vec<Box<dyn Extension>>,
    config: AssemblerConfig,
    observers: Observers,
}

impl<'a> Compiler<'a> {
    pub fn new(catalog: &'a dyn TypeCatalog) -> Self {
        Self::with_store(catalog, DefinitionStore::new())
    }

    /// Starts from definitions produced elsewhere.
    pub fn with_store(catalog: &'a dyn TypeCatalog, store: DefinitionStore) -> Self {
        Self {
            catalog,
            store,
            parameters: Parameters::new(),
            extensions: Vec::new(),
            config: AssemblerConfig::default(),
            observers: Observers::new(),
        }
    }

    pub fn store(&self) -> &DefinitionStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut DefinitionStore {
        &mut self.store
    }

    /// Adds a definition directly.
    pub fn add_definition(
        &mut self,
        name: impl Into<String>,
        definition: ServiceDefinition,
    ) -> WireResult<&mut ServiceDefinition> {
        self.store.add(name, definition)
    }

    pub fn add_extension<E: Extension + 'static>(&mut self, extension: E) -> &mut Self {
        self.extensions.push(Box::new(extension));
        self
    }

    pub fn parameters_mut(&mut self) -> &mut Parameters {
        &mut self.parameters
    }

    pub fn set_parameters(&mut self, parameters: Parameters) -> &mut Self {
        self.parameters = parameters;
        self
    }

    pub fn set_config(&mut self, config: AssemblerConfig) -> &mut Self {
        self.config = config;
        self
    }

    pub fn add_observer(&mut self, observer: Arc<dyn AssemblyObserver>) -> &mut Self {
        self.observers.add(observer);
        self
    }

    /// Runs the build. Extensions only run while the store is still being
    /// built, so a second call reassembles the frozen store as is.
    pub fn compile(&mut self) -> Result<ConstructionGraph, AssemblyError> {
        if !self.store.is_frozen() {
            self.run_extensions(Round::LoadConfiguration)?;
            self.run_extensions(Round::BeforeCompile)?;
        }
        PlanAssembler::new(self.catalog)
            .with_parameters(self.parameters.clone())
            .with_config(self.config.clone())
            .with_observers(self.observers.clone())
            .assemble(&mut self.store)
    }

    fn run_extensions(&mut self, round: Round) -> Result<(), AssemblyError> {
        for extension in self.extensions.iter_mut() {
            let name = extension.name().to_string();
            let mut ctx = ExtensionContext::new(&name, &mut self.store, self.catalog);
            let result = match round {
                Round::LoadConfiguration => extension.load_configuration(&mut ctx),
                Round::BeforeCompile => extension.before_compile(&mut ctx),
            };
            tracing::debug!(extension = %name, ?round, ok = result.is_ok(), "extension round");
            result.map_err(|error| ServiceError { service: name.clone(), error })?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy)]
enum Round {
    LoadConfiguration,
    BeforeCompile,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Statement, TypeRegistry, Value, WireError};

    struct Commands;

    impl Extension for Commands {
        fn name(&self) -> &str {
            "console"
        }

        fn load_configuration(&mut self, ctx: &mut ExtensionContext<'_>) -> WireResult<()> {
            ctx.add("app", ServiceDefinition::of_type("Application"))?;
            Ok(())
        }

        fn before_compile(&mut self, ctx: &mut ExtensionContext<'_>) -> WireResult<()> {
            let app = ctx.prefixed("app");
            for name in ctx.names_tagged("command") {
                ctx.get_mut(&app)?.add_setup(Statement::setup("add").arg(Value::reference(name)));
            }
            Ok(())
        }
    }

    #[test]
    fn before_compile_sees_user_definitions() {
        let types = TypeRegistry::new();
        let mut compiler = Compiler::new(&types);
        compiler
            .add_definition("hello", ServiceDefinition::of_type("HelloCommand").with_tag("command", None))
            .unwrap();
        compiler.add_extension(Commands);

        let graph = compiler.compile().unwrap();
        let app = graph.get("console.app").unwrap();
        assert_eq!(app.setup.len(), 1);
        assert_eq!(app.setup_dependencies(), ["hello"]);
    }

    #[test]
    fn extension_errors_name_the_extension() {
        struct Broken;
        impl Extension for Broken {
            fn name(&self) -> &str {
                "broken"
            }
            fn before_compile(&mut self, ctx: &mut ExtensionContext<'_>) -> WireResult<()> {
                ctx.remove("missing")?;
                Ok(())
            }
        }

        let types = TypeRegistry::new();
        let mut compiler = Compiler::new(&types);
        compiler.add_extension(Broken);
        let err = compiler.compile().unwrap_err();
        assert_eq!(err.errors[0].service, "broken");
        assert_eq!(err.errors[0].error, WireError::NotFound("missing".into()));
    }
}
