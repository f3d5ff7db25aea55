//! Plan assembly: resolves every definition of a frozen store.

use std::sync::Arc;
use std::time::Instant;

use indexmap::IndexMap;

use crate::autowiring::TypeIndex;
use crate::config::{AssemblerConfig, Parameters};
use crate::error::{AssemblyError, ServiceError};
use crate::observer::{AssemblyObserver, Observers};
use crate::plan::{ConstructionGraph, ConstructionPlan};
use crate::resolver::typing::{infer_types, InferredTypes};
use crate::resolver::{ResolutionContext, Resolver};
use crate::statement::Literal;
use crate::store::DefinitionStore;
use crate::types::TypeCatalog;

/// Turns a store of definitions into a [`ConstructionGraph`].
///
/// Assembly freezes the store, infers every definition's type, validates
/// autowiring settings and then resolves each definition in store order
/// with a fresh [`ResolutionContext`]. Failures are collected per definition
/// so that every independent misconfiguration shows up in one
/// [`AssemblyError`].
///
/// # Examples
///
/// ```rust
/// use ferrous_wire::*;
///
/// let types = TypeRegistry::new()
///     .with_class(ClassInfo::class("PDO"))
///     .with_class(
///         ClassInfo::class("ArticleRepository")
///             .constructor(Signature::new().param(Parameter::class("db", "PDO"))),
///     );
///
/// let mut store = DefinitionStore::new();
/// store.add("mainDb", ServiceDefinition::of_type("PDO").preferred_for("PDO")).unwrap();
/// store.add("tempDb", ServiceDefinition::of_type("PDO").with_autowired(Autowired::Disabled)).unwrap();
/// store.add("articles", ServiceDefinition::of_type("ArticleRepository")).unwrap();
///
/// let graph = PlanAssembler::new(&types).assemble(&mut store).unwrap();
/// let factory = graph.get("articles").unwrap().factory.as_ref().unwrap();
/// assert_eq!(factory.arguments, [ResolvedValue::Service("mainDb".into())]);
/// assert!(store.is_frozen());
/// ```
pub struct PlanAssembler<'a> {
    catalog: &'a dyn TypeCatalog,
    parameters: Parameters,
    config: AssemblerConfig,
    observers: Observers,
}

impl<'a> PlanAssembler<'a> {
    pub fn new(catalog: &'a dyn TypeCatalog) -> Self {
        Self {
            catalog,
            parameters: Parameters::new(),
            config: AssemblerConfig::default(),
            observers: Observers::new(),
        }
    }

    pub fn with_parameters(mut self, parameters: Parameters) -> Self {
        self.parameters = parameters;
        self
    }

    pub fn with_config(mut self, config: AssemblerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_observer(mut self, observer: Arc<dyn AssemblyObserver>) -> Self {
        self.observers.add(observer);
        self
    }

    pub fn with_observers(mut self, observers: Observers) -> Self {
        self.observers = observers;
        self
    }

    pub fn config(&self) -> &AssemblerConfig {
        &self.config
    }

    /// Freezes `store` and assembles it.
    pub fn assemble(&self, store: &mut DefinitionStore) -> Result<ConstructionGraph, AssemblyError> {
        store.freeze();
        self.assemble_frozen(store)
    }

    /// Assembles a store without touching its phase. The store is only read.
    pub fn assemble_frozen(&self, store: &DefinitionStore) -> Result<ConstructionGraph, AssemblyError> {
        let started = Instant::now();
        let fail_fast = self.config.fail_fast;
        tracing::debug!(services = store.len(), "assembling service graph");

        let InferredTypes { types, mut errors } = infer_types(store, self.catalog);
        let index = TypeIndex::new(store, self.catalog, &types);
        errors.extend(index.validate());

        let mut resolver = Resolver::new(
            store,
            self.catalog,
            &types,
            &self.parameters,
            &self.config,
            &self.observers,
        );
        for name in store.names().filter(|name| !types.contains_key(*name)) {
            resolver.mark_failed(name);
        }

        if !(fail_fast && !errors.is_empty()) {
            for name in store.names() {
                if resolver.is_resolved(name) {
                    continue;
                }
                let mut ctx = ResolutionContext::new();
                if let Err(error) = resolver.resolve_definition(name, &mut ctx) {
                    let service = resolver.take_origin().unwrap_or_else(|| name.to_string());
                    errors.push(ServiceError { service, error });
                    if fail_fast {
                        break;
                    }
                }
            }
        }

        if !errors.is_empty() {
            for error in &errors {
                tracing::warn!(service = %error.service, error = %error.error, "definition failed");
            }
            tracing::info!(failed = errors.len(), elapsed = ?started.elapsed(), "assembly failed");
            return Err(AssemblyError::new(errors));
        }

        let mut resolved = resolver.into_plans();
        // plans come out in resolution order; emission wants store order
        let plans: IndexMap<String, ConstructionPlan> = store
            .names()
            .filter_map(|name| resolved.swap_remove(name).map(|plan| (name.to_string(), plan)))
            .collect();
        let tags = collect_tags(&plans);
        let wiring = index.wiring();

        tracing::info!(services = plans.len(), elapsed = ?started.elapsed(), "service graph assembled");
        Ok(ConstructionGraph { plans, wiring, tags })
    }
}

fn collect_tags(plans: &IndexMap<String, ConstructionPlan>) -> IndexMap<String, IndexMap<String, Option<Literal>>> {
    let mut tags: IndexMap<String, IndexMap<String, Option<Literal>>> = IndexMap::new();
    for (name, plan) in plans {
        for (tag, value) in &plan.tags {
            tags.entry(tag.clone()).or_default().insert(name.clone(), value.clone());
        }
    }
    tags
}
