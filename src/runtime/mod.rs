//! Reference runtime that executes a [`ConstructionGraph`].
//!
//! Code emission is out of scope for this crate, but a graph is only useful
//! if something can run it. [`Container`] interprets plans directly, caching
//! one instance per service and delegating every concrete value to a
//! [`Backend`].

use std::cell::{Ref, RefCell};

use indexmap::IndexMap;
use once_cell::unsync::OnceCell;

use crate::error::{Site, WireError, WireResult};
use crate::internal::ResolutionStack;
use crate::plan::{ConstructionGraph, ConstructionPlan, ResolvedInvocation, ResolvedTarget, ResolvedValue};
use crate::types::TypeName;

mod backend;

pub use backend::{Backend, CallTarget};

/// Runs construction plans on demand.
///
/// Every service is created at most once. Lazy services hand out the
/// backend's stand-in from [`Container::get`] until something calls
/// [`Container::materialize`]. Imported services must be supplied with
/// [`Container::set_imported`] before anything depends on them.
///
/// # Examples
///
/// ```rust
/// use ferrous_wire::*;
///
/// struct Names;
///
/// impl Backend for Names {
///     type Value = String;
///     type Error = String;
///
///     fn literal(&mut self, literal: &Literal) -> Result<String, String> {
///         Ok(literal.to_string())
///     }
///     fn array(&mut self, items: Vec<(Option<ArrayKey>, String)>) -> Result<String, String> {
///         Ok(format!("[{}]", items.into_iter().map(|(_, v)| v).collect::<Vec<_>>().join(", ")))
///     }
///     fn invoke(&mut self, target: CallTarget<'_, String>, args: Vec<String>) -> Result<String, String> {
///         match target {
///             CallTarget::New(class) => Ok(format!("{}({})", class, args.join(", "))),
///             other => Err(format!("unsupported {:?}", other)),
///         }
///     }
///     fn callable(&mut self, _: CallTarget<'_, String>) -> Result<String, String> {
///         Err("no callables".into())
///     }
///     fn lazy(&mut self, service: &str, _: &TypeName) -> Result<String, String> {
///         Ok(format!("proxy({})", service))
///     }
/// }
///
/// let types = TypeRegistry::new()
///     .with_class(ClassInfo::class("Clock"))
///     .with_class(ClassInfo::class("App").constructor(Signature::new().param(Parameter::class("clock", "Clock"))));
/// let mut store = DefinitionStore::new();
/// store.add("clock", ServiceDefinition::of_type("Clock")).unwrap();
/// store.add("app", ServiceDefinition::of_type("App")).unwrap();
/// let graph = PlanAssembler::new(&types).assemble(&mut store).unwrap();
///
/// let container = Container::new(graph, Names);
/// assert_eq!(container.get("app").unwrap(), "App(Clock())");
/// assert!(container.is_created("clock"));
/// ```
pub struct Container<B: Backend> {
    graph: ConstructionGraph,
    backend: RefCell<B>,
    instances: IndexMap<String, OnceCell<B::Value>>,
    proxies: IndexMap<String, OnceCell<B::Value>>,
    resolving: RefCell<ResolutionStack>,
}

impl<B: Backend> Container<B> {
    pub fn new(graph: ConstructionGraph, backend: B) -> Self {
        let instances = graph.plans.keys().map(|name| (name.clone(), OnceCell::new())).collect();
        let proxies = graph
            .plans
            .iter()
            .filter(|(_, plan)| plan.lazy)
            .map(|(name, _)| (name.clone(), OnceCell::new()))
            .collect();
        Self {
            graph,
            backend: RefCell::new(backend),
            instances,
            proxies,
            resolving: RefCell::new(ResolutionStack::new()),
        }
    }

    pub fn graph(&self) -> &ConstructionGraph {
        &self.graph
    }

    pub fn backend(&self) -> Ref<'_, B> {
        self.backend.borrow()
    }

    pub fn has(&self, name: &str) -> bool {
        self.graph.plans.contains_key(name)
    }

    /// Returns the service, creating it unless it is lazy.
    pub fn get(&self, name: &str) -> WireResult<B::Value> {
        let (plan, cell) = self.slot(name)?;
        if let Some(instance) = cell.get() {
            return Ok(instance.clone());
        }
        match self.proxies.get(name) {
            Some(proxy) => proxy
                .get_or_try_init(|| self.backend.borrow_mut().lazy(name, &plan.ty))
                .map(Clone::clone)
                .map_err(|e| backend_error(name, e)),
            None => self.materialize(name),
        }
    }

    /// Returns the real instance, creating it if needed.
    pub fn materialize(&self, name: &str) -> WireResult<B::Value> {
        let (plan, cell) = self.slot(name)?;
        if let Some(instance) = cell.get() {
            return Ok(instance.clone());
        }
        if plan.imported {
            return Err(WireError::Backend {
                service: name.to_string(),
                message: "imported service has not been supplied".into(),
            });
        }

        self.resolving.borrow_mut().enter(name)?;
        let result = cell.get_or_try_init(|| self.construct(plan));
        self.resolving.borrow_mut().leave(name);
        if result.is_ok() {
            tracing::trace!(service = name, "service created");
        }
        result.map(Clone::clone)
    }

    /// The service autowiring picks for `ty`.
    pub fn get_by_type(&self, ty: &TypeName) -> WireResult<B::Value> {
        let site = match self.resolving.borrow().current() {
            Some(service) => Site::service(service),
            None => Site::default(),
        };
        let name = self.graph.autowire(ty).map_err(|e| e.at_site(&site))?.to_string();
        self.get(&name)
    }

    /// Names of services carrying `tag`, in definition order.
    pub fn find_by_tag(&self, tag: &str) -> Vec<&str> {
        self.graph.tagged(tag)
    }

    /// Supplies an imported service from outside.
    pub fn set_imported(&self, name: &str, value: B::Value) -> WireResult<()> {
        let (plan, cell) = self.slot(name)?;
        if !plan.imported {
            return Err(WireError::InvalidStatement(format!("service '{}' is not imported", name)));
        }
        cell.set(value)
            .map_err(|_| WireError::InvalidStatement(format!("service '{}' was already supplied", name)))
    }

    pub fn is_created(&self, name: &str) -> bool {
        self.instances.get(name).map_or(false, |cell| cell.get().is_some())
    }

    fn slot(&self, name: &str) -> WireResult<(&ConstructionPlan, &OnceCell<B::Value>)> {
        match (self.graph.plans.get(name), self.instances.get(name)) {
            (Some(plan), Some(cell)) => Ok((plan, cell)),
            _ => Err(WireError::NotFound(name.to_string())),
        }
    }

    fn construct(&self, plan: &ConstructionPlan) -> WireResult<B::Value> {
        let factory = plan.factory.as_ref().ok_or_else(|| WireError::Backend {
            service: plan.name.clone(),
            message: "no factory".into(),
        })?;
        let instance = self.invoke(&plan.name, factory, None)?;
        for call in &plan.setup {
            self.invoke(&plan.name, call, Some(&instance))?;
        }
        Ok(instance)
    }

    fn invoke(&self, service: &str, call: &ResolvedInvocation, this: Option<&B::Value>) -> WireResult<B::Value> {
        let arguments = call
            .arguments
            .iter()
            .map(|argument| self.evaluate(service, argument, this))
            .collect::<WireResult<Vec<_>>>()?;
        let target = self.target(service, &call.target, this)?;
        self.backend
            .borrow_mut()
            .invoke(target, arguments)
            .map_err(|e| backend_error(service, e))
    }

    fn target<'p>(
        &self,
        service: &str,
        target: &'p ResolvedTarget,
        this: Option<&B::Value>,
    ) -> WireResult<CallTarget<'p, B::Value>> {
        Ok(match target {
            ResolvedTarget::New(class) => CallTarget::New(class),
            ResolvedTarget::Static { class, method } => CallTarget::Static { class, method },
            ResolvedTarget::Function(name) => CallTarget::Function(name),
            ResolvedTarget::Method { receiver, method } => CallTarget::Method {
                receiver: self.evaluate(service, receiver, this)?,
                method,
            },
            ResolvedTarget::SetProperty { receiver, property } => CallTarget::SetProperty {
                receiver: self.evaluate(service, receiver, this)?,
                property,
            },
            ResolvedTarget::AppendProperty { receiver, property } => CallTarget::AppendProperty {
                receiver: self.evaluate(service, receiver, this)?,
                property,
            },
        })
    }

    fn evaluate(&self, service: &str, value: &ResolvedValue, this: Option<&B::Value>) -> WireResult<B::Value> {
        match value {
            ResolvedValue::Literal(literal) => {
                self.backend.borrow_mut().literal(literal).map_err(|e| backend_error(service, e))
            }
            ResolvedValue::Service(name) => self.get(name),
            ResolvedValue::SelfRef => this.cloned().ok_or_else(|| WireError::Backend {
                service: service.to_string(),
                message: "@self is not available while the instance is being created".into(),
            }),
            ResolvedValue::Invocation(call) => self.invoke(service, call, this),
            ResolvedValue::Callable(target) => {
                let target = self.target(service, target, this)?;
                self.backend.borrow_mut().callable(target).map_err(|e| backend_error(service, e))
            }
            ResolvedValue::Array(items) => {
                let mut values = Vec::with_capacity(items.len());
                for (key, item) in items {
                    values.push((key.clone(), self.evaluate(service, item, this)?));
                }
                self.backend.borrow_mut().array(values).map_err(|e| backend_error(service, e))
            }
        }
    }
}

fn backend_error(service: &str, error: impl std::fmt::Display) -> WireError {
    WireError::Backend { service: service.to_string(), message: error.to_string() }
}
