//! Resolved construction plans: the output of assembly.
//!
//! Plans contain no symbolic references, no omitted slots and no parameter
//! placeholders. Every service dependency is a [`ResolvedValue::Service`]
//! naming a definition that exists in the same [`ConstructionGraph`].

use indexmap::IndexMap;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{Site, WireError, WireResult};
use crate::statement::{ArrayKey, Literal};
use crate::types::TypeName;

/// Direct handle to a definition, produced by reference resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefinitionHandle {
    pub name: String,
    /// Refers to the instance currently being built
    pub is_self: bool,
}

impl DefinitionHandle {
    pub(crate) fn service(name: impl Into<String>) -> Self {
        Self { name: name.into(), is_self: false }
    }

    pub(crate) fn current(name: impl Into<String>) -> Self {
        Self { name: name.into(), is_self: true }
    }

    /// Value the handle contributes to an argument list.
    pub fn into_value(self) -> ResolvedValue {
        if self.is_self {
            ResolvedValue::SelfRef
        } else {
            ResolvedValue::Service(self.name)
        }
    }
}

/// Concrete target of a resolved invocation.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ResolvedTarget {
    New(TypeName),
    Static { class: TypeName, method: String },
    Function(String),
    Method { receiver: Box<ResolvedValue>, method: String },
    SetProperty { receiver: Box<ResolvedValue>, property: String },
    AppendProperty { receiver: Box<ResolvedValue>, property: String },
}

/// A call with every argument resolved, in parameter order.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ResolvedInvocation {
    pub target: ResolvedTarget,
    pub arguments: Vec<ResolvedValue>,
    /// Class returned by the call, when known
    pub returns: Option<TypeName>,
}

/// A fully resolved argument value.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ResolvedValue {
    Literal(Literal),
    /// Another service, by name
    Service(String),
    /// The instance being built
    SelfRef,
    /// Result of a nested call
    Invocation(Box<ResolvedInvocation>),
    /// Reference to a callable, not invoked
    Callable(Box<ResolvedTarget>),
    Array(Vec<(Option<ArrayKey>, ResolvedValue)>),
}

impl ResolvedValue {
    /// Collects the names of services this value depends on, in order of
    /// appearance, without duplicates.
    pub fn collect_services(&self, out: &mut Vec<String>) {
        match self {
            ResolvedValue::Service(name) => {
                if !out.iter().any(|n| n == name) {
                    out.push(name.clone());
                }
            }
            ResolvedValue::Invocation(call) => call.collect_services(out),
            ResolvedValue::Callable(target) => target.collect_services(out),
            ResolvedValue::Array(items) => {
                for (_, value) in items {
                    value.collect_services(out);
                }
            }
            ResolvedValue::Literal(_) | ResolvedValue::SelfRef => {}
        }
    }
}

impl ResolvedTarget {
    fn collect_services(&self, out: &mut Vec<String>) {
        match self {
            ResolvedTarget::Method { receiver, .. }
            | ResolvedTarget::SetProperty { receiver, .. }
            | ResolvedTarget::AppendProperty { receiver, .. } => receiver.collect_services(out),
            ResolvedTarget::New(_) | ResolvedTarget::Static { .. } | ResolvedTarget::Function(_) => {}
        }
    }
}

impl ResolvedInvocation {
    pub fn collect_services(&self, out: &mut Vec<String>) {
        self.target.collect_services(out);
        for argument in &self.arguments {
            argument.collect_services(out);
        }
    }
}

/// Resolved output for one definition.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ConstructionPlan {
    pub name: String,
    pub ty: TypeName,
    /// `None` for imported services
    pub factory: Option<ResolvedInvocation>,
    /// Executed in order on the new instance; results discarded
    pub setup: Vec<ResolvedInvocation>,
    pub lazy: bool,
    pub imported: bool,
    pub tags: IndexMap<String, Option<Literal>>,
}

impl ConstructionPlan {
    /// Services used by the factory.
    pub fn factory_dependencies(&self) -> Vec<String> {
        let mut out = Vec::new();
        if let Some(factory) = &self.factory {
            factory.collect_services(&mut out);
        }
        out
    }

    /// Services used by setup calls.
    pub fn setup_dependencies(&self) -> Vec<String> {
        let mut out = Vec::new();
        for call in &self.setup {
            call.collect_services(&mut out);
        }
        out
    }

    /// Every service this plan depends on, factory first.
    pub fn dependencies(&self) -> Vec<String> {
        let mut out = self.factory_dependencies();
        for call in &self.setup {
            call.collect_services(&mut out);
        }
        out
    }
}

/// Autowiring candidates for one type.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct WiringEntry {
    /// In definition order
    pub candidates: Vec<String>,
    /// Tie-break winner when there are several candidates
    pub preferred: Option<String>,
}

/// The complete, validated service graph handed to code emission.
///
/// # Examples
///
/// ```rust
/// use ferrous_wire::{DefinitionStore, PlanAssembler, ServiceDefinition, TypeRegistry};
///
/// let mut store = DefinitionStore::new();
/// store.add("clock", ServiceDefinition::of_type("SystemClock").with_tag("core", None)).unwrap();
///
/// let graph = PlanAssembler::new(&TypeRegistry::new()).assemble(&mut store).unwrap();
/// assert_eq!(graph.len(), 1);
/// assert_eq!(graph.tagged("core"), vec!["clock"]);
/// assert_eq!(graph.candidates_for(&"SystemClock".into()), ["clock".to_string()]);
/// assert_eq!(graph.autowire(&"SystemClock".into()).unwrap(), "clock");
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ConstructionGraph {
    /// Plans in definition order
    pub plans: IndexMap<String, ConstructionPlan>,
    /// Autowirable type -> candidate services
    pub wiring: IndexMap<TypeName, WiringEntry>,
    /// Tag -> service -> tag value
    pub tags: IndexMap<String, IndexMap<String, Option<Literal>>>,
}

impl ConstructionGraph {
    pub fn get(&self, name: &str) -> Option<&ConstructionPlan> {
        self.plans.get(name)
    }

    pub fn len(&self) -> usize {
        self.plans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plans.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ConstructionPlan)> {
        self.plans.iter().map(|(name, plan)| (name.as_str(), plan))
    }

    /// Services autowirable as `ty`.
    pub fn candidates_for(&self, ty: &TypeName) -> &[String] {
        self.wiring.get(ty).map(|entry| entry.candidates.as_slice()).unwrap_or(&[])
    }

    /// The single service autowiring picks for `ty`, with the same rules
    /// used during assembly.
    pub fn autowire(&self, ty: &TypeName) -> WireResult<&str> {
        let entry = self.wiring.get(ty);
        match entry.map(|e| (e.candidates.as_slice(), e.preferred.as_deref())) {
            None | Some(([], _)) => Err(WireError::NoServiceFound {
                required: ty.clone(),
                site: Site::default(),
            }),
            Some(([only], _)) => Ok(only),
            Some((_, Some(preferred))) => Ok(preferred),
            Some((many, None)) => Err(WireError::AmbiguousService {
                required: ty.clone(),
                candidates: many.to_vec(),
                site: Site::default(),
            }),
        }
    }

    /// Names of services carrying `tag`, in definition order.
    pub fn tagged(&self, tag: &str) -> Vec<&str> {
        self.tags
            .get(tag)
            .map(|services| services.keys().map(String::as_str).collect())
            .unwrap_or_default()
    }

    #[cfg(feature = "diagnostics")]
    pub fn to_debug_string(&self) -> String {
        let mut s = String::new();
        s.push_str("=== Construction Graph ===\n");
        for (name, plan) in &self.plans {
            s.push_str(&format!("  {}: {}", name, plan.ty));
            if plan.lazy {
                s.push_str(" (lazy)");
            }
            if plan.imported {
                s.push_str(" (imported)");
            }
            let deps = plan.dependencies();
            if !deps.is_empty() {
                s.push_str(&format!(" -> {}", deps.join(", ")));
            }
            s.push('\n');
        }
        s
    }
}
