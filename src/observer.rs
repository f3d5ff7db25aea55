//! Observation hooks for plan assembly.
//!
//! Observers are told when each definition starts resolving, when its plan is
//! complete and when it fails. They run synchronously inside the assembler,
//! so implementations should stay cheap.

use std::sync::Arc;
use std::time::Duration;

use crate::error::WireError;

/// Receives assembly events for individual definitions.
///
/// Only top-level definitions visited by the assembler and definitions
/// resolved as a side effect of them are reported; each name is reported at
/// most once per assembly.
///
/// # Examples
///
/// ```
/// use std::sync::{Arc, Mutex};
/// use std::time::Duration;
/// use ferrous_wire::{AssemblyObserver, DefinitionStore, PlanAssembler, ServiceDefinition, TypeRegistry};
///
/// #[derive(Default)]
/// struct Recorder(Mutex<Vec<String>>);
///
/// impl AssemblyObserver for Recorder {
///     fn resolving(&self, _service: &str) {}
///     fn resolved(&self, service: &str, _elapsed: Duration) {
///         self.0.lock().unwrap().push(service.to_string());
///     }
/// }
///
/// let recorder = Arc::new(Recorder::default());
/// let mut store = DefinitionStore::new();
/// store.add("clock", ServiceDefinition::of_type("Clock")).unwrap();
///
/// PlanAssembler::new(&TypeRegistry::new())
///     .with_observer(recorder.clone())
///     .assemble(&mut store)
///     .unwrap();
/// assert_eq!(*recorder.0.lock().unwrap(), ["clock"]);
/// ```
pub trait AssemblyObserver: Send + Sync {
    /// A definition is about to be resolved.
    fn resolving(&self, service: &str);

    /// A definition's plan is complete.
    fn resolved(&self, service: &str, elapsed: Duration);

    /// A definition failed to resolve.
    fn failed(&self, _service: &str, _error: &WireError) {}
}

/// Registered observers, notified in registration order.
#[derive(Default, Clone)]
pub struct Observers {
    observers: Vec<Arc<dyn AssemblyObserver>>,
}

impl Observers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, observer: Arc<dyn AssemblyObserver>) {
        self.observers.push(observer);
    }

    #[inline]
    pub fn has_observers(&self) -> bool {
        !self.observers.is_empty()
    }

    #[inline]
    pub(crate) fn resolving(&self, service: &str) {
        for observer in &self.observers {
            observer.resolving(service);
        }
    }

    #[inline]
    pub(crate) fn resolved(&self, service: &str, elapsed: Duration) {
        for observer in &self.observers {
            observer.resolved(service, elapsed);
        }
    }

    #[inline]
    pub(crate) fn failed(&self, service: &str, error: &WireError) {
        for observer in &self.observers {
            observer.failed(service, error);
        }
    }
}

impl std::fmt::Debug for Observers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Observers")
            .field("observers", &format!("{} observers", self.observers.len()))
            .finish()
    }
}

/// Observer that forwards events to `tracing`.
///
/// Events carry the service name and a fixed `source` field, so several
/// assemblies in one process can be told apart.
///
/// ```
/// use std::sync::Arc;
/// use ferrous_wire::{PlanAssembler, TracingObserver, TypeRegistry};
///
/// let types = TypeRegistry::new();
/// let assembler = PlanAssembler::new(&types)
///     .with_observer(Arc::new(TracingObserver::with_prefix("app-container")));
/// ```
pub struct TracingObserver {
    prefix: String,
}

impl TracingObserver {
    pub fn new() -> Self {
        Self::with_prefix("ferrous-wire")
    }

    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self { prefix: prefix.into() }
    }
}

impl Default for TracingObserver {
    fn default() -> Self {
        Self::new()
    }
}

impl AssemblyObserver for TracingObserver {
    fn resolving(&self, service: &str) {
        tracing::trace!(source = %self.prefix, service, "resolving");
    }

    fn resolved(&self, service: &str, elapsed: Duration) {
        tracing::debug!(source = %self.prefix, service, ?elapsed, "resolved");
    }

    fn failed(&self, service: &str, error: &WireError) {
        tracing::warn!(source = %self.prefix, service, %error, "failed");
    }
}
