//! # ferrous-wire
//!
//! Build-time dependency injection: validate a declarative service graph and
//! resolve it into static construction plans.
//!
//! ## Features
//!
//! - **Declarative definitions**: type, factory statement, setup calls, tags,
//!   laziness and autowiring settings per service
//! - **Autowiring**: class-typed parameters are filled by type, with
//!   narrowing and per-type preference to settle ambiguity
//! - **Circular dependency detection**: cycles are reported with the full path
//! - **Aggregated errors**: every independent misconfiguration in one report
//! - **Reference runtime**: [`Container`] executes assembled plans through a
//!   pluggable [`Backend`]
//!
//! ## Quick Start
//!
//! ```rust
//! use ferrous_wire::*;
//!
//! // Class metadata the assembler can reflect on
//! let types = TypeRegistry::new()
//!     .with_class(ClassInfo::interface("Logger"))
//!     .with_class(ClassInfo::class("FileLogger").implements("Logger"))
//!     .with_class(
//!         ClassInfo::class("Mailer").constructor(
//!             Signature::new()
//!                 .param(Parameter::class("logger", "Logger"))
//!                 .param(Parameter::scalar("host", ScalarKind::String)),
//!         ),
//!     );
//!
//! let mut store = DefinitionStore::new();
//! store.add("logger", ServiceDefinition::of_type("FileLogger")).unwrap();
//! store
//!     .add(
//!         "mailer",
//!         ServiceDefinition::of_type("Mailer")
//!             .with_factory(Statement::new("Mailer").named("host", Value::parameter("smtp"))),
//!     )
//!     .unwrap();
//!
//! let graph = PlanAssembler::new(&types)
//!     .with_parameters(Parameters::new().with("smtp", "localhost"))
//!     .assemble(&mut store)
//!     .unwrap();
//!
//! let factory = graph.get("mailer").unwrap().factory.as_ref().unwrap();
//! assert_eq!(
//!     factory.arguments,
//!     [ResolvedValue::Service("logger".into()), ResolvedValue::Literal("localhost".into())]
//! );
//! ```
//!
//! ## Phases
//!
//! A [`DefinitionStore`] accepts changes while it is being built. Assembly
//! freezes it; afterwards every mutation fails with [`WireError::Frozen`].
//! [`Compiler`] drives the full build including [`Extension`] rounds.

// Module declarations
pub mod assembler;
pub mod autowiring;
pub mod compiler;
pub mod config;
pub mod definition;
pub mod error;
pub mod graph_export;
pub mod observer;
pub mod plan;
pub mod resolver;
pub mod runtime;
pub mod statement;
pub mod store;
pub mod types;

// Internal modules
mod internal;

// Re-export core types
pub use assembler::PlanAssembler;
pub use autowiring::TypeIndex;
pub use compiler::Compiler;
pub use config::{AssemblerConfig, Parameters};
pub use definition::{Autowired, ServiceDefinition};
pub use error::{AssemblyError, ServiceError, Site, WireError, WireResult};
pub use graph_export::{
    DependencyGraph, EdgeKind, ExportError, ExportFormat, ExportOptions, GraphEdge, GraphMetadata, GraphNode,
};
pub use internal::ResolutionStack;
pub use observer::{AssemblyObserver, Observers, TracingObserver};
pub use plan::{
    ConstructionGraph, ConstructionPlan, DefinitionHandle, ResolvedInvocation, ResolvedTarget, ResolvedValue,
    WiringEntry,
};
pub use resolver::{ResolutionContext, Resolver};
pub use runtime::{Backend, CallTarget, Container};
pub use statement::{Argument, ArrayKey, Entity, Literal, Receiver, Reference, Statement, Value};
pub use store::{DefinitionStore, Extension, ExtensionContext, Phase};
pub use types::{
    ClassInfo, ClassKind, Method, ParamType, Parameter, ScalarKind, Signature, TypeCatalog, TypeName, TypeRegistry,
};
