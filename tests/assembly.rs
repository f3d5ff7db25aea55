use std::sync::{Arc, Mutex};
use std::time::Duration;

use ferrous_wire::{
    AssemblerConfig, AssemblyObserver, Autowired, ClassInfo, Compiler, DefinitionStore, Extension,
    ExtensionContext, Literal, Parameter, Parameters, PlanAssembler, Reference, ResolvedValue, ServiceDefinition,
    Signature, Statement, TracingObserver, TypeName, TypeRegistry, Value, WireError, WireResult,
};

fn database_types() -> TypeRegistry {
    TypeRegistry::new()
        .with_class(ClassInfo::class("PDO"))
        .with_class(
            ClassInfo::class("ArticleRepository").constructor(Signature::new().param(Parameter::class("db", "PDO"))),
        )
}

// ===== End-to-end =====

#[test]
fn test_preferred_database_is_injected() {
    let types = database_types();
    let mut store = DefinitionStore::new();
    store.add("mainDb", ServiceDefinition::of_type("PDO").preferred_for("PDO")).unwrap();
    store.add("tempDb", ServiceDefinition::of_type("PDO").with_autowired(Autowired::Disabled)).unwrap();
    store.add("articles", ServiceDefinition::of_type("ArticleRepository")).unwrap();

    let graph = PlanAssembler::new(&types).assemble(&mut store).unwrap();
    let articles = graph.get("articles").unwrap();
    assert_eq!(articles.factory.as_ref().unwrap().arguments, [ResolvedValue::Service("mainDb".into())]);
    assert_eq!(articles.dependencies(), ["mainDb"]);
    assert_eq!(graph.candidates_for(&TypeName::from("PDO")), ["mainDb".to_string()]);
}

#[test]
fn test_two_autowirable_databases_need_a_preference() {
    let types = database_types();
    let mut store = DefinitionStore::new();
    store.add("mainDb", ServiceDefinition::of_type("PDO")).unwrap();
    store.add("tempDb", ServiceDefinition::of_type("PDO")).unwrap();
    store.add("articles", ServiceDefinition::of_type("ArticleRepository")).unwrap();

    let err = PlanAssembler::new(&types).assemble(&mut store).unwrap_err();
    assert!(matches!(
        err.for_service("articles").next(),
        Some(WireError::AmbiguousService { candidates, .. }) if candidates == &["mainDb", "tempDb"]
    ));
}

// ===== Error aggregation =====

#[test]
fn test_independent_failures_are_all_reported() {
    let types = database_types();
    let mut store = DefinitionStore::new();
    store.add("articles", ServiceDefinition::of_type("ArticleRepository")).unwrap();
    store
        .add("mailer", ServiceDefinition::of_type("Mailer").with_factory(Statement::new("Mailer").arg(Reference::name("smtp"))))
        .unwrap();
    store.add("clock", ServiceDefinition::of_type("Clock")).unwrap();

    let err = PlanAssembler::new(&types).assemble(&mut store).unwrap_err();
    let services: Vec<&str> = err.iter().map(|e| e.service.as_str()).collect();
    assert_eq!(services, ["articles", "mailer"]);
    assert_eq!(err.for_service("mailer").next(), Some(&WireError::NotFound("smtp".into())));
    assert!(err.to_string().contains("[mailer] Service 'smtp' not found"));
}

#[test]
fn test_failure_is_attributed_to_the_broken_dependency() {
    let types = database_types();
    let mut store = DefinitionStore::new();
    store.add("app", ServiceDefinition::of_type("App").with_factory(Statement::new("App").arg(Reference::name("articles")))).unwrap();
    store.add("articles", ServiceDefinition::of_type("ArticleRepository")).unwrap();
    store
        .add("report", ServiceDefinition::of_type("Report").with_factory(Statement::new("Report").arg(Reference::name("articles"))))
        .unwrap();

    let err = PlanAssembler::new(&types).assemble(&mut store).unwrap_err();
    // reported once, against the definition that is actually broken
    assert_eq!(err.len(), 1);
    assert_eq!(err.errors[0].service, "articles");
    assert!(matches!(err.errors[0].error, WireError::NoServiceFound { .. }));
}

// ===== Determinism =====

#[test]
fn test_assembly_is_idempotent() {
    let types = database_types();
    let mut store = DefinitionStore::new();
    store.add("articles", ServiceDefinition::of_type("ArticleRepository")).unwrap();
    store.add("mainDb", ServiceDefinition::of_type("PDO").with_tag("db", Some(Literal::from("primary")))).unwrap();
    store
        .add(
            "app",
            ServiceDefinition::of_type("App")
                .with_factory(Statement::new("App").arg(Value::tagged("db")))
                .with_setup(Statement::setup("boot")),
        )
        .unwrap();

    let assembler = PlanAssembler::new(&types);
    let first = assembler.assemble(&mut store).unwrap();
    let second = assembler.assemble(&mut store).unwrap();
    assert_eq!(first, second);
    assert_eq!(first.plans.keys().collect::<Vec<_>>(), ["articles", "mainDb", "app"]);
    assert_eq!(first.tags["db"]["mainDb"], Some(Literal::from("primary")));
}

#[test]
fn test_long_dependency_chain_has_no_default_depth_limit() {
    // s0 -> s1 -> ... -> s99
    let mut store = DefinitionStore::new();
    for i in 0..100 {
        let mut factory = Statement::new(format!("C{}", i));
        if i < 99 {
            factory = factory.arg(Reference::name(format!("s{}", i + 1)));
        }
        store.add(format!("s{}", i), ServiceDefinition::of_type(format!("C{}", i)).with_factory(factory)).unwrap();
    }

    let graph = PlanAssembler::new(&TypeRegistry::new()).assemble(&mut store).unwrap();
    assert_eq!(graph.len(), 100);
    assert_eq!(graph.get("s98").unwrap().dependencies(), ["s99"]);
    assert_eq!(AssemblerConfig::default().max_depth, None);
}

#[test]
fn test_imported_services_have_no_factory() {
    let types = database_types();
    let mut store = DefinitionStore::new();
    store.add("db", ServiceDefinition::imported("PDO")).unwrap();
    store.add("articles", ServiceDefinition::of_type("ArticleRepository")).unwrap();

    let graph = PlanAssembler::new(&types).assemble(&mut store).unwrap();
    let db = graph.get("db").unwrap();
    assert!(db.imported);
    assert!(db.factory.is_none());
    assert_eq!(graph.get("articles").unwrap().dependencies(), ["db"]);
}

// ===== Configuration =====

#[test]
fn test_parameters_and_config() {
    let types = TypeRegistry::new();
    let mut store = DefinitionStore::new();
    store
        .add(
            "mailer",
            ServiceDefinition::of_type("Mailer")
                .lazy(true)
                .with_factory(Statement::new("Mailer").arg(Value::parameter("host"))),
        )
        .unwrap();

    let graph = PlanAssembler::new(&types)
        .with_parameters(Parameters::new().with("host", "smtp.local"))
        .with_config(AssemblerConfig::default().with_lazy(false))
        .assemble(&mut store)
        .unwrap();
    let mailer = graph.get("mailer").unwrap();
    assert!(!mailer.lazy);
    assert_eq!(mailer.factory.as_ref().unwrap().arguments, [ResolvedValue::Literal("smtp.local".into())]);
}

// ===== Observers =====

#[derive(Default)]
struct Events(Mutex<Vec<String>>);

impl AssemblyObserver for Events {
    fn resolving(&self, service: &str) {
        self.0.lock().unwrap().push(format!("resolving {}", service));
    }

    fn resolved(&self, service: &str, _elapsed: Duration) {
        self.0.lock().unwrap().push(format!("resolved {}", service));
    }

    fn failed(&self, service: &str, _error: &WireError) {
        self.0.lock().unwrap().push(format!("failed {}", service));
    }
}

#[test]
fn test_observers_see_nested_resolution() {
    let types = database_types();
    let events = Arc::new(Events::default());
    let mut store = DefinitionStore::new();
    store.add("articles", ServiceDefinition::of_type("ArticleRepository")).unwrap();
    store.add("db", ServiceDefinition::of_type("PDO")).unwrap();
    store.add("broken", ServiceDefinition::new()).unwrap();

    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    let result = PlanAssembler::new(&types)
        .with_observer(events.clone())
        .with_observer(Arc::new(TracingObserver::new()))
        .assemble(&mut store);
    assert!(result.is_err());

    let events = events.0.lock().unwrap();
    assert_eq!(*events, ["resolving articles", "resolving db", "resolved db", "resolved articles"]);
}

// ===== Compiler =====

struct Console;

impl Extension for Console {
    fn name(&self) -> &str {
        "console"
    }

    fn load_configuration(&mut self, ctx: &mut ExtensionContext<'_>) -> WireResult<()> {
        ctx.add("app", ServiceDefinition::of_type("Application"))?;
        Ok(())
    }

    fn before_compile(&mut self, ctx: &mut ExtensionContext<'_>) -> WireResult<()> {
        let app = ctx.prefixed("app");
        for name in ctx.names_tagged("console.command") {
            ctx.get_mut(&app)?.add_setup(Statement::setup("add").arg(Value::reference(name)));
        }
        Ok(())
    }
}

#[test]
fn test_compiler_runs_extensions_then_freezes() {
    let types = TypeRegistry::new();
    let mut compiler = Compiler::new(&types);
    compiler.add_definition("hello", ServiceDefinition::of_type("Hello").with_tag("console.command", None)).unwrap();
    compiler.add_definition("bye", ServiceDefinition::of_type("Bye").with_tag("console.command", None)).unwrap();
    compiler.add_extension(Console);

    let graph = compiler.compile().unwrap();
    assert_eq!(graph.get("console.app").unwrap().setup_dependencies(), ["hello", "bye"]);
    assert!(compiler.store().is_frozen());
    assert!(matches!(
        compiler.add_definition("late", ServiceDefinition::of_type("Late")),
        Err(WireError::Frozen { .. })
    ));

    // extensions do not run twice
    let again = compiler.compile().unwrap();
    assert_eq!(again, graph);
}
