use ferrous_wire::{
    Autowired, ClassInfo, ConstructionGraph, DefinitionStore, Parameter, PlanAssembler, Reference, ResolvedValue,
    ServiceDefinition, Signature, Site, Statement, TypeName, TypeRegistry, Value, WireError,
};

// Logger <- BaseLogger <- FileLogger, Logger <- NullLogger
fn loggers() -> TypeRegistry {
    TypeRegistry::new()
        .with_class(ClassInfo::interface("Logger"))
        .with_class(ClassInfo::abstract_class("BaseLogger").implements("Logger"))
        .with_class(ClassInfo::class("FileLogger").extends("BaseLogger"))
        .with_class(ClassInfo::class("RotatingLogger").extends("FileLogger"))
        .with_class(ClassInfo::class("NullLogger").implements("Logger"))
        .with_class(ClassInfo::class("Mailer").constructor(Signature::new().param(Parameter::class("logger", "Logger"))))
}

fn assemble(store: &mut DefinitionStore, types: &TypeRegistry) -> ConstructionGraph {
    PlanAssembler::new(types).assemble(store).unwrap()
}

#[test]
fn test_single_candidate_is_injected() {
    let types = loggers();
    let mut store = DefinitionStore::new();
    store.add("log", ServiceDefinition::of_type("FileLogger")).unwrap();
    store.add("mailer", ServiceDefinition::of_type("Mailer")).unwrap();

    let graph = assemble(&mut store, &types);
    let factory = graph.get("mailer").unwrap().factory.as_ref().unwrap();
    assert_eq!(factory.arguments, [ResolvedValue::Service("log".into())]);
    assert_eq!(graph.autowire(&"BaseLogger".into()).unwrap(), "log");
}

#[test]
fn test_ambiguity_names_every_candidate_and_the_requester() {
    let types = loggers();
    let mut store = DefinitionStore::new();
    store.add("file", ServiceDefinition::of_type("FileLogger")).unwrap();
    store.add("null", ServiceDefinition::of_type("NullLogger")).unwrap();
    store.add("mailer", ServiceDefinition::of_type("Mailer")).unwrap();

    let err = PlanAssembler::new(&types).assemble(&mut store).unwrap_err();
    assert_eq!(err.len(), 1);
    assert_eq!(err.errors[0].service, "mailer");
    assert_eq!(
        err.errors[0].error,
        WireError::AmbiguousService {
            required: "Logger".into(),
            candidates: vec!["file".into(), "null".into()],
            site: Site::service("mailer").with_argument("$logger"),
        }
    );
    assert!(err.to_string().contains("Multiple services of type Logger found: file, null"));
}

#[test]
fn test_missing_candidate_is_reported() {
    let types = loggers();
    let mut store = DefinitionStore::new();
    store.add("mailer", ServiceDefinition::of_type("Mailer")).unwrap();

    let err = PlanAssembler::new(&types).assemble(&mut store).unwrap_err();
    assert_eq!(
        err.errors[0].error.to_string(),
        "Service of type Logger not found (required by service 'mailer', argument $logger)"
    );
}

#[test]
fn test_preference_breaks_ties() {
    let types = loggers();
    let mut store = DefinitionStore::new();
    store.add("file", ServiceDefinition::of_type("FileLogger")).unwrap();
    store.add("null", ServiceDefinition::of_type("NullLogger").preferred_for("Logger")).unwrap();
    store.add("mailer", ServiceDefinition::of_type("Mailer")).unwrap();

    let graph = assemble(&mut store, &types);
    let factory = graph.get("mailer").unwrap().factory.as_ref().unwrap();
    assert_eq!(factory.arguments, [ResolvedValue::Service("null".into())]);
    assert_eq!(graph.wiring[&TypeName::from("Logger")].preferred.as_deref(), Some("null"));
}

#[test]
fn test_two_preferred_candidates_are_still_ambiguous() {
    let types = loggers();
    let mut store = DefinitionStore::new();
    store.add("file", ServiceDefinition::of_type("FileLogger").preferred_for("Logger")).unwrap();
    store.add("null", ServiceDefinition::of_type("NullLogger").preferred_for("Logger")).unwrap();

    let graph = assemble(&mut store, &types);
    assert!(matches!(
        graph.autowire(&"Logger".into()),
        Err(WireError::AmbiguousService { candidates, .. }) if candidates == ["file", "null"]
    ));
}

#[test]
fn test_disabled_definitions_are_only_reachable_by_name() {
    let types = loggers();
    let mut store = DefinitionStore::new();
    store.add("null", ServiceDefinition::of_type("NullLogger").with_autowired(Autowired::Disabled)).unwrap();
    store
        .add(
            "mailer",
            ServiceDefinition::of_type("Mailer").with_factory(Statement::new("Mailer").arg(Reference::name("null"))),
        )
        .unwrap();

    let graph = assemble(&mut store, &types);
    assert!(graph.candidates_for(&"NullLogger".into()).is_empty());
    assert_eq!(
        graph.get("mailer").unwrap().factory.as_ref().unwrap().arguments,
        [ResolvedValue::Service("null".into())]
    );
}

#[test]
fn test_narrowing_limits_candidacy() {
    let types = loggers();
    let mut store = DefinitionStore::new();
    store.add("rotating", ServiceDefinition::of_type("RotatingLogger").autowired_as(["BaseLogger"])).unwrap();

    let graph = assemble(&mut store, &types);
    // the narrowed type and its subtypes down to the service type
    assert_eq!(graph.candidates_for(&"BaseLogger".into()), ["rotating".to_string()]);
    assert_eq!(graph.candidates_for(&"FileLogger".into()), ["rotating".to_string()]);
    assert_eq!(graph.candidates_for(&"RotatingLogger".into()), ["rotating".to_string()]);
    // never the supertype
    assert!(graph.candidates_for(&"Logger".into()).is_empty());
}

#[test]
fn test_narrowing_to_an_unrelated_type_is_rejected() {
    let types = loggers();
    let mut store = DefinitionStore::new();
    store.add("file", ServiceDefinition::of_type("FileLogger").autowired_as(["NullLogger"])).unwrap();

    let err = PlanAssembler::new(&types).assemble(&mut store).unwrap_err();
    assert_eq!(
        err.errors[0].error,
        WireError::IncompatibleNarrowing {
            service: "file".into(),
            ty: "FileLogger".into(),
            narrowed: "NullLogger".into(),
        }
    );
}

#[test]
fn test_preferred_for_a_narrowed_away_type_is_a_build_error() {
    let types = loggers();
    let mut store = DefinitionStore::new();
    store
        .add(
            "file",
            ServiceDefinition::of_type("FileLogger").autowired_as(["BaseLogger"]).preferred_for("Logger"),
        )
        .unwrap();

    let err = PlanAssembler::new(&types).assemble(&mut store).unwrap_err();
    assert_eq!(
        err.errors[0].error,
        WireError::ConflictingAutowiring { service: "file".into(), ty: "Logger".into() }
    );
}

#[test]
fn test_typed_collection_in_store_order() {
    let types = loggers();
    let mut store = DefinitionStore::new();
    store.add("null", ServiceDefinition::of_type("NullLogger")).unwrap();
    store.add("file", ServiceDefinition::of_type("FileLogger")).unwrap();
    store.add("off", ServiceDefinition::of_type("FileLogger").with_autowired(Autowired::Disabled)).unwrap();
    store
        .add(
            "chain",
            ServiceDefinition::of_type("Chain")
                .with_factory(Statement::new("Chain").arg(Value::typed("Logger")).arg(Value::typed("Mailer"))),
        )
        .unwrap();

    let graph = assemble(&mut store, &types);
    let arguments = &graph.get("chain").unwrap().factory.as_ref().unwrap().arguments;
    assert_eq!(
        arguments[0],
        ResolvedValue::Array(vec![
            (None, ResolvedValue::Service("null".into())),
            (None, ResolvedValue::Service("file".into())),
        ])
    );
    // zero matches is an empty list, not an error
    assert_eq!(arguments[1], ResolvedValue::Array(vec![]));
}

#[test]
fn test_list_parameter_excludes_the_requesting_service() {
    let types = loggers().with_class(
        ClassInfo::class("CompositeLogger")
            .implements("Logger")
            .constructor(Signature::new().param(Parameter::list("loggers", "Logger"))),
    );
    let mut store = DefinitionStore::new();
    store.add("file", ServiceDefinition::of_type("FileLogger")).unwrap();
    store.add("all", ServiceDefinition::of_type("CompositeLogger")).unwrap();
    store.add("null", ServiceDefinition::of_type("NullLogger")).unwrap();

    let graph = assemble(&mut store, &types);
    assert_eq!(
        graph.get("all").unwrap().factory.as_ref().unwrap().arguments,
        [ResolvedValue::Array(vec![
            (None, ResolvedValue::Service("file".into())),
            (None, ResolvedValue::Service("null".into())),
        ])]
    );
}

#[test]
fn test_type_reference_uses_autowiring() {
    let types = loggers();
    let mut store = DefinitionStore::new();
    store.add("file", ServiceDefinition::of_type("FileLogger")).unwrap();
    store
        .add(
            "app",
            ServiceDefinition::of_type("App").with_factory(Statement::new("App").arg(Reference::of_type("Logger"))),
        )
        .unwrap();

    let graph = assemble(&mut store, &types);
    assert_eq!(
        graph.get("app").unwrap().factory.as_ref().unwrap().arguments,
        [ResolvedValue::Service("file".into())]
    );
}
