use std::cell::RefCell;
use std::rc::Rc;

use ferrous_wire::{
    ArrayKey, Backend, CallTarget, ClassInfo, Container, DefinitionStore, Literal, ParamType, Parameter, PlanAssembler,
    Reference, ServiceDefinition, Signature, Statement, TypeName, TypeRegistry, Value, WireError,
};

/// A toy object model: every constructed value is a shared node.
#[derive(Debug)]
enum Node {
    Scalar(String),
    List(Vec<Object>),
    Instance { class: String, args: Vec<Object>, props: RefCell<Vec<(String, Object)>> },
    Proxy(String),
}

type Object = Rc<Node>;

#[derive(Default)]
struct Objects {
    constructed: Vec<String>,
}

impl Backend for Objects {
    type Value = Object;
    type Error = String;

    fn literal(&mut self, literal: &Literal) -> Result<Object, String> {
        Ok(Rc::new(Node::Scalar(literal.to_string())))
    }

    fn array(&mut self, items: Vec<(Option<ArrayKey>, Object)>) -> Result<Object, String> {
        Ok(Rc::new(Node::List(items.into_iter().map(|(_, v)| v).collect())))
    }

    fn invoke(&mut self, target: CallTarget<'_, Object>, args: Vec<Object>) -> Result<Object, String> {
        match target {
            CallTarget::New(class) => {
                self.constructed.push(class.to_string());
                Ok(Rc::new(Node::Instance {
                    class: class.to_string(),
                    args,
                    props: RefCell::new(Vec::new()),
                }))
            }
            CallTarget::SetProperty { receiver, property } | CallTarget::AppendProperty { receiver, property } => {
                match &*receiver {
                    Node::Instance { props, .. } => {
                        props.borrow_mut().push((property.to_string(), args[0].clone()));
                        Ok(receiver.clone())
                    }
                    other => Err(format!("cannot set {} on {:?}", property, other)),
                }
            }
            CallTarget::Function(name) if name == "fail" => Err("boom".into()),
            other => Err(format!("unsupported call {:?}", other)),
        }
    }

    fn callable(&mut self, target: CallTarget<'_, Object>) -> Result<Object, String> {
        Ok(Rc::new(Node::Scalar(format!("{:?}", target))))
    }

    fn lazy(&mut self, service: &str, _ty: &TypeName) -> Result<Object, String> {
        Ok(Rc::new(Node::Proxy(service.to_string())))
    }
}

fn types() -> TypeRegistry {
    TypeRegistry::new()
        .with_class(ClassInfo::class("PDO"))
        .with_class(ClassInfo::class("Transport"))
        .with_class(
            ClassInfo::class("ArticleRepository").constructor(Signature::new().param(Parameter::class("db", "PDO"))),
        )
        .with_class(
            ClassInfo::class("Mailer")
                .property("transport", ParamType::class("Transport"))
                .property("tags", ParamType::Array),
        )
}

fn container(store: &mut DefinitionStore) -> Container<Objects> {
    let graph = PlanAssembler::new(&types()).assemble(store).unwrap();
    Container::new(graph, Objects::default())
}

fn args(object: &Object) -> &[Object] {
    match &**object {
        Node::Instance { args, .. } => args,
        other => panic!("not an instance: {:?}", other),
    }
}

#[test]
fn test_services_are_created_once() {
    let mut store = DefinitionStore::new();
    store.add("db", ServiceDefinition::of_type("PDO")).unwrap();
    store.add("articles", ServiceDefinition::of_type("ArticleRepository")).unwrap();
    store
        .add(
            "report",
            ServiceDefinition::of_type("Report").with_factory(Statement::new("Report").arg(Reference::name("db"))),
        )
        .unwrap();
    let container = container(&mut store);

    let articles = container.get("articles").unwrap();
    let report = container.get("report").unwrap();
    assert!(Rc::ptr_eq(&args(&articles)[0], &args(&report)[0]));
    assert!(Rc::ptr_eq(&articles, &container.get("articles").unwrap()));
    assert!(container.is_created("db"));
    assert_eq!(container.backend().constructed, ["PDO", "ArticleRepository", "Report"]);
}

#[test]
fn test_setup_mutates_the_created_instance() {
    let mut store = DefinitionStore::new();
    store.add("smtp", ServiceDefinition::of_type("Transport")).unwrap();
    store
        .add(
            "mailer",
            ServiceDefinition::of_type("Mailer")
                .with_setup(Statement::set_property("transport", Value::Omitted))
                .with_setup(Statement::append_property("tags", "mail")),
        )
        .unwrap();
    let container = container(&mut store);

    let mailer = container.get("mailer").unwrap();
    let smtp = container.get("smtp").unwrap();
    match &*mailer {
        Node::Instance { props, .. } => {
            let props = props.borrow();
            assert_eq!(props[0].0, "transport");
            assert!(Rc::ptr_eq(&props[0].1, &smtp));
            assert_eq!(props[1].0, "tags");
        }
        other => panic!("not an instance: {:?}", other),
    }
}

#[test]
fn test_lazy_services_defer_construction() {
    let mut store = DefinitionStore::new();
    store.add("db", ServiceDefinition::of_type("PDO").lazy(true)).unwrap();
    store.add("articles", ServiceDefinition::of_type("ArticleRepository")).unwrap();
    let container = container(&mut store);

    let articles = container.get("articles").unwrap();
    assert!(matches!(&*args(&articles)[0], Node::Proxy(name) if name == "db"));
    assert!(!container.is_created("db"));

    let db = container.materialize("db").unwrap();
    assert!(matches!(&*db, Node::Instance { class, .. } if class == "PDO"));
    assert!(Rc::ptr_eq(&db, &container.get("db").unwrap()));
}

#[test]
fn test_lookup_by_type_follows_preference() {
    let mut store = DefinitionStore::new();
    store.add("mainDb", ServiceDefinition::of_type("PDO").preferred_for("PDO")).unwrap();
    store.add("tempDb", ServiceDefinition::of_type("PDO")).unwrap();
    let container = container(&mut store);

    let db = container.get_by_type(&TypeName::from("PDO")).unwrap();
    assert!(Rc::ptr_eq(&db, &container.get("mainDb").unwrap()));
    assert!(!container.is_created("tempDb"));
    assert!(matches!(
        container.get_by_type(&TypeName::from("Mailer")),
        Err(WireError::NoServiceFound { .. })
    ));
}

#[test]
fn test_backend_errors_name_the_service() {
    let mut store = DefinitionStore::new();
    store
        .add("broken", ServiceDefinition::of_type("Broken").with_factory(Statement::function("fail")))
        .unwrap();
    let container = container(&mut store);

    assert_eq!(
        container.get("broken").unwrap_err(),
        WireError::Backend { service: "broken".into(), message: "boom".into() }
    );
    assert!(!container.is_created("broken"));
}
