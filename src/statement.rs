//! Declarative construct/call statements and their argument values.
//!
//! A [`Statement`] says *what* to invoke and *with which arguments*; it does
//! not say how. The resolver binds its arguments against the target's
//! [`Signature`](crate::Signature), autowires gaps and turns it into a
//! [`ResolvedInvocation`](crate::ResolvedInvocation).

use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::types::{ScalarKind, TypeName};

/// Key of an array entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(untagged))]
pub enum ArrayKey {
    Int(i64),
    Str(String),
}

impl fmt::Display for ArrayKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArrayKey::Int(i) => write!(f, "{}", i),
            ArrayKey::Str(s) => write!(f, "'{}'", s),
        }
    }
}

/// Literal value: a scalar or an array of literals.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Literal {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Array(Vec<(Option<ArrayKey>, Literal)>),
}

impl Literal {
    /// Truthiness used by the negation special form.
    pub fn is_truthy(&self) -> bool {
        match self {
            Literal::Null => false,
            Literal::Bool(b) => *b,
            Literal::Int(i) => *i != 0,
            Literal::Float(f) => *f != 0.0,
            Literal::String(s) => !s.is_empty() && s != "0",
            Literal::Array(items) => !items.is_empty(),
        }
    }

    /// Converts to the given scalar kind, or `None` if not convertible.
    pub fn cast(&self, kind: ScalarKind) -> Option<Literal> {
        let cast = match (kind, self) {
            (ScalarKind::Bool, value) => Literal::Bool(value.is_truthy()),
            (_, Literal::Array(_)) => return None,
            (ScalarKind::Int, Literal::Null) => Literal::Int(0),
            (ScalarKind::Int, Literal::Bool(b)) => Literal::Int(i64::from(*b)),
            (ScalarKind::Int, Literal::Int(i)) => Literal::Int(*i),
            (ScalarKind::Int, Literal::Float(f)) if f.is_finite() => Literal::Int(f.trunc() as i64),
            (ScalarKind::Int, Literal::String(s)) => Literal::Int(s.trim().parse().ok()?),
            (ScalarKind::Float, Literal::Null) => Literal::Float(0.0),
            (ScalarKind::Float, Literal::Bool(b)) => Literal::Float(if *b { 1.0 } else { 0.0 }),
            (ScalarKind::Float, Literal::Int(i)) => Literal::Float(*i as f64),
            (ScalarKind::Float, Literal::Float(f)) => Literal::Float(*f),
            (ScalarKind::Float, Literal::String(s)) => Literal::Float(s.trim().parse().ok()?),
            (ScalarKind::String, Literal::Null) => Literal::String(String::new()),
            (ScalarKind::String, Literal::Bool(b)) => Literal::String(if *b { "1".into() } else { String::new() }),
            (ScalarKind::String, Literal::Int(i)) => Literal::String(i.to_string()),
            (ScalarKind::String, Literal::Float(f)) => Literal::String(f.to_string()),
            (ScalarKind::String, Literal::String(s)) => Literal::String(s.clone()),
            _ => return None,
        };
        Some(cast)
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Null => f.write_str("null"),
            Literal::Bool(b) => write!(f, "{}", b),
            Literal::Int(i) => write!(f, "{}", i),
            Literal::Float(x) => write!(f, "{}", x),
            Literal::String(s) => write!(f, "'{}'", s),
            Literal::Array(items) => {
                f.write_str("[")?;
                for (i, (key, value)) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    if let Some(key) = key {
                        write!(f, "{} => ", key)?;
                    }
                    write!(f, "{}", value)?;
                }
                f.write_str("]")
            }
        }
    }
}

impl From<bool> for Literal {
    fn from(value: bool) -> Self {
        Literal::Bool(value)
    }
}

impl From<i64> for Literal {
    fn from(value: i64) -> Self {
        Literal::Int(value)
    }
}

impl From<i32> for Literal {
    fn from(value: i32) -> Self {
        Literal::Int(i64::from(value))
    }
}

impl From<f64> for Literal {
    fn from(value: f64) -> Self {
        Literal::Float(value)
    }
}

impl From<&str> for Literal {
    fn from(value: &str) -> Self {
        Literal::String(value.to_string())
    }
}

impl From<String> for Literal {
    fn from(value: String) -> Self {
        Literal::String(value)
    }
}

/// Symbolic pointer to a definition.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Reference {
    /// Explicit service name (`@mainDb`)
    Name(String),
    /// Whatever single service autowiring picks for the type (`@PDO`)
    Type(TypeName),
    /// The instance currently being built (`@self`)
    SelfRef,
}

impl Reference {
    pub fn name(name: impl Into<String>) -> Self {
        Reference::Name(name.into())
    }

    pub fn of_type(ty: impl Into<TypeName>) -> Self {
        Reference::Type(ty.into())
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reference::Name(name) => write!(f, "@{}", name),
            Reference::Type(ty) => write!(f, "@{}", ty),
            Reference::SelfRef => f.write_str("@self"),
        }
    }
}

/// Receiver of a method-call entity.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Receiver {
    Reference(Reference),
    Statement(Box<Statement>),
}

/// What a statement invokes.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Entity {
    /// `new Class(...)`
    New(TypeName),
    /// `Class::method(...)`
    Static(TypeName, String),
    /// `function(...)`
    Function(String),
    /// `@service::method(...)` or `(statement)::method(...)`
    Method(Receiver, String),
    /// Setup only: call a method on the instance being built
    SelfMethod(String),
    /// Setup only: assign a property on the instance being built
    SelfProperty(String),
    /// Setup only: append to an array property on the instance being built
    SelfAppend(String),
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Entity::New(class) => write!(f, "{}::__construct()", class),
            Entity::Static(class, method) => write!(f, "{}::{}()", class, method),
            Entity::Function(name) => write!(f, "{}()", name),
            Entity::Method(Receiver::Reference(r), method) => write!(f, "{}::{}()", r, method),
            Entity::Method(Receiver::Statement(s), method) => write!(f, "({})::{}()", s.entity, method),
            Entity::SelfMethod(method) => write!(f, "@self::{}()", method),
            Entity::SelfProperty(property) => write!(f, "@self::${}", property),
            Entity::SelfAppend(property) => write!(f, "@self::${}[]", property),
        }
    }
}

/// A single argument, optionally named.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Argument {
    pub name: Option<String>,
    pub value: Value,
}

/// Argument value before resolution.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Value {
    Literal(Literal),
    /// `%name%` placeholder, looked up in the parameter bag
    Parameter(String),
    /// `_`: fill this slot from the default value or by autowiring
    Omitted,
    Statement(Box<Statement>),
    Reference(Reference),
    Array(Vec<(Option<ArrayKey>, Value)>),
    /// `typed(T)`: every autowirable service of type `T`
    Typed(TypeName),
    /// `tagged(name)`: every service carrying the tag
    Tagged(String),
    /// `(kind) value`
    Cast(ScalarKind, Box<Value>),
    /// `!value`
    Not(Box<Value>),
    /// `Class::NAME` or global `NAME`
    Constant { class: Option<TypeName>, name: String },
}

impl Value {
    pub fn reference(name: impl Into<String>) -> Self {
        Value::Reference(Reference::Name(name.into()))
    }

    pub fn of_type(ty: impl Into<TypeName>) -> Self {
        Value::Reference(Reference::Type(ty.into()))
    }

    pub fn parameter(name: impl Into<String>) -> Self {
        Value::Parameter(name.into())
    }

    pub fn typed(ty: impl Into<TypeName>) -> Self {
        Value::Typed(ty.into())
    }

    pub fn tagged(tag: impl Into<String>) -> Self {
        Value::Tagged(tag.into())
    }
}

macro_rules! literal_values {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Value {
                fn from(value: $ty) -> Self {
                    Value::Literal(value.into())
                }
            }
        )*
    };
}

literal_values!(Literal, bool, i32, i64, f64, &str, String);

impl From<Reference> for Value {
    fn from(reference: Reference) -> Self {
        Value::Reference(reference)
    }
}

impl From<Statement> for Value {
    fn from(statement: Statement) -> Self {
        Value::Statement(Box::new(statement))
    }
}

/// Invocation description: target plus ordered/named arguments.
///
/// # Examples
///
/// ```rust
/// use ferrous_wire::{Statement, Value};
///
/// // ArticleRepository(_, %table%)
/// let stmt = Statement::new("ArticleRepository")
///     .arg(Value::Omitted)
///     .arg(Value::parameter("table"));
/// assert_eq!(stmt.arguments.len(), 2);
/// assert!(!stmt.callable);
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Statement {
    pub entity: Entity,
    pub arguments: Vec<Argument>,
    /// First-class callable: name the target without invoking it
    pub callable: bool,
}

impl Statement {
    /// `new class(...)`
    pub fn new(class: impl Into<TypeName>) -> Self {
        Self::call(Entity::New(class.into()))
    }

    pub fn call(entity: Entity) -> Self {
        Self { entity, arguments: Vec::new(), callable: false }
    }

    pub fn static_call(class: impl Into<TypeName>, method: impl Into<String>) -> Self {
        Self::call(Entity::Static(class.into(), method.into()))
    }

    pub fn function(name: impl Into<String>) -> Self {
        Self::call(Entity::Function(name.into()))
    }

    /// `@reference::method(...)`
    pub fn method(reference: Reference, method: impl Into<String>) -> Self {
        Self::call(Entity::Method(Receiver::Reference(reference), method.into()))
    }

    /// `(statement)::method(...)`
    pub fn chain(self, method: impl Into<String>) -> Self {
        Self::call(Entity::Method(Receiver::Statement(Box::new(self)), method.into()))
    }

    /// Setup: `$self->method(...)`
    pub fn setup(method: impl Into<String>) -> Self {
        Self::call(Entity::SelfMethod(method.into()))
    }

    /// Setup: `$self->property = value`
    pub fn set_property(property: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::call(Entity::SelfProperty(property.into())).arg(value)
    }

    /// Setup: `$self->property[] = value`
    pub fn append_property(property: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::call(Entity::SelfAppend(property.into())).arg(value)
    }

    /// Positional argument.
    pub fn arg(mut self, value: impl Into<Value>) -> Self {
        self.arguments.push(Argument { name: None, value: value.into() });
        self
    }

    /// Named argument.
    pub fn named(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.arguments.push(Argument { name: Some(name.into()), value: value.into() });
        self
    }

    /// Turns the statement into a first-class callable (`target(...)`).
    pub fn as_callable(mut self) -> Self {
        self.callable = true;
        self
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.entity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn casts_follow_scalar_rules() {
        assert_eq!(Literal::from("42").cast(ScalarKind::Int), Some(Literal::Int(42)));
        assert_eq!(Literal::from("nope").cast(ScalarKind::Int), None);
        assert_eq!(Literal::Int(0).cast(ScalarKind::Bool), Some(Literal::Bool(false)));
        assert_eq!(Literal::Array(vec![]).cast(ScalarKind::String), None);
        assert_eq!(Literal::Bool(true).cast(ScalarKind::String), Some(Literal::String("1".into())));
    }

    #[test]
    fn string_zero_is_falsy() {
        assert!(!Literal::from("0").is_truthy());
        assert!(Literal::from("00").is_truthy());
    }

    #[test]
    fn entity_display_names_the_target() {
        let stmt = Statement::method(Reference::name("db"), "prepare");
        assert_eq!(stmt.to_string(), "@db::prepare()");
        assert_eq!(Statement::new("Foo").chain("bar").to_string(), "(Foo::__construct())::bar()");
    }
}
