//! Class and callable signatures.

use indexmap::IndexMap;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::TypeName;
use crate::statement::Literal;

/// What sort of type a [`ClassInfo`] describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ClassKind {
    /// Concrete, instantiable class
    #[default]
    Class,
    /// Abstract class; cannot be the target of `new`
    Abstract,
    /// Interface; cannot be the target of `new`
    Interface,
}

/// Builtin scalar kinds, used for parameter types and casts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ScalarKind {
    Bool,
    Int,
    Float,
    String,
}

/// Declared type of a parameter or return value.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ParamType {
    /// A class or interface; autowirable
    Class(TypeName),
    /// A sequence of services of the given type; autowired as a collection
    List(TypeName),
    /// A builtin scalar
    Scalar(ScalarKind),
    /// Untyped array
    Array,
    Callable,
    /// No declared type
    Mixed,
}

impl ParamType {
    pub fn class(name: impl Into<TypeName>) -> Self {
        ParamType::Class(name.into())
    }

    pub fn list(name: impl Into<TypeName>) -> Self {
        ParamType::List(name.into())
    }

    /// The class this type names, if any.
    pub fn as_class(&self) -> Option<&TypeName> {
        match self {
            ParamType::Class(name) => Some(name),
            _ => None,
        }
    }
}

/// A single formal parameter.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Parameter {
    pub name: String,
    pub ty: ParamType,
    pub default: Option<Literal>,
    pub nullable: bool,
    pub variadic: bool,
}

impl Parameter {
    pub fn new(name: impl Into<String>, ty: ParamType) -> Self {
        Self {
            name: name.into(),
            ty,
            default: None,
            nullable: false,
            variadic: false,
        }
    }

    /// Parameter typed as a class or interface.
    pub fn class(name: impl Into<String>, class: impl Into<TypeName>) -> Self {
        Self::new(name, ParamType::Class(class.into()))
    }

    /// Parameter typed as a list of services.
    pub fn list(name: impl Into<String>, class: impl Into<TypeName>) -> Self {
        Self::new(name, ParamType::List(class.into()))
    }

    pub fn scalar(name: impl Into<String>, kind: ScalarKind) -> Self {
        Self::new(name, ParamType::Scalar(kind))
    }

    pub fn with_default(mut self, value: impl Into<Literal>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    pub fn variadic(mut self) -> Self {
        self.variadic = true;
        self
    }
}

/// Parameter list and return type of a callable.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Signature {
    pub params: Vec<Parameter>,
    pub returns: Option<ParamType>,
}

impl Signature {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn param(mut self, param: Parameter) -> Self {
        self.params.push(param);
        self
    }

    pub fn returns(mut self, ty: ParamType) -> Self {
        self.returns = Some(ty);
        self
    }

    /// Return type when it names a class.
    pub fn return_class(&self) -> Option<&TypeName> {
        self.returns.as_ref().and_then(ParamType::as_class)
    }

    pub(crate) fn position_of(&self, name: &str) -> Option<usize> {
        self.params.iter().position(|p| p.name == name)
    }
}

/// A method declared on a class.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Method {
    pub signature: Signature,
    pub is_static: bool,
}

/// Everything the resolver needs to know about one class or interface.
///
/// # Examples
///
/// ```rust
/// use ferrous_wire::{ClassInfo, Parameter, Signature, ParamType};
///
/// let repo = ClassInfo::class("ArticleRepository")
///     .implements("Repository")
///     .constructor(Signature::new().param(Parameter::class("db", "PDO")))
///     .method("find", Signature::new().returns(ParamType::class("Article")));
///
/// assert_eq!(repo.parents.len(), 1);
/// assert!(repo.methods.contains_key("find"));
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ClassInfo {
    pub name: TypeName,
    pub kind: ClassKind,
    /// Direct parent class and implemented interfaces
    pub parents: Vec<TypeName>,
    pub constructor: Option<Signature>,
    pub methods: IndexMap<String, Method>,
    pub properties: IndexMap<String, ParamType>,
    pub constants: IndexMap<String, Literal>,
}

impl ClassInfo {
    fn with_kind(name: impl Into<TypeName>, kind: ClassKind) -> Self {
        Self {
            name: name.into(),
            kind,
            parents: Vec::new(),
            constructor: None,
            methods: IndexMap::new(),
            properties: IndexMap::new(),
            constants: IndexMap::new(),
        }
    }

    pub fn class(name: impl Into<TypeName>) -> Self {
        Self::with_kind(name, ClassKind::Class)
    }

    pub fn abstract_class(name: impl Into<TypeName>) -> Self {
        Self::with_kind(name, ClassKind::Abstract)
    }

    pub fn interface(name: impl Into<TypeName>) -> Self {
        Self::with_kind(name, ClassKind::Interface)
    }

    pub fn extends(mut self, parent: impl Into<TypeName>) -> Self {
        self.parents.push(parent.into());
        self
    }

    pub fn implements(self, interface: impl Into<TypeName>) -> Self {
        self.extends(interface)
    }

    pub fn constructor(mut self, signature: Signature) -> Self {
        self.constructor = Some(signature);
        self
    }

    pub fn method(mut self, name: impl Into<String>, signature: Signature) -> Self {
        self.methods.insert(name.into(), Method { signature, is_static: false });
        self
    }

    pub fn static_method(mut self, name: impl Into<String>, signature: Signature) -> Self {
        self.methods.insert(name.into(), Method { signature, is_static: true });
        self
    }

    pub fn property(mut self, name: impl Into<String>, ty: ParamType) -> Self {
        self.properties.insert(name.into(), ty);
        self
    }

    pub fn constant(mut self, name: impl Into<String>, value: impl Into<Literal>) -> Self {
        self.constants.insert(name.into(), value.into());
        self
    }

    pub fn is_instantiable(&self) -> bool {
        self.kind == ClassKind::Class
    }
}
