//! Error types for definition building and plan assembly.

use std::fmt;

use crate::types::TypeName;

/// Where in the graph a dependency was requested.
///
/// Rendered as a suffix of autowiring and binding errors, e.g.
/// ` (required by service 'articles', argument $db)`. Renders as nothing when
/// no service is known.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Site {
    /// Definition being resolved when the request was made
    pub service: Option<String>,
    /// Argument name (`$db`) or position (`#1`) being filled
    pub argument: Option<String>,
}

impl Site {
    pub fn service(name: impl Into<String>) -> Self {
        Self { service: Some(name.into()), argument: None }
    }

    pub fn with_argument(mut self, argument: impl Into<String>) -> Self {
        self.argument = Some(argument.into());
        self
    }
}

impl fmt::Display for Site {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.service, &self.argument) {
            (Some(service), Some(argument)) => {
                write!(f, " (required by service '{}', argument {})", service, argument)
            }
            (Some(service), None) => write!(f, " (required by service '{}')", service),
            (None, Some(argument)) => write!(f, " (argument {})", argument),
            (None, None) => Ok(()),
        }
    }
}

/// Build-time wiring errors.
///
/// Every misconfiguration surfaces as one of these; nothing is silently
/// recovered.
///
/// # Examples
///
/// ```rust
/// use ferrous_wire::{Site, TypeName, WireError};
///
/// let err = WireError::AmbiguousService {
///     required: TypeName::from("PDO"),
///     candidates: vec!["mainDb".into(), "tempDb".into()],
///     site: Site::service("articles").with_argument("$db"),
/// };
/// assert_eq!(
///     err.to_string(),
///     "Multiple services of type PDO found: mainDb, tempDb (required by service 'articles', argument $db)"
/// );
/// ```
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum WireError {
    /// A definition with this name already exists
    #[error("Service '{0}' already exists")]
    DuplicateName(String),

    /// No definition with this name
    #[error("Service '{0}' not found")]
    NotFound(String),

    /// The store is frozen; definitions can no longer change
    #[error("Cannot {operation} service '{service}': definitions are frozen")]
    Frozen { operation: &'static str, service: String },

    /// Autowiring found no candidate for a required type
    #[error("Service of type {required} not found{site}")]
    NoServiceFound { required: TypeName, site: Site },

    /// Autowiring found several candidates and no single preferred one
    #[error("Multiple services of type {required} found: {}{site}", .candidates.join(", "))]
    AmbiguousService { required: TypeName, candidates: Vec<String>, site: Site },

    /// A parameter could not be filled
    #[error("Parameter ${parameter} in {target} has no value and cannot be autowired{site}")]
    MissingArgument { target: String, parameter: String, site: Site },

    /// An argument does not correspond to any parameter
    #[error("Unknown argument {argument} passed to {target}{site}")]
    UnknownArgument { target: String, argument: String, site: Site },

    /// Two arguments bind the same parameter
    #[error("Argument ${parameter} of {target} is supplied more than once{site}")]
    DuplicateArgument { target: String, parameter: String, site: Site },

    /// Malformed or out-of-context reference
    #[error("Invalid reference: {0}")]
    InvalidReference(String),

    /// A definition depends on itself, directly or transitively
    #[error("Circular dependency: {}", .0.join(" -> "))]
    CircularDependency(Vec<String>),

    /// Neither the declared type nor the factory determine the service type
    #[error("Type of service '{0}' cannot be determined")]
    UnresolvedType(String),

    /// Unknown class, method, function or property
    #[error("Unknown target {target}{site}")]
    UnknownTarget { target: String, site: Site },

    /// `new` on an interface or abstract class
    #[error("Class {class} cannot be instantiated{site}")]
    NotInstantiable { class: TypeName, site: Site },

    /// A value's type is incompatible with what is expected
    #[error("Expected {expected}, got {found}{site}")]
    TypeMismatch { expected: TypeName, found: TypeName, site: Site },

    /// A cast or negation received a value it cannot convert
    #[error("Value {value} cannot be cast to {to}")]
    NotCastable { value: String, to: String },

    /// A parameter placeholder names no configured parameter
    #[error("Missing parameter '%{0}%'")]
    MissingParameter(String),

    /// A constant special form names no known constant
    #[error("Unknown constant {0}")]
    UnknownConstant(String),

    /// A narrowed autowiring type is not an ancestor of the service type
    #[error("Service '{service}' of type {ty} cannot be autowired as {narrowed}")]
    IncompatibleNarrowing { service: String, ty: TypeName, narrowed: TypeName },

    /// Preference contradicts the definition's own autowiring settings
    #[error("Service '{service}' is preferred for {ty} but is not autowirable as {ty}")]
    ConflictingAutowiring { service: String, ty: TypeName },

    /// A statement is used where its form is not allowed
    #[error("Invalid statement: {0}")]
    InvalidStatement(String),

    /// Resolution nested deeper than the configured limit
    #[error("Max depth {0} exceeded")]
    DepthExceeded(usize),

    /// Runtime backend failure while executing a plan
    #[error("Backend failed while creating service '{service}': {message}")]
    Backend { service: String, message: String },
}

impl WireError {
    /// Fills in the requesting service if the error has a site without one.
    pub(crate) fn at_site(mut self, site: &Site) -> Self {
        match &mut self {
            WireError::NoServiceFound { site: s, .. }
            | WireError::AmbiguousService { site: s, .. }
            | WireError::MissingArgument { site: s, .. }
            | WireError::UnknownArgument { site: s, .. }
            | WireError::DuplicateArgument { site: s, .. }
            | WireError::UnknownTarget { site: s, .. }
            | WireError::NotInstantiable { site: s, .. }
            | WireError::TypeMismatch { site: s, .. } => {
                if s.service.is_none() {
                    s.service = site.service.clone();
                }
                if s.argument.is_none() {
                    s.argument = site.argument.clone();
                }
            }
            _ => {}
        }
        self
    }
}

/// Result type for wiring operations.
pub type WireResult<T> = Result<T, WireError>;

/// An error attributed to the definition whose resolution surfaced it.
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceError {
    pub service: String,
    pub error: WireError,
}

impl fmt::Display for ServiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.service, self.error)
    }
}

/// Assembly failed; carries every error found across all definitions.
///
/// # Examples
///
/// ```rust
/// use ferrous_wire::{AssemblyError, ServiceError, WireError};
///
/// let err = AssemblyError::new(vec![
///     ServiceError { service: "a".into(), error: WireError::NotFound("x".into()) },
///     ServiceError { service: "b".into(), error: WireError::NotFound("y".into()) },
/// ]);
/// assert_eq!(err.len(), 2);
/// assert!(err.to_string().starts_with("2 service definition(s) failed"));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct AssemblyError {
    pub errors: Vec<ServiceError>,
}

impl AssemblyError {
    pub fn new(errors: Vec<ServiceError>) -> Self {
        Self { errors }
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Errors reported for a given definition.
    pub fn for_service<'a>(&'a self, service: &'a str) -> impl Iterator<Item = &'a WireError> + 'a {
        self.errors.iter().filter(move |e| e.service == service).map(|e| &e.error)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ServiceError> {
        self.errors.iter()
    }
}

impl fmt::Display for AssemblyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} service definition(s) failed to resolve:", self.errors.len())?;
        for error in &self.errors {
            write!(f, "\n  - {}", error)?;
        }
        Ok(())
    }
}

impl std::error::Error for AssemblyError {}

impl From<ServiceError> for AssemblyError {
    fn from(error: ServiceError) -> Self {
        Self { errors: vec![error] }
    }
}
