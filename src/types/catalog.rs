//! The subtype-compatibility predicate and the in-memory catalog behind it.

use super::{ClassInfo, Method, ParamType, Signature, TypeName};
use crate::internal::{Map, Set};
use crate::statement::Literal;

/// Source of type information for resolution.
///
/// Implementors only provide lookups; the provided methods derive ancestry,
/// compatibility and member lookup from them. Unknown names are treated as
/// leaf types with no parents: a type is always compatible with itself.
pub trait TypeCatalog {
    /// Looks up a class or interface.
    fn class(&self, name: &TypeName) -> Option<&ClassInfo>;

    /// Looks up a free function.
    fn function(&self, name: &str) -> Option<&Signature>;

    /// Looks up a global constant.
    fn constant(&self, _name: &str) -> Option<&Literal> {
        None
    }

    /// The type itself followed by all of its transitive parents, breadth first,
    /// each listed once.
    fn ancestors(&self, name: &TypeName) -> Vec<TypeName> {
        let mut seen: Set<TypeName> = Set::default();
        let mut order = Vec::new();
        let mut queue = std::collections::VecDeque::from([name.clone()]);
        while let Some(current) = queue.pop_front() {
            if !seen.insert(current.clone()) {
                continue;
            }
            if let Some(info) = self.class(&current) {
                queue.extend(info.parents.iter().cloned());
            }
            order.push(current);
        }
        order
    }

    /// `true` if `ty` is `required` or a subtype of it.
    fn is_compatible(&self, ty: &TypeName, required: &TypeName) -> bool {
        ty == required || self.ancestors(ty).iter().any(|a| a == required)
    }

    /// Finds a method on the class or the nearest ancestor declaring it.
    fn method(&self, class: &TypeName, name: &str) -> Option<&Method> {
        self.ancestors(class)
            .iter()
            .find_map(|a| self.class(a).and_then(|info| info.methods.get(name)))
    }

    /// Finds a property on the class or the nearest ancestor declaring it.
    fn property(&self, class: &TypeName, name: &str) -> Option<&ParamType> {
        self.ancestors(class)
            .iter()
            .find_map(|a| self.class(a).and_then(|info| info.properties.get(name)))
    }

    /// Finds a class constant, searching ancestors.
    fn class_constant(&self, class: &TypeName, name: &str) -> Option<&Literal> {
        self.ancestors(class)
            .iter()
            .find_map(|a| self.class(a).and_then(|info| info.constants.get(name)))
    }
}

/// In-memory [`TypeCatalog`].
///
/// # Examples
///
/// ```rust
/// use ferrous_wire::{ClassInfo, TypeCatalog, TypeName, TypeRegistry};
///
/// let mut types = TypeRegistry::new();
/// types.add_class(ClassInfo::interface("Logger"));
/// types.add_class(ClassInfo::class("FileLogger").implements("Logger"));
///
/// assert!(types.is_compatible(&TypeName::from("FileLogger"), &TypeName::from("Logger")));
/// assert!(!types.is_compatible(&TypeName::from("Logger"), &TypeName::from("FileLogger")));
/// ```
#[derive(Debug, Default)]
pub struct TypeRegistry {
    classes: Map<TypeName, ClassInfo>,
    functions: Map<String, Signature>,
    constants: Map<String, Literal>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a class.
    pub fn add_class(&mut self, class: ClassInfo) -> &mut Self {
        self.classes.insert(class.name.clone(), class);
        self
    }

    pub fn add_function(&mut self, name: impl Into<String>, signature: Signature) -> &mut Self {
        self.functions.insert(name.into(), signature);
        self
    }

    pub fn add_constant(&mut self, name: impl Into<String>, value: impl Into<Literal>) -> &mut Self {
        self.constants.insert(name.into(), value.into());
        self
    }

    /// Builder-style variant of [`TypeRegistry::add_class`].
    pub fn with_class(mut self, class: ClassInfo) -> Self {
        self.add_class(class);
        self
    }

    pub fn with_function(mut self, name: impl Into<String>, signature: Signature) -> Self {
        self.add_function(name, signature);
        self
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}

impl TypeCatalog for TypeRegistry {
    fn class(&self, name: &TypeName) -> Option<&ClassInfo> {
        self.classes.get(name)
    }

    fn function(&self, name: &str) -> Option<&Signature> {
        self.functions.get(name)
    }

    fn constant(&self, name: &str) -> Option<&Literal> {
        self.constants.get(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> TypeRegistry {
        TypeRegistry::new()
            .with_class(ClassInfo::interface("Reader"))
            .with_class(ClassInfo::interface("Writer"))
            .with_class(ClassInfo::abstract_class("Stream").implements("Reader").implements("Writer"))
            .with_class(ClassInfo::class("FileStream").extends("Stream"))
    }

    #[test]
    fn ancestors_are_breadth_first_and_unique() {
        let types = registry();
        let names: Vec<_> = types
            .ancestors(&TypeName::from("FileStream"))
            .into_iter()
            .map(|t| t.to_string())
            .collect();
        assert_eq!(names, ["FileStream", "Stream", "Reader", "Writer"]);
    }

    #[test]
    fn unknown_types_are_only_compatible_with_themselves() {
        let types = registry();
        let ghost = TypeName::from("Ghost");
        assert!(types.is_compatible(&ghost, &ghost));
        assert!(!types.is_compatible(&ghost, &TypeName::from("Reader")));
    }

    #[test]
    fn parent_cycles_terminate() {
        let types = TypeRegistry::new()
            .with_class(ClassInfo::interface("A").extends("B"))
            .with_class(ClassInfo::interface("B").extends("A"));
        assert_eq!(types.ancestors(&TypeName::from("A")).len(), 2);
    }

    #[test]
    fn methods_are_inherited() {
        let types = TypeRegistry::new()
            .with_class(ClassInfo::class("Base").method("close", Signature::new()))
            .with_class(ClassInfo::class("Child").extends("Base"));
        assert!(types.method(&TypeName::from("Child"), "close").is_some());
        assert!(types.method(&TypeName::from("Child"), "open").is_none());
    }
}
