use std::fmt;

use crate::statement::{ArrayKey, Literal};
use crate::types::TypeName;

/// What a backend is asked to call, with receivers already materialized.
#[derive(Debug, Clone, PartialEq)]
pub enum CallTarget<'p, V> {
    New(&'p TypeName),
    Static { class: &'p TypeName, method: &'p str },
    Function(&'p str),
    Method { receiver: V, method: &'p str },
    SetProperty { receiver: V, property: &'p str },
    AppendProperty { receiver: V, property: &'p str },
}

/// Produces concrete values for a [`Container`](super::Container).
///
/// The container walks plans and delegates every value it cannot express
/// itself. Property targets are invoked with exactly one argument, the value
/// to assign or append.
pub trait Backend {
    type Value: Clone;
    type Error: fmt::Display;

    fn literal(&mut self, literal: &Literal) -> Result<Self::Value, Self::Error>;

    fn array(&mut self, items: Vec<(Option<ArrayKey>, Self::Value)>) -> Result<Self::Value, Self::Error>;

    fn invoke(
        &mut self,
        target: CallTarget<'_, Self::Value>,
        arguments: Vec<Self::Value>,
    ) -> Result<Self::Value, Self::Error>;

    /// A first-class callable for `target`; nothing is invoked yet.
    fn callable(&mut self, target: CallTarget<'_, Self::Value>) -> Result<Self::Value, Self::Error>;

    /// A stand-in for a lazy service. The container materializes the real
    /// instance through [`Container::materialize`](super::Container::materialize).
    fn lazy(&mut self, service: &str, ty: &TypeName) -> Result<Self::Value, Self::Error>;
}
