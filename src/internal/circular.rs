//! Circular dependency detection infrastructure.

use smallvec::SmallVec;

use crate::error::{WireError, WireResult};

/// Stack of service names currently being resolved.
///
/// Entering a name that is already on the stack fails immediately with
/// [`WireError::CircularDependency`] carrying the cycle from the first
/// occurrence to the repeated name, inclusive. Nothing is pushed in that
/// case, so the caller never recurses into the repeated definition.
///
/// # Examples
///
/// ```rust
/// use ferrous_wire::{ResolutionStack, WireError};
///
/// let mut stack = ResolutionStack::new();
/// stack.enter("a").unwrap();
/// stack.enter("b").unwrap();
/// match stack.enter("a") {
///     Err(WireError::CircularDependency(path)) => assert_eq!(path, ["a", "b", "a"]),
///     other => panic!("unexpected: {:?}", other),
/// }
/// ```
#[derive(Debug, Default, Clone)]
pub struct ResolutionStack {
    names: SmallVec<[String; 8]>,
}

impl ResolutionStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pushes `name`, failing if it is already being resolved.
    pub fn enter(&mut self, name: &str) -> WireResult<()> {
        if let Some(start) = self.names.iter().position(|n| n == name) {
            let mut path: Vec<String> = self.names[start..].to_vec();
            path.push(name.to_string());
            return Err(WireError::CircularDependency(path));
        }
        self.names.push(name.to_string());
        Ok(())
    }

    /// Pops `name`. Must mirror a successful [`ResolutionStack::enter`].
    pub fn leave(&mut self, name: &str) {
        if let Some(last) = self.names.pop() {
            debug_assert_eq!(last, name);
        }
    }

    /// Name currently at the top of the stack.
    pub fn current(&self) -> Option<&str> {
        self.names.last().map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }

    pub fn depth(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
