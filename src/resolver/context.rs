use crate::error::Site;
use crate::internal::ResolutionStack;
use crate::statement::Statement;

/// Transient state of one top-level resolution.
///
/// Created fresh by the assembler for each definition it visits and passed
/// explicitly through every resolution call. Nothing about the current
/// service or statement lives anywhere else.
#[derive(Debug, Default)]
pub struct ResolutionContext {
    pub(crate) stack: ResolutionStack,
    statements: Vec<String>,
    argument: Option<String>,
    in_setup: bool,
}

impl ResolutionContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Definition whose plan is being built.
    pub fn current_service(&self) -> Option<&str> {
        self.stack.current()
    }

    /// Innermost statement being expanded.
    pub fn current_statement(&self) -> Option<&str> {
        self.statements.last().map(String::as_str)
    }

    /// Services plus statements currently open.
    pub fn depth(&self) -> usize {
        self.stack.depth() + self.statements.len()
    }

    pub fn in_setup(&self) -> bool {
        self.in_setup
    }

    /// Where the next dependency request comes from.
    pub fn site(&self) -> Site {
        Site {
            service: self.stack.current().map(str::to_string),
            argument: self.argument.clone(),
        }
    }

    pub(crate) fn push_statement(&mut self, statement: &Statement) {
        self.statements.push(statement.to_string());
    }

    pub(crate) fn pop_statement(&mut self) {
        self.statements.pop();
    }

    pub(crate) fn set_argument(&mut self, argument: Option<String>) -> Option<String> {
        std::mem::replace(&mut self.argument, argument)
    }

    pub(crate) fn set_in_setup(&mut self, in_setup: bool) -> bool {
        std::mem::replace(&mut self.in_setup, in_setup)
    }
}
