use super::{ResolutionContext, Resolver};
use crate::error::{WireError, WireResult};
use crate::plan::DefinitionHandle;
use crate::statement::Reference;

impl<'a> Resolver<'a> {
    /// Turns a symbolic reference into a handle to a definition.
    ///
    /// Named and typed references resolve the target definition as a side
    /// effect, so cycles through references are detected here. `@self` never
    /// re-enters resolution and is only accepted inside setup statements.
    pub fn resolve_reference(
        &mut self,
        reference: &Reference,
        ctx: &mut ResolutionContext,
    ) -> WireResult<DefinitionHandle> {
        match reference {
            Reference::Name(name) => {
                if !self.store.contains(name) {
                    return Err(WireError::NotFound(name.clone()));
                }
                self.resolve_definition(name, ctx)?;
                Ok(DefinitionHandle::service(name.as_str()))
            }
            Reference::Type(ty) => {
                let name = self.index.resolve_by_type(ty, &ctx.site())?;
                if ctx.in_setup() && ctx.current_service() == Some(name) {
                    return Ok(DefinitionHandle::current(name));
                }
                self.resolve_definition(name, ctx)?;
                Ok(DefinitionHandle::service(name))
            }
            Reference::SelfRef => match ctx.current_service() {
                None => Err(WireError::InvalidReference("@self used outside of a service definition".into())),
                Some(_) if !ctx.in_setup() => Err(WireError::InvalidReference(
                    "@self is only valid in setup statements; the instance does not exist yet".into(),
                )),
                Some(name) => Ok(DefinitionHandle::current(name)),
            },
        }
    }
}
