//! Statement and reference resolution.
//!
//! [`Resolver`] is a recursive-descent walk over definitions and the
//! statements inside them. Every step receives the [`ResolutionContext`] of
//! the top-level definition being assembled; cycles are caught by the
//! context's stack the moment a definition is entered twice.

mod context;
mod reference;
pub(crate) mod typing;

pub use context::ResolutionContext;

use std::borrow::Cow;
use std::time::Instant;

use indexmap::IndexMap;

use crate::autowiring::TypeIndex;
use crate::config::{AssemblerConfig, Parameters};
use crate::definition::ServiceDefinition;
use crate::error::{WireError, WireResult};
use crate::internal::Set;
use crate::observer::Observers;
use crate::plan::{ConstructionPlan, ResolvedInvocation, ResolvedTarget, ResolvedValue};
use crate::statement::{Argument, Entity, Literal, Receiver, Reference, Statement, Value};
use crate::store::DefinitionStore;
use crate::types::{ParamType, Parameter, ScalarKind, Signature, TypeCatalog, TypeName};

/// Resolves definitions into [`ConstructionPlan`]s.
///
/// Plans are memoized: a definition resolved as a dependency of an earlier
/// one is not resolved again. A definition that failed is remembered as
/// failed and later references to it resolve to its bare handle, so one
/// broken definition is reported once.
pub struct Resolver<'a> {
    store: &'a DefinitionStore,
    catalog: &'a dyn TypeCatalog,
    index: TypeIndex<'a>,
    parameters: &'a Parameters,
    config: &'a AssemblerConfig,
    observers: &'a Observers,
    plans: IndexMap<String, ConstructionPlan>,
    failed: Set<String>,
    origin: Option<String>,
}

/// What a resolved call needs to know about its target before binding.
struct Target<'s> {
    label: String,
    signature: Option<Cow<'s, Signature>>,
    resolved: ResolvedTarget,
}

impl<'a> Resolver<'a> {
    pub fn new(
        store: &'a DefinitionStore,
        catalog: &'a dyn TypeCatalog,
        types: &'a IndexMap<String, TypeName>,
        parameters: &'a Parameters,
        config: &'a AssemblerConfig,
        observers: &'a Observers,
    ) -> Self {
        Self {
            store,
            catalog,
            index: TypeIndex::new(store, catalog, types),
            parameters,
            config,
            observers,
            plans: IndexMap::new(),
            failed: Set::default(),
            origin: None,
        }
    }

    /// Marks a definition as failed without resolving it.
    pub(crate) fn mark_failed(&mut self, name: &str) {
        self.failed.insert(name.to_string());
    }

    pub fn is_resolved(&self, name: &str) -> bool {
        self.plans.contains_key(name) || self.failed.contains(name)
    }

    pub fn plan(&self, name: &str) -> Option<&ConstructionPlan> {
        self.plans.get(name)
    }

    /// Name of the innermost definition whose resolution raised the last
    /// error, consumed by the caller.
    pub(crate) fn take_origin(&mut self) -> Option<String> {
        self.origin.take()
    }

    pub(crate) fn into_plans(self) -> IndexMap<String, ConstructionPlan> {
        self.plans
    }

    /// Resolves a definition and everything it depends on.
    ///
    /// Returns immediately if the definition already has a plan or already
    /// failed. Fails with [`WireError::CircularDependency`] if the definition
    /// is already being resolved in `ctx`.
    pub fn resolve_definition(&mut self, name: &str, ctx: &mut ResolutionContext) -> WireResult<()> {
        if self.is_resolved(name) {
            return Ok(());
        }
        let store = self.store;
        let definition = store.get(name)?;
        self.check_depth(ctx)?;

        if let Err(error) = ctx.stack.enter(name) {
            self.origin.get_or_insert_with(|| name.to_string());
            return Err(error);
        }
        self.observers.resolving(name);
        let started = Instant::now();
        let outer_setup = ctx.set_in_setup(false);
        let outer_argument = ctx.set_argument(None);

        let result = self.build_plan(name, definition, ctx);

        ctx.set_argument(outer_argument);
        ctx.set_in_setup(outer_setup);
        ctx.stack.leave(name);

        match result {
            Ok(plan) => {
                let elapsed = started.elapsed();
                tracing::debug!(service = name, ty = %plan.ty, ?elapsed, "resolved definition");
                self.observers.resolved(name, elapsed);
                self.plans.insert(name.to_string(), plan);
                Ok(())
            }
            Err(error) => {
                self.failed.insert(name.to_string());
                self.origin.get_or_insert_with(|| name.to_string());
                self.observers.failed(name, &error);
                Err(error)
            }
        }
    }

    fn build_plan(
        &mut self,
        name: &str,
        definition: &ServiceDefinition,
        ctx: &mut ResolutionContext,
    ) -> WireResult<ConstructionPlan> {
        let ty = self
            .index
            .type_of(name)
            .cloned()
            .ok_or_else(|| WireError::UnresolvedType(name.to_string()))?;
        let lazy = definition.lazy && self.config.lazy;

        if definition.imported {
            return Ok(ConstructionPlan {
                name: name.to_string(),
                ty,
                factory: None,
                setup: Vec::new(),
                lazy,
                imported: true,
                tags: definition.tags.clone(),
            });
        }

        let implied;
        let factory = match &definition.factory {
            Some(factory) => factory,
            None => {
                implied = Statement::new(ty.clone());
                &implied
            }
        };
        if factory.callable {
            return Err(WireError::InvalidStatement(format!(
                "factory of '{}' is a callable reference, not a call",
                name
            )));
        }
        let factory = self.resolve(factory, ctx)?;

        ctx.set_in_setup(true);
        let setup = definition
            .setup
            .iter()
            .map(|statement| self.resolve(statement, ctx))
            .collect::<WireResult<Vec<_>>>()?;

        Ok(ConstructionPlan {
            name: name.to_string(),
            ty,
            factory: Some(factory),
            setup,
            lazy,
            imported: false,
            tags: definition.tags.clone(),
        })
    }

    fn check_depth(&self, ctx: &ResolutionContext) -> WireResult<()> {
        match self.config.max_depth {
            Some(max_depth) if ctx.depth() >= max_depth => Err(WireError::DepthExceeded(max_depth)),
            _ => Ok(()),
        }
    }

    /// Resolves one statement into a call with bound arguments.
    pub fn resolve(&mut self, statement: &Statement, ctx: &mut ResolutionContext) -> WireResult<ResolvedInvocation> {
        self.check_depth(ctx)?;
        ctx.push_statement(statement);
        let result = self.resolve_call(statement, ctx);
        ctx.pop_statement();
        result
    }

    fn resolve_call(&mut self, statement: &Statement, ctx: &mut ResolutionContext) -> WireResult<ResolvedInvocation> {
        let target = self.resolve_target(&statement.entity, ctx)?;
        let signature = target.signature.as_deref();
        let returns = signature.and_then(Signature::return_class).cloned().or_else(|| match &statement.entity {
            Entity::New(class) => Some(class.clone()),
            _ => None,
        });
        let arguments = self.bind(&target.label, signature, &statement.arguments, ctx)?;
        Ok(ResolvedInvocation { target: target.resolved, arguments, returns })
    }

    /// Looks up what `entity` invokes. Targets missing from the catalog
    /// entirely are passed through without a signature; a known class
    /// lacking the member is an error.
    fn resolve_target(&mut self, entity: &Entity, ctx: &mut ResolutionContext) -> WireResult<Target<'a>> {
        let catalog = self.catalog;
        let label = entity.to_string();
        let target = match entity {
            Entity::New(class) => {
                let info = catalog.class(class);
                if let Some(info) = info {
                    if !info.is_instantiable() {
                        return Err(WireError::NotInstantiable { class: class.clone(), site: ctx.site() });
                    }
                }
                Target {
                    signature: info.map(|i| match &i.constructor {
                        Some(constructor) => Cow::Borrowed(constructor),
                        None => Cow::Owned(Signature::new()),
                    }),
                    resolved: ResolvedTarget::New(class.clone()),
                    label,
                }
            }
            Entity::Static(class, method) => {
                let signature = match catalog.class(class) {
                    None => None,
                    Some(_) => match catalog.method(class, method) {
                        Some(m) if m.is_static => Some(Cow::Borrowed(&m.signature)),
                        Some(_) => {
                            return Err(WireError::InvalidStatement(format!("{} is not static", label)))
                        }
                        None => return Err(WireError::UnknownTarget { target: label, site: ctx.site() }),
                    },
                };
                Target {
                    signature,
                    resolved: ResolvedTarget::Static { class: class.clone(), method: method.clone() },
                    label,
                }
            }
            Entity::Function(function) => Target {
                signature: catalog.function(function).map(Cow::Borrowed),
                resolved: ResolvedTarget::Function(function.clone()),
                label,
            },
            Entity::Method(receiver, method) => {
                let (value, ty) = self.resolve_receiver(receiver, ctx)?;
                Target {
                    signature: self.method_signature(ty.as_ref(), method, &label, ctx)?.map(Cow::Borrowed),
                    resolved: ResolvedTarget::Method { receiver: Box::new(value), method: method.clone() },
                    label,
                }
            }
            Entity::SelfMethod(method) => {
                let ty = self.setup_type(entity, ctx)?;
                Target {
                    signature: self.method_signature(ty.as_ref(), method, &label, ctx)?.map(Cow::Borrowed),
                    resolved: ResolvedTarget::Method { receiver: Box::new(ResolvedValue::SelfRef), method: method.clone() },
                    label,
                }
            }
            Entity::SelfProperty(property) | Entity::SelfAppend(property) => {
                let ty = self.setup_type(entity, ctx)?;
                let declared = match ty.as_ref().filter(|t| catalog.class(t).is_some()) {
                    Some(class) => Some(
                        catalog
                            .property(class, property)
                            .ok_or_else(|| WireError::UnknownTarget { target: label.clone(), site: ctx.site() })?,
                    ),
                    None => None,
                };
                let receiver = Box::new(ResolvedValue::SelfRef);
                let (param_ty, resolved) = if let Entity::SelfAppend(_) = entity {
                    let element = match declared {
                        Some(ParamType::List(item)) => ParamType::Class(item.clone()),
                        _ => ParamType::Mixed,
                    };
                    (element, ResolvedTarget::AppendProperty { receiver, property: property.clone() })
                } else {
                    (
                        declared.cloned().unwrap_or(ParamType::Mixed),
                        ResolvedTarget::SetProperty { receiver, property: property.clone() },
                    )
                };
                // properties bind exactly one value, named after the property
                let signature = Signature::new().param(Parameter::new(property.clone(), param_ty));
                Target { signature: Some(Cow::Owned(signature)), resolved, label }
            }
        };
        Ok(target)
    }

    fn setup_type(&self, entity: &Entity, ctx: &ResolutionContext) -> WireResult<Option<TypeName>> {
        if !ctx.in_setup() {
            return Err(WireError::InvalidReference(format!("{} is only valid in setup statements", entity)));
        }
        Ok(ctx.current_service().and_then(|name| self.index.type_of(name)).cloned())
    }

    fn method_signature(
        &self,
        receiver: Option<&TypeName>,
        method: &str,
        label: &str,
        ctx: &ResolutionContext,
    ) -> WireResult<Option<&'a Signature>> {
        let catalog = self.catalog;
        match receiver.filter(|ty| catalog.class(ty).is_some()) {
            Some(class) => catalog
                .method(class, method)
                .map(|m| Some(&m.signature))
                .ok_or_else(|| WireError::UnknownTarget { target: label.to_string(), site: ctx.site() }),
            None => Ok(None),
        }
    }

    fn resolve_receiver(
        &mut self,
        receiver: &Receiver,
        ctx: &mut ResolutionContext,
    ) -> WireResult<(ResolvedValue, Option<TypeName>)> {
        match receiver {
            Receiver::Reference(reference) => {
                let handle = self.resolve_reference(reference, ctx)?;
                let ty = self.index.type_of(&handle.name).cloned();
                Ok((handle.into_value(), ty))
            }
            Receiver::Statement(statement) => {
                if statement.callable {
                    return Err(WireError::InvalidStatement(format!(
                        "cannot call a method on callable reference {}",
                        statement
                    )));
                }
                let call = self.resolve(statement, ctx)?;
                let ty = call.returns.clone();
                Ok((ResolvedValue::Invocation(Box::new(call)), ty))
            }
        }
    }

    /// Binds arguments to parameters: positional first, then named, then
    /// every remaining slot is filled from its default or by autowiring.
    fn bind(
        &mut self,
        target: &str,
        signature: Option<&Signature>,
        arguments: &[Argument],
        ctx: &mut ResolutionContext,
    ) -> WireResult<Vec<ResolvedValue>> {
        let Some(signature) = signature else {
            return self.bind_untyped(target, arguments, ctx);
        };
        let params = &signature.params;
        let variadic = params.last().filter(|p| p.variadic);
        let fixed = params.len() - usize::from(variadic.is_some());

        let mut slots: Vec<Option<&Value>> = vec![None; fixed];
        let mut rest: Vec<&Value> = Vec::new();
        let mut position = 0;
        for (i, argument) in arguments.iter().enumerate() {
            match &argument.name {
                None if position < fixed => {
                    slots[position] = Some(&argument.value);
                    position += 1;
                }
                None if variadic.is_some() => rest.push(&argument.value),
                None => {
                    return Err(WireError::UnknownArgument {
                        target: target.to_string(),
                        argument: format!("#{}", i + 1),
                        site: ctx.site(),
                    })
                }
                Some(name) => match signature.position_of(name) {
                    Some(index) if index >= fixed => rest.push(&argument.value),
                    Some(index) if slots[index].is_some() => {
                        return Err(WireError::DuplicateArgument {
                            target: target.to_string(),
                            parameter: name.clone(),
                            site: ctx.site(),
                        })
                    }
                    Some(index) => slots[index] = Some(&argument.value),
                    None => {
                        return Err(WireError::UnknownArgument {
                            target: target.to_string(),
                            argument: format!("${}", name),
                            site: ctx.site(),
                        })
                    }
                },
            }
        }

        let mut resolved = Vec::with_capacity(fixed + rest.len());
        for (param, slot) in params.iter().zip(slots) {
            let outer = ctx.set_argument(Some(format!("${}", param.name)));
            let value = match slot {
                None | Some(Value::Omitted) => self.fill_slot(target, param, ctx),
                Some(value) => match self.resolve_value(value, ctx) {
                    Ok(resolved) => self.check_argument(param, resolved, ctx),
                    Err(error) => Err(error),
                },
            };
            ctx.set_argument(outer);
            resolved.push(value?);
        }
        if let Some(param) = variadic {
            for value in rest {
                let outer = ctx.set_argument(Some(format!("${}", param.name)));
                let value = self.resolve_value(value, ctx);
                ctx.set_argument(outer);
                resolved.push(value?);
            }
        }
        Ok(resolved)
    }

    /// Binding for targets the catalog knows nothing about: arguments are
    /// passed positionally as written.
    fn bind_untyped(
        &mut self,
        target: &str,
        arguments: &[Argument],
        ctx: &mut ResolutionContext,
    ) -> WireResult<Vec<ResolvedValue>> {
        let mut resolved = Vec::with_capacity(arguments.len());
        for (i, argument) in arguments.iter().enumerate() {
            let position = format!("#{}", i + 1);
            if let Some(name) = &argument.name {
                return Err(WireError::UnknownArgument {
                    target: target.to_string(),
                    argument: format!("${}", name),
                    site: ctx.site(),
                });
            }
            if let Value::Omitted = argument.value {
                return Err(WireError::MissingArgument {
                    target: target.to_string(),
                    parameter: position,
                    site: ctx.site(),
                });
            }
            let outer = ctx.set_argument(Some(position));
            let value = self.resolve_value(&argument.value, ctx);
            ctx.set_argument(outer);
            resolved.push(value?);
        }
        Ok(resolved)
    }

    /// Value for a parameter that was omitted or not supplied.
    fn fill_slot(&mut self, target: &str, param: &Parameter, ctx: &mut ResolutionContext) -> WireResult<ResolvedValue> {
        if let Some(default) = &param.default {
            return Ok(ResolvedValue::Literal(default.clone()));
        }
        match &param.ty {
            ParamType::Class(required) => match self.index.resolve_by_type(required, &ctx.site()) {
                // setup runs on the finished instance, so it can receive itself
                Ok(name) if ctx.in_setup() && ctx.current_service() == Some(name) => {
                    return Ok(ResolvedValue::SelfRef);
                }
                Ok(name) => {
                    self.resolve_definition(name, ctx)?;
                    return Ok(ResolvedValue::Service(name.to_string()));
                }
                Err(WireError::NoServiceFound { .. }) if param.nullable => {
                    return Ok(ResolvedValue::Literal(Literal::Null));
                }
                Err(error) => return Err(error),
            },
            ParamType::List(item) => {
                let names = self.index.resolve_all_by_type(item, ctx.current_service());
                return self.resolve_collection(names, ctx);
            }
            _ => {}
        }
        if param.nullable {
            return Ok(ResolvedValue::Literal(Literal::Null));
        }
        Err(WireError::MissingArgument {
            target: target.to_string(),
            parameter: param.name.clone(),
            site: ctx.site(),
        })
    }

    /// Rejects services whose known type cannot satisfy a class parameter.
    fn check_argument(&self, param: &Parameter, value: ResolvedValue, ctx: &ResolutionContext) -> WireResult<ResolvedValue> {
        let Some(expected) = param.ty.as_class() else {
            return Ok(value);
        };
        let found = match &value {
            ResolvedValue::Service(name) => self.index.type_of(name),
            ResolvedValue::Invocation(call) => call.returns.as_ref(),
            _ => None,
        };
        match found {
            Some(found) if !self.catalog.is_compatible(found, expected) => Err(WireError::TypeMismatch {
                expected: expected.clone(),
                found: found.clone(),
                site: ctx.site(),
            }),
            _ => Ok(value),
        }
    }

    fn resolve_collection(&mut self, names: Vec<&str>, ctx: &mut ResolutionContext) -> WireResult<ResolvedValue> {
        let mut items = Vec::with_capacity(names.len());
        for name in names {
            self.resolve_definition(name, ctx)?;
            items.push((None, ResolvedValue::Service(name.to_string())));
        }
        Ok(ResolvedValue::Array(items))
    }

    /// Resolves one argument value.
    pub fn resolve_value(&mut self, value: &Value, ctx: &mut ResolutionContext) -> WireResult<ResolvedValue> {
        match value {
            Value::Literal(literal) => Ok(ResolvedValue::Literal(literal.clone())),
            Value::Parameter(name) => Ok(ResolvedValue::Literal(self.parameters.get(name)?.clone())),
            Value::Omitted => Err(WireError::InvalidStatement(
                "omitted argument is only allowed in an argument list".into(),
            )),
            Value::Statement(statement) if statement.callable => {
                if !statement.arguments.is_empty() {
                    return Err(WireError::InvalidStatement(format!(
                        "callable reference {} cannot take arguments",
                        statement
                    )));
                }
                self.check_depth(ctx)?;
                ctx.push_statement(statement);
                let target = self.resolve_target(&statement.entity, ctx);
                ctx.pop_statement();
                Ok(ResolvedValue::Callable(Box::new(target?.resolved)))
            }
            Value::Statement(statement) => Ok(ResolvedValue::Invocation(Box::new(self.resolve(statement, ctx)?))),
            Value::Reference(reference) => Ok(self.resolve_reference(reference, ctx)?.into_value()),
            Value::Array(items) => items
                .iter()
                .map(|(key, item)| Ok((key.clone(), self.resolve_value(item, ctx)?)))
                .collect::<WireResult<Vec<_>>>()
                .map(ResolvedValue::Array),
            Value::Typed(ty) => {
                let names = self.index.resolve_all_by_type(ty, ctx.current_service());
                self.resolve_collection(names, ctx)
            }
            Value::Tagged(tag) => {
                let store = self.store;
                let current = ctx.current_service();
                let names: Vec<&str> = store
                    .find_by_tag(tag)
                    .into_iter()
                    .map(|(name, _)| name)
                    .filter(|name| Some(*name) != current)
                    .collect();
                self.resolve_collection(names, ctx)
            }
            Value::Cast(kind, inner) => {
                let literal = self.evaluate(inner, ctx, kind_name(*kind))?;
                literal
                    .cast(*kind)
                    .map(ResolvedValue::Literal)
                    .ok_or_else(|| WireError::NotCastable { value: literal.to_string(), to: kind_name(*kind).into() })
            }
            Value::Not(inner) => {
                let literal = self.evaluate(inner, ctx, "bool")?;
                Ok(ResolvedValue::Literal(Literal::Bool(!literal.is_truthy())))
            }
            Value::Constant { class: Some(class), name } => self
                .catalog
                .class_constant(class, name)
                .cloned()
                .map(ResolvedValue::Literal)
                .ok_or_else(|| WireError::UnknownConstant(format!("{}::{}", class, name))),
            Value::Constant { class: None, name } => self
                .catalog
                .constant(name)
                .cloned()
                .map(ResolvedValue::Literal)
                .ok_or_else(|| WireError::UnknownConstant(name.clone())),
        }
    }

    /// Resolves a value that must reduce to a literal.
    fn evaluate(&mut self, value: &Value, ctx: &mut ResolutionContext, to: &str) -> WireResult<Literal> {
        match self.resolve_value(value, ctx)? {
            ResolvedValue::Literal(literal) => Ok(literal),
            other => Err(WireError::NotCastable { value: describe(&other), to: to.into() }),
        }
    }
}

fn kind_name(kind: ScalarKind) -> &'static str {
    match kind {
        ScalarKind::Bool => "bool",
        ScalarKind::Int => "int",
        ScalarKind::Float => "float",
        ScalarKind::String => "string",
    }
}

fn describe(value: &ResolvedValue) -> String {
    match value {
        ResolvedValue::Literal(literal) => literal.to_string(),
        ResolvedValue::Service(name) => Reference::Name(name.clone()).to_string(),
        ResolvedValue::SelfRef => Reference::SelfRef.to_string(),
        ResolvedValue::Invocation(_) => "call result".into(),
        ResolvedValue::Callable(_) => "callable".into(),
        ResolvedValue::Array(_) => "array".into(),
    }
}
