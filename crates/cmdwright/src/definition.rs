//! Command definitions and their builder.
//!
//! A [`CommandDefinition`] is the immutable description of one resolvable
//! action: its name and aliases, who may run it, the permission it needs,
//! its positional signature, its flags, its completion bindings, and the
//! action itself.
//!
//! Definitions are built explicitly by the host's registration layer:
//!
//! ```rust
//! use cmdwright::{ArgType, CommandDefinition, FlagSpec, InvokerKind};
//!
//! let build = CommandDefinition::<InvokerKind>::builder("build")
//!     .alias("b")
//!     .permission("builder.build")
//!     .param("structure", ArgType::String)
//!     .param("size", ArgType::Int)
//!     .flag(FlagSpec::valued("c", ArgType::String).long("color"))
//!     .complete(0, "#structures")
//!     .action(|_who, args| {
//!         println!("building {:?}", args.str(0));
//!         Ok(())
//!     })
//!     .build()?;
//!
//! assert_eq!(build.usage(), "build <structure:string> <size:int> [-c|--color <string>]");
//! # Ok::<(), cmdwright::RegistrationError>(())
//! ```
//!
//! Checks that need nothing but the definition itself (empty names,
//! variadic placement, flag keys, completion indexes) run in
//! [`DefinitionBuilder::build`]. Checks against registries (resolver and
//! completion ids) run when the definition is added to a table.

use std::collections::BTreeMap;
use std::fmt;

use crate::action::{Action, FnAction};
use crate::args::Arguments;
use crate::error::RegistrationError;
use crate::flag::{FlagGrammar, FlagSpec};
use crate::invoker::InvokerKind;
use crate::value::ArgType;

/// Who may invoke a definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InvokerConstraint {
    /// Any invoker.
    #[default]
    Any,
    /// Any invoker, console included. Declared by commands written for
    /// console use; admits the same invokers as `Any`.
    ConsoleCapable,
    /// Only interactive invokers.
    InteractiveOnly,
}

impl InvokerConstraint {
    pub fn admits(self, kind: InvokerKind) -> bool {
        match self {
            InvokerConstraint::Any | InvokerConstraint::ConsoleCapable => true,
            InvokerConstraint::InteractiveOnly => kind == InvokerKind::Interactive,
        }
    }
}

/// One positional parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterSpec {
    name: String,
    ty: ArgType,
    position: usize,
    variadic: bool,
}

impl ParameterSpec {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn ty(&self) -> &ArgType {
        &self.ty
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn is_variadic(&self) -> bool {
        self.variadic
    }
}

/// Immutable metadata and bound action of one command.
pub struct CommandDefinition<S> {
    name: String,
    aliases: Vec<String>,
    description: Option<String>,
    is_default: bool,
    constraint: InvokerConstraint,
    permission: Option<String>,
    parameters: Vec<ParameterSpec>,
    flags: FlagGrammar,
    completions: BTreeMap<usize, String>,
    action: Box<dyn Action<S>>,
}

impl<S> CommandDefinition<S> {
    pub fn builder(name: impl Into<String>) -> DefinitionBuilder<S> {
        DefinitionBuilder::new(name)
    }

    /// Primary invocation token.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn aliases(&self) -> &[String] {
        &self.aliases
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// True if this is the table's root action.
    pub fn is_default(&self) -> bool {
        self.is_default
    }

    pub fn constraint(&self) -> InvokerConstraint {
        self.constraint
    }

    pub fn permission(&self) -> Option<&str> {
        self.permission.as_deref()
    }

    pub fn parameters(&self) -> &[ParameterSpec] {
        &self.parameters
    }

    pub fn flags(&self) -> &FlagGrammar {
        &self.flags
    }

    /// Completion provider ids by positional index.
    pub fn completions(&self) -> &BTreeMap<usize, String> {
        &self.completions
    }

    /// Completion provider id bound at a positional index.
    pub fn completion_at(&self, index: usize) -> Option<&str> {
        self.completions.get(&index).map(String::as_str)
    }

    /// The parameter a positional index lands on, counting a variadic tail
    /// as covering every index past its position.
    pub fn parameter_at(&self, index: usize) -> Option<&ParameterSpec> {
        self.parameters
            .get(index)
            .or_else(|| self.parameters.last().filter(|p| p.variadic))
    }

    /// True if the signature is exactly one raw rest capture.
    pub fn captures_raw(&self) -> bool {
        matches!(self.parameters.as_slice(), [only] if only.ty.is_rest())
    }

    /// True if the last parameter is variadic.
    pub fn has_variadic_tail(&self) -> bool {
        self.parameters.last().is_some_and(|p| p.variadic)
    }

    /// Every type the definition needs resolved: parameters, then valued flags.
    pub(crate) fn declared_types(&self) -> impl Iterator<Item = &ArgType> {
        self.parameters
            .iter()
            .map(ParameterSpec::ty)
            .chain(self.flags.specs().into_iter().filter_map(FlagSpec::value_type))
    }

    pub(crate) fn invoke(&self, invoker: &S, args: &Arguments) -> anyhow::Result<()> {
        self.action.invoke(invoker, args)
    }

    /// One-line usage string, e.g. `move <x:int> <y:int>`.
    pub fn usage(&self) -> String {
        let mut out = self.name.clone();
        for param in &self.parameters {
            if param.ty.is_rest() {
                out.push_str(&format!(" [{}...]", param.name));
            } else if param.variadic {
                out.push_str(&format!(" [{}:{}...]", param.name, param.ty));
            } else {
                out.push_str(&format!(" <{}:{}>", param.name, param.ty));
            }
        }
        for flag in self.flags.specs() {
            let forms = flag.tokens().join("|");
            match flag.value_type() {
                Some(ty) => out.push_str(&format!(" [{} <{}>]", forms, ty)),
                None => out.push_str(&format!(" [{}]", forms)),
            }
        }
        out
    }
}

impl<S> fmt::Debug for CommandDefinition<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandDefinition")
            .field("name", &self.name)
            .field("aliases", &self.aliases)
            .field("is_default", &self.is_default)
            .field("constraint", &self.constraint)
            .field("permission", &self.permission)
            .field("parameters", &self.parameters)
            .field("flags", &self.flags.len())
            .field("completions", &self.completions)
            .finish_non_exhaustive()
    }
}

/// Builder for [`CommandDefinition`].
pub struct DefinitionBuilder<S> {
    name: String,
    aliases: Vec<String>,
    description: Option<String>,
    is_default: bool,
    constraint: InvokerConstraint,
    permission: Option<String>,
    parameters: Vec<(String, ArgType, bool)>,
    flags: Vec<FlagSpec>,
    completions: BTreeMap<usize, String>,
    action: Option<Box<dyn Action<S>>>,
}

impl<S> DefinitionBuilder<S> {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            aliases: Vec::new(),
            description: None,
            is_default: false,
            constraint: InvokerConstraint::Any,
            permission: None,
            parameters: Vec::new(),
            flags: Vec::new(),
            completions: BTreeMap::new(),
            action: None,
        }
    }

    /// Adds an alternative invocation token.
    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.aliases.push(alias.into());
        self
    }

    pub fn aliases<I, T>(mut self, aliases: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.aliases.extend(aliases.into_iter().map(Into::into));
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Marks this definition as the table's root action, selected when the
    /// first token names no registered command.
    pub fn default_command(mut self) -> Self {
        self.is_default = true;
        self
    }

    pub fn constraint(mut self, constraint: InvokerConstraint) -> Self {
        self.constraint = constraint;
        self
    }

    /// Shorthand for `constraint(InvokerConstraint::InteractiveOnly)`.
    pub fn interactive_only(self) -> Self {
        self.constraint(InvokerConstraint::InteractiveOnly)
    }

    pub fn permission(mut self, permission: impl Into<String>) -> Self {
        self.permission = Some(permission.into());
        self
    }

    /// Adds a positional parameter. A `Rest` type is always variadic.
    pub fn param(mut self, name: impl Into<String>, ty: ArgType) -> Self {
        let variadic = ty.is_rest();
        self.parameters.push((name.into(), ty, variadic));
        self
    }

    /// Adds a variadic parameter consuming every remaining token.
    pub fn variadic(mut self, name: impl Into<String>, ty: ArgType) -> Self {
        self.parameters.push((name.into(), ty, true));
        self
    }

    /// Adds a raw rest capture.
    pub fn rest(self, name: impl Into<String>) -> Self {
        self.variadic(name, ArgType::Rest)
    }

    pub fn flag(mut self, spec: FlagSpec) -> Self {
        self.flags.push(spec);
        self
    }

    /// Binds a completion provider id to a positional index (0 is the first
    /// parameter).
    pub fn complete(mut self, index: usize, id: impl Into<String>) -> Self {
        self.completions.insert(index, id.into());
        self
    }

    /// Sets the action from a closure.
    pub fn action<F>(self, f: F) -> Self
    where
        F: Fn(&S, &Arguments) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.action_with(FnAction::new(f))
    }

    /// Sets the action from an [`Action`] implementation.
    pub fn action_with<A>(mut self, action: A) -> Self
    where
        A: Action<S> + 'static,
    {
        self.action = Some(Box::new(action));
        self
    }

    /// Validates the definition and freezes it.
    pub fn build(self) -> Result<CommandDefinition<S>, RegistrationError> {
        if self.name.trim().is_empty() {
            return Err(RegistrationError::EmptyName);
        }
        let command = self.name;

        let mut aliases: Vec<String> = Vec::with_capacity(self.aliases.len());
        for alias in self.aliases {
            if alias.trim().is_empty() {
                return Err(RegistrationError::EmptyAlias { command });
            }
            if alias != command && !aliases.contains(&alias) {
                aliases.push(alias);
            }
        }

        let last = self.parameters.len().saturating_sub(1);
        let mut parameters = Vec::with_capacity(self.parameters.len());
        for (position, (name, ty, variadic)) in self.parameters.into_iter().enumerate() {
            if variadic && position != last {
                return Err(RegistrationError::NonFinalVariadic { command, position });
            }
            if let ArgType::Enum(spec) = &ty {
                if spec.symbols().is_empty() {
                    return Err(RegistrationError::EmptyEnum {
                        command,
                        enum_name: spec.name().to_string(),
                    });
                }
            }
            parameters.push(ParameterSpec {
                name,
                ty,
                position,
                variadic,
            });
        }

        let open_ended = parameters.last().is_some_and(|p| p.variadic);
        if let Some(&index) = self.completions.keys().next_back() {
            if !open_ended && index >= parameters.len() {
                return Err(RegistrationError::UnreachableCompletion {
                    command,
                    index,
                    arity: parameters.len(),
                });
            }
        }

        let mut flags = FlagGrammar::new();
        for spec in self.flags {
            flags.insert(&command, spec)?;
        }

        let action = self
            .action
            .ok_or_else(|| RegistrationError::MissingAction {
                command: command.clone(),
            })?;

        Ok(CommandDefinition {
            name: command,
            aliases,
            description: self.description,
            is_default: self.is_default,
            constraint: self.constraint,
            permission: self.permission,
            parameters,
            flags,
            completions: self.completions,
            action,
        })
    }
}
